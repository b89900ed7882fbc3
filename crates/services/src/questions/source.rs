use std::sync::{Mutex, PoisonError};

use quiz_core::model::Question;
use rand::Rng;
use rand::rngs::StdRng;

use crate::error::FeedError;

/// Receives question source notifications.
///
/// Sources hold the listener as a shared handle registered at construction.
/// They never own the session that ultimately consumes the notifications.
pub trait QuestionListener: Send + Sync {
    fn did_load_data(&self);
    fn did_fail_to_load_data(&self, error: FeedError);
    /// `None` means no question is available.
    fn did_receive_question(&self, question: Option<Question>);
}

/// Supplies quiz questions one at a time.
///
/// Both operations return immediately; results arrive through the listener.
pub trait QuestionSource: Send + Sync {
    /// Prepare the question pool. Must complete before the first `request_next`.
    fn load_data(&self);

    /// Deliver one uniformly random question from the pool, with replacement.
    fn request_next(&self);
}

/// Uniform pick with replacement. `None` for an empty pool.
pub(crate) fn pick_index(rng: &Mutex<StdRng>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
    Some(rng.random_range(0..len))
}
