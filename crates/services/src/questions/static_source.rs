use std::sync::{Arc, Mutex};

use quiz_core::model::{Question, QuestionImage};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use super::source::{QuestionListener, QuestionSource, pick_index};

/// Movies shipped with the app, with their ratings at the time of bundling.
const BUNDLED_MOVIES: [(&str, f32); 10] = [
    ("The Godfather", 9.2),
    ("The Dark Knight", 9.0),
    ("Kill Bill", 8.1),
    ("The Avengers", 8.0),
    ("Deadpool", 8.0),
    ("The Green Knight", 6.6),
    ("Old", 5.8),
    ("The Ice Age Adventures of Buck Wild", 4.3),
    ("Tesla", 5.1),
    ("Vivarium", 5.8),
];

/// Questions about the bundled movie posters for the given rating threshold.
#[must_use]
pub fn bundled_questions(rating_threshold: f32) -> Vec<Question> {
    BUNDLED_MOVIES
        .iter()
        .map(|(title, rating)| {
            Question::from_rating(
                QuestionImage::Named((*title).to_owned()),
                *rating,
                rating_threshold,
            )
        })
        .collect()
}

/// Serves questions from a fixed in-memory pool.
pub struct StaticQuestionSource {
    questions: Vec<Question>,
    rng: Mutex<StdRng>,
    listener: Arc<dyn QuestionListener>,
}

impl StaticQuestionSource {
    #[must_use]
    pub fn new(questions: Vec<Question>, listener: Arc<dyn QuestionListener>) -> Self {
        Self {
            questions,
            rng: Mutex::new(StdRng::from_os_rng()),
            listener,
        }
    }

    #[must_use]
    pub fn bundled(rating_threshold: f32, listener: Arc<dyn QuestionListener>) -> Self {
        Self::new(bundled_questions(rating_threshold), listener)
    }

    /// Use a deterministic random sequence.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}

impl QuestionSource for StaticQuestionSource {
    fn load_data(&self) {
        self.listener.did_load_data();
    }

    fn request_next(&self) {
        let question = pick_index(&self.rng, self.questions.len())
            .and_then(|index| self.questions.get(index))
            .cloned();
        if question.is_none() {
            debug!("static question pool is empty");
        }
        self.listener.did_receive_question(question);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionEvent, SessionHandle};

    #[test]
    fn bundled_pool_has_six_yes_and_four_no() {
        let questions = bundled_questions(6.0);
        assert_eq!(questions.len(), 10);
        assert_eq!(questions.iter().filter(|q| q.correct_answer()).count(), 6);
    }

    #[test]
    fn higher_threshold_flips_answers() {
        let questions = bundled_questions(8.5);
        assert_eq!(questions.iter().filter(|q| q.correct_answer()).count(), 2);
    }

    #[test]
    fn load_reports_success_immediately() {
        let (handle, mut rx) = SessionHandle::channel();
        let source = StaticQuestionSource::bundled(6.0, Arc::new(handle));
        source.load_data();
        assert!(matches!(rx.try_recv(), Ok(SessionEvent::DataLoaded)));
    }

    #[test]
    fn request_delivers_question_from_pool() {
        let (handle, mut rx) = SessionHandle::channel();
        let source = StaticQuestionSource::bundled(6.0, Arc::new(handle)).with_seed(3);

        for _ in 0..20 {
            source.request_next();
            match rx.try_recv() {
                Ok(SessionEvent::QuestionReceived(Some(q))) => {
                    assert!(source.questions().contains(&q));
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[test]
    fn empty_pool_delivers_none() {
        let (handle, mut rx) = SessionHandle::channel();
        let source = StaticQuestionSource::new(Vec::new(), Arc::new(handle));
        source.request_next();
        assert!(matches!(
            rx.try_recv(),
            Ok(SessionEvent::QuestionReceived(None))
        ));
    }
}
