use std::sync::{Arc, Mutex, PoisonError, RwLock};

use quiz_core::model::{Question, QuestionImage};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use super::feed::{MovieEntry, MovieFeed, resized_image_url};
use super::source::{QuestionListener, QuestionSource, pick_index};

/// Builds questions from a remotely loaded movie pool.
///
/// Network work runs on spawned tokio tasks, so both trait methods must be
/// called from within a tokio runtime.
pub struct MovieFeedSource {
    feed: Arc<dyn MovieFeed>,
    movies: Arc<RwLock<Vec<MovieEntry>>>,
    rng: Mutex<StdRng>,
    rating_threshold: f32,
    listener: Arc<dyn QuestionListener>,
}

impl MovieFeedSource {
    #[must_use]
    pub fn new(
        feed: Arc<dyn MovieFeed>,
        rating_threshold: f32,
        listener: Arc<dyn QuestionListener>,
    ) -> Self {
        Self {
            feed,
            movies: Arc::new(RwLock::new(Vec::new())),
            rng: Mutex::new(StdRng::from_os_rng()),
            rating_threshold,
            listener,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Number of movies currently loaded.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.movies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn pick_movie(&self) -> Option<MovieEntry> {
        let movies = self.movies.read().unwrap_or_else(PoisonError::into_inner);
        pick_index(&self.rng, movies.len()).and_then(|index| movies.get(index).cloned())
    }
}

impl QuestionSource for MovieFeedSource {
    fn load_data(&self) {
        let feed = Arc::clone(&self.feed);
        let movies = Arc::clone(&self.movies);
        let listener = Arc::clone(&self.listener);
        tokio::spawn(async move {
            match feed.load_movies().await {
                Ok(loaded) => {
                    info!(count = loaded.len(), "movie pool loaded");
                    *movies.write().unwrap_or_else(PoisonError::into_inner) = loaded;
                    listener.did_load_data();
                }
                Err(err) => {
                    warn!(error = %err, "movie pool failed to load");
                    listener.did_fail_to_load_data(err);
                }
            }
        });
    }

    fn request_next(&self) {
        let Some(movie) = self.pick_movie() else {
            debug!("movie pool is empty");
            self.listener.did_receive_question(None);
            return;
        };

        let feed = Arc::clone(&self.feed);
        let listener = Arc::clone(&self.listener);
        let threshold = self.rating_threshold;
        tokio::spawn(async move {
            let url = resized_image_url(&movie.image_url);
            let image = match feed.load_image(&url).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(title = %movie.title, error = %err, "poster download failed");
                    Vec::new()
                }
            };
            let question =
                Question::from_rating(QuestionImage::Bytes(image), movie.rating, threshold);
            listener.did_receive_question(Some(question));
        });
    }
}
