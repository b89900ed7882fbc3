use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Round shape and pacing.
#[derive(Clone, Debug, PartialEq)]
pub struct QuizConfig {
    questions_per_round: u32,
    answer_delay: Duration,
    rating_threshold: f32,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            questions_per_round: 10,
            answer_delay: Duration::from_secs(1),
            rating_threshold: 6.0,
        }
    }
}

impl QuizConfig {
    /// Read overrides from `QUIZ_QUESTIONS_PER_ROUND`, `QUIZ_ANSWER_DELAY_MS`
    /// and `QUIZ_RATING_THRESHOLD`. Missing or invalid values keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let questions_per_round = parse_var::<u32>(&lookup, "QUIZ_QUESTIONS_PER_ROUND")
            .filter(|n| {
                let valid = *n >= 1;
                if !valid {
                    warn!("QUIZ_QUESTIONS_PER_ROUND must be at least 1, using default");
                }
                valid
            })
            .unwrap_or(defaults.questions_per_round);
        let answer_delay = parse_var::<u64>(&lookup, "QUIZ_ANSWER_DELAY_MS")
            .filter(|ms| {
                let valid = *ms > 0;
                if !valid {
                    warn!("QUIZ_ANSWER_DELAY_MS must be positive, using default");
                }
                valid
            })
            .map_or(defaults.answer_delay, Duration::from_millis);
        let rating_threshold = parse_var::<f32>(&lookup, "QUIZ_RATING_THRESHOLD")
            .filter(|t| t.is_finite())
            .unwrap_or(defaults.rating_threshold);

        Self {
            questions_per_round,
            answer_delay,
            rating_threshold,
        }
    }

    /// Set the round length. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_questions_per_round(mut self, questions_per_round: u32) -> Self {
        self.questions_per_round = questions_per_round.max(1);
        self
    }

    /// Set the answer delay. A zero delay keeps the current value.
    #[must_use]
    pub fn with_answer_delay(mut self, answer_delay: Duration) -> Self {
        if !answer_delay.is_zero() {
            self.answer_delay = answer_delay;
        }
        self
    }

    #[must_use]
    pub fn with_rating_threshold(mut self, rating_threshold: f32) -> Self {
        self.rating_threshold = rating_threshold;
        self
    }

    #[must_use]
    pub fn questions_per_round(&self) -> u32 {
        self.questions_per_round
    }

    #[must_use]
    pub fn answer_delay(&self) -> Duration {
        self.answer_delay
    }

    #[must_use]
    pub fn rating_threshold(&self) -> f32 {
        self.rating_threshold
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring invalid configuration value");
            None
        }
    }
}
