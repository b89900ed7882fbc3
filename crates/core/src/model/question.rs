use std::fmt;

/// Poster attached to a question.
#[derive(Clone, PartialEq, Eq)]
pub enum QuestionImage {
    /// Identifier of an image bundled with the host application.
    Named(String),
    /// Downloaded image bytes. Empty when the download failed.
    Bytes(Vec<u8>),
}

impl QuestionImage {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            QuestionImage::Named(name) => name.is_empty(),
            QuestionImage::Bytes(bytes) => bytes.is_empty(),
        }
    }
}

impl fmt::Debug for QuestionImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionImage::Named(name) => f.debug_tuple("Named").field(name).finish(),
            QuestionImage::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

/// A single yes/no quiz question.
///
/// Questions are immutable once issued by a question source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    image: QuestionImage,
    prompt: String,
    correct_answer: bool,
}

impl Question {
    #[must_use]
    pub fn new(image: QuestionImage, prompt: impl Into<String>, correct_answer: bool) -> Self {
        Self {
            image,
            prompt: prompt.into(),
            correct_answer,
        }
    }

    /// Build a "rating greater than threshold?" question for a movie.
    ///
    /// The expected answer is `yes` only when `rating` is strictly above `threshold`.
    #[must_use]
    pub fn from_rating(image: QuestionImage, rating: f32, threshold: f32) -> Self {
        Self::new(image, rating_prompt(threshold), rating > threshold)
    }

    #[must_use]
    pub fn image(&self) -> &QuestionImage {
        &self.image
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn correct_answer(&self) -> bool {
        self.correct_answer
    }

    /// Returns true when the given yes/no answer matches the expected one.
    #[must_use]
    pub fn is_correct(&self, is_yes: bool) -> bool {
        is_yes == self.correct_answer
    }
}

/// Prompt text for a rating threshold question.
#[must_use]
pub fn rating_prompt(threshold: f32) -> String {
    format!("Is the rating of this movie greater than {threshold}?")
}
