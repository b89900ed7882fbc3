mod feed;
mod movie_source;
mod source;
mod static_source;

pub use feed::{
    HttpMovieFeed, MovieEntry, MovieFeed, MovieFeedConfig, parse_movies, resized_image_url,
};
pub use movie_source::MovieFeedSource;
pub use source::{QuestionListener, QuestionSource};
pub use static_source::{StaticQuestionSource, bundled_questions};
