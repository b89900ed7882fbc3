mod game_result;
mod question;
mod round;
mod statistics;

pub use game_result::{GameResult, GameResultError};
pub use question::{Question, QuestionImage, rating_prompt};
pub use round::RoundProgress;
pub use statistics::{StatisticsError, StatisticsRecord};
