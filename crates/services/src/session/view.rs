use chrono::{DateTime, Utc};
use quiz_core::model::{GameResult, Question, QuestionImage, RoundProgress, StatisticsRecord};

pub(crate) const ROUND_OVER_TITLE: &str = "This round is over!";
pub(crate) const PLAY_AGAIN_BUTTON: &str = "Play again";
pub(crate) const LOAD_ERROR_TITLE: &str = "Error";
pub(crate) const RETRY_BUTTON: &str = "Try again";

/// View-state for the "question shown" screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizStep {
    pub image: QuestionImage,
    pub question: String,
    pub question_number: String,
}

impl QuizStep {
    /// Pure conversion: the same question at the same index always yields the same step.
    #[must_use]
    pub fn from_question(
        question: &Question,
        progress: &RoundProgress,
        questions_per_round: u32,
    ) -> Self {
        Self {
            image: question.image().clone(),
            question: question.prompt().to_owned(),
            question_number: progress.label(questions_per_round),
        }
    }
}

/// Lifetime figures shown under the round result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifetimeStats {
    pub games_played: u32,
    pub best_game: GameResult,
    pub total_accuracy: f64,
}

impl LifetimeStats {
    #[must_use]
    pub fn from_record(record: &StatisticsRecord, questions_per_round: u32) -> Self {
        Self {
            games_played: record.games_played(),
            best_game: record.best_game(),
            total_accuracy: record.total_accuracy(questions_per_round),
        }
    }
}

/// Result of a completed round.
///
/// `lifetime` is `None` when the statistics could not be updated.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSummary {
    pub correct: u32,
    pub total: u32,
    pub lifetime: Option<LifetimeStats>,
}

impl RoundSummary {
    #[must_use]
    pub fn title(&self) -> &'static str {
        ROUND_OVER_TITLE
    }

    #[must_use]
    pub fn message(&self) -> String {
        let mut lines = vec![format!("Your result: {}/{}", self.correct, self.total)];
        if let Some(lifetime) = &self.lifetime {
            let best = lifetime.best_game;
            lines.push(format!("Quizzes played: {}", lifetime.games_played));
            lines.push(format!(
                "Record: {}/{} ({})",
                best.correct(),
                best.total(),
                format_game_date(best.date())
            ));
            lines.push(format!("Average accuracy: {:.2}%", lifetime.total_accuracy));
        }
        lines.join("\n")
    }
}

/// `dd.MM.yy HH:mm`, in UTC.
#[must_use]
pub fn format_game_date(date: DateTime<Utc>) -> String {
    date.format("%d.%m.%y %H:%M").to_string()
}
