/// Progress through the round currently being played.
///
/// Lives only as long as the session; it is never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundProgress {
    index: u32,
    correct_count: u32,
}

impl RoundProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-based index of the question being asked.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    /// Returns true when the current question is the last one of a round of
    /// `questions_per_round` questions.
    #[must_use]
    pub fn is_last(&self, questions_per_round: u32) -> bool {
        self.index >= questions_per_round.saturating_sub(1)
    }

    pub fn record_answer(&mut self, correct: bool) {
        if correct {
            self.correct_count = self.correct_count.saturating_add(1);
        }
    }

    pub fn advance(&mut self) {
        self.index = self.index.saturating_add(1);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Human-readable counter, e.g. `"3/10"`.
    #[must_use]
    pub fn label(&self, questions_per_round: u32) -> String {
        format!("{}/{}", self.index.saturating_add(1), questions_per_round)
    }
}
