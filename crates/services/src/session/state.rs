/// Lifecycle of a quiz session.
///
/// `AwaitingQuestion -> QuestionShown -> AnswerLocked -> (AwaitingQuestion | RoundComplete)`,
/// preceded by `Loading` (and possibly `LoadFailed`) while the question pool is prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    LoadFailed,
    AwaitingQuestion,
    QuestionShown,
    AnswerLocked,
    RoundComplete,
}

impl SessionState {
    /// Whether yes/no input is currently meaningful.
    #[must_use]
    pub fn accepts_answer(self) -> bool {
        matches!(self, SessionState::QuestionShown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_shown_question_accepts_answer() {
        let states = [
            SessionState::Loading,
            SessionState::LoadFailed,
            SessionState::AwaitingQuestion,
            SessionState::QuestionShown,
            SessionState::AnswerLocked,
            SessionState::RoundComplete,
        ];
        let accepting: Vec<_> = states
            .into_iter()
            .filter(|state| state.accepts_answer())
            .collect();
        assert_eq!(accepting, vec![SessionState::QuestionShown]);
    }
}
