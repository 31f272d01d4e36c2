use thiserror::Error;

/// High-level phases a quiz session moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Players are joining; nothing has been asked yet.
    Lobby,
    /// A question is accepting answers.
    QuestionOpen {
        /// Zero-based index of the open question.
        index: usize,
    },
    /// Answers are locked and the correct option is shown.
    AnswerRevealed {
        /// Zero-based index of the question just closed.
        index: usize,
    },
    /// Standings after a closed question are displayed.
    LeaderboardShown {
        /// Zero-based index of the last closed question.
        index: usize,
    },
    /// Every question has been played; the podium is displayed.
    FinalResults,
    /// Session is read-only and awaiting disposal.
    Closed,
}

impl SessionPhase {
    /// Index of the question the phase refers to, if any.
    pub fn question_index(&self) -> Option<usize> {
        match self {
            SessionPhase::QuestionOpen { index }
            | SessionPhase::AnswerRevealed { index }
            | SessionPhase::LeaderboardShown { index } => Some(*index),
            _ => None,
        }
    }
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// Host starts the quiz from the lobby.
    Start,
    /// Deadline elapsed or every live player answered.
    CloseQuestion,
    /// Host moves from the reveal to the standings.
    ShowLeaderboard,
    /// Host opens the following question.
    NextQuestion,
    /// Host moves past the last question to the podium.
    Finish,
    /// Host closes the session for good.
    End,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: SessionPhase,
    /// The event that cannot be applied from this phase.
    pub event: PhaseEvent,
}

/// State machine implementing the lobby to podium flow of one session.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    phase: SessionPhase,
    question_count: usize,
}

impl SessionStateMachine {
    /// Create a machine in the lobby for a quiz with `question_count` questions.
    pub fn new(question_count: usize) -> Self {
        Self {
            phase: SessionPhase::Lobby,
            question_count,
        }
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether a question is currently accepting answers.
    pub fn is_question_open(&self) -> bool {
        matches!(self.phase, SessionPhase::QuestionOpen { .. })
    }

    /// Event the host's "advance" maps to from the current phase.
    ///
    /// Outside the reveal and leaderboard phases this is `ShowLeaderboard`,
    /// which [`apply`](Self::apply) then rejects with the phase attached.
    pub fn advance_event(&self) -> PhaseEvent {
        match self.phase {
            SessionPhase::LeaderboardShown { index } if index + 1 < self.question_count => {
                PhaseEvent::NextQuestion
            }
            SessionPhase::LeaderboardShown { .. } => PhaseEvent::Finish,
            _ => PhaseEvent::ShowLeaderboard,
        }
    }

    /// Apply `event`, moving to the next phase. Invalid events leave the machine untouched.
    pub fn apply(&mut self, event: PhaseEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: PhaseEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (SessionPhase::Lobby, PhaseEvent::Start) if self.question_count > 0 => {
                SessionPhase::QuestionOpen { index: 0 }
            }
            (SessionPhase::QuestionOpen { index }, PhaseEvent::CloseQuestion) => {
                SessionPhase::AnswerRevealed { index }
            }
            (SessionPhase::AnswerRevealed { index }, PhaseEvent::ShowLeaderboard) => {
                SessionPhase::LeaderboardShown { index }
            }
            (SessionPhase::LeaderboardShown { index }, PhaseEvent::NextQuestion)
                if index + 1 < self.question_count =>
            {
                SessionPhase::QuestionOpen { index: index + 1 }
            }
            (SessionPhase::LeaderboardShown { index }, PhaseEvent::Finish)
                if index + 1 == self.question_count =>
            {
                SessionPhase::FinalResults
            }
            (SessionPhase::FinalResults, PhaseEvent::End) => SessionPhase::Closed,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut SessionStateMachine, event: PhaseEvent) -> SessionPhase {
        sm.apply(event).unwrap()
    }

    #[test]
    fn initial_state_is_lobby() {
        let sm = SessionStateMachine::new(2);
        assert_eq!(sm.phase(), SessionPhase::Lobby);
        assert!(!sm.is_question_open());
    }

    #[test]
    fn full_happy_path_through_quiz() {
        let mut sm = SessionStateMachine::new(2);

        assert_eq!(
            apply(&mut sm, PhaseEvent::Start),
            SessionPhase::QuestionOpen { index: 0 }
        );
        assert_eq!(
            apply(&mut sm, PhaseEvent::CloseQuestion),
            SessionPhase::AnswerRevealed { index: 0 }
        );
        assert_eq!(
            apply(&mut sm, PhaseEvent::ShowLeaderboard),
            SessionPhase::LeaderboardShown { index: 0 }
        );
        assert_eq!(sm.advance_event(), PhaseEvent::NextQuestion);
        assert_eq!(
            apply(&mut sm, PhaseEvent::NextQuestion),
            SessionPhase::QuestionOpen { index: 1 }
        );
        apply(&mut sm, PhaseEvent::CloseQuestion);
        apply(&mut sm, PhaseEvent::ShowLeaderboard);
        assert_eq!(sm.advance_event(), PhaseEvent::Finish);
        assert_eq!(apply(&mut sm, PhaseEvent::Finish), SessionPhase::FinalResults);
        assert_eq!(apply(&mut sm, PhaseEvent::End), SessionPhase::Closed);
    }

    #[test]
    fn closing_twice_is_rejected() {
        let mut sm = SessionStateMachine::new(1);
        apply(&mut sm, PhaseEvent::Start);
        apply(&mut sm, PhaseEvent::CloseQuestion);

        let err = sm.apply(PhaseEvent::CloseQuestion).unwrap_err();
        assert_eq!(err.from, SessionPhase::AnswerRevealed { index: 0 });
        assert_eq!(err.event, PhaseEvent::CloseQuestion);
    }

    #[test]
    fn next_question_past_the_end_is_rejected() {
        let mut sm = SessionStateMachine::new(1);
        apply(&mut sm, PhaseEvent::Start);
        apply(&mut sm, PhaseEvent::CloseQuestion);
        apply(&mut sm, PhaseEvent::ShowLeaderboard);

        match sm.apply(PhaseEvent::NextQuestion) {
            Err(InvalidTransition { from, event }) => {
                assert_eq!(from, SessionPhase::LeaderboardShown { index: 0 });
                assert_eq!(event, PhaseEvent::NextQuestion);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn invalid_transition_leaves_the_phase_alone() {
        let mut sm = SessionStateMachine::new(3);
        assert!(sm.apply(PhaseEvent::End).is_err());
        assert!(sm.apply(PhaseEvent::Finish).is_err());
        assert_eq!(sm.phase(), SessionPhase::Lobby);
    }

    #[test]
    fn advance_outside_reveal_and_leaderboard_is_rejected() {
        let mut sm = SessionStateMachine::new(1);
        apply(&mut sm, PhaseEvent::Start);

        let event = sm.advance_event();
        let err = sm.apply(event).unwrap_err();
        assert_eq!(err.from, SessionPhase::QuestionOpen { index: 0 });
        assert_eq!(sm.phase(), SessionPhase::QuestionOpen { index: 0 });
    }

    #[test]
    fn empty_quiz_cannot_start() {
        let mut sm = SessionStateMachine::new(0);
        assert!(sm.apply(PhaseEvent::Start).is_err());
    }
}
