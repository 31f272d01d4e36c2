use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::{
    errors::SessionError,
    question::Question,
    roster::Roster,
    scoring::Scorer,
};

/// One player's recorded answer to one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerRecord {
    /// Chosen option, or `None` for the "no answer" sentinel.
    pub option: Option<usize>,
    /// Milliseconds between the question being shown and the answer.
    pub elapsed_ms: u64,
    /// Derived correctness.
    pub is_correct: bool,
    /// Derived points.
    pub points: u64,
}

/// Outcome returned to a player whose answer was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Whether the chosen option was correct.
    pub is_correct: bool,
    /// Points awarded for this answer.
    pub points: u64,
    /// Answers recorded so far for the question, including this one.
    pub answered: usize,
}

/// Aggregated view of the answers to one question.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct QuestionResults {
    /// Zero-based index of the question in the quiz.
    pub index: usize,
    /// Identifier of the question.
    pub question_id: u64,
    /// Number of answers per option, in option order.
    pub distribution: Vec<usize>,
    /// Players recorded with the "no answer" sentinel.
    pub no_answer: usize,
    /// All recorded answers, sentinels included.
    pub total_responses: usize,
    /// Index of the correct option.
    pub correct_index: usize,
    /// Number of correct answers.
    pub correct_count: usize,
    /// Share of correct answers in percent; 0 when nobody answered.
    pub accuracy: f64,
    /// Whether the question is closed.
    pub closed: bool,
}

/// Answers recorded for a single question.
#[derive(Debug, Clone)]
pub struct QuestionLedger {
    index: usize,
    question_id: u64,
    correct_index: usize,
    limit_ms: u64,
    eligible_at_open: usize,
    answers: IndexMap<String, AnswerRecord>,
    option_counts: Vec<usize>,
    closed: bool,
}

impl QuestionLedger {
    /// Zero-based question index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Answer window in milliseconds.
    pub fn limit_ms(&self) -> u64 {
        self.limit_ms
    }

    /// Live roster size when the question opened; answers never exceed it.
    pub fn eligible_at_open(&self) -> usize {
        self.eligible_at_open
    }

    /// Number of recorded answers.
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Recorded answers keyed by normalized player name.
    pub fn answers(&self) -> impl Iterator<Item = (&str, &AnswerRecord)> {
        self.answers.iter().map(|(key, record)| (key.as_str(), record))
    }

    /// Aggregate distribution and accuracy.
    pub fn results(&self) -> QuestionResults {
        let total_responses = self.answers.len();
        let no_answer = self
            .answers
            .values()
            .filter(|record| record.option.is_none())
            .count();
        let correct_count = self
            .answers
            .values()
            .filter(|record| record.is_correct)
            .count();
        let accuracy = if total_responses > 0 {
            correct_count as f64 / total_responses as f64 * 100.0
        } else {
            0.0
        };

        QuestionResults {
            index: self.index,
            question_id: self.question_id,
            distribution: self.option_counts.clone(),
            no_answer,
            total_responses,
            correct_index: self.correct_index,
            correct_count,
            accuracy,
            closed: self.closed,
        }
    }
}

/// Per-question, per-player record of answers for a whole session.
///
/// Each player has at most one answer per question; later writes are rejected.
#[derive(Debug, Clone)]
pub struct AnswerLedger {
    scorer: Scorer,
    questions: Vec<QuestionLedger>,
}

impl AnswerLedger {
    /// Create an empty ledger scoring with `scorer`.
    pub fn new(scorer: Scorer) -> Self {
        Self {
            scorer,
            questions: Vec::new(),
        }
    }

    /// Start recording a fresh question, resetting the running counters.
    pub fn open(&mut self, index: usize, question: &Question, limit_ms: u64, eligible: usize) {
        self.questions.push(QuestionLedger {
            index,
            question_id: question.id,
            correct_index: question.correct_index,
            limit_ms,
            eligible_at_open: eligible,
            answers: IndexMap::new(),
            option_counts: vec![0; question.options.len()],
            closed: false,
        });
    }

    /// Record an answer for the open question.
    pub fn submit(
        &mut self,
        roster: &Roster,
        player: &str,
        question: &Question,
        option: Option<usize>,
        elapsed_ms: u64,
    ) -> Result<SubmitOutcome, SessionError> {
        let scorer = self.scorer;
        let ledger = match self.questions.last_mut() {
            Some(ledger) if !ledger.closed && ledger.question_id == question.id => ledger,
            _ => return Err(SessionError::NotActiveQuestion),
        };

        let (key, _) = roster.live_player(player)?;
        if ledger.answers.contains_key(key) {
            return Err(SessionError::AlreadyAnswered);
        }
        if let Some(choice) = option
            && choice >= ledger.option_counts.len()
        {
            return Err(SessionError::InvalidOption(choice));
        }

        let elapsed_ms = elapsed_ms.min(ledger.limit_ms);
        let is_correct = question.is_correct(option);
        let points = scorer.score(is_correct, elapsed_ms, ledger.limit_ms);

        if let Some(choice) = option {
            ledger.option_counts[choice] += 1;
        }
        ledger.answers.insert(
            key.to_string(),
            AnswerRecord {
                option,
                elapsed_ms,
                is_correct,
                points,
            },
        );

        Ok(SubmitOutcome {
            is_correct,
            points,
            answered: ledger.answers.len(),
        })
    }

    /// The question currently being recorded, open or just closed.
    pub fn current(&self) -> Option<&QuestionLedger> {
        self.questions.last()
    }

    /// Answers recorded for the current question by players still live.
    pub fn live_answered_count(&self, roster: &Roster) -> usize {
        self.current().map_or(0, |ledger| {
            roster
                .live_keys()
                .filter(|key| ledger.answers.contains_key(*key))
                .count()
        })
    }

    /// Whether every live player has an answer for the open question.
    ///
    /// An empty live roster counts as everyone having answered.
    pub fn has_all_live_answered(&self, roster: &Roster) -> bool {
        match self.current() {
            Some(ledger) if !ledger.closed => {
                roster.live_keys().all(|key| ledger.answers.contains_key(key))
            }
            _ => false,
        }
    }

    /// Close the open question, recording the sentinel for live players who
    /// did not answer. Returns how many sentinels were written, or `None`
    /// when nothing was open.
    pub fn close(&mut self, roster: &Roster) -> Option<usize> {
        let ledger = self.questions.last_mut().filter(|ledger| !ledger.closed)?;

        let mut filled = 0;
        for key in roster.live_keys() {
            if ledger.answers.contains_key(key) {
                continue;
            }
            ledger.answers.insert(
                key.to_string(),
                AnswerRecord {
                    option: None,
                    elapsed_ms: ledger.limit_ms,
                    is_correct: false,
                    points: 0,
                },
            );
            filled += 1;
        }
        ledger.closed = true;

        Some(filled)
    }

    /// Ledger of the question at `index`, if it has been shown.
    pub fn question(&self, index: usize) -> Option<&QuestionLedger> {
        self.questions.iter().find(|ledger| ledger.index == index)
    }

    /// Closed questions in play order.
    pub fn closed_questions(&self) -> impl Iterator<Item = &QuestionLedger> {
        self.questions.iter().filter(|ledger| ledger.closed)
    }
}
