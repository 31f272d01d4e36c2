use std::{cmp::Reverse, collections::HashMap};

use serde::Serialize;
use utoipa::ToSchema;

use crate::state::{ledger::AnswerLedger, roster::Roster};

/// Ranked standing of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    /// 1-based position; unique across the board.
    pub rank: usize,
    /// Player display name.
    pub name: String,
    /// Cumulative points over closed questions.
    pub points: u64,
    /// Closed questions the player actually answered (sentinels excluded).
    pub answered: usize,
    /// Whether the player is still live.
    pub connected: bool,
}

#[derive(Default)]
struct Tally {
    points: u64,
    answered: usize,
    reached_at: Option<usize>,
}

/// Derive standings from every closed question in the ledger.
///
/// Order: points descending, then whoever reached their total at the earlier
/// question, then normalized name. Pure, so repeated calls agree.
pub fn compute(roster: &Roster, ledger: &AnswerLedger) -> Vec<LeaderboardEntry> {
    let mut tallies: HashMap<&str, Tally> = HashMap::new();

    for question in ledger.closed_questions() {
        for (key, record) in question.answers() {
            let tally = tallies.entry(key).or_default();
            if record.option.is_some() {
                tally.answered += 1;
            }
            if record.points > 0 {
                tally.points += record.points;
                tally.reached_at = Some(question.index());
            }
        }
    }

    let mut rows = roster
        .all()
        .map(|(key, player)| {
            let tally = tallies.remove(key).unwrap_or_default();
            (key, player, tally)
        })
        .collect::<Vec<_>>();

    rows.sort_by_key(|(key, _, tally)| (Reverse(tally.points), tally.reached_at, *key));

    rows.into_iter()
        .enumerate()
        .map(|(position, (_, player, tally))| LeaderboardEntry {
            rank: position + 1,
            name: player.name.clone(),
            points: tally.points,
            answered: tally.answered,
            connected: player.connected,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        question::{Question, tests::question},
        scoring::Scorer,
    };

    struct Quiz {
        roster: Roster,
        ledger: AnswerLedger,
        questions: Vec<Question>,
    }

    impl Quiz {
        fn new(players: &[&str], questions: usize) -> Self {
            let mut roster = Roster::new(100);
            for name in players {
                roster.join(name).unwrap();
            }
            Self {
                roster,
                ledger: AnswerLedger::new(Scorer::default()),
                questions: (0..questions as u64).map(|id| question(id, 0)).collect(),
            }
        }

        /// Play question `index`, with each (name, option, elapsed) answer.
        fn play(&mut self, index: usize, answers: &[(&str, usize, u64)]) {
            let q = &self.questions[index];
            self.ledger
                .open(index, q, 20_000, self.roster.live_count());
            for (name, option, elapsed) in answers {
                self.ledger
                    .submit(&self.roster, name, q, Some(*option), *elapsed)
                    .unwrap();
            }
            self.ledger.close(&self.roster);
        }

        fn board(&self) -> Vec<(String, u64, usize)> {
            compute(&self.roster, &self.ledger)
                .into_iter()
                .map(|entry| (entry.name, entry.points, entry.rank))
                .collect()
        }
    }

    #[test]
    fn ranks_by_points_descending() {
        let mut quiz = Quiz::new(&["Ana", "Ben"], 1);
        quiz.play(0, &[("Ana", 0, 5_000)]);

        assert_eq!(
            quiz.board(),
            vec![("Ana".into(), 875, 1), ("Ben".into(), 0, 2)]
        );
    }

    #[test]
    fn earlier_achiever_wins_a_tie() {
        let mut quiz = Quiz::new(&["Zoe", "Ana"], 2);
        // Zoe scores 1000 on the first question, Ana on the second.
        quiz.play(0, &[("Zoe", 0, 0), ("Ana", 1, 0)]);
        quiz.play(1, &[("Zoe", 1, 0), ("Ana", 0, 0)]);

        assert_eq!(
            quiz.board(),
            vec![("Zoe".into(), 1000, 1), ("Ana".into(), 1000, 2)]
        );
    }

    #[test]
    fn remaining_ties_fall_back_to_name() {
        let mut quiz = Quiz::new(&["bob", "Ana", "Cy"], 1);
        quiz.play(0, &[("Cy", 0, 0), ("bob", 0, 0), ("Ana", 0, 0)]);

        let names = quiz
            .board()
            .into_iter()
            .map(|(name, _, _)| name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Ana", "bob", "Cy"]);
    }

    #[test]
    fn open_question_is_not_counted() {
        let mut quiz = Quiz::new(&["Ana"], 2);
        quiz.play(0, &[("Ana", 0, 0)]);
        let q = quiz.questions[1].clone();
        quiz.ledger.open(1, &q, 20_000, 1);
        quiz.ledger
            .submit(&quiz.roster, "Ana", &q, Some(0), 0)
            .unwrap();

        assert_eq!(quiz.board(), vec![("Ana".into(), 1000, 1)]);
    }

    #[test]
    fn departed_players_keep_their_standing() {
        let mut quiz = Quiz::new(&["Ana", "Ben"], 1);
        quiz.play(0, &[("Ben", 0, 0)]);
        quiz.roster.leave("Ben").unwrap();

        let board = compute(&quiz.roster, &quiz.ledger);
        assert_eq!(board[0].name, "Ben");
        assert!(!board[0].connected);
        assert_eq!(board[0].answered, 1);
    }

    #[test]
    fn compute_is_idempotent() {
        let mut quiz = Quiz::new(&["Ana", "Ben", "Cy"], 1);
        quiz.play(0, &[("Ben", 0, 3_000), ("Ana", 0, 3_000)]);

        let first = compute(&quiz.roster, &quiz.ledger);
        let second = compute(&quiz.roster, &quiz.ledger);
        assert_eq!(first, second);
    }
}
