//! Per-session actor owning one quiz from lobby to disposal.
//!
//! Every mutation (joins, leaves, answers, host transitions, deadlines) is a
//! message in the session mailbox, so the actor applies exactly one operation
//! at a time and emits events in that order. Deadlines are delivered through
//! the same mailbox, which makes "timer fired" and "last player answered" two
//! competing messages for one idempotent transition.

use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{Instant, sleep_until},
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    state::{
        cursor::{Advance, QuestionCursor},
        dispatcher::{EventDispatcher, EventReceiver},
        errors::SessionError,
        events::{CloseReason, EventPayload},
        leaderboard::{self, LeaderboardEntry},
        ledger::{AnswerLedger, QuestionLedger, QuestionResults, SubmitOutcome},
        pin::Pin,
        question::{PublicQuestion, Question, validate_questions},
        roster::Roster,
        scoring::Scorer,
        state_machine::{PhaseEvent, SessionPhase, SessionStateMachine},
        timer::{DeadlineTimer, TimerToken},
    },
};

/// Capacity of a session mailbox.
const SESSION_MAILBOX: usize = 256;

/// Tunables applied to every session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Scoring policy.
    pub scorer: Scorer,
    /// Answer window for questions without their own limit.
    pub default_time_limit: Duration,
    /// Live player cap.
    pub max_players: usize,
    /// Inactivity after which the session is disposed.
    pub idle_timeout: Duration,
    /// How long an ended session stays readable.
    pub closed_retention: Duration,
}

impl From<&AppConfig> for SessionSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            scorer: Scorer::new(config.base_points),
            default_time_limit: config.default_time_limit,
            max_players: config.max_players,
            idle_timeout: config.idle_timeout,
            closed_retention: config.closed_retention,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Everything needed to open a session.
#[derive(Debug, Clone)]
pub struct NewSession {
    /// PIN reserved for the session.
    pub pin: Pin,
    /// Quiz title.
    pub title: String,
    /// Identity allowed to run host-only operations.
    pub host_id: String,
    /// Ordered, immutable question list.
    pub questions: Vec<Question>,
}

/// Summary of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub pin: Pin,
    pub title: String,
    pub phase: SessionPhase,
    pub question_count: usize,
    pub player_count: usize,
    pub created_at: SystemTime,
}

/// Roster entry as exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStatus {
    pub name: String,
    pub connected: bool,
    pub joined_at: SystemTime,
}

/// State a fresh subscriber needs before consuming events.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub info: SessionInfo,
    /// Live player names in join order.
    pub players: Vec<String>,
    /// Question currently on screen, without its answer.
    pub question: Option<PublicQuestion>,
    /// Time left on the open question.
    pub remaining_ms: Option<u64>,
    /// Sequence number of the last event emitted before this snapshot.
    pub seq: u64,
}

/// Snapshot plus the receiver for every event emitted after it.
#[derive(Debug)]
pub struct Subscription {
    pub id: Uuid,
    pub snapshot: SessionSnapshot,
    pub events: EventReceiver,
}

/// An answer as submitted by a player.
#[derive(Debug, Clone)]
pub struct AnswerSubmission {
    pub player: String,
    pub question_id: u64,
    /// `None` is the explicit "no answer" sentinel.
    pub option: Option<usize>,
    /// Client-measured time since the question was shown; measured by the
    /// session when absent.
    pub elapsed_ms: Option<u64>,
}

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Messages handled by the session actor.
#[derive(Debug)]
enum SessionCommand {
    Join {
        name: String,
        respond_to: Reply<Vec<String>>,
    },
    Leave {
        name: String,
        respond_to: Reply<Vec<String>>,
    },
    Start {
        host_id: String,
        respond_to: Reply<SessionPhase>,
    },
    Advance {
        host_id: String,
        respond_to: Reply<SessionPhase>,
    },
    Submit {
        submission: AnswerSubmission,
        respond_to: Reply<SubmitOutcome>,
    },
    End {
        host_id: String,
        respond_to: Reply<Vec<LeaderboardEntry>>,
    },
    Leaderboard {
        respond_to: Reply<Vec<LeaderboardEntry>>,
    },
    QuestionResults {
        host_id: String,
        index: usize,
        respond_to: Reply<QuestionResults>,
    },
    Info {
        respond_to: Reply<SessionInfo>,
    },
    Players {
        respond_to: Reply<Vec<PlayerStatus>>,
    },
    Subscribe {
        respond_to: Reply<Subscription>,
    },
    DeadlineElapsed {
        token: TimerToken,
    },
}

/// Cloneable handle to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pin: Pin,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// PIN of the session.
    pub fn pin(&self) -> Pin {
        self.pin
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| SessionError::SessionClosed)?;

        rx.await.map_err(|_| SessionError::SessionClosed)?
    }

    /// Add a player to the lobby. Returns the live roster.
    pub async fn join(&self, name: impl Into<String>) -> Result<Vec<String>, SessionError> {
        let name = name.into();
        self.request(|respond_to| SessionCommand::Join { name, respond_to })
            .await
    }

    /// Mark a player as gone. Returns the live roster.
    pub async fn leave(&self, name: impl Into<String>) -> Result<Vec<String>, SessionError> {
        let name = name.into();
        self.request(|respond_to| SessionCommand::Leave { name, respond_to })
            .await
    }

    /// Host starts the quiz.
    pub async fn start(&self, host_id: impl Into<String>) -> Result<SessionPhase, SessionError> {
        let host_id = host_id.into();
        self.request(|respond_to| SessionCommand::Start {
            host_id,
            respond_to,
        })
        .await
    }

    /// Host moves past the reveal or leaderboard.
    pub async fn advance(&self, host_id: impl Into<String>) -> Result<SessionPhase, SessionError> {
        let host_id = host_id.into();
        self.request(|respond_to| SessionCommand::Advance {
            host_id,
            respond_to,
        })
        .await
    }

    /// Record a player's answer to the open question.
    pub async fn submit_answer(
        &self,
        submission: AnswerSubmission,
    ) -> Result<SubmitOutcome, SessionError> {
        self.request(|respond_to| SessionCommand::Submit {
            submission,
            respond_to,
        })
        .await
    }

    /// Host closes the session. Returns the final standings.
    pub async fn end(
        &self,
        host_id: impl Into<String>,
    ) -> Result<Vec<LeaderboardEntry>, SessionError> {
        let host_id = host_id.into();
        self.request(|respond_to| SessionCommand::End {
            host_id,
            respond_to,
        })
        .await
    }

    /// Current standings over closed questions.
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, SessionError> {
        self.request(|respond_to| SessionCommand::Leaderboard { respond_to })
            .await
    }

    /// Host-only answer distribution for a shown question.
    pub async fn question_results(
        &self,
        host_id: impl Into<String>,
        index: usize,
    ) -> Result<QuestionResults, SessionError> {
        let host_id = host_id.into();
        self.request(|respond_to| SessionCommand::QuestionResults {
            host_id,
            index,
            respond_to,
        })
        .await
    }

    /// Session summary.
    pub async fn info(&self) -> Result<SessionInfo, SessionError> {
        self.request(|respond_to| SessionCommand::Info { respond_to })
            .await
    }

    /// Every player ever admitted, with liveness.
    pub async fn players(&self) -> Result<Vec<PlayerStatus>, SessionError> {
        self.request(|respond_to| SessionCommand::Players { respond_to })
            .await
    }

    /// Attach a subscriber, receiving a snapshot consistent with the event stream.
    pub async fn subscribe(&self) -> Result<Subscription, SessionError> {
        self.request(|respond_to| SessionCommand::Subscribe { respond_to })
            .await
    }
}

/// Actor owning the state of one session.
pub struct SessionActor {
    pin: Pin,
    title: String,
    host_id: String,
    created_at: SystemTime,
    settings: SessionSettings,
    receiver: mpsc::Receiver<SessionCommand>,
    mailbox: mpsc::WeakSender<SessionCommand>,
    machine: SessionStateMachine,
    roster: Roster,
    cursor: QuestionCursor,
    ledger: AnswerLedger,
    dispatcher: EventDispatcher,
    timer: DeadlineTimer,
    question_shown_at: Option<Instant>,
    last_activity: Instant,
    closed_at: Option<Instant>,
    final_standings: Option<Vec<LeaderboardEntry>>,
}

impl SessionActor {
    /// Validate the question list and spawn the actor in the lobby.
    pub fn spawn(
        new: NewSession,
        settings: SessionSettings,
    ) -> Result<(SessionHandle, JoinHandle<()>), SessionError> {
        validate_questions(&new.questions)?;

        let (sender, receiver) = mpsc::channel(SESSION_MAILBOX);
        let questions: Arc<[Question]> = new.questions.into();

        let actor = Self {
            pin: new.pin,
            title: new.title,
            host_id: new.host_id,
            created_at: SystemTime::now(),
            receiver,
            mailbox: sender.downgrade(),
            machine: SessionStateMachine::new(questions.len()),
            roster: Roster::new(settings.max_players),
            cursor: QuestionCursor::new(questions),
            ledger: AnswerLedger::new(settings.scorer),
            dispatcher: EventDispatcher::new(),
            timer: DeadlineTimer::new(),
            question_shown_at: None,
            last_activity: Instant::now(),
            closed_at: None,
            final_standings: None,
            settings,
        };

        let task = tokio::spawn(actor.run());
        let handle = SessionHandle {
            pin: new.pin,
            sender,
        };

        Ok((handle, task))
    }

    #[instrument(skip_all, name = "session", fields(pin = %self.pin))]
    async fn run(mut self) {
        info!(questions = self.cursor.count(), "session opened");

        loop {
            let expires_at = self.expires_at();
            tokio::select! {
                command = self.receiver.recv() => match command {
                    Some(command) => self.handle(command),
                    None => {
                        info!("all handles dropped; stopping session");
                        break;
                    }
                },
                () = sleep_until(expires_at) => {
                    self.expire();
                    break;
                }
            }
        }

        self.timer.cancel();
        info!(
            subscribers = self.dispatcher.subscriber_count(),
            "session disposed"
        );
    }

    fn handle(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Join { name, respond_to } => {
                let result = self.join(&name);
                self.respond(respond_to, result, "join");
            }
            SessionCommand::Leave { name, respond_to } => {
                let result = self.leave(&name);
                self.respond(respond_to, result, "leave");
            }
            SessionCommand::Start {
                host_id,
                respond_to,
            } => {
                let result = self.start(&host_id);
                self.respond(respond_to, result, "start");
            }
            SessionCommand::Advance {
                host_id,
                respond_to,
            } => {
                let result = self.advance(&host_id);
                self.respond(respond_to, result, "advance");
            }
            SessionCommand::Submit {
                submission,
                respond_to,
            } => {
                let result = self.submit(submission);
                self.respond(respond_to, result, "submit_answer");
            }
            SessionCommand::End {
                host_id,
                respond_to,
            } => {
                let result = self.end(&host_id);
                self.respond(respond_to, result, "end");
            }
            SessionCommand::Leaderboard { respond_to } => {
                let _ = respond_to.send(Ok(self.standings()));
            }
            SessionCommand::QuestionResults {
                host_id,
                index,
                respond_to,
            } => {
                let result = self.question_results(&host_id, index);
                reply(respond_to, result, "question_results");
            }
            SessionCommand::Info { respond_to } => {
                let _ = respond_to.send(Ok(self.info()));
            }
            SessionCommand::Players { respond_to } => {
                let players = self
                    .roster
                    .all()
                    .map(|(_, player)| PlayerStatus {
                        name: player.name.clone(),
                        connected: player.connected,
                        joined_at: player.joined_at,
                    })
                    .collect();
                let _ = respond_to.send(Ok(players));
            }
            SessionCommand::Subscribe { respond_to } => {
                let subscription = self.subscribe();
                let _ = respond_to.send(Ok(subscription));
            }
            SessionCommand::DeadlineElapsed { token } => {
                if self.timer.fire(token) {
                    self.close_question(CloseReason::Timeout);
                } else {
                    debug!("ignoring stale deadline");
                }
            }
        }
    }

    /// Deliver the reply to a mutating command. Successes count as activity.
    fn respond<T>(&mut self, respond_to: Reply<T>, result: Result<T, SessionError>, op: &str) {
        if result.is_ok() {
            self.last_activity = Instant::now();
        }
        reply(respond_to, result, op);
    }

    fn join(&mut self, name: &str) -> Result<Vec<String>, SessionError> {
        if self.machine.phase() != SessionPhase::Lobby {
            return Err(SessionError::SessionNotJoinable);
        }

        let joined = self.roster.join(name)?.name.clone();
        let players = self.roster.list();
        info!(player = %joined, players = players.len(), "player joined");

        self.dispatcher.emit(EventPayload::RosterJoined {
            name: joined,
            players: players.clone(),
        });
        Ok(players)
    }

    fn leave(&mut self, name: &str) -> Result<Vec<String>, SessionError> {
        if self.machine.phase() == SessionPhase::Closed {
            return Err(SessionError::ReadOnly);
        }

        let left = self.roster.leave(name)?.name.clone();
        let players = self.roster.list();
        info!(player = %left, players = players.len(), "player left");

        self.dispatcher.emit(EventPayload::RosterChanged {
            left,
            players: players.clone(),
        });

        if let SessionPhase::QuestionOpen { index } = self.machine.phase() {
            self.emit_tally(index);
            if self.ledger.has_all_live_answered(&self.roster) {
                self.close_question(CloseReason::AllAnswered);
            }
        }

        Ok(players)
    }

    fn start(&mut self, host_id: &str) -> Result<SessionPhase, SessionError> {
        self.authorize(host_id)?;
        if self.machine.phase() == SessionPhase::Lobby && self.roster.live_count() == 0 {
            return Err(SessionError::RosterEmpty);
        }

        let next = self.machine.apply(PhaseEvent::Start)?;
        info!(players = self.roster.live_count(), "quiz started");

        self.dispatcher.emit(EventPayload::GameStarted {
            question_count: self.cursor.count(),
        });
        self.open_question(0);

        Ok(next)
    }

    fn advance(&mut self, host_id: &str) -> Result<SessionPhase, SessionError> {
        self.authorize(host_id)?;

        let event = self.machine.advance_event();
        let next = self.machine.apply(event)?;
        match next {
            SessionPhase::LeaderboardShown { index } => {
                let entries = self.standings();
                self.dispatcher.emit(EventPayload::LeaderboardShown {
                    index,
                    is_final: false,
                    entries,
                });
            }
            SessionPhase::QuestionOpen { index } => self.open_question(index),
            SessionPhase::FinalResults => {
                let entries = self.standings();
                info!("final results shown");
                self.dispatcher.emit(EventPayload::LeaderboardShown {
                    index: self.cursor.count().saturating_sub(1),
                    is_final: true,
                    entries,
                });
            }
            _ => {}
        }

        Ok(next)
    }

    fn submit(&mut self, submission: AnswerSubmission) -> Result<SubmitOutcome, SessionError> {
        let SessionPhase::QuestionOpen { index } = self.machine.phase() else {
            return Err(SessionError::NotActiveQuestion);
        };

        let measured_ms = self
            .question_shown_at
            .map_or(0, |shown| duration_ms(shown.elapsed()));
        let limit_ms = self.ledger.current().map_or(0, QuestionLedger::limit_ms);
        if measured_ms >= limit_ms {
            // The deadline passed but its message is still queued behind us.
            self.close_question(CloseReason::Timeout);
            return Err(SessionError::NotActiveQuestion);
        }

        let Some(question) = self.cursor.current() else {
            return Err(SessionError::NotActiveQuestion);
        };
        if question.id != submission.question_id {
            return Err(SessionError::NotActiveQuestion);
        }

        let elapsed_ms = submission.elapsed_ms.unwrap_or(measured_ms);
        let outcome = self.ledger.submit(
            &self.roster,
            &submission.player,
            question,
            submission.option,
            elapsed_ms,
        )?;
        debug!(
            player = %submission.player,
            question_index = index,
            points = outcome.points,
            "answer recorded"
        );

        self.emit_tally(index);
        if self.ledger.has_all_live_answered(&self.roster) {
            self.close_question(CloseReason::AllAnswered);
        }

        Ok(outcome)
    }

    fn end(&mut self, host_id: &str) -> Result<Vec<LeaderboardEntry>, SessionError> {
        self.authorize(host_id)?;
        self.machine.apply(PhaseEvent::End)?;

        let entries = self.standings();
        self.final_standings = Some(entries.clone());
        self.closed_at = Some(Instant::now());
        info!(players = entries.len(), "session ended");

        self.dispatcher.emit(EventPayload::GameEnded {
            entries: entries.clone(),
        });
        Ok(entries)
    }

    fn question_results(
        &self,
        host_id: &str,
        index: usize,
    ) -> Result<QuestionResults, SessionError> {
        self.authorize(host_id)?;
        self.ledger
            .question(index)
            .map(QuestionLedger::results)
            .ok_or(SessionError::QuestionNotShown(index))
    }

    fn subscribe(&mut self) -> Subscription {
        let (id, events) = self.dispatcher.subscribe();
        let snapshot = SessionSnapshot {
            info: self.info(),
            players: self.roster.list(),
            question: self
                .machine
                .is_question_open()
                .then(|| self.cursor.current().map(Question::public))
                .flatten(),
            remaining_ms: self.timer.remaining().map(duration_ms),
            seq: self.dispatcher.seq(),
        };
        info!(subscriber = %id, seq = snapshot.seq, "subscriber attached");

        Subscription {
            id,
            snapshot,
            events,
        }
    }

    fn info(&self) -> SessionInfo {
        SessionInfo {
            pin: self.pin,
            title: self.title.clone(),
            phase: self.machine.phase(),
            question_count: self.cursor.count(),
            player_count: self.roster.live_count(),
            created_at: self.created_at,
        }
    }

    fn authorize(&self, host_id: &str) -> Result<(), SessionError> {
        if host_id == self.host_id {
            Ok(())
        } else {
            Err(SessionError::NotHost)
        }
    }

    fn standings(&self) -> Vec<LeaderboardEntry> {
        match &self.final_standings {
            Some(entries) => entries.clone(),
            None => leaderboard::compute(&self.roster, &self.ledger),
        }
    }

    fn open_question(&mut self, index: usize) {
        let question = match self.cursor.advance() {
            Advance::Question(question) => question.clone(),
            Advance::SessionComplete => {
                warn!(question_index = index, "no question left to open");
                return;
            }
        };

        let limit = question.time_limit(self.settings.default_time_limit);
        let time_limit_ms = duration_ms(limit);
        self.ledger
            .open(index, &question, time_limit_ms, self.roster.live_count());
        self.question_shown_at = Some(Instant::now());
        self.timer.schedule(limit, self.mailbox.clone(), |token| {
            SessionCommand::DeadlineElapsed { token }
        });
        info!(question_index = index, time_limit_ms, "question opened");

        self.dispatcher.emit(EventPayload::QuestionShown {
            index,
            count: self.cursor.count(),
            question: question.public(),
            time_limit_ms,
        });

        if self.roster.live_count() == 0 {
            self.close_question(CloseReason::AllAnswered);
        }
    }

    /// Close the open question. A second trigger for the same question is a no-op.
    fn close_question(&mut self, reason: CloseReason) {
        let SessionPhase::QuestionOpen { index } = self.machine.phase() else {
            debug!(?reason, "question already closed");
            return;
        };
        let Some(question) = self.cursor.current().cloned() else {
            return;
        };
        if let Err(err) = self.machine.apply(PhaseEvent::CloseQuestion) {
            debug!(error = %err, "question already closed");
            return;
        }

        self.timer.cancel();
        self.question_shown_at = None;
        let no_answer = self.ledger.close(&self.roster).unwrap_or(0);
        let (results, answered, eligible) = match self.ledger.current() {
            Some(ledger) => (
                ledger.results(),
                ledger.answered_count(),
                ledger.eligible_at_open(),
            ),
            None => (empty_results(index, &question), 0, 0),
        };
        info!(
            question_index = index,
            ?reason,
            no_answer,
            answered,
            eligible,
            "question closed"
        );

        self.dispatcher.emit(EventPayload::AnswerRevealed {
            index,
            question_id: question.id,
            correct_index: question.correct_index,
            explanation: question.explanation,
            reason,
            results,
        });
    }

    fn emit_tally(&mut self, index: usize) {
        self.dispatcher.emit(EventPayload::AnswerTallyChanged {
            index,
            answered: self.ledger.live_answered_count(&self.roster),
            eligible: self.roster.live_count(),
        });
    }

    fn expires_at(&self) -> Instant {
        match self.closed_at {
            Some(closed_at) => closed_at + self.settings.closed_retention,
            None => self.last_activity + self.settings.idle_timeout,
        }
    }

    fn expire(&mut self) {
        if self.closed_at.is_some() {
            info!("retention elapsed");
            return;
        }

        warn!(phase = ?self.machine.phase(), "session idle for too long; expiring");
        self.dispatcher.emit(EventPayload::Error {
            message: "session expired".into(),
        });
    }
}

fn reply<T>(respond_to: Reply<T>, result: Result<T, SessionError>, op: &str) {
    if let Err(err) = &result {
        debug!(op, conflict = err.is_conflict(), error = %err, "rejected");
    }
    let _ = respond_to.send(result);
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn empty_results(index: usize, question: &Question) -> QuestionResults {
    QuestionResults {
        index,
        question_id: question.id,
        distribution: vec![0; question.options.len()],
        no_answer: 0,
        total_responses: 0,
        correct_index: question.correct_index,
        correct_count: 0,
        accuracy: 0.0,
        closed: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{events::SessionEvent, question::tests::question};

    const HOST: &str = "host-1";

    fn spawn_with(questions: Vec<Question>) -> (SessionHandle, JoinHandle<()>) {
        SessionActor::spawn(
            NewSession {
                pin: "123456".parse().unwrap(),
                title: "Capitals".into(),
                host_id: HOST.into(),
                questions,
            },
            SessionSettings::default(),
        )
        .unwrap()
    }

    fn answer(player: &str, question_id: u64, option: usize, elapsed_ms: u64) -> AnswerSubmission {
        AnswerSubmission {
            player: player.into(),
            question_id,
            option: Some(option),
            elapsed_ms: Some(elapsed_ms),
        }
    }

    async fn next_named(events: &mut EventReceiver, name: &str) -> Arc<SessionEvent> {
        loop {
            let event = events.recv().await.expect("event stream ended");
            if event.name() == name {
                return event;
            }
        }
    }

    fn drain(events: &mut EventReceiver) -> Vec<Arc<SessionEvent>> {
        std::iter::from_fn(|| events.try_recv().ok()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_player_gets_the_sentinel() {
        let (handle, _task) = spawn_with(vec![question(1, 1)]);
        let mut events = handle.subscribe().await.unwrap().events;
        handle.join("Ana").await.unwrap();
        handle.join("Ben").await.unwrap();
        handle.start(HOST).await.unwrap();
        let started = Instant::now();

        let outcome = handle.submit_answer(answer("Ana", 1, 1, 5_000)).await.unwrap();
        assert!(outcome.is_correct);
        assert_eq!(outcome.points, 875);

        let revealed = next_named(&mut events, "answer-revealed").await;
        assert!(started.elapsed() >= Duration::from_secs(20));
        match &revealed.payload {
            EventPayload::AnswerRevealed {
                reason, results, ..
            } => {
                assert_eq!(*reason, CloseReason::Timeout);
                assert_eq!(results.total_responses, 2);
                assert_eq!(results.no_answer, 1);
            }
            other => panic!("unexpected payload: {other:?}"),
        }

        let board = handle.leaderboard().await.unwrap();
        let standings = board
            .iter()
            .map(|entry| (entry.name.as_str(), entry.points))
            .collect::<Vec<_>>();
        assert_eq!(standings, vec![("Ana", 875), ("Ben", 0)]);
        assert_eq!(
            handle.info().await.unwrap().phase,
            SessionPhase::AnswerRevealed { index: 0 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn all_answered_closes_once_before_the_deadline() {
        let (handle, _task) = spawn_with(vec![question(1, 0), question(2, 0)]);
        let mut events = handle.subscribe().await.unwrap().events;
        handle.join("Ana").await.unwrap();
        handle.join("Ben").await.unwrap();
        handle.start(HOST).await.unwrap();
        let started = Instant::now();

        handle.submit_answer(answer("Ana", 1, 0, 1_000)).await.unwrap();
        handle.submit_answer(answer("Ben", 1, 2, 2_000)).await.unwrap();

        let revealed = next_named(&mut events, "answer-revealed").await;
        assert!(started.elapsed() < Duration::from_secs(20));
        assert!(matches!(
            revealed.payload,
            EventPayload::AnswerRevealed {
                reason: CloseReason::AllAnswered,
                ..
            }
        ));

        tokio::time::advance(Duration::from_secs(30)).await;
        let info = handle.info().await.unwrap();
        assert_eq!(info.phase, SessionPhase::AnswerRevealed { index: 0 });
        assert!(
            drain(&mut events)
                .iter()
                .all(|event| event.name() != "answer-revealed")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_duplicate_answers_accept_exactly_one() {
        let (handle, _task) = spawn_with(vec![question(1, 0)]);
        handle.join("Ana").await.unwrap();
        handle.join("Ben").await.unwrap();
        handle.start(HOST).await.unwrap();

        let (first, second) = tokio::join!(
            handle.submit_answer(answer("Ana", 1, 0, 100)),
            handle.submit_answer(answer("ana", 1, 3, 200)),
        );

        let results = [first, second];
        assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .any(|result| result == &Err(SessionError::AlreadyAnswered))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn name_is_reusable_after_leaving() {
        let (handle, _task) = spawn_with(vec![question(1, 0)]);
        handle.join("Ana").await.unwrap();

        assert_eq!(
            handle.join("ANA").await,
            Err(SessionError::NameTaken("ANA".into()))
        );
        handle.leave("Ana").await.unwrap();
        assert_eq!(handle.join("Ana").await.unwrap(), vec!["Ana".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn non_host_cannot_start() {
        let (handle, _task) = spawn_with(vec![question(1, 0)]);
        handle.join("Ana").await.unwrap();

        assert_eq!(handle.start("intruder").await, Err(SessionError::NotHost));
        assert_eq!(handle.info().await.unwrap().phase, SessionPhase::Lobby);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_lobby_cannot_start() {
        let (handle, _task) = spawn_with(vec![question(1, 0)]);
        assert_eq!(handle.start(HOST).await, Err(SessionError::RosterEmpty));
    }

    #[tokio::test(start_paused = true)]
    async fn joins_are_refused_once_started() {
        let (handle, _task) = spawn_with(vec![question(1, 0)]);
        handle.join("Ana").await.unwrap();
        handle.start(HOST).await.unwrap();

        assert_eq!(
            handle.join("Ben").await,
            Err(SessionError::SessionNotJoinable)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn leaving_the_last_unanswered_player_closes_the_question() {
        let (handle, _task) = spawn_with(vec![question(1, 0)]);
        let mut events = handle.subscribe().await.unwrap().events;
        handle.join("Ana").await.unwrap();
        handle.join("Ben").await.unwrap();
        handle.start(HOST).await.unwrap();

        handle.submit_answer(answer("Ana", 1, 0, 100)).await.unwrap();
        handle.leave("Ben").await.unwrap();

        let revealed = next_named(&mut events, "answer-revealed").await;
        match &revealed.payload {
            EventPayload::AnswerRevealed {
                reason, results, ..
            } => {
                assert_eq!(*reason, CloseReason::AllAnswered);
                assert_eq!(results.total_responses, 1);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn tally_counts_only_players_still_live() {
        let (handle, _task) = spawn_with(vec![question(1, 0)]);
        handle.join("Ana").await.unwrap();
        handle.join("Ben").await.unwrap();
        handle.join("Cy").await.unwrap();
        handle.start(HOST).await.unwrap();
        handle.submit_answer(answer("Ana", 1, 0, 100)).await.unwrap();
        handle.submit_answer(answer("Ben", 1, 1, 100)).await.unwrap();

        let mut events = handle.subscribe().await.unwrap().events;
        handle.leave("Ana").await.unwrap();
        handle.leave("Ben").await.unwrap();

        let tallies = drain(&mut events)
            .iter()
            .filter_map(|event| match event.payload {
                EventPayload::AnswerTallyChanged {
                    answered, eligible, ..
                } => Some((answered, eligible)),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(tallies, vec![(1, 2), (0, 1)]);
        assert_eq!(
            handle.info().await.unwrap().phase,
            SessionPhase::QuestionOpen { index: 0 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_question_and_late_answers_are_rejected() {
        let (handle, _task) = spawn_with(vec![question(1, 0), question(2, 0)]);
        handle.join("Ana").await.unwrap();
        handle.join("Ben").await.unwrap();
        handle.start(HOST).await.unwrap();

        assert_eq!(
            handle.submit_answer(answer("Ana", 2, 0, 100)).await,
            Err(SessionError::NotActiveQuestion)
        );
        assert!(matches!(
            handle.submit_answer(answer("Zed", 1, 0, 100)).await,
            Err(SessionError::PlayerUnknown(_))
        ));

        tokio::time::advance(Duration::from_secs(21)).await;
        assert_eq!(
            handle.submit_answer(answer("Ana", 1, 0, 100)).await,
            Err(SessionError::NotActiveQuestion)
        );
        assert_eq!(
            handle.info().await.unwrap().phase,
            SessionPhase::AnswerRevealed { index: 0 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn measured_elapsed_time_is_used_when_absent() {
        let (handle, _task) = spawn_with(vec![question(1, 0)]);
        handle.join("Ana").await.unwrap();
        handle.join("Ben").await.unwrap();
        handle.start(HOST).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        let outcome = handle
            .submit_answer(AnswerSubmission {
                player: "Ana".into(),
                question_id: 1,
                option: Some(0),
                elapsed_ms: None,
            })
            .await
            .unwrap();
        assert_eq!(outcome.points, 875);
    }

    #[tokio::test(start_paused = true)]
    async fn full_game_ends_with_frozen_standings() {
        let (handle, task) = spawn_with(vec![question(1, 0), question(2, 1)]);
        let mut events = handle.subscribe().await.unwrap().events;
        handle.join("Ana").await.unwrap();
        handle.start(HOST).await.unwrap();

        handle.submit_answer(answer("Ana", 1, 0, 0)).await.unwrap();
        assert_eq!(
            handle.advance(HOST).await.unwrap(),
            SessionPhase::LeaderboardShown { index: 0 }
        );
        assert_eq!(
            handle.advance(HOST).await.unwrap(),
            SessionPhase::QuestionOpen { index: 1 }
        );
        assert!(matches!(
            handle.advance(HOST).await,
            Err(SessionError::InvalidTransition(_))
        ));
        handle.submit_answer(answer("Ana", 2, 1, 0)).await.unwrap();
        handle.advance(HOST).await.unwrap();
        assert!(matches!(
            handle.end(HOST).await,
            Err(SessionError::InvalidTransition(_))
        ));
        assert_eq!(
            handle.advance(HOST).await.unwrap(),
            SessionPhase::FinalResults
        );
        assert_eq!(handle.end("intruder").await, Err(SessionError::NotHost));

        let finals = handle.end(HOST).await.unwrap();
        assert_eq!(finals[0].points, 2000);
        assert_eq!(handle.leaderboard().await.unwrap(), finals);
        assert_eq!(handle.leave("Ana").await, Err(SessionError::ReadOnly));

        let names = drain(&mut events)
            .iter()
            .map(|event| event.name())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "roster-joined",
                "game-started",
                "question-shown",
                "answer-tally-changed",
                "answer-revealed",
                "leaderboard-shown",
                "question-shown",
                "answer-tally-changed",
                "answer-revealed",
                "leaderboard-shown",
                "leaderboard-shown",
                "game-ended",
            ]
        );

        // Retention elapses and the actor stops.
        task.await.unwrap();
        assert_eq!(handle.info().await, Err(SessionError::SessionClosed));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_session_expires_with_an_error_event() {
        let (handle, task) = spawn_with(vec![question(1, 0)]);
        let mut events = handle.subscribe().await.unwrap().events;

        task.await.unwrap();
        let expired = next_named(&mut events, "error").await;
        assert_eq!(
            expired.payload,
            EventPayload::Error {
                message: "session expired".into()
            }
        );
        assert!(handle.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn reading_results_does_not_keep_the_session_alive() {
        let (handle, task) = spawn_with(vec![question(1, 0), question(2, 0)]);
        handle.join("Ana").await.unwrap();
        handle.start(HOST).await.unwrap();
        handle.submit_answer(answer("Ana", 1, 0, 10)).await.unwrap();
        let last_mutation = Instant::now();

        tokio::time::advance(Duration::from_secs(20 * 60)).await;
        handle.question_results(HOST, 0).await.unwrap();
        handle.leaderboard().await.unwrap();

        task.await.unwrap();
        assert!(last_mutation.elapsed() < Duration::from_secs(31 * 60));
        assert!(handle.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn subscription_snapshot_lines_up_with_events() {
        let (handle, _task) = spawn_with(vec![question(1, 0)]);
        handle.join("Ana").await.unwrap();
        handle.join("Ben").await.unwrap();
        handle.start(HOST).await.unwrap();

        let subscription = handle.subscribe().await.unwrap();
        assert_eq!(subscription.snapshot.seq, 4);
        assert_eq!(subscription.snapshot.players, vec!["Ana", "Ben"]);
        assert_eq!(subscription.snapshot.question.unwrap().id, 1);
        assert_eq!(subscription.snapshot.remaining_ms, Some(20_000));

        let mut events = subscription.events;
        handle.submit_answer(answer("Ana", 1, 0, 10)).await.unwrap();
        assert_eq!(events.recv().await.unwrap().seq, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn question_results_are_host_only() {
        let (handle, _task) = spawn_with(vec![question(1, 2)]);
        handle.join("Ana").await.unwrap();
        handle.start(HOST).await.unwrap();
        handle.submit_answer(answer("Ana", 1, 2, 10)).await.unwrap();

        assert_eq!(
            handle.question_results("intruder", 0).await,
            Err(SessionError::NotHost)
        );
        assert_eq!(
            handle.question_results(HOST, 3).await,
            Err(SessionError::QuestionNotShown(3))
        );
        let results = handle.question_results(HOST, 0).await.unwrap();
        assert_eq!(results.distribution, vec![0, 0, 1, 0]);
        assert_eq!(results.accuracy, 100.0);
    }
}
