use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, sleep_until},
};

/// Identifies one scheduled deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

struct Armed {
    token: TimerToken,
    deadline: Instant,
    task: JoinHandle<()>,
}

/// Single-shot deadline that posts a message into an actor mailbox.
///
/// The firing task only enqueues; the owner decides whether the delivered
/// token is still current through [`DeadlineTimer::fire`]. Cancelling or
/// rescheduling disarms the previous token, so a message already sitting in the
/// mailbox is recognised as stale and ignored.
#[derive(Default)]
pub struct DeadlineTimer {
    next_token: u64,
    armed: Option<Armed>,
}

impl DeadlineTimer {
    /// Create a timer with nothing scheduled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer for `after` from now, replacing any previous deadline.
    ///
    /// When it elapses, `make(token)` is sent to `mailbox`. The timer holds only a
    /// weak sender so a pending deadline never keeps the receiving actor alive.
    pub fn schedule<M, F>(
        &mut self,
        after: Duration,
        mailbox: mpsc::WeakSender<M>,
        make: F,
    ) -> TimerToken
    where
        M: Send + 'static,
        F: FnOnce(TimerToken) -> M + Send + 'static,
    {
        self.cancel();

        self.next_token += 1;
        let token = TimerToken(self.next_token);
        let deadline = Instant::now() + after;

        let task = tokio::spawn(async move {
            sleep_until(deadline).await;
            if let Some(sender) = mailbox.upgrade() {
                let _ = sender.send(make(token)).await;
            }
        });

        self.armed = Some(Armed {
            token,
            deadline,
            task,
        });

        token
    }

    /// Disarm the current deadline, if any.
    pub fn cancel(&mut self) {
        if let Some(armed) = self.armed.take() {
            armed.task.abort();
        }
    }

    /// Consume a delivered token. Returns `true` only for the currently armed one.
    pub fn fire(&mut self, token: TimerToken) -> bool {
        match &self.armed {
            Some(armed) if armed.token == token => {
                self.armed = None;
                true
            }
            _ => false,
        }
    }

    /// Whether a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Time left before the armed deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.armed
            .as_ref()
            .map(|armed| armed.deadline.saturating_duration_since(Instant::now()))
    }
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
