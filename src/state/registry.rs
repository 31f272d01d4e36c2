use std::{sync::Arc, time::Duration};

use dashmap::{DashMap, mapref::entry::Entry};
use thiserror::Error;
use tracing::{debug, info};

use crate::state::{
    errors::SessionError,
    pin::Pin,
    question::{Question, validate_questions},
    session::{NewSession, SessionActor, SessionHandle, SessionSettings},
};

/// Attempts at drawing an unused PIN before giving up.
const MAX_PIN_ATTEMPTS: usize = 100;

/// Reasons a session could not be registered.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no free session PIN available")]
    PinsExhausted,
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// PIN to session map; the only structure shared between sessions.
pub struct SessionRegistry {
    sessions: DashMap<Pin, SessionHandle>,
    settings: SessionSettings,
}

impl SessionRegistry {
    /// Create an empty registry spawning sessions with `settings`.
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            sessions: DashMap::new(),
            settings,
        }
    }

    /// Spawn a session under a fresh PIN.
    ///
    /// The PIN is reserved and the actor spawned while holding the map entry, so
    /// two concurrent creations never share a PIN.
    pub fn create(
        &self,
        title: String,
        host_id: String,
        questions: Vec<Question>,
    ) -> Result<SessionHandle, RegistryError> {
        validate_questions(&questions).map_err(SessionError::from)?;

        for _ in 0..MAX_PIN_ATTEMPTS {
            let pin = Pin::random();
            let new = NewSession {
                pin,
                title: title.clone(),
                host_id: host_id.clone(),
                questions: questions.clone(),
            };

            match self.sessions.entry(pin) {
                Entry::Occupied(mut occupied) if occupied.get().is_closed() => {
                    let (handle, _task) = SessionActor::spawn(new, self.settings.clone())?;
                    occupied.insert(handle.clone());
                    info!(%pin, "session created over a stale PIN");
                    return Ok(handle);
                }
                Entry::Occupied(_) => continue,
                Entry::Vacant(vacant) => {
                    let (handle, _task) = SessionActor::spawn(new, self.settings.clone())?;
                    vacant.insert(handle.clone());
                    info!(%pin, "session created");
                    return Ok(handle);
                }
            }
        }

        Err(RegistryError::PinsExhausted)
    }

    /// Handle of a live session. Disposed sessions read as absent.
    pub fn get(&self, pin: &Pin) -> Option<SessionHandle> {
        self.sessions
            .get(pin)
            .map(|entry| entry.value().clone())
            .filter(|handle| !handle.is_closed())
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions
            .iter()
            .filter(|entry| !entry.value().is_closed())
            .count()
    }

    /// Whether no session is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries whose actor has stopped. Returns how many were removed.
    pub fn reap(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|pin, handle| {
            let keep = !handle.is_closed();
            if !keep {
                debug!(%pin, "releasing PIN of disposed session");
            }
            keep
        });
        before.saturating_sub(self.sessions.len())
    }

    /// Periodically reap disposed sessions. Runs until the task is dropped.
    pub async fn run_reaper(self: Arc<Self>, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let removed = self.reap();
            if removed > 0 {
                info!(removed, live = self.sessions.len(), "reaped disposed sessions");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::state::question::{QuestionSetError, tests::question};

    fn registry(idle_timeout: Duration) -> SessionRegistry {
        SessionRegistry::new(SessionSettings {
            idle_timeout,
            ..SessionSettings::default()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn created_sessions_get_distinct_pins() {
        let registry = registry(Duration::from_secs(60));
        let pins = (0..50)
            .map(|_| {
                registry
                    .create("Quiz".into(), "host".into(), vec![question(1, 0)])
                    .unwrap()
                    .pin()
            })
            .collect::<HashSet<_>>();

        assert_eq!(pins.len(), 50);
        assert_eq!(registry.len(), 50);
        for pin in &pins {
            assert_eq!(registry.get(pin).unwrap().pin(), *pin);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn empty_question_set_is_refused() {
        let registry = registry(Duration::from_secs(60));
        let err = registry
            .create("Quiz".into(), "host".into(), Vec::new())
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Session(SessionError::InvalidQuestionSet(QuestionSetError::Empty))
        ));
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn disposed_sessions_read_as_absent_and_get_reaped() {
        let registry = registry(Duration::from_secs(1));
        let handle = registry
            .create("Quiz".into(), "host".into(), vec![question(1, 0)])
            .unwrap();
        let pin = handle.pin();

        tokio::time::sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;

        assert!(handle.is_closed());
        assert!(registry.get(&pin).is_none());
        assert_eq!(registry.reap(), 1);
        assert_eq!(registry.reap(), 0);
    }
}
