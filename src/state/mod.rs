pub mod cursor;
pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod leaderboard;
pub mod ledger;
pub mod pin;
pub mod question;
pub mod registry;
pub mod roster;
pub mod scoring;
pub mod session;
pub mod state_machine;
pub mod timer;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    dao::question_sets::QuestionSetProvider,
    state::{registry::SessionRegistry, session::SessionSettings},
};

pub type SharedState = Arc<AppState>;

/// Central application state: the session registry and its collaborators.
pub struct AppState {
    config: AppConfig,
    registry: Arc<SessionRegistry>,
    question_sets: Arc<dyn QuestionSetProvider>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, question_sets: Arc<dyn QuestionSetProvider>) -> SharedState {
        let registry = Arc::new(SessionRegistry::new(SessionSettings::from(&config)));
        Arc::new(Self {
            config,
            registry,
            question_sets,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Registry of live sessions keyed by PIN.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Source of question banks for new sessions.
    pub fn question_sets(&self) -> &Arc<dyn QuestionSetProvider> {
        &self.question_sets
    }
}
