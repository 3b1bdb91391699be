use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    engine::{clock::Clock, registry::AttemptRegistry},
    store::{exams::ExamStore, results::ResultStore, storage::Storage},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub exams: ExamStore,
    pub results: ResultStore,
    pub attempts: AttemptRegistry,
}

impl AppState {
    /// Wires the stores and the attempt registry over one storage backend.
    pub fn new(config: Config, storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        let exams = ExamStore::new(Arc::clone(&storage), Arc::clone(&clock));
        let results = ResultStore::new(storage);
        let attempts = AttemptRegistry::new(
            results.clone(),
            clock,
            config.session_retention,
            config.session_idle_timeout,
        );
        Self {
            config,
            exams,
            results,
            attempts,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for ExamStore {
    fn from_ref(state: &AppState) -> Self {
        state.exams.clone()
    }
}

impl FromRef<AppState> for ResultStore {
    fn from_ref(state: &AppState) -> Self {
        state.results.clone()
    }
}

impl FromRef<AppState> for AttemptRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.attempts.clone()
    }
}
