//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use medprep_core::catalog::TopicCatalog;
use medprep_core::ports::DatabaseService;
use medprep_core::QueryGate;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub gate: Arc<QueryGate>,
    pub catalog: Arc<TopicCatalog>,
    pub config: Arc<Config>,
}
