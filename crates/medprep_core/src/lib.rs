pub mod answer;
pub mod catalog;
pub mod classify;
pub mod domain;
pub mod planner;
pub mod ports;
pub mod progress;

pub use answer::QueryGate;
pub use catalog::TopicCatalog;
pub use domain::{
    AnswerResult, AuthSession, DayEntry, Difficulty, NewQuery, ProviderAnswer, Reference,
    StoredQuery, StudyMode, StudyPlan, User, UserCredentials,
};
pub use planner::{generate_plan, PlanError};
pub use ports::{AnswerProvider, DatabaseService, HistoryFilter, PortError, PortResult};
pub use progress::ProgressTracker;
