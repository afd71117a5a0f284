pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;

// Re-export the handlers the binary needs to build the router.
pub use middleware::require_auth;
pub use rest::{
    ask_handler, create_plan_handler, current_plan_handler, history_handler,
    list_subjects_handler, toggle_topic_handler,
};
