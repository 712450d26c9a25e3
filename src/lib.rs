// src/lib.rs

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod routes;
pub mod session;
pub mod state;
pub mod utils;

// Re-export specific items for convenience if needed
pub use models::quiz::{QuizQuestion, Score};
pub use parser::{parse, parse_positional, parse_scoped};
pub use routes::create_router;
pub use session::{QuizSession, SessionError};
