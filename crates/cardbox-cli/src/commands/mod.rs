pub mod answer;
pub mod common;
pub mod config;
pub mod scheduler;
pub mod session;
pub mod timebox;
pub mod undo;
