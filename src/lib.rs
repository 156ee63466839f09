// Public API for integration tests and embedding in other hosts

pub mod answer_key;
pub mod config;
pub mod console;
pub mod handlers;
pub mod matcher;
pub mod permission;
pub mod protocol;
pub mod render;
pub mod sink;
pub mod state;
pub mod timer;
pub mod types;
