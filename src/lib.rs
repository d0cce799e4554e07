// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod game;
pub mod leaderboard;
pub mod runtime;
pub mod selector;
pub mod ui;
pub mod words;

/// Event-loop tick granularity in milliseconds.
pub const TICK_RATE_MS: u64 = 100;
