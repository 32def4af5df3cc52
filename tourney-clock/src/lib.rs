// Library root: re-exports all modules so integration tests and the binary
// can access the crate's public API.

pub mod app;
pub mod clock;
pub mod config;
pub mod content;
pub mod display;
pub mod listener;
pub mod model;
pub mod protocol;
pub mod race;
pub mod scheduler;
pub mod transport;
pub mod tui;

#[cfg(test)]
pub(crate) mod testing;
