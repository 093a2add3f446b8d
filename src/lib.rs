pub mod api;
pub mod board;
pub mod config;
pub mod detail;
pub mod error;
pub mod events;
pub mod identity;
pub mod matching;
pub mod model;
pub mod server;
pub mod session;
pub mod watch;
pub mod wizard;

// Re-exports for the common path: build a client, hold a board, handle
// its errors.
pub use api::BackendClient;
pub use board::TaskBoard;
pub use error::{Error, Result};
