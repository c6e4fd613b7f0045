pub mod api;
pub mod cli;
pub mod client;
pub mod error;
pub mod logging;
pub mod server;
pub mod sessions;
