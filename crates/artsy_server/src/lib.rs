//! HTTP front end for the artsy session controller.
pub mod config;
pub mod routes;
pub mod startup;

pub use config::{Cli, Command, ServerConfig};
pub use routes::{router, ApiError};
pub use startup::{build_controller, run_backfill, run_server, serve};
