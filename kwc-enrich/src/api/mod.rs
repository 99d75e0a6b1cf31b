//! HTTP API handlers
//!
//! Thin facade over the workbook processor and prompt resolver.

pub mod files;
pub mod health;
pub mod process;
pub mod prompts;

pub use files::file_routes;
pub use health::health_routes;
pub use process::process_routes;
pub use prompts::prompt_routes;
