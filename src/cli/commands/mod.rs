//! CLI command implementations.

mod chat;
mod config;
mod doctor;
mod find;
mod ingest;
mod list;
mod serve;

pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use find::run_find;
pub use ingest::run_ingest;
pub use list::run_list;
pub use serve::run_serve;
