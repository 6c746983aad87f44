//! paperset core: raw records, output tables, config, release staging.

pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use config::{AppConfig, OrphanRows};
pub use error::{PapersetError, Result};
pub use models::*;
