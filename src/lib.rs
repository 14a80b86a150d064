pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod tracker;
pub mod ui;
pub mod warning;

pub use error::{Result, VersionManagerError};
