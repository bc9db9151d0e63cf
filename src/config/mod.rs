//! Configuration management module

pub mod loader;
pub mod repository;

pub use loader::{Config, Settings};
pub use repository::Repository;
