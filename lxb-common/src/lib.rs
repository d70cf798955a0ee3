//! # Lexibook Common Library
//!
//! Shared code for the Lexibook maintenance tools including:
//! - Database pool initialization and schema creation
//! - Row models for the vocabulary schema
//! - Configuration loading (database path resolution)
//! - Common error types

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
