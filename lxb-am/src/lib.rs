//! lxb-am - Sentence Audio Maintenance
//!
//! Keeps the sentence audio files on disk in step with the database:
//! - `verify` audits existing audio against the `sentences` table and flips
//!   unhealthy rows back into the regeneration or redownload queue
//! - `fetch` downloads remotely generated audio awaiting pickup, with a
//!   bounded concurrent worker pool

pub mod fetch;
pub mod verify;
