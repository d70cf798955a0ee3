//! Invariant checkers
//!
//! Four independent validators, each a pure read over the schema producing a
//! typed issue list. Sub-checks never short-circuit: repair needs the full
//! picture, not just the first failure.

pub mod changelog;
pub mod completeness;
pub mod membership;
pub mod progress;

pub use changelog::check_change_log_versions;
pub use completeness::check_universal_dictionary;
pub use membership::{check_dictionary, load_checked_dictionaries, resolve_owner_name};
pub use progress::check_learning_progress;
