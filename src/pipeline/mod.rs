//! Pipeline entry points for the two crawler roles.
//!
//! - `run_worker`: consume URLs from the queue until cancelled
//! - `run_submitter`: one-shot seed of the queue from a single URL

pub mod process;
pub mod seed;
pub mod worker;

pub use process::process_url;
pub use seed::run_submitter;
pub use worker::run_worker;
