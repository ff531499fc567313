//! Service layer for the crawler application.
//!
//! - HTTP fetching (`FetchAgent`)
//! - Same-origin link extraction (`extract_links`)
//! - Durable queue access (`QueueClient`, `LinkSink`)

pub mod extract;
pub mod fetch;
pub mod queue;

pub use extract::{extract_links, page_title};
pub use fetch::{FetchAgent, Page};
pub use queue::{LinkSink, QueueClient};
