// src/lib.rs

//! crawlq: a self-feeding web crawler over a durable RabbitMQ queue.
//!
//! Two roles share this library: `crawlq-submit` bootstraps the crawl by
//! publishing a seed page's links, and `crawlq-worker` consumes URLs from
//! the queue, fetches them, and republishes every same-origin link it finds.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod services;
