#![warn(rust_2018_idioms)]
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod adapter;
pub mod app;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;
pub mod publisher;
pub mod scheduler;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{ConfigSource, PublishInterval, Settings, TimeOfDay};
pub use publisher::{PublishOutcome, Publisher};
pub use scheduler::{DailyCadence, Scheduler};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
