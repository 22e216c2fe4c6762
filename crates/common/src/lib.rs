//! Common utilities and shared types for trustmod.
//!
//! This crate provides foundational components used across all trustmod crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: The moderation error taxonomy via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Clock**: Injectable wall clock via [`Clock`], with [`SystemClock`] and [`ManualClock`]
//!
//! # Example
//!
//! ```no_run
//! use trustmod_common::{AppResult, Clock, Config, IdGenerator, SystemClock};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID {} at {}", id, SystemClock.now());
//!     println!("Stale claims after {}h", config.moderation.stale_claim_after_hours);
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod id;

pub use clock::{Clock, ClockService, ManualClock, SystemClock};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
