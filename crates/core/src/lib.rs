//! Trust and moderation core for trustmod.
//!
//! Account standing, abuse report review and the coordinator that ties a
//! disciplinary action to both. See [`services`] for the components.

pub mod services;

pub use services::*;
