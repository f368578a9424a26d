//! Service layer: interpretation, geocoding, planning, and the HTTP clients
//! for the external collaborators.
//!
//! Every external call here is single-attempt. Retry policy belongs to the
//! collaborators' own infrastructure, not to this core; what the core owns
//! is the degraded mode each failure falls back to.

pub mod directions;
pub mod extraction;
pub mod gemini_client;
pub mod geocoding;
pub mod interpreter;
pub mod maps_client;
pub mod planner;
