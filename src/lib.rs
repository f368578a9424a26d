//! # Margazhi Planner
//!
//! Scheduling core for a Margazhi-season concert assistant. The crate loads
//! organizer concert schedules, answers structured lookups over them, turns
//! free-text questions into filters with the help of an external
//! text-understanding service, and plans travel routes between selected
//! venues with the help of an external geocoding/directions service.
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`models`]: Domain types (concerts, filters, routes)
//! - [`parsing`]: Tabular schedule ingestion and date-phrase parsing
//! - [`store`]: Immutable in-memory schedule store with indexed lookups
//! - [`algorithms`]: Pure conflict-detection and route-ordering logic
//! - [`services`]: Interpretation, geocoding, planning, and the HTTP
//!   clients for the external collaborators
//! - [`config`]: TOML + environment configuration
//!
//! ## Pipeline
//!
//! ```text
//! user text ──▶ services::interpreter ──▶ Filter ──▶ store::query
//!                                                        │
//!                                              candidate concerts
//!                                                        │
//!                                  user selection ──▶ services::planner
//!                                                        │
//!                                         conflicts + ordered route
//! ```
//!
//! External service calls are single-attempt and every external failure
//! degrades to a documented fallback; only a malformed schedule dataset is
//! fatal.

pub mod algorithms;
pub mod config;
pub mod models;
pub mod parsing;
pub mod services;
pub mod store;

pub use config::PlannerConfig;
pub use models::{
    ConcertId, ConcertRecord, DateSpan, EventTime, Filter, GeoPoint, RouteLeg, RoutePlan,
    Ticketing, TimeOfDay, TravelMode,
};
pub use parsing::schedule::{DataFormatError, ScheduleLoadResult};
pub use services::geocoding::{GeocodeError, GeocodeProvider, VenueGeocoder};
pub use services::interpreter::{
    IntentExtractor, IntentParseError, Interpretation, QueryInterpreter, Vocabulary,
};
pub use services::planner::ItineraryPlanner;
pub use store::ScheduleStore;
