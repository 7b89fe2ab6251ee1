//! # Mentorbook Core
//!
//! Domain logic for the availability and booking resolution engine. This
//! crate is pure: it owns the data model, the slot resolver, the booking
//! state machine, and the reservation coordinator, but performs no IO of
//! its own. Storage backends plug in through the [`store::EngineStore`]
//! trait.

/// Reservation coordinator: the single mutation path into the booking ledger
pub mod coordinator;
/// Typed domain errors shared by every layer
pub mod errors;
/// Pure booking state machine and overlap scanning
pub mod ledger;
/// Wire-facing data model and validation
pub mod models;
/// Expansion of availability profiles into concrete UTC slots
pub mod resolver;
/// Storage seam between the coordinator and a concrete backend
pub mod store;
