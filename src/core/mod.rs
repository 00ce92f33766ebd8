//! Store operations behind the console screens.
//!
//! Everything here takes a `DatabaseConnection` (or any `ConnectionTrait` where
//! the operation can run inside a caller's transaction) and returns
//! `errors::Result`. Nothing depends on how the console is presented.

/// Staff accounts and owner-gated administration
pub mod account;
/// Appointment records, the service workflow and plan credit
pub mod appointment;
/// Calendar listings, the stage board and daily counters
pub mod board;
/// The editable price list
pub mod catalog;
/// Cart, payment and sale confirmation
pub mod checkout;
/// Clients derived from appointments by phone
pub mod client;
/// One-shot envelopes from scheduling to checkout
pub mod handoff;
/// Signed-in user state
pub mod session;
/// Service stages and workflow state
pub mod workflow;
