//! Waitlist Core: shared domain abstractions.
//!
//! This crate defines the entrant model, the error taxonomy and the
//! persistence, notification (with its clock) and randomness seams that the lifecycle
//! context depends on. It contains no infrastructure code beyond the generic
//! retry decorator.

pub mod entrant;
pub mod error;
pub mod event;
pub mod gateway;
pub mod retry;
pub mod rng;
