//! Waitlist draw service: Entrant Lifecycle & Draw bounded context.
//!
//! Responsible for listing entrants by status, arbitrating seat capacity,
//! enforcing the entrant status lifecycle, and running fair randomized draws
//! that promote waiting entrants to selected.

pub mod application;
pub mod domain;
