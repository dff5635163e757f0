//! Shared test fakes and utilities for the waitlist draw service.

mod gateway;
mod notifier;
mod rng;

pub use gateway::{FailingGateway, FlakyGateway, InMemoryGateway};
pub use notifier::{FixedClock, RecordingNotifier};
pub use rng::{MockRng, SeededRng, SequenceRng};
