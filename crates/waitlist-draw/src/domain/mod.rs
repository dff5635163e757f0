//! Domain layer: commands, lifecycle rules, sampling and outcome types.

pub mod commands;
pub mod lifecycle;
pub mod outcomes;
pub mod sampling;
