//! Delayed and periodic scheduling.
//!
//! Timed tasks never run from a timer callback directly: when a host timer
//! fires, the task is pushed through the owning worker's queue, so it stays
//! ordered with everything else submitted to that worker.
//!
//! It includes:
//! - [`binding`] for turning durations into host timer registrations,
//! - [`periodic`] for the task shared by every firing of a repeating timer.

pub(crate) mod binding;
pub(crate) mod periodic;

/// Longest delay or period a host timer accepts, in milliseconds.
pub const MAX_TIMER_MILLIS: u64 = i32::MAX as u64;
