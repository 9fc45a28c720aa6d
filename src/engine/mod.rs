//! Core engine: the daily schedule and the jobs it dispatches.

pub mod jobs;
pub mod scheduler;
pub mod selector;
