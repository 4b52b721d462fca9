//! Offline pipeline driver

pub mod runner;

pub use runner::{print_timeline, run, ChordSpan, TimelineResult};
