//! Timeline export

pub mod json;

pub use json::{read_timeline, write_json, TimelineJson};
