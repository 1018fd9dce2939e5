pub mod markers;
pub mod prefs;
pub mod progress;
pub mod repo;
pub mod runner;
#[allow(dead_code)]
pub mod style;
pub mod validate;
pub mod workflow;
