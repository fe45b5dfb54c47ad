//! Guided routine walkthrough.

mod engine;
mod services;


pub use engine::CompanionSessionEngine;
pub use services::{CompanionServices, ErrorCallback};
