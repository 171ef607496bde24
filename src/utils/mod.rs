//! Path and text helpers shared across modules

pub mod helpers;
pub mod placeholders;

pub use helpers::*;
pub use placeholders::*;
