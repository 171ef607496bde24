//! Core data models for extension packaging

pub mod declaration;
pub mod diagnostics;
pub mod extension;
pub mod manifest;
pub mod package;
pub mod progress;

pub use declaration::*;
pub use diagnostics::*;
pub use extension::*;
pub use manifest::*;
pub use package::*;
pub use progress::*;
