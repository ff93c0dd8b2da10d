// splitscroll shared type definitions
// Wire contract, settings, tab identity and error types used by every component.

pub mod errors;
pub mod message;
pub mod scroll;
pub mod settings;
pub mod tab;
