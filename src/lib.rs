//! splitscroll: scroll-position sync between tabs grouped into a split view.
//!
//! This library crate exposes all modules for use by the relay host binary and integration tests.

pub mod app;
pub mod hub;
pub mod managers;
pub mod rpc_handler;
pub mod services;
pub mod types;
