//! Tab Sidebar — keeps a render-ready model of the current window's tabs and
//! tab groups in sync with the browser, or with a simulated store when no
//! browser host is reachable.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod backend;
pub mod bus;
pub mod engine;
pub mod host;
pub mod platform;
pub mod reorder;
pub mod rpc_handler;
pub mod settings;
pub mod types;
