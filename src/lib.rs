//! syncmarks — a personal bookmark list that stays live across sessions.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod rpc_handler;
pub mod store;
pub mod sync;
pub mod types;
