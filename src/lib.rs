//! Library for the defense simulation core.
//!
//! Most of the engineering content lives in `engine.rs` and
//! `missile.rs`; this file just wires the modules together so the
//! crate can be exercised as a library from integration tests as well
//! as from `main.rs`.
pub mod command_post;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod launcher;
pub mod missile;
pub mod scenario;
pub mod sensor;
pub mod target;
