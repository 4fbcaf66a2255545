//! Wayfarer library crate: re-exports all modules for integration testing.
//!
//! The binary crate (`main.rs`) is the actual explorer entry point.
//! This library crate exposes the same modules so that `tests/` integration
//! tests can drive the ECS without needing a window or GPU.

pub mod shared;
pub mod config;
pub mod input;
pub mod terrain;
pub mod viewport;
pub mod player;
pub mod world;
pub mod ui;
pub mod bridge;
