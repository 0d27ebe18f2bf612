//! Mood companion backend: chat-mood proxy, mood history, journal and avatar profile.
//!
//! (c) Softlandia 2025

pub mod api;
pub mod config;
pub mod core;
pub mod infrastructure;
