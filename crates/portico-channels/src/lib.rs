//! # portico-channels
//!
//! Chat-platform bindings for the portico gateway.

pub mod telegram;
