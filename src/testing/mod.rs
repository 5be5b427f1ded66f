//! Testing utilities and mock implementations
//!
//! This module provides mock implementations for testing the performer
//! pipeline without a live computation endpoint.

pub mod mocks;

pub use mocks::*;
