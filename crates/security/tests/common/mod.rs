//! Common test utilities for security provider integration tests.

#![allow(dead_code)]

pub mod fixtures;
pub mod mock_signer;

pub use fixtures::*;
pub use mock_signer::*;
