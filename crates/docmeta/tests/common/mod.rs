//! Shared test utilities for docmeta integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated extraction with a scratch temp directory
//! - Builders that assemble PDF and DOCX documents in memory

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{CannedChat, SizeOcr, TestHarness};
