//! Unit tests for the ranch agent
//!
//! These tests use test doubles for Docker, the host filesystem and the
//! orchestrator, and run fast without external services.

mod architecture;
mod property_tests;
mod registration;
