//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra` or `crate::rpc`.

pub mod client_service;
pub mod lifecycle;
pub mod registration;
pub mod shutdown;

pub use client_service::{ClientService, LogCapture, LogCaptureOutcome, StartAction, StartOutcome};
