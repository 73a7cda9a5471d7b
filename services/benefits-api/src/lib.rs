//! Benefits administration service library crate.
//!
//! # Purpose
//! Exposes the HTTP API, the authorization boundary, configuration, and the
//! application service for use by the binary and integration tests.
//!
//! # Notes
//! Every protected request passes through `auth::boundary`, which installs the
//! caller's scope context before any handler touches the repository.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod model;
pub mod observability;
pub mod service;
