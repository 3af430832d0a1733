//! End-to-end tests for the update pipeline.
//!
//! Each test lays out a fake installed application in a temporary directory,
//! publishes a manifest (on disk or through a mock HTTP server) and drives an
//! `AppUpdater` through check, download and install.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod integration_tests;
