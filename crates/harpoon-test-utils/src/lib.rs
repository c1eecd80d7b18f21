//! Shared test utilities for the harpoon workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only and never published.
//!
//! # Modules
//!
//! - [`git`]: [`git::TestHistory`], a repository with scripted commits
//! - [`http`]: [`http::CannedServer`], a local HTTP server with canned replies

pub mod git;
pub mod http;
