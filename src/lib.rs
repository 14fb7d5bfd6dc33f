//! Library crate for usrapi-manager.
//!
//! This crate exposes the building blocks of the TUI:
//! - HTTP access to the users collection (`api`)
//! - Application state, operation dispatch and the update loop (`app`)
//! - Command line and config file locations (`config`)
//! - Error and result types (`error`)
//! - User records and drafts (`model`)
//! - In-memory search over the fetched list (`search`)
//! - UI rendering and the users table model (`ui`)
//!
//! It is used by the `usrapi-manager` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod model;
pub mod search;
pub mod ui;

/// Convenient error and result types shared across the crate.
pub use error::{DynError, Result};
