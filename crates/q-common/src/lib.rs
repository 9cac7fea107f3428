// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Qbitel EdgeOS Common Library
//!
//! Shared error definitions, image format constants, configuration and the
//! boot log used by the encrypted-image loader crates.
//!
//! # Features
//!
//! - `std`: Enable standard library support (disabled by default for embedded)
//! - `defmt`: Enable defmt formatting of errors for embedded debugging
//!
//! # Security
//!
//! No heap allocations are performed. Key material never passes through
//! this crate.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

pub mod errors;
pub mod config;
pub mod log;
pub mod constants;

// Re-export commonly used items
pub use errors::{Error, Result};
pub use config::{EncScheme, EncryptionConfig, KeyRetention};
pub use log::{LogBuffer, LogLevel};
