// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Qbitel EdgeOS Encrypted Image Support
//!
//! This crate provides the bootloader side of encrypted firmware images:
//!
//! - **Image**: Image header parsing
//! - **TLV**: Metadata walking and wrapped-key record lookup
//! - **Slots**: Per-image key slots loaded through a wrapped-key codec
//! - **Stream**: AES-128-CTR payload encryption / decryption
//! - **Status**: Key retention across interrupted swaps
//! - **Handoff**: Key scrubbing and chain-load into the application
//!
//! # Boot Flow
//!
//! ```text
//! header -> locate record -> decode (q-crypto) -> activate slot
//!        -> decrypt payload chunks -> zeroize_all -> chain_load
//! ```

#![no_std]
#![allow(unsafe_code)] // Register scrub and jump in handoff
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod image;
pub mod tlv;
pub mod slots;
pub mod stream;
pub mod status;
pub mod handoff;

pub use error::{EncError, EncResult};
pub use image::{ImageHeader, ImageVersion};
pub use tlv::{locate_enc_record, read_enc_record, FlashArea, RamFlashArea, TlvIter, TlvRecord};
pub use slots::{ImageAreas, KeySlot, KeyStore, LoadOutcome, SlotId, SlotLayout, SlotResolver, N_SLOTS};
pub use status::BootStatus;
pub use handoff::{finish_boot, BootHandoff};

#[cfg(target_arch = "arm")]
pub use handoff::CortexMHandoff;
