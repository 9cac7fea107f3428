// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Encrypted image configuration for Qbitel EdgeOS
//!
//! All configuration is fixed at build or provisioning time. Exactly one
//! wrapped-key scheme is active per product; nothing here is negotiated
//! with the image being booted.

use crate::constants::{
    ENC_EC256_RECORD_SIZE, ENC_KW128_RECORD_SIZE, ENC_RSA2048_RECORD_SIZE, TLV_ENC_EC256,
    TLV_ENC_KW128, TLV_ENC_RSA2048,
};
use crate::errors::{Error, Result};
use crate::log::LogLevel;

/// Maximum number of independently updatable images
pub const MAX_IMAGES: u8 = 2;

/// Wrapped-key scheme used by the image signing tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EncScheme {
    /// RSA-2048 with OAEP (SHA-256)
    Rsa2048 = 0,
    /// RFC 3394 AES-128 key-wrap
    Kw128 = 1,
    /// ECIES over P-256 with HKDF-SHA256 and HMAC-SHA256
    Ec256 = 2,
}

impl EncScheme {
    /// TLV type carrying this scheme's record
    #[must_use]
    pub const fn tlv_type(&self) -> u16 {
        match self {
            Self::Rsa2048 => TLV_ENC_RSA2048,
            Self::Kw128 => TLV_ENC_KW128,
            Self::Ec256 => TLV_ENC_EC256,
        }
    }

    /// Exact record length expected for this scheme
    #[must_use]
    pub const fn record_len(&self) -> usize {
        match self {
            Self::Rsa2048 => ENC_RSA2048_RECORD_SIZE,
            Self::Kw128 => ENC_KW128_RECORD_SIZE,
            Self::Ec256 => ENC_EC256_RECORD_SIZE,
        }
    }

    /// Scheme name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rsa2048 => "rsa2048-oaep",
            Self::Kw128 => "aes128-kw",
            Self::Ec256 => "ecies-p256",
        }
    }
}

/// What the swap status retains so an interrupted swap can resume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRetention {
    /// Keep the decoded image key in the status scratch
    DerivedKey,
    /// Keep only the wrapped record and decode it again after reset
    WrappedRecord,
}

/// Encrypted image configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionConfig {
    /// Active wrapped-key scheme
    pub scheme: EncScheme,
    /// Swap status retention mode
    pub retention: KeyRetention,
    /// Number of images handled by the bootloader
    pub image_count: u8,
    /// Minimum level recorded in the boot log
    pub log_level: LogLevel,
}

impl EncryptionConfig {
    /// Default configuration: single image, ECIES-P256, wrapped record retained
    pub const DEFAULT: Self = Self {
        scheme: EncScheme::Ec256,
        retention: KeyRetention::WrappedRecord,
        image_count: 1,
        log_level: LogLevel::Info,
    };

    /// Development configuration (verbose logging)
    pub const DEVELOPMENT: Self = Self {
        scheme: EncScheme::Ec256,
        retention: KeyRetention::WrappedRecord,
        image_count: 1,
        log_level: LogLevel::Debug,
    };

    /// Create a configuration for a scheme with default settings
    #[must_use]
    pub const fn for_scheme(scheme: EncScheme) -> Self {
        Self {
            scheme,
            ..Self::DEFAULT
        }
    }

    /// Check the configuration for consistency
    ///
    /// # Errors
    ///
    /// Returns `InvalidBootConfig` if the image count is zero or exceeds
    /// [`MAX_IMAGES`].
    pub const fn validate(&self) -> Result<()> {
        if self.image_count == 0 || self.image_count > MAX_IMAGES {
            return Err(Error::InvalidBootConfig);
        }
        Ok(())
    }
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
