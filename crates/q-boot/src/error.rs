// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Encrypted image error types

use core::fmt;

use q_crypto::CodecError;

/// Errors raised while loading an image key or locating its record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncError {
    /// No record of the scheme's TLV type in the image metadata
    RecordNotFound,
    /// Record length differs from the scheme's fixed size
    UnexpectedLength,
    /// Image header magic or sizes are invalid
    InvalidHeader,
    /// TLV area headers or entries are inconsistent
    InvalidTlv,
    /// Image is not flagged as encrypted
    NotEncrypted,
    /// Image index / flash area pair has no key slot
    UnknownImage,
    /// Flash read failed
    FlashRead,
    /// Codec does not match the configured scheme, or config is invalid
    InvalidConfig,
    /// Wrapped-key codec rejected the record
    Codec(CodecError),
}

impl EncError {
    /// Get error code for logging/debugging
    ///
    /// Codec errors keep their own `0x01xx` code.
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::RecordNotFound => 0x0B01,
            Self::UnexpectedLength => 0x0B02,
            Self::NotEncrypted => 0x0B03,
            Self::UnknownImage => 0x0B04,
            Self::InvalidHeader => 0x0A01,
            Self::InvalidConfig => 0x0A02,
            Self::FlashRead => 0x0301,
            Self::InvalidTlv => 0x0305,
            Self::Codec(e) => e.code(),
        }
    }

    /// Get error description
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::RecordNotFound => "encrypted key record not found",
            Self::UnexpectedLength => "unexpected encrypted key record length",
            Self::InvalidHeader => "invalid image header",
            Self::InvalidTlv => "invalid TLV area",
            Self::NotEncrypted => "image not encrypted",
            Self::UnknownImage => "unknown image slot",
            Self::FlashRead => "flash read failed",
            Self::InvalidConfig => "invalid encryption config",
            Self::Codec(e) => e.description(),
        }
    }
}

impl fmt::Display for EncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EncError {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "[0x{:04X}] {}", self.code(), self.description());
    }
}

impl From<CodecError> for EncError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

impl From<EncError> for q_common::Error {
    fn from(e: EncError) -> Self {
        match e {
            EncError::RecordNotFound => Self::RecordNotFound,
            EncError::UnexpectedLength => Self::UnexpectedLength,
            EncError::InvalidHeader => Self::InvalidImageHeader,
            EncError::InvalidTlv => Self::StorageCorrupted,
            EncError::NotEncrypted => Self::ImageNotEncrypted,
            EncError::UnknownImage => Self::UnknownImage,
            EncError::FlashRead => Self::StorageReadFailed,
            EncError::InvalidConfig => Self::InvalidBootConfig,
            EncError::Codec(c) => c.into(),
        }
    }
}

/// Result type for encrypted image operations
pub type EncResult<T> = Result<T, EncError>;
