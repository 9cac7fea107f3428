// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Wrapped-key codec error types
//!
//! Every failure of a codec is reported as one of these variants. None of
//! them carries data derived from secret material.

use core::fmt;

/// Error type for wrapped-key decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Private key container failed to parse or is inconsistent
    MalformedKey,
    /// Wrapped blob has the wrong length for this scheme
    InvalidLength,
    /// RSA-OAEP decryption failed (padding, length or range)
    DecryptFailed,
    /// AES key-wrap integrity register mismatch
    IntegrityCheckFailed,
    /// ECIES HMAC tag mismatch
    TagMismatch,
    /// ECIES ephemeral point is not uncompressed
    PointFormatError,
    /// ECIES ephemeral point is not on the curve
    InvalidPublicKey,
    /// HKDF expansion failed
    KeyDerivationFailed,
}

impl CodecError {
    /// Get error code for logging/debugging
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::MalformedKey => 0x0101,
            Self::InvalidLength => 0x0102,
            Self::DecryptFailed => 0x0103,
            Self::IntegrityCheckFailed => 0x0104,
            Self::TagMismatch => 0x0105,
            Self::PointFormatError => 0x0106,
            Self::InvalidPublicKey => 0x0107,
            Self::KeyDerivationFailed => 0x0108,
        }
    }

    /// Get error description
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::MalformedKey => "malformed private key",
            Self::InvalidLength => "invalid wrapped key length",
            Self::DecryptFailed => "decryption failed",
            Self::IntegrityCheckFailed => "integrity check failed",
            Self::TagMismatch => "tag mismatch",
            Self::PointFormatError => "unsupported point format",
            Self::InvalidPublicKey => "invalid public key",
            Self::KeyDerivationFailed => "key derivation failed",
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CodecError {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "[0x{:04X}] {}", self.code(), self.description());
    }
}

impl From<CodecError> for q_common::Error {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::MalformedKey => Self::MalformedKey,
            CodecError::InvalidLength => Self::InvalidLength,
            CodecError::DecryptFailed => Self::DecryptFailed,
            CodecError::IntegrityCheckFailed => Self::IntegrityCheckFailed,
            CodecError::TagMismatch => Self::TagMismatch,
            CodecError::PointFormatError => Self::PointFormatError,
            CodecError::InvalidPublicKey => Self::InvalidPublicKey,
            CodecError::KeyDerivationFailed => Self::KeyDerivationFailed,
        }
    }
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
