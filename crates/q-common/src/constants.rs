// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! System-wide constants for Qbitel EdgeOS
//!
//! Image format, metadata and key sizes shared by the crypto and boot
//! crates. All values are fixed by the image signing tool and are never
//! negotiated at runtime.

// =============================================================================
// Image Format
// =============================================================================

/// Image header magic
pub const IMAGE_MAGIC: u32 = 0x96f3_b83d;

/// Size of the fixed image header in bytes
pub const IMAGE_HEADER_SIZE: usize = 32;

/// Image flag: payload is encrypted
pub const IMAGE_F_ENCRYPTED: u32 = 0x0000_0004;

/// Value of erased flash
pub const ERASED_VAL: u8 = 0xff;

// =============================================================================
// TLV Metadata
// =============================================================================

/// Magic of the unprotected TLV area info header
pub const TLV_INFO_MAGIC: u16 = 0x6907;

/// Magic of the protected TLV area info header
pub const TLV_PROT_INFO_MAGIC: u16 = 0x6908;

/// Size of a TLV area info header (magic + total length)
pub const TLV_INFO_SIZE: usize = 4;

/// Size of a TLV entry header (type + pad + length)
pub const TLV_ENTRY_HEADER_SIZE: usize = 4;

/// TLV type: key encrypted with RSA-2048 OAEP
pub const TLV_ENC_RSA2048: u16 = 0x30;

/// TLV type: key wrapped with AES-128 key-wrap
pub const TLV_ENC_KW128: u16 = 0x31;

/// TLV type: key encrypted with ECIES-P256
pub const TLV_ENC_EC256: u16 = 0x32;

// =============================================================================
// Encrypted Key Records
// =============================================================================

/// Image encryption key size (AES-128)
pub const ENC_KEY_SIZE: usize = 16;

/// RSA-2048 OAEP record size
pub const ENC_RSA2048_RECORD_SIZE: usize = 256;

/// AES-128 key-wrap record size
pub const ENC_KW128_RECORD_SIZE: usize = ENC_KEY_SIZE + 8;

/// ECIES-P256 record size (point + tag + ciphertext)
pub const ENC_EC256_RECORD_SIZE: usize = 65 + 32 + ENC_KEY_SIZE;

/// Largest record size across all schemes
pub const ENC_RECORD_MAX_SIZE: usize = ENC_RSA2048_RECORD_SIZE;

/// AES block size
pub const AES_BLOCK_SIZE: usize = 16;

/// Number of image slots holding key state (primary and secondary)
pub const BOOT_NUM_SLOTS: usize = 2;

/// HKDF info label for ECIES-P256
pub const ECIES_HKDF_INFO: &[u8; 16] = b"MCUBoot_ECIES_v1";
