// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Image header
//!
//! Every image in a flash area starts with a fixed 32-byte little-endian
//! header, followed by padding up to `hdr_size`, the payload (`img_size`
//! bytes) and finally the TLV metadata areas:
//!
//! ```text
//! +--------+---------+----------------------+-----------------+
//! | header | padding | payload (encrypted?) | protected + TLV |
//! +--------+---------+----------------------+-----------------+
//! 0        32        hdr_size               hdr_size + img_size
//! ```
//!
//! Only the payload is ever encrypted; the header and TLVs stay in clear.

use q_common::constants::{IMAGE_F_ENCRYPTED, IMAGE_HEADER_SIZE, IMAGE_MAGIC};

use crate::error::{EncError, EncResult};
use crate::tlv::FlashArea;

/// Image version (semantic version plus build number)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageVersion {
    /// Major version
    pub major: u8,
    /// Minor version
    pub minor: u8,
    /// Revision
    pub revision: u16,
    /// Build number
    pub build_num: u32,
}

/// Parsed image header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    /// Magic, always [`IMAGE_MAGIC`]
    pub magic: u32,
    /// Load address for RAM-loaded images
    pub load_addr: u32,
    /// Size of header plus padding; the payload starts here
    pub hdr_size: u16,
    /// Size of the protected TLV area, 0 if absent
    pub protect_tlv_size: u16,
    /// Payload size in bytes
    pub img_size: u32,
    /// Image flags
    pub flags: u32,
    /// Image version
    pub version: ImageVersion,
}

impl ImageHeader {
    /// Create a header for an image of `img_size` bytes
    #[must_use]
    pub const fn new(hdr_size: u16, img_size: u32, flags: u32) -> Self {
        Self {
            magic: IMAGE_MAGIC,
            load_addr: 0,
            hdr_size,
            protect_tlv_size: 0,
            img_size,
            flags,
            version: ImageVersion {
                major: 0,
                minor: 0,
                revision: 0,
                build_num: 0,
            },
        }
    }

    /// Parse and validate a header from its 32-byte encoding
    ///
    /// # Errors
    ///
    /// `InvalidHeader` if the buffer is short, the magic is wrong, the
    /// header size is below 32 bytes, or the TLV offset overflows.
    pub fn parse(bytes: &[u8]) -> EncResult<Self> {
        let raw: &[u8; IMAGE_HEADER_SIZE] = bytes
            .get(..IMAGE_HEADER_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or(EncError::InvalidHeader)?;

        let u16_at = |o: usize| u16::from_le_bytes([raw[o], raw[o + 1]]);
        let u32_at = |o: usize| u32::from_le_bytes([raw[o], raw[o + 1], raw[o + 2], raw[o + 3]]);

        let hdr = Self {
            magic: u32_at(0),
            load_addr: u32_at(4),
            hdr_size: u16_at(8),
            protect_tlv_size: u16_at(10),
            img_size: u32_at(12),
            flags: u32_at(16),
            version: ImageVersion {
                major: raw[20],
                minor: raw[21],
                revision: u16_at(22),
                build_num: u32_at(24),
            },
        };
        // Bytes 28..32 are padding.

        hdr.validate()?;
        Ok(hdr)
    }

    /// Read and parse the header at the start of a flash area
    ///
    /// # Errors
    ///
    /// `FlashRead` if the read fails, otherwise as [`ImageHeader::parse`].
    pub fn read_from<F: FlashArea + ?Sized>(area: &F) -> EncResult<Self> {
        let mut raw = [0u8; IMAGE_HEADER_SIZE];
        area.read(0, &mut raw).map_err(|_| EncError::FlashRead)?;
        Self::parse(&raw)
    }

    /// Validate field values
    ///
    /// # Errors
    ///
    /// `InvalidHeader` on a bad magic, short header or overflowing sizes.
    pub fn validate(&self) -> EncResult<()> {
        if self.magic != IMAGE_MAGIC {
            return Err(EncError::InvalidHeader);
        }
        if usize::from(self.hdr_size) < IMAGE_HEADER_SIZE {
            return Err(EncError::InvalidHeader);
        }
        if u32::from(self.hdr_size).checked_add(self.img_size).is_none() {
            return Err(EncError::InvalidHeader);
        }
        Ok(())
    }

    /// Encode the header (used by image tooling and tests)
    #[must_use]
    pub fn to_bytes(&self) -> [u8; IMAGE_HEADER_SIZE] {
        let mut out = [0u8; IMAGE_HEADER_SIZE];
        out[0..4].copy_from_slice(&self.magic.to_le_bytes());
        out[4..8].copy_from_slice(&self.load_addr.to_le_bytes());
        out[8..10].copy_from_slice(&self.hdr_size.to_le_bytes());
        out[10..12].copy_from_slice(&self.protect_tlv_size.to_le_bytes());
        out[12..16].copy_from_slice(&self.img_size.to_le_bytes());
        out[16..20].copy_from_slice(&self.flags.to_le_bytes());
        out[20] = self.version.major;
        out[21] = self.version.minor;
        out[22..24].copy_from_slice(&self.version.revision.to_le_bytes());
        out[24..28].copy_from_slice(&self.version.build_num.to_le_bytes());
        out
    }

    /// Check the encrypted flag
    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        self.flags & IMAGE_F_ENCRYPTED != 0
    }

    /// Offset of the first TLV area from the start of the flash area
    #[must_use]
    pub const fn tlv_offset(&self) -> u32 {
        // validate() rules out overflow for parsed headers.
        (self.hdr_size as u32).wrapping_add(self.img_size)
    }
}
