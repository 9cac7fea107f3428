// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! TLV metadata areas and the wrapped-key record locator
//!
//! The metadata after the payload is made of an optional protected area
//! (covered by the image signature) followed by the unprotected area.
//! Each area starts with a 4-byte info header whose total length includes
//! the header itself:
//!
//! ```text
//! tlv_off
//! +-------------------+---------+-----+-----------------+---------+-----+
//! | 0x6908 | prot_tot | entry 0 | ... | 0x6907 | tot    | entry 0 | ... |
//! +-------------------+---------+-----+-----------------+---------+-----+
//!  \______________ prot_tot _________/ \______________ tot ____________/
//! ```
//!
//! Entries are `{ type: u16, len: u16, value[len] }`, little-endian. The
//! protected area is present only when the header's `protect_tlv_size` is
//! non-zero, and must then match `prot_tot` exactly.

use q_common::constants::{
    TLV_ENTRY_HEADER_SIZE, TLV_INFO_MAGIC, TLV_INFO_SIZE, TLV_PROT_INFO_MAGIC,
};
use q_common::{Error, Result};

use crate::error::{EncError, EncResult};
use crate::image::ImageHeader;

// =============================================================================
// Flash Access
// =============================================================================

/// Read access to a flash area holding one image slot
pub trait FlashArea {
    /// Flash area identifier, resolved to a key slot by the key store
    fn id(&self) -> u8;

    /// Read `buf.len()` bytes starting at `off` from the start of the area
    ///
    /// # Errors
    ///
    /// Returns a storage error if the range is out of bounds or the read
    /// fails.
    fn read(&self, off: u32, buf: &mut [u8]) -> Result<()>;
}

/// Flash area backed by a byte slice (RAM-loaded images, host tooling)
#[derive(Debug, Clone, Copy)]
pub struct RamFlashArea<'a> {
    id: u8,
    data: &'a [u8],
}

impl<'a> RamFlashArea<'a> {
    /// Wrap a byte slice as flash area `id`
    #[must_use]
    pub const fn new(id: u8, data: &'a [u8]) -> Self {
        Self { id, data }
    }

    /// Area size in bytes
    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the area is empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl FlashArea for RamFlashArea<'_> {
    fn id(&self) -> u8 {
        self.id
    }

    fn read(&self, off: u32, buf: &mut [u8]) -> Result<()> {
        let start = off as usize;
        let src = start
            .checked_add(buf.len())
            .and_then(|end| self.data.get(start..end))
            .ok_or(Error::StorageReadFailed)?;
        buf.copy_from_slice(src);
        Ok(())
    }
}

fn read_u16_pair<F: FlashArea + ?Sized>(area: &F, off: u32) -> EncResult<(u16, u16)> {
    let mut raw = [0u8; 4];
    area.read(off, &mut raw).map_err(|_| EncError::FlashRead)?;
    Ok((
        u16::from_le_bytes([raw[0], raw[1]]),
        u16::from_le_bytes([raw[2], raw[3]]),
    ))
}

/// Entry header: `{type u8, pad u8, len u16}`; the pad byte is ignored
fn read_entry_header<F: FlashArea + ?Sized>(area: &F, off: u32) -> EncResult<(u16, u16)> {
    let mut raw = [0u8; TLV_ENTRY_HEADER_SIZE];
    area.read(off, &mut raw).map_err(|_| EncError::FlashRead)?;
    Ok((u16::from(raw[0]), u16::from_le_bytes([raw[2], raw[3]])))
}

// =============================================================================
// TLV Iteration
// =============================================================================

/// Location of one TLV entry's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvRecord {
    /// Entry type (one byte on flash)
    pub tlv_type: u16,
    /// Offset of the value from the start of the flash area
    pub offset: u32,
    /// Value length in bytes
    pub len: u16,
    /// True if the entry sits in the protected area
    pub protected: bool,
}

/// Iterator over all TLV entries of an image, protected area first
///
/// Yields an error once and then stops if an entry runs past the end of its
/// area or a flash read fails.
pub struct TlvIter<'a, F: FlashArea + ?Sized> {
    area: &'a F,
    off: u32,
    prot_end: u32,
    end: u32,
    in_protected: bool,
    done: bool,
}

impl<'a, F: FlashArea + ?Sized> TlvIter<'a, F> {
    /// Validate the info headers and start iterating
    ///
    /// # Errors
    ///
    /// - `InvalidTlv` if an info header has the wrong magic or length
    /// - `FlashRead` if the headers cannot be read
    pub fn new(area: &'a F, hdr: &ImageHeader) -> EncResult<Self> {
        let start = hdr.tlv_offset();
        let prot_size = u32::from(hdr.protect_tlv_size);

        if prot_size > 0 {
            let (magic, tot) = read_u16_pair(area, start)?;
            if magic != TLV_PROT_INFO_MAGIC
                || u32::from(tot) != prot_size
                || usize::from(tot) < TLV_INFO_SIZE
            {
                return Err(EncError::InvalidTlv);
            }
        }

        let prot_end = start.checked_add(prot_size).ok_or(EncError::InvalidTlv)?;
        let (magic, tot) = read_u16_pair(area, prot_end)?;
        if magic != TLV_INFO_MAGIC || usize::from(tot) < TLV_INFO_SIZE {
            return Err(EncError::InvalidTlv);
        }
        let end = prot_end
            .checked_add(u32::from(tot))
            .ok_or(EncError::InvalidTlv)?;

        let (off, in_protected) = if prot_size > 0 {
            (start + TLV_INFO_SIZE as u32, true)
        } else {
            (prot_end + TLV_INFO_SIZE as u32, false)
        };

        Ok(Self {
            area,
            off,
            prot_end,
            end,
            in_protected,
            done: false,
        })
    }

    fn fail(&mut self, e: EncError) -> Option<EncResult<TlvRecord>> {
        self.done = true;
        Some(Err(e))
    }
}

impl<F: FlashArea + ?Sized> Iterator for TlvIter<'_, F> {
    type Item = EncResult<TlvRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.in_protected && self.off >= self.prot_end {
            // Step over the unprotected info header.
            self.in_protected = false;
            self.off = self.prot_end + TLV_INFO_SIZE as u32;
        }
        let area_end = if self.in_protected { self.prot_end } else { self.end };
        if self.off >= area_end {
            self.done = true;
            return None;
        }

        let data_off = match self.off.checked_add(TLV_ENTRY_HEADER_SIZE as u32) {
            Some(o) if o <= area_end => o,
            _ => return self.fail(EncError::InvalidTlv),
        };
        let (tlv_type, len) = match read_entry_header(self.area, self.off) {
            Ok(pair) => pair,
            Err(e) => return self.fail(e),
        };
        let next = match data_off.checked_add(u32::from(len)) {
            Some(n) if n <= area_end => n,
            _ => return self.fail(EncError::InvalidTlv),
        };
        self.off = next;

        Some(Ok(TlvRecord {
            tlv_type,
            offset: data_off,
            len,
            protected: self.in_protected,
        }))
    }
}

// =============================================================================
// Wrapped-Key Record Locator
// =============================================================================

/// Find the wrapped-key record of `tlv_type` in an image's metadata
///
/// The first entry of that type wins, whichever area it is in.
///
/// # Errors
///
/// - `RecordNotFound` if no entry has the type
/// - `UnexpectedLength` if the first such entry is not `expected_len` bytes
/// - `InvalidTlv` / `FlashRead` if the metadata is malformed or unreadable
pub fn locate_enc_record<F: FlashArea + ?Sized>(
    area: &F,
    hdr: &ImageHeader,
    tlv_type: u16,
    expected_len: usize,
) -> EncResult<TlvRecord> {
    for entry in TlvIter::new(area, hdr)? {
        let rec = entry?;
        if rec.tlv_type != tlv_type {
            continue;
        }
        if usize::from(rec.len) != expected_len {
            return Err(EncError::UnexpectedLength);
        }
        return Ok(rec);
    }
    Err(EncError::RecordNotFound)
}

/// Copy a located record's value into the front of `buf`
///
/// Returns the number of bytes copied.
///
/// # Errors
///
/// `UnexpectedLength` if `buf` is too small, `FlashRead` if the read fails.
pub fn read_enc_record<F: FlashArea + ?Sized>(
    area: &F,
    rec: &TlvRecord,
    buf: &mut [u8],
) -> EncResult<usize> {
    let len = usize::from(rec.len);
    let dst = buf.get_mut(..len).ok_or(EncError::UnexpectedLength)?;
    area.read(rec.offset, dst).map_err(|_| EncError::FlashRead)?;
    Ok(len)
}
