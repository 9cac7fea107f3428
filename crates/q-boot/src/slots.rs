// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Key-slot store
//!
//! Each image has two key slots, one per flash slot (primary and secondary).
//! A slot becomes active when the wrapped-key record of an image in that
//! flash slot is decoded, and stays active until [`KeyStore::zeroize_all`].
//!
//! # Slot State
//!
//! ```text
//!          load / activate / restore_from_status
//!   +-------+ ------------------------------> +--------+
//!   | Empty |                                  | Active |
//!   +-------+ <------------------------------ +--------+
//!                      zeroize_all
//! ```
//!
//! Loading an already active slot is a successful no-op.

use aes::cipher::{generic_array::GenericArray, KeyInit};
use aes::Aes128Enc;

use q_common::config::{EncryptionConfig, KeyRetention, MAX_IMAGES};
use q_common::constants::{BOOT_NUM_SLOTS, ENC_RECORD_MAX_SIZE};
use q_common::{log_debug, log_info, log_warn, LogBuffer};
use q_crypto::{DerivedKey, SecretBuffer, WrappedKeyCodec};

use crate::error::{EncError, EncResult};
use crate::image::ImageHeader;
use crate::status::BootStatus;
use crate::stream;
use crate::tlv::{locate_enc_record, read_enc_record, FlashArea, TlvRecord};

/// Total number of key slots
pub const N_SLOTS: usize = MAX_IMAGES as usize * BOOT_NUM_SLOTS;

const MODULE: &str = "enc";

// =============================================================================
// Slot Addressing
// =============================================================================

/// Flat key slot index (`image_index * 2 + slot`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotId(u8);

impl SlotId {
    /// Primary slot number within an image
    pub const PRIMARY: u8 = 0;
    /// Secondary slot number within an image
    pub const SECONDARY: u8 = 1;

    /// Build a slot id, `None` if either index is out of range
    #[must_use]
    pub const fn new(image_index: u8, slot: u8) -> Option<Self> {
        if image_index >= MAX_IMAGES || slot as usize >= BOOT_NUM_SLOTS {
            return None;
        }
        Some(Self(image_index * BOOT_NUM_SLOTS as u8 + slot))
    }

    /// Flat index into the slot table
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Image the slot belongs to
    #[must_use]
    pub const fn image_index(self) -> u8 {
        self.0 / BOOT_NUM_SLOTS as u8
    }
}

/// Maps an image and a flash area to its key slot
pub trait SlotResolver {
    /// Resolve `(image_index, area_id)`, `None` if the pair is unknown
    fn resolve(&self, image_index: u8, area_id: u8) -> Option<SlotId>;
}

/// Flash area ids of one image's slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageAreas {
    /// Primary (executable) slot area
    pub primary: u8,
    /// Secondary (update) slot area
    pub secondary: u8,
}

/// Static flash layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    images: [Option<ImageAreas>; MAX_IMAGES as usize],
}

impl SlotLayout {
    /// Default layout: image 0 in areas 1/2, image 1 in areas 5/6
    pub const DEFAULT: Self = Self {
        images: [
            Some(ImageAreas { primary: 1, secondary: 2 }),
            Some(ImageAreas { primary: 5, secondary: 6 }),
        ],
    };

    /// Layout for a single image
    #[must_use]
    pub fn single(primary: u8, secondary: u8) -> Self {
        let mut images = [None; MAX_IMAGES as usize];
        images[0] = Some(ImageAreas { primary, secondary });
        Self { images }
    }

    /// Set the areas of image `image_index`; out-of-range indices are ignored
    #[must_use]
    pub fn with_image(mut self, image_index: u8, areas: ImageAreas) -> Self {
        if let Some(entry) = self.images.get_mut(usize::from(image_index)) {
            *entry = Some(areas);
        }
        self
    }
}

impl Default for SlotLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl SlotResolver for SlotLayout {
    fn resolve(&self, image_index: u8, area_id: u8) -> Option<SlotId> {
        let areas = (*self.images.get(usize::from(image_index))?)?;
        if area_id == areas.primary {
            SlotId::new(image_index, SlotId::PRIMARY)
        } else if area_id == areas.secondary {
            SlotId::new(image_index, SlotId::SECONDARY)
        } else {
            None
        }
    }
}

// =============================================================================
// Key Slot
// =============================================================================

/// One key slot: an expanded AES-128 encryption schedule, or nothing
///
/// The schedule is scrubbed when it is dropped.
#[derive(Default)]
pub struct KeySlot {
    schedule: Option<Aes128Enc>,
}

impl KeySlot {
    /// Create an empty slot
    #[must_use]
    pub const fn new() -> Self {
        Self { schedule: None }
    }

    /// Expand `key` into this slot
    pub fn set_key(&mut self, key: &DerivedKey) {
        self.schedule = Some(Aes128Enc::new(GenericArray::from_slice(key.as_bytes())));
    }

    /// Check if the slot holds a key
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.schedule.is_some()
    }

    /// Scrub the slot
    pub fn clear(&mut self) {
        // Assignment drops the old schedule in place, which zeroizes it there.
        self.schedule = None;
    }

    pub(crate) const fn cipher(&self) -> Option<&Aes128Enc> {
        self.schedule.as_ref()
    }
}

impl core::fmt::Debug for KeySlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeySlot").field("valid", &self.is_valid()).finish()
    }
}

// =============================================================================
// Key Store
// =============================================================================

/// Result of a successful [`KeyStore::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The record was decoded and the slot activated
    Loaded,
    /// The slot was already active; nothing changed
    AlreadyLoaded,
}

/// Key slots for every image, bound to one wrapped-key codec
pub struct KeyStore<C: WrappedKeyCodec, R: SlotResolver = SlotLayout> {
    codec: C,
    resolver: R,
    config: EncryptionConfig,
    slots: [KeySlot; N_SLOTS],
    log: LogBuffer,
    seq: u32,
}

impl<C: WrappedKeyCodec, R: SlotResolver> KeyStore<C, R> {
    /// Create a store with every slot empty
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration is inconsistent or the codec
    /// does not implement the configured scheme.
    pub fn new(codec: C, resolver: R, config: &EncryptionConfig) -> EncResult<Self> {
        config.validate().map_err(|_| EncError::InvalidConfig)?;
        if codec.tlv_type() != config.scheme.tlv_type()
            || codec.record_len() != config.scheme.record_len()
            || codec.record_len() > ENC_RECORD_MAX_SIZE
        {
            return Err(EncError::InvalidConfig);
        }

        let mut store = Self {
            codec,
            resolver,
            config: *config,
            slots: core::array::from_fn(|_| KeySlot::new()),
            log: LogBuffer::with_min_level(config.log_level),
            seq: 0,
        };
        let ts = store.tick();
        log_info!(store.log, ts, MODULE, "key store ready, scheme {}", store.codec.name());
        Ok(store)
    }

    fn tick(&mut self) -> u32 {
        self.seq = self.seq.wrapping_add(1);
        self.seq
    }

    fn slot_for(&self, image_index: u8, area_id: u8) -> EncResult<SlotId> {
        if image_index >= self.config.image_count {
            return Err(EncError::UnknownImage);
        }
        self.resolver
            .resolve(image_index, area_id)
            .ok_or(EncError::UnknownImage)
    }

    /// Boot log of this store
    #[must_use]
    pub const fn log(&self) -> &LogBuffer {
        &self.log
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &EncryptionConfig {
        &self.config
    }

    /// Codec used to decode records
    #[must_use]
    pub const fn codec(&self) -> &C {
        &self.codec
    }

    /// Load the image key for the image in `area` into its slot
    ///
    /// With a `status`, the recovered material is also retained for swap
    /// resumption: the wrapped record for [`KeyRetention::WrappedRecord`]
    /// (read directly into the status scratch), or the derived key for
    /// [`KeyRetention::DerivedKey`].
    ///
    /// # Errors
    ///
    /// - `UnknownImage` if `(image_index, area.id())` has no slot
    /// - `NotEncrypted` if the header lacks the encrypted flag
    /// - `RecordNotFound` / `UnexpectedLength` from the locator
    /// - `Codec(_)` if the record does not decode
    ///
    /// The slot is left empty on every error.
    pub fn load<F: FlashArea + ?Sized>(
        &mut self,
        image_index: u8,
        hdr: &ImageHeader,
        area: &F,
        status: Option<&mut BootStatus>,
    ) -> EncResult<LoadOutcome> {
        let slot = self.slot_for(image_index, area.id())?;
        let idx = slot.index();

        if self.slots[idx].is_valid() {
            let ts = self.tick();
            log_debug!(self.log, ts, MODULE, "image {} slot {} already loaded", image_index, idx);
            return Ok(LoadOutcome::AlreadyLoaded);
        }
        if !hdr.is_encrypted() {
            return Err(EncError::NotEncrypted);
        }

        let ts = self.tick();
        log_info!(self.log, ts, MODULE, "loading key for image {} slot {}", image_index, idx);

        let rec = match locate_enc_record(area, hdr, self.codec.tlv_type(), self.codec.record_len()) {
            Ok(rec) => rec,
            Err(e) => {
                let ts = self.tick();
                log_warn!(self.log, ts, MODULE, "enc record: {}", e);
                return Err(e);
            }
        };

        let key = match status {
            Some(st) if self.config.retention == KeyRetention::WrappedRecord => {
                let buf = st.enctlv_mut(idx).ok_or(EncError::UnknownImage)?;
                let len = read_enc_record(area, &rec, buf)?;
                self.decode(&buf[..len])?
            }
            Some(st) => {
                let key = self.read_and_decode(area, &rec)?;
                st.store_key(idx, key.as_bytes());
                key
            }
            None => self.read_and_decode(area, &rec)?,
        };

        self.activate(slot, &key);
        Ok(LoadOutcome::Loaded)
    }

    fn read_and_decode<F: FlashArea + ?Sized>(
        &mut self,
        area: &F,
        rec: &TlvRecord,
    ) -> EncResult<DerivedKey> {
        let mut buf = SecretBuffer::<ENC_RECORD_MAX_SIZE>::new();
        let len = read_enc_record(area, rec, buf.as_mut_slice())?;
        self.decode(&buf.as_slice()[..len])
    }

    fn decode(&mut self, blob: &[u8]) -> EncResult<DerivedKey> {
        self.codec.decode(blob).map_err(|e| {
            let ts = self.tick();
            log_warn!(self.log, ts, MODULE, "{} decode failed: {}", self.codec.name(), e);
            EncError::Codec(e)
        })
    }

    /// Install a decoded key into a slot and mark it active
    pub fn activate(&mut self, slot: SlotId, key: &DerivedKey) {
        self.slots[slot.index()].set_key(key);
        let ts = self.tick();
        log_info!(self.log, ts, MODULE, "slot {} active", slot.index());
    }

    /// Check whether the slot for `(image_index, area_id)` holds a key
    ///
    /// Unknown pairs report `false`.
    #[must_use]
    pub fn is_ready(&self, image_index: u8, area_id: u8) -> bool {
        self.slot_for(image_index, area_id)
            .is_ok_and(|s| self.slots[s.index()].is_valid())
    }

    /// Access a slot by id
    #[must_use]
    pub fn slot(&self, slot: SlotId) -> &KeySlot {
        &self.slots[slot.index()]
    }

    fn ready_slot(&self, image_index: u8, area_id: u8) -> &KeySlot {
        match self.slot_for(image_index, area_id) {
            Ok(s) => &self.slots[s.index()],
            Err(_) => panic!("no key slot for image {image_index} area {area_id}"),
        }
    }

    /// Encrypt or decrypt part of an image payload in place
    ///
    /// See [`stream::transform`].
    ///
    /// # Panics
    ///
    /// Panics if the pair has no slot or the slot holds no key.
    pub fn transform_image(
        &self,
        image_index: u8,
        area_id: u8,
        image_offset: u32,
        block_offset: usize,
        buf: &mut [u8],
    ) {
        stream::transform(self.ready_slot(image_index, area_id), image_offset, block_offset, buf);
    }

    /// Decrypt the payload part of a chunk copied from flash area `area_id`
    ///
    /// See [`stream::decrypt_copy_chunk`].
    ///
    /// # Panics
    ///
    /// Panics if the pair has no slot, or if the chunk overlaps the payload
    /// and the slot holds no key.
    pub fn decrypt_copy_chunk(
        &self,
        image_index: u8,
        area_id: u8,
        hdr: &ImageHeader,
        chunk_off: u32,
        buf: &mut [u8],
    ) -> usize {
        stream::decrypt_copy_chunk(self.ready_slot(image_index, area_id), hdr, chunk_off, buf)
    }

    /// Re-activate an image's slots from retained swap status
    ///
    /// Slots that are already active or whose retained entry is erased are
    /// skipped. Returns the number of slots activated.
    ///
    /// # Errors
    ///
    /// `UnknownImage` for an out-of-range image, `Codec(_)` if a retained
    /// record no longer decodes.
    pub fn restore_from_status(&mut self, image_index: u8, status: &BootStatus) -> EncResult<usize> {
        if image_index >= self.config.image_count {
            return Err(EncError::UnknownImage);
        }

        let mut restored = 0;
        for slot_no in [SlotId::PRIMARY, SlotId::SECONDARY] {
            let slot = SlotId::new(image_index, slot_no).ok_or(EncError::UnknownImage)?;
            let idx = slot.index();
            if self.slots[idx].is_valid() {
                continue;
            }

            let key = match self.config.retention {
                KeyRetention::DerivedKey => {
                    if status.key_is_erased(idx) {
                        continue;
                    }
                    match DerivedKey::from_slice(&status.enckey[idx]) {
                        Some(key) => key,
                        None => continue,
                    }
                }
                KeyRetention::WrappedRecord => {
                    let len = self.codec.record_len();
                    if status.record_is_erased(idx, len) {
                        continue;
                    }
                    self.decode(&status.enctlv[idx][..len])?
                }
            };

            self.activate(slot, &key);
            restored += 1;
        }

        if restored > 0 {
            let ts = self.tick();
            log_info!(self.log, ts, MODULE, "restored {} slot(s) for image {}", restored, image_index);
        }
        Ok(restored)
    }

    /// Scrub every slot
    ///
    /// This is the only way a slot returns to empty. Call before handing
    /// control to the application.
    pub fn zeroize_all(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
        let ts = self.tick();
        log_info!(self.log, ts, MODULE, "key slots zeroized");
    }

    /// Check that no slot holds a key
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| !s.is_valid())
    }
}
