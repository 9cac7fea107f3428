// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Integration tests for q-boot
//!
//! Encrypted images are assembled in RAM the way the signing tool lays them
//! out (header, padding, AES-CTR payload, TLV areas) and driven through the
//! key store: record lookup, slot activation, payload decryption, swap
//! status retention and the final scrub before handoff.

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes128;

use q_boot::{ImageHeader, KeyStore, RamFlashArea, SlotLayout};
use q_common::config::{EncryptionConfig, KeyRetention};
use q_common::constants::{IMAGE_F_ENCRYPTED, TLV_INFO_MAGIC, TLV_PROT_INFO_MAGIC};

const HDR_SIZE: u16 = 64;

/// Primary / secondary flash area ids of image 0 in the default layout
const PRIMARY: u8 = 1;
const SECONDARY: u8 = 2;

/// Image key carried by every scheme's record
const IMAGE_KEY: [u8; 16] = [
    0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17,
    0x18, 0x19, 0x1A, 0x1B, 0x1C, 0x1D, 0x1E, 0x1F,
];

/// Wrapped-key scheme the test images are built for: AES key-wrap when
/// enabled, otherwise ECIES-P256, otherwise RSA-OAEP
mod fixture {
    use q_common::config::EncScheme;

    #[cfg(feature = "enc-kw")]
    pub type Codec = q_crypto::AesKeyWrapCodec;
    #[cfg(feature = "enc-kw")]
    pub const SCHEME: EncScheme = EncScheme::Kw128;
    #[cfg(feature = "enc-kw")]
    const KEK: [u8; 16] = [
        0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27,
        0x28, 0x29, 0x2A, 0x2B, 0x2C, 0x2D, 0x2E, 0x2F,
    ];

    #[cfg(feature = "enc-kw")]
    pub fn codec() -> Codec {
        Codec::new(&KEK)
    }

    #[cfg(feature = "enc-kw")]
    pub fn record() -> Vec<u8> {
        codec().wrap_key(&super::IMAGE_KEY).to_vec()
    }

    #[cfg(all(feature = "enc-ec256", not(feature = "enc-kw")))]
    pub type Codec = q_crypto::EciesCodec;
    #[cfg(all(feature = "enc-ec256", not(feature = "enc-kw")))]
    pub const SCHEME: EncScheme = EncScheme::Ec256;

    #[cfg(all(feature = "enc-ec256", not(feature = "enc-kw")))]
    pub fn codec() -> Codec {
        Codec::new(include_bytes!("../../q-crypto/tests/data/ec256_priv.der")).unwrap()
    }

    #[cfg(all(feature = "enc-ec256", not(feature = "enc-kw")))]
    pub fn record() -> Vec<u8> {
        include_bytes!("../../q-crypto/tests/data/ecies_record.bin").to_vec()
    }

    #[cfg(all(feature = "enc-rsa", not(any(feature = "enc-kw", feature = "enc-ec256"))))]
    pub type Codec = q_crypto::RsaOaepCodec;
    #[cfg(all(feature = "enc-rsa", not(any(feature = "enc-kw", feature = "enc-ec256"))))]
    pub const SCHEME: EncScheme = EncScheme::Rsa2048;

    #[cfg(all(feature = "enc-rsa", not(any(feature = "enc-kw", feature = "enc-ec256"))))]
    pub fn codec() -> Codec {
        Codec::from_der(include_bytes!("../../q-crypto/tests/data/rsa2048_priv.der")).unwrap()
    }

    #[cfg(all(feature = "enc-rsa", not(any(feature = "enc-kw", feature = "enc-ec256"))))]
    pub fn record() -> Vec<u8> {
        include_bytes!("../../q-crypto/tests/data/rsa2048_oaep.bin").to_vec()
    }

    pub const TLV: u16 = SCHEME.tlv_type();
    pub const RECORD_LEN: usize = SCHEME.record_len();
}

use fixture::{RECORD_LEN, TLV};

/// Unrelated TLV type (image hash)
const TLV_SHA256: u16 = 0x10;

struct TestImage {
    bytes: Vec<u8>,
    hdr: ImageHeader,
    plain: Vec<u8>,
}

impl TestImage {
    fn payload(&self) -> &[u8] {
        let start = usize::from(self.hdr.hdr_size);
        &self.bytes[start..start + self.plain.len()]
    }
}

/// Independent AES-128-CTR over a whole payload starting at offset 0
fn reference_ctr(key: &[u8; 16], data: &mut [u8]) {
    let cipher = Aes128::new(GenericArray::from_slice(key));
    for (n, chunk) in data.chunks_mut(16).enumerate() {
        let mut block = GenericArray::from((n as u128).to_be_bytes());
        cipher.encrypt_block(&mut block);
        for (b, k) in chunk.iter_mut().zip(block.iter()) {
            *b ^= k;
        }
    }
}

fn push_area(out: &mut Vec<u8>, magic: u16, entries: &[(u16, &[u8])]) -> u16 {
    let start = out.len();
    out.extend_from_slice(&magic.to_le_bytes());
    out.extend_from_slice(&[0, 0]);
    for (t, v) in entries {
        out.extend_from_slice(&t.to_le_bytes());
        out.extend_from_slice(&(v.len() as u16).to_le_bytes());
        out.extend_from_slice(v);
    }
    let tot = (out.len() - start) as u16;
    out[start + 2..start + 4].copy_from_slice(&tot.to_le_bytes());
    tot
}

fn build_image(
    plain: &[u8],
    flags: u32,
    protected: &[(u16, &[u8])],
    unprotected: &[(u16, &[u8])],
) -> TestImage {
    let mut hdr = ImageHeader::new(HDR_SIZE, plain.len() as u32, flags);

    let mut payload = plain.to_vec();
    reference_ctr(&IMAGE_KEY, &mut payload);

    let mut tlvs = Vec::new();
    if !protected.is_empty() {
        hdr.protect_tlv_size = push_area(&mut tlvs, TLV_PROT_INFO_MAGIC, protected);
    }
    push_area(&mut tlvs, TLV_INFO_MAGIC, unprotected);

    let mut bytes = vec![0u8; usize::from(HDR_SIZE)];
    bytes[..32].copy_from_slice(&hdr.to_bytes());
    bytes.extend_from_slice(&payload);
    bytes.extend_from_slice(&tlvs);

    TestImage {
        bytes,
        hdr,
        plain: plain.to_vec(),
    }
}

fn plaintext(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}

/// Standard encrypted image with the wrapped key after a hash TLV
fn encrypted_image(len: usize) -> TestImage {
    let record = fixture::record();
    build_image(
        &plaintext(len),
        IMAGE_F_ENCRYPTED,
        &[],
        &[(TLV_SHA256, &[0xAB; 32]), (TLV, &record)],
    )
}

fn config(retention: KeyRetention) -> EncryptionConfig {
    EncryptionConfig {
        retention,
        ..EncryptionConfig::for_scheme(fixture::SCHEME)
    }
}

fn fresh_store(retention: KeyRetention) -> KeyStore<fixture::Codec> {
    KeyStore::new(fixture::codec(), SlotLayout::DEFAULT, &config(retention)).unwrap()
}

mod load_tests {
    use super::*;
    use q_boot::{EncError, LoadOutcome};

    #[test]
    fn test_load_and_decrypt_payload() {
        let img = encrypted_image(100);
        let area = RamFlashArea::new(PRIMARY, &img.bytes);
        let mut store = fresh_store(KeyRetention::WrappedRecord);

        assert_eq!(store.load(0, &img.hdr, &area, None), Ok(LoadOutcome::Loaded));
        assert!(store.is_ready(0, PRIMARY));
        assert!(!store.is_ready(0, SECONDARY));

        let mut payload = img.payload().to_vec();
        store.transform_image(0, PRIMARY, 0, 0, &mut payload);
        assert_eq!(payload, img.plain);
    }

    #[test]
    fn test_header_read_from_flash() {
        let img = encrypted_image(48);
        let area = RamFlashArea::new(PRIMARY, &img.bytes);
        let hdr = ImageHeader::read_from(&area).unwrap();
        assert_eq!(hdr, img.hdr);
        assert!(hdr.is_encrypted());
    }

    #[test]
    fn test_second_load_is_noop() {
        let img = encrypted_image(32);
        let area = RamFlashArea::new(PRIMARY, &img.bytes);
        let mut store = fresh_store(KeyRetention::WrappedRecord);

        assert_eq!(store.load(0, &img.hdr, &area, None), Ok(LoadOutcome::Loaded));
        assert_eq!(store.load(0, &img.hdr, &area, None), Ok(LoadOutcome::AlreadyLoaded));

        // Corrupting the record afterwards changes nothing for an active slot.
        let mut corrupt = img.bytes.clone();
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0xFF;
        let area = RamFlashArea::new(PRIMARY, &corrupt);
        assert_eq!(store.load(0, &img.hdr, &area, None), Ok(LoadOutcome::AlreadyLoaded));
        assert!(store.is_ready(0, PRIMARY));
    }

    #[test]
    fn test_missing_record() {
        let img = build_image(&plaintext(32), IMAGE_F_ENCRYPTED, &[], &[(TLV_SHA256, &[0; 32])]);
        let area = RamFlashArea::new(PRIMARY, &img.bytes);
        let mut store = fresh_store(KeyRetention::WrappedRecord);

        assert_eq!(store.load(0, &img.hdr, &area, None), Err(EncError::RecordNotFound));
        assert!(!store.is_ready(0, PRIMARY));
        assert!(store.log().contains("not found"));
    }

    #[test]
    fn test_wrong_record_length() {
        let img = build_image(&plaintext(32), IMAGE_F_ENCRYPTED, &[], &[(TLV, &[0; 20])]);
        let area = RamFlashArea::new(PRIMARY, &img.bytes);
        let mut store = fresh_store(KeyRetention::WrappedRecord);

        assert_eq!(store.load(0, &img.hdr, &area, None), Err(EncError::UnexpectedLength));
        assert!(!store.is_ready(0, PRIMARY));
    }

    #[test]
    fn test_record_in_protected_area() {
        let record = fixture::record();
        let img = build_image(
            &plaintext(64),
            IMAGE_F_ENCRYPTED,
            &[(TLV, &record)],
            &[(TLV_SHA256, &[0; 32])],
        );
        let area = RamFlashArea::new(SECONDARY, &img.bytes);
        let mut store = fresh_store(KeyRetention::WrappedRecord);

        assert_eq!(store.load(0, &img.hdr, &area, None), Ok(LoadOutcome::Loaded));
        assert!(store.is_ready(0, SECONDARY));
    }

    #[test]
    fn test_first_record_wins() {
        let record = fixture::record();
        let img = build_image(
            &plaintext(32),
            IMAGE_F_ENCRYPTED,
            &[],
            &[(TLV, &[0x55; RECORD_LEN]), (TLV, &record)],
        );
        let area = RamFlashArea::new(PRIMARY, &img.bytes);
        let mut store = fresh_store(KeyRetention::WrappedRecord);

        assert!(matches!(
            store.load(0, &img.hdr, &area, None),
            Err(EncError::Codec(_))
        ));
        assert!(!store.is_ready(0, PRIMARY));
    }

    #[test]
    fn test_corrupt_record_leaves_slot_empty() {
        let mut record = fixture::record();
        record[RECORD_LEN - 1] ^= 0x01;
        let img = build_image(&plaintext(32), IMAGE_F_ENCRYPTED, &[], &[(TLV, &record)]);
        let area = RamFlashArea::new(PRIMARY, &img.bytes);
        let mut store = fresh_store(KeyRetention::WrappedRecord);

        let err = store.load(0, &img.hdr, &area, None).unwrap_err();
        assert!(matches!(err, EncError::Codec(_)));
        assert!(!store.is_ready(0, PRIMARY));
        assert!(store.log().contains("decode failed"));
        assert!(store.log().contains(&format!("[0x{:04X}]", err.code())));
    }

    #[test]
    fn test_plain_image_rejected() {
        let record = fixture::record();
        let img = build_image(&plaintext(32), 0, &[], &[(TLV, &record)]);
        let area = RamFlashArea::new(PRIMARY, &img.bytes);
        let mut store = fresh_store(KeyRetention::WrappedRecord);

        assert_eq!(store.load(0, &img.hdr, &area, None), Err(EncError::NotEncrypted));
    }

    #[test]
    fn test_unknown_area_rejected() {
        let img = encrypted_image(32);
        let area = RamFlashArea::new(9, &img.bytes);
        let mut store = fresh_store(KeyRetention::WrappedRecord);

        assert_eq!(store.load(0, &img.hdr, &area, None), Err(EncError::UnknownImage));
        assert_eq!(store.load(1, &img.hdr, &area, None), Err(EncError::UnknownImage));
        assert!(store.is_empty());
    }

    #[test]
    fn test_log_records_events_without_key() {
        let img = encrypted_image(32);
        let area = RamFlashArea::new(PRIMARY, &img.bytes);
        let mut store = fresh_store(KeyRetention::WrappedRecord);
        store.load(0, &img.hdr, &area, None).unwrap();

        assert!(store.log().contains("loading key for image 0 slot 0"));
        assert!(store.log().contains("slot 0 active"));
        let key_hex: String = IMAGE_KEY[4..12].iter().map(|b| format!("{b:02x}")).collect();
        let wrapped_hex: String = fixture::record()[..8].iter().map(|b| format!("{b:02x}")).collect();
        for entry in store.log().iter() {
            let msg = entry.message.as_str().to_ascii_lowercase();
            assert!(!msg.contains(&key_hex), "{msg}");
            assert!(!msg.contains(&wrapped_hex), "{msg}");
        }
    }

    #[test]
    fn test_two_images_use_separate_slots() {
        let img = encrypted_image(32);
        let config = EncryptionConfig {
            image_count: 2,
            ..config(KeyRetention::WrappedRecord)
        };
        let mut store =
            KeyStore::new(fixture::codec(), SlotLayout::DEFAULT, &config).unwrap();

        let area = RamFlashArea::new(6, &img.bytes);
        assert_eq!(store.load(1, &img.hdr, &area, None), Ok(LoadOutcome::Loaded));
        assert!(store.is_ready(1, 6));
        assert!(!store.is_ready(0, PRIMARY));
        assert!(!store.is_ready(0, SECONDARY));
    }
}

mod stream_tests {
    use super::*;
    use proptest::prelude::*;

    fn loaded_store(img: &TestImage) -> KeyStore<fixture::Codec> {
        let area = RamFlashArea::new(PRIMARY, &img.bytes);
        let mut store = fresh_store(KeyRetention::WrappedRecord);
        store.load(0, &img.hdr, &area, None).unwrap();
        store
    }

    #[test]
    fn test_encrypt_matches_image_tool() {
        let img = encrypted_image(80);
        let store = loaded_store(&img);
        let mut buf = img.plain.clone();
        store.transform_image(0, PRIMARY, 0, 0, &mut buf);
        assert_eq!(buf, img.payload());
    }

    #[test]
    fn test_unaligned_resume() {
        let img = encrypted_image(80);
        let store = loaded_store(&img);
        let mut tail = img.payload()[37..].to_vec();
        store.transform_image(0, PRIMARY, 37, 37 & 0xf, &mut tail);
        assert_eq!(tail, img.plain[37..]);
    }

    #[test]
    fn test_copy_in_chunks_decrypts_only_payload() {
        let img = encrypted_image(150);
        let store = loaded_store(&img);

        let mut copied = Vec::new();
        for (n, chunk) in img.bytes.chunks(7).enumerate() {
            let mut buf = chunk.to_vec();
            store.decrypt_copy_chunk(0, PRIMARY, &img.hdr, (n * 7) as u32, &mut buf);
            copied.extend_from_slice(&buf);
        }

        let hdr_size = usize::from(HDR_SIZE);
        let tlv_off = img.hdr.tlv_offset() as usize;
        assert_eq!(copied[..hdr_size], img.bytes[..hdr_size]);
        assert_eq!(copied[hdr_size..tlv_off], img.plain[..]);
        assert_eq!(copied[tlv_off..], img.bytes[tlv_off..]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_chunked_equals_single_call(
            data in proptest::collection::vec(any::<u8>(), 1..200),
            cuts in proptest::collection::vec(any::<usize>(), 0..8),
        ) {
            let img = encrypted_image(16);
            let store = loaded_store(&img);

            let mut whole = data.clone();
            store.transform_image(0, PRIMARY, 0, 0, &mut whole);

            let mut points: Vec<usize> = cuts.iter().map(|c| c % data.len()).collect();
            points.push(0);
            points.push(data.len());
            points.sort_unstable();
            points.dedup();

            let mut pieces = data.clone();
            for w in points.windows(2) {
                let (lo, hi) = (w[0], w[1]);
                store.transform_image(0, PRIMARY, lo as u32, lo & 0xf, &mut pieces[lo..hi]);
            }
            prop_assert_eq!(pieces, whole);
        }

        #[test]
        fn prop_transform_is_involution(
            data in proptest::collection::vec(any::<u8>(), 0..100),
            off in 0u32..4096,
        ) {
            let img = encrypted_image(16);
            let store = loaded_store(&img);
            let mut buf = data.clone();
            store.transform_image(0, PRIMARY, off, (off & 0xf) as usize, &mut buf);
            store.transform_image(0, PRIMARY, off, (off & 0xf) as usize, &mut buf);
            prop_assert_eq!(buf, data);
        }
    }
}

mod status_tests {
    use super::*;
    use q_boot::{BootStatus, EncError, LoadOutcome, SlotId};

    #[test]
    fn test_wrapped_record_retained_and_restored() {
        let img = encrypted_image(64);
        let area = RamFlashArea::new(SECONDARY, &img.bytes);
        let mut status = BootStatus::new();

        let mut store = fresh_store(KeyRetention::WrappedRecord);
        assert_eq!(
            store.load(0, &img.hdr, &area, Some(&mut status)),
            Ok(LoadOutcome::Loaded)
        );
        let idx = SlotId::new(0, SlotId::SECONDARY).unwrap().index();
        assert_eq!(status.enctlv[idx][..RECORD_LEN], fixture::record());
        assert!(status.key_is_erased(idx));

        // Reset: fresh store, image no longer readable.
        let mut resumed = fresh_store(KeyRetention::WrappedRecord);
        assert_eq!(resumed.restore_from_status(0, &status), Ok(1));
        assert!(resumed.is_ready(0, SECONDARY));
        assert!(!resumed.is_ready(0, PRIMARY));

        let mut payload = img.payload().to_vec();
        resumed.transform_image(0, SECONDARY, 0, 0, &mut payload);
        assert_eq!(payload, img.plain);
    }

    #[test]
    fn test_derived_key_retained_and_restored() {
        let img = encrypted_image(64);
        let area = RamFlashArea::new(PRIMARY, &img.bytes);
        let mut status = BootStatus::new();

        let mut store = fresh_store(KeyRetention::DerivedKey);
        store.load(0, &img.hdr, &area, Some(&mut status)).unwrap();
        let idx = SlotId::new(0, SlotId::PRIMARY).unwrap().index();
        assert_eq!(status.enckey[idx], IMAGE_KEY);
        assert!(status.record_is_erased(idx, RECORD_LEN));

        let mut resumed = fresh_store(KeyRetention::DerivedKey);
        assert_eq!(resumed.restore_from_status(0, &status), Ok(1));
        let mut payload = img.payload().to_vec();
        resumed.transform_image(0, PRIMARY, 0, 0, &mut payload);
        assert_eq!(payload, img.plain);
    }

    #[test]
    fn test_erased_status_restores_nothing() {
        let img = encrypted_image(32);
        let area = RamFlashArea::new(PRIMARY, &img.bytes);
        let mut status = BootStatus::new();
        fresh_store(KeyRetention::WrappedRecord)
            .load(0, &img.hdr, &area, Some(&mut status))
            .unwrap();

        status.reset();
        let mut resumed = fresh_store(KeyRetention::WrappedRecord);
        assert_eq!(resumed.restore_from_status(0, &status), Ok(0));
        assert!(resumed.is_empty());
    }

    #[test]
    fn test_failed_load_retains_undecodable_record() {
        let mut record = fixture::record();
        record[0] ^= 0x80;
        let img = build_image(&plaintext(32), IMAGE_F_ENCRYPTED, &[], &[(TLV, &record)]);
        let area = RamFlashArea::new(PRIMARY, &img.bytes);
        let mut status = BootStatus::new();

        let mut store = fresh_store(KeyRetention::WrappedRecord);
        assert!(matches!(
            store.load(0, &img.hdr, &area, Some(&mut status)),
            Err(EncError::Codec(_))
        ));
        assert!(!store.is_ready(0, PRIMARY));
        // A bad retained record fails again on resume instead of activating.
        assert!(matches!(
            fresh_store(KeyRetention::WrappedRecord).restore_from_status(0, &status),
            Err(EncError::Codec(_))
        ));
    }
}

mod lifecycle_tests {
    use super::*;
    use q_boot::{finish_boot, BootHandoff, BootStatus, SlotId};
    use std::panic::{catch_unwind, AssertUnwindSafe};

    struct RecordingHandoff;

    impl BootHandoff for RecordingHandoff {
        fn chain_load(&mut self, vector_table: u32) -> ! {
            panic!("jump {vector_table:#x}");
        }
    }

    #[test]
    fn test_zeroize_all_clears_every_slot() {
        let img = encrypted_image(32);
        let mut store = fresh_store(KeyRetention::WrappedRecord);
        store
            .load(0, &img.hdr, &RamFlashArea::new(PRIMARY, &img.bytes), None)
            .unwrap();
        store
            .load(0, &img.hdr, &RamFlashArea::new(SECONDARY, &img.bytes), None)
            .unwrap();
        assert!(store.is_ready(0, PRIMARY) && store.is_ready(0, SECONDARY));

        store.zeroize_all();
        assert!(store.is_empty());
        assert!(!store.is_ready(0, PRIMARY));
        assert!(!store.slot(SlotId::new(0, 1).unwrap()).is_valid());

        // Slots can be loaded again afterwards.
        store
            .load(0, &img.hdr, &RamFlashArea::new(PRIMARY, &img.bytes), None)
            .unwrap();
        assert!(store.is_ready(0, PRIMARY));
    }

    #[test]
    #[should_panic(expected = "inactive key slot")]
    fn test_transform_after_zeroize_panics() {
        let img = encrypted_image(32);
        let mut store = fresh_store(KeyRetention::WrappedRecord);
        store
            .load(0, &img.hdr, &RamFlashArea::new(PRIMARY, &img.bytes), None)
            .unwrap();
        store.zeroize_all();
        let mut buf = [0u8; 16];
        store.transform_image(0, PRIMARY, 0, 0, &mut buf);
    }

    #[test]
    fn test_finish_boot_scrubs_before_handoff() {
        let img = encrypted_image(32);
        let area = RamFlashArea::new(PRIMARY, &img.bytes);
        let mut status = BootStatus::new();
        let mut store = fresh_store(KeyRetention::DerivedKey);
        store.load(0, &img.hdr, &area, Some(&mut status)).unwrap();
        assert!(!status.key_is_erased(0));

        let result = catch_unwind(AssertUnwindSafe(|| {
            finish_boot(&mut store, Some(&mut status), &mut RecordingHandoff, 0x1000_0000)
        }));
        assert!(result.is_err());
        assert!(store.is_empty());
        assert!(status.key_is_erased(0));
        assert!(store.log().contains("zeroized"));
    }
}

#[cfg(feature = "enc-ec256")]
mod ecies_tests {
    use super::*;
    use q_boot::{EncError, LoadOutcome};
    use q_common::config::EncScheme;
    use q_common::constants::{TLV_ENC_EC256, TLV_ENC_KW128};
    use q_crypto::EciesCodec;

    const EC_KEY_DER: &[u8] = include_bytes!("../../q-crypto/tests/data/ec256_priv.der");
    const EC_RECORD: &[u8] = include_bytes!("../../q-crypto/tests/data/ecies_record.bin");

    fn ecies_store() -> KeyStore<EciesCodec> {
        let config = EncryptionConfig::for_scheme(EncScheme::Ec256);
        KeyStore::new(EciesCodec::new(EC_KEY_DER).unwrap(), SlotLayout::DEFAULT, &config).unwrap()
    }

    #[test]
    fn test_ecies_image_loads() {
        let img = build_image(&plaintext(48), IMAGE_F_ENCRYPTED, &[], &[(TLV_ENC_EC256, EC_RECORD)]);
        let mut store = ecies_store();
        let area = RamFlashArea::new(PRIMARY, &img.bytes);
        assert_eq!(store.load(0, &img.hdr, &area, None), Ok(LoadOutcome::Loaded));

        let mut buf = img.payload().to_vec();
        store.transform_image(0, PRIMARY, 0, 0, &mut buf);
        assert_eq!(buf, img.plain);
    }

    #[test]
    fn test_other_scheme_record_ignored() {
        let img = build_image(&plaintext(32), IMAGE_F_ENCRYPTED, &[], &[(TLV_ENC_KW128, &[0x77; 24])]);
        let mut store = ecies_store();
        let area = RamFlashArea::new(PRIMARY, &img.bytes);
        assert_eq!(store.load(0, &img.hdr, &area, None), Err(EncError::RecordNotFound));
    }
}

mod scheme_tests {
    use super::*;
    use q_boot::LoadOutcome;
    use q_crypto::Scheme;

    #[test]
    fn test_store_over_build_selected_scheme() {
        let img = encrypted_image(40);
        let scheme = Scheme::from(fixture::codec());
        assert_eq!(scheme.kind(), fixture::SCHEME);
        let config = EncryptionConfig::for_scheme(scheme.kind());
        let mut store = KeyStore::new(scheme, SlotLayout::single(PRIMARY, SECONDARY), &config).unwrap();

        let area = RamFlashArea::new(PRIMARY, &img.bytes);
        assert_eq!(store.load(0, &img.hdr, &area, None), Ok(LoadOutcome::Loaded));
        let mut buf = img.payload().to_vec();
        store.transform_image(0, PRIMARY, 0, 0, &mut buf);
        assert_eq!(buf, img.plain);
    }
}
