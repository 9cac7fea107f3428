// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Application handoff
//!
//! Last step of the boot: scrub every key slot and the retained swap-status
//! keys, then chain-load the application. Nothing derived from an image key
//! may survive into the application's address space.

use core::sync::atomic::{compiler_fence, Ordering};

use zeroize::Zeroize;

use q_crypto::WrappedKeyCodec;

use crate::slots::{KeyStore, SlotResolver};
use crate::status::BootStatus;

/// Transfer of control to the next image
pub trait BootHandoff {
    /// Jump to the image whose vector table is at `vector_table`
    fn chain_load(&mut self, vector_table: u32) -> !;
}

/// Zeroize all key material and hand off to the application
///
/// The store and the status are scrubbed before `handoff` runs.
pub fn finish_boot<C, R, H>(
    store: &mut KeyStore<C, R>,
    status: Option<&mut BootStatus>,
    handoff: &mut H,
    vector_table: u32,
) -> !
where
    C: WrappedKeyCodec,
    R: SlotResolver,
    H: BootHandoff,
{
    store.zeroize_all();
    if let Some(st) = status {
        st.zeroize();
    }
    compiler_fence(Ordering::SeqCst);
    handoff.chain_load(vector_table)
}

/// Cortex-M handoff: load MSP from the vector table, scrub the general
/// purpose registers and branch to the reset handler
#[cfg(target_arch = "arm")]
#[derive(Debug, Default)]
pub struct CortexMHandoff;

#[cfg(target_arch = "arm")]
impl BootHandoff for CortexMHandoff {
    fn chain_load(&mut self, vector_table: u32) -> ! {
        use core::ptr;

        // SAFETY: `vector_table` is the start of a validated image in
        // memory-mapped flash. Word 0 is the initial stack pointer and
        // word 1 the reset handler.
        let (sp, entry) = unsafe {
            (
                ptr::read_volatile(vector_table as *const u32),
                ptr::read_volatile((vector_table + 4) as *const u32),
            )
        };

        dsb();
        isb();

        // SAFETY: Control never returns. Every register except the branch
        // target is cleared so no key-schedule residue reaches the
        // application.
        unsafe {
            core::arch::asm!(
                "msr msp, r0",
                "movs r0, #0",
                "mov r2, r0",
                "mov r3, r0",
                "mov r4, r0",
                "mov r5, r0",
                "mov r6, r0",
                "mov r7, r0",
                "mov r8, r0",
                "mov r9, r0",
                "mov r10, r0",
                "mov r11, r0",
                "mov r12, r0",
                "dsb sy",
                "isb",
                "bx r1",
                in("r0") sp,
                in("r1") entry,
                options(noreturn)
            );
        }
    }
}

/// Data Synchronization Barrier
#[cfg(target_arch = "arm")]
#[inline(always)]
fn dsb() {
    // SAFETY: DSB only orders memory accesses.
    unsafe {
        core::arch::asm!("dsb sy", options(nomem, nostack, preserves_flags));
    }
}

/// Instruction Synchronization Barrier
#[cfg(target_arch = "arm")]
#[inline(always)]
fn isb() {
    // SAFETY: ISB only flushes the pipeline.
    unsafe {
        core::arch::asm!("isb", options(nomem, nostack, preserves_flags));
    }
}
