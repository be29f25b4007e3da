// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Register overlays and peripheral tokens
//!
//! Every peripheral of every family is described by a `#[repr(C)]` struct of
//! [`tock_registers`] registers, laid over the peripheral's fixed base
//! address. Access goes through an owned *token* per peripheral instance,
//! handed out once by the family's `Peripherals::take()`.

use core::fmt;
use core::ops::Deref;

pub use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};
pub use tock_registers::registers::{ReadOnly, ReadWrite, WriteOnly};
pub use tock_registers::{register_bitfields, LocalRegisterCopy};

/// A pointer to a statically allocated register block
///
/// Register blocks are never allocated or freed: they are the hardware. A
/// `StaticRef` is `Copy`, so several drivers (for example the two halves of
/// a split serial port) may refer to the same block; ownership of the token
/// is what grants the right to create them.
pub struct StaticRef<T> {
    ptr: *const T,
}

impl<T> StaticRef<T> {
    /// Creates a new `StaticRef` from a raw pointer
    ///
    /// # Safety
    ///
    /// `ptr` must point at a valid `T` for the rest of the program, and the
    /// caller must not create aliasing drivers for the same block.
    pub const unsafe fn new(ptr: *const T) -> StaticRef<T> {
        StaticRef { ptr }
    }

    /// Returns the address of the register block
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }
}

impl<T> Clone for StaticRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StaticRef<T> {}

impl<T> Deref for StaticRef<T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &T {
        // NOTE(unsafe) `new` requires the pointer to stay valid forever
        unsafe { &*self.ptr }
    }
}

impl<T> fmt::Debug for StaticRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StaticRef({:p})", self.ptr)
    }
}

// Register blocks are memory-mapped hardware. Moving a handle to another
// execution context is as sound as moving the token it came from.
unsafe impl<T> Send for StaticRef<T> {}

/// An owned handle to one peripheral instance
pub trait Peripheral {
    /// Register overlay of the peripheral
    type Registers;

    /// Returns a pointer to the peripheral's register block
    fn registers(&self) -> StaticRef<Self::Registers>;
}

/// Replaces the `width`-bit field at `shift` of a register
///
/// Used for the per-pin and per-line fields that `register_bitfields!`
/// cannot name individually.
#[inline]
pub fn write_field(reg: &ReadWrite<u32>, shift: u32, width: u32, value: u32) {
    let mask = ((1u32 << width) - 1) << shift;
    reg.set((reg.get() & !mask) | ((value << shift) & mask));
}

/// Reads the `width`-bit field at `shift` of a register value
#[inline]
pub const fn field(value: u32, shift: u32, width: u32) -> u32 {
    (value >> shift) & ((1u32 << width) - 1)
}

/// A hardware flag did not assert within the polling budget
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timeout;

/// Spins until `done` returns `true`, giving up after `budget` further polls
pub fn wait_for(mut budget: u32, mut done: impl FnMut() -> bool) -> Result<(), Timeout> {
    loop {
        if done() {
            return Ok(());
        }
        if budget == 0 {
            return Err(Timeout);
        }
        budget -= 1;
    }
}

/// Declares the peripheral tokens of a family and its `Peripherals` struct
macro_rules! peripherals {
    ($(
        $(#[$attr:meta])*
        $NAME:ident: $Regs:ty = $base:expr,
    )+) => {
        $(
            $(#[$attr])*
            pub struct $NAME {
                regs: $crate::reg::StaticRef<$Regs>,
            }

            impl $NAME {
                /// Base address of the register block
                pub const BASE: usize = $base;

                #[allow(dead_code)]
                pub(crate) const unsafe fn at(regs: $crate::reg::StaticRef<$Regs>) -> Self {
                    Self { regs }
                }
            }

            impl $crate::reg::Peripheral for $NAME {
                type Registers = $Regs;

                #[inline(always)]
                fn registers(&self) -> $crate::reg::StaticRef<$Regs> {
                    self.regs
                }
            }
        )+

        /// All peripherals of the device
        #[allow(non_snake_case)]
        pub struct Peripherals {
            $(
                pub $NAME: $NAME,
            )+
        }

        static TAKEN: core::sync::atomic::AtomicBool = core::sync::atomic::AtomicBool::new(false);

        impl Peripherals {
            /// Returns all the peripherals *once*
            pub fn take() -> Option<Self> {
                if TAKEN.swap(true, core::sync::atomic::Ordering::AcqRel) {
                    None
                } else {
                    // NOTE(unsafe) the flag guarantees a single set of tokens
                    Some(unsafe { Self::steal() })
                }
            }

            /// Unchecked version of `Peripherals::take`
            ///
            /// # Safety
            ///
            /// Each token must have at most one owner at a time.
            pub unsafe fn steal() -> Self {
                TAKEN.store(true, core::sync::atomic::Ordering::Release);
                Peripherals {
                    $(
                        $NAME: $NAME {
                            regs: $crate::reg::StaticRef::new($base as *const $Regs),
                        },
                    )+
                }
            }

            /// Every token on its own zeroed block in host memory
            #[cfg(test)]
            pub(crate) fn mock() -> Self {
                Peripherals {
                    $(
                        $NAME: $NAME {
                            regs: $crate::reg::mock::block(),
                        },
                    )+
                }
            }
        }
    };
}

pub(crate) use peripherals;

#[cfg(test)]
pub(crate) mod mock {
    //! Register blocks in host memory

    use super::StaticRef;

    /// Leaks a zeroed register block and returns a pointer to it
    pub fn block<T>() -> StaticRef<T> {
        // NOTE(unsafe) register overlays are plain integers in `UnsafeCell`s
        let block: Box<T> = Box::new(unsafe { core::mem::zeroed() });
        unsafe { StaticRef::new(Box::leak(block) as *const T) }
    }

    pub fn peek<T>(regs: StaticRef<T>, offset: usize) -> u32 {
        unsafe { core::ptr::read_volatile((regs.as_ptr() as *const u8).add(offset) as *const u32) }
    }

    pub fn poke<T>(regs: StaticRef<T>, offset: usize, value: u32) {
        unsafe {
            core::ptr::write_volatile((regs.as_ptr() as *mut u8).add(offset) as *mut u32, value)
        }
    }

    pub fn peek16<T>(regs: StaticRef<T>, offset: usize) -> u16 {
        unsafe { core::ptr::read_volatile((regs.as_ptr() as *const u8).add(offset) as *const u16) }
    }

    pub fn poke16<T>(regs: StaticRef<T>, offset: usize, value: u16) {
        unsafe {
            core::ptr::write_volatile((regs.as_ptr() as *mut u8).add(offset) as *mut u16, value)
        }
    }

    pub fn peek8<T>(regs: StaticRef<T>, offset: usize) -> u8 {
        unsafe { core::ptr::read_volatile((regs.as_ptr() as *const u8).add(offset)) }
    }

    pub fn poke8<T>(regs: StaticRef<T>, offset: usize, value: u8) {
        unsafe { core::ptr::write_volatile((regs.as_ptr() as *mut u8).add(offset), value) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_for_reports_timeout() {
        let mut polls = 0;
        assert_eq!(
            wait_for(10, || {
                polls += 1;
                false
            }),
            Err(Timeout)
        );
        assert_eq!(polls, 11);
    }

    #[test]
    fn wait_for_returns_once_ready() {
        let mut polls = 0;
        assert_eq!(
            wait_for(100, || {
                polls += 1;
                polls == 3
            }),
            Ok(())
        );
        assert_eq!(polls, 3);
    }

    #[test]
    fn field_helpers_touch_only_their_bits() {
        let regs = mock::block::<ReadWrite<u32>>();
        regs.set(0xffff_ffff);
        write_field(&regs, 4, 2, 0b01);
        assert_eq!(regs.get(), 0xffff_ffdf);
        assert_eq!(field(regs.get(), 4, 2), 0b01);
        write_field(&regs, 28, 4, 0x1f);
        assert_eq!(field(regs.get(), 28, 4), 0xf);
    }

    #[test]
    fn mock_blocks_are_zeroed_and_writable() {
        let regs = mock::block::<[ReadWrite<u32>; 4]>();
        assert_eq!(mock::peek(regs, 8), 0);
        regs[2].set(0xdead_beef);
        assert_eq!(mock::peek(regs, 8), 0xdead_beef);
        mock::poke(regs, 4, 7);
        assert_eq!(regs[1].get(), 7);
    }
}
