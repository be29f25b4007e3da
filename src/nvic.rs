// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interrupt priority grouping and vector table placement
//!
//! All four families implement the upper 4 bits of each priority byte. The
//! priority group decides how many of them select the preemption level; the
//! rest order pending interrupts of the same level.

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::{NVIC, SCB};

/// Implemented priority bits
pub const PRIO_BITS: u8 = 4;

const VECTKEY: u32 = 0x05FA << 16;
const PRIGROUP_MASK: u32 = 0x7 << 8;

/// Split of the priority bits between preemption and sub priority
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PriorityGroup {
    /// 0 bits preemption, 4 bits sub priority
    Group0,
    /// 1 bit preemption, 3 bits sub priority
    Group1,
    /// 2 bits preemption, 2 bits sub priority
    Group2,
    /// 3 bits preemption, 1 bit sub priority
    Group3,
    /// 4 bits preemption, 0 bits sub priority
    Group4,
}

impl PriorityGroup {
    /// Value of the `AIRCR.PRIGROUP` field
    pub const fn prigroup(self) -> u32 {
        7 - self as u32
    }

    /// Decodes an `AIRCR.PRIGROUP` field; values below 3 behave as group 4
    pub const fn from_prigroup(bits: u32) -> Self {
        match bits & 0x7 {
            7 => PriorityGroup::Group0,
            6 => PriorityGroup::Group1,
            5 => PriorityGroup::Group2,
            4 => PriorityGroup::Group3,
            _ => PriorityGroup::Group4,
        }
    }

    const fn preempt_bits(self) -> u32 {
        self as u32
    }

    const fn sub_bits(self) -> u32 {
        PRIO_BITS as u32 - self as u32
    }
}

/// `AIRCR` value selecting `group`, keeping the other fields of `aircr`
pub const fn aircr_value(aircr: u32, group: PriorityGroup) -> u32 {
    VECTKEY | (aircr & 0xFFFF & !PRIGROUP_MASK) | (group.prigroup() << 8)
}

/// Sets the priority group
pub fn set_priority_group(scb: &mut SCB, group: PriorityGroup) {
    let aircr = scb.aircr.read();
    // NOTE(unsafe) the key makes the write valid and only PRIGROUP changes
    unsafe { scb.aircr.write(aircr_value(aircr, group)) }
}

/// Returns the current priority group
pub fn priority_group(scb: &SCB) -> PriorityGroup {
    PriorityGroup::from_prigroup((scb.aircr.read() & PRIGROUP_MASK) >> 8)
}

/// Packs preemption and sub priority into a 4-bit priority
///
/// Each level is truncated to the bits the group gives it.
pub const fn encode_priority(group: PriorityGroup, preempt: u8, sub: u8) -> u8 {
    let pre = preempt as u32 & ((1 << group.preempt_bits()) - 1);
    let sub = sub as u32 & ((1 << group.sub_bits()) - 1);
    ((pre << group.sub_bits()) | sub) as u8
}

/// Splits a 4-bit priority into preemption and sub priority
pub const fn decode_priority(group: PriorityGroup, priority: u8) -> (u8, u8) {
    let priority = priority as u32;
    let pre = (priority >> group.sub_bits()) & ((1 << group.preempt_bits()) - 1);
    let sub = priority & ((1 << group.sub_bits()) - 1);
    (pre as u8, sub as u8)
}

/// Sets the priority of `irq` and unmasks it
///
/// # Safety
///
/// Unmasking may break critical sections built on masking `irq`.
pub unsafe fn irq_enable<I: InterruptNumber>(
    nvic: &mut NVIC,
    irq: I,
    group: PriorityGroup,
    preempt: u8,
    sub: u8,
) {
    nvic.set_priority(irq, encode_priority(group, preempt, sub) << (8 - PRIO_BITS));
    NVIC::unmask(irq);
}

/// Masks `irq`
pub fn irq_disable<I: InterruptNumber>(irq: I) {
    NVIC::mask(irq);
}

/// NVIC line by number, for code that only knows the raw IRQ number
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Line(pub u16);

unsafe impl InterruptNumber for Line {
    #[inline(always)]
    fn number(self) -> u16 {
        self.0
    }
}

/// Line of the interrupt an `irqn` from `DefaultHandler` refers to, `None`
/// for a system exception
pub fn device_line(irqn: i16) -> Option<Line> {
    u16::try_from(irqn).ok().map(Line)
}

/// Places the vector table at `base + offset`
///
/// # Safety
///
/// The new table must hold valid handlers for every enabled exception.
pub unsafe fn set_vector_table(scb: &mut SCB, base: u32, offset: u32) {
    scb.vtor.write(base | (offset & 0x1FFF_FF80));
}

/// Declares a family's `Interrupt` enum and, for the chip selected at build
/// time, its device vector table
///
/// Each line gets a vector named after its variant. The linker script
/// `device.x` written by the build script binds every name to
/// `DefaultHandler` unless the application defines it with
/// `#[interrupt]`. Vectors without a line in the enum point straight at
/// `DefaultHandler`.
macro_rules! interrupts {
    (
        $(#[$attr:meta])*
        chip: $chip:tt,
        vectors: $len:literal,
        lines: { $($LINE:ident = $n:literal,)+ }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        #[allow(non_camel_case_types)]
        #[repr(u16)]
        pub enum Interrupt {
            $($LINE = $n,)+
        }

        unsafe impl cortex_m::interrupt::InterruptNumber for Interrupt {
            #[inline(always)]
            fn number(self) -> u16 {
                self as u16
            }
        }

        impl Interrupt {
            /// Every line, in vector order
            pub const ALL: &'static [Interrupt] = &[$(Interrupt::$LINE,)+];

            /// Number of device vectors after the 16 system exceptions
            pub const VECTORS: usize = $len;

            /// Symbol of the handler bound to this line
            pub const fn handler(self) -> &'static str {
                match self {
                    $(Interrupt::$LINE => stringify!($LINE),)+
                }
            }
        }

        pub use self::Interrupt as interrupt;
        #[cfg(feature = "rt")]
        pub use cortex_m_rt::interrupt;

        #[cfg(all(feature = "rt", not(test), m4_hal_chip = $chip))]
        mod vectors {
            #[allow(non_snake_case)]
            extern "C" {
                fn DefaultHandler();
                $(fn $LINE();)+
            }

            #[doc(hidden)]
            #[derive(Clone, Copy)]
            pub union Vector {
                handler: unsafe extern "C" fn(),
                reserved: usize,
            }

            #[doc(hidden)]
            #[link_section = ".vector_table.interrupts"]
            #[no_mangle]
            pub static __INTERRUPTS: [Vector; $len] = {
                let mut vectors = [Vector { handler: DefaultHandler }; $len];
                $(vectors[$n] = Vector { handler: $LINE };)+
                vectors
            };
        }
    };
}

pub(crate) use interrupts;
