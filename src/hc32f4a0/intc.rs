// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interrupt controller (INTC)
//!
//! Pin `N` of every port feeds external interrupt channel `N` once its
//! `PCR.INTE` is set. Vector slots are not fixed: each `IRQnnn` takes the
//! event source written into its `SEL` register.
//!
//! ```rust,ignore
//! let mut intc = Intc::new(dp.INTC);
//! let mut key = gpio.gpioa.pa0.into_pull_up_input();
//! intc.listen_gpio(&mut key, Trigger::Falling, Some(FilterClock::Div8), Interrupt::IRQ000);
//! ```

use cortex_m::interrupt::InterruptNumber;

use super::gpio::Port;
use super::{Interrupt, INTC};
use crate::exti::Edge;
use crate::gpio::{Input, Pin};
use crate::reg::{register_bitfields, Peripheral, ReadOnly, ReadWrite, Readable, WriteOnly, Writeable};

/// External interrupt channels
pub const CHANNELS: u8 = 16;

/// Event source number of channel 0, the others follow
pub const SRC_EIRQ0: u16 = 0;

register_bitfields![u32,
    EIRQCR [
        EFEN OFFSET(7) NUMBITS(1) [],
        EISMPCLK OFFSET(4) NUMBITS(2) [
            Div1 = 0,
            Div8 = 1,
            Div32 = 2,
            Div64 = 3
        ],
        EIRQTRG OFFSET(0) NUMBITS(2) [
            Falling = 0,
            Rising = 1,
            Both = 2,
            LowLevel = 3
        ]
    ],
    SEL [
        INTSEL OFFSET(0) NUMBITS(9) []
    ]
];

#[repr(C)]
pub struct IntcRegisters {
    nmicr: ReadWrite<u32>,
    nmienr: ReadWrite<u32>,
    nmifr: ReadOnly<u32>,
    nmicfr: WriteOnly<u32>,
    eirqcr: [ReadWrite<u32, EIRQCR::Register>; 16],
    wupen: ReadWrite<u32>,
    eifr: ReadOnly<u32>,
    eifcr: WriteOnly<u32>,
    sel: [ReadWrite<u32, SEL::Register>; 128],
}

/// Condition that raises a channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    Falling,
    Rising,
    Both,
    LowLevel,
}

impl From<Edge> for Trigger {
    fn from(edge: Edge) -> Self {
        match edge {
            Edge::Rising => Trigger::Rising,
            Edge::Falling => Trigger::Falling,
            Edge::RisingFalling => Trigger::Both,
        }
    }
}

/// Sampling clock of the digital filter, divided from PCLK3
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterClock {
    Div1,
    Div8,
    Div32,
    Div64,
}

/// Wraps the interrupt controller
pub struct Intc {
    intc: INTC,
}

impl Intc {
    pub fn new(intc: INTC) -> Self {
        Intc { intc }
    }

    /// Sets the trigger and filter of channel `ch`
    pub fn configure(&mut self, ch: u8, trigger: Trigger, filter: Option<FilterClock>) {
        let regs = self.intc.registers();
        let Some(cr) = regs.eirqcr.get(usize::from(ch)) else {
            return;
        };
        let trg = match trigger {
            Trigger::Falling => EIRQCR::EIRQTRG::Falling,
            Trigger::Rising => EIRQCR::EIRQTRG::Rising,
            Trigger::Both => EIRQCR::EIRQTRG::Both,
            Trigger::LowLevel => EIRQCR::EIRQTRG::LowLevel,
        };
        let clk = match filter.unwrap_or(FilterClock::Div1) {
            FilterClock::Div1 => EIRQCR::EISMPCLK::Div1,
            FilterClock::Div8 => EIRQCR::EISMPCLK::Div8,
            FilterClock::Div32 => EIRQCR::EISMPCLK::Div32,
            FilterClock::Div64 => EIRQCR::EISMPCLK::Div64,
        };
        cr.write(trg + clk + EIRQCR::EFEN.val(filter.is_some().into()));
    }

    /// Hands event `source` to vector slot `irq`
    pub fn route(&mut self, irq: Interrupt, source: u16) {
        let regs = self.intc.registers();
        if let Some(sel) = regs.sel.get(usize::from(irq.number())) {
            sel.write(SEL::INTSEL.val(source.into()));
        }
    }

    /// Enables the interrupt of `pin` and delivers its channel to `irq`
    pub fn listen_gpio<const P: char, const N: u8, MODE>(
        &mut self,
        pin: &mut Pin<Port, P, N, Input<MODE>>,
        trigger: Trigger,
        filter: Option<FilterClock>,
        irq: Interrupt,
    ) {
        self.configure(N, trigger, filter);
        self.route(irq, SRC_EIRQ0 + u16::from(N));
        pin.enable_interrupt();
    }

    /// Whether channel `ch` has latched a request
    pub fn is_pending(&self, ch: u8) -> bool {
        ch < CHANNELS && self.intc.registers().eifr.get() >> ch & 1 != 0
    }

    /// Clears the request latched on channel `ch`
    pub fn unpend(&mut self, ch: u8) {
        if ch < CHANNELS {
            self.intc.registers().eifcr.set(1 << ch);
        }
    }

    pub fn free(self) -> INTC {
        self.intc
    }
}

#[cfg(test)]
mod tests {
    use super::super::gpio::gpioa;
    use super::*;
    use crate::reg::mock;
    use core::mem::offset_of;

    #[test]
    fn register_layout() {
        assert_eq!(offset_of!(IntcRegisters, eirqcr), 0x10);
        assert_eq!(offset_of!(IntcRegisters, eifr), 0x54);
        assert_eq!(offset_of!(IntcRegisters, sel), 0x5C);
    }

    #[test]
    fn key_on_channel_0() {
        let token = unsafe { INTC::at(mock::block()) };
        let regs = token.registers();
        let mut key = gpioa::Parts::new(Port::mock(0)).pa0.into_pull_up_input();
        let mut intc = Intc::new(token);

        intc.listen_gpio(&mut key, Trigger::Falling, Some(FilterClock::Div8), Interrupt::IRQ002);
        assert_eq!(mock::peek(regs, 0x10), 1 << 7 | 1 << 4);
        assert_eq!(mock::peek(regs, 0x5C + 2 * 4), u32::from(SRC_EIRQ0));
        key.disable_interrupt();

        intc.route(Interrupt::IRQ005, 0x1A3);
        assert_eq!(mock::peek(regs, 0x5C + 5 * 4), 0x1A3);

        intc.configure(3, Edge::RisingFalling.into(), None);
        assert_eq!(mock::peek(regs, 0x10 + 3 * 4), 2);
        intc.configure(16, Trigger::Rising, None);

        assert!(!intc.is_pending(0));
        mock::poke(regs, 0x54, 1);
        assert!(intc.is_pending(0));
        intc.unpend(0);
        assert_eq!(mock::peek(regs, 0x58), 1);
        assert!(!intc.is_pending(16));
    }
}
