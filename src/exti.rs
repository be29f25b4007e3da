// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External interrupt/event lines
//!
//! Lines 0 to 15 follow the GPIO pin of the same number on the port chosen
//! through the system configuration controller; the remaining lines are
//! wired to internal sources (PVD, RTC alarm, USB wakeup, ...).

use crate::gpio::PinExt;
use crate::reg::Peripheral;

/// Edge that triggers a line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
    RisingFalling,
}

impl Edge {
    pub(crate) fn rising(self) -> bool {
        matches!(self, Edge::Rising | Edge::RisingFalling)
    }

    pub(crate) fn falling(self) -> bool {
        matches!(self, Edge::Falling | Edge::RisingFalling)
    }
}

/// Register access to an external interrupt controller
pub trait ExtiRegisters {
    /// Number of lines
    const LINES: u8;

    /// Lets `line` reach the NVIC when `unmasked`
    fn set_interrupt_mask(&self, line: u8, unmasked: bool);

    /// Lets `line` raise a wakeup event when `unmasked`
    fn set_event_mask(&self, line: u8, unmasked: bool);

    /// Picks the edges that trigger `line`
    fn set_edges(&self, line: u8, rising: bool, falling: bool);

    /// Raises the line from software
    fn trigger(&self, line: u8);

    /// Whether `line` has triggered since it was last cleared
    fn is_pending(&self, line: u8) -> bool;

    /// Clears the pending flag of `line`
    fn clear_pending(&self, line: u8);
}

/// Selects which GPIO port drives EXTI lines 0 to 15
pub trait SourceSelect {
    /// Connects pin `line` of port `port` (0 for A) to its line
    fn select(&mut self, line: u8, port: u8);
}

/// Wraps the external interrupt controller
pub struct Exti<EXTI> {
    exti: EXTI,
}

impl<EXTI> Exti<EXTI>
where
    EXTI: Peripheral,
    EXTI::Registers: ExtiRegisters,
{
    /// Takes the controller; no line changes until one is listened to
    pub fn new(exti: EXTI) -> Self {
        Exti { exti }
    }

    fn line_ok(line: u8) -> bool {
        line < <EXTI::Registers as ExtiRegisters>::LINES
    }

    /// Unmasks the interrupt of `line`, triggered by `edge`
    pub fn listen(&mut self, line: u8, edge: Edge) {
        if Self::line_ok(line) {
            let regs = self.exti.registers();
            regs.set_edges(line, edge.rising(), edge.falling());
            regs.set_interrupt_mask(line, true);
        }
    }

    /// Masks the interrupt of `line`
    pub fn unlisten(&mut self, line: u8) {
        if Self::line_ok(line) {
            self.exti.registers().set_interrupt_mask(line, false);
        }
    }

    /// Unmasks the event of `line`, triggered by `edge`
    pub fn listen_event(&mut self, line: u8, edge: Edge) {
        if Self::line_ok(line) {
            let regs = self.exti.registers();
            regs.set_edges(line, edge.rising(), edge.falling());
            regs.set_event_mask(line, true);
        }
    }

    /// Masks the event of `line`
    pub fn unlisten_event(&mut self, line: u8) {
        if Self::line_ok(line) {
            self.exti.registers().set_event_mask(line, false);
        }
    }

    /// Routes `pin` to the line of its number and listens for `edge`
    pub fn listen_gpio<PIN: PinExt, SEL: SourceSelect>(
        &mut self,
        pin: &PIN,
        syscfg: &mut SEL,
        edge: Edge,
    ) {
        syscfg.select(pin.pin_id(), pin.port_id());
        self.listen(pin.pin_id(), edge);
    }

    /// Raises `line` from software
    pub fn trigger(&mut self, line: u8) {
        if Self::line_ok(line) {
            self.exti.registers().trigger(line);
        }
    }

    /// Whether `line` has a pending request
    pub fn is_pending(&self, line: u8) -> bool {
        Self::line_ok(line) && self.exti.registers().is_pending(line)
    }

    /// Clears the pending request of `line`
    pub fn unpend(&mut self, line: u8) {
        if Self::line_ok(line) {
            self.exti.registers().clear_pending(line);
        }
    }

    /// Returns the token, leaving the line settings as they are
    pub fn free(self) -> EXTI {
        self.exti
    }
}
