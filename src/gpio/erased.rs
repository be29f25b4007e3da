// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;

/// Fully erased pin
///
/// `MODE` is one of the pin modes (see [Modes](crate::gpio#modes) section).
pub struct ErasedPin<PORT, MODE> {
    port: PORT,
    // Bits 0-3: Pin, Bits 4-7: Port
    pin_port: u8,
    _mode: MODE,
}

impl<PORT, MODE> PinExt for ErasedPin<PORT, MODE> {
    type Mode = MODE;

    #[inline(always)]
    fn pin_id(&self) -> u8 {
        self.pin_port & 0x0f
    }

    #[inline(always)]
    fn port_id(&self) -> u8 {
        self.pin_port >> 4
    }
}

impl<PORT: GpioPort, MODE> ErasedPin<PORT, MODE> {
    pub(crate) fn new(port: PORT, port_id: u8, pin: u8, mode: MODE) -> Self {
        Self {
            port,
            pin_port: port_id << 4 | pin,
            _mode: mode,
        }
    }

    #[inline(always)]
    fn mask(&self) -> u16 {
        1 << self.pin_id()
    }
}

impl<PORT: GpioPort, MODE> ErasedPin<PORT, Output<MODE>> {
    #[inline(always)]
    pub fn set_high(&mut self) {
        self.port.set_pins(self.mask())
    }

    #[inline(always)]
    pub fn set_low(&mut self) {
        self.port.reset_pins(self.mask())
    }

    #[inline(always)]
    pub fn get_state(&self) -> PinState {
        if self.is_set_low() {
            PinState::Low
        } else {
            PinState::High
        }
    }

    #[inline(always)]
    pub fn set_state(&mut self, state: PinState) {
        match state {
            PinState::Low => self.set_low(),
            PinState::High => self.set_high(),
        }
    }

    #[inline(always)]
    pub fn is_set_high(&self) -> bool {
        !self.is_set_low()
    }

    #[inline(always)]
    pub fn is_set_low(&self) -> bool {
        self.port.output() & self.mask() == 0
    }

    #[inline(always)]
    pub fn toggle(&mut self) {
        if self.is_set_low() {
            self.set_high()
        } else {
            self.set_low()
        }
    }
}

impl<PORT: GpioPort, MODE> OutputPin for ErasedPin<PORT, Output<MODE>> {
    type Error = Infallible;

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.set_high();
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.set_low();
        Ok(())
    }
}

impl<PORT: GpioPort, MODE> StatefulOutputPin for ErasedPin<PORT, Output<MODE>> {
    fn is_set_high(&self) -> Result<bool, Self::Error> {
        Ok(self.is_set_high())
    }

    fn is_set_low(&self) -> Result<bool, Self::Error> {
        Ok(self.is_set_low())
    }
}

impl<PORT: GpioPort, MODE> ToggleableOutputPin for ErasedPin<PORT, Output<MODE>> {
    type Error = Infallible;

    fn toggle(&mut self) -> Result<(), Self::Error> {
        self.toggle();
        Ok(())
    }
}

impl<PORT: GpioPort, MODE> ErasedPin<PORT, Input<MODE>> {
    #[inline(always)]
    pub fn is_high(&self) -> bool {
        !self.is_low()
    }

    #[inline(always)]
    pub fn is_low(&self) -> bool {
        self.port.input() & self.mask() == 0
    }
}

impl<PORT: GpioPort, MODE> InputPin for ErasedPin<PORT, Input<MODE>> {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Infallible> {
        Ok(self.is_high())
    }

    fn is_low(&self) -> Result<bool, Infallible> {
        Ok(self.is_low())
    }
}
