// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Board support: LEDs, buttons and the serial console
//!
//! The board descriptions themselves live next to each family, in
//! `<family>::board`.

use embedded_hal::digital::v2::{InputPin, OutputPin};

use crate::clocks;
use crate::serial::InvalidConfig;
use crate::time::{Bps, Hertz};

pub mod console;

/// Electrical level that means "on" or "pressed"
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

/// An LED on an output pin
pub struct Led<P> {
    pin: P,
    polarity: Polarity,
    lit: bool,
}

impl<P: OutputPin> Led<P> {
    /// Wraps `pin` and turns the LED off
    pub fn new(pin: P, polarity: Polarity) -> Self {
        let mut led = Led {
            pin,
            polarity,
            lit: true,
        };
        led.off();
        led
    }

    fn drive(&mut self, lit: bool) {
        let high = lit == (self.polarity == Polarity::ActiveHigh);
        // board pins are infallible; a failing expander pin just keeps its state
        let done = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if done.is_ok() {
            self.lit = lit;
        }
    }

    /// Lights the LED
    pub fn on(&mut self) {
        self.drive(true)
    }

    pub fn off(&mut self) {
        self.drive(false)
    }

    pub fn toggle(&mut self) {
        self.drive(!self.lit)
    }

    pub fn is_on(&self) -> bool {
        self.lit
    }

    /// Returns the pin
    pub fn free(self) -> P {
        self.pin
    }
}

/// A push button on an input pin
pub struct Button<P> {
    pin: P,
    polarity: Polarity,
}

impl<P: InputPin> Button<P> {
    pub fn new(pin: P, polarity: Polarity) -> Self {
        Button { pin, polarity }
    }

    /// Whether the button is held, after its polarity
    pub fn is_pressed(&self) -> Result<bool, P::Error> {
        match self.polarity {
            Polarity::ActiveHigh => self.pin.is_high(),
            Polarity::ActiveLow => self.pin.is_low(),
        }
    }

    pub fn free(self) -> P {
        self.pin
    }
}

/// Fixed facts about an evaluation board
#[derive(Clone, Copy, Debug)]
pub struct BoardInfo {
    pub name: &'static str,
    /// Frequency of the main crystal
    pub crystal: Hertz,
    /// System clock the board runs at after `board::init`
    pub sysclk: Hertz,
    pub led_polarity: Polarity,
    pub button_polarity: Polarity,
    pub console_baud: Bps,
}

/// Board bring-up error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The clock tree could not be brought up
    Clock(clocks::Error),
    /// The console baud rate is out of reach of its bus clock
    Console(InvalidConfig),
    /// `board::init` already ran
    AlreadyInitialized,
}

impl From<clocks::Error> for Error {
    fn from(e: clocks::Error) -> Self {
        Error::Clock(e)
    }
}

impl From<InvalidConfig> for Error {
    fn from(e: InvalidConfig) -> Self {
        Error::Console(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::tests::FakePort;
    use crate::gpio::{Floating, Input, Output, Pin, PushPull};

    #[test]
    fn active_low_led_drives_the_pin_low() {
        let port = FakePort::new();
        let pin: Pin<FakePort, 'D', 13, Output<PushPull>> =
            Pin::<FakePort, 'D', 13, Input<Floating>>::new(port).into_push_pull_output();

        let mut led = Led::new(pin, Polarity::ActiveLow);
        assert!(!led.is_on());
        assert_eq!(port.0.borrow().output & (1 << 13), 1 << 13);

        led.on();
        assert!(led.is_on());
        assert_eq!(port.0.borrow().output & (1 << 13), 0);

        led.toggle();
        assert!(!led.is_on());
        assert_eq!(port.0.borrow().output & (1 << 13), 1 << 13);
    }

    #[test]
    fn buttons_follow_their_polarity() {
        let port = FakePort::new();
        let high = Button::new(
            Pin::<FakePort, 'A', 0, Input<Floating>>::new(port),
            Polarity::ActiveHigh,
        );
        let low = Button::new(
            Pin::<FakePort, 'A', 1, Input<Floating>>::new(port),
            Polarity::ActiveLow,
        );
        assert_eq!(high.is_pressed(), Ok(false));
        assert_eq!(low.is_pressed(), Ok(true));

        port.0.borrow_mut().input = 0b11;
        assert_eq!(high.is_pressed(), Ok(true));
        assert_eq!(low.is_pressed(), Ok(false));
    }
}
