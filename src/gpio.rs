// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # General Purpose I/Os
//!
//! Pins are type states: `Pin<PORT, P, N, MODE>` where `PORT` is the family's
//! port handle, `P` the port letter, `N` the pin number and `MODE` one of the
//! modes below. Converting a pin consumes it and returns the pin in its new
//! mode.
//!
//! ## Modes
//!
//! - **Input**: [`Floating`], [`PullUp`] or [`PullDown`]
//! - **Output**: [`PushPull`] or [`OpenDrain`]
//! - **Alternate**: function number `A`, push-pull or open-drain output stage
//! - **Analog**
//! - **Dynamic**: switchable at run time between input and output
//!
//! Changing a mode is a read-modify-write of registers shared by all pins of
//! a port. Don't reconfigure pins of one port from both thread and
//! interrupt context.

use core::convert::Infallible;
use core::marker::PhantomData;

use embedded_hal::digital::v2::{InputPin, OutputPin, StatefulOutputPin, ToggleableOutputPin};

mod erased;
pub use erased::ErasedPin;

/// Function of a pin
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Function {
    Input,
    Output,
    Alternate(u8),
    Analog,
}

/// Output stage
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputType {
    PushPull,
    OpenDrain,
}

/// Internal resistor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    None,
    Up,
    Down,
}

/// Complete configuration of one pin
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinConfig {
    pub function: Function,
    pub otype: OutputType,
    pub pull: Pull,
}

/// Slew rate (or drive strength) of output and alternate pins
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    Low,
    Medium,
    High,
    VeryHigh,
}

/// Register access to one GPIO port
///
/// Implemented by each family's port handle. Masks have one bit per pin.
pub trait GpioPort: Copy {
    /// Applies `config` to pin `pin`
    fn configure(&self, pin: u8, config: PinConfig);

    /// Sets the output slew rate of pin `pin`
    fn set_speed(&self, pin: u8, speed: Speed);

    /// Atomically drives the pins in `mask` high
    fn set_pins(&self, mask: u16);

    /// Atomically drives the pins in `mask` low
    fn reset_pins(&self, mask: u16);

    /// Returns the sampled input levels
    fn input(&self) -> u16;

    /// Returns the output latch
    fn output(&self) -> u16;

    /// Detaches pin `pin` from the debug port, for families that gate the
    /// debug signals outside the pin mode
    fn release_debug_pin(&self, _pin: u8) {}
}

/// Extension trait to split a GPIO peripheral in independent pins
pub trait GpioExt {
    /// The parts to split the GPIO into
    type Parts;

    /// Bus the port clock is gated on
    type Bus;

    /// Splits the GPIO block into independent pins
    fn split(self, bus: &mut Self::Bus) -> Self::Parts;
}

pub trait PinExt {
    type Mode;

    /// Return pin number
    fn pin_id(&self) -> u8;

    /// Return port number
    fn port_id(&self) -> u8;
}

/// Placeholder for a peripheral signal that is not routed to a pin
pub struct NoPin;

/// Marker trait for active states.
pub trait Active {}

/// Input mode (type state)
#[derive(Default)]
pub struct Input<MODE = Floating> {
    _mode: PhantomData<MODE>,
}
impl<MODE> Active for Input<MODE> {}

/// Used by the debugger (type state)
#[derive(Default)]
pub struct Debugger;

/// Floating input (type state)
#[derive(Default)]
pub struct Floating;

/// Pulled down input (type state)
#[derive(Default)]
pub struct PullDown;

/// Pulled up input (type state)
#[derive(Default)]
pub struct PullUp;

/// Output mode (type state)
#[derive(Default)]
pub struct Output<MODE = PushPull> {
    _mode: PhantomData<MODE>,
}
impl<MODE> Active for Output<MODE> {}

/// Push pull output (type state)
#[derive(Default)]
pub struct PushPull;

/// Open drain output (type state)
#[derive(Default)]
pub struct OpenDrain;

/// Analog mode (type state)
#[derive(Default)]
pub struct Analog;
impl Active for Analog {}

/// Alternate function `A` (type state)
#[derive(Default)]
pub struct Alternate<const A: u8, OTYPE = PushPull> {
    _mode: PhantomData<OTYPE>,
}
impl<const A: u8, OTYPE> Active for Alternate<A, OTYPE> {}

/// Digital output pin state
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinState {
    High,
    Low,
}

impl From<bool> for PinState {
    fn from(high: bool) -> Self {
        if high {
            PinState::High
        } else {
            PinState::Low
        }
    }
}

mod sealed {
    pub trait PinMode: Default {
        const CONFIG: super::PinConfig;
    }
}

use sealed::PinMode;

const fn config(function: Function, otype: OutputType, pull: Pull) -> PinConfig {
    PinConfig {
        function,
        otype,
        pull,
    }
}

impl PinMode for Input<Floating> {
    const CONFIG: PinConfig = config(Function::Input, OutputType::PushPull, Pull::None);
}

impl PinMode for Input<PullDown> {
    const CONFIG: PinConfig = config(Function::Input, OutputType::PushPull, Pull::Down);
}

impl PinMode for Input<PullUp> {
    const CONFIG: PinConfig = config(Function::Input, OutputType::PushPull, Pull::Up);
}

impl PinMode for Output<OpenDrain> {
    const CONFIG: PinConfig = config(Function::Output, OutputType::OpenDrain, Pull::None);
}

impl PinMode for Output<PushPull> {
    const CONFIG: PinConfig = config(Function::Output, OutputType::PushPull, Pull::None);
}

impl PinMode for Analog {
    const CONFIG: PinConfig = config(Function::Analog, OutputType::PushPull, Pull::None);
}

impl<const A: u8> PinMode for Alternate<A, PushPull> {
    const CONFIG: PinConfig = config(Function::Alternate(A), OutputType::PushPull, Pull::None);
}

impl<const A: u8> PinMode for Alternate<A, OpenDrain> {
    const CONFIG: PinConfig = config(Function::Alternate(A), OutputType::OpenDrain, Pull::None);
}

/// Tracks the current pin state for dynamic pins
pub enum Dynamic {
    InputFloating,
    InputPullUp,
    InputPullDown,
    OutputPushPull,
    OutputOpenDrain,
}

impl Default for Dynamic {
    fn default() -> Self {
        Dynamic::InputFloating
    }
}

impl Active for Dynamic {}

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinModeError {
    IncorrectMode,
}

impl Dynamic {
    fn is_input(&self) -> bool {
        use Dynamic::*;
        match self {
            InputFloating | InputPullUp | InputPullDown | OutputOpenDrain => true,
            OutputPushPull => false,
        }
    }

    fn is_output(&self) -> bool {
        use Dynamic::*;
        match self {
            InputFloating | InputPullUp | InputPullDown => false,
            OutputPushPull | OutputOpenDrain => true,
        }
    }
}

/// Declares the pins of one GPIO port
///
/// Expands to a module `$gpiox` with a `Parts` struct and one type alias per
/// pin, e.g. `PA9<MODE>`.
macro_rules! gpio_port {
    ($gpiox:ident, $Port:ident, $port_id:literal, [
        $($PXi:ident: ($pxi:ident, $pin_number:literal $(, $MODE:ty)?),)+
    ]) => {
        /// GPIO
        pub mod $gpiox {
            use super::$Port;
            #[allow(unused)]
            use $crate::gpio::Debugger;
            use $crate::gpio::{Floating, Input, Pin};

            /// GPIO parts
            pub struct Parts {
                $(
                    /// Pin
                    pub $pxi: $PXi $(<$MODE>)?,
                )+
            }

            $(
                pub type $PXi<MODE = Input<Floating>> = Pin<$Port, $port_id, $pin_number, MODE>;
            )+

            impl Parts {
                pub(crate) fn new(port: $Port) -> Self {
                    Parts {
                        $(
                            $pxi: Pin::new(port),
                        )+
                    }
                }
            }
        }

        pub use $gpiox::{ $($PXi,)+ };
    }
}

pub(crate) use gpio_port;

/// Generic pin type
///
/// - `PORT` is the family's port handle.
/// - `P` is port name: `A` for GPIOA, `B` for GPIOB, etc.
/// - `N` is pin number: from `0` to `15`.
/// - `MODE` is one of the pin modes (see [Modes](crate::gpio#modes) section).
pub struct Pin<PORT, const P: char, const N: u8, MODE = Input<Floating>> {
    port: PORT,
    mode: MODE,
}

impl<PORT: GpioPort, const P: char, const N: u8, MODE: Default> Pin<PORT, P, N, MODE> {
    pub(crate) fn new(port: PORT) -> Self {
        Self {
            port,
            mode: Default::default(),
        }
    }
}

impl<PORT: Copy, const P: char, const N: u8, MODE> Pin<PORT, P, N, MODE> {
    /// Port handle, for family-specific pin extensions
    pub(crate) fn port(&self) -> PORT {
        self.port
    }
}

impl<PORT, const P: char, const N: u8, MODE> PinExt for Pin<PORT, P, N, MODE> {
    type Mode = MODE;

    #[inline(always)]
    fn pin_id(&self) -> u8 {
        N
    }

    #[inline(always)]
    fn port_id(&self) -> u8 {
        P as u8 - b'A'
    }
}

impl<PORT: GpioPort, const P: char, const N: u8> Pin<PORT, P, N, Debugger> {
    /// Put the pin in an active state. The caller
    /// must enforce that the pin is really in this
    /// state in the hardware.
    pub(crate) unsafe fn activate(self) -> Pin<PORT, P, N, Input<Floating>> {
        Pin::new(self.port)
    }

    /// Takes the pin away from the debug port and makes it a floating input
    fn release(mut self) -> Pin<PORT, P, N, Input<Floating>> {
        self.mode::<Input<Floating>>();
        self.port.release_debug_pin(N);
        // The port now drives the pin as a floating input.
        unsafe { self.activate() }
    }
}

/// Disables the JTAG-only signals JTDI, JTDO and NJTRST and returns PA15,
/// PB3 and PB4 as floating inputs.
///
/// SWD on PA13 and PA14 keeps working. Once these pins are reconfigured a
/// JTAG adapter can no longer attach until the next reset.
pub fn disable_jtag<PA: GpioPort, PB: GpioPort>(
    pa15: Pin<PA, 'A', 15, Debugger>,
    pb3: Pin<PB, 'B', 3, Debugger>,
    pb4: Pin<PB, 'B', 4, Debugger>,
) -> (
    Pin<PA, 'A', 15, Input<Floating>>,
    Pin<PB, 'B', 3, Input<Floating>>,
    Pin<PB, 'B', 4, Input<Floating>>,
) {
    (pa15.release(), pb3.release(), pb4.release())
}

/// Disables the whole debug port, JTAG and SWD, and returns all five pins
/// as floating inputs.
///
/// # Safety
///
/// The debugger loses the core as soon as PA13 or PA14 changes mode. Do not
/// call this while a debugger is attached and relied upon.
pub unsafe fn disable_debug_port<PA: GpioPort, PB: GpioPort>(
    pa13: Pin<PA, 'A', 13, Debugger>,
    pa14: Pin<PA, 'A', 14, Debugger>,
    pa15: Pin<PA, 'A', 15, Debugger>,
    pb3: Pin<PB, 'B', 3, Debugger>,
    pb4: Pin<PB, 'B', 4, Debugger>,
) -> (
    Pin<PA, 'A', 13, Input<Floating>>,
    Pin<PA, 'A', 14, Input<Floating>>,
    Pin<PA, 'A', 15, Input<Floating>>,
    Pin<PB, 'B', 3, Input<Floating>>,
    Pin<PB, 'B', 4, Input<Floating>>,
) {
    let (pa15, pb3, pb4) = disable_jtag(pa15, pb3, pb4);
    (pa13.release(), pa14.release(), pa15, pb3, pb4)
}

impl<PORT: GpioPort, const P: char, const N: u8> OutputPin for Pin<PORT, P, N, Dynamic> {
    type Error = PinModeError;

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.mode.is_output() {
            self._set_high();
            Ok(())
        } else {
            Err(PinModeError::IncorrectMode)
        }
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.mode.is_output() {
            self._set_low();
            Ok(())
        } else {
            Err(PinModeError::IncorrectMode)
        }
    }
}

impl<PORT: GpioPort, const P: char, const N: u8> InputPin for Pin<PORT, P, N, Dynamic> {
    type Error = PinModeError;

    fn is_high(&self) -> Result<bool, Self::Error> {
        self.is_low().map(|b| !b)
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        if self.mode.is_input() {
            Ok(self._is_low())
        } else {
            Err(PinModeError::IncorrectMode)
        }
    }
}

// Internal helper functions

// NOTE: The functions in this impl block are "safe", but they
// are callable when the pin is in modes where they don't make
// sense.
impl<PORT: GpioPort, const P: char, const N: u8, MODE> Pin<PORT, P, N, MODE> {
    /**
      Set the output of the pin regardless of its mode.
      Primarily used to set the output value of the pin
      before changing its mode to an output to avoid
      a short spike of an incorrect value
    */
    #[inline(always)]
    fn _set_state(&mut self, state: PinState) {
        match state {
            PinState::High => self._set_high(),
            PinState::Low => self._set_low(),
        }
    }

    #[inline(always)]
    fn _set_high(&mut self) {
        self.port.set_pins(1 << N)
    }

    #[inline(always)]
    fn _set_low(&mut self) {
        self.port.reset_pins(1 << N)
    }

    #[inline(always)]
    fn _is_set_low(&self) -> bool {
        self.port.output() & (1 << N) == 0
    }

    #[inline(always)]
    fn _is_low(&self) -> bool {
        self.port.input() & (1 << N) == 0
    }

    fn mode<M: PinMode>(&mut self) {
        self.port.configure(N, M::CONFIG);
    }
}

impl<PORT: GpioPort, const P: char, const N: u8, MODE> Pin<PORT, P, N, MODE>
where
    MODE: Active,
{
    /// Erases the pin number and the port letter from the type
    ///
    /// This is useful when you want to collect the pins into an array where you
    /// need all the elements to have the same type
    #[inline]
    pub fn erase(self) -> ErasedPin<PORT, MODE> {
        ErasedPin::new(self.port, P as u8 - b'A', N, self.mode)
    }
}

impl<PORT: GpioPort, const P: char, const N: u8, MODE> Pin<PORT, P, N, Output<MODE>> {
    #[inline]
    pub fn set_high(&mut self) {
        self._set_high()
    }

    #[inline]
    pub fn set_low(&mut self) {
        self._set_low()
    }

    #[inline(always)]
    pub fn get_state(&self) -> PinState {
        if self._is_set_low() {
            PinState::Low
        } else {
            PinState::High
        }
    }

    #[inline(always)]
    pub fn set_state(&mut self, state: PinState) {
        self._set_state(state)
    }

    #[inline]
    pub fn is_set_high(&self) -> bool {
        !self._is_set_low()
    }

    #[inline]
    pub fn is_set_low(&self) -> bool {
        self._is_set_low()
    }

    #[inline]
    pub fn toggle(&mut self) {
        if self._is_set_low() {
            self._set_high()
        } else {
            self._set_low()
        }
    }

    /// Sets the slew rate of the output
    pub fn set_speed(&mut self, speed: Speed) {
        self.port.set_speed(N, speed)
    }
}

impl<PORT: GpioPort, const P: char, const N: u8, MODE> OutputPin for Pin<PORT, P, N, Output<MODE>> {
    type Error = Infallible;

    #[inline]
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_high();
        Ok(())
    }

    #[inline]
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_low();
        Ok(())
    }
}

impl<PORT: GpioPort, const P: char, const N: u8, MODE> StatefulOutputPin
    for Pin<PORT, P, N, Output<MODE>>
{
    #[inline]
    fn is_set_high(&self) -> Result<bool, Self::Error> {
        Ok(self.is_set_high())
    }

    #[inline]
    fn is_set_low(&self) -> Result<bool, Self::Error> {
        Ok(self.is_set_low())
    }
}

impl<PORT: GpioPort, const P: char, const N: u8, MODE> ToggleableOutputPin
    for Pin<PORT, P, N, Output<MODE>>
{
    type Error = Infallible;

    #[inline(always)]
    fn toggle(&mut self) -> Result<(), Self::Error> {
        self.toggle();
        Ok(())
    }
}

impl<PORT: GpioPort, const P: char, const N: u8, MODE> Pin<PORT, P, N, Input<MODE>> {
    #[inline]
    pub fn is_high(&self) -> bool {
        !self._is_low()
    }

    #[inline]
    pub fn is_low(&self) -> bool {
        self._is_low()
    }
}

impl<PORT: GpioPort, const P: char, const N: u8, MODE> InputPin for Pin<PORT, P, N, Input<MODE>> {
    type Error = Infallible;

    #[inline]
    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.is_high())
    }

    #[inline]
    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(self.is_low())
    }
}

impl<PORT: GpioPort, const P: char, const N: u8> Pin<PORT, P, N, Output<OpenDrain>> {
    #[inline]
    pub fn is_high(&self) -> bool {
        !self._is_low()
    }

    #[inline]
    pub fn is_low(&self) -> bool {
        self._is_low()
    }
}

impl<PORT: GpioPort, const P: char, const N: u8> InputPin for Pin<PORT, P, N, Output<OpenDrain>> {
    type Error = Infallible;

    #[inline]
    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.is_high())
    }

    #[inline]
    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(self.is_low())
    }
}

impl<PORT: GpioPort, const P: char, const N: u8, const A: u8, OTYPE>
    Pin<PORT, P, N, Alternate<A, OTYPE>>
{
    /// Sets the slew rate of the alternate function output
    pub fn set_speed(&mut self, speed: Speed) {
        self.port.set_speed(N, speed)
    }
}

impl<PORT: GpioPort, const P: char, const N: u8, MODE> Pin<PORT, P, N, MODE>
where
    MODE: Active,
{
    /// Configures the pin to operate as alternate function `A` with a
    /// push-pull output stage
    #[inline]
    pub fn into_alternate<const A: u8>(mut self) -> Pin<PORT, P, N, Alternate<A, PushPull>> {
        self.mode::<Alternate<A, PushPull>>();
        Pin::new(self.port)
    }

    /// Configures the pin to operate as alternate function `A` with an
    /// open-drain output stage
    #[inline]
    pub fn into_alternate_open_drain<const A: u8>(
        mut self,
    ) -> Pin<PORT, P, N, Alternate<A, OpenDrain>> {
        self.mode::<Alternate<A, OpenDrain>>();
        Pin::new(self.port)
    }

    /// Configures the pin to operate as a floating input pin
    #[inline]
    pub fn into_floating_input(mut self) -> Pin<PORT, P, N, Input<Floating>> {
        self.mode::<Input<Floating>>();
        Pin::new(self.port)
    }

    /// Configures the pin to operate as a pulled down input pin
    #[inline]
    pub fn into_pull_down_input(mut self) -> Pin<PORT, P, N, Input<PullDown>> {
        self.mode::<Input<PullDown>>();
        Pin::new(self.port)
    }

    /// Configures the pin to operate as a pulled up input pin
    #[inline]
    pub fn into_pull_up_input(mut self) -> Pin<PORT, P, N, Input<PullUp>> {
        self.mode::<Input<PullUp>>();
        Pin::new(self.port)
    }

    /// Configures the pin to operate as an open-drain output pin.
    /// Initial state will be low.
    #[inline]
    pub fn into_open_drain_output(self) -> Pin<PORT, P, N, Output<OpenDrain>> {
        self.into_open_drain_output_with_state(PinState::Low)
    }

    /// Configures the pin to operate as an open-drain output pin.
    /// `initial_state` specifies whether the pin should be initially high or low.
    #[inline]
    pub fn into_open_drain_output_with_state(
        mut self,
        initial_state: PinState,
    ) -> Pin<PORT, P, N, Output<OpenDrain>> {
        self._set_state(initial_state);
        self.mode::<Output<OpenDrain>>();
        Pin::new(self.port)
    }

    /// Configures the pin to operate as an push-pull output pin.
    /// Initial state will be low.
    #[inline]
    pub fn into_push_pull_output(self) -> Pin<PORT, P, N, Output<PushPull>> {
        self.into_push_pull_output_with_state(PinState::Low)
    }

    /// Configures the pin to operate as an push-pull output pin.
    /// `initial_state` specifies whether the pin should be initially high or low.
    #[inline]
    pub fn into_push_pull_output_with_state(
        mut self,
        initial_state: PinState,
    ) -> Pin<PORT, P, N, Output<PushPull>> {
        self._set_state(initial_state);
        self.mode::<Output<PushPull>>();
        Pin::new(self.port)
    }

    /// Configures the pin to operate as an analog input pin
    #[inline]
    pub fn into_analog(mut self) -> Pin<PORT, P, N, Analog> {
        self.mode::<Analog>();
        Pin::new(self.port)
    }

    /// Configures the pin as a pin that can change between input
    /// and output without changing the type. It starts out
    /// as a floating input
    #[inline]
    pub fn into_dynamic(mut self) -> Pin<PORT, P, N, Dynamic> {
        self.mode::<Input<Floating>>();
        Pin::new(self.port)
    }
}

// These macros are defined here instead of at the top level in order
// to be able to refer to macro variables from the outer layers.
macro_rules! impl_temp_output {
    ($fn_name:ident, $stateful_fn_name:ident, $mode:ty) => {
        /// Temporarily change the mode of the pin.
        ///
        /// The value of the pin after conversion is undefined. If you
        /// want to control it, use the `_with_state` variant
        #[inline]
        pub fn $fn_name(&mut self, mut f: impl FnMut(&mut Pin<PORT, P, N, $mode>)) {
            self.mode::<$mode>();
            let mut temp = Pin::<PORT, P, N, $mode>::new(self.port);
            f(&mut temp);
            self.mode::<MODE>();
        }

        /// Temporarily change the mode of the pin.
        ///
        /// Note that the new state is set slightly before conversion
        /// happens. This can cause a short output glitch if switching
        /// between output modes
        #[inline]
        pub fn $stateful_fn_name(
            &mut self,
            state: PinState,
            mut f: impl FnMut(&mut Pin<PORT, P, N, $mode>),
        ) {
            self._set_state(state);
            self.mode::<$mode>();
            let mut temp = Pin::<PORT, P, N, $mode>::new(self.port);
            f(&mut temp);
            self.mode::<MODE>();
        }
    };
}
macro_rules! impl_temp_input {
    ($fn_name:ident, $mode:ty) => {
        /// Temporarily change the mode of the pin.
        #[inline]
        pub fn $fn_name(&mut self, mut f: impl FnMut(&mut Pin<PORT, P, N, $mode>)) {
            self.mode::<$mode>();
            let mut temp = Pin::<PORT, P, N, $mode>::new(self.port);
            f(&mut temp);
            self.mode::<MODE>();
        }
    };
}

impl<PORT: GpioPort, const P: char, const N: u8, MODE> Pin<PORT, P, N, MODE>
where
    MODE: Active + PinMode,
{
    impl_temp_output!(
        as_push_pull_output,
        as_push_pull_output_with_state,
        Output<PushPull>
    );
    impl_temp_output!(
        as_open_drain_output,
        as_open_drain_output_with_state,
        Output<OpenDrain>
    );
    impl_temp_input!(as_floating_input, Input<Floating>);
    impl_temp_input!(as_pull_up_input, Input<PullUp>);
    impl_temp_input!(as_pull_down_input, Input<PullDown>);
}

// Dynamic pin

impl<PORT: GpioPort, const P: char, const N: u8> Pin<PORT, P, N, Dynamic> {
    #[inline]
    pub fn make_pull_up_input(&mut self) {
        self.mode::<Input<PullUp>>();
        self.mode = Dynamic::InputPullUp;
    }

    #[inline]
    pub fn make_pull_down_input(&mut self) {
        self.mode::<Input<PullDown>>();
        self.mode = Dynamic::InputPullDown;
    }

    #[inline]
    pub fn make_floating_input(&mut self) {
        self.mode::<Input<Floating>>();
        self.mode = Dynamic::InputFloating;
    }

    #[inline]
    pub fn make_push_pull_output(&mut self) {
        self.mode::<Output<PushPull>>();
        self.mode = Dynamic::OutputPushPull;
    }

    #[inline]
    pub fn make_open_drain_output(&mut self) {
        self.mode::<Output<OpenDrain>>();
        self.mode = Dynamic::OutputOpenDrain;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use core::cell::RefCell;

    /// Port that records configuration calls, for driver-independent tests
    #[derive(Clone, Copy)]
    pub struct FakePort(pub &'static RefCell<FakeState>);

    #[derive(Default)]
    pub struct FakeState {
        pub configs: [Option<PinConfig>; 16],
        pub speeds: [Option<Speed>; 16],
        pub input: u16,
        pub output: u16,
    }

    impl FakePort {
        pub fn new() -> Self {
            FakePort(Box::leak(Box::new(RefCell::new(FakeState::default()))))
        }
    }

    impl GpioPort for FakePort {
        fn configure(&self, pin: u8, config: PinConfig) {
            self.0.borrow_mut().configs[pin as usize] = Some(config);
        }

        fn set_speed(&self, pin: u8, speed: Speed) {
            self.0.borrow_mut().speeds[pin as usize] = Some(speed);
        }

        fn set_pins(&self, mask: u16) {
            self.0.borrow_mut().output |= mask;
        }

        fn reset_pins(&self, mask: u16) {
            self.0.borrow_mut().output &= !mask;
        }

        fn input(&self) -> u16 {
            self.0.borrow().input
        }

        fn output(&self) -> u16 {
            self.0.borrow().output
        }
    }

    type FakePin<const N: u8, MODE = Input<Floating>> = Pin<FakePort, 'C', N, MODE>;

    #[test]
    fn output_sets_state_before_mode() {
        let port = FakePort::new();
        let mut pin = FakePin::<13>::new(port).into_push_pull_output_with_state(PinState::High);
        assert_eq!(port.0.borrow().output, 1 << 13);
        assert_eq!(
            port.0.borrow().configs[13],
            Some(Output::<PushPull>::CONFIG)
        );
        assert!(pin.is_set_high());
        pin.toggle();
        assert!(pin.is_set_low());
        assert_eq!(pin.get_state(), PinState::Low);
        assert_eq!(pin.pin_id(), 13);
        assert_eq!(pin.port_id(), 2);
    }

    #[test]
    fn alternate_function_and_speed() {
        let port = FakePort::new();
        let mut pin = FakePin::<9>::new(port).into_alternate::<7>();
        pin.set_speed(Speed::VeryHigh);
        let state = port.0.borrow();
        assert_eq!(
            state.configs[9],
            Some(PinConfig {
                function: Function::Alternate(7),
                otype: OutputType::PushPull,
                pull: Pull::None,
            })
        );
        assert_eq!(state.speeds[9], Some(Speed::VeryHigh));
    }

    #[test]
    fn inputs_read_the_input_register() {
        let port = FakePort::new();
        let pin = FakePin::<0>::new(port).into_pull_up_input();
        assert!(pin.is_low());
        port.0.borrow_mut().input = 1;
        assert!(pin.is_high());
        assert_eq!(port.0.borrow().configs[0].unwrap().pull, Pull::Up);
    }

    #[test]
    fn temporary_modes_restore_the_original_mode() {
        let port = FakePort::new();
        let mut pin = FakePin::<4>::new(port).into_pull_down_input();
        pin.as_push_pull_output_with_state(PinState::High, |out| {
            assert!(out.is_set_high());
        });
        assert_eq!(port.0.borrow().configs[4], Some(Input::<PullDown>::CONFIG));
    }

    #[test]
    fn dynamic_pins_check_their_mode() {
        let port = FakePort::new();
        let mut pin = FakePin::<2>::new(port).into_dynamic();
        assert_eq!(OutputPin::set_high(&mut pin), Err(PinModeError::IncorrectMode));
        assert_eq!(InputPin::is_low(&pin), Ok(true));
        pin.make_push_pull_output();
        assert_eq!(OutputPin::set_high(&mut pin), Ok(()));
        assert_eq!(InputPin::is_high(&pin), Err(PinModeError::IncorrectMode));
        pin.make_open_drain_output();
        assert_eq!(InputPin::is_high(&pin), Ok(false));
    }

    #[test]
    fn jtag_pins_become_usable() {
        let porta = FakePort::new();
        let portb = FakePort::new();
        let (pa15, pb3, pb4) = disable_jtag(
            Pin::<_, 'A', 15, Debugger>::new(porta),
            Pin::<_, 'B', 3, Debugger>::new(portb),
            Pin::<_, 'B', 4, Debugger>::new(portb),
        );
        assert_eq!(porta.0.borrow().configs[15], Some(Input::<Floating>::CONFIG));
        assert_eq!(porta.0.borrow().configs[13], None);

        let _sck = pb3.into_alternate::<5>();
        let _miso = pb4.into_alternate::<5>();
        let _nss = pa15.into_push_pull_output_with_state(PinState::High);
        let state = portb.0.borrow();
        assert_eq!(state.configs[3].unwrap().function, Function::Alternate(5));
        assert_eq!(state.configs[4].unwrap().function, Function::Alternate(5));
        assert_eq!(porta.0.borrow().output, 1 << 15);
    }

    #[test]
    fn debug_port_release_frees_swd_pins() {
        let porta = FakePort::new();
        let portb = FakePort::new();
        let (pa13, pa14, ..) = unsafe {
            disable_debug_port(
                Pin::<_, 'A', 13, Debugger>::new(porta),
                Pin::<_, 'A', 14, Debugger>::new(porta),
                Pin::<_, 'A', 15, Debugger>::new(porta),
                Pin::<_, 'B', 3, Debugger>::new(portb),
                Pin::<_, 'B', 4, Debugger>::new(portb),
            )
        };
        let mut led = pa13.into_push_pull_output();
        led.set_high();
        assert!(pa14.is_low());
        assert_eq!(porta.0.borrow().output, 1 << 13);
        assert_eq!(portb.0.borrow().configs[4], Some(Input::<Floating>::CONFIG));
    }

    #[test]
    fn erased_pins_keep_working() {
        let port = FakePort::new();
        let mut leds = [
            FakePin::<1>::new(port).into_push_pull_output().erase(),
            FakePin::<5>::new(port).into_push_pull_output().erase(),
        ];
        for led in leds.iter_mut() {
            led.set_high();
        }
        assert_eq!(port.0.borrow().output, (1 << 1) | (1 << 5));
        assert_eq!(leds[1].pin_id(), 5);
        assert_eq!(leds[1].port_id(), 2);
    }
}
