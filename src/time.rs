// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time units
//!
//! See [`Hertz`], [`KiloHertz`] and [`MegaHertz`] for frequencies, and
//! [`MilliSeconds`]/[`MicroSeconds`] for durations.
//!
//! ```rust,ignore
//! use m4_hal::prelude::*;
//!
//! let freq = 168.mhz();
//! let baud = 115_200.bps();
//! let timeout = 500.ms();
//! ```

/// Bits per second
#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub struct Bps(pub u32);

/// Hertz
#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub struct Hertz(pub u32);

/// KiloHertz
#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub struct KiloHertz(pub u32);

/// MegaHertz
#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub struct MegaHertz(pub u32);

/// Time unit
#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub struct MilliSeconds(pub u32);

/// Time unit
#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub struct MicroSeconds(pub u32);

/// Extension trait that adds convenience methods to the `u32` type
pub trait U32Ext {
    /// Wrap in `Bps`
    fn bps(self) -> Bps;

    /// Wrap in `Hertz`
    fn hz(self) -> Hertz;

    /// Wrap in `KiloHertz`
    fn khz(self) -> KiloHertz;

    /// Wrap in `MegaHertz`
    fn mhz(self) -> MegaHertz;

    /// Wrap in `MilliSeconds`
    fn ms(self) -> MilliSeconds;

    /// Wrap in `MicroSeconds`
    fn us(self) -> MicroSeconds;
}

impl U32Ext for u32 {
    fn bps(self) -> Bps {
        Bps(self)
    }

    fn hz(self) -> Hertz {
        Hertz(self)
    }

    fn khz(self) -> KiloHertz {
        KiloHertz(self)
    }

    fn mhz(self) -> MegaHertz {
        MegaHertz(self)
    }

    fn ms(self) -> MilliSeconds {
        MilliSeconds(self)
    }

    fn us(self) -> MicroSeconds {
        MicroSeconds(self)
    }
}

impl From<KiloHertz> for Hertz {
    fn from(val: KiloHertz) -> Self {
        Self(val.0 * 1_000)
    }
}

impl From<MegaHertz> for Hertz {
    fn from(val: MegaHertz) -> Self {
        Self(val.0 * 1_000_000)
    }
}

impl From<MegaHertz> for KiloHertz {
    fn from(val: MegaHertz) -> Self {
        Self(val.0 * 1_000)
    }
}

impl From<MilliSeconds> for MicroSeconds {
    fn from(val: MilliSeconds) -> Self {
        Self(val.0 * 1_000)
    }
}

impl From<MilliSeconds> for Hertz {
    fn from(period: MilliSeconds) -> Self {
        Self(1_000 / period.0)
    }
}

impl From<MicroSeconds> for Hertz {
    fn from(period: MicroSeconds) -> Self {
        Self(1_000_000 / period.0)
    }
}

impl Hertz {
    /// Period of one cycle in whole microseconds
    pub const fn period_us(self) -> u32 {
        1_000_000 / self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(Hertz::from(8.mhz()), Hertz(8_000_000));
        assert_eq!(Hertz::from(32.khz()), Hertz(32_000));
        assert_eq!(KiloHertz::from(25.mhz()), KiloHertz(25_000));
        assert_eq!(MicroSeconds::from(3.ms()), MicroSeconds(3_000));
        assert_eq!(Hertz::from(250.ms()), Hertz(4));
        assert_eq!(Hertz::from(100.us()), Hertz(10_000));
        assert_eq!(1_000.hz().period_us(), 1_000);
    }
}
