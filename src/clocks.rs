// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Clock model shared by all families
//!
//! Each family's clock unit (`CRM`, `RCU`, `CMU`, `RCC`) freezes its
//! configuration into a [`Clocks`] value. Drivers take a reference to it to
//! derive baud rates, prescalers and delays.

use crate::time::Hertz;

/// Frozen clock frequencies
///
/// The existence of this value indicates that the clock configuration can no
/// longer be changed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Clocks {
    sysclk: Hertz,
    hclk: Hertz,
    pclk1: Hertz,
    pclk2: Hertz,
}

impl Clocks {
    pub(crate) const fn new(sysclk: Hertz, hclk: Hertz, pclk1: Hertz, pclk2: Hertz) -> Self {
        Self {
            sysclk,
            hclk,
            pclk1,
            pclk2,
        }
    }

    /// Returns the system (core) frequency
    pub const fn sysclk(&self) -> Hertz {
        self.sysclk
    }

    /// Returns the frequency of the AHB
    pub const fn hclk(&self) -> Hertz {
        self.hclk
    }

    /// Returns the frequency of the low speed peripheral bus
    pub const fn pclk1(&self) -> Hertz {
        self.pclk1
    }

    /// Returns the frequency of the high speed peripheral bus
    pub const fn pclk2(&self) -> Hertz {
        self.pclk2
    }
}

/// Clock bring-up stage that a [`Error::Timeout`] refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    /// Internal RC oscillator stabilization
    Internal,
    /// External crystal or clock stabilization
    External,
    /// PLL lock
    Pll,
    /// System clock switch
    Switch,
    /// Power regulator mode change
    Power,
}

/// Clock configuration error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The hardware did not report ready in time
    Timeout(Stage),
    /// No PLL factors produce the requested system clock
    PllUnreachable,
    /// A requested bus frequency exceeds the bus maximum
    BusTooFast,
    /// A requested bus frequency is below what the largest divider gives
    BusTooSlow,
    /// The requested source is not available for this use
    InvalidSource,
}

/// Shift applied to the system clock by each AHB prescaler encoding
///
/// The 4-bit field is shared by the AT32, GD32 and STM32 clock units.
pub const AHB_SHIFT: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 6, 7, 8, 9];

/// Shift applied to the AHB clock by each APB prescaler encoding
pub const APB_SHIFT: [u8; 8] = [0, 0, 0, 0, 1, 2, 3, 4];

/// Register encoding of an AHB divider, if it is a legal one
pub const fn ahb_bits(div: u32) -> Option<u32> {
    match div {
        1 => Some(0b0000),
        2 => Some(0b1000),
        4 => Some(0b1001),
        8 => Some(0b1010),
        16 => Some(0b1011),
        64 => Some(0b1100),
        128 => Some(0b1101),
        256 => Some(0b1110),
        512 => Some(0b1111),
        _ => None,
    }
}

/// Register encoding of an APB divider, if it is a legal one
pub const fn apb_bits(div: u32) -> Option<u32> {
    match div {
        1 => Some(0b000),
        2 => Some(0b100),
        4 => Some(0b101),
        8 => Some(0b110),
        16 => Some(0b111),
        _ => None,
    }
}

const AHB_DIVS: [u32; 9] = [1, 2, 4, 8, 16, 64, 128, 256, 512];
const APB_DIVS: [u32; 5] = [1, 2, 4, 8, 16];

/// Smallest divider from `divs` that brings `input` down to at most `target`
pub(crate) fn smallest_div(divs: &[u32], input: u32, target: u32) -> Option<u32> {
    divs.iter().copied().find(|div| input / div <= target)
}

/// Picks the AHB divider for a requested HCLK
pub(crate) fn ahb_div(sysclk: u32, hclk: u32) -> Option<u32> {
    smallest_div(&AHB_DIVS, sysclk, hclk)
}

/// Picks the APB divider for a requested PCLK
pub(crate) fn apb_div(hclk: u32, pclk: u32) -> Option<u32> {
    smallest_div(&APB_DIVS, hclk, pclk)
}

/// Maximum frequencies of the AHB and the two APBs
#[derive(Clone, Copy, Debug)]
pub(crate) struct BusLimits {
    pub hclk: u32,
    pub pclk1: u32,
    pub pclk2: u32,
}

/// Dividers chosen for the AHB and the two APBs
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct BusPlan {
    pub hpre: u32,
    pub ppre1: u32,
    pub ppre2: u32,
    pub clocks: Clocks,
}

impl BusPlan {
    /// Register encodings of the three dividers
    pub fn bits(&self) -> (u32, u32, u32) {
        // every divider came from the AHB_DIVS/APB_DIVS tables
        (
            ahb_bits(self.hpre).unwrap_or(0),
            apb_bits(self.ppre1).unwrap_or(0),
            apb_bits(self.ppre2).unwrap_or(0),
        )
    }
}

/// Picks bus dividers for the requested frequencies
///
/// Unrequested buses run as fast as their maximum allows.
pub(crate) fn bus_plan(
    sysclk: u32,
    hclk: Option<u32>,
    pclk1: Option<u32>,
    pclk2: Option<u32>,
    limits: &BusLimits,
) -> Result<BusPlan, Error> {
    let hclk_req = hclk.unwrap_or_else(|| sysclk.min(limits.hclk));
    if hclk_req > limits.hclk {
        return Err(Error::BusTooFast);
    }
    let hpre = ahb_div(sysclk, hclk_req).ok_or(Error::BusTooSlow)?;
    let hclk = sysclk / hpre;

    let apb = |req: Option<u32>, max: u32| -> Result<u32, Error> {
        let req = req.unwrap_or_else(|| hclk.min(max));
        if req > max {
            return Err(Error::BusTooFast);
        }
        apb_div(hclk, req).ok_or(Error::BusTooSlow)
    };
    let ppre1 = apb(pclk1, limits.pclk1)?;
    let ppre2 = apb(pclk2, limits.pclk2)?;

    Ok(BusPlan {
        hpre,
        ppre1,
        ppre2,
        clocks: Clocks::new(
            Hertz(sysclk),
            Hertz(hclk),
            Hertz(hclk / ppre1),
            Hertz(hclk / ppre2),
        ),
    })
}

/// Derives the bus clocks from a system clock and the divider fields
pub(crate) fn decode_buses(sysclk: u32, hpre: u32, ppre1: u32, ppre2: u32) -> Clocks {
    let hclk = sysclk >> AHB_SHIFT[(hpre & 0xF) as usize];
    Clocks::new(
        Hertz(sysclk),
        Hertz(hclk),
        Hertz(hclk >> APB_SHIFT[(ppre1 & 0x7) as usize]),
        Hertz(hclk >> APB_SHIFT[(ppre2 & 0x7) as usize]),
    )
}

/// Bounds on the factors and intermediate frequencies of one PLL
///
/// The output is `src * n / (m * p)`. `vco_in` is `src / m` and `vco_out`
/// is `src * n / m`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PllLimits {
    pub m: (u32, u32),
    pub n: (u32, u32),
    pub p: &'static [u32],
    pub vco_in: (u32, u32),
    pub vco_out: (u32, u32),
}

/// Factors of a PLL configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PllFactors {
    pub m: u32,
    pub n: u32,
    pub p: u32,
}

impl PllFactors {
    /// VCO output for a source of `src` Hz
    pub fn vco(&self, src: u32) -> u32 {
        (u64::from(src) * u64::from(self.n) / u64::from(self.m)) as u32
    }
}

/// Finds PLL factors producing exactly `target` from `src`
///
/// Candidates are tried with the smallest output divider first, then the
/// smallest input divider.
pub(crate) fn pll_search(src: u32, target: u32, limits: &PllLimits) -> Result<PllFactors, Error> {
    let within = |v: u32, (lo, hi): (u32, u32)| v >= lo && v <= hi;
    for &p in limits.p {
        for m in limits.m.0..=limits.m.1 {
            if !within(src / m, limits.vco_in) {
                continue;
            }
            let num = u64::from(target) * u64::from(m) * u64::from(p);
            if num % u64::from(src) != 0 {
                continue;
            }
            let n = match u32::try_from(num / u64::from(src)) {
                Ok(n) => n,
                Err(_) => continue,
            };
            let factors = PllFactors { m, n, p };
            if within(n, limits.n) && within(factors.vco(src), limits.vco_out) {
                return Ok(factors);
            }
        }
    }
    Err(Error::PllUnreachable)
}

/// Bus register handle that can gate a peripheral's clock
pub trait GateBus {
    /// Turns the clock of the peripheral at `bit` on or off
    fn gate(&mut self, bit: u8, enabled: bool);

    /// Returns whether the clock of the peripheral at `bit` runs
    fn is_gated_on(&self, bit: u8) -> bool;
}

/// Bus register handle that can also reset a peripheral
pub trait ResetBus: GateBus {
    /// Asserts then releases the reset of the peripheral at `bit`
    fn pulse_reset(&mut self, bit: u8);
}

/// Frequency of the bus a peripheral hangs off
pub trait BusClock {
    /// Returns the bus frequency
    fn clock(clocks: &Clocks) -> Hertz;
}

/// Enable/disable the peripheral clock
pub trait Enable {
    /// Bus the peripheral is gated on
    type Bus;

    /// Starts the peripheral clock
    fn enable(bus: &mut Self::Bus);

    /// Stops the peripheral clock
    fn disable(bus: &mut Self::Bus);

    /// Returns whether the peripheral clock runs
    fn is_enabled(bus: &Self::Bus) -> bool;
}

/// Reset the peripheral
pub trait Reset: Enable {
    /// Resets the peripheral registers to their defaults
    fn reset(bus: &mut Self::Bus);
}

/// Declares the clock-gating bus handles of an F4-style clock unit
///
/// Each bus owns one enable register and one reset register of `$Regs` and
/// reports one of the [`Clocks`] frequencies.
macro_rules! buses {
    ($Regs:ty { $(
        $(#[$attr:meta])*
        $BUS:ident => (en: $en:ident, rst: $rst:ident, clk: $clk:ident),
    )+ }) => {
        $(
            $(#[$attr])*
            pub struct $BUS {
                regs: $crate::reg::StaticRef<$Regs>,
            }

            impl $BUS {
                #[allow(dead_code)]
                pub(crate) fn new(regs: $crate::reg::StaticRef<$Regs>) -> Self {
                    $BUS { regs }
                }
            }

            impl $crate::clocks::GateBus for $BUS {
                #[inline]
                fn gate(&mut self, bit: u8, enabled: bool) {
                    $crate::reg::write_field(&self.regs.$en, u32::from(bit), 1, u32::from(enabled))
                }

                #[inline]
                fn is_gated_on(&self, bit: u8) -> bool {
                    $crate::reg::field($crate::reg::Readable::get(&self.regs.$en), u32::from(bit), 1) != 0
                }
            }

            impl $crate::clocks::ResetBus for $BUS {
                #[inline]
                fn pulse_reset(&mut self, bit: u8) {
                    $crate::reg::write_field(&self.regs.$rst, u32::from(bit), 1, 1);
                    $crate::reg::write_field(&self.regs.$rst, u32::from(bit), 1, 0);
                }
            }

            impl $crate::clocks::BusClock for $BUS {
                #[inline(always)]
                fn clock(clocks: &$crate::clocks::Clocks) -> $crate::time::Hertz {
                    clocks.$clk()
                }
            }
        )+
    };
}

/// Implements [`Enable`] for tokens gated by bit `bit` of bus `Bus`
macro_rules! gate {
    ($($PER:ident => ($Bus:ty, $bit:expr),)+) => {
        $(
            impl $crate::clocks::Enable for $PER {
                type Bus = $Bus;

                #[inline(always)]
                fn enable(bus: &mut $Bus) {
                    $crate::clocks::GateBus::gate(bus, $bit, true)
                }

                #[inline(always)]
                fn disable(bus: &mut $Bus) {
                    $crate::clocks::GateBus::gate(bus, $bit, false)
                }

                #[inline(always)]
                fn is_enabled(bus: &$Bus) -> bool {
                    $crate::clocks::GateBus::is_gated_on(bus, $bit)
                }
            }
        )+
    };
}

/// Implements [`Reset`] for tokens already implementing [`Enable`]
macro_rules! reset {
    ($($PER:ident => $bit:expr,)+) => {
        $(
            impl $crate::clocks::Reset for $PER {
                #[inline(always)]
                fn reset(bus: &mut Self::Bus) {
                    $crate::clocks::ResetBus::pulse_reset(bus, $bit)
                }
            }
        )+
    };
}

pub(crate) use {buses, gate, reset};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodings_match_shift_tables() {
        for div in AHB_DIVS {
            let bits = ahb_bits(div).unwrap();
            assert_eq!(1 << AHB_SHIFT[bits as usize], div);
        }
        for div in APB_DIVS {
            let bits = apb_bits(div).unwrap();
            assert_eq!(1 << APB_SHIFT[bits as usize], div);
        }
        assert_eq!(ahb_bits(32), None);
        assert_eq!(apb_bits(3), None);
    }

    #[test]
    fn dividers_never_overshoot() {
        assert_eq!(ahb_div(168_000_000, 168_000_000), Some(1));
        assert_eq!(apb_div(168_000_000, 42_000_000), Some(4));
        assert_eq!(apb_div(168_000_000, 84_000_000), Some(2));
        assert_eq!(apb_div(200_000_000, 50_000_000), Some(4));
        // 32 is not an AHB divider, so 64 is the next candidate
        assert_eq!(ahb_div(320_000_000, 10_000_000), Some(64));
        assert_eq!(apb_div(288_000_000, 1_000_000), None);
    }

    #[test]
    fn bus_plan_respects_limits() {
        let limits = BusLimits {
            hclk: 168_000_000,
            pclk1: 42_000_000,
            pclk2: 84_000_000,
        };
        let plan = bus_plan(168_000_000, None, None, None, &limits).unwrap();
        assert_eq!((plan.hpre, plan.ppre1, plan.ppre2), (1, 4, 2));
        assert_eq!(plan.bits(), (0b0000, 0b101, 0b100));
        assert_eq!(plan.clocks.pclk1(), Hertz(42_000_000));
        assert_eq!(plan.clocks.pclk2(), Hertz(84_000_000));

        // a slow system clock leaves every bus undivided
        let plan = bus_plan(16_000_000, None, None, None, &limits).unwrap();
        assert_eq!((plan.hpre, plan.ppre1, plan.ppre2), (1, 1, 1));

        assert_eq!(
            bus_plan(168_000_000, None, Some(84_000_000), None, &limits),
            Err(Error::BusTooFast)
        );
        assert_eq!(
            bus_plan(168_000_000, None, Some(1_000_000), None, &limits),
            Err(Error::BusTooSlow)
        );
    }

    #[test]
    fn bus_decoding_uses_the_shift_tables() {
        let clocks = decode_buses(168_000_000, 0b0000, 0b101, 0b100);
        assert_eq!(clocks.hclk(), Hertz(168_000_000));
        assert_eq!(clocks.pclk1(), Hertz(42_000_000));
        assert_eq!(clocks.pclk2(), Hertz(84_000_000));
        let clocks = decode_buses(200_000_000, 0b1000, 0b100, 0b000);
        assert_eq!(clocks.hclk(), Hertz(100_000_000));
        assert_eq!(clocks.pclk1(), Hertz(50_000_000));
        assert_eq!(clocks.pclk2(), Hertz(100_000_000));
    }

    const F4_LIMITS: PllLimits = PllLimits {
        m: (2, 63),
        n: (50, 432),
        p: &[2, 4, 6, 8],
        vco_in: (1_000_000, 2_000_000),
        vco_out: (100_000_000, 432_000_000),
    };

    #[test]
    fn pll_search_reproduces_the_target() {
        let f = pll_search(8_000_000, 168_000_000, &F4_LIMITS).unwrap();
        assert_eq!(f, PllFactors { m: 4, n: 168, p: 2 });
        assert_eq!(8_000_000 / f.m * f.n / f.p, 168_000_000);
        assert_eq!(f.vco(8_000_000), 336_000_000);

        let f = pll_search(16_000_000, 84_000_000, &F4_LIMITS).unwrap();
        assert_eq!(u64::from(16_000_000u32) * u64::from(f.n) / u64::from(f.m * f.p), 84_000_000);
        assert!(f.vco(16_000_000) >= 100_000_000);
    }

    #[test]
    fn pll_search_rejects_unreachable_targets() {
        // above the VCO range with the smallest divider
        assert_eq!(
            pll_search(8_000_000, 250_000_000, &F4_LIMITS),
            Err(Error::PllUnreachable)
        );
        // not an exact multiple
        assert_eq!(
            pll_search(8_000_000, 100_000_001, &F4_LIMITS),
            Err(Error::PllUnreachable)
        );
    }
}
