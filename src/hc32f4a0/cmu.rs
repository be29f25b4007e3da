// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Clock controller
//!
//! The CMU and PWC registers sit behind the `FPRC` write protection and the
//! flash wait cycles behind the EFM `FAPRT` key; `freeze` opens both only
//! for the duration of the bring-up. The SRAM and GPIO read wait cycles
//! have their own keys and follow HCLK as well. Above 168 MHz the core
//! domain is moved to the high performance drive mode before the switch.
//!
//! Peripheral clocks are gated through `FCG0..FCG3`, where a *set* bit stops
//! the clock. There are no per-peripheral reset bits.
//!
//! Of the seven bus clocks, [`Clocks::pclk1`] reports PCLK1 (USARTs, SPIs,
//! timers) and [`Clocks::pclk2`] reports PCLK4. PCLK0, PCLK2, PCLK3 and
//! EXCLK run as fast as their limits allow.

use super::gpio::set_read_wait;
use super::{CRC, TRNG, USART1, USART2, USART3, USART4, USART5, USART6, USART7, USART8};
use crate::clocks::{
    pll_search, smallest_div, BusClock, Clocks, Error, GateBus, PllLimits, Stage,
};
use crate::reg::{
    register_bitfields, wait_for, Peripheral, ReadWrite, ReadWriteable, Readable, StaticRef,
    Writeable,
};
use crate::time::Hertz;

/// High speed internal RC oscillator
pub const HRC: Hertz = Hertz(16_000_000);
/// Middle speed internal RC oscillator
pub const MRC: Hertz = Hertz(8_000_000);
/// Low speed internal RC oscillator
pub const LRC: Hertz = Hertz(32_768);
/// 32.768 kHz crystal
pub const XTAL32: Hertz = Hertz(32_768);
/// Main crystal of the EVB
pub const XTAL_VALUE: Hertz = Hertz(8_000_000);

pub const HCLK_MAX: u32 = 240_000_000;
pub const PCLK0_MAX: u32 = 240_000_000;
pub const PCLK1_MAX: u32 = 120_000_000;
pub const PCLK2_MAX: u32 = 60_000_000;
pub const PCLK3_MAX: u32 = 60_000_000;
pub const PCLK4_MAX: u32 = 120_000_000;
pub const EXCLK_MAX: u32 = 120_000_000;
/// Fastest HCLK of the high speed drive mode
pub const HIGH_SPEED_MAX: u32 = 168_000_000;

const FPRC_UNLOCK: u16 = 0xA503;
const FPRC_LOCK: u16 = 0xA500;
const FAPRT_KEYS: [u32; 2] = [0x0123, 0x3210];
const FAPRT_LOCK: u32 = 0x1111;
const FCG0PC_UNLOCK: u32 = 0xA5A5_0001;
const FCG0PC_LOCK: u32 = 0xA5A5_0000;
const WTPR_UNLOCK: u32 = 0x77;
const WTPR_LOCK: u32 = 0x76;

const STARTUP_BUDGET: u32 = 0x1000;

/// Bus clock dividers, in powers of two
const DIVS: [u32; 7] = [1, 2, 4, 8, 16, 32, 64];

register_bitfields![u32,
    SCFGR [
        HCLKS OFFSET(24) NUMBITS(3) [],
        EXCKS OFFSET(20) NUMBITS(3) [],
        PCLK4S OFFSET(16) NUMBITS(3) [],
        PCLK3S OFFSET(12) NUMBITS(3) [],
        PCLK2S OFFSET(8) NUMBITS(3) [],
        PCLK1S OFFSET(4) NUMBITS(3) [],
        PCLK0S OFFSET(0) NUMBITS(3) []
    ],
    PLLHCFGR [
        PLLHP OFFSET(28) NUMBITS(4) [],
        PLLHQ OFFSET(24) NUMBITS(4) [],
        PLLHR OFFSET(20) NUMBITS(4) [],
        PLLHN OFFSET(8) NUMBITS(8) [],
        PLLSRC OFFSET(7) NUMBITS(1) [
            XTAL = 0,
            HRC = 1
        ],
        PLLHM OFFSET(0) NUMBITS(2) []
    ],
    FRMC [
        FLWT OFFSET(0) NUMBITS(4) []
    ],
    WTCR [
        SRAMBWWT OFFSET(28) NUMBITS(3) [],
        SRAMBRWT OFFSET(24) NUMBITS(3) [],
        SRAMHWWT OFFSET(20) NUMBITS(3) [],
        SRAMHRWT OFFSET(16) NUMBITS(3) [],
        SRAM4WWT OFFSET(12) NUMBITS(3) [],
        SRAM4RWT OFFSET(8) NUMBITS(3) [],
        SRAM123WWT OFFSET(4) NUMBITS(3) [],
        SRAM123RWT OFFSET(0) NUMBITS(3) []
    ]
];

register_bitfields![u8,
    CKSWR [
        CKSW OFFSET(0) NUMBITS(3) [
            HRC = 0,
            MRC = 1,
            LRC = 2,
            XTAL = 3,
            XTAL32 = 4,
            PLLH = 5
        ]
    ],
    STP [
        STOP OFFSET(0) NUMBITS(1) []
    ],
    OSCSTBSR [
        PLLHSTBF OFFSET(5) NUMBITS(1) [],
        XTALSTBF OFFSET(3) NUMBITS(1) [],
        HRCSTBF OFFSET(0) NUMBITS(1) []
    ],
    PWRC2 [
        DVS OFFSET(4) NUMBITS(2) [
            HighPerformance = 0,
            UltraLowSpeed = 3
        ],
        DDAS OFFSET(0) NUMBITS(4) []
    ]
];

#[repr(C)]
pub struct CmuRegisters {
    _reserved0: [u8; 0x20],
    scfgr: ReadWrite<u32, SCFGR::Register>,
    _reserved1: [u8; 2],
    ckswr: ReadWrite<u8, CKSWR::Register>,
    _reserved2: [u8; 3],
    pllhcr: ReadWrite<u8, STP::Register>,
    _reserved3: [u8; 7],
    xtalcr: ReadWrite<u8, STP::Register>,
    _reserved4: [u8; 3],
    hrccr: ReadWrite<u8, STP::Register>,
    _reserved5: [u8; 1],
    mrccr: ReadWrite<u8, STP::Register>,
    _reserved6: [u8; 3],
    oscstbsr: ReadWrite<u8, OSCSTBSR::Register>,
    _reserved7: [u8; 0xC3],
    pllhcfgr: ReadWrite<u32, PLLHCFGR::Register>,
    _reserved8: [u8; 0x2FA],
    fprc: ReadWrite<u16>,
}

/// Embedded flash controller, only the read wait cycles
#[repr(C)]
pub struct EfmRegisters {
    faprt: ReadWrite<u32>,
    _reserved0: [u8; 0x14],
    frmc: ReadWrite<u32, FRMC::Register>,
}

/// SRAM controller, only the wait cycles
#[repr(C)]
pub struct SramcRegisters {
    wtcr: ReadWrite<u32, WTCR::Register>,
    wtpr: ReadWrite<u32>,
}

/// Power controller, only the core drive mode
#[repr(C)]
pub struct PwcRegisters {
    _reserved0: [u8; 2],
    pwrc2: ReadWrite<u8, PWRC2::Register>,
    pwrc3: ReadWrite<u8>,
}

/// Function clock gates
#[repr(C)]
pub struct FcgRegisters {
    fcg0: ReadWrite<u32>,
    fcg1: ReadWrite<u32>,
    fcg2: ReadWrite<u32>,
    fcg3: ReadWrite<u32>,
    fcg0pc: ReadWrite<u32>,
}

macro_rules! fcg {
    ($($(#[$attr:meta])* $FCG:ident => ($reg:ident, $clk:ident $(, protected: $pc:ident)?),)+) => {
        $(
            $(#[$attr])*
            pub struct $FCG {
                regs: StaticRef<FcgRegisters>,
            }

            impl $FCG {
                pub(crate) fn new(regs: StaticRef<FcgRegisters>) -> Self {
                    $FCG { regs }
                }
            }

            impl GateBus for $FCG {
                fn gate(&mut self, bit: u8, enabled: bool) {
                    $(self.regs.$pc.set(FCG0PC_UNLOCK);)?
                    // 1 stops the clock
                    crate::reg::write_field(&self.regs.$reg, bit.into(), 1, (!enabled).into());
                    $(self.regs.$pc.set(FCG0PC_LOCK);)?
                }

                fn is_gated_on(&self, bit: u8) -> bool {
                    self.regs.$reg.get() >> bit & 1 == 0
                }
            }

            impl BusClock for $FCG {
                #[inline(always)]
                fn clock(clocks: &Clocks) -> Hertz {
                    clocks.$clk()
                }
            }
        )+
    };
}

fcg! {
    /// System function gates, write protected by `FCG0PC`
    FCG0 => (fcg0, hclk, protected: fcg0pc),
    /// Communication peripherals
    FCG3 => (fcg3, pclk1),
}

crate::clocks::gate! {
    TRNG => (FCG0, 22),
    CRC => (FCG0, 23),
    USART1 => (FCG3, 24),
    USART2 => (FCG3, 25),
    USART3 => (FCG3, 26),
    USART4 => (FCG3, 27),
    USART5 => (FCG3, 28),
    USART6 => (FCG3, 29),
    USART7 => (FCG3, 30),
    USART8 => (FCG3, 31),
}

const PLL_LIMITS: PllLimits = PllLimits {
    m: (1, 4),
    n: (25, 150),
    p: &[2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16],
    vco_in: (8_000_000, 24_000_000),
    vco_out: (600_000_000, 1_200_000_000),
};

pub trait CmuExt {
    fn constrain(self, fcg: super::FCG) -> Cmu;
}

impl CmuExt for super::CMU {
    fn constrain(self, fcg: super::FCG) -> Cmu {
        let fcg = fcg.registers();
        Cmu {
            fcg0: FCG0::new(fcg),
            fcg3: FCG3::new(fcg),
            cfgr: CFGR {
                regs: self.registers(),
                xtal: None,
                sysclk: None,
                hclk: None,
                pclk1: None,
                pclk4: None,
            },
        }
    }
}

impl super::CMU {
    /// Derives the running clock frequencies from the CMU registers
    pub fn clocks(&self, xtal: Hertz) -> Clocks {
        read_clocks(&self.registers(), xtal)
    }
}

/// Constrained CMU
pub struct Cmu {
    pub fcg0: FCG0,
    pub fcg3: FCG3,
    pub cfgr: CFGR,
}

/// PLLH output for the raw `PLLHCFGR` fields, which hold each factor minus one
pub fn pllh_clock(src: u32, m: u32, n: u32, p: u32) -> u32 {
    (u64::from(src) / u64::from(m + 1) * u64::from(n + 1) / u64::from(p + 1)) as u32
}

pub fn read_clocks(cmu: &CmuRegisters, xtal: Hertz) -> Clocks {
    let sysclk = match cmu.ckswr.read_as_enum(CKSWR::CKSW) {
        Some(CKSWR::CKSW::Value::MRC) => MRC.0,
        Some(CKSWR::CKSW::Value::LRC) => LRC.0,
        Some(CKSWR::CKSW::Value::XTAL) => xtal.0,
        Some(CKSWR::CKSW::Value::XTAL32) => XTAL32.0,
        Some(CKSWR::CKSW::Value::PLLH) => {
            let cfg = cmu.pllhcfgr.extract();
            let src = match cfg.read_as_enum(PLLHCFGR::PLLSRC) {
                Some(PLLHCFGR::PLLSRC::Value::HRC) => HRC.0,
                _ => xtal.0,
            };
            pllh_clock(
                src,
                cfg.read(PLLHCFGR::PLLHM),
                cfg.read(PLLHCFGR::PLLHN),
                cfg.read(PLLHCFGR::PLLHP),
            )
        }
        _ => HRC.0,
    };
    let scfgr = cmu.scfgr.extract();
    Clocks::new(
        Hertz(sysclk),
        Hertz(sysclk >> scfgr.read(SCFGR::HCLKS)),
        Hertz(sysclk >> scfgr.read(SCFGR::PCLK1S)),
        Hertz(sysclk >> scfgr.read(SCFGR::PCLK4S)),
    )
}

/// Flash read wait cycles for an HCLK frequency
pub const fn wait_cycles(hclk: u32) -> u32 {
    hclk.saturating_sub(1) / 40_000_000
}

/// SRAM1-4 and SRAMB wait cycles for an HCLK frequency; SRAMH needs none
pub const fn sram_wait_cycles(hclk: u32) -> u32 {
    if hclk > 200_000_000 {
        1
    } else {
        0
    }
}

/// GPIO read wait cycles for an HCLK frequency, at most 3
pub const fn gpio_wait_cycles(hclk: u32) -> u16 {
    let cycles = hclk.saturating_sub(1) / 42_000_000;
    if cycles > 3 {
        3
    } else {
        cycles as u16
    }
}

/// Divider shift bringing `sysclk` to at most `target`
fn shift(sysclk: u32, target: u32) -> Result<u32, Error> {
    smallest_div(&DIVS, sysclk, target)
        .map(u32::trailing_zeros)
        .ok_or(Error::BusTooSlow)
}

fn requested(req: Option<Hertz>, max: u32) -> Result<u32, Error> {
    match req {
        Some(f) if f.0 > max => Err(Error::BusTooFast),
        Some(f) => Ok(f.0),
        None => Ok(max),
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Plan {
    /// `(m, n, p)`
    pll: Option<(u32, u32, u32)>,
    /// `SCFGR` value
    scfgr: u32,
    wait_cycles: u32,
    sram_wait: u32,
    gpio_wait: u16,
    high_performance: bool,
    clocks: Clocks,
}

/// Clock configuration builder
pub struct CFGR {
    regs: StaticRef<CmuRegisters>,
    xtal: Option<Hertz>,
    sysclk: Option<Hertz>,
    hclk: Option<Hertz>,
    pclk1: Option<Hertz>,
    pclk4: Option<Hertz>,
}

impl CFGR {
    /// Uses the main crystal instead of the HRC
    pub fn use_xtal<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.xtal = Some(freq.into());
        self
    }

    pub fn sysclk<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.sysclk = Some(freq.into());
        self
    }

    pub fn hclk<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.hclk = Some(freq.into());
        self
    }

    pub fn pclk1<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.pclk1 = Some(freq.into());
        self
    }

    /// Requests a PCLK4 frequency, reported as [`Clocks::pclk2`]
    pub fn pclk2<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.pclk4 = Some(freq.into());
        self
    }

    fn plan(&self) -> Result<Plan, Error> {
        let src = self.xtal.unwrap_or(HRC).0;
        let sysclk = self.sysclk.map_or(src, |f| f.0);
        if sysclk > HCLK_MAX {
            return Err(Error::PllUnreachable);
        }
        let pll = if sysclk == src {
            None
        } else {
            let f = pll_search(src, sysclk, &PLL_LIMITS)?;
            Some((f.m, f.n, f.p))
        };

        let hclks = shift(sysclk, requested(self.hclk, HCLK_MAX)?)?;
        let pclk1s = shift(sysclk, requested(self.pclk1, PCLK1_MAX)?)?;
        let pclk4s = shift(sysclk, requested(self.pclk4, PCLK4_MAX)?)?;
        let scfgr = SCFGR::HCLKS.val(hclks)
            + SCFGR::PCLK1S.val(pclk1s)
            + SCFGR::PCLK4S.val(pclk4s)
            + SCFGR::PCLK0S.val(shift(sysclk, PCLK0_MAX)?)
            + SCFGR::PCLK2S.val(shift(sysclk, PCLK2_MAX)?)
            + SCFGR::PCLK3S.val(shift(sysclk, PCLK3_MAX)?)
            + SCFGR::EXCKS.val(shift(sysclk, EXCLK_MAX)?);

        let hclk = sysclk >> hclks;
        Ok(Plan {
            pll,
            scfgr: scfgr.value,
            wait_cycles: wait_cycles(hclk),
            sram_wait: sram_wait_cycles(hclk),
            gpio_wait: gpio_wait_cycles(hclk),
            high_performance: hclk > HIGH_SPEED_MAX,
            clocks: Clocks::new(
                Hertz(sysclk),
                Hertz(hclk),
                Hertz(sysclk >> pclk1s),
                Hertz(sysclk >> pclk4s),
            ),
        })
    }

    /// Applies the clock configuration and returns the frozen frequencies
    ///
    /// The flash, SRAM and GPIO wait cycles are set for the new HCLK before
    /// the switch.
    pub fn freeze(
        self,
        efm: &super::EFM,
        sramc: &super::SRAMC,
        pwc: &super::PWC,
        gpio: &super::GPIO,
    ) -> Result<Clocks, Error> {
        let plan = self.plan()?;
        let cmu = self.regs;

        cmu.fprc.set(FPRC_UNLOCK);
        let result = self.bring_up(
            &plan,
            &efm.registers(),
            &sramc.registers(),
            &pwc.registers(),
            gpio,
        );
        cmu.fprc.set(FPRC_LOCK);
        result.map(|()| plan.clocks)
    }

    fn bring_up(
        &self,
        plan: &Plan,
        efm: &EfmRegisters,
        sramc: &SramcRegisters,
        pwc: &PwcRegisters,
        gpio: &super::GPIO,
    ) -> Result<(), Error> {
        let cmu = self.regs;

        cmu.scfgr.set(plan.scfgr);

        if self.xtal.is_some() {
            cmu.xtalcr.write(STP::STOP::CLEAR);
            wait_for(STARTUP_BUDGET, || cmu.oscstbsr.is_set(OSCSTBSR::XTALSTBF))
                .map_err(|_| Error::Timeout(Stage::External))?;
        } else {
            cmu.hrccr.write(STP::STOP::CLEAR);
            wait_for(STARTUP_BUDGET, || cmu.oscstbsr.is_set(OSCSTBSR::HRCSTBF))
                .map_err(|_| Error::Timeout(Stage::Internal))?;
        }

        let wait = plan.sram_wait;
        sramc.wtpr.set(WTPR_UNLOCK);
        sramc.wtcr.write(
            WTCR::SRAM123RWT.val(wait)
                + WTCR::SRAM123WWT.val(wait)
                + WTCR::SRAM4RWT.val(wait)
                + WTCR::SRAM4WWT.val(wait)
                + WTCR::SRAMBRWT.val(wait)
                + WTCR::SRAMBWWT.val(wait),
        );
        sramc.wtpr.set(WTPR_LOCK);

        FAPRT_KEYS.iter().for_each(|&key| efm.faprt.set(key));
        efm.frmc.modify(FRMC::FLWT.val(plan.wait_cycles));
        efm.faprt.set(FAPRT_LOCK);

        set_read_wait(&gpio.registers(), plan.gpio_wait);

        let sw = if let Some((m, n, p)) = plan.pll {
            let src = if self.xtal.is_some() {
                PLLHCFGR::PLLSRC::XTAL
            } else {
                PLLHCFGR::PLLSRC::HRC
            };
            cmu.pllhcr.write(STP::STOP::SET);
            cmu.pllhcfgr.write(
                PLLHCFGR::PLLHM.val(m - 1)
                    + PLLHCFGR::PLLHN.val(n - 1)
                    + PLLHCFGR::PLLHP.val(p - 1)
                    + PLLHCFGR::PLLHQ.val(p - 1)
                    + PLLHCFGR::PLLHR.val(p - 1)
                    + src,
            );
            cmu.pllhcr.write(STP::STOP::CLEAR);
            wait_for(STARTUP_BUDGET, || cmu.oscstbsr.is_set(OSCSTBSR::PLLHSTBF))
                .map_err(|_| Error::Timeout(Stage::Pll))?;
            CKSWR::CKSW::Value::PLLH as u8
        } else if self.xtal.is_some() {
            CKSWR::CKSW::Value::XTAL as u8
        } else {
            CKSWR::CKSW::Value::HRC as u8
        };

        if plan.high_performance {
            // all power domains driven, then the high performance level
            pwc.pwrc3.set(0xFF);
            pwc.pwrc2.write(PWRC2::DDAS.val(0xF) + PWRC2::DVS::HighPerformance);
        }

        cmu.ckswr.write(CKSWR::CKSW.val(sw));
        wait_for(STARTUP_BUDGET, || cmu.ckswr.read(CKSWR::CKSW) == sw)
            .map_err(|_| Error::Timeout(Stage::Switch))
    }
}
