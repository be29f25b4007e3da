// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Controller Area Network (CAN) Interface
//!
//! The GD32F4 (CAN0, CAN1) and STM32F4 (CAN1, CAN2) controllers are bxCAN
//! cells; frames, filters and bit timing are handled by the [`bxcan`]
//! crate. This module gates the clock, checks the pin routing and hands the
//! instance over.
//!
//! TX and RX are alternate function 9 on both families.
//!
//! | Instance        | TX                 | RX                 |
//! |-----------------|--------------------|--------------------|
//! | CAN0 / CAN1     | PA12, PB9, PD1     | PA11, PB8, PD0     |
//! | CAN1 / CAN2     | PB13, PB6          | PB12, PB5          |
//!
//! ```rust,ignore
//! let can = Can::new(dp.CAN1, &mut rcc.apb1);
//! can.assign_pins((gpioa.pa12.into_alternate::<9>(), gpioa.pa11.into_alternate::<9>()));
//! let mut can = bxcan::Can::builder(can).set_bit_timing(0x001c_0003).enable();
//! ```

use crate::clocks::Enable;

mod sealed {
    pub trait Sealed {}
}

pub(crate) use sealed::Sealed;

/// TX/RX pin pair of a CAN instance
pub trait Pins: sealed::Sealed {
    type Instance;
}

/// Interface to the CAN peripheral.
pub struct Can<Instance> {
    _peripheral: Instance,
}

impl<Instance> Can<Instance>
where
    Instance: Enable,
{
    /// Creates a CAN interaface.
    pub fn new(can: Instance, bus: &mut Instance::Bus) -> Can<Instance> {
        Instance::enable(bus);
        Can { _peripheral: can }
    }

    /// Routes CAN TX signals and RX signals to pins.
    ///
    /// The pins are consumed; their alternate function already selects CAN.
    pub fn assign_pins<P>(&self, _pins: P)
    where
        P: Pins<Instance = Instance>,
    {
    }
}

/// Implements the pin pairs and the [`bxcan`] traits for a family
///
/// The first instance owns the 28 shared filter banks.
macro_rules! can_instances {
    (
        master: $MASTER:ident => [$(($mtx:ty, $mrx:ty),)+],
        slave: $SLAVE:ident => [$(($stx:ty, $srx:ty),)+],
    ) => {
        $(
            impl $crate::can::Sealed for ($mtx, $mrx) {}
            impl $crate::can::Pins for ($mtx, $mrx) {
                type Instance = $MASTER;
            }
        )+
        $(
            impl $crate::can::Sealed for ($stx, $srx) {}
            impl $crate::can::Pins for ($stx, $srx) {
                type Instance = $SLAVE;
            }
        )+

        unsafe impl bxcan::Instance for $crate::can::Can<$MASTER> {
            const REGISTERS: *mut bxcan::RegisterBlock = $MASTER::BASE as *mut _;
        }

        unsafe impl bxcan::Instance for $crate::can::Can<$SLAVE> {
            const REGISTERS: *mut bxcan::RegisterBlock = $SLAVE::BASE as *mut _;
        }

        unsafe impl bxcan::FilterOwner for $crate::can::Can<$MASTER> {
            const NUM_FILTER_BANKS: u8 = 28;
        }

        unsafe impl bxcan::MasterInstance for $crate::can::Can<$MASTER> {}
    };
}

pub(crate) use can_instances;
