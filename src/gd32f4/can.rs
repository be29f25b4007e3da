// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CAN0 and CAN1
//!
//! CAN0 owns the filter banks; CAN1 only runs while CAN0 is clocked.

use super::gpio::{PA11, PA12, PB12, PB13, PB5, PB6, PB8, PB9, PD0, PD1, PH13, PI9};
use super::{CAN0, CAN1};
use crate::can::can_instances;
use crate::gpio::Alternate;

can_instances! {
    master: CAN0 => [
        (PA12<Alternate<9>>, PA11<Alternate<9>>),
        (PB9<Alternate<9>>, PB8<Alternate<9>>),
        (PD1<Alternate<9>>, PD0<Alternate<9>>),
        (PH13<Alternate<9>>, PI9<Alternate<9>>),
    ],
    slave: CAN1 => [
        (PB13<Alternate<9>>, PB12<Alternate<9>>),
        (PB6<Alternate<9>>, PB5<Alternate<9>>),
    ],
}
