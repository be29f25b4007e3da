// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CAN1 (filter master) and CAN2 pin routing

use super::gpio::{PA11, PA12, PB12, PB13, PB5, PB6, PB8, PB9, PD0, PD1};
use super::{CAN1, CAN2};
use crate::can::can_instances;
use crate::gpio::Alternate;

can_instances! {
    master: CAN1 => [
        (PA12<Alternate<9>>, PA11<Alternate<9>>),
        (PB9<Alternate<9>>, PB8<Alternate<9>>),
        (PD1<Alternate<9>>, PD0<Alternate<9>>),
    ],
    slave: CAN2 => [
        (PB13<Alternate<9>>, PB12<Alternate<9>>),
        (PB6<Alternate<9>>, PB5<Alternate<9>>),
    ],
}
