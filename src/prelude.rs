// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

pub use crate::at32f435::crm::CrmExt as _m4_hal_at32f435_crm_CrmExt;
pub use crate::at32f435::exint::ScfgExt as _m4_hal_at32f435_exint_ScfgExt;
pub use crate::gd32f4::exti::SysCfgExt as _m4_hal_gd32f4_exti_SysCfgExt;
pub use crate::gd32f4::rcu::RcuExt as _m4_hal_gd32f4_rcu_RcuExt;
pub use crate::gpio::GpioExt as _m4_hal_gpio_GpioExt;
pub use crate::hc32f4a0::cmu::CmuExt as _m4_hal_hc32f4a0_cmu_CmuExt;
pub use crate::stm32f4::exti::SysCfgExt as _m4_hal_stm32f4_exti_SysCfgExt;
pub use crate::stm32f4::rcc::RccExt as _m4_hal_stm32f4_rcc_RccExt;
pub use crate::time::U32Ext as _m4_hal_time_U32Ext;
pub use embedded_hal::prelude::*;
