// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Puts the memory map and the device vector names of the target chip where
//! cortex-m-rt's `link.x` finds them, and selects that chip's vector table
//!
//! The chip is picked with `M4_HAL_CHIP` (`at32f435`, `gd32f4`, `hc32f4a0`
//! or `stm32f4`, the default).

use std::env;
use std::fs;
use std::path::PathBuf;

const CHIPS: [&str; 4] = ["at32f435", "gd32f4", "hc32f4a0", "stm32f4"];

fn main() {
    let chip = env::var("M4_HAL_CHIP").unwrap_or_else(|_| "stm32f4".to_string());
    if !CHIPS.contains(&chip.as_str()) {
        panic!("M4_HAL_CHIP must be one of {:?}, got {:?}", CHIPS, chip);
    }

    let script = format!("memory/{}.x", chip);
    let out = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
    fs::copy(&script, out.join("memory.x")).unwrap_or_else(|e| panic!("{}: {}", script, e));
    println!("cargo:rustc-link-search={}", out.display());
    let values: Vec<String> = CHIPS.iter().map(|c| format!("{:?}", c)).collect();
    println!("cargo:rustc-check-cfg=cfg(m4_hal_chip, values({}))", values.join(", "));
    println!("cargo:rustc-cfg=m4_hal_chip={:?}", chip);

    let vectors = format!("device/{}.x", chip);
    if env::var_os("CARGO_FEATURE_RT").is_some() {
        fs::copy(&vectors, out.join("device.x")).unwrap_or_else(|e| panic!("{}: {}", vectors, e));
    }

    println!("cargo:rerun-if-env-changed=M4_HAL_CHIP");
    println!("cargo:rerun-if-changed={}", script);
    println!("cargo:rerun-if-changed={}", vectors);
    println!("cargo:rerun-if-changed=build.rs");
}
