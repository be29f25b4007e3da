// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `print!`/`println!` over a serial port
//!
//! ```rust,ignore
//! let (tx, _rx) = serial.split();
//! let tx = cortex_m::singleton!(: Tx<USART2> = tx).unwrap();
//! console::install(tx);
//! m4_hal::println!("sysclk = {} Hz", clocks.sysclk().0);
//! ```

use core::cell::RefCell;
use core::fmt::{self, Write};

use cortex_m::interrupt::{self, Mutex};

type Sink = &'static mut (dyn Write + Send);

static CONSOLE: Mutex<RefCell<Option<Sink>>> = Mutex::new(RefCell::new(None));

/// Adapter that writes `\r\n` for every `\n`
pub struct CrLf<W>(pub W);

impl<W: Write> Write for CrLf<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut lines = s.split('\n');
        if let Some(first) = lines.next() {
            self.0.write_str(first)?;
        }
        for line in lines {
            self.0.write_str("\r\n")?;
            self.0.write_str(line)?;
        }
        Ok(())
    }
}

/// Routes console output to `sink`, returning the previous sink
pub fn install(sink: Sink) -> Option<Sink> {
    interrupt::free(|cs| CONSOLE.borrow(cs).replace(Some(sink)))
}

/// Detaches and returns the current sink
pub fn uninstall() -> Option<Sink> {
    interrupt::free(|cs| CONSOLE.borrow(cs).replace(None))
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    interrupt::free(|cs| {
        if let Some(sink) = CONSOLE.borrow(cs).borrow_mut().as_mut() {
            // output is best effort, as with a disconnected terminal
            CrLf(&mut **sink).write_fmt(args).ok();
        }
    })
}

/// Prints to the console
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        $crate::bsp::console::_print(core::format_args!($($arg)*))
    };
}

/// Prints to the console, with a newline
#[macro_export]
macro_rules! println {
    () => {
        $crate::print!("\n")
    };
    ($($arg:tt)*) => {
        $crate::bsp::console::_print(core::format_args!("{}\n", core::format_args!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate(s: &str) -> String {
        let mut out = CrLf(String::new());
        out.write_str(s).unwrap();
        out.0
    }

    #[test]
    fn newlines_become_crlf() {
        assert_eq!(translate("hello\n"), "hello\r\n");
        assert_eq!(translate("a\nb\n\nc"), "a\r\nb\r\n\r\nc");
        assert_eq!(translate("no newline"), "no newline");
        assert_eq!(translate(""), "");
    }

    #[test]
    fn formatted_output_is_translated() {
        let mut out = CrLf(String::new());
        write!(out, "{}\n{}", 1, 2).unwrap();
        assert_eq!(out.0, "1\r\n2");
    }
}
