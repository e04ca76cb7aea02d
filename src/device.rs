use std::io::{self, stdin, BufRead, IsTerminal, Write};

use colored::Colorize;
use console::Term;

use crate::{error::DeviceError, word::Width};

/// Supplies a word each time `IN` executes.
///
/// The machine waits on `read_word` and makes no progress until it returns.
pub trait InputDevice {
    fn read_word(&mut self) -> Result<u64, DeviceError>;
}

/// Accepts the value of `ACC` each time `OUT` executes.
pub trait OutputDevice {
    fn write_word(&mut self, value: u64) -> Result<(), DeviceError>;
}

impl<F> InputDevice for F
where
    F: FnMut() -> Result<u64, DeviceError>,
{
    fn read_word(&mut self) -> Result<u64, DeviceError> {
        self()
    }
}

impl<F> OutputDevice for F
where
    F: FnMut(u64) -> Result<(), DeviceError>,
{
    fn write_word(&mut self, value: u64) -> Result<(), DeviceError> {
        self(value)
    }
}

/// Reads one integer per line from stdin, or from the terminal when interactive.
pub struct StdinInput;

impl StdinInput {
    fn read_line() -> io::Result<String> {
        if stdin().is_terminal() {
            let term = Term::stderr();
            term.write_str(&format!("{:>12} ", "Input".cyan()))?;
            term.read_line()
        } else {
            let mut line = String::new();
            stdin().lock().read_line(&mut line)?;
            Ok(line)
        }
    }
}

impl InputDevice for StdinInput {
    fn read_word(&mut self) -> Result<u64, DeviceError> {
        let line = Self::read_line().map_err(|e| DeviceError(e.to_string()))?;
        let line = line.trim();
        if line.is_empty() {
            return Err(DeviceError("no input available".into()));
        }
        parse_input(line).ok_or_else(|| DeviceError(format!("`{line}` is not a number")))
    }
}

/// Accepts decimal, `0x` hex or `0b` binary, optionally negative.
fn parse_input(text: &str) -> Option<u64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = if let Some(hex) = digits.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = digits.strip_prefix("0b") {
        u64::from_str_radix(bin, 2).ok()?
    } else {
        digits.parse::<u64>().ok()?
    };
    Some(if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    })
}

/// Prints each value as hex, decimal, binary and character.
pub struct ConsoleOutput<W: Write> {
    width: Width,
    sink: W,
}

impl ConsoleOutput<io::Stdout> {
    pub fn stdout(width: Width) -> Self {
        ConsoleOutput {
            width,
            sink: io::stdout(),
        }
    }
}

impl<W: Write> ConsoleOutput<W> {
    pub fn new(width: Width, sink: W) -> Self {
        ConsoleOutput { width, sink }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    pub fn format(&self, value: u64) -> String {
        let hex_digits = self.width.bits().div_ceil(4) as usize;
        let chr = u8::try_from(value).map(char::from).unwrap_or('\u{FFFD}');
        format!(
            "(0x{:0hex_digits$x}, {}, 0b{}, CHAR: {:?})",
            value,
            value,
            self.width.binary(value),
            chr,
        )
    }
}

impl<W: Write> OutputDevice for ConsoleOutput<W> {
    fn write_word(&mut self, value: u64) -> Result<(), DeviceError> {
        let line = self.format(value);
        writeln!(self.sink, "{line}")
            .and_then(|_| self.sink.flush())
            .map_err(|e| DeviceError(e.to_string()))
    }
}
