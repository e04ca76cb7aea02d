use std::fmt::Write as _;
use std::io;

use colored::Colorize;

use crate::{
    runtime::Machine,
    symbol::{Opcode, Register},
};

/// Render occupied memory (ascending address) and all registers, each value in binary padded to
/// the word width.
pub fn render_state(machine: &Machine) -> String {
    let width = machine.width();
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "---MEMORY-BEGIN---");
    for (addr, value) in machine.memory() {
        let _ = writeln!(out, "{} | {}", addr, width.binary(value));
    }
    let _ = writeln!(out, "----MEMORY-END----");

    let _ = writeln!(out, "--REGISTER-BEGIN--");
    for reg in Register::ALL {
        let _ = writeln!(
            out,
            "{:>3}: {}",
            reg.name(),
            width.binary(machine.register(reg))
        );
    }
    let flags = machine.flags();
    let _ = writeln!(
        out,
        " SR: C={} N={} O={} Z={}",
        flags.carry as u8, flags.negative as u8, flags.overflow as u8, flags.zero as u8
    );
    let _ = writeln!(out, "---REGISTER-END---");
    out
}

/// Write the state dump with section markers dimmed.
pub fn print_state(machine: &Machine, sink: &mut dyn io::Write) -> io::Result<()> {
    for line in render_state(machine).lines() {
        if line.starts_with('-') {
            writeln!(sink, "{}", line.dimmed())?;
        } else {
            writeln!(sink, "{line}")?;
        }
    }
    writeln!(sink)
}

/// Describe the instruction about to execute.
pub fn print_decoded(
    machine: &Machine,
    address: u64,
    opcode: u64,
    operand: u64,
    sink: &mut dyn io::Write,
) -> io::Result<()> {
    let name = u8::try_from(opcode)
        .ok()
        .and_then(|code| Opcode::try_from(code).ok())
        .map_or("UNKNOWN", |op| op.mnemonic());
    writeln!(sink, "Fetching instruction at address {}", address)?;
    writeln!(
        sink,
        "Decoded: [OPCODE:{}({:08b}), OPERAND:{}]",
        name.cyan(),
        opcode,
        machine.width().binary(operand)
    )
}
