use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

// Assembler errors

/// Failure while turning source text into linked instruction words.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum AsmError {
    #[error("Label `{label}` not found (line {line})")]
    #[diagnostic(
        code(link::label_not_found),
        help("labels are declared as `name:` at the start of a line, using letters only")
    )]
    UnresolvedLabel {
        label: String,
        line: usize,
        #[label("undeclared label")]
        span: SourceSpan,
    },

    #[error("Invalid operand `{operand}` (line {line})")]
    #[diagnostic(
        code(link::invalid_operand),
        help("operands are `#<decimal>`, `&<hex>`, `B<binary>`, a register name, or a label")
    )]
    InvalidOperand {
        operand: String,
        line: usize,
        #[label("malformed literal")]
        span: SourceSpan,
    },
}

// Runtime errors

/// Failure while configuring or running a machine.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum MachineError {
    #[error("Word width of {width} bits is not supported")]
    #[diagnostic(
        code(machine::config),
        help("word width must be between 8 and 64 bits")
    )]
    Configuration { width: u32 },

    #[error("Program of {instructions} instructions does not fit in {width}-bit addresses")]
    #[diagnostic(
        code(machine::program_size),
        help("use a wider word, or split the program")
    )]
    ProgramTooLarge { instructions: usize, width: u32 },

    #[error("No input device")]
    #[diagnostic(
        code(machine::no_input),
        help("attach an input device before running programs that use `IN`")
    )]
    MissingDevice,

    #[error("Invalid instruction opcode: {opcode:#04x}")]
    #[diagnostic(code(machine::invalid_opcode))]
    InvalidOpcode { opcode: u64 },

    #[error("Operand {index} does not name a register")]
    #[diagnostic(
        code(machine::invalid_register),
        help("registers are numbered ACC=0, IX=1, CIR=2, MAR=3, MDR=4, PC=5")
    )]
    InvalidRegister { index: u64 },

    #[error("Device failed: {0}")]
    #[diagnostic(code(machine::device))]
    Device(String),
}

/// Failure reported by an attached device.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct DeviceError(pub String);

impl From<DeviceError> for MachineError {
    fn from(value: DeviceError) -> Self {
        MachineError::Device(value.0)
    }
}

// Program image errors

/// Failure while decoding a binary program image.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ImageError {
    #[error("Program image is empty")]
    #[diagnostic(code(image::empty))]
    Empty,

    #[error("Program image declares an unsupported word width of {0} bits")]
    #[diagnostic(code(image::width), help("images must be produced by `accum compile`"))]
    Width(u32),

    #[error("Program image is truncated: {0} trailing bytes do not form an instruction")]
    #[diagnostic(code(image::truncated))]
    Truncated(usize),
}
