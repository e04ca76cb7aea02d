// Parsing
mod lexer;
mod parser;
pub use parser::{extract_labels, parse_line, AsmParser};
mod air;
pub use air::{Air, AirStmt, LabelTable, Operand};
mod program;
pub use program::{Instruction, Program, WORDS_PER_INSTRUCTION};

// Running
mod runtime;
pub use runtime::{Flags, Machine, RunSummary};
pub mod device;
mod output;
pub use output::render_state;

mod symbol;
pub use symbol::{Opcode, OpcodeGroup, Register};
mod word;
pub use word::Width;

pub mod config;
pub use config::MachineConfig;
mod error;
pub use error::{AsmError, DeviceError, ImageError, MachineError};

pub use lexer::{preprocess, Line};

/// Assemble source text into linked instruction words.
pub fn assemble(src: &str) -> Result<Program, AsmError> {
    let air = AsmParser::new(src).parse();
    air.link()
}
