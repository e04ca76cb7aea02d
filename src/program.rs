use std::fmt::{self, Write as _};

use crate::{
    error::ImageError,
    symbol::Opcode,
    word::Width,
};

/// Memory cells taken by one instruction: opcode, then operand.
pub const WORDS_PER_INSTRUCTION: usize = 2;

/// Linked instruction word.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Instruction {
    pub opcode: u8,
    pub operand: u64,
}

impl Instruction {
    pub fn new(opcode: u8, operand: u64) -> Self {
        Instruction { opcode, operand }
    }

    /// Shorthand for hand-built programs.
    pub fn op(opcode: Opcode, operand: u64) -> Self {
        Instruction::new(opcode.code(), operand)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Opcode::try_from(self.opcode) {
            Ok(op) => write!(f, "{:<13} {}", op.mnemonic(), self.operand),
            Err(code) => write!(f, "{:<13} {}", format!("??({code:#04x})"), self.operand),
        }
    }
}

/// Ordered list of instructions, as produced by the assembler and consumed by the machine.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Program { instructions }
    }
}

impl Program {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Encode as a binary image.
    ///
    /// Byte 0 holds the word width. Each instruction follows as one opcode byte and a big-endian
    /// operand, narrowed to the width.
    pub fn to_image(&self, width: Width) -> Vec<u8> {
        let operand_bytes = width.bytes();
        let mut image = Vec::with_capacity(1 + self.len() * (1 + operand_bytes));
        image.push(width.bits() as u8);
        for instr in &self.instructions {
            image.push(instr.opcode);
            let operand = instr.operand & width.mask();
            image.extend_from_slice(&operand.to_be_bytes()[8 - operand_bytes..]);
        }
        image
    }

    /// Decode an image written by [`Program::to_image`], returning the program and its width.
    pub fn from_image(image: &[u8]) -> Result<(Program, Width), ImageError> {
        let (&bits, body) = image.split_first().ok_or(ImageError::Empty)?;
        let bits = bits as u32;
        let width = Width::new(bits).map_err(|_| ImageError::Width(bits))?;

        let record = 1 + width.bytes();
        let trailing = body.len() % record;
        if trailing != 0 {
            return Err(ImageError::Truncated(trailing));
        }

        let instructions = body
            .chunks_exact(record)
            .map(|chunk| {
                let operand = chunk[1..]
                    .iter()
                    .fold(0u64, |acc, byte| (acc << 8) | *byte as u64);
                Instruction::new(chunk[0], operand)
            })
            .collect::<Vec<_>>();
        Ok((Program::from(instructions), width))
    }

    /// Human-readable listing: index, address of the opcode cell, mnemonic and operand.
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for (i, instr) in self.instructions.iter().enumerate() {
            // Writing to a String cannot fail
            let _ = writeln!(out, "{:>4}  {:>5}  {}", i, i * WORDS_PER_INSTRUCTION, instr);
        }
        out
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}
