use std::{fmt, str::FromStr};

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

/// Insertion-ordered map, used for the label table.
pub type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Represents the machine registers, in bank order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Register {
    /// Accumulator
    Acc = 0,
    /// Index register
    Ix,
    /// Current instruction register
    Cir,
    /// Memory address register
    Mar,
    /// Memory data register
    Mdr,
    /// Program counter
    Pc,
}

impl Register {
    pub const ALL: [Register; 6] = [
        Register::Acc,
        Register::Ix,
        Register::Cir,
        Register::Mar,
        Register::Mdr,
        Register::Pc,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: u64) -> Option<Register> {
        Self::ALL.get(usize::try_from(index).ok()?).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Register::Acc => "ACC",
            Register::Ix => "IX",
            Register::Cir => "CIR",
            Register::Mar => "MAR",
            Register::Mdr => "MDR",
            Register::Pc => "PC",
        }
    }
}

impl FromStr for Register {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|reg| reg.name() == s).ok_or(())
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// High nibble of an opcode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OpcodeGroup {
    DataMove,
    Io,
    Arithmetic,
    Branching,
    Comparison,
}

/// Every operation the machine can decode.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Opcode {
    // Data move
    Ldm,
    Ldd,
    Ldi,
    Ldx,
    Ldr,
    Mov,
    Sto,
    /// Data-move encoding of `END`, does nothing.
    Nop,
    // IO
    In,
    Out,
    // Arithmetic
    AddAddress,
    AddImmediate,
    SubAddress,
    SubImmediate,
    Inc,
    Dec,
    // Branching
    Jmp,
    Jpe,
    Jpn,
    End,
    // Comparison
    CmpAddress,
    CmpImmediate,
    CmiAddress,
}

impl Opcode {
    /// Emitted by the linker for mnemonics that don't exist.
    pub const INVALID: u8 = 0xFF;

    pub const ALL: [Opcode; 23] = [
        Opcode::Ldm,
        Opcode::Ldd,
        Opcode::Ldi,
        Opcode::Ldx,
        Opcode::Ldr,
        Opcode::Mov,
        Opcode::Sto,
        Opcode::Nop,
        Opcode::In,
        Opcode::Out,
        Opcode::AddAddress,
        Opcode::AddImmediate,
        Opcode::SubAddress,
        Opcode::SubImmediate,
        Opcode::Inc,
        Opcode::Dec,
        Opcode::Jmp,
        Opcode::Jpe,
        Opcode::Jpn,
        Opcode::End,
        Opcode::CmpAddress,
        Opcode::CmpImmediate,
        Opcode::CmiAddress,
    ];

    pub fn code(self) -> u8 {
        match self {
            Opcode::Ldm => 0x00,
            Opcode::Ldd => 0x01,
            Opcode::Ldi => 0x02,
            Opcode::Ldx => 0x03,
            Opcode::Ldr => 0x04,
            Opcode::Mov => 0x05,
            Opcode::Sto => 0x06,
            Opcode::Nop => 0x07,
            Opcode::In => 0x10,
            Opcode::Out => 0x11,
            Opcode::AddAddress => 0x20,
            Opcode::AddImmediate => 0x21,
            Opcode::SubAddress => 0x22,
            Opcode::SubImmediate => 0x23,
            Opcode::Inc => 0x24,
            Opcode::Dec => 0x25,
            Opcode::Jmp => 0x30,
            Opcode::Jpe => 0x31,
            Opcode::Jpn => 0x32,
            Opcode::End => 0x33,
            Opcode::CmpAddress => 0x40,
            Opcode::CmpImmediate => 0x41,
            Opcode::CmiAddress => 0x42,
        }
    }

    pub fn group(self) -> OpcodeGroup {
        match self.code() >> 4 {
            0x0 => OpcodeGroup::DataMove,
            0x1 => OpcodeGroup::Io,
            0x2 => OpcodeGroup::Arithmetic,
            0x3 => OpcodeGroup::Branching,
            _ => OpcodeGroup::Comparison,
        }
    }

    /// Name as written in the mnemonic table.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Ldm => "LDM",
            Opcode::Ldd => "LDD",
            Opcode::Ldi => "LDI",
            Opcode::Ldx => "LDX",
            Opcode::Ldr => "LDR",
            Opcode::Mov => "MOV",
            Opcode::Sto => "STO",
            Opcode::Nop | Opcode::End => "END",
            Opcode::In => "IN",
            Opcode::Out => "OUT",
            Opcode::AddAddress => "ADD_ADDRESS",
            Opcode::AddImmediate => "ADD_IMMEDIATE",
            Opcode::SubAddress => "SUB_ADDRESS",
            Opcode::SubImmediate => "SUB_IMMEDIATE",
            Opcode::Inc => "INC",
            Opcode::Dec => "DEC",
            Opcode::Jmp => "JMP",
            Opcode::Jpe => "JPE",
            Opcode::Jpn => "JPN",
            Opcode::CmpAddress => "CMP_ADDRESS",
            Opcode::CmpImmediate => "CMP_IMMEDIATE",
            Opcode::CmiAddress => "CMI_ADDRESS",
        }
    }

    /// Look up a full mnemonic. `END` resolves to its branching encoding.
    pub fn from_mnemonic(name: &str) -> Option<Opcode> {
        let name = name.to_ascii_uppercase();
        if name == "END" {
            return Some(Opcode::End);
        }
        Self::ALL.into_iter().find(|op| op.mnemonic() == name)
    }

    /// Look up the binary encoding of a mnemonic, or [`Opcode::INVALID`].
    pub fn encode(name: &str) -> u8 {
        Self::from_mnemonic(name).map_or(Self::INVALID, Opcode::code)
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|op| op.code() == value)
            .ok_or(value)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
