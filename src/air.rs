use miette::SourceSpan;

use crate::{
    error::AsmError,
    program::{Instruction, Program, WORDS_PER_INSTRUCTION},
    symbol::{FxMap, Opcode},
};

/// Label names mapped to the index of the instruction they mark, in declaration order.
#[derive(Clone, Default, Debug)]
pub struct LabelTable {
    labels: FxMap<String, usize>,
}

impl LabelTable {
    pub fn new() -> Self {
        LabelTable::default()
    }

    /// Bind `name` to `index`. A repeated label keeps its first binding.
    pub fn insert(&mut self, name: &str, index: usize) {
        self.labels.entry(name.to_string()).or_insert(index);
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels.iter().map(|(name, idx)| (name.as_str(), *idx))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Operand as written in source, before linking.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Operand {
    /// Literal or register index
    Value(u64),
    /// Reference to a label, resolved during linking
    Label(String),
    /// Looked like a literal but could not be parsed
    Malformed(String),
}

/// Single statement with its mnemonic already expanded (eg. `ADD` to `ADD_IMMEDIATE`).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AirStmt {
    pub label: Option<String>,
    pub mnemonic: String,
    pub operand: Operand,
    /// Source line, for diagnostics
    pub line: usize,
    /// Operand position in the source, for diagnostics
    pub span: SourceSpan,
}

/// Assembly intermediate representation, contains the label table and list of statements
#[derive(Debug)]
pub struct Air {
    labels: LabelTable,
    ast: Vec<AirStmt>,
}

impl Air {
    pub fn new(labels: LabelTable) -> Self {
        Air {
            labels,
            ast: Vec::new(),
        }
    }

    pub fn add_stmt(&mut self, stmt: AirStmt) {
        self.ast.push(stmt)
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn get(&self, idx: usize) -> &AirStmt {
        &self.ast[idx]
    }

    pub fn len(&self) -> usize {
        self.ast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ast.is_empty()
    }

    /// Resolve mnemonics and label references into instruction words.
    ///
    /// Labels resolve to the address of the first cell of the instruction they mark. A line
    /// holding only a label becomes a no-op, so it falls through to the next instruction.
    pub fn link(&self) -> Result<Program, AsmError> {
        self.ast
            .iter()
            .map(|stmt| {
                let operand = match &stmt.operand {
                    Operand::Value(val) => *val,
                    Operand::Label(name) => match self.labels.get(name) {
                        Some(idx) => (idx * WORDS_PER_INSTRUCTION) as u64,
                        None => {
                            return Err(AsmError::UnresolvedLabel {
                                label: name.clone(),
                                line: stmt.line,
                                span: stmt.span,
                            })
                        }
                    },
                    Operand::Malformed(raw) => {
                        return Err(AsmError::InvalidOperand {
                            operand: raw.clone(),
                            line: stmt.line,
                            span: stmt.span,
                        })
                    }
                };
                let opcode = if stmt.mnemonic.is_empty() {
                    Opcode::Nop.code()
                } else {
                    Opcode::encode(&stmt.mnemonic)
                };
                if opcode == Opcode::INVALID {
                    log::debug!("line {}: unknown mnemonic `{}`", stmt.line, stmt.mnemonic);
                }
                Ok(Instruction::new(opcode, operand))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Program::from)
    }
}

impl<'a> IntoIterator for &'a Air {
    type Item = &'a AirStmt;
    type IntoIter = std::slice::Iter<'a, AirStmt>;

    fn into_iter(self) -> Self::IntoIter {
        self.ast.iter()
    }
}
