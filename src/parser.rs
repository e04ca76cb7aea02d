use crate::{
    air::{Air, AirStmt, LabelTable, Operand},
    lexer::{is_label_decl, literal_kind, parse_literal, preprocess, Line},
    symbol::Register,
};

/// Mnemonics which expand to an `_IMMEDIATE` or `_ADDRESS` form depending on their operand.
const ABBREVIATED: [&str; 3] = ["ADD", "SUB", "CMP"];

/// Bind every label declaration to the index of the line it starts.
///
/// Every preprocessed line becomes one instruction, so the line index is the instruction index.
pub fn extract_labels(lines: &[Line]) -> LabelTable {
    let mut labels = LabelTable::new();
    for (idx, line) in lines.iter().enumerate() {
        let first = line.fields[0];
        if is_label_decl(first) {
            labels.insert(strip_colon(first), idx);
        }
    }
    labels
}

fn strip_colon(decl: &str) -> &str {
    decl.strip_suffix(':').unwrap_or(decl)
}

/// Expand `ADD`/`SUB`/`CMP` based on whether the operand is a literal value.
pub fn resolve_mnemonic(mnemonic: &str, operand: &str) -> String {
    let upper = mnemonic.to_ascii_uppercase();
    if !ABBREVIATED.contains(&upper.as_str()) {
        return mnemonic.to_string();
    }
    let suffix = if literal_kind(operand).is_some() {
        "IMMEDIATE"
    } else {
        "ADDRESS"
    };
    format!("{upper}_{suffix}")
}

/// Classify an operand token. An empty operand is zero.
pub fn parse_operand(token: &str) -> Operand {
    if token.is_empty() {
        return Operand::Value(0);
    }
    match parse_literal(token) {
        Some(Some(val)) => Operand::Value(val),
        Some(None) => Operand::Malformed(token.to_string()),
        None => match token.parse::<Register>() {
            Ok(reg) => Operand::Value(reg.index() as u64),
            Err(()) => Operand::Label(token.to_string()),
        },
    }
}

/// Build one statement from a preprocessed line.
pub fn parse_line(line: &Line) -> AirStmt {
    let [first, second, third] = line.fields;
    // Unlabelled lines shift right, leaving an empty label
    let (label, mnemonic, operand, offset) = if is_label_decl(first) {
        (Some(strip_colon(first).to_string()), second, third, line.offsets[2])
    } else {
        (None, first, second, line.offsets[1])
    };
    AirStmt {
        label,
        mnemonic: resolve_mnemonic(mnemonic, operand),
        operand: parse_operand(operand),
        line: line.number,
        span: (offset, operand.len()).into(),
    }
}

/// Transforms source text into AIR
pub struct AsmParser<'a> {
    lines: Vec<Line<'a>>,
}

impl<'a> AsmParser<'a> {
    pub fn new(src: &'a str) -> Self {
        AsmParser {
            lines: preprocess(src),
        }
    }

    pub fn lines(&self) -> &[Line<'a>] {
        &self.lines
    }

    /// Create AIR out of the preprocessed lines. Labels are left unresolved until linking.
    pub fn parse(self) -> Air {
        let mut air = Air::new(extract_labels(&self.lines));
        for line in &self.lines {
            air.add_stmt(parse_line(line));
        }
        air
    }
}
