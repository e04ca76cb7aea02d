use lazy_static::lazy_static;
use regex::Regex;

use crate::lexer::cursor::Cursor;

pub mod cursor;

lazy_static! {
    /// Label declarations are letters only, followed by a colon.
    static ref LABEL_DECL: Regex = Regex::new(r"^[A-Za-z]+:$").expect("label pattern is valid");
    static ref BINARY_LIT: Regex = Regex::new(r"^B[01]+$").expect("binary pattern is valid");
}

/// Fields kept per line: label, mnemonic, operand.
pub const FIELDS: usize = 3;

/// A 'light' token that only carries basic and easily derivable info
#[derive(Debug)]
pub struct LToken {
    pub kind: LTokenKind,
    pub len: usize,
}

impl LToken {
    pub fn new(kind: LTokenKind, len: usize) -> Self {
        LToken { kind, len }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LTokenKind {
    /// Any run of non-whitespace characters
    Word,
    /// Runs to end of line
    Comment,
    Whitespace,
    Eof,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LiteralKind {
    /// `#` prefix
    Dec,
    /// `&` prefix
    Hex,
    /// `B` prefix
    Bin,
}

/// Single source line after comments and excess whitespace are removed.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Line<'a> {
    /// 1-based line number in the source
    pub number: usize,
    /// Exactly three fields, padded with empty strings
    pub fields: [&'a str; FIELDS],
    /// Byte offset of each field in the source. Padding sits at the end of the last word.
    pub offsets: [usize; FIELDS],
}

pub fn tokenize(input: &str) -> impl Iterator<Item = LToken> + '_ {
    let mut cursor = Cursor::new(input);
    std::iter::from_fn(move || {
        let token = cursor.advance_token();
        if token.kind != LTokenKind::Eof {
            Some(token)
        } else {
            None
        }
    })
}

/// Test if a character is considered to be whitespace.
pub(crate) fn is_whitespace(c: char) -> bool {
    c.is_whitespace()
}

impl Cursor<'_> {
    pub fn advance_token(&mut self) -> LToken {
        let first_char = match self.bump() {
            Some(c) => c,
            None => return LToken::new(LTokenKind::Eof, 0),
        };
        let token_kind = match first_char {
            ';' => {
                self.take_while(|c| c != '\n');
                LTokenKind::Comment
            }
            c if is_whitespace(c) => {
                self.take_while(is_whitespace);
                LTokenKind::Whitespace
            }
            _ => {
                self.take_while(|c| !is_whitespace(c) && c != ';');
                LTokenKind::Word
            }
        };
        let res = LToken::new(token_kind, self.pos_in_token());
        self.reset_pos();
        res
    }
}

/// Words of a line up to the first comment, with their byte offsets in the line.
pub fn spanned_words(line: &str) -> Vec<(usize, &str)> {
    let mut offs = 0;
    let mut words = Vec::new();
    for tok in tokenize(line) {
        match tok.kind {
            LTokenKind::Word => words.push((offs, &line[offs..offs + tok.len])),
            LTokenKind::Comment => break,
            LTokenKind::Whitespace | LTokenKind::Eof => (),
        }
        offs += tok.len;
    }
    words
}

/// Split source into non-empty lines of exactly three fields.
///
/// Extra words past the third are dropped. Lines holding only a comment are skipped.
pub fn preprocess(src: &str) -> Vec<Line<'_>> {
    let mut line_start = 0;
    src.split_inclusive('\n')
        .enumerate()
        .filter_map(|(i, raw)| {
            let start = line_start;
            line_start += raw.len();
            let words = spanned_words(raw);
            let (last_offs, last) = *words.last()?;
            let mut fields = [""; FIELDS];
            let mut offsets = [start + last_offs + last.len(); FIELDS];
            for ((field, offset), (offs, word)) in
                fields.iter_mut().zip(offsets.iter_mut()).zip(words)
            {
                *field = word;
                *offset = start + offs;
            }
            Some(Line {
                number: i + 1,
                fields,
                offsets,
            })
        })
        .collect()
}

pub fn is_label_decl(token: &str) -> bool {
    LABEL_DECL.is_match(token)
}

/// Work out which literal prefix a token carries, if any.
///
/// A leading `B` only counts when followed by binary digits, so labels may still start with `B`.
pub fn literal_kind(token: &str) -> Option<LiteralKind> {
    match token.chars().next()? {
        '#' => Some(LiteralKind::Dec),
        '&' => Some(LiteralKind::Hex),
        'B' if BINARY_LIT.is_match(token) => Some(LiteralKind::Bin),
        _ => None,
    }
}

/// Parse a prefixed literal. Returns `None` if the token is not a literal at all, and
/// `Some(None)` if it is a malformed one.
///
/// Negative decimals are kept in two's complement and narrowed when loaded. A `+` sign is
/// never accepted.
pub fn parse_literal(token: &str) -> Option<Option<u64>> {
    let kind = literal_kind(token)?;
    let digits = &token[1..];
    if digits.starts_with('+') {
        return Some(None);
    }
    Some(match kind {
        LiteralKind::Dec => digits.parse::<i64>().ok().map(|val| val as u64),
        LiteralKind::Hex => u64::from_str_radix(digits, 16).ok(),
        LiteralKind::Bin => u64::from_str_radix(digits, 2).ok(),
    })
}
