use crate::strings::{build_regexp, build_string};
use crate::tokens::{tokenize, SpecialChar, Token, TokenKind, TokenizerError};
use crate::types::{IodeMap, IodeObject, IodeRegexp, Rational};
use itertools::Itertools;
use regex::Regex;
use std::fmt;
use std::io;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::slice;

#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxErrorKind {
    Tokenizer(TokenizerError),
    UnclosedList,
    UnclosedMap,
    UnexpectedClose(char),
    OddMapLiteral,
    DanglingQuote,
    UnexpectedEnd,
    InvalidNumber(String),
    InvalidRegexp(String),
    TooDeeplyNested,
}

/// Raised when the source cannot be matched by the grammar. `offset` is the
/// byte position where reading failed.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub offset: usize,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use SyntaxErrorKind::*;
        match &self.kind {
            Tokenizer(e) => return write!(f, "syntax error: {}", e),
            UnclosedList => write!(f, "syntax error: unclosed list")?,
            UnclosedMap => write!(f, "syntax error: unclosed map")?,
            UnexpectedClose(c) => write!(f, "syntax error: unexpected '{}'", c)?,
            OddMapLiteral => write!(f, "syntax error: map literal is missing a value")?,
            DanglingQuote => write!(f, "syntax error: quote is not followed by an expression")?,
            UnexpectedEnd => write!(f, "syntax error: unexpected end of input")?,
            InvalidNumber(text) => write!(f, "syntax error: invalid number {}", text)?,
            InvalidRegexp(e) => write!(f, "syntax error: invalid regexp: {}", e)?,
            TooDeeplyNested => write!(f, "syntax error: forms nested more than {} deep", MAX_NESTING)?,
        };
        write!(f, " at byte {}", self.offset)
    }
}

impl std::error::Error for SyntaxError {}

impl From<TokenizerError> for SyntaxError {
    fn from(e: TokenizerError) -> Self {
        let offset = match e {
            TokenizerError::UnbalancedString(at) | TokenizerError::UnexpectedCharacter(_, at) => at,
        };
        SyntaxError {
            kind: SyntaxErrorKind::Tokenizer(e),
            offset,
        }
    }
}

pub type Result<T = IodeObject> = std::result::Result<T, SyntaxError>;

/// Supplies source text for `read_file`. The reader itself never touches the
/// filesystem.
pub trait SourceLoader {
    fn load(&self, path: &Path) -> io::Result<String>;
}

pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

#[derive(Debug)]
pub enum LoadError {
    Io(PathBuf, io::Error),
    Syntax(PathBuf, SyntaxError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(path, e) => write!(f, "cannot load {}: {}", path.display(), e),
            LoadError::Syntax(path, e) => write!(f, "in {}: {}", path.display(), e),
        }
    }
}

impl std::error::Error for LoadError {}

/// Reading recurses once per level of nesting, so deeper input is refused.
const MAX_NESTING: usize = 512;

struct Reader<'a> {
    tokens: Peekable<slice::Iter<'a, Token<'a>>>,
    end: usize,
    depth: usize,
}

impl Reader<'_> {
    fn error(&self, kind: SyntaxErrorKind, offset: usize) -> SyntaxError {
        SyntaxError { kind, offset }
    }
}

lazy_static! {
    static ref RATIONAL_RE: Regex = Regex::new(r"^[0-9]+/[0-9]+$").unwrap();
    static ref FLOAT_RE: Regex = Regex::new(r"^[0-9]+\.[0-9]+$").unwrap();
    static ref INTEGER_RE: Regex = Regex::new(r"^[0-9]+$").unwrap();
}

/// Reads a whole program. Several top-level forms are wrapped in `progn`,
/// a single form is returned as is and an empty program reads as `nil`.
pub fn read_str(input: &str) -> Result {
    let tokens = tokenize(input)?;
    let mut reader = Reader {
        tokens: tokens.iter().peekable(),
        end: input.len(),
        depth: 0,
    };
    let mut forms = Vec::new();
    while reader.tokens.peek().is_some() {
        forms.push(read_form(&mut reader)?);
    }
    log::trace!("read {} top-level forms", forms.len());
    match forms.len() {
        0 => Ok(IodeObject::Nil),
        1 => Ok(forms.remove(0)),
        _ => {
            forms.insert(0, IodeObject::new_symbol("progn"));
            Ok(IodeObject::wrap_list(forms))
        }
    }
}

pub fn read_file(path: &Path, loader: &dyn SourceLoader) -> std::result::Result<IodeObject, LoadError> {
    let source = loader
        .load(path)
        .map_err(|e| LoadError::Io(path.to_owned(), e))?;
    read_str(&source).map_err(|e| LoadError::Syntax(path.to_owned(), e))
}

fn read_form(reader: &mut Reader) -> Result {
    if reader.depth == MAX_NESTING {
        let offset = reader.tokens.peek().map_or(reader.end, |t| t.offset);
        return Err(reader.error(SyntaxErrorKind::TooDeeplyNested, offset));
    }
    reader.depth += 1;
    let form = read_nested_form(reader);
    reader.depth -= 1;
    form
}

fn read_nested_form(reader: &mut Reader) -> Result {
    use SpecialChar::*;
    let token = match reader.tokens.next() {
        Some(token) => token,
        None => return Err(reader.error(SyntaxErrorKind::UnexpectedEnd, reader.end)),
    };
    match &token.kind {
        TokenKind::SpecialChar(OpenRoundBracket) => {
            read_sequence(reader, CloseRoundBracket, token.offset).map(IodeObject::wrap_list)
        }
        TokenKind::SpecialChar(OpenBraceBracket) => {
            let elements = read_sequence(reader, CloseBraceBracket, token.offset)?;
            build_map(elements).ok_or_else(|| reader.error(SyntaxErrorKind::OddMapLiteral, token.offset))
        }
        TokenKind::SpecialChar(c @ CloseRoundBracket) | TokenKind::SpecialChar(c @ CloseBraceBracket) => {
            Err(reader.error(SyntaxErrorKind::UnexpectedClose(c.as_char()), token.offset))
        }
        TokenKind::SpecialChar(Quote) => {
            if reader.tokens.peek().is_none() {
                return Err(reader.error(SyntaxErrorKind::DanglingQuote, token.offset));
            }
            let quoted = read_form(reader)?;
            Ok(IodeObject::wrap_list(vec![
                IodeObject::new_symbol("quote"),
                quoted,
            ]))
        }
        TokenKind::StringLiteral(payload) => Ok(IodeObject::String(build_string(payload))),
        TokenKind::RegexpLiteral(payload) => IodeRegexp::new(build_regexp(payload))
            .map(|r| IodeObject::Regexp(Rc::new(r)))
            .map_err(|e| reader.error(SyntaxErrorKind::InvalidRegexp(e.to_string()), token.offset)),
        TokenKind::PlainChars(chars) => read_atom(chars)
            .ok_or_else(|| reader.error(SyntaxErrorKind::InvalidNumber(chars.to_string()), token.offset)),
    }
}

fn read_sequence(reader: &mut Reader, close: SpecialChar, open_offset: usize) -> Result<Vec<IodeObject>> {
    let mut elements = Vec::new();
    loop {
        match reader.tokens.peek() {
            Some(Token {
                kind: TokenKind::SpecialChar(c),
                ..
            }) if *c == close => {
                reader.tokens.next();
                return Ok(elements);
            }
            Some(_) => elements.push(read_form(reader)?),
            None => {
                let kind = match close {
                    SpecialChar::CloseBraceBracket => SyntaxErrorKind::UnclosedMap,
                    _ => SyntaxErrorKind::UnclosedList,
                };
                return Err(reader.error(kind, open_offset));
            }
        }
    }
}

fn build_map(elements: Vec<IodeObject>) -> Option<IodeObject> {
    if elements.len() % 2 == 1 {
        return None;
    }
    let pairs = elements.into_iter().tuples().collect();
    Some(IodeObject::wrap_map(IodeMap(pairs)))
}

/// `None` means the text looked like a number but does not denote one.
fn read_atom(chars: &str) -> Option<IodeObject> {
    if RATIONAL_RE.is_match(chars) {
        let (numer, denom) = chars.split_at(chars.find('/')?);
        let numer = numer.parse().ok()?;
        let denom = denom[1..].parse().ok()?;
        return Rational::new(numer, denom).map(IodeObject::Rational);
    }
    if FLOAT_RE.is_match(chars) {
        return chars.parse().ok().map(IodeObject::Float);
    }
    if INTEGER_RE.is_match(chars) {
        return chars.parse().ok().map(IodeObject::Integer);
    }
    let atom = match chars {
        "nil" => IodeObject::Nil,
        "true" => IodeObject::Bool(true),
        "false" => IodeObject::Bool(false),
        _ => IodeObject::new_symbol(chars),
    };
    Some(atom)
}
