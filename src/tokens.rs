use regex::Regex;
use std::fmt;

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum SpecialChar {
    OpenRoundBracket,
    CloseRoundBracket,
    OpenBraceBracket,
    CloseBraceBracket,
    Quote,
}

impl SpecialChar {
    pub fn as_char(self) -> char {
        use SpecialChar::*;
        match self {
            OpenRoundBracket => '(',
            CloseRoundBracket => ')',
            OpenBraceBracket => '{',
            CloseBraceBracket => '}',
            Quote => '\'',
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum TokenKind<'a> {
    SpecialChar(SpecialChar),
    /// Contents between the quotes, escapes still in place.
    StringLiteral(&'a str),
    /// Contents between the slashes, escapes still in place.
    RegexpLiteral(&'a str),
    PlainChars(&'a str),
}

#[derive(Debug, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    /// Byte offset of the token's first character.
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenizerError {
    UnbalancedString(usize),
    UnexpectedCharacter(char, usize),
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizerError::UnbalancedString(at) => {
                write!(f, "unterminated string literal starting at byte {}", at)
            }
            TokenizerError::UnexpectedCharacter(c, at) => {
                write!(f, "unexpected character {:?} at byte {}", c, at)
            }
        }
    }
}

lazy_static! {
    static ref SKIP_RE: Regex = Regex::new(
        r#"(?x)
            ^(?:
                [\s,]                        # whitespace or commas, ignored
                |;[^\n]*                     # comments
            )*
        "#
    )
    .unwrap();
    static ref STRING_RE: Regex = Regex::new(
        r#"(?xs)
            ^"(?:                            # string literal. its contents include:
                \\.                          #    escapes
                |[^\\"]                      #    anything which isn't a backslash or a quote
            )*"
        "#
    )
    .unwrap();
    static ref REGEXP_RE: Regex = Regex::new(
        r#"(?xs)
            ^/(?:                            # regexp literal, same shape as a string
                \\.
                |[^\\/]
            )*/
        "#
    )
    .unwrap();
    static ref PLAIN_RE: Regex = Regex::new(
        r#"(?x)
            ^(?:
                &                            # the variadic marker is always a token alone
                |[^\s(){},;'"`]+             # one or more plain characters
            )
        "#
    )
    .unwrap();
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || "(){},;'\"`".contains(c)
}

/// A slash is either the start of a regexp literal or part of a symbol such as
/// `/` or `/=`. When both readings are possible the longer one wins, and a tie
/// goes to the regexp. Without a closing slash only the symbol is possible.
fn tokenize_slash(rest: &str) -> (TokenKind, usize) {
    let plain = PLAIN_RE.find(rest).map_or(1, |m| m.end());
    let opens_regexp = rest[1..]
        .chars()
        .next()
        .map_or(false, |c| !is_delimiter(c));
    match REGEXP_RE.find(rest) {
        Some(m) if opens_regexp && m.end() >= plain => {
            (TokenKind::RegexpLiteral(&rest[1..m.end() - 1]), m.end())
        }
        _ => (TokenKind::PlainChars(&rest[..plain]), plain),
    }
}

fn create_token(rest: &str, offset: usize) -> Result<(TokenKind, usize), TokenizerError> {
    use SpecialChar::*;
    match rest.as_bytes()[0] {
        b'(' => Ok((TokenKind::SpecialChar(OpenRoundBracket), 1)),
        b')' => Ok((TokenKind::SpecialChar(CloseRoundBracket), 1)),
        b'{' => Ok((TokenKind::SpecialChar(OpenBraceBracket), 1)),
        b'}' => Ok((TokenKind::SpecialChar(CloseBraceBracket), 1)),
        b'\'' => Ok((TokenKind::SpecialChar(Quote), 1)),
        b'"' => STRING_RE
            .find(rest)
            .map(|m| (TokenKind::StringLiteral(&rest[1..m.end() - 1]), m.end()))
            .ok_or(TokenizerError::UnbalancedString(offset)),
        b'/' => Ok(tokenize_slash(rest)),
        _ => match PLAIN_RE.find(rest) {
            Some(m) => Ok((TokenKind::PlainChars(m.as_str()), m.end())),
            None => {
                let c = rest.chars().next().unwrap_or_default();
                Err(TokenizerError::UnexpectedCharacter(c, offset))
            }
        },
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, TokenizerError> {
    let mut tokens = Vec::new();
    let mut offset = 0;
    loop {
        offset += SKIP_RE.find(&input[offset..]).map_or(0, |m| m.end());
        let rest = &input[offset..];
        if rest.is_empty() {
            break;
        }
        let (kind, length) = create_token(rest, offset)?;
        tokens.push(Token { kind, offset });
        offset += length;
    }
    Ok(tokens)
}
