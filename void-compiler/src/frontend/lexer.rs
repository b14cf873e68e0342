use logos::Logos;
use std::fmt;
use thiserror::Error;

/// Token kinds of the Void language.
///
/// Keywords are `#[token]` entries so they win over the identifier regex;
/// multi-character symbols win over their single-character prefixes by
/// maximal munch (`..` over `.`, `->` over `-`, `:=` over `:`, ...).
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n]+")] // Whitespace
#[logos(skip r"//[^\n]*")] // Line comments
pub enum TokenKind {
    // --- Keywords ---
    #[token("const")]
    Const,
    #[token("fn")]
    Fn,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("loop")]
    Loop,
    #[token("in")]
    In,
    #[token("do")]
    Do,
    #[token("import")]
    Import,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("nil")]
    Nil,
    #[token("void")]
    Void,
    #[token("bool")]
    Bool,
    #[token("string")]
    String,

    // --- Sized integer type keywords ---
    #[token("i8")]
    I8,
    #[token("i16")]
    I16,
    #[token("i32")]
    I32,
    #[token("i64")]
    I64,
    #[token("u8")]
    U8,
    #[token("u16")]
    U16,
    #[token("u32")]
    U32,
    #[token("u64")]
    U64,

    // --- Identifiers and literals ---
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,
    #[regex(r"[0-9]+")]
    Number,
    #[regex(r#""([^"\\]|\\.)*""#)]
    StringLiteral,

    // --- Punctuation ---
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(":=")]
    ColonEquals,
    #[token("=")]
    Equals,
    #[token("->")]
    Arrow,
    #[token(".")]
    Dot,
    #[token("..")]
    DotDot,
    #[token(".*")]
    DotStar,
    #[token("&")]
    Borrow,

    // --- Operators ---
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Asterisk,
    #[token("/")]
    Divide,
    #[token(">")]
    GreaterThan,
    #[token("<")]
    LessThan,
    #[token(">=")]
    GreaterEqual,
    #[token("<=")]
    LessEqual,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    NotEqual,

    // Produced by `tokenize` once the input is exhausted. An embedded NUL
    // byte also lexes as end-of-file, same as a C string would end.
    #[token("\0")]
    EndOfFile,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Const => "'const'",
            TokenKind::Fn => "'fn'",
            TokenKind::Return => "'return'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::And => "'and'",
            TokenKind::Or => "'or'",
            TokenKind::Not => "'not'",
            TokenKind::Loop => "'loop'",
            TokenKind::In => "'in'",
            TokenKind::Do => "'do'",
            TokenKind::Import => "'import'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Nil => "'nil'",
            TokenKind::Void => "'void'",
            TokenKind::Bool => "'bool'",
            TokenKind::String => "'string'",
            TokenKind::I8 => "'i8'",
            TokenKind::I16 => "'i16'",
            TokenKind::I32 => "'i32'",
            TokenKind::I64 => "'i64'",
            TokenKind::U8 => "'u8'",
            TokenKind::U16 => "'u16'",
            TokenKind::U32 => "'u32'",
            TokenKind::U64 => "'u64'",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::StringLiteral => "string literal",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::ColonEquals => "':='",
            TokenKind::Equals => "'='",
            TokenKind::Arrow => "'->'",
            TokenKind::Dot => "'.'",
            TokenKind::DotDot => "'..'",
            TokenKind::DotStar => "'.*'",
            TokenKind::Borrow => "'&'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Asterisk => "'*'",
            TokenKind::Divide => "'/'",
            TokenKind::GreaterThan => "'>'",
            TokenKind::LessThan => "'<'",
            TokenKind::GreaterEqual => "'>='",
            TokenKind::LessEqual => "'<='",
            TokenKind::EqualEqual => "'=='",
            TokenKind::NotEqual => "'!='",
            TokenKind::EndOfFile => "end of file",
        };
        f.write_str(name)
    }
}

/// A lexed token with its 1-based source position.
///
/// The lexeme is preserved verbatim, keywords included; for string literals
/// it holds the decoded content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexicalError {
    #[error("Unknown character: {character} at line: {line}, column: {column}")]
    UnknownCharacter {
        character: char,
        line: u32,
        column: u32,
    },
    #[error("Unterminated string literal at line: {line}, column: {column}")]
    UnterminatedString { line: u32, column: u32 },
}

// Incremental byte-offset to line/column conversion. Offsets are fed in
// lexing order, so each gap is scanned exactly once.
struct PositionTracker<'a> {
    source: &'a str,
    offset: usize,
    line: u32,
    column: u32,
}

impl<'a> PositionTracker<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn advance_to(&mut self, target: usize) -> (u32, u32) {
        for ch in self.source[self.offset..target].chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset = target;
        (self.line, self.column)
    }
}

/// Materialize the whole token stream, ending in a single `EndOfFile` token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexicalError> {
    let mut lexer = TokenKind::lexer(source);
    let mut tracker = PositionTracker::new(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let (line, column) = tracker.advance_to(span.start);

        match result {
            Ok(kind) => {
                let lexeme = if kind == TokenKind::StringLiteral {
                    decode_string(lexer.slice())
                } else {
                    lexer.slice().to_string()
                };
                tokens.push(Token {
                    kind,
                    lexeme,
                    line,
                    column,
                });
            }
            Err(()) => {
                let character = source[span.start..].chars().next().unwrap_or('\0');
                // A quote that never closes fails the string regex and lands
                // here; report it as an unterminated literal rather than an
                // unknown byte.
                if character == '"' {
                    return Err(LexicalError::UnterminatedString { line, column });
                }
                return Err(LexicalError::UnknownCharacter {
                    character,
                    line,
                    column,
                });
            }
        }
    }

    let (line, column) = tracker.advance_to(source.len());
    tokens.push(Token {
        kind: TokenKind::EndOfFile,
        lexeme: String::new(),
        line,
        column,
    });
    Ok(tokens)
}

// Strip the surrounding quotes and decode `\n \t \r \\ \"`; any other escaped
// character is kept verbatim.
fn decode_string(slice: &str) -> String {
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(ch);
        }
    }
    out
}
