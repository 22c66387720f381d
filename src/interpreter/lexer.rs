use logos::Logos;

use crate::error::parse_error::ParseError;
use crate::interpreter::parser::ParseResult;

/// Raw lexical shapes recognised by the first tokenizer pass.
///
/// The raw pass knows nothing about context; a second pass classifies
/// identifiers by what follows them, folds signs into adjacent literals,
/// pairs the short-circuit operators with their gate sentinels, and fuses
/// prefix `++`/`--` into the token they modify.
#[derive(Logos, Debug, PartialEq, Clone)]
enum RawToken {
    /// Decimal literals such as `3.14`, `.5`, or `2.`.
    #[regex(r"[0-9]+\.[0-9]*|\.[0-9]+")]
    Decimal,
    /// Hexadecimal integer literals such as `0xD8`.
    #[regex(r"0x[0-9a-fA-F]+")]
    Hex,
    /// Decimal integer literals such as `42`.
    #[regex(r"[0-9]+")]
    Integer,
    /// Identifiers; may continue with digits, `.`, `_`, or `:`.
    #[regex(r"[A-Za-z_][A-Za-z0-9_.:]*")]
    Ident,
    /// String literals. Double quotes are rewritten to single quotes
    /// before lexing, so one delimiter covers both styles. No escapes.
    #[regex(r"'[^']*'")]
    Text,
    /// `&&`
    #[token("&&")]
    AndAnd,
    /// `||`
    #[token("||")]
    OrOr,
    /// `++`
    #[token("++")]
    Increment,
    /// `--`
    #[token("--")]
    Decrement,
    /// `+`, kept apart from the other operators for sign folding.
    #[token("+")]
    Plus,
    /// `-`, kept apart from the other operators for sign folding.
    #[token("-")]
    Minus,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `,`
    #[token(",")]
    Comma,
    /// Every remaining operator, longest match first.
    #[regex(r"\*=|/=|%=|\+=|-=|==|!=|<=|>=|<<|>>>|>>|[=<>*/%!^&|]")]
    Operator,
    /// Spaces and tabs.
    #[regex(r"[ \t]+", logos::skip)]
    Whitespace,
}

/// What a token is to the parser and evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// The leading tag carrying the whole expression text for diagnostics.
    Expr,
    /// A variable read (or scalar assignment target).
    Var,
    /// A numeric literal.
    Val,
    /// A string literal.
    Str,
    /// An operator.
    Op,
    /// A function name, recognised by the `(` that follows it.
    Func,
    /// An array name, recognised by the `[` that follows it.
    Array,
    /// A short-circuit gate sentinel paired with a `&&` or `||` operator.
    Gate,
    /// An argument separator.
    Comma,
}

/// Pre- or post- increment/decrement marker fused onto a variable or
/// array token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDec {
    /// `++x`: apply before the read.
    PreInc,
    /// `--x`: apply before the read.
    PreDec,
    /// `x++`: read, then apply.
    PostInc,
    /// `x--`: read, then apply.
    PostDec,
}

impl IncDec {
    /// Returns `true` for the prefix markers.
    #[must_use]
    pub const fn is_pre(self) -> bool {
        matches!(self, Self::PreInc | Self::PreDec)
    }

    /// Returns `true` for the incrementing markers.
    #[must_use]
    pub const fn is_increment(self) -> bool {
        matches!(self, Self::PreInc | Self::PostInc)
    }
}

/// A parser-level token: kind, source text, precedence, and the optional
/// short-circuit correlation id and `++`/`--` marker.
#[derive(Debug, Clone)]
pub struct Token {
    /// The token's kind.
    pub kind:    TokenKind,
    /// The token's source text: a name, literal, or operator spelling.
    pub text:    String,
    /// Operator precedence; `0` for operands.
    pub prec:    u8,
    /// Correlation id shared by a gate and its `&&`/`||` operator.
    pub gate_id: Option<u32>,
    /// Fused pre/post increment or decrement marker.
    pub inc_dec: Option<IncDec>,
}

/// Precedence of the gate sentinels, between the short-circuit operators
/// they belong to and the equality operators.
const GATE_PRECEDENCE: u8 = 2;
/// Precedence of a function call or array index application.
const APPLY_PRECEDENCE: u8 = 10;

impl Token {
    pub(crate) fn new(kind: TokenKind, text: &str) -> Self {
        let prec = match kind {
            TokenKind::Func | TokenKind::Array => APPLY_PRECEDENCE,
            TokenKind::Op => precedence(text),
            _ => 0,
        };
        Self { kind,
               text: text.to_string(),
               prec,
               gate_id: None,
               inc_dec: None }
    }

    fn tag(text: &str) -> Self {
        Self::new(TokenKind::Expr, text)
    }

    fn value(text: &str) -> Self {
        Self::new(TokenKind::Val, text)
    }

    fn string(text: &str) -> Self {
        Self::new(TokenKind::Str, text)
    }

    fn operator(text: &str) -> Self {
        Self::new(TokenKind::Op, text)
    }

    fn gate(text: &str, id: u32) -> Self {
        let mut token = Self::new(TokenKind::Gate, text);
        token.prec = GATE_PRECEDENCE;
        token.gate_id = Some(id);
        token
    }

    fn comma() -> Self {
        Self::new(TokenKind::Comma, ",")
    }

    fn with_gate(mut self, id: u32) -> Self {
        self.gate_id = Some(id);
        self
    }

    /// Returns `true` if the token can carry a `++`/`--` marker.
    #[must_use]
    pub const fn is_lvalue(&self) -> bool {
        matches!(self.kind, TokenKind::Var | TokenKind::Array)
    }
}

/// Operator precedence, lowest to highest. All binary operators are
/// left-associative.
fn precedence(op: &str) -> u8 {
    match op {
        "=" | "+=" | "-=" | "*=" | "/=" | "%=" => 0,
        "|" | "||" | "&" | "&&" | "^" => 1,
        // 2 is reserved for the gate sentinels
        "==" | "!=" => 3,
        "<" | "<=" | ">" | ">=" => 4,
        "<<" | ">>" | ">>>" => 5,
        "+" | "-" => 6,
        "*" | "/" | "%" => 7,
        "!" | "++" | "--" => 8,
        "(" | ")" | "[" | "]" => 9,
        _ => 0,
    }
}

/// Reduces every whitespace run in `text` to a single space.
fn condense_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Tokenizes one expression into the parser's token stream.
///
/// The stream starts with an [`Expr`](TokenKind::Expr) tag holding the
/// condensed expression text for diagnostics. `&&` and `||` each emit a
/// gate sentinel followed by the operator, sharing a fresh correlation id.
/// A sign directly prefixing a numeric literal is folded into the literal
/// unless the previous token could serve as a left operand. A `++` or `--`
/// directly before a variable or array name is fused into that token as a
/// prefix marker.
///
/// # Errors
/// Returns `ParseError::UnknownToken` for characters outside the language.
pub fn tokenize(src: &str) -> ParseResult<Vec<Token>> {
    let condensed = condense_whitespace(&src.replace('"', "'"));

    let mut raw = Vec::new();
    let mut lexer = RawToken::lexer(&condensed);
    while let Some(item) = lexer.next() {
        match item {
            Ok(token) => raw.push((token, lexer.slice().to_string(), lexer.span())),
            Err(()) => {
                return Err(ParseError::UnknownToken { token: lexer.slice().to_string() });
            },
        }
    }

    let mut out = vec![Token::tag(&condensed)];
    let mut gate_id = 0u32;
    let mut ii = 0;
    while ii < raw.len() {
        let (token, slice, span) = &raw[ii];
        match token {
            RawToken::Decimal | RawToken::Hex | RawToken::Integer => {
                out.push(Token::value(slice));
            },
            RawToken::Ident => {
                let kind = match raw.get(ii + 1) {
                    Some((RawToken::LParen, ..)) => TokenKind::Func,
                    Some((RawToken::LBracket, ..)) => TokenKind::Array,
                    _ => TokenKind::Var,
                };
                out.push(Token::new(kind, slice));
            },
            RawToken::Text => out.push(Token::string(&slice[1..slice.len() - 1])),
            RawToken::AndAnd | RawToken::OrOr => {
                let text = if *token == RawToken::AndAnd { "&&" } else { "||" };
                out.push(Token::gate(text, gate_id));
                out.push(Token::operator(text).with_gate(gate_id));
                gate_id += 1;
            },
            RawToken::Plus | RawToken::Minus => {
                let mut folded = false;
                if let Some((next, next_slice, next_span)) = raw.get(ii + 1) {
                    // the sign must directly prefix digits; `-.5` keeps its
                    // operator reading
                    let numeric =
                        matches!(next, RawToken::Decimal | RawToken::Hex | RawToken::Integer)
                        && next_slice.as_bytes().first().is_some_and(u8::is_ascii_digit);
                    let adjacent = next_span.start == span.end;
                    let operand_before = matches!(out.last(),
                                                  Some(prev) if matches!(prev.kind,
                                                                         TokenKind::Val
                                                                         | TokenKind::Var));
                    if numeric && adjacent && !operand_before {
                        out.push(Token::value(&format!("{slice}{next_slice}")));
                        ii += 1;
                        folded = true;
                    }
                }
                if !folded {
                    out.push(Token::operator(slice));
                }
            },
            RawToken::Increment => out.push(Token::operator("++")),
            RawToken::Decrement => out.push(Token::operator("--")),
            RawToken::LParen => out.push(Token::operator("(")),
            RawToken::RParen => out.push(Token::operator(")")),
            RawToken::LBracket => out.push(Token::operator("[")),
            RawToken::RBracket => out.push(Token::operator("]")),
            RawToken::Comma => out.push(Token::comma()),
            RawToken::Operator => out.push(Token::operator(slice)),
            RawToken::Whitespace => {},
        }
        ii += 1;
    }

    Ok(fuse_prefix_markers(out))
}

/// Merges `++`/`--` operators that directly precede a variable or array
/// token into a prefix marker on that token, removing the operator.
fn fuse_prefix_markers(tokens: Vec<Token>) -> Vec<Token> {
    let mut fused = Vec::with_capacity(tokens.len());
    let mut ii = 0;
    while ii < tokens.len() {
        let token = &tokens[ii];
        if token.kind == TokenKind::Op && (token.text == "++" || token.text == "--") {
            if let Some(next) = tokens.get(ii + 1) {
                if next.is_lvalue() {
                    let mut lvalue = next.clone();
                    lvalue.inc_dec = Some(if token.text == "++" {
                                              IncDec::PreInc
                                          } else {
                                              IncDec::PreDec
                                          });
                    fused.push(lvalue);
                    ii += 2;
                    continue;
                }
            }
        }
        fused.push(token.clone());
        ii += 1;
    }
    fused
}
