use crate::{
    error::parse_error::ParseError,
    interpreter::lexer::{self, IncDec, Token, TokenKind},
};

/// Result type used by the tokenizer and parser.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parses an infix expression into a postfix token vector.
///
/// This is the shunting-yard conversion: operands go straight to the
/// output, operators wait on a stack until an operator of no greater
/// precedence arrives, and grouping tokens bound the reordering. A closing
/// `)` additionally moves a function head beneath the opener to the output
/// (realising the call), and a closing `]` requires an array head there.
/// Commas flush the stack to the nearest opener so arguments stay
/// separated. A final pass fuses `++`/`--` that directly follow a variable
/// or array token into a postfix marker on that token.
///
/// Errors are annotated with the expression text.
///
/// # Errors
/// `UnknownToken` from the tokenizer, `UnbalancedParens`,
/// `UnbalancedBrackets`, or `MissingArrayHead` for malformed grouping.
///
/// # Example
/// ```
/// use rill::interpreter::parser::parse;
///
/// let postfix = parse("1 + 2 * 3").unwrap();
/// let texts: Vec<&str> = postfix.iter().skip(1).map(|t| t.text.as_str()).collect();
/// assert_eq!(texts, ["1", "2", "3", "*", "+"]);
/// ```
pub fn parse(src: &str) -> ParseResult<Vec<Token>> {
    to_postfix(src).map_err(|e| e.in_expression(src))
}

/// Extracts the parameter names from a `function` declaration's
/// parenthesised parameter list, such as `(a, b)`.
///
/// # Errors
/// `FunctionParams` if anything other than plain names appears between
/// the parentheses, plus any error the list fails to parse with.
pub fn function_params(src: &str) -> ParseResult<Vec<String>> {
    let tokens = parse(src)?;
    let mut params = Vec::new();
    for token in tokens.iter().skip(1) {
        if token.kind == TokenKind::Var && token.inc_dec.is_none() {
            params.push(token.text.clone());
        } else {
            return Err(ParseError::FunctionParams { src: src.trim().to_string() });
        }
    }
    Ok(params)
}

fn to_postfix(src: &str) -> ParseResult<Vec<Token>> {
    let tokens = lexer::tokenize(src)?;
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Token> = Vec::new();
    let mut parens = 0i32;
    let mut brackets = 0i32;

    for token in tokens {
        match token.kind {
            TokenKind::Expr | TokenKind::Var | TokenKind::Val | TokenKind::Str => out.push(token),
            TokenKind::Comma => {
                while stack.last().is_some_and(|top| top.text != "(" && top.text != "[") {
                    if let Some(top) = stack.pop() {
                        out.push(top);
                    }
                }
            },
            _ => match token.text.as_str() {
                "(" => {
                    parens += 1;
                    stack.push(token);
                },
                ")" => {
                    parens -= 1;
                    while stack.last().is_some_and(|top| top.text != "(") {
                        if let Some(top) = stack.pop() {
                            out.push(top);
                        }
                    }
                    if stack.pop().is_none() {
                        return Err(ParseError::UnbalancedParens);
                    }
                    if stack.last().is_some_and(|top| top.kind == TokenKind::Func) {
                        if let Some(head) = stack.pop() {
                            out.push(head);
                        }
                    }
                },
                "[" => {
                    brackets += 1;
                    stack.push(token);
                },
                "]" => {
                    brackets -= 1;
                    while stack.last().is_some_and(|top| top.text != "[") {
                        if let Some(top) = stack.pop() {
                            out.push(top);
                        }
                    }
                    if stack.pop().is_none() {
                        return Err(ParseError::UnbalancedBrackets);
                    }
                    if let Some(top) = stack.last() {
                        if top.kind == TokenKind::Array {
                            if let Some(head) = stack.pop() {
                                out.push(head);
                            }
                        } else {
                            return Err(ParseError::MissingArrayHead);
                        }
                    }
                },
                _ => {
                    while stack.last().is_some_and(|top| {
                                        top.text != "(" && top.text != "[" && top.prec > token.prec
                                    })
                    {
                        if let Some(top) = stack.pop() {
                            out.push(top);
                        }
                    }
                    stack.push(token);
                },
            },
        }
    }

    if parens != 0 {
        return Err(ParseError::UnbalancedParens);
    }
    if brackets != 0 {
        return Err(ParseError::UnbalancedBrackets);
    }
    while let Some(top) = stack.pop() {
        if top.text != "(" && top.text != ")" {
            out.push(top);
        }
    }

    Ok(fuse_postfix_markers(out))
}

/// Merges `++`/`--` operators that directly follow a variable or array
/// token in postfix order into a postfix marker on that token.
fn fuse_postfix_markers(tokens: Vec<Token>) -> Vec<Token> {
    let mut fused: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token.kind == TokenKind::Op && (token.text == "++" || token.text == "--") {
            if let Some(prev) = fused.last_mut() {
                if prev.is_lvalue() {
                    prev.inc_dec = Some(if token.text == "++" {
                                            IncDec::PostInc
                                        } else {
                                            IncDec::PostDec
                                        });
                    continue;
                }
            }
        }
        fused.push(token);
    }
    fused
}
