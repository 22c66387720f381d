use crate::{
    error::{parse_error::ParseError, RuntimeError},
    interpreter::{
        evaluator::core::{eval_line, Context, Env, EvalResult, Flow},
        functions::{builtins, Function, Functions},
        parser,
        value::core::Value,
    },
};

/// The cooperative-cancellation signal an observer raises to stop a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopped;

/// The per-line callback through which a host debugs, steps, and cancels
/// execution.
///
/// The observer is invoked with the line number and the current
/// environment before each statement executes, in execution order: a loop
/// revisits its body lines, a function call reports the call-site line and
/// then the body lines. After a successful run it is invoked once more
/// with line number `0` and the final environment. Returning
/// `Err(Stopped)` cancels the run; the interpreter propagates the signal
/// out through every enclosing expression, function frame, and block walk.
///
/// Implemented for any `FnMut(usize, &Env) -> Result<(), Stopped>`
/// closure.
pub trait LineObserver {
    /// Observes one executed line.
    ///
    /// # Errors
    /// Return `Err(Stopped)` to cancel the run.
    fn line(&mut self, number: usize, vars: &Env) -> Result<(), Stopped>;
}

impl<F> LineObserver for F where F: FnMut(usize, &Env) -> Result<(), Stopped>
{
    fn line(&mut self, number: usize, vars: &Env) -> Result<(), Stopped> {
        self(number, vars)
    }
}

/// One element of the preprocessed script: a statement line, or the block
/// of deeper-indented lines belonging to the line before it.
#[derive(Debug, Clone)]
pub enum Node {
    /// A statement line with its original (1-based) line number.
    Line {
        /// Line number in the source text, counting blank lines.
        number: usize,
        /// The dedented statement text.
        text:   String,
    },
    /// An indented block of child nodes.
    Block(Vec<Node>),
}

/// A preprocessed script, ready to run.
///
/// Construction normalises quotes, strips `//` comments, and folds the
/// indentation structure into a [`Node`] tree; nothing is parsed beyond
/// that until the script runs, so expression errors surface at execution
/// time with the line that caused them.
///
/// # Example
/// ```
/// use rill::{Functions, Script, Value};
///
/// let script = Script::new("ii = 0\nwhile (ii < 3)\n  ii = ii + 1\nreturn ii", Functions::new());
/// assert_eq!(script.run().unwrap(), Value::from(3));
/// ```
pub struct Script {
    nodes:     Vec<Node>,
    functions: Functions,
}

impl Script {
    /// Preprocesses `source` and merges `host` functions over the
    /// built-ins. Host names are registered case-insensitively and may
    /// shadow built-ins.
    #[must_use]
    pub fn new(source: &str, host: Functions) -> Self {
        let mut functions = builtins();
        for (name, function) in host {
            functions.insert(name.to_lowercase(), function);
        }
        Self { nodes: build_tree(source),
               functions }
    }

    /// Runs the script without an observer, at full speed.
    ///
    /// # Errors
    /// Any [`RuntimeError`] the script produces.
    pub fn run(&self) -> Result<Value, RuntimeError> {
        self.execute(None)
    }

    /// Runs the script, reporting each executed line to `observer`.
    ///
    /// # Errors
    /// Any [`RuntimeError`] the script produces; cancellation from the
    /// observer surfaces as an error whose kind is
    /// [`Stopped`](crate::ErrorKind::Stopped).
    pub fn run_observed(&self, observer: &mut dyn LineObserver) -> Result<Value, RuntimeError> {
        self.execute(Some(observer))
    }

    fn execute(&self, observer: Option<&mut dyn LineObserver>) -> Result<Value, RuntimeError> {
        let mut ctx = Context::new(self.functions.clone(), observer);
        let mut env = Env::new();
        let flow = ctx.eval_nodes(&self.nodes, &mut env)?;
        ctx.line_check(0, &env)?;
        Ok(match flow {
               Flow::Return(value) => value,
               Flow::Normal => Value::Null,
           })
    }
}

impl Context<'_> {
    /// Walks a node list, classifying each line by its first keyword and
    /// driving the expression evaluator. Returns early when a `return`
    /// fires so the value can propagate to the enclosing call.
    pub(crate) fn eval_nodes(&mut self, nodes: &[Node], env: &mut Env) -> EvalResult<Flow> {
        let mut ii = 0;
        while ii < nodes.len() {
            match &nodes[ii] {
                Node::Block(inner) => {
                    // free-standing indentation: run in the current frame
                    if let Flow::Return(value) = self.eval_nodes(inner, env)? {
                        return Ok(Flow::Return(value));
                    }
                    ii += 1;
                },
                Node::Line { number, text } => {
                    self.line_check(*number, env)?;
                    let (keyword, rest) = split_keyword(text);
                    let (flow, next) = match keyword {
                        "if" => self.eval_if(nodes, ii, rest, *number, env)?,
                        "while" => self.eval_while(nodes, ii, rest, *number, env)?,
                        "for" => self.eval_for(nodes, ii, rest, *number, env)?,
                        "function" => (Flow::Normal, self.declare(nodes, ii, rest, *number)?),
                        "return" => {
                            let value = if rest.trim().is_empty() {
                                Value::Null
                            } else {
                                eval_line(rest, env, self)?
                            };
                            return Ok(Flow::Return(value));
                        },
                        "end" => (Flow::Normal, ii + 1),
                        "elif" | "else" => {
                            return Err(RuntimeError::Parse(ParseError::MisplacedBranch { keyword: keyword.to_string(),
                                                                                        line:    *number, }));
                        },
                        _ => {
                            eval_line(text, env, self)?;
                            (Flow::Normal, ii + 1)
                        },
                    };
                    if let Flow::Return(value) = flow {
                        return Ok(Flow::Return(value));
                    }
                    ii = next;
                },
            }
        }
        Ok(Flow::Normal)
    }

    /// `if`/`elif`/`else`: each branch's condition and block run on a copy
    /// of the environment, reconciled back after the branch so assignments
    /// to existing names are visible outside while branch-local names are
    /// not. `elif` and `else` header lines are reported to the observer
    /// even when an earlier branch was taken.
    fn eval_if(&mut self,
               nodes: &[Node],
               at: usize,
               condition: &str,
               number: usize,
               env: &mut Env)
               -> EvalResult<(Flow, usize)> {
        let block = block_after(nodes, at, "if", number)?;
        let mut taken = false;

        let mut inner = env.clone();
        let mut flow = Flow::Normal;
        if self.condition("if", condition, &mut inner)? {
            taken = true;
            flow = self.eval_nodes(block, &mut inner)?;
        }
        reconcile(env, &inner);
        if let Flow::Return(_) = flow {
            return Ok((flow, at + 2));
        }

        let mut next = at + 2;
        while let Some(Node::Line { number, text }) = nodes.get(next) {
            let (keyword, rest) = split_keyword(text);
            if keyword != "elif" {
                break;
            }
            self.line_check(*number, env)?;
            let block = block_after(nodes, next, "elif", *number)?;
            if !taken {
                let mut inner = env.clone();
                if self.condition("elif", rest, &mut inner)? {
                    taken = true;
                    let flow = self.eval_nodes(block, &mut inner)?;
                    reconcile(env, &inner);
                    if let Flow::Return(_) = flow {
                        return Ok((flow, next + 2));
                    }
                } else {
                    reconcile(env, &inner);
                }
            }
            next += 2;
        }

        if let Some(Node::Line { number, text }) = nodes.get(next) {
            if split_keyword(text).0 == "else" {
                self.line_check(*number, env)?;
                let block = block_after(nodes, next, "else", *number)?;
                if !taken {
                    let mut inner = env.clone();
                    let flow = self.eval_nodes(block, &mut inner)?;
                    reconcile(env, &inner);
                    if let Flow::Return(_) = flow {
                        return Ok((flow, next + 2));
                    }
                }
                next += 2;
            }
        }

        Ok((Flow::Normal, next))
    }

    /// `while`: the condition and body share one copy of the environment
    /// across all iterations, reconciled back when the loop ends.
    fn eval_while(&mut self,
                  nodes: &[Node],
                  at: usize,
                  condition: &str,
                  number: usize,
                  env: &mut Env)
                  -> EvalResult<(Flow, usize)> {
        let block = block_after(nodes, at, "while", number)?;
        let mut inner = env.clone();
        let mut flow = Flow::Normal;
        while self.condition("while", condition, &mut inner)? {
            if let Flow::Return(value) = self.eval_nodes(block, &mut inner)? {
                flow = Flow::Return(value);
                break;
            }
        }
        reconcile(env, &inner);
        Ok((flow, at + 2))
    }

    /// `for (init; test; step)`: the parenthesis wrapping is optional, the
    /// three clauses are plain expressions, and all of them share one copy
    /// of the environment with the body.
    fn eval_for(&mut self,
                nodes: &[Node],
                at: usize,
                rest: &str,
                number: usize,
                env: &mut Env)
                -> EvalResult<(Flow, usize)> {
        let block = block_after(nodes, at, "for", number)?;
        let mut clauses = rest.trim();
        while clauses.starts_with('(') && clauses.ends_with(')') {
            clauses = clauses[1..clauses.len() - 1].trim();
        }
        let parts: Vec<&str> = clauses.split(';').collect();
        let [init, test, step] = parts.as_slice() else {
            return Err(RuntimeError::Parse(ParseError::MalformedFor { line: number }));
        };

        let mut inner = env.clone();
        eval_line(init, &mut inner, self)?;
        let mut flow = Flow::Normal;
        while self.condition("for", test, &mut inner)? {
            if let Flow::Return(value) = self.eval_nodes(block, &mut inner)? {
                flow = Flow::Return(value);
                break;
            }
            eval_line(step, &mut inner, self)?;
        }
        reconcile(env, &inner);
        Ok((flow, at + 2))
    }

    /// `function name(params)`: captures the following block as the body
    /// and registers the function under its lowercased name. Redeclaring a
    /// name, built-ins included, replaces the earlier registration.
    fn declare(&mut self,
               nodes: &[Node],
               at: usize,
               rest: &str,
               number: usize)
               -> EvalResult<usize> {
        let rest = rest.trim();
        let Some(open) = rest.find('(') else {
            return Err(RuntimeError::Parse(ParseError::BadFunctionDef { line: number }));
        };
        let name = rest[..open].trim();
        if !valid_name(name) {
            return Err(RuntimeError::Parse(ParseError::BadFunctionDef { line: number }));
        }
        let params = parser::function_params(&rest[open..])?;
        let block = block_after(nodes, at, "function", number)?;
        self.functions
            .insert(name.to_lowercase(), Function::user(params, block.to_vec()));
        Ok(at + 2)
    }

    fn condition(&mut self, keyword: &str, src: &str, env: &mut Env) -> EvalResult<bool> {
        match eval_line(src, env, self)? {
            Value::Bool(value) => Ok(value),
            _ => Err(RuntimeError::ExpectedBoolean { what: format!("{keyword} condition") }),
        }
    }
}

/// Copies every name bound in both maps from the inner map back into the
/// outer one. Names the block created are deliberately not propagated.
fn reconcile(outer: &mut Env, inner: &Env) {
    for (name, value) in outer.iter_mut() {
        if let Some(updated) = inner.get(name) {
            *value = updated.clone();
        }
    }
}

fn block_after<'n>(nodes: &'n [Node],
                   at: usize,
                   keyword: &str,
                   line: usize)
                   -> EvalResult<&'n [Node]> {
    match nodes.get(at + 1) {
        Some(Node::Block(block)) => Ok(block),
        _ => Err(RuntimeError::Parse(ParseError::MissingBlock { keyword: keyword.to_string(),
                                                                line })),
    }
}

/// Splits a statement line into its leading identifier word and the rest,
/// so `form = 1` is an expression statement while `for (…)` is a loop.
fn split_keyword(line: &str) -> (&str, &str) {
    let line = line.trim();
    let end = line.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                  .unwrap_or(line.len());
    (&line[..end], &line[end..])
}

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {},
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | ':'))
}

/// Preprocesses source text into the indentation tree.
///
/// Double quotes become single quotes, `//` comments are dropped to end of
/// line, and blank lines are skipped while still counting toward line
/// numbers. A line indented deeper than its predecessor opens a block
/// attached after that predecessor; a dedent closes blocks up to the
/// nearest enclosing level, tolerating dedents to a level that never
/// appeared.
fn build_tree(source: &str) -> Vec<Node> {
    struct RawLine {
        number: usize,
        indent: usize,
        text:   String,
    }

    let source = source.replace('"', "'");
    let mut lines = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        let stripped = match raw.find("//") {
            Some(at) => &raw[..at],
            None => raw,
        };
        if stripped.trim().is_empty() {
            continue;
        }
        let indent = stripped.len() - stripped.trim_start().len();
        lines.push(RawLine { number: idx + 1,
                             indent,
                             text: stripped.trim().to_string() });
    }

    fn fold(lines: &[RawLine], pos: &mut usize, indent: usize) -> Vec<Node> {
        let mut nodes = Vec::new();
        while *pos < lines.len() {
            let line = &lines[*pos];
            if line.indent == indent {
                nodes.push(Node::Line { number: line.number,
                                        text:   line.text.clone(), });
                *pos += 1;
            } else if line.indent > indent {
                let deeper = line.indent;
                nodes.push(Node::Block(fold(lines, pos, deeper)));
            } else {
                break;
            }
        }
        nodes
    }

    let mut pos = 0;
    fold(&lines, &mut pos, 0)
}
