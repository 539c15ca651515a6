//! Text format for facts, rules and knowledge files.
//!
//! ```text
//! # comment
//! fact: (isa cube block)
//! rule: ((isa ?x ?y) (isa ?y ?z)) -> (isa ?x ?z)
//! ```

use std::path::Path;

use crate::error::{KbError, KbResult};
use crate::statement::{Item, Rule, Statement, Term};

// ---------------------------------------------------------------------------
// S-expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Sexp {
    Atom(String),
    List(Vec<Sexp>),
}

fn tokenize(input: &str) -> Vec<String> {
    input
        .replace('(', " ( ")
        .replace(')', " ) ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Read exactly one s-expression from `tokens`, starting at `*pos`.
fn read_sexp(tokens: &[String], pos: &mut usize, line: usize) -> KbResult<Sexp> {
    let Some(token) = tokens.get(*pos) else {
        return Err(parse_error(line, "unexpected end of input"));
    };
    *pos += 1;
    match token.as_str() {
        "(" => {
            let mut items = Vec::new();
            loop {
                match tokens.get(*pos).map(String::as_str) {
                    Some(")") => {
                        *pos += 1;
                        return Ok(Sexp::List(items));
                    }
                    Some(_) => items.push(read_sexp(tokens, pos, line)?),
                    None => return Err(parse_error(line, "unbalanced parentheses")),
                }
            }
        }
        ")" => Err(parse_error(line, "unexpected ')'")),
        atom => Ok(Sexp::Atom(atom.to_string())),
    }
}

fn read_all(input: &str, line: usize) -> KbResult<Vec<Sexp>> {
    let tokens = tokenize(input);
    let mut pos = 0;
    let mut out = Vec::new();
    while pos < tokens.len() {
        out.push(read_sexp(&tokens, &mut pos, line)?);
    }
    Ok(out)
}

fn parse_error(line: usize, message: impl Into<String>) -> KbError {
    KbError::Parse {
        line,
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Statements and rules
// ---------------------------------------------------------------------------

fn statement_from_sexp(sexp: &Sexp, line: usize) -> KbResult<Statement> {
    let Sexp::List(items) = sexp else {
        return Err(parse_error(line, "a statement must be parenthesised"));
    };
    let Some((head, args)) = items.split_first() else {
        return Err(parse_error(line, "a statement needs a predicate"));
    };
    let Sexp::Atom(predicate) = head else {
        return Err(parse_error(line, "the predicate must be a symbol"));
    };
    if predicate.starts_with('?') {
        return Err(parse_error(
            line,
            format!("the predicate cannot be a variable: '{predicate}'"),
        ));
    }
    let terms = args
        .iter()
        .map(|arg| match arg {
            Sexp::Atom(token) if token == "?" => {
                Err(parse_error(line, "a variable needs a name after '?'"))
            }
            Sexp::Atom(token) => Ok(Term::parse(token)),
            Sexp::List(_) => Err(parse_error(line, "nested terms are not supported")),
        })
        .collect::<KbResult<Vec<_>>>()?;
    Ok(Statement::new(predicate.clone(), terms))
}

fn statement_at(input: &str, line: usize) -> KbResult<Statement> {
    match read_all(input, line)?.as_slice() {
        [single] => statement_from_sexp(single, line),
        [] => Err(parse_error(line, "expected a statement")),
        _ => Err(parse_error(line, "expected exactly one statement")),
    }
}

fn rule_at(input: &str, line: usize) -> KbResult<Rule> {
    let sexps = read_all(input, line)?;
    // Only a top-level `->` separates the halves; nested atoms are terms.
    let Some(arrow) = sexps
        .iter()
        .position(|s| matches!(s, Sexp::Atom(atom) if atom == "->"))
    else {
        return Err(parse_error(line, "a rule needs '->' between antecedents and consequent"));
    };
    let (lhs_part, rest) = sexps.split_at(arrow);

    let lhs = match lhs_part {
        [Sexp::List(antecedents)] => antecedents
            .iter()
            .map(|a| statement_from_sexp(a, line))
            .collect::<KbResult<Vec<_>>>()?,
        _ => {
            return Err(parse_error(
                line,
                "antecedents must be one parenthesised list of statements",
            ));
        }
    };
    let rhs = match &rest[1..] {
        [single] => statement_from_sexp(single, line)?,
        [] => return Err(parse_error(line, "expected a consequent after '->'")),
        _ => return Err(parse_error(line, "expected exactly one consequent")),
    };

    Rule::new(lhs, rhs).ok_or_else(|| parse_error(line, "a rule needs at least one antecedent"))
}

fn item_at(input: &str, line: usize) -> KbResult<Item> {
    let input = input.trim();
    if let Some(rest) = input.strip_prefix("fact:") {
        Ok(Item::Fact(statement_at(rest, line)?))
    } else if let Some(rest) = input.strip_prefix("rule:") {
        Ok(Item::Rule(rule_at(rest, line)?))
    } else {
        Err(parse_error(line, "expected 'fact:' or 'rule:'"))
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a single statement from `(pred t1 t2 ...)` syntax.
pub fn parse_statement(input: &str) -> KbResult<Statement> {
    statement_at(input, 1)
}

/// Parse a rule body from `((a1) (a2) ...) -> (c)` syntax.
pub fn parse_rule(input: &str) -> KbResult<Rule> {
    rule_at(input, 1)
}

/// Parse one `fact: ...` or `rule: ...` line.
pub fn parse_item(input: &str) -> KbResult<Item> {
    item_at(input, 1)
}

/// Parse a whole knowledge file. Blank lines and `#` comments are skipped;
/// errors report the 1-based line they occurred on.
pub fn parse_items(input: &str) -> KbResult<Vec<Item>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, text)| {
            let text = text.trim();
            !text.is_empty() && !text.starts_with('#')
        })
        .map(|(idx, text)| item_at(text, idx + 1))
        .collect()
}

/// Read and parse a knowledge file from disk.
pub fn load_file(path: &Path) -> KbResult<Vec<Item>> {
    let content = std::fs::read_to_string(path).map_err(|e| KbError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let items = parse_items(&content)?;
    tracing::debug!(path = %path.display(), count = items.len(), "loaded knowledge file");
    Ok(items)
}
