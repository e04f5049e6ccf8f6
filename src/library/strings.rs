use super::Library;
use crate::evaluator::{self, Error};
use crate::printer::{pr_str, PrintMode};
use crate::types::{Arity, IodeObject, PrimitiveFn, TypeMismatch};
use itertools::Itertools;
use regex::Regex;

lazy_static! {
    static ref DIRECTIVE_RE: Regex = Regex::new(r"(?s)%.?").unwrap();
}

const STR: PrimitiveFn = PrimitiveFn {
    name: "str",
    fn_ptr: |args| Ok(IodeObject::String(args.iter().map(|arg| pr_str(arg, PrintMode::Directly)).join(""))),
    arity: Arity::at_least(0),
};

const FORMAT: PrimitiveFn = PrimitiveFn {
    name: "format",
    fn_ptr: format_,
    arity: Arity::at_least(1),
};

/// Supports `%s` (as `str` shows it), `%p` (readable), `%d`, `%f` and `%%`.
/// Arguments beyond those the template uses are ignored.
fn format_(args: &[IodeObject]) -> evaluator::Result {
    let template = args[0].as_string()?;
    let mut values = args[1..].iter();
    let mut output = String::with_capacity(template.len());
    let mut last = 0;
    for directive in DIRECTIVE_RE.find_iter(template) {
        output.push_str(&template[last..directive.start()]);
        last = directive.end();
        let kind = &directive.as_str()[1..];
        if kind == "%" {
            output.push('%');
            continue;
        }
        if !["s", "p", "d", "f"].contains(&kind) {
            return Err(Error::BadFormat(format!("unknown directive `{}`", directive.as_str())));
        }
        let value = values
            .next()
            .ok_or_else(|| Error::BadFormat(format!("too few arguments for {:?}", template)))?;
        output.push_str(&render(kind, value)?);
    }
    output.push_str(&template[last..]);
    Ok(IodeObject::String(output))
}

fn render(kind: &str, value: &IodeObject) -> evaluator::Result<String> {
    let rendered = match (kind, value) {
        ("s", _) => pr_str(value, PrintMode::Directly),
        ("p", _) => pr_str(value, PrintMode::ReadableRepresentation),
        ("d", IodeObject::Integer(n)) => n.to_string(),
        ("d", IodeObject::Float(x)) => (x.floor() as i64).to_string(),
        ("d", _) => return Err(TypeMismatch::NotAnInteger.into()),
        (_, IodeObject::Integer(n)) => format!("{:.6}", *n as f64),
        (_, IodeObject::Rational(r)) => format!("{:.6}", r.to_f64()),
        (_, IodeObject::Float(x)) => format!("{:.6}", x),
        _ => return Err(TypeMismatch::NotANumber.into()),
    };
    Ok(rendered)
}

const MATCH_TEST: PrimitiveFn = PrimitiveFn {
    name: "match?",
    fn_ptr: match_test_,
    arity: Arity::exactly(2),
};

fn match_test_(args: &[IodeObject]) -> evaluator::Result {
    let regexp = args[0].as_regexp()?;
    let text = args[1].as_string()?;
    Ok(IodeObject::Bool(regexp.compiled.is_match(text)))
}

pub static LIBRARY: Library = Library {
    name: "strings",
    functions: &[&STR, &FORMAT, &MATCH_TEST],
};
