use crate::strings::{regexp_repr, string_repr};
use crate::types::{Callable, IodeObject};
use itertools::Itertools;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrintMode {
    /// Output which reads back as the same value, where that is possible.
    ReadableRepresentation,
    /// Strings without quotes or escapes, `nil` as nothing. What `puts` shows.
    Directly,
}

pub fn pr_str(object: &IodeObject, mode: PrintMode) -> String {
    match object {
        IodeObject::Nil => match mode {
            PrintMode::Directly => String::new(),
            PrintMode::ReadableRepresentation => "nil".into(),
        },
        IodeObject::Bool(b) => b.to_string(),
        IodeObject::Integer(n) => n.to_string(),
        IodeObject::Float(x) => float_str(*x),
        IodeObject::Rational(r) => r.to_string(),
        IodeObject::String(s) => match mode {
            PrintMode::Directly => s.clone(),
            PrintMode::ReadableRepresentation => string_repr(s),
        },
        IodeObject::Regexp(r) => regexp_repr(&r.source),
        IodeObject::Symbol(s) => s.to_string(),
        IodeObject::List(elements) => {
            format!("({})", elements.iter().map(|e| pr_nested(e, mode)).join(" "))
        }
        IodeObject::Map(map) => format!(
            "{{{}}}",
            map.iter()
                .map(|(k, v)| format!("{} {}", pr_nested(k, mode), pr_nested(v, mode)))
                .join(", ")
        ),
        IodeObject::Callable(Callable::Function(_)) => "#<function>".into(),
        IodeObject::Callable(Callable::Macro(_)) => "#<macro>".into(),
        IodeObject::Callable(Callable::Primitive(f)) => format!("#<primitive {}>", f.name),
        IodeObject::Callable(Callable::Require(_)) => "#<primitive require>".into(),
    }
}

/// Floats always keep a decimal point and never use an exponent, which the
/// reader would take for a symbol.
fn float_str(x: f64) -> String {
    let digits = x.to_string();
    if x.is_finite() && !digits.contains('.') {
        digits + ".0"
    } else {
        digits
    }
}

// Inside a collection `nil` is always visible, otherwise `(list 1 nil)`
// would print as `(1 )`.
fn pr_nested(object: &IodeObject, mode: PrintMode) -> String {
    match object {
        IodeObject::Nil => "nil".into(),
        _ => pr_str(object, mode),
    }
}

impl fmt::Display for IodeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", pr_str(self, PrintMode::ReadableRepresentation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_str;

    fn readable(source: &str) -> String {
        read_str(source).unwrap().to_string()
    }

    #[test]
    fn atoms() {
        assert_eq!(readable("nil"), "nil");
        assert_eq!(readable("true"), "true");
        assert_eq!(readable("42"), "42");
        assert_eq!(readable("1.5"), "1.5");
        assert_eq!(readable("6/4"), "3/2");
        assert_eq!(readable("foo-bar"), "foo-bar");
    }

    #[test]
    fn whole_floats_keep_their_point() {
        assert_eq!(IodeObject::Float(2.0).to_string(), "2.0");
        assert_eq!(IodeObject::Float(1e16).to_string(), "10000000000000000.0");
        assert_eq!(IodeObject::Float(1e-7).to_string(), "0.0000001");
    }

    #[test]
    fn non_finite_floats() {
        assert_eq!(IodeObject::Float(f64::NAN).to_string(), "NaN");
        assert_eq!(IodeObject::Float(f64::INFINITY).to_string(), "inf");
        assert_eq!(IodeObject::Float(f64::NEG_INFINITY).to_string(), "-inf");
    }

    #[test]
    fn strings_depend_on_mode() {
        let s = IodeObject::from("say \"hi\"\n");
        assert_eq!(pr_str(&s, PrintMode::ReadableRepresentation), r#""say \"hi\"\n""#);
        assert_eq!(pr_str(&s, PrintMode::Directly), "say \"hi\"\n");
        assert_eq!(pr_str(&IodeObject::Nil, PrintMode::Directly), "");
    }

    #[test]
    fn collections() {
        assert_eq!(readable("(a (b \"c\") nil)"), "(a (b \"c\") nil)");
        assert_eq!(readable("{\"a\" 1 \"b\" (2)}"), "{\"a\" 1, \"b\" (2)}");
        assert_eq!(readable("'x"), "(quote x)");
        assert_eq!(readable("()"), "()");
    }

    #[test]
    fn regexps_print_as_literals() {
        assert_eq!(readable(r"/a\/b/"), r"/a\/b/");
    }

    #[test]
    fn data_reads_back() {
        for source in &[r#"(1 2/3 4.5 "six\t" /7+/ sym {"k" (v)} true nil)"#, "()"] {
            let value = read_str(source).unwrap();
            assert_eq!(read_str(&value.to_string()).unwrap(), value);
        }
        for &x in &[1e16, 0.0000001, 123456789.125, 2.0] {
            let value = IodeObject::Float(x);
            assert_eq!(read_str(&value.to_string()).unwrap(), value);
        }
    }
}
