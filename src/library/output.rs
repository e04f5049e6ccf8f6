use super::Library;
use crate::evaluator;
use crate::printer::{pr_str, PrintMode};
use crate::types::{Arity, IodeObject, PrimitiveFn};
use itertools::Itertools;

fn print_lines(args: &[IodeObject], mode: PrintMode) {
    println!("{}", args.iter().map(|arg| pr_str(arg, mode)).join("\n"));
}

/// What `p` and `pp` hand back: their sole argument, or all of them as a list.
fn echo(args: &[IodeObject]) -> IodeObject {
    match args {
        [] => IodeObject::Nil,
        [single] => single.clone(),
        _ => IodeObject::wrap_list(args.to_vec()),
    }
}

const PUTS: PrimitiveFn = PrimitiveFn {
    name: "puts",
    fn_ptr: |args| {
        print_lines(args, PrintMode::Directly);
        Ok(IodeObject::Nil)
    },
    arity: Arity::at_least(0),
};

const P: PrimitiveFn = PrimitiveFn {
    name: "p",
    fn_ptr: |args| {
        if !args.is_empty() {
            print_lines(args, PrintMode::ReadableRepresentation);
        }
        Ok(echo(args))
    },
    arity: Arity::at_least(0),
};

const PP: PrimitiveFn = PrimitiveFn {
    name: "pp",
    fn_ptr: pp_,
    arity: Arity::at_least(0),
};

/// Like `p`, but the elements of a list or map are laid out one per line.
fn pp_(args: &[IodeObject]) -> evaluator::Result {
    for arg in args {
        println!("{}", pretty(arg, 0));
    }
    Ok(echo(args))
}

fn pretty(obj: &IodeObject, depth: usize) -> String {
    let indent = " ".repeat(depth + 1);
    match obj {
        IodeObject::List(elements) if elements.len() > 1 => format!(
            "({})",
            elements
                .iter()
                .map(|e| pretty(e, depth + 1))
                .join(&format!("\n{}", indent))
        ),
        IodeObject::Map(map) if map.len() > 1 => format!(
            "{{{}}}",
            map.iter()
                .map(|(k, v)| format!("{} {}", pr_str(k, PrintMode::ReadableRepresentation), pretty(v, depth + 1)))
                .join(&format!(",\n{}", indent))
        ),
        _ => obj.to_string(),
    }
}

pub static LIBRARY: Library = Library {
    name: "output",
    functions: &[&PUTS, &P, &PP],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::call_primitive;
    use crate::reader::read_str;

    #[test]
    fn puts_returns_nil() {
        assert_eq!(call_primitive(&PUTS, &["hello".into()]).unwrap(), IodeObject::Nil);
    }

    #[test]
    fn p_echoes_its_arguments() {
        assert_eq!(call_primitive(&P, &[]).unwrap(), IodeObject::Nil);
        assert_eq!(call_primitive(&P, &[IodeObject::Integer(1)]).unwrap(), IodeObject::Integer(1));
        assert_eq!(
            call_primitive(&PP, &[IodeObject::Integer(1), IodeObject::Integer(2)]).unwrap(),
            read_str("(1 2)").unwrap()
        );
    }

    #[test]
    fn pretty_layout() {
        let nested = read_str(r#"(a (b c) {"k" 1, "j" (2 3)})"#).unwrap();
        assert_eq!(
            pretty(&nested, 0),
            "(a\n (b\n  c)\n {\"k\" 1,\n  \"j\" (2\n   3)})"
        );
        assert_eq!(pretty(&IodeObject::from("x"), 0), "\"x\"");
    }
}
