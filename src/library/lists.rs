use super::Library;
use crate::evaluator;
use crate::types::{Arity, IodeObject, PrimitiveFn};

// Throughout this library `nil` stands in for the empty list.

const LIST: PrimitiveFn = PrimitiveFn {
    name: "list",
    fn_ptr: list_,
    arity: Arity::at_least(0),
};

fn list_(args: &[IodeObject]) -> evaluator::Result {
    Ok(IodeObject::wrap_list(args.to_vec()))
}

const CONS: PrimitiveFn = PrimitiveFn {
    name: "cons",
    fn_ptr: cons_,
    arity: Arity::exactly(2),
};

fn cons_(args: &[IodeObject]) -> evaluator::Result {
    let tail = args[1].as_seq()?;
    let mut result = Vec::with_capacity(tail.len() + 1);
    result.push(args[0].clone());
    result.extend_from_slice(tail);
    Ok(IodeObject::wrap_list(result))
}

const HEAD: PrimitiveFn = PrimitiveFn {
    name: "head",
    fn_ptr: head_,
    arity: Arity::exactly(1),
};

fn head_(args: &[IodeObject]) -> evaluator::Result {
    Ok(args[0].as_seq()?.first().cloned().unwrap_or(IodeObject::Nil))
}

const TAIL: PrimitiveFn = PrimitiveFn {
    name: "tail",
    fn_ptr: tail_,
    arity: Arity::exactly(1),
};

fn tail_(args: &[IodeObject]) -> evaluator::Result {
    let rest = match args[0].as_seq()? {
        [] => Vec::new(),
        [_, rest @ ..] => rest.to_vec(),
    };
    Ok(IodeObject::wrap_list(rest))
}

const NTH: PrimitiveFn = PrimitiveFn {
    name: "nth",
    fn_ptr: nth_,
    arity: Arity::exactly(2),
};

/// A negative index counts back from the end. Out of range is `nil`.
fn nth_(args: &[IodeObject]) -> evaluator::Result {
    let list = args[0].as_seq()?;
    let index = args[1].as_int()?;
    let position = if index < 0 {
        (list.len() as i64).checked_add(index)
    } else {
        Some(index)
    };
    let element = position
        .filter(|&i| i >= 0)
        .and_then(|i| list.get(i as usize))
        .cloned();
    Ok(element.unwrap_or(IodeObject::Nil))
}

const MAP: PrimitiveFn = PrimitiveFn {
    name: "map",
    fn_ptr: map_,
    arity: Arity::exactly(2),
};

fn map_(args: &[IodeObject]) -> evaluator::Result {
    let mapped: evaluator::Result<Vec<IodeObject>> = args[1]
        .as_seq()?
        .iter()
        .map(|obj| evaluator::apply_fully(&args[0], std::slice::from_ref(obj)))
        .collect();
    Ok(IodeObject::wrap_list(mapped?))
}

const EMPTY_TEST: PrimitiveFn = PrimitiveFn {
    name: "empty?",
    fn_ptr: empty_test_,
    arity: Arity::exactly(1),
};

fn empty_test_(args: &[IodeObject]) -> evaluator::Result {
    let empty = match &args[0] {
        IodeObject::String(s) => s.is_empty(),
        IodeObject::Map(m) => m.is_empty(),
        other => other.as_seq()?.is_empty(),
    };
    Ok(IodeObject::Bool(empty))
}

pub static LIBRARY: Library = Library {
    name: "lists",
    functions: &[&LIST, &CONS, &HEAD, &TAIL, &NTH, &MAP, &EMPTY_TEST],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::call_primitive;
    use crate::types::Callable;

    fn ints(values: &[i64]) -> IodeObject {
        IodeObject::from(values.iter().copied().map(IodeObject::Integer).collect::<Vec<_>>())
    }

    #[test]
    fn construction() {
        assert_eq!(call_primitive(&LIST, &[]).unwrap(), ints(&[]));
        assert_eq!(
            call_primitive(&CONS, &[IodeObject::Integer(1), ints(&[2, 3])]).unwrap(),
            ints(&[1, 2, 3])
        );
        assert_eq!(
            call_primitive(&CONS, &[IodeObject::Integer(1), IodeObject::Nil]).unwrap(),
            ints(&[1])
        );
    }

    #[test]
    fn head_and_tail() {
        assert_eq!(call_primitive(&HEAD, &[ints(&[4, 5])]).unwrap(), IodeObject::Integer(4));
        assert_eq!(call_primitive(&HEAD, &[ints(&[])]).unwrap(), IodeObject::Nil);
        assert_eq!(call_primitive(&TAIL, &[ints(&[4, 5])]).unwrap(), ints(&[5]));
        assert_eq!(call_primitive(&TAIL, &[IodeObject::Nil]).unwrap(), ints(&[]));
    }

    #[test]
    fn nth_indexes_from_either_end() {
        let list = ints(&[10, 20, 30]);
        let nth = |i| call_primitive(&NTH, &[list.clone(), IodeObject::Integer(i)]).unwrap();
        assert_eq!(nth(0), IodeObject::Integer(10));
        assert_eq!(nth(-1), IodeObject::Integer(30));
        assert_eq!(nth(3), IodeObject::Nil);
        assert_eq!(nth(-4), IodeObject::Nil);
    }

    #[test]
    fn emptiness() {
        let empty = |x| call_primitive(&EMPTY_TEST, &[x]).unwrap();
        assert_eq!(empty(ints(&[])), IodeObject::Bool(true));
        assert_eq!(empty(IodeObject::Nil), IodeObject::Bool(true));
        assert_eq!(empty(ints(&[1])), IodeObject::Bool(false));
        assert_eq!(empty("".into()), IodeObject::Bool(true));
        assert!(call_primitive(&EMPTY_TEST, &[IodeObject::Integer(1)]).is_err());
    }

    #[test]
    fn map_calls_back_into_primitives() {
        let minus = crate::library::maths::LIBRARY
            .functions
            .iter()
            .find(|f| f.name == "-")
            .copied()
            .unwrap();
        let negate = IodeObject::Callable(Callable::Primitive(minus));
        assert_eq!(
            call_primitive(&MAP, &[negate, ints(&[1, -2])]).unwrap(),
            ints(&[-1, 2])
        );
    }
}
