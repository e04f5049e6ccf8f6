use super::maths::{compare, Number};
use super::Library;
use crate::evaluator::{self, Error};
use crate::types::{truthy, Arity, IodeObject, PrimitiveFn, TypeMismatch};
use std::cmp::Ordering;

// Numbers order by value across the tower, strings lexicographically.
fn ordering(x: &IodeObject, y: &IodeObject) -> evaluator::Result<Option<Ordering>> {
    if let (IodeObject::String(a), IodeObject::String(b)) = (x, y) {
        return Ok(Some(a.cmp(b)));
    }
    match (Number::from_object(x), Number::from_object(y)) {
        (Ok(a), Ok(b)) => Ok(compare(a, b)),
        _ => Err(Error::TypeMismatch(TypeMismatch::NotComparable)),
    }
}

fn comparison_(args: &[IodeObject], test: fn(Ordering) -> bool) -> evaluator::Result {
    let result = ordering(&args[0], &args[1])?.map_or(false, test);
    Ok(IodeObject::Bool(result))
}

macro_rules! comparison_primitive {
    ($SYMBOL:tt, $NAME:ident) => {
        paste::item! {
            const $NAME: PrimitiveFn = PrimitiveFn {
                name: stringify!($SYMBOL),
                fn_ptr: |args: &[IodeObject]| comparison_(args, Ordering::[<is_ $NAME:lower>]),
                arity: Arity::exactly(2),
            };
        }
    };
}

comparison_primitive!(<, LT);
comparison_primitive!(<=, LE);
comparison_primitive!(>, GT);
comparison_primitive!(>=, GE);

const EQUAL: PrimitiveFn = PrimitiveFn {
    name: "=",
    fn_ptr: equal,
    arity: Arity::exactly(2),
};

fn equal(args: &[IodeObject]) -> evaluator::Result {
    Ok(IodeObject::Bool(args[0] == args[1]))
}

const NOT: PrimitiveFn = PrimitiveFn {
    name: "not",
    fn_ptr: |args| Ok(IodeObject::Bool(!truthy(&args[0]))),
    arity: Arity::exactly(1),
};

pub static LIBRARY: Library = Library {
    name: "comparisons",
    functions: &[&EQUAL, &LT, &LE, &GT, &GE, &NOT],
};
