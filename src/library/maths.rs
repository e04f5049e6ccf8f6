use super::Library;
use crate::evaluator::{self, Error};
use crate::types::{Arity, IodeInt, IodeObject, PrimitiveFn, Rational, TypeMismatch};
use std::cmp::Ordering;

/// The numeric tower. Integers widen to rationals, and anything meeting a
/// float becomes a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Number {
    Integer(IodeInt),
    Rational(Rational),
    Float(f64),
}

enum Pair {
    Integers(IodeInt, IodeInt),
    Rationals(Rational, Rational),
    Floats(f64, f64),
}

impl Number {
    pub(super) fn from_object(obj: &IodeObject) -> Result<Self, TypeMismatch> {
        match obj {
            IodeObject::Integer(n) => Ok(Number::Integer(*n)),
            IodeObject::Rational(r) => Ok(Number::Rational(*r)),
            IodeObject::Float(x) => Ok(Number::Float(*x)),
            _ => Err(TypeMismatch::NotANumber),
        }
    }

    fn into_object(self) -> IodeObject {
        match self {
            Number::Integer(n) => IodeObject::Integer(n),
            Number::Rational(r) if r.denom() == 1 => IodeObject::Integer(r.numer()),
            Number::Rational(r) => IodeObject::Rational(r),
            Number::Float(x) => IodeObject::Float(x),
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Number::Integer(n) => n as f64,
            Number::Rational(r) => r.to_f64(),
            Number::Float(x) => x,
        }
    }

    fn to_rational(self) -> Option<Rational> {
        match self {
            Number::Integer(n) => Some(Rational::from_int(n)),
            Number::Rational(r) => Some(r),
            Number::Float(_) => None,
        }
    }
}

fn promote(x: Number, y: Number) -> Pair {
    match (x, y) {
        (Number::Integer(a), Number::Integer(b)) => Pair::Integers(a, b),
        (Number::Float(_), _) | (_, Number::Float(_)) => Pair::Floats(x.to_f64(), y.to_f64()),
        _ => match (x.to_rational(), y.to_rational()) {
            (Some(a), Some(b)) => Pair::Rationals(a, b),
            _ => Pair::Floats(x.to_f64(), y.to_f64()),
        },
    }
}

/// `None` when the numbers cannot be ordered (a NaN is involved).
pub(super) fn compare(x: Number, y: Number) -> Option<Ordering> {
    match promote(x, y) {
        Pair::Integers(a, b) => Some(a.cmp(&b)),
        Pair::Rationals(a, b) => a.partial_cmp(&b),
        Pair::Floats(a, b) => a.partial_cmp(&b),
    }
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Add,
    Sub,
    Mul,
    Div,
}

// Integer division rounds towards negative infinity.
fn floor_div(a: IodeInt, b: IodeInt) -> Option<IodeInt> {
    let quotient = a.checked_div(b)?;
    if a % b != 0 && (a < 0) != (b < 0) {
        quotient.checked_sub(1)
    } else {
        Some(quotient)
    }
}

// The remainder takes the sign of the divisor.
fn floor_mod(a: IodeInt, b: IodeInt) -> Option<IodeInt> {
    let remainder = a.checked_rem(b)?;
    if remainder != 0 && (remainder < 0) != (b < 0) {
        remainder.checked_add(b)
    } else {
        Some(remainder)
    }
}

fn operate(op: Operation, x: Number, y: Number) -> evaluator::Result<Number> {
    use Operation::*;
    if is_exact_zero_divisor(op, y) {
        return Err(Error::DivideByZero);
    }
    match promote(x, y) {
        Pair::Integers(a, b) => {
            let result = match op {
                Add => a.checked_add(b),
                Sub => a.checked_sub(b),
                Mul => a.checked_mul(b),
                Div => floor_div(a, b),
            };
            result.map(Number::Integer).ok_or(Error::IntegerOverflow)
        }
        Pair::Rationals(a, b) => {
            let result = match op {
                Add => a.checked_add(b),
                Sub => a.checked_sub(b),
                Mul => a.checked_mul(b),
                Div => a.checked_div(b),
            };
            result.map(Number::Rational).ok_or(Error::IntegerOverflow)
        }
        Pair::Floats(a, b) => Ok(Number::Float(match op {
            Add => a + b,
            Sub => a - b,
            Mul => a * b,
            Div => a / b,
        })),
    }
}

fn is_exact_zero_divisor(op: Operation, divisor: Number) -> bool {
    match (op, divisor) {
        (Operation::Div, Number::Integer(0)) => true,
        (Operation::Div, Number::Rational(r)) => r.is_zero(),
        _ => false,
    }
}

fn grab_numbers(args: &[IodeObject]) -> evaluator::Result<Vec<Number>> {
    let type_check: Result<Vec<_>, _> = args.iter().map(Number::from_object).collect();
    type_check.map_err(Error::TypeMismatch)
}

fn fold(args: &[IodeObject], op: Operation, identity: Number) -> evaluator::Result {
    let numbers = grab_numbers(args)?;
    let (first, rest) = match numbers.split_first() {
        Some((&first, rest)) => (first, rest),
        None => return Ok(identity.into_object()),
    };
    let start = match (op, rest.is_empty()) {
        // A lone operand to `-` is negated.
        (Operation::Sub, true) => operate(op, identity, first)?,
        _ => first,
    };
    rest.iter()
        .try_fold(start, |acc, &x| operate(op, acc, x))
        .map(Number::into_object)
}

const SUM: PrimitiveFn = PrimitiveFn {
    name: "+",
    fn_ptr: |args| fold(args, Operation::Add, Number::Integer(0)),
    arity: Arity::at_least(0),
};

const SUB: PrimitiveFn = PrimitiveFn {
    name: "-",
    fn_ptr: |args| fold(args, Operation::Sub, Number::Integer(0)),
    arity: Arity::at_least(1),
};

const MUL: PrimitiveFn = PrimitiveFn {
    name: "*",
    fn_ptr: |args| fold(args, Operation::Mul, Number::Integer(1)),
    arity: Arity::at_least(0),
};

const DIV: PrimitiveFn = PrimitiveFn {
    name: "/",
    fn_ptr: |args| fold(args, Operation::Div, Number::Integer(1)),
    arity: Arity::at_least(2),
};

const MOD: PrimitiveFn = PrimitiveFn {
    name: "mod",
    fn_ptr: mod_,
    arity: Arity::exactly(2),
};

fn mod_(args: &[IodeObject]) -> evaluator::Result {
    let (x, y) = (args[0].as_int()?, args[1].as_int()?);
    if y == 0 {
        return Err(Error::DivideByZero);
    }
    floor_mod(x, y)
        .map(IodeObject::Integer)
        .ok_or(Error::IntegerOverflow)
}

pub static LIBRARY: Library = Library {
    name: "maths",
    functions: &[&SUM, &SUB, &MUL, &DIV, &MOD],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::call_primitive;

    fn call(func: &PrimitiveFn, args: Vec<IodeObject>) -> evaluator::Result {
        call_primitive(func, &args)
    }

    fn int(n: IodeInt) -> IodeObject {
        IodeObject::Integer(n)
    }

    fn ratio(n: IodeInt, d: IodeInt) -> IodeObject {
        IodeObject::Rational(Rational::new(n, d).unwrap())
    }

    #[test]
    fn integer_arithmetic() {
        assert_eq!(call(&SUM, vec![]).unwrap(), int(0));
        assert_eq!(call(&SUM, vec![int(1), int(2), int(3)]).unwrap(), int(6));
        assert_eq!(call(&SUB, vec![int(10), int(4), int(1)]).unwrap(), int(5));
        assert_eq!(call(&SUB, vec![int(4)]).unwrap(), int(-4));
        assert_eq!(call(&MUL, vec![int(2), int(3), int(4)]).unwrap(), int(24));
    }

    #[test]
    fn integer_division_floors() {
        assert_eq!(call(&DIV, vec![int(7), int(2)]).unwrap(), int(3));
        assert_eq!(call(&DIV, vec![int(-7), int(2)]).unwrap(), int(-4));
        assert_eq!(call(&MOD, vec![int(-7), int(2)]).unwrap(), int(1));
        assert_eq!(call(&MOD, vec![int(7), int(-2)]).unwrap(), int(-1));
    }

    #[test]
    fn rationals_stay_exact() {
        assert_eq!(call(&SUM, vec![ratio(1, 2), ratio(1, 3)]).unwrap(), ratio(5, 6));
        assert_eq!(call(&DIV, vec![ratio(1, 2), int(2)]).unwrap(), ratio(1, 4));
        match call(&MUL, vec![ratio(1, 2), int(2)]).unwrap() {
            IodeObject::Integer(1) => (),
            other => panic!("expected the integer 1, got {:?}", other),
        }
    }

    #[test]
    fn floats_are_contagious() {
        match call(&SUM, vec![int(1), IodeObject::Float(0.5), ratio(1, 4)]).unwrap() {
            IodeObject::Float(x) => assert!((x - 1.75).abs() < 1e-9),
            other => panic!("expected a float, got {:?}", other),
        }
    }

    #[test]
    fn errors() {
        assert!(matches!(call(&DIV, vec![int(1), int(0)]), Err(Error::DivideByZero)));
        assert!(matches!(call(&DIV, vec![ratio(1, 2), int(0)]), Err(Error::DivideByZero)));
        assert!(matches!(call(&MOD, vec![int(1), int(0)]), Err(Error::DivideByZero)));
        assert!(matches!(
            call(&SUM, vec![int(IodeInt::MAX), int(1)]),
            Err(Error::IntegerOverflow)
        ));
        assert!(matches!(
            call(&SUM, vec![int(1), IodeObject::from("2")]),
            Err(Error::TypeMismatch(TypeMismatch::NotANumber))
        ));
        assert!(matches!(call(&SUB, vec![]), Err(Error::ArityMismatch(_))));
    }

    #[test]
    fn comparison_across_the_tower() {
        assert_eq!(compare(Number::Integer(1), Number::Float(1.5)), Some(Ordering::Less));
        assert_eq!(
            compare(Number::Rational(Rational::new(3, 2).unwrap()), Number::Integer(1)),
            Some(Ordering::Greater)
        );
        assert_eq!(compare(Number::Float(f64::NAN), Number::Integer(1)), None);
    }
}
