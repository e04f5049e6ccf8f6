use crate::environment::Environment;
use crate::evaluator;
use crate::interpreter::ModuleLoader;
use crate::parameters::ParameterSpec;
use derive_more::{Deref, DerefMut};
use regex::Regex;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::fmt::Formatter;
use std::ops::{RangeFrom, RangeInclusive};
use std::rc::Rc;

#[derive(Deref, DerefMut, Debug, Default)]
pub struct IodeList(pub Vec<IodeObject>);

/// Key/value pairs in source order. Insertion replaces an existing key in
/// place, so a map built through `assoc` never holds duplicates.
#[derive(Deref, DerefMut, Debug, Default, Clone)]
pub struct IodeMap(pub Vec<(IodeObject, IodeObject)>);

impl IodeMap {
    pub fn lookup(&self, key: &IodeObject) -> Option<&IodeObject> {
        self.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn assoc(&mut self, key: IodeObject, value: IodeObject) {
        match self.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.push((key, value)),
        }
    }

    pub fn dissoc(&mut self, key: &IodeObject) {
        self.retain(|(k, _)| k != key);
    }

    pub fn merge(&mut self, other: &IodeMap) {
        for (key, value) in other.iter() {
            self.assoc(key.clone(), value.clone());
        }
    }
}

pub type IodeInt = i64;

thread_local! {
    static SYMBOLS: RefCell<HashSet<Rc<str>>> = RefCell::new(HashSet::new());
}

/// An interned name. Two symbols with the same text share one allocation.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct IodeSymbol(Rc<str>);

impl IodeSymbol {
    pub fn new(name: &str) -> Self {
        SYMBOLS.with(|symbols| {
            let mut symbols = symbols.borrow_mut();
            if let Some(existing) = symbols.get(name) {
                return IodeSymbol(existing.clone());
            }
            let interned: Rc<str> = Rc::from(name);
            symbols.insert(interned.clone());
            IodeSymbol(interned)
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn is_ampersand(&self) -> bool {
        self.as_str() == "&"
    }
}

impl AsRef<str> for IodeSymbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for IodeSymbol {
    fn from(name: &str) -> Self {
        IodeSymbol::new(name)
    }
}

impl fmt::Display for IodeSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An exact fraction, always stored in lowest terms with a positive denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    numer: IodeInt,
    denom: IodeInt,
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl Rational {
    /// `None` for a zero denominator or when normalising overflows.
    pub fn new(numer: IodeInt, denom: IodeInt) -> Option<Self> {
        if denom == 0 {
            return None;
        }
        let (numer, denom) = if denom < 0 {
            (numer.checked_neg()?, denom.checked_neg()?)
        } else {
            (numer, denom)
        };
        let divisor = gcd(numer.unsigned_abs(), denom as u64) as IodeInt;
        Some(Self {
            numer: numer / divisor,
            denom: denom / divisor,
        })
    }

    pub fn from_int(n: IodeInt) -> Self {
        Self { numer: n, denom: 1 }
    }

    pub fn numer(&self) -> IodeInt {
        self.numer
    }

    pub fn denom(&self) -> IodeInt {
        self.denom
    }

    pub fn to_f64(&self) -> f64 {
        self.numer as f64 / self.denom as f64
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        let numer = self
            .numer
            .checked_mul(rhs.denom)?
            .checked_add(rhs.numer.checked_mul(self.denom)?)?;
        Rational::new(numer, self.denom.checked_mul(rhs.denom)?)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.checked_add(Rational::new(rhs.numer.checked_neg()?, rhs.denom)?)
    }

    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        Rational::new(
            self.numer.checked_mul(rhs.numer)?,
            self.denom.checked_mul(rhs.denom)?,
        )
    }

    /// Callers must rule out a zero divisor first; `None` here means overflow.
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        Rational::new(
            self.numer.checked_mul(rhs.denom)?,
            self.denom.checked_mul(rhs.numer)?,
        )
    }

    pub fn is_zero(&self) -> bool {
        self.numer == 0
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        let lhs = self.numer as i128 * other.denom as i128;
        let rhs = other.numer as i128 * self.denom as i128;
        lhs.partial_cmp(&rhs)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numer, self.denom)
    }
}

/// A regexp literal: the pattern text as written, plus its compiled form.
pub struct IodeRegexp {
    pub source: String,
    pub compiled: Regex,
}

impl IodeRegexp {
    pub fn new(source: String) -> Result<Self, regex::Error> {
        let compiled = Regex::new(&source)?;
        Ok(Self { source, compiled })
    }
}

impl fmt::Debug for IodeRegexp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "IodeRegexp(/{}/)", self.source)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arity {
    Between(RangeInclusive<usize>),
    AtLeast(RangeFrom<usize>),
    Even,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BadArgCount {
    pub name: &'static str,
    pub expected: Arity,
    pub got: usize,
}

impl fmt::Display for BadArgCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "When evaluating {} expected {} arguments, but received {} arguments",
            self.name, self.expected, self.got
        )
    }
}

impl std::error::Error for BadArgCount {}

impl Arity {
    pub const fn exactly(n: usize) -> Self {
        Self::Between(n..=n)
    }

    pub const fn at_least(n: usize) -> Self {
        Self::AtLeast(n..)
    }

    pub fn contains(&self, n: usize) -> bool {
        match self {
            Self::Between(range) => range.contains(&n),
            Self::AtLeast(range) => range.contains(&n),
            Self::Even => n % 2 == 0,
        }
    }

    pub fn validate_for(&self, n: usize, name: &'static str) -> Result<(), BadArgCount> {
        match self.contains(n) {
            true => Ok(()),
            false => Err(BadArgCount {
                name,
                expected: self.clone(),
                got: n,
            }),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Between(r) => {
                if r.start() == r.end() {
                    write!(f, "exactly {}", r.start())
                } else {
                    write!(f, "from {} to {}", r.start(), r.end())
                }
            }
            Arity::AtLeast(r) => write!(f, "at least {}", r.start),
            Arity::Even => write!(f, "an even number of"),
        }
    }
}

pub struct PrimitiveFn {
    pub name: &'static str,
    pub arity: Arity,
    pub fn_ptr: fn(&[IodeObject]) -> evaluator::Result,
}

impl fmt::Debug for PrimitiveFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "primitive function #<{}>", self.name)
    }
}

#[derive(Clone)]
pub struct Closure {
    pub parameters: ParameterSpec,
    pub body: Vec<IodeObject>,
    pub parent: Rc<Environment>,
}

impl fmt::Debug for Closure {
    // Not derived because we want to skip the parent: the parent may well contain this Closure!
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Closure{{parameters: {:?}, body: {:?}}}",
            self.parameters, self.body
        )
    }
}

/// Anything that can sit at the head of a call. The variant decides whether
/// the call site evaluates its arguments.
#[derive(Debug, Clone)]
pub enum Callable {
    Function(Rc<Closure>),
    Macro(Rc<Closure>),
    Primitive(&'static PrimitiveFn),
    /// `require`, bound in the root by `Interpreter::new`.
    Require(Rc<ModuleLoader>),
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        use Callable::*;
        match (self, other) {
            (Function(x), Function(y)) | (Macro(x), Macro(y)) => Rc::ptr_eq(x, y),
            (Primitive(x), Primitive(y)) => x.name == y.name,
            (Require(x), Require(y)) => Rc::ptr_eq(x, y),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum IodeObject {
    Nil,
    Bool(bool),
    Integer(IodeInt),
    Float(f64),
    Rational(Rational),
    String(String),
    Regexp(Rc<IodeRegexp>),
    Symbol(IodeSymbol),
    List(Rc<IodeList>),
    Map(Rc<IodeMap>),
    Callable(Callable),
}

/// Everything except `nil` and `false` counts as true, including `0` and `()`.
pub(crate) fn truthy(obj: &IodeObject) -> bool {
    !matches!(obj, IodeObject::Nil | IodeObject::Bool(false))
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeMismatch {
    NotANumber,
    NotAnInteger,
    NotAList,
    NotAMap,
    NotASymbol,
    NotAString,
    NotARegexp,
    NotComparable,
}

impl IodeObject {
    pub(crate) fn as_int(&self) -> Result<IodeInt, TypeMismatch> {
        match self {
            IodeObject::Integer(x) => Ok(*x),
            _ => Err(TypeMismatch::NotAnInteger),
        }
    }

    /// The elements of a list. `nil` reads as the empty list.
    pub(crate) fn as_seq(&self) -> Result<&[IodeObject], TypeMismatch> {
        match self {
            IodeObject::List(x) => Ok(x),
            IodeObject::Nil => Ok(&[]),
            _ => Err(TypeMismatch::NotAList),
        }
    }

    pub(crate) fn as_map(&self) -> Result<&IodeMap, TypeMismatch> {
        match self {
            IodeObject::Map(x) => Ok(x),
            _ => Err(TypeMismatch::NotAMap),
        }
    }

    pub(crate) fn as_symbol(&self) -> Result<&IodeSymbol, TypeMismatch> {
        match self {
            IodeObject::Symbol(s) => Ok(s),
            _ => Err(TypeMismatch::NotASymbol),
        }
    }

    pub(crate) fn as_string(&self) -> Result<&str, TypeMismatch> {
        match self {
            IodeObject::String(s) => Ok(s),
            _ => Err(TypeMismatch::NotAString),
        }
    }

    pub(crate) fn as_regexp(&self) -> Result<&IodeRegexp, TypeMismatch> {
        match self {
            IodeObject::Regexp(r) => Ok(r),
            _ => Err(TypeMismatch::NotARegexp),
        }
    }
}

impl IodeObject {
    pub fn new_list() -> Self {
        Self::List(Rc::new(IodeList(Vec::new())))
    }
    pub fn wrap_list(elements: Vec<IodeObject>) -> Self {
        Self::List(Rc::new(IodeList(elements)))
    }
    pub fn wrap_map(map: IodeMap) -> Self {
        Self::Map(Rc::new(map))
    }
    pub fn new_symbol(name: &str) -> Self {
        Self::Symbol(IodeSymbol::new(name))
    }
}

impl From<IodeInt> for IodeObject {
    fn from(n: IodeInt) -> Self {
        IodeObject::Integer(n)
    }
}

impl From<&str> for IodeObject {
    fn from(s: &str) -> Self {
        IodeObject::String(s.into())
    }
}

impl From<Vec<IodeObject>> for IodeObject {
    fn from(elements: Vec<IodeObject>) -> Self {
        IodeObject::wrap_list(elements)
    }
}

fn numeric_eq(x: &IodeObject, y: &IodeObject) -> Option<bool> {
    use IodeObject::*;
    let result = match (x, y) {
        (Integer(a), Integer(b)) => a == b,
        (Integer(a), Rational(r)) | (Rational(r), Integer(a)) => *r == self::Rational::from_int(*a),
        (Rational(a), Rational(b)) => a == b,
        (Float(a), Float(b)) => a == b,
        (Float(f), Integer(i)) | (Integer(i), Float(f)) => *f == *i as f64,
        (Float(f), Rational(r)) | (Rational(r), Float(f)) => *f == r.to_f64(),
        _ => return None,
    };
    Some(result)
}

impl PartialEq for IodeObject {
    fn eq(&self, other: &Self) -> bool {
        use IodeObject::*;
        if let Some(result) = numeric_eq(self, other) {
            return result;
        }
        match (self, other) {
            (Nil, Nil) => true,
            (Bool(x), Bool(y)) => x == y,
            (String(x), String(y)) => x == y,
            (Regexp(x), Regexp(y)) => x.source == y.source,
            (Symbol(x), Symbol(y)) => x == y,
            (List(x), List(y)) => equal_sequences(x, y),
            (Map(x), Map(y)) => {
                x.len() == y.len()
                    && x.iter().all(|(k, v)| y.lookup(k).map_or(false, |w| v == w))
            }
            (Callable(x), Callable(y)) => x == y,
            _ => false,
        }
    }
}

fn equal_sequences(xs: &[IodeObject], ys: &[IodeObject]) -> bool {
    xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| x == y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rationals_are_normalised() {
        let half = Rational::new(2, 4).unwrap();
        assert_eq!((half.numer(), half.denom()), (1, 2));
        let negative = Rational::new(3, -6).unwrap();
        assert_eq!((negative.numer(), negative.denom()), (-1, 2));
        assert_eq!(Rational::new(0, 7), Some(Rational::from_int(0)));
        assert_eq!(Rational::new(1, 0), None);
    }

    #[test]
    fn rational_arithmetic() {
        let third = Rational::new(1, 3).unwrap();
        let sixth = Rational::new(1, 6).unwrap();
        assert_eq!(third.checked_add(sixth), Rational::new(1, 2));
        assert_eq!(third.checked_sub(sixth), Rational::new(1, 6));
        assert_eq!(third.checked_mul(sixth), Rational::new(1, 18));
        assert_eq!(third.checked_div(sixth), Rational::new(2, 1));
        assert!(third > sixth);
    }

    #[test]
    fn symbols_are_interned() {
        let IodeSymbol(a) = IodeSymbol::new("lambda");
        let IodeSymbol(b) = IodeSymbol::new("lambda");
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn numbers_compare_across_representations() {
        let two = IodeObject::Integer(2);
        assert_eq!(two, IodeObject::Rational(Rational::new(4, 2).unwrap()));
        assert_eq!(two, IodeObject::Float(2.0));
        assert_ne!(two, IodeObject::String("2".into()));
    }

    #[test]
    fn map_assoc_replaces_in_place() {
        let mut map = IodeMap::default();
        map.assoc("a".into(), IodeObject::Integer(1));
        map.assoc("b".into(), IodeObject::Integer(2));
        map.assoc("a".into(), IodeObject::Integer(3));
        assert_eq!(map.len(), 2);
        assert_eq!(map[0].1, IodeObject::Integer(3));
        assert_eq!(map.lookup(&"b".into()), Some(&IodeObject::Integer(2)));
        map.dissoc(&"a".into());
        assert_eq!(map.lookup(&"a".into()), None);
    }

    #[test]
    fn only_nil_and_false_are_falsy() {
        assert!(!truthy(&IodeObject::Nil));
        assert!(!truthy(&IodeObject::Bool(false)));
        assert!(truthy(&IodeObject::Integer(0)));
        assert!(truthy(&IodeObject::new_list()));
    }
}
