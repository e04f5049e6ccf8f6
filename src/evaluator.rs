use crate::environment::{Environment, UnboundVariable};
use crate::parameters::BadParameters;
use crate::reader::{LoadError, SyntaxError};
use crate::special_forms;
use crate::special_forms::MalformedForm;
use crate::trampoline::{settle, Reduction, TailCall};
use crate::types::{BadArgCount, Callable, Closure, IodeMap, IodeObject, PrimitiveFn, TypeMismatch};

use itertools::Itertools;
use std::fmt;
use std::rc::Rc;

pub type Result<T = IodeObject> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Syntax(SyntaxError),
    Load(LoadError),
    UnboundVariable(UnboundVariable),
    InvalidParameterList(BadParameters),
    ArityMismatch(BadArgCount),
    NotCallable(IodeObject),
    MalformedForm(MalformedForm),
    TypeMismatch(TypeMismatch),
    DivideByZero,
    IntegerOverflow,
    BadFormat(String),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Syntax(e) => write!(f, "{}", e),
            Error::Load(e) => write!(f, "{}", e),
            Error::UnboundVariable(e) => write!(f, "{}", e),
            Error::InvalidParameterList(e) => write!(f, "invalid parameter list: {}", e),
            Error::ArityMismatch(e) => write!(f, "{}", e),
            Error::NotCallable(obj) => write!(f, "cannot apply non-function `{}`", obj),
            Error::MalformedForm(e) => write!(f, "{}", e),
            Error::TypeMismatch(e) => write!(f, "type mismatch: {:?}", e),
            Error::DivideByZero => write!(f, "cannot divide by zero!"),
            Error::IntegerOverflow => write!(f, "integer overflow"),
            Error::BadFormat(e) => write!(f, "bad format string: {}", e),
            Error::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<SyntaxError> for Error {
    fn from(e: SyntaxError) -> Self {
        Self::Syntax(e)
    }
}

impl From<LoadError> for Error {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

impl From<UnboundVariable> for Error {
    fn from(e: UnboundVariable) -> Self {
        Self::UnboundVariable(e)
    }
}

impl From<BadParameters> for Error {
    fn from(e: BadParameters) -> Self {
        Self::InvalidParameterList(e)
    }
}

impl From<BadArgCount> for Error {
    fn from(e: BadArgCount) -> Self {
        Self::ArityMismatch(e)
    }
}

impl From<MalformedForm> for Error {
    fn from(e: MalformedForm) -> Self {
        Self::MalformedForm(e)
    }
}

impl From<TypeMismatch> for Error {
    fn from(t: TypeMismatch) -> Self {
        Self::TypeMismatch(t)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Evaluates `ast` all the way to a value.
pub fn evaluate(ast: &IodeObject, env: &Rc<Environment>) -> Result {
    settle(reduce(ast, env)?)
}

/// Evaluates `ast` except for a call in tail position, which comes back
/// pending so the caller's trampoline can run it.
pub(crate) fn reduce(ast: &IodeObject, env: &Rc<Environment>) -> Result<Reduction> {
    log::trace!("reduce {}", ast);
    match ast {
        IodeObject::Symbol(s) => Ok(Reduction::Value(env.fetch(s)?)),
        IodeObject::Map(map) => evaluate_map(map, env).map(Reduction::Value),
        IodeObject::List(list) => match list.split_first() {
            None | Some((IodeObject::Nil, _)) => Ok(Reduction::Value(IodeObject::Nil)),
            Some((IodeObject::Symbol(name), args)) => match special_forms::lookup(name) {
                Some(form) => special_forms::reduce_form(form, args, env),
                None => reduce_call(&list[0], args, env),
            },
            Some((head, args)) => reduce_call(head, args, env),
        },
        _ => Ok(Reduction::Value(ast.clone())),
    }
}

fn reduce_call(head: &IodeObject, args: &[IodeObject], env: &Rc<Environment>) -> Result<Reduction> {
    match evaluate(head, env)? {
        IodeObject::Callable(Callable::Macro(closure)) => {
            let expansion = expand(&closure, args)?;
            log::trace!("{} expanded to {}", head, expansion);
            reduce(&expansion, env)
        }
        IodeObject::Callable(callable) => {
            let args = evaluate_each(args, env)?;
            apply(&callable, args)
        }
        other => {
            evaluate_each(args, env)?;
            Err(Error::NotCallable(other))
        }
    }
}

/// Applies a function to evaluated arguments. Primitives run straight away,
/// closures are deferred to the trampoline.
pub(crate) fn apply(callable: &Callable, args: Vec<IodeObject>) -> Result<Reduction> {
    match callable {
        Callable::Primitive(f) => call_primitive(f, &args).map(Reduction::Value),
        Callable::Require(loader) => loader.require(&args).map(Reduction::Value),
        _ => Ok(Reduction::Pending(TailCall::new(callable.clone(), args))),
    }
}

/// Performs exactly one invocation. A macro invoked this way has no calling
/// environment, so its expansion is returned as data.
pub(crate) fn invoke(callable: &Callable, args: &[IodeObject]) -> Result<Reduction> {
    match callable {
        Callable::Primitive(f) => call_primitive(f, args).map(Reduction::Value),
        Callable::Require(loader) => loader.require(args).map(Reduction::Value),
        Callable::Function(closure) => run_body(closure, args, "func"),
        Callable::Macro(closure) => expand(closure, args).map(Reduction::Value),
    }
}

/// Runs a macro body against raw argument expressions and returns the
/// replacement expression.
pub(crate) fn expand(closure: &Closure, args: &[IodeObject]) -> Result {
    settle(run_body(closure, args, "macro")?)
}

/// Used by primitives which call back into the language, such as `map`.
pub(crate) fn apply_fully(callable: &IodeObject, args: &[IodeObject]) -> Result {
    match callable {
        IodeObject::Callable(c) => settle(invoke(c, args)?),
        other => Err(Error::NotCallable(other.clone())),
    }
}

/// Evaluates every expression but the last, then reduces the last one.
/// An empty body is `nil`.
pub(crate) fn reduce_body(body: &[IodeObject], env: &Rc<Environment>) -> Result<Reduction> {
    match body.split_last() {
        None => Ok(Reduction::Value(IodeObject::Nil)),
        Some((last, init)) => {
            for expr in init {
                evaluate(expr, env)?;
            }
            reduce(last, env)
        }
    }
}

fn run_body(closure: &Closure, args: &[IodeObject], name: &'static str) -> Result<Reduction> {
    let env = make_closure_env(closure, args, name)?;
    reduce_body(&closure.body, &env)
}

fn evaluate_map(map: &IodeMap, env: &Rc<Environment>) -> Result {
    let mut evaluated = IodeMap::default();
    for (key, value) in map.iter() {
        evaluated.assoc(evaluate(key, env)?, evaluate(value, env)?);
    }
    Ok(IodeObject::wrap_map(evaluated))
}

pub fn evaluate_each(seq: &[IodeObject], env: &Rc<Environment>) -> Result<Vec<IodeObject>> {
    seq.iter().map(|obj| evaluate(obj, env)).collect()
}

pub(crate) fn pretty_print_args(args: &[IodeObject]) -> String {
    match args.len() {
        0 => "no args".into(),
        1 => args[0].to_string(),
        _ => format!("\n\t{}", args.iter().join("\n\t")),
    }
}

pub fn call_primitive(func: &PrimitiveFn, args: &[IodeObject]) -> Result {
    func.arity.validate_for(args.len(), func.name)?;
    log::trace!("Call {} with {}", func.name, pretty_print_args(args));
    let result = (func.fn_ptr)(args);
    match &result {
        Ok(val) => log::trace!("Call to {} resulted in {}", func.name, val),
        Err(e) => log::trace!("Call to {} failed: {}", func.name, e),
    }
    result
}

fn make_closure_env(closure: &Closure, args: &[IodeObject], name: &'static str) -> Result<Rc<Environment>> {
    log::trace!("Call {} {} with {}", name, closure.parameters, pretty_print_args(args));
    let bindings = closure.parameters.bind(args, name)?;
    Ok(Environment::child(&closure.parent, bindings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library;
    use crate::reader::read_str;
    use crate::special_forms::{Problem, SpecialForm};
    use crate::types::Arity;

    fn standard_env() -> Rc<Environment> {
        let env = Environment::root();
        library::install_all(library::STANDARD, &env);
        env
    }

    fn eval_in(env: &Rc<Environment>, source: &str) -> Result {
        evaluate(&read_str(source)?, env)
    }

    fn eval(source: &str) -> Result {
        eval_in(&standard_env(), source)
    }

    #[test]
    fn atoms_evaluate_to_themselves() {
        assert_eq!(eval("42").unwrap(), IodeObject::Integer(42));
        assert_eq!(eval(r#""hi""#).unwrap(), IodeObject::from("hi"));
        assert_eq!(eval("nil").unwrap(), IodeObject::Nil);
    }

    #[test]
    fn empty_list_and_nil_head_are_nil() {
        assert_eq!(eval("()").unwrap(), IodeObject::Nil);
        assert_eq!(eval("(nil 1 2)").unwrap(), IodeObject::Nil);
    }

    #[test]
    fn map_literals_evaluate_keys_and_values() {
        let env = standard_env();
        eval_in(&env, "(def k \"key\")").unwrap();
        let map = eval_in(&env, "{k (+ 1 2), \"key\" 4}").unwrap();
        let map = map.as_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.lookup(&"key".into()), Some(&IodeObject::Integer(4)));
    }

    #[test]
    fn unbound_symbols_fail() {
        assert!(matches!(eval("missing"), Err(Error::UnboundVariable(_))));
    }

    #[test]
    fn non_callable_head_fails() {
        match eval("(1 2 3)") {
            Err(Error::NotCallable(obj)) => assert_eq!(obj, IodeObject::Integer(1)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn closure_arity_is_checked() {
        match eval("((func (a b) a) 1)") {
            Err(Error::ArityMismatch(e)) => {
                assert_eq!(e.name, "func");
                assert_eq!(e.expected, Arity::exactly(2));
                assert_eq!(e.got, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bodies_yield_their_last_value() {
        assert_eq!(eval("((func () 1 2 3))").unwrap(), IodeObject::Integer(3));
        assert_eq!(eval("((func ()))").unwrap(), IodeObject::Nil);
    }

    #[test]
    fn macros_see_raw_arguments() {
        let env = standard_env();
        eval_in(&env, "(def quote-it (macro (x) (list 'quote x)))").unwrap();
        assert_eq!(
            eval_in(&env, "(quote-it (undefined thing))").unwrap(),
            read_str("(undefined thing)").unwrap()
        );
    }

    #[test]
    fn macro_expansion_is_evaluated_in_the_caller() {
        let env = standard_env();
        eval_in(&env, "(def swap-call (macro (a b f) (list f b a)))").unwrap();
        eval_in(&env, "(def x 10)").unwrap();
        assert_eq!(eval_in(&env, "(swap-call 1 x -)").unwrap(), IodeObject::Integer(9));
    }

    #[test]
    fn apply_fully_settles_closures() {
        let env = standard_env();
        let double = eval_in(&env, "(func (x) (* x 2))").unwrap();
        let result = apply_fully(&double, &[IodeObject::Integer(21)]).unwrap();
        assert_eq!(result, IodeObject::Integer(42));
        assert!(matches!(
            apply_fully(&IodeObject::Nil, &[]),
            Err(Error::NotCallable(IodeObject::Nil))
        ));
    }

    #[test]
    fn malformed_forms_are_reported() {
        match eval("(if)") {
            Err(Error::MalformedForm(e)) => {
                assert_eq!(e.form, SpecialForm::If);
                assert_eq!(
                    e.problem,
                    Problem::WrongArgCount {
                        expected: Arity::Between(2..=3),
                        got: 0
                    }
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn errors_display_readably() {
        let err = eval("(undefined-fn 1)").unwrap_err();
        assert_eq!(err.to_string(), "reference to undefined variable `undefined-fn`");
        let err = eval("(/ 1 0)").unwrap_err();
        assert_eq!(err.to_string(), "cannot divide by zero!");
    }
}
