use crate::environment::Environment;
use crate::evaluator::{self, evaluate, expand, reduce, reduce_body, Error, Result};
use crate::parameters::ParameterSpec;
use crate::trampoline::Reduction;
use crate::types::{truthy, Arity, Callable, Closure, IodeObject, IodeSymbol};

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Forms the evaluator recognises by name before looking anything up, so a
/// binding can never shadow them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialForm {
    Quote,
    Quasiquote,
    If,
    Progn,
    Set,
    Def,
    Func,
    Macro,
    Apply,
    Eval,
}

impl SpecialForm {
    pub fn name(self) -> &'static str {
        use SpecialForm::*;
        match self {
            Quote => "quote",
            Quasiquote => "quasiquote",
            If => "if",
            Progn => "progn",
            Set => "set!",
            Def => "def",
            Func => "func",
            Macro => "macro",
            Apply => "apply",
            Eval => "eval",
        }
    }

    fn operands(self) -> Arity {
        use SpecialForm::*;
        match self {
            Quote | Quasiquote | Eval => Arity::exactly(1),
            If => Arity::Between(2..=3),
            Progn => Arity::at_least(0),
            Set | Def | Apply => Arity::exactly(2),
            Func | Macro => Arity::at_least(1),
        }
    }
}

impl fmt::Display for SpecialForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

lazy_static! {
    static ref SPECIAL_FORMS: HashMap<&'static str, SpecialForm> = {
        use SpecialForm::*;
        [Quote, Quasiquote, If, Progn, Set, Def, Func, Macro, Apply, Eval]
            .iter()
            .map(|&form| (form.name(), form))
            .collect()
    };
}

pub fn lookup(name: &IodeSymbol) -> Option<SpecialForm> {
    SPECIAL_FORMS.get(name.as_str()).copied()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Problem {
    WrongArgCount { expected: Arity, got: usize },
    NameNotASymbol,
    ParametersNotGivenAsList,
    ParameterNotASymbol,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MalformedForm {
    pub form: SpecialForm,
    pub problem: Problem,
}

impl fmt::Display for MalformedForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed `{}`: ", self.form)?;
        match &self.problem {
            Problem::WrongArgCount { expected, got } => {
                write!(f, "expected {} operands, but received {}", expected, got)
            }
            Problem::NameNotASymbol => write!(f, "the name to bind must be a symbol"),
            Problem::ParametersNotGivenAsList => write!(f, "parameters must be given as a list"),
            Problem::ParameterNotASymbol => write!(f, "every parameter must be a symbol"),
        }
    }
}

impl std::error::Error for MalformedForm {}

fn malformed(form: SpecialForm, problem: Problem) -> Error {
    Error::MalformedForm(MalformedForm { form, problem })
}

pub(crate) fn reduce_form(form: SpecialForm, args: &[IodeObject], env: &Rc<Environment>) -> Result<Reduction> {
    let expected = form.operands();
    if !expected.contains(args.len()) {
        let got = args.len();
        return Err(malformed(form, Problem::WrongArgCount { expected, got }));
    }
    log::trace!("special form {} with {} operands", form, args.len());

    use SpecialForm::*;
    match form {
        // There is no unquote, so quasiquote is plain quotation.
        Quote | Quasiquote => Ok(Reduction::Value(args[0].clone())),
        If => apply_if(args, env),
        Progn => reduce_body(args, env),
        Set => apply_set(args, env).map(Reduction::Value),
        Def => apply_def(args, env).map(Reduction::Value),
        Func => make_closure(form, args, env)
            .map(|c| Reduction::Value(IodeObject::Callable(Callable::Function(c)))),
        Macro => make_closure(form, args, env)
            .map(|c| Reduction::Value(IodeObject::Callable(Callable::Macro(c)))),
        Apply => apply_apply(args, env),
        Eval => {
            let expr = evaluate(&args[0], env)?;
            reduce(&expr, env)
        }
    }
}

fn apply_if(args: &[IodeObject], env: &Rc<Environment>) -> Result<Reduction> {
    let condition = evaluate(&args[0], env)?;
    if truthy(&condition) {
        reduce(&args[1], env)
    } else if let Some(alternative) = args.get(2) {
        reduce(alternative, env)
    } else {
        Ok(Reduction::Value(IodeObject::Nil))
    }
}

fn binding_name(form: SpecialForm, obj: &IodeObject) -> Result<&IodeSymbol> {
    obj.as_symbol()
        .map_err(|_| malformed(form, Problem::NameNotASymbol))
}

fn apply_set(args: &[IodeObject], env: &Rc<Environment>) -> Result {
    let name = binding_name(SpecialForm::Set, &args[0])?;
    let value = evaluate(&args[1], env)?;
    Ok(env.assign(name, value)?)
}

fn apply_def(args: &[IodeObject], env: &Rc<Environment>) -> Result {
    let name = binding_name(SpecialForm::Def, &args[0])?;
    let value = evaluate(&args[1], env)?;
    log::debug!("define {} as {}", name, value);
    env.define(name.clone(), value.clone());
    Ok(value)
}

fn make_closure(form: SpecialForm, args: &[IodeObject], env: &Rc<Environment>) -> Result<Rc<Closure>> {
    let (parameters, body) = (&args[0], &args[1..]);
    let parameters = parameters
        .as_seq()
        .map_err(|_| malformed(form, Problem::ParametersNotGivenAsList))?;
    let names = parameters
        .iter()
        .map(|obj| obj.as_symbol().map(IodeSymbol::clone))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| malformed(form, Problem::ParameterNotASymbol))?;

    Ok(Rc::new(Closure {
        parameters: ParameterSpec::compile(names)?,
        body: body.to_vec(),
        parent: env.clone(),
    }))
}

/// `(apply f list)`: a function receives the list's elements as its
/// arguments. A macro receives them as raw expressions and its expansion is
/// evaluated here.
fn apply_apply(args: &[IodeObject], env: &Rc<Environment>) -> Result<Reduction> {
    let callee = evaluate(&args[0], env)?;
    let list = evaluate(&args[1], env)?;
    let elements = list.as_seq()?.to_vec();
    match callee {
        IodeObject::Callable(Callable::Macro(closure)) => {
            let expansion = expand(&closure, &elements)?;
            reduce(&expansion, env)
        }
        IodeObject::Callable(callable) => evaluator::apply(&callable, elements),
        other => Err(Error::NotCallable(other)),
    }
}
