use crate::types::{Arity, BadArgCount, IodeObject, IodeSymbol};
use itertools::Itertools;
use std::fmt;
use std::fmt::Formatter;

/// A compiled parameter list: `(a b & rest x y)` has singles `a b`, the
/// variadic name `rest` and trailing names `x y`, which always take the last
/// arguments of a call however many land in `rest`.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterSpec {
    singles: Vec<IodeSymbol>,
    variadic: Option<IodeSymbol>,
    trailing: Vec<IodeSymbol>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BadParameters {
    TooManyAmpersands(usize),
    MissingVariadicName,
}

impl fmt::Display for BadParameters {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BadParameters::TooManyAmpersands(n) => write!(
                f,
                "functions cannot declare more than one variadic parameter (found {} `&`)",
                n
            ),
            BadParameters::MissingVariadicName => write!(f, "`&` must be followed by a name"),
        }
    }
}

impl std::error::Error for BadParameters {}

impl ParameterSpec {
    pub fn compile(mut names: Vec<IodeSymbol>) -> Result<Self, BadParameters> {
        let ampersand_count = names.iter().filter(|s| s.is_ampersand()).count();
        if ampersand_count > 1 {
            return Err(BadParameters::TooManyAmpersands(ampersand_count));
        }

        match names.iter().position(|s| s.is_ampersand()) {
            None => Ok(ParameterSpec {
                singles: names,
                variadic: None,
                trailing: Vec::new(),
            }),
            Some(position) => {
                let mut after = names.split_off(position).into_iter().skip(1);
                let variadic = after.next().ok_or(BadParameters::MissingVariadicName)?;
                Ok(ParameterSpec {
                    singles: names,
                    variadic: Some(variadic),
                    trailing: after.collect(),
                })
            }
        }
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic.is_some()
    }

    pub fn arity(&self) -> Arity {
        let fixed = self.singles.len() + self.trailing.len();
        if self.is_variadic() {
            Arity::at_least(fixed)
        } else {
            Arity::exactly(fixed)
        }
    }

    /// Pairs each name with its argument. A name repeated in the list is
    /// bound more than once; the last pair wins once inserted into a frame.
    pub fn bind(
        &self,
        args: &[IodeObject],
        name: &'static str,
    ) -> Result<Vec<(IodeSymbol, IodeObject)>, BadArgCount> {
        self.arity().validate_for(args.len(), name)?;

        let (singles, rest) = args.split_at(self.singles.len());
        let (middle, trailing) = rest.split_at(rest.len() - self.trailing.len());

        let mut bindings = Vec::with_capacity(self.singles.len() + self.trailing.len() + 1);
        bindings.extend(self.singles.iter().cloned().zip(singles.iter().cloned()));
        if let Some(variadic) = &self.variadic {
            bindings.push((variadic.clone(), IodeObject::wrap_list(middle.to_vec())));
        }
        bindings.extend(self.trailing.iter().cloned().zip(trailing.iter().cloned()));
        Ok(bindings)
    }
}

impl fmt::Display for ParameterSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.singles.iter().join(" "))?;
        if let Some(rest) = &self.variadic {
            if !self.singles.is_empty() {
                write!(f, " ")?;
            }
            write!(f, "& {}", rest)?;
            for name in &self.trailing {
                write!(f, " {}", name)?;
            }
        }
        write!(f, ")")
    }
}
