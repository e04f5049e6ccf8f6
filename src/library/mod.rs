//! Primitive functions, grouped into libraries which are installed into a
//! root environment explicitly. Nothing is registered globally.

use crate::environment::Environment;
use crate::types::{Callable, IodeObject, PrimitiveFn};

pub mod comparisons;
pub mod lists;
pub mod maps;
pub mod maths;
pub mod output;
pub mod strings;

#[derive(Debug)]
pub struct Library {
    pub name: &'static str,
    pub functions: &'static [&'static PrimitiveFn],
}

impl Library {
    pub fn install(&self, env: &Environment) {
        log::debug!("installing library {} ({} functions)", self.name, self.functions.len());
        for &func in self.functions {
            env.define(func.name, IodeObject::Callable(Callable::Primitive(func)));
        }
    }
}

/// Everything `Interpreter::new` installs.
pub static STANDARD: &[&Library] = &[
    &maths::LIBRARY,
    &comparisons::LIBRARY,
    &lists::LIBRARY,
    &maps::LIBRARY,
    &strings::LIBRARY,
    &output::LIBRARY,
];

pub fn install_all(libraries: &[&Library], env: &Environment) {
    for library in libraries {
        library.install(env);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IodeSymbol;

    #[test]
    fn installs_only_what_it_is_given() {
        let env = Environment::root();
        install_all(&[&maths::LIBRARY], &env);
        assert!(env.defines(&IodeSymbol::new("+")));
        assert!(!env.defines(&IodeSymbol::new("list")));
    }

    #[test]
    fn standard_names_are_unique() {
        let mut names: Vec<&str> = STANDARD
            .iter()
            .flat_map(|library| library.functions.iter().map(|f| f.name))
            .collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
