use crate::environment::Environment;
use crate::evaluator;
use crate::library::{self, Library};
use crate::reader::{self, FsLoader, LoadError, SourceLoader};
use crate::types::{Arity, Callable, IodeObject};
use itertools::Itertools;
use std::fmt;
use std::io;
use std::path::Path;
use std::rc::{Rc, Weak};

const PRELUDE: &str = include_str!("prelude.io");

/// Owns a root environment. Everything a program defines at top level lands
/// there.
pub struct Interpreter {
    root: Rc<Environment>,
}

impl Interpreter {
    /// The standard libraries, `require` reading from the filesystem, and the
    /// prelude.
    pub fn new() -> evaluator::Result<Self> {
        let interpreter = Self::with_libraries(library::STANDARD);
        interpreter.provide_require(Rc::new(FsLoader));
        interpreter.run(PRELUDE)?;
        Ok(interpreter)
    }

    /// A root environment holding exactly the given libraries, without the
    /// prelude.
    pub fn with_libraries(libraries: &[&Library]) -> Self {
        let root = Environment::root();
        library::install_all(libraries, &root);
        Self { root }
    }

    /// Binds `require` in the root, so that programs can load modules
    /// themselves through `loader`.
    pub fn provide_require(&self, loader: Rc<dyn SourceLoader>) {
        let require = ModuleLoader {
            root: Rc::downgrade(&self.root),
            loader,
        };
        self.root
            .define("require", IodeObject::Callable(Callable::Require(Rc::new(require))));
    }

    pub fn root(&self) -> &Rc<Environment> {
        &self.root
    }

    pub fn run(&self, source: &str) -> evaluator::Result {
        self.evaluate(&reader::read_str(source)?)
    }

    pub fn evaluate(&self, ast: &IodeObject) -> evaluator::Result {
        evaluator::evaluate(ast, &self.root)
    }

    /// Evaluates a source file in its own frame below the root and returns
    /// its last value. Its definitions stay private to that frame.
    pub fn require(&self, path: &Path, loader: &dyn SourceLoader) -> evaluator::Result {
        load_module(&self.root, path, loader).map(|(value, _)| value)
    }

    /// Like `require`, then copies the module's definitions into `into`.
    pub fn import(&self, path: &Path, loader: &dyn SourceLoader, into: &Environment) -> evaluator::Result {
        let (value, module) = load_module(&self.root, path, loader)?;
        into.absorb(&module);
        Ok(value)
    }
}

fn load_module(
    root: &Rc<Environment>,
    path: &Path,
    loader: &dyn SourceLoader,
) -> evaluator::Result<(IodeObject, Rc<Environment>)> {
    log::debug!("loading module {}", path.display());
    let ast = reader::read_file(path, loader)?;
    let module = Environment::spawn_from(root);
    let value = evaluator::evaluate(&ast, &module)?;
    log::debug!(
        "module {} defines {}",
        path.display(),
        module.names().iter().join(" ")
    );
    Ok((value, module))
}

/// What `require` is bound to. The root is held weakly because the root in
/// turn holds this.
pub struct ModuleLoader {
    root: Weak<Environment>,
    loader: Rc<dyn SourceLoader>,
}

impl ModuleLoader {
    const ARITY: Arity = Arity::exactly(1);

    /// `(require "path")`: the file's last value. Paths are taken as given,
    /// relative to the working directory.
    pub(crate) fn require(&self, args: &[IodeObject]) -> evaluator::Result {
        Self::ARITY.validate_for(args.len(), "require")?;
        let path = Path::new(args[0].as_string()?);
        let root = self.root.upgrade().ok_or_else(|| {
            LoadError::Io(
                path.to_owned(),
                io::Error::new(io::ErrorKind::Other, "its interpreter no longer exists"),
            )
        })?;
        load_module(&root, path, self.loader.as_ref()).map(|(value, _)| value)
    }
}

impl fmt::Debug for ModuleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleLoader")
    }
}

/// Runs a program in a fresh standard interpreter.
pub fn run(source: &str) -> evaluator::Result {
    Interpreter::new()?.run(source)
}
