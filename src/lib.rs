pub mod cmdline;
pub mod environment;
pub mod evaluator;
pub mod interpreter;
pub mod library;
pub mod parameters;
pub mod printer;
pub mod reader;
pub mod special_forms;
pub mod types;

#[macro_use]
extern crate lazy_static;

mod strings;
mod tokens;
mod trampoline;

pub use interpreter::{run, Interpreter};
pub use types::IodeObject;
