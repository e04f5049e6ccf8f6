use crate::evaluator;
use crate::interpreter::Interpreter;
use crate::printer::{pr_str, PrintMode};
use crate::reader::{self, FsLoader};
use ansi_term::Colour::Red;
use linefeed::{DefaultTerminal, Interface, ReadResult, Terminal};
use std::fmt;
use std::path::PathBuf;

const USAGE: &str = "usage: iode [-r MODULE]... [SCRIPT]";

#[derive(Debug)]
pub enum Error {
    Usage(String),
    Io(std::io::Error),
    Eval(evaluator::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Usage(problem) => write!(f, "{}\n{}", problem, USAGE),
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Eval(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<evaluator::Error> for Error {
    fn from(e: evaluator::Error) -> Self {
        Self::Eval(e)
    }
}

/// What to do, as given on the command line.
#[derive(Debug, Default, PartialEq)]
pub struct Config {
    /// Files imported into the root environment before anything else runs.
    pub modules: Vec<PathBuf>,
    /// Run this and exit. Without one we start a REPL.
    pub script: Option<PathBuf>,
}

impl Config {
    /// `args[0]` is the program name, as with `std::env::args`.
    pub fn from_args(args: &[String]) -> Result<Self, Error> {
        let mut config = Config::default();
        let mut args = args.iter().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-r" => match args.next() {
                    Some(module) => config.modules.push(module.into()),
                    None => return Err(Error::Usage("-r needs a module to load".into())),
                },
                flag if flag.starts_with('-') => {
                    return Err(Error::Usage(format!("unknown option {}", flag)))
                }
                script if config.script.is_none() => config.script = Some(script.into()),
                _ => return Err(Error::Usage("only one script can be run".into())),
            }
        }
        Ok(config)
    }
}

pub fn setup() -> std::io::Result<Interface<DefaultTerminal>> {
    let interface = linefeed::Interface::new("iode")?;
    interface.set_prompt("iode> ")?;
    if let Some(path) = history_path() {
        interface.load_history(path).ok();
    };
    Ok(interface)
}

fn history_path() -> Option<PathBuf> {
    match dirs::data_dir() {
        Some(mut path) => {
            path.push(".iode_history");
            Some(path)
        }
        None => None,
    }
}

pub fn save_history<T: Terminal>(interface: &Interface<T>) -> std::io::Result<()> {
    match history_path() {
        Some(path) => interface.save_history(path),
        None => Ok(()),
    }
}

pub fn repl<T: Terminal>(interface: &Interface<T>, processor: impl Fn(&str) -> String) {
    loop {
        match interface.read_line() {
            Ok(ReadResult::Eof) => break,
            Ok(ReadResult::Signal(sig)) => {
                writeln!(interface, "Received signal {:?}", sig).ok();
            }
            Ok(ReadResult::Input(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                interface.add_history_unique(line.clone());
                writeln!(interface, "{}", processor(&line)).ok();
            }
            Err(e) => {
                writeln!(interface, "Error: {}", e).ok();
                break;
            }
        }
    }
}

/// Errors are shown in red, but only when `stream` is a terminal.
pub fn paint_error(e: &dyn fmt::Display, stream: atty::Stream) -> String {
    let message = format!("error: {}", e);
    if atty::is(stream) {
        Red.paint(message).to_string()
    } else {
        message
    }
}

fn rep(interpreter: &Interpreter, line: &str) -> String {
    match interpreter.run(line) {
        Ok(value) => pr_str(&value, PrintMode::ReadableRepresentation),
        Err(e) => paint_error(&e, atty::Stream::Stdout),
    }
}

pub fn launch(args: Vec<String>) -> Result<(), Error> {
    let config = Config::from_args(&args)?;
    log::debug!("starting with {:?}", config);
    let interpreter = Interpreter::new()?;
    for module in &config.modules {
        interpreter.import(module, &FsLoader, interpreter.root())?;
    }
    match &config.script {
        Some(script) => {
            let program = reader::read_file(script, &FsLoader).map_err(evaluator::Error::from)?;
            interpreter.evaluate(&program)?;
        }
        None => {
            let interface = setup()?;
            repl(&interface, |line| rep(&interpreter, line));
            save_history(&interface)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, Error> {
        let args: Vec<String> = std::iter::once("iode")
            .chain(args.iter().copied())
            .map(String::from)
            .collect();
        Config::from_args(&args)
    }

    #[test]
    fn no_arguments_means_repl() {
        assert_eq!(parse(&[]).unwrap(), Config::default());
    }

    #[test]
    fn modules_and_script() {
        let config = parse(&["-r", "a.io", "-r", "b.io", "main.io"]).unwrap();
        assert_eq!(config.modules, vec![PathBuf::from("a.io"), PathBuf::from("b.io")]);
        assert_eq!(config.script, Some(PathBuf::from("main.io")));
    }

    #[test]
    fn bad_usage() {
        assert!(matches!(parse(&["-r"]), Err(Error::Usage(_))));
        assert!(matches!(parse(&["--verbose"]), Err(Error::Usage(_))));
        assert!(matches!(parse(&["a.io", "b.io"]), Err(Error::Usage(_))));
    }

    #[test]
    fn rep_prints_values_readably() {
        let interpreter = Interpreter::new().unwrap();
        assert_eq!(rep(&interpreter, "(list \"a\" 1/2)"), "(\"a\" 1/2)");
    }

    #[test]
    fn missing_script_is_an_error() {
        let args = vec!["iode".to_string(), "/no/such/dir/script.io".to_string()];
        assert!(matches!(
            launch(args),
            Err(Error::Eval(evaluator::Error::Load(_)))
        ));
    }
}
