use std::env as stdenv;
use std::path::PathBuf;

/// Name printed in front of every diagnostic.
pub const SESSION_NAME: &str = "tsh";

/// Mutable session context shared by the builtins, the launcher and the prompt.
///
/// The environment contains:
/// - `current_dir`: the working directory every spawned command starts in. Only `cd` changes it.
/// - `should_exit`: set by the `exit` builtin; the executor and the REPL loop stop when it is true.
/// - `name`: the session name used to prefix diagnostics.
#[derive(Debug, Clone)]
pub struct Environment {
    pub current_dir: PathBuf,
    pub should_exit: bool,
    pub name: &'static str,
}

impl Environment {
    /// Capture the current process working directory into a new `Environment`.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            current_dir,
            should_exit: false,
            name: SESSION_NAME,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
