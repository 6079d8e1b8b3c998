use crate::command::ExitCode;
use crate::env::Environment;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in the shell process, never forked.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Executes the command against the stage's output stream, the diagnostic stream
    /// and the session.
    ///
    /// Return value follows shell conventions: 0 for success, non-zero for error.
    /// An `Err` is reported to the diagnostic stream and becomes status 1.
    fn execute(
        self,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

/// Registry entry for one builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Exit,
    ChangeDir,
    Help,
}

/// Every builtin, in the order `help` lists them.
pub const BUILTINS: [Builtin; 3] = [Builtin::Exit, Builtin::ChangeDir, Builtin::Help];

impl Builtin {
    /// Canonical name of the command, e.g. "exit" or "cd".
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Exit => "exit",
            Builtin::ChangeDir => "cd",
            Builtin::Help => "help",
        }
    }

    pub fn lookup(name: &str) -> Option<Builtin> {
        BUILTINS.into_iter().find(|builtin| builtin.name() == name)
    }

    /// Parse `args` for this builtin and run it synchronously.
    ///
    /// Only failures to write to `stdout`/`stderr` are returned as errors; misuse is
    /// reported on `stderr` and turned into a non-zero code.
    pub fn invoke(
        self,
        args: &[String],
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        log::debug!("builtin {} {:?}", self.name(), args);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match self {
            Builtin::Exit => run::<Exit>(self.name(), &args, stdout, stderr, env),
            Builtin::ChangeDir => run::<Cd>(self.name(), &args, stdout, stderr, env),
            Builtin::Help => run::<Help>(self.name(), &args, stdout, stderr, env),
        }
    }
}

fn run<T: BuiltinCommand>(
    name: &str,
    args: &[&str],
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
    env: &mut Environment,
) -> Result<ExitCode> {
    let code = match T::from_args(&[name], args) {
        Ok(cmd) => match cmd.execute(stdout, stderr, env) {
            Ok(code) => code,
            Err(e) => {
                writeln!(stderr, "{}: {:#}", env.name, e)?;
                1
            }
        },
        // `--help` lands here with an Ok status; argument errors with an Err status.
        Err(EarlyExit { output, status }) => match status {
            Ok(()) => {
                writeln!(stdout, "{}", output)?;
                0
            }
            Err(()) => {
                writeln!(stderr, "{}: {}", env.name, output.trim_end())?;
                1
            }
        },
    };
    stdout.flush()?;
    Ok(code)
}

#[derive(FromArgs)]
/// End the shell session.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored.
    pub args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn execute(
        self,
        _stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn execute(
        self,
        _stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => t,
            _ => {
                writeln!(stderr, "{}: cd: expects one argument", env.name)?;
                return Ok(1);
            }
        };

        let requested = PathBuf::from(target);
        let new_dir = if requested.is_absolute() {
            requested
        } else {
            env.current_dir.join(requested)
        };

        let canonical = fs::canonicalize(&new_dir).with_context(|| format!("cd: {}", target))?;
        env::set_current_dir(&canonical).with_context(|| format!("cd: {}", target))?;
        log::debug!("working directory is now {}", canonical.display());
        env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print usage and the list of builtin commands.
pub struct Help {}

impl BuiltinCommand for Help {
    fn execute(
        self,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        writeln!(stdout, "TSH, a tiny pipeline shell\n")?;
        writeln!(stdout, "Type a command and its arguments, then hit enter.")?;
        writeln!(stdout, "Join commands with | to pipe output into the next one.")?;
        writeln!(stdout, "End a line with \\ to continue it on the next line.\n")?;
        writeln!(stdout, "Builtin commands:")?;
        for builtin in BUILTINS {
            writeln!(stdout, "\t {}", builtin.name())?;
        }
        writeln!(stdout, "\nUse man for more information on other programs.")?;
        Ok(0)
    }
}
