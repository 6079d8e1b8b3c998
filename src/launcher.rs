use crate::builtin::Builtin;
use crate::command::{ExitCode, Status, Stdin, Stdout};
use crate::env::Environment;
use crate::lexer::ArgumentVector;
use anyhow::{Context, Result};
use std::io::{ErrorKind, Write};
use std::process::{Child, Command};

/// Status reported for a command that could not be found.
pub const NOT_FOUND: ExitCode = 127;
/// Status reported for a command that was found but could not be executed.
pub const NOT_EXECUTABLE: ExitCode = 126;

/// A launched pipeline stage, kept until the wait phase.
#[derive(Debug)]
pub enum StageHandle {
    /// Finished before `launch` returned: a builtin, or a stage that failed to spawn.
    Done(Status),
    /// A live child process.
    Child(Child),
}

impl StageHandle {
    pub fn pid(&self) -> Option<u32> {
        match self {
            StageHandle::Done(_) => None,
            StageHandle::Child(child) => Some(child.id()),
        }
    }

    /// Block until the stage has terminated.
    ///
    /// An error here means the child could not be reaped.
    pub fn wait(self) -> Result<Status> {
        match self {
            StageHandle::Done(status) => Ok(status),
            StageHandle::Child(mut child) => {
                let pid = child.id();
                let exit_status = child
                    .wait()
                    .with_context(|| format!("failed to wait for pid {}", pid))?;
                log::debug!("pid {} finished: {}", pid, exit_status);
                Ok(exit_status.into())
            }
        }
    }
}

/// Launch one stage with the given standard streams.
///
/// Builtins run to completion right here, writing to `stdout`; they never read `stdin`.
/// External commands are spawned without waiting, so every stage of a pipeline can be
/// running before the first one is reaped. `stdin` and `stdout` are consumed either way:
/// once this returns the caller holds no copy of them.
///
/// Failures are reported on `stderr` and turned into a finished handle with a failure
/// status; they never abort the pipeline.
pub fn launch(
    argv: &ArgumentVector,
    stdin: Box<dyn Stdin>,
    stdout: Box<dyn Stdout>,
    stderr: &mut dyn Write,
    env: &mut Environment,
) -> StageHandle {
    let Some(name) = argv.name() else {
        return StageHandle::Done(Status::Exited(0));
    };

    if let Some(builtin) = Builtin::lookup(name) {
        drop(stdin);
        let mut stdout = stdout;
        let code = match builtin.invoke(argv.args(), &mut stdout, stderr, env) {
            Ok(code) => code,
            Err(e) => {
                let _ = writeln!(stderr, "{}: {}: {:#}", env.name, name, e);
                1
            }
        };
        return StageHandle::Done(Status::Exited(code));
    }

    let mut cmd = Command::new(name);
    cmd.args(argv.args())
        .stdin(stdin.stdio())
        .stdout(stdout.stdio())
        .current_dir(&env.current_dir);

    match cmd.spawn() {
        Ok(child) => {
            log::debug!("spawned {:?} as pid {}", argv.as_slice(), child.id());
            StageHandle::Child(child)
        }
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::NotFound => NOT_FOUND,
                ErrorKind::PermissionDenied => NOT_EXECUTABLE,
                _ => 1,
            };
            log::debug!("failed to spawn {:?}: {}", argv.as_slice(), e);
            let _ = writeln!(stderr, "{}: {}: {}", env.name, name, e);
            StageHandle::Done(Status::Exited(code))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::lock_process_state;
    use std::fs::{File, OpenOptions};
    use std::io::Read;

    fn null_stdin() -> Box<dyn Stdin> {
        Box::new(File::open("/dev/null").unwrap())
    }

    fn null_stdout() -> Box<dyn Stdout> {
        Box::new(OpenOptions::new().write(true).open("/dev/null").unwrap())
    }

    fn argv(tokens: &[&str]) -> ArgumentVector {
        ArgumentVector::from_iter(tokens.iter().copied())
    }

    #[test]
    #[cfg(unix)]
    fn test_external_command_writes_to_given_stdout() {
        let _lock = lock_process_state();
        let mut env = Environment::new();
        let (mut reader, writer) = std::io::pipe().unwrap();
        let mut err = Vec::new();

        let handle = launch(
            &argv(&["echo", "hi"]),
            null_stdin(),
            Box::new(writer),
            &mut err,
            &mut env,
        );
        assert!(handle.pid().is_some());

        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(handle.wait().unwrap(), Status::Exited(0));
        assert_eq!(out, "hi\n");
        assert!(err.is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn test_exit_code_and_signal_are_collected() {
        let _lock = lock_process_state();
        let mut env = Environment::new();
        let mut err = Vec::new();

        let failing = launch(
            &argv(&["sh", "-c", "exit 7"]),
            null_stdin(),
            null_stdout(),
            &mut err,
            &mut env,
        );
        assert_eq!(failing.wait().unwrap(), Status::Exited(7));

        let killed = launch(
            &argv(&["sh", "-c", "kill -9 $$"]),
            null_stdin(),
            null_stdout(),
            &mut err,
            &mut env,
        );
        assert_eq!(killed.wait().unwrap(), Status::Signaled(9));
    }

    #[test]
    fn test_missing_command_is_reported_not_fatal() {
        let _lock = lock_process_state();
        let mut env = Environment::new();
        let mut err = Vec::new();

        let handle = launch(
            &argv(&["tsh-no-such-command-xyz"]),
            null_stdin(),
            null_stdout(),
            &mut err,
            &mut env,
        );

        assert!(handle.pid().is_none());
        assert_eq!(handle.wait().unwrap(), Status::Exited(NOT_FOUND));
        let err = String::from_utf8(err).unwrap();
        assert!(err.starts_with("tsh: tsh-no-such-command-xyz: "), "got {err:?}");
    }

    #[test]
    fn test_builtin_runs_in_process() {
        let _lock = lock_process_state();
        let mut env = Environment::new();
        let (mut reader, writer) = std::io::pipe().unwrap();
        let mut err = Vec::new();

        let handle = launch(&argv(&["help"]), null_stdin(), Box::new(writer), &mut err, &mut env);
        assert!(handle.pid().is_none());

        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(handle.wait().unwrap(), Status::Exited(0));
        assert!(out.contains("\t cd\n"));
    }

    #[test]
    fn test_empty_argv_is_a_no_op() {
        let _lock = lock_process_state();
        let mut env = Environment::new();
        let mut err = Vec::new();
        let handle = launch(
            &ArgumentVector::default(),
            null_stdin(),
            null_stdout(),
            &mut err,
            &mut env,
        );
        assert_eq!(handle.wait().unwrap(), Status::Exited(0));
    }
}
