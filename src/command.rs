use std::io::{Read, Write};
use std::process::{ExitStatus, Stdio};

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Abstraction over a readable input stream that can also be converted into
/// a [`Stdio`] handle for spawning external processes.
///
/// Implementors wrap standard input or the read end of a pipe. A blanket implementation
/// exists for any type that implements `Read` and `Into<Stdio>` (e.g. `std::io::PipeReader`).
pub trait Stdin: Read {
    /// Convert this input into a [`Stdio`] handle suitable for `std::process::Command`.
    fn stdio(self: Box<Self>) -> Stdio;
}

impl<T: Read + Into<Stdio>> Stdin for T {
    fn stdio(self: Box<Self>) -> Stdio {
        (*self).into()
    }
}

/// Abstraction over a writable output stream that can also be converted into
/// a [`Stdio`] handle for spawning external processes.
///
/// A blanket implementation exists for any type that implements `Write` and `Into<Stdio>`
/// (`std::io::Stdout`, `std::io::PipeWriter`, `std::fs::File`).
pub trait Stdout: Write {
    /// Convert this output into a [`Stdio`] handle suitable for `std::process::Command`.
    fn stdio(self: Box<Self>) -> Stdio;
}

impl<T: Write + Into<Stdio>> Stdout for T {
    fn stdio(self: Box<Self>) -> Stdio {
        (*self).into()
    }
}

/// Termination status of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The stage ran to completion with this exit code.
    Exited(ExitCode),
    /// The child was killed by this signal.
    Signaled(i32),
}

impl Status {
    /// Collapse the status into a single shell-style code (`128 + signal` for signals).
    pub fn code(self) -> ExitCode {
        match self {
            Status::Exited(code) => code,
            Status::Signaled(signal) => 128 + signal,
        }
    }

    pub fn success(self) -> bool {
        self == Status::Exited(0)
    }
}

impl From<ExitStatus> for Status {
    fn from(exit_status: ExitStatus) -> Self {
        match exit_status.code() {
            Some(code) => Status::Exited(code),
            None => terminated_by_signal(exit_status),
        }
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> Status {
    use std::os::unix::process::ExitStatusExt;
    match exit_status.signal() {
        Some(signal) => Status::Signaled(signal),
        None => Status::Exited(-1),
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> Status {
    Status::Exited(-1)
}
