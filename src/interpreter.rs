use crate::command::{ExitCode, Status, Stdin, Stdout};
use crate::env::Environment;
use crate::input::{self, LineSource};
use crate::launcher::{self, StageHandle};
use crate::lexer::ArgumentVector;
use crate::parser;
use anyhow::{Context, Result};
use std::io::{self, Read, Write};
use std::process::Stdio;

/// Whether the interactive loop keeps reading lines after a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    Continue,
    /// `exit` ran somewhere in the pipeline.
    Exit,
}

/// Result of executing one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// One status per launched stage, in stage order. Empty stages have no entry.
    pub statuses: Vec<Status>,
    pub continuation: Continuation,
}

impl Outcome {
    pub fn last_status(&self) -> Option<Status> {
        self.statuses.last().copied()
    }

    /// Shell-style exit code of the line: the last stage's code, 0 if nothing ran.
    pub fn exit_code(&self) -> ExitCode {
        self.last_status().map_or(0, Status::code)
    }

    pub fn should_continue(&self) -> bool {
        self.continuation == Continuation::Continue
    }
}

/// A minimal shell that executes pipelines of builtin and external commands.
///
/// The interpreter owns the session [`Environment`] and the diagnostic stream every
/// `tsh: ...` message is written to.
///
/// Example
/// ```no_run
/// use tsh::Interpreter;
/// let mut sh = Interpreter::new();
/// let outcome = sh.run_line("echo hello | wc -c").unwrap();
/// assert_eq!(outcome.exit_code(), 0);
/// ```
pub struct Interpreter {
    env: Environment,
    diagnostics: Box<dyn Write>,
}

impl Interpreter {
    /// Create an interpreter reporting diagnostics to the process's stderr.
    pub fn new() -> Self {
        Self::with_diagnostics(Box::new(io::stderr()))
    }

    pub fn with_diagnostics(diagnostics: Box<dyn Write>) -> Self {
        Self {
            env: Environment::new(),
            diagnostics,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Parse and execute one raw line against the terminal's stdin and stdout.
    pub fn run_line(&mut self, raw_line: &str) -> Result<Outcome> {
        let stages = parser::parse_line(raw_line);
        self.execute(
            &stages,
            Box::new(InheritedStdin(io::stdin())),
            Box::new(io::stdout()),
        )
    }

    /// Execute `stages` as one pipeline.
    ///
    /// The first stage reads `stdin`, the last one writes `stdout`, and a pipe joins every
    /// adjacent pair. All stages are launched before any is waited on. Empty stages are
    /// dropped up front. If `exit` runs, the stages after it are not launched.
    ///
    /// Per-stage failures only show up as statuses. An `Err` means a child could not be
    /// reaped and the session should end.
    pub fn execute(
        &mut self,
        stages: &[ArgumentVector],
        stdin: Box<dyn Stdin>,
        stdout: Box<dyn Stdout>,
    ) -> Result<Outcome> {
        let stages: Vec<&ArgumentVector> = stages.iter().filter(|argv| !argv.is_empty()).collect();
        if stages.is_empty() {
            return Ok(self.outcome(Vec::new()));
        }

        // inputs[i] and outputs[i] are the standard streams of stage i.
        let mut inputs: Vec<Box<dyn Stdin>> = Vec::with_capacity(stages.len());
        let mut outputs: Vec<Box<dyn Stdout>> = Vec::with_capacity(stages.len());
        inputs.push(stdin);
        for _ in 1..stages.len() {
            let (reader, writer) = match io::pipe() {
                Ok(pipe) => pipe,
                Err(e) => {
                    let _ = writeln!(self.diagnostics, "{}: pipe: {}", self.env.name, e);
                    return Ok(self.outcome(Vec::new()));
                }
            };
            outputs.push(Box::new(writer));
            inputs.push(Box::new(reader));
        }
        outputs.push(stdout);
        log::debug!("launching {} stage(s) joined by {} pipe(s)", stages.len(), stages.len() - 1);

        let mut streams = inputs.into_iter().zip(outputs);
        let mut handles: Vec<StageHandle> = Vec::with_capacity(stages.len());
        for argv in stages {
            let Some((input, output)) = streams.next() else {
                break;
            };
            let handle = launcher::launch(argv, input, output, &mut *self.diagnostics, &mut self.env);
            handles.push(handle);
            if self.env.should_exit {
                log::debug!("exit requested, skipping remaining stages");
                break;
            }
        }
        // Whatever endpoints were not handed to a stage are closed here.
        drop(streams);

        let mut statuses = Vec::with_capacity(handles.len());
        for handle in handles {
            statuses.push(handle.wait()?);
        }
        Ok(self.outcome(statuses))
    }

    fn outcome(&self, statuses: Vec<Status>) -> Outcome {
        let continuation = if self.env.should_exit {
            Continuation::Exit
        } else {
            Continuation::Continue
        };
        Outcome {
            statuses,
            continuation,
        }
    }

    /// Read-Eval-Print Loop: prompt, read one logical line, execute it, repeat.
    ///
    /// Ends on `exit` or end of input. Returns the exit code of the last line executed.
    pub fn repl(&mut self, source: &mut dyn LineSource) -> Result<ExitCode> {
        let mut last_code = 0;
        while !self.env.should_exit {
            let prompt = input::prompt(&self.env);
            let Some(line) = source.read_line(&prompt)? else {
                log::debug!("end of input");
                break;
            };
            let outcome = self
                .run_line(&line)
                .with_context(|| format!("failed to run {:?}", line.trim_end()))?;
            last_code = outcome.exit_code();
            if !outcome.should_continue() {
                break;
            }
        }
        Ok(last_code)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

struct InheritedStdin(io::Stdin);

impl Read for InheritedStdin {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl Stdin for InheritedStdin {
    fn stdio(self: Box<Self>) -> Stdio {
        Stdio::inherit()
    }
}
