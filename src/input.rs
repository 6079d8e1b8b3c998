//! Line acquisition, prompt rendering and session start-up.
use crate::env::Environment;
use crate::lexer::ESCAPE;
use anyhow::{Context, Result};
use rustyline::completion::Completer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Editor, Helper};
use std::io::{BufRead, Write};

const BOLD: &str = "\x1B[1m";
const RESET: &str = "\x1B[0m";
const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

/// Source of logical lines for the interactive loop.
pub trait LineSource {
    /// Read the next logical line, without its final terminator.
    ///
    /// A line ending in the escape character continues on the next physical line; the
    /// escape and the line break stay in the returned text. `None` means end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Reads logical lines from any buffered reader. Used when stdin is not a terminal.
pub struct LineReader<R> {
    inner: R,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: BufRead> LineSource for LineReader<R> {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        let mut buf = Vec::new();
        loop {
            let read = self
                .inner
                .read_until(b'\n', &mut buf)
                .context("failed to read input")?;
            if read == 0 {
                if buf.is_empty() {
                    return Ok(None);
                }
                break;
            }
            if buf.last() != Some(&b'\n') {
                // EOF in the middle of a line
                break;
            }
            let continued = buf.len() >= 2 && buf[buf.len() - 2] == ESCAPE as u8;
            if !continued {
                buf.pop();
                break;
            }
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}

/// Line editor for an interactive terminal.
pub struct Terminal {
    editor: Editor<ContinuationHelper, DefaultHistory>,
}

impl Terminal {
    pub fn new() -> Result<Self> {
        let mut editor = Editor::new().context("failed to initialize line editor")?;
        editor.set_helper(Some(ContinuationHelper));
        Ok(Self { editor })
    }
}

impl LineSource for Terminal {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => Ok(None),
            Err(e) => Err(e).context("failed to read line"),
        }
    }
}

/// Keeps the editor open while the input ends with the escape character.
struct ContinuationHelper;

impl Validator for ContinuationHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        if ctx.input().ends_with(ESCAPE) {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

impl Completer for ContinuationHelper {
    type Candidate = String;
}

impl Hinter for ContinuationHelper {
    type Hint = String;
}

impl Highlighter for ContinuationHelper {}

impl Helper for ContinuationHelper {}

/// Current working directory in bold, then `> `.
pub fn prompt(env: &Environment) -> String {
    format!("{}{}{}> ", BOLD, env.current_dir.display(), RESET)
}

/// Clear the display (unless `clear` is false) and print the banner.
pub fn bootstrap(out: &mut dyn Write, clear: bool) -> std::io::Result<()> {
    if clear {
        write!(out, "{}", CLEAR_SCREEN)?;
    }
    writeln!(out, "TSH, a tiny pipeline shell. Type help for builtins.")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn lines(input: &str) -> Vec<String> {
        let mut reader = LineReader::new(Cursor::new(input.as_bytes().to_vec()));
        let mut out = Vec::new();
        while let Some(line) = reader.read_line("").unwrap() {
            out.push(line);
        }
        out
    }

    #[test]
    fn test_lines_are_split_at_newline() {
        assert_eq!(lines("ls\npwd\n"), vec!["ls", "pwd"]);
    }

    #[test]
    fn test_escaped_newline_continues_line() {
        assert_eq!(lines("echo a \\\nb\nls\n"), vec!["echo a \\\nb", "ls"]);
        assert_eq!(lines("a\\\n\\\nb\n"), vec!["a\\\n\\\nb"]);
    }

    #[test]
    fn test_blank_line_is_not_end_of_input() {
        assert_eq!(lines("\n\nls\n"), vec!["", "", "ls"]);
    }

    #[test]
    fn test_eof_without_terminator() {
        assert_eq!(lines("ls -l"), vec!["ls -l"]);
        assert_eq!(lines("ls \\\n"), vec!["ls \\\n"]);
        assert!(lines("").is_empty());
    }

    #[test]
    fn test_prompt_shows_cwd() {
        let env = Environment {
            current_dir: PathBuf::from("/tmp"),
            should_exit: false,
            name: "tsh",
        };
        assert_eq!(prompt(&env), "\x1B[1m/tmp\x1B[0m> ");
    }

    #[test]
    fn test_bootstrap() {
        let mut out = Vec::new();
        bootstrap(&mut out, true).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with(CLEAR_SCREEN));
        assert!(out.contains("help"));

        let mut out = Vec::new();
        bootstrap(&mut out, false).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("TSH"));
    }
}
