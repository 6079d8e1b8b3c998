//! TSH, a tiny interactive pipeline shell.
//!
//! A line is split into stages at `|`, every stage is tokenized into an argument vector,
//! and the stages are run as a pipeline of OS processes with each stage's stdout wired
//! to the next stage's stdin. The builtins `exit`, `cd` and `help` run inside the shell
//! process instead of being spawned.
//!
//! The main entry point is [`Interpreter`], which owns the session state and executes
//! lines. The public modules expose the tokenizer ([`lexer`]), the stage splitter
//! ([`parser`]), the per-stage launcher ([`launcher`]) and the line sources used by the
//! interactive loop ([`input`]).

mod builtin;
pub mod command;
pub mod env;
pub mod input;
mod interpreter;
pub mod launcher;
pub mod lexer;
pub mod parser;

pub use builtin::{BUILTINS, Builtin};
pub use interpreter::{Continuation, Interpreter, Outcome};

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::RefCell;
    use std::io::{Result as IoResult, Write};
    use std::rc::Rc;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    /// Serializes tests that touch the working directory, spawn children or count
    /// open descriptors; all three are process-wide.
    pub(crate) fn lock_process_state() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Memory-backed writer whose contents stay readable after it is handed out.
    #[derive(Clone, Default)]
    pub(crate) struct CaptureBuffer {
        buf: Rc<RefCell<Vec<u8>>>,
    }

    impl CaptureBuffer {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8_lossy(&self.buf.borrow()).into_owned()
        }
    }

    impl Write for CaptureBuffer {
        fn write(&mut self, data: &[u8]) -> IoResult<usize> {
            self.buf.borrow_mut().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> IoResult<()> {
            Ok(())
        }
    }
}
