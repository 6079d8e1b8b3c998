//! Tokenization of a single pipeline stage into an argument vector.

/// Separators between tokens: space, tab, carriage return, newline, bell and the line
/// continuation escape. The escape never ends up inside a token.
pub const DELIMITERS: [char; 6] = [' ', '\t', '\r', '\n', '\x07', ESCAPE];

/// Escape character used for line continuation.
pub const ESCAPE: char = '\\';

/// Ordered tokens of one stage: the command name followed by its arguments.
///
/// The length is carried by the underlying vector; there is no sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentVector {
    tokens: Vec<String>,
}

impl ArgumentVector {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// Command name, `None` for an empty stage.
    pub fn name(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Everything after the command name.
    pub fn args(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }
}

impl<S: Into<String>> FromIterator<S> for ArgumentVector {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
}

struct LexingFSM<'a> {
    input: std::str::Chars<'a>,
    state: LexingState,
    buffer: String,
}

impl<'a> LexingFSM<'a> {
    fn new(stage: &'a str) -> Self {
        LexingFSM {
            input: stage.chars(),
            state: LexingState::Start,
            buffer: String::new(),
        }
    }

    /// Consumes the whole stage, emitting maximal runs of non-delimiter characters.
    fn make_tokens(mut self) -> Vec<String> {
        let mut out = Vec::new();

        while let Some(ch) = self.input.next() {
            let delimiter = DELIMITERS.contains(&ch);
            match (self.state, delimiter) {
                (LexingState::Start, true) => {}
                (LexingState::Start, false) => {
                    self.buffer.push(ch);
                    self.state = LexingState::ReadingWord;
                }
                (LexingState::ReadingWord, true) => {
                    out.push(std::mem::take(&mut self.buffer));
                    self.state = LexingState::Start;
                }
                (LexingState::ReadingWord, false) => self.buffer.push(ch),
            }
        }

        if self.state == LexingState::ReadingWord {
            out.push(self.buffer);
        }
        out
    }
}

/// Split one stage into its argument vector.
///
/// Runs of delimiters collapse, so no empty token is ever produced. A stage made only
/// of delimiters yields an empty vector.
pub fn tokenize(stage: &str) -> ArgumentVector {
    let tokens = LexingFSM::new(stage).make_tokens();
    log::trace!("tokenized {stage:?} into {tokens:?}");
    ArgumentVector::new(tokens)
}
