//! Splitting a command line into words.
//!
//! Words are separated by blanks. Single quotes keep everything literal,
//! double quotes keep blanks and honour `\"` and `\\`, and a backslash
//! outside quotes escapes the next character. Nothing else is special:
//! there are no pipes, redirections or substitutions.

use thiserror::Error;

/// Errors that can occur while splitting a line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexingError {
    /// A closing quote (single or double) was not found.
    #[error("unterminated {0} quote")]
    UnfinishedQuote(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingSingleQuote,
    ReadingDoubleQuote,
}

struct LexingFSM<'a> {
    input: std::str::Chars<'a>,
    state: LexingState,
    word: String,
}

impl<'a> LexingFSM<'a> {
    fn new(line: &'a str) -> Self {
        LexingFSM {
            input: line.chars(),
            state: LexingState::Start,
            word: String::new(),
        }
    }

    fn make_words(mut self) -> Result<Vec<String>, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.input.next() {
            match self.state {
                LexingState::Start => self.handle_start(ch),
                LexingState::ReadingWord => self.handle_word(ch, &mut out),
                LexingState::ReadingSingleQuote => self.handle_single_quote(ch),
                LexingState::ReadingDoubleQuote => self.handle_double_quote(ch),
            }
        }

        match self.state {
            LexingState::ReadingSingleQuote => Err(LexingError::UnfinishedQuote("single")),
            LexingState::ReadingDoubleQuote => Err(LexingError::UnfinishedQuote("double")),
            LexingState::ReadingWord => {
                out.push(self.word);
                Ok(out)
            }
            LexingState::Start => Ok(out),
        }
    }

    fn handle_start(&mut self, ch: char) {
        if ch.is_whitespace() {
            return;
        }
        self.state = LexingState::ReadingWord;
        self.handle_unquoted(ch);
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<String>) {
        if ch.is_whitespace() {
            out.push(std::mem::take(&mut self.word));
            self.state = LexingState::Start;
        } else {
            self.handle_unquoted(ch);
        }
    }

    fn handle_unquoted(&mut self, ch: char) {
        match ch {
            '\'' => self.state = LexingState::ReadingSingleQuote,
            '"' => self.state = LexingState::ReadingDoubleQuote,
            '\\' => {
                if let Some(next) = self.input.next() {
                    self.word.push(next);
                }
            }
            c => self.word.push(c),
        }
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.state = LexingState::ReadingWord,
            c => self.word.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) {
        match ch {
            '"' => self.state = LexingState::ReadingWord,
            '\\' => match self.input.next() {
                Some(next @ ('"' | '\\')) => self.word.push(next),
                Some(other) => {
                    self.word.push('\\');
                    self.word.push(other);
                }
                None => self.word.push('\\'),
            },
            c => self.word.push(c),
        }
    }
}

/// Splits `line` into argv-style words.
///
/// An empty or blank line yields no words. Quoted empty strings (`''`)
/// yield an empty word.
pub fn split_into_words(line: &str) -> Result<Vec<String>, LexingError> {
    LexingFSM::new(line).make_words()
}
