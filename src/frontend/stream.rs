use crate::frontend::token::Pos;
use std::io;
use std::io::Read;

pub const BUFFER_SIZE: usize = 16 * 1024;

/// Buffered character source with one-character pushback and position
/// bookkeeping. Only one unread is permitted between reads, so a single-level
/// column history is enough to reverse any advance.
pub struct CharStream<R> {
    input: R,
    buffer: Vec<u8>,
    valid: usize,
    cursor: usize,
    pushback: Option<char>,
    line: usize,
    column: usize,
    previous_column: usize,
    read_error: Option<io::Error>,
}

impl<R: Read> CharStream<R> {
    pub fn new(input: R) -> Self {
        CharStream {
            input,
            buffer: vec![0; BUFFER_SIZE],
            valid: 0,
            cursor: 0,
            pushback: None,
            line: 1,
            column: 1,
            previous_column: 1,
            read_error: None,
        }
    }

    /// Position of the next character to be read.
    pub fn position(&self) -> Pos {
        Pos {
            line: self.line,
            column: self.column,
        }
    }

    /// Returns the next character, or `'\0'` once the input is exhausted.
    pub fn next_char(&mut self) -> char {
        let c = match self.pushback.take() {
            Some(c) => c,
            None => {
                if self.cursor >= self.valid && !self.refill() {
                    return '\0';
                }
                let byte = self.buffer[self.cursor];
                self.cursor += 1;
                byte as char
            }
        };

        self.advance(c);
        c
    }

    /// Restores exactly one character. If the cursor sits at the start of a
    /// freshly refilled buffer the character goes into the pushback cell,
    /// otherwise the cursor steps back.
    pub fn unread_char(&mut self, c: char) {
        if c == '\0' {
            return;
        }

        if self.cursor == 0 {
            self.pushback = Some(c);
        } else {
            self.cursor -= 1;
        }

        self.retreat(c);
    }

    /// The first I/O failure after a successful open, if any. EOF caused by a
    /// failed refill is reported here rather than through `next_char`.
    pub fn take_read_error(&mut self) -> Option<io::Error> {
        self.read_error.take()
    }

    fn refill(&mut self) -> bool {
        self.cursor = 0;
        loop {
            match self.input.read(&mut self.buffer) {
                Ok(count) => {
                    self.valid = count;
                    return count > 0;
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => {
                    self.valid = 0;
                    if self.read_error.is_none() {
                        self.read_error = Some(error);
                    }
                    return false;
                }
            }
        }
    }

    fn advance(&mut self, c: char) {
        self.previous_column = self.column;
        match c {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\t' => self.column += 4,
            _ => self.column += 1,
        }
    }

    fn retreat(&mut self, c: char) {
        match c {
            '\n' => {
                self.line -= 1;
                self.column = self.previous_column;
            }
            '\t' => self.column -= 4,
            _ => self.column -= 1,
        }
    }
}
