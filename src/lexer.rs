//! Lexical analysis of a raw input line into argument words.
//!
//! Quoting and escaping are fully resolved here: every word that leaves this module
//! is plain text, ready to be used as an argument. The lexer is total; an unclosed
//! quote simply runs to the end of the line.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    /// Between words, skipping unquoted whitespace.
    Start,
    /// Inside an unquoted fragment of a word.
    ReadingWord,
    /// Inside `'...'`; nothing is special except the closing quote.
    ReadingSingleQuote,
    /// Inside `"..."`; backslash escapes only `\`, `$`, `"` and newline.
    ReadingDoubleQuote,
}

/// Characters a backslash may escape inside double quotes.
const DOUBLE_QUOTE_ESCAPABLE: [char; 4] = ['\\', '$', '"', '\n'];

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    buffer: String,
    /// Set once the current word has started, even if it is still empty (`''`).
    in_word: bool,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            buffer: String::new(),
            in_word: false,
        }
    }

    /// Runs the machine over the whole input and returns the words in order.
    fn make_words(mut self) -> Vec<String> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start | LexingState::ReadingWord => self.handle_unquoted(ch, &mut out),
                LexingState::ReadingSingleQuote => self.handle_single_quote(ch),
                LexingState::ReadingDoubleQuote => self.handle_double_quote(ch),
            }
        }

        // An unterminated quote still yields what was read so far.
        self.finish_word(&mut out);
        out
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn finish_word(&mut self, out: &mut Vec<String>) {
        if self.in_word {
            out.push(std::mem::take(&mut self.buffer));
            self.in_word = false;
        }
    }

    fn handle_unquoted(&mut self, ch: char, out: &mut Vec<String>) {
        match ch {
            ' ' | '\t' | '\n' => {
                self.finish_word(out);
                self.state = LexingState::Start;
                return;
            }
            '\'' => self.state = LexingState::ReadingSingleQuote,
            '"' => self.state = LexingState::ReadingDoubleQuote,
            '\\' => {
                // A trailing backslash has nothing to escape and stays literal.
                let escaped = self.read_char().unwrap_or('\\');
                self.buffer.push(escaped);
                self.state = LexingState::ReadingWord;
            }
            c => {
                self.buffer.push(c);
                self.state = LexingState::ReadingWord;
            }
        }
        self.in_word = true;
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.state = LexingState::ReadingWord,
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) {
        match ch {
            '"' => self.state = LexingState::ReadingWord,
            '\\' => match self.peek_char() {
                Some(next) if DOUBLE_QUOTE_ESCAPABLE.contains(&next) => {
                    self.read_char();
                    self.buffer.push(next);
                }
                _ => self.buffer.push('\\'),
            },
            c => self.buffer.push(c),
        }
    }
}

/// Splits a raw input line into argument words the way a POSIX shell does.
///
/// Index 0 of the result is the command name. Adjacent quoted and unquoted
/// fragments join into one word (`a'b c'd` is the single word `ab cd`).
pub fn split_into_words(line: &str) -> Vec<String> {
    LexingFSM::new(line).make_words()
}
