use super::token::{keyword_type, Location, Token, TokenType};

const FORM_FEED: u8 = 0x0c;

/// Lexing position. Copyable so that a peek can run the scanner from the
/// current cursor without storing the advanced cursor back.
#[derive(Clone, Copy, Debug)]
struct Cursor {
    position: usize,
    line: u32,
    column: u32,
}

impl Cursor {
    fn location(&self) -> Location {
        Location {
            line: self.line,
            column: self.column,
        }
    }
}

pub struct Tokenizer {
    data: Vec<u8>,
    cursor: Cursor,
}

impl Tokenizer {
    pub fn new(text: &str) -> Self {
        Self {
            data: text.as_bytes().to_vec(),
            cursor: Cursor {
                position: 0,
                line: 1,
                column: 1,
            },
        }
    }

    /// Consumes and returns the next token. With
    /// `ignore_whitespace_and_comments` unset, leading whitespace or a `#`
    /// comment makes the scan start right where the cursor is, which is what
    /// the shader-body loop needs to see `END` only at a line start.
    pub fn next_token(&mut self, ignore_whitespace_and_comments: bool) -> Token {
        let (token, cursor) = self.scan(self.cursor, ignore_whitespace_and_comments);
        self.cursor = cursor;
        token
    }

    /// Returns the next token without consuming it. Byte-identical to the
    /// token a subsequent `next_token` call with the same flag produces.
    pub fn peek_next_token(&self, ignore_whitespace_and_comments: bool) -> Token {
        self.scan(self.cursor, ignore_whitespace_and_comments).0
    }

    pub fn line(&self) -> u32 {
        self.cursor.line
    }

    /// Consumes through and including the next newline, returning the
    /// consumed text verbatim.
    pub fn skip_line(&mut self) -> String {
        let mut cursor = self.cursor;
        let start = cursor.position;
        while cursor.position < self.data.len() {
            let byte = self.data[cursor.position];
            self.advance(&mut cursor);
            if byte == b'\n' {
                break;
            }
        }
        // The data came from a &str and lines split at ASCII newlines, so
        // the consumed range is always valid UTF-8.
        let text = String::from_utf8_lossy(&self.data[start..cursor.position]).into_owned();
        self.cursor = cursor;
        text
    }

    /// Skips whitespace up to the end of the current line. A trailing `#`
    /// comment is consumed to the end of the line and returned as a string
    /// token so the caller can inspect it; otherwise the returned string
    /// token is empty.
    pub fn skip_single_line_of_whitespace_and_comments(&mut self) -> Token {
        let mut cursor = self.cursor;
        while cursor.position < self.data.len() {
            match self.data[cursor.position] {
                b'\0' | b'\t' | b'\r' | FORM_FEED | b' ' => self.advance(&mut cursor),
                _ => break,
            }
        }
        if cursor.position < self.data.len() {
            if self.data[cursor.position] == b'#' {
                let location = cursor.location();
                self.cursor = cursor;
                let text = self.skip_line();
                return Token::with_text(TokenType::String, location, text);
            }
            if self.data[cursor.position] == b'\n' {
                self.advance(&mut cursor);
            }
        }
        self.cursor = cursor;
        Token::new(TokenType::String, cursor.location())
    }

    fn advance(&self, cursor: &mut Cursor) {
        if self.data[cursor.position] == b'\n' {
            cursor.line += 1;
            cursor.column = 1;
        } else {
            cursor.column += 1;
        }
        cursor.position += 1;
    }

    fn skip_whitespace(&self, cursor: &mut Cursor) {
        while cursor.position < self.data.len() {
            match self.data[cursor.position] {
                b'\0' | b'\t' | b'\r' | FORM_FEED | b' ' | b'\n' => self.advance(cursor),
                _ => return,
            }
        }
    }

    fn skip_whitespace_and_comments(&self, cursor: &mut Cursor) {
        self.skip_whitespace(cursor);
        while cursor.position < self.data.len() && self.data[cursor.position] == b'#' {
            while cursor.position < self.data.len() {
                let byte = self.data[cursor.position];
                self.advance(cursor);
                if byte == b'\n' {
                    break;
                }
            }
            self.skip_whitespace(cursor);
        }
    }

    fn scan(&self, mut cursor: Cursor, ignore_whitespace_and_comments: bool) -> (Token, Cursor) {
        if ignore_whitespace_and_comments {
            self.skip_whitespace_and_comments(&mut cursor);
        }
        let start = cursor.location();
        if cursor.position >= self.data.len() {
            return (Token::new(TokenType::Eos, start), cursor);
        }
        let byte = self.data[cursor.position];
        if byte == b',' {
            self.advance(&mut cursor);
            return (
                Token::with_text(TokenType::Comma, start, ",".to_string()),
                cursor,
            );
        }
        if byte == b'[' {
            self.advance(&mut cursor);
            return (
                Token::with_text(TokenType::SquareBracketOpen, start, "[".to_string()),
                cursor,
            );
        }
        if byte == b']' {
            self.advance(&mut cursor);
            return (
                Token::with_text(TokenType::SquareBracketClose, start, "]".to_string()),
                cursor,
            );
        }
        if byte == b'-'
            && cursor.position + 1 < self.data.len()
            && self.data[cursor.position + 1] == b'>'
        {
            self.advance(&mut cursor);
            self.advance(&mut cursor);
            return (
                Token::with_text(TokenType::Arrow, start, "->".to_string()),
                cursor,
            );
        }
        if byte.is_ascii_alphabetic() || byte == b'_' {
            let mut text = String::new();
            text.push(byte as char);
            self.advance(&mut cursor);
            while cursor.position < self.data.len() {
                let next = self.data[cursor.position];
                if !next.is_ascii_alphanumeric() && next != b'_' {
                    break;
                }
                text.push(next as char);
                self.advance(&mut cursor);
            }
            let ttype = keyword_type(&text).unwrap_or(TokenType::Identifier);
            return (Token::with_text(ttype, start, text), cursor);
        }
        if byte.is_ascii_digit() || byte == b'.' || byte == b'-' {
            return self.scan_number(cursor);
        }
        if byte == b'"' {
            if let Some(result) = self.scan_string(cursor) {
                return result;
            }
        }
        (Token::new(TokenType::Unknown, start), cursor)
    }

    // A maximal run of digits and '.' with an optional leading '-'. A run
    // with no digit at all, or with more than one '.', is not a number and
    // is classified Unknown rather than left for conversion to choke on.
    fn scan_number(&self, mut cursor: Cursor) -> (Token, Cursor) {
        let start = cursor.location();
        let mut text = String::new();
        let mut digits = 0usize;
        let mut dots = 0usize;
        if self.data[cursor.position] == b'-' {
            text.push('-');
            self.advance(&mut cursor);
        }
        while cursor.position < self.data.len() {
            let byte = self.data[cursor.position];
            if byte.is_ascii_digit() {
                digits += 1;
            } else if byte == b'.' {
                dots += 1;
            } else {
                break;
            }
            text.push(byte as char);
            self.advance(&mut cursor);
        }
        let ttype = if digits == 0 || dots > 1 {
            TokenType::Unknown
        } else if dots == 1 {
            TokenType::FloatLiteral
        } else {
            TokenType::IntLiteral
        };
        (Token::with_text(ttype, start, text), cursor)
    }

    // A double-quoted run that must not cross a newline. Returns None on an
    // unterminated string so the caller falls through to Unknown with the
    // cursor still at the opening quote.
    fn scan_string(&self, mut cursor: Cursor) -> Option<(Token, Cursor)> {
        let start = cursor.location();
        let mut bytes = vec![];
        self.advance(&mut cursor);
        let mut escaped = false;
        while cursor.position < self.data.len() {
            let byte = self.data[cursor.position];
            if byte == b'\n' {
                break;
            }
            if escaped {
                match byte {
                    b'n' => bytes.push(b'\n'),
                    b't' => bytes.push(b'\t'),
                    b'\\' => bytes.push(b'\\'),
                    b'"' => bytes.push(b'"'),
                    _ => {
                        self.advance(&mut cursor);
                        return Some((Token::new(TokenType::Unknown, start), cursor));
                    }
                }
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                self.advance(&mut cursor);
                let text = String::from_utf8_lossy(&bytes).into_owned();
                return Some((Token::with_text(TokenType::String, start, text), cursor));
            } else {
                bytes.push(byte);
            }
            self.advance(&mut cursor);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::super::token::{Location, Token, TokenType};
    use super::Tokenizer;

    fn loc(line: u32, column: u32) -> Location {
        Location { line, column }
    }

    #[test]
    fn lexes_a_command_line() {
        let mut tokenizer = Tokenizer::new("CREATE_BUFFER buf SIZE_BYTES 8 INIT_VALUES float 1.0 -2.5\n");
        let expected = vec![
            Token::with_text(TokenType::CreateBuffer, loc(1, 1), "CREATE_BUFFER".to_string()),
            Token::with_text(TokenType::Identifier, loc(1, 15), "buf".to_string()),
            Token::with_text(TokenType::SizeBytes, loc(1, 19), "SIZE_BYTES".to_string()),
            Token::with_text(TokenType::IntLiteral, loc(1, 30), "8".to_string()),
            Token::with_text(TokenType::InitValues, loc(1, 32), "INIT_VALUES".to_string()),
            Token::with_text(TokenType::TypeFloat, loc(1, 44), "float".to_string()),
            Token::with_text(TokenType::FloatLiteral, loc(1, 50), "1.0".to_string()),
            Token::with_text(TokenType::FloatLiteral, loc(1, 54), "-2.5".to_string()),
            Token::new(TokenType::Eos, loc(2, 1)),
        ];
        for want in expected {
            assert_eq!(want, tokenizer.next_token(true));
        }
    }

    #[test]
    fn peek_is_idempotent_and_matches_next() {
        let mut tokenizer = Tokenizer::new("  # leading comment\n  RUN_COMPUTE prog");
        let first = tokenizer.peek_next_token(true);
        for _ in 0..5 {
            assert_eq!(first, tokenizer.peek_next_token(true));
        }
        assert_eq!(first, tokenizer.next_token(true));
        assert_eq!(first.ttype, TokenType::RunCompute);
        let second = tokenizer.peek_next_token(true);
        assert_eq!(second, tokenizer.next_token(true));
        assert_eq!(second.text, "prog");
    }

    #[test]
    fn comments_are_skipped_between_tokens() {
        let mut tokenizer = Tokenizer::new("# one\n# two\nEND # trailing\n[\n");
        assert_eq!(tokenizer.next_token(true).ttype, TokenType::End);
        assert_eq!(tokenizer.next_token(true).ttype, TokenType::SquareBracketOpen);
        assert_eq!(tokenizer.next_token(true).ttype, TokenType::Eos);
    }

    #[test]
    fn arrow_wins_over_minus() {
        let mut tokenizer = Tokenizer::new("0 -> -7");
        assert_eq!(tokenizer.next_token(true).ttype, TokenType::IntLiteral);
        assert_eq!(tokenizer.next_token(true).ttype, TokenType::Arrow);
        let negative = tokenizer.next_token(true);
        assert_eq!(negative.ttype, TokenType::IntLiteral);
        assert_eq!(negative.text, "-7");
    }

    #[test]
    fn malformed_numbers_are_unknown() {
        for text in ["1.2.3", "-", ".", "-."] {
            let mut tokenizer = Tokenizer::new(text);
            let token = tokenizer.next_token(true);
            assert_eq!(token.ttype, TokenType::Unknown, "input {:?}", text);
        }
    }

    #[test]
    fn string_escapes() {
        let mut tokenizer = Tokenizer::new("\"a\\tb\\n\\\"c\\\\\"");
        let token = tokenizer.next_token(true);
        assert_eq!(token.ttype, TokenType::String);
        assert_eq!(token.text, "a\tb\n\"c\\");
    }

    #[test]
    fn unterminated_string_is_unknown() {
        let mut tokenizer = Tokenizer::new("\"no closing quote\nEND");
        let token = tokenizer.peek_next_token(true);
        assert_eq!(token.ttype, TokenType::Unknown);
        assert_eq!(token.location, loc(1, 1));
    }

    #[test]
    fn non_ascii_text_survives_slurping() {
        let mut tokenizer = Tokenizer::new("// häßlich °\nEND\n");
        assert_eq!(tokenizer.skip_line(), "// häßlich °\n");

        let mut tokenizer = Tokenizer::new("\"übergrenze.png\"");
        let token = tokenizer.next_token(true);
        assert_eq!(token.ttype, TokenType::String);
        assert_eq!(token.text, "übergrenze.png");
    }

    #[test]
    fn skip_line_returns_consumed_text() {
        let mut tokenizer = Tokenizer::new("void main() { }\nEND\n");
        assert_eq!(tokenizer.skip_line(), "void main() { }\n");
        assert_eq!(tokenizer.next_token(true).ttype, TokenType::End);
    }

    #[test]
    fn single_line_skip_stops_at_newline() {
        let mut tokenizer = Tokenizer::new("   \nEND");
        let token = tokenizer.skip_single_line_of_whitespace_and_comments();
        assert_eq!(token.ttype, TokenType::String);
        assert_eq!(token.text, "");
        assert_eq!(tokenizer.line(), 2);
    }

    #[test]
    fn single_line_skip_captures_trailing_comment() {
        let mut tokenizer = Tokenizer::new("   #version 320 es\nvoid main");
        let token = tokenizer.skip_single_line_of_whitespace_and_comments();
        assert_eq!(token.ttype, TokenType::String);
        assert_eq!(token.text, "#version 320 es\n");
        assert_eq!(token.location, loc(1, 4));
        assert_eq!(tokenizer.line(), 2);
    }

    #[test]
    fn unknown_does_not_consume() {
        let mut tokenizer = Tokenizer::new("@");
        let token = tokenizer.next_token(true);
        assert_eq!(token.ttype, TokenType::Unknown);
        // The cursor stays put; the parser treats Unknown as fatal.
        assert_eq!(tokenizer.peek_next_token(true).ttype, TokenType::Unknown);
    }
}
