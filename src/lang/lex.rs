use super::token::{Operator, Token};
use super::{Error, Kind, SymbolTable};
use crate::error;
use crate::mach::{Pool, Word, POOL_SIZE};
use std::convert::TryFrom;

fn is_c_alphabetic(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_c_alphanumeric(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// ## Tokenizer
///
/// Produces one token per call to `next` and interns identifiers into its
/// symbol table. String literals are copied into the data pool, which is
/// later handed to the virtual machine.
///
/// Malformed input never stops the scan. Unterminated literals and stray
/// bytes are recorded in `errors` with their line and byte range.

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    symbols: SymbolTable<'a>,
    data: Pool,
    errors: Vec<Error>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Result<Lexer<'a>, Error> {
        Ok(Lexer::with_pool(src, Pool::data(POOL_SIZE)?))
    }

    pub fn with_pool(src: &'a str, data: Pool) -> Lexer<'a> {
        Lexer {
            src,
            pos: 0,
            line: 1,
            symbols: SymbolTable::with_builtins(),
            data,
            errors: vec![],
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn symbols(&self) -> &SymbolTable<'a> {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable<'a> {
        &mut self.symbols
    }

    pub fn data(&self) -> &Pool {
        &self.data
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn finish(self) -> (SymbolTable<'a>, Pool, Vec<Error>) {
        (self.symbols, self.data, self.errors)
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + n).copied()
    }

    fn error(&mut self, error: Error, start: usize) {
        self.errors
            .push(error.in_line(self.line).in_column(&(start..self.pos)));
    }

    fn comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn alphabetic(&mut self) -> Token {
        let src: &'a str = self.src;
        let start = self.pos;
        while self.peek().map_or(false, is_c_alphanumeric) {
            self.pos += 1;
        }
        let id = self.symbols.intern(&src[start..self.pos]);
        match self.symbols.get(id).map(|s| s.kind()) {
            Some(Kind::Keyword(keyword)) => Token::Keyword(keyword),
            _ => Token::Ident(id),
        }
    }

    fn number(&mut self) -> Token {
        let first = self.src.as_bytes()[self.pos];
        self.pos += 1;
        let mut value = (first - b'0') as Word;
        if value > 0 {
            while let Some(d) = self.peek().filter(u8::is_ascii_digit) {
                value = value.wrapping_mul(10).wrapping_add((d - b'0') as Word);
                self.pos += 1;
            }
        } else if let Some(b'x') | Some(b'X') = self.peek() {
            self.pos += 1;
            while let Some(d) = self.peek().and_then(|c| (c as char).to_digit(16)) {
                value = value.wrapping_mul(16).wrapping_add(d as Word);
                self.pos += 1;
            }
        } else {
            while let Some(d) = self.peek().filter(|c| (b'0'..=b'7').contains(c)) {
                value = value.wrapping_mul(8).wrapping_add((d - b'0') as Word);
                self.pos += 1;
            }
        }
        Token::Num(value)
    }

    /// String or character literal. Only `\n` is translated; any other
    /// escaped character stands for itself.
    fn literal(&mut self) -> Token {
        let start = self.pos;
        let quote = self.src.as_bytes()[self.pos];
        self.pos += 1;
        let addr = self.data.address().to_word();
        let mut value: Word = 0;
        let mut terminated = false;
        let mut overflow = None;
        while let Some(c) = self.peek() {
            if c == quote {
                self.pos += 1;
                terminated = true;
                break;
            }
            if c == b'\0' {
                break;
            }
            self.pos += 1;
            let mut ch = c;
            if c == b'\\' {
                match self.peek() {
                    Some(b'n') => ch = b'\n',
                    Some(b'\n') => {
                        self.line += 1;
                        ch = b'\n';
                    }
                    Some(e) if e != b'\0' => ch = e,
                    _ => break,
                }
                self.pos += 1;
            }
            if c == b'\n' {
                self.line += 1;
            }
            value = ch as Word;
            if quote == b'"' && overflow.is_none() {
                overflow = self.data.push(ch).err();
            }
        }
        if quote == b'"' && overflow.is_none() {
            overflow = self.data.push(0).err();
        }
        if let Some(error) = overflow {
            self.error(error, start);
        }
        if !terminated {
            self.error(error!(UnterminatedLiteral), start);
        }
        if quote == b'"' {
            Token::Num(addr)
        } else {
            Token::Num(value)
        }
    }

    fn minutia(&mut self) -> Option<Token> {
        use Operator::*;
        let start = self.pos;
        let ch = self.src.as_bytes()[self.pos];
        self.pos += 1;
        let double = match (ch, self.peek()) {
            (b'=', Some(b'=')) => Some(Eq),
            (b'!', Some(b'=')) => Some(Ne),
            (b'<', Some(b'=')) => Some(Le),
            (b'<', Some(b'<')) => Some(Shl),
            (b'<', Some(b'-')) => Some(Assign),
            (b'>', Some(b'=')) => Some(Ge),
            (b'>', Some(b'>')) => Some(Shr),
            (b'|', Some(b'|')) => Some(Lor),
            (b'&', Some(b'&')) => Some(Lan),
            (b'+', Some(b'+')) => Some(Inc),
            (b'-', Some(b'-')) => Some(Dec),
            _ => None,
        };
        if let Some(op) = double {
            self.pos += 1;
            return Some(Token::Operator(op));
        }
        if let Ok(op) = Operator::try_from(ch) {
            return Some(Token::Operator(op));
        }
        match ch {
            // A lone `!` has no operator of its own and comes back as itself.
            b'!' | b'~' | b';' | b'{' | b'}' | b'(' | b')' | b']' | b',' | b':' => {
                Some(Token::Punct(ch))
            }
            _ => {
                while self.peek().map_or(false, |c| c & 0xc0 == 0x80) {
                    self.pos += 1;
                }
                let msg = format!("{:?}", &self.src[start..self.pos]);
                self.error(error!(UnrecognizedCharacter; &msg), start);
                None
            }
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let ch = self.peek()?;
            match ch {
                b'\0' => return None,
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                c if c.is_ascii_whitespace() => self.pos += 1,
                b'/' if self.peek_at(1) == Some(b'/') => self.comment(),
                c if is_c_alphabetic(c) => return Some(self.alphabetic()),
                c if c.is_ascii_digit() => return Some(self.number()),
                b'"' | b'\'' => return Some(self.literal()),
                _ => {
                    if let Some(token) = self.minutia() {
                        return Some(token);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ErrorCode;
    use crate::lang::token::Keyword;

    fn lex(s: &str) -> Vec<Token> {
        Lexer::new(s).unwrap().collect()
    }

    #[test]
    fn test_numbers() {
        use Token::Num;
        assert_eq!(
            lex("123 0x7B 0X7b 0173 0"),
            vec![Num(123), Num(123), Num(123), Num(123), Num(0)]
        );
    }

    #[test]
    fn test_octal_stops_at_eight() {
        assert_eq!(lex("078"), vec![Token::Num(7), Token::Num(8)]);
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let mut lexer = Lexer::new("int main while_ sizeof").unwrap();
        assert_eq!(lexer.next(), Some(Token::Keyword(Keyword::Int)));
        let main = match lexer.next() {
            Some(Token::Ident(id)) => id,
            t => panic!("{:?}", t),
        };
        assert_eq!(lexer.symbols().get(main).unwrap().name(), "main");
        assert!(matches!(lexer.next(), Some(Token::Ident(_))));
        assert_eq!(lexer.next(), Some(Token::Keyword(Keyword::Sizeof)));
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn test_line_counting_and_comments() {
        let mut lexer = Lexer::new("a // b c\n\n  d").unwrap();
        assert!(lexer.next().is_some());
        assert_eq!(lexer.line(), 1);
        assert!(lexer.next().is_some());
        assert_eq!(lexer.line(), 3);
        assert_eq!(lexer.next(), None);
        assert_eq!(lexer.symbols().lookup("b"), None);
    }

    #[test]
    fn test_char_literal_is_not_stored() {
        let mut lexer = Lexer::new(r"'a' '\n' '\''").unwrap();
        assert_eq!(lexer.next(), Some(Token::Num(97)));
        assert_eq!(lexer.next(), Some(Token::Num(10)));
        assert_eq!(lexer.next(), Some(Token::Num(39)));
        assert_eq!(lexer.data().top(), 0);
    }

    #[test]
    fn test_escaped_newline_counts_lines() {
        let mut lexer = Lexer::new("\"a\\\nb\" 'x'\n$").unwrap();
        assert!(matches!(lexer.next(), Some(Token::Num(_))));
        assert_eq!(lexer.line(), 2);
        assert_eq!(lexer.next(), Some(Token::Num(b'x' as Word)));
        assert_eq!(lexer.next(), None);
        assert_eq!(lexer.errors()[0].line(), Some(3));
    }

    #[test]
    fn test_unterminated_literal_is_reported() {
        let mut lexer = Lexer::new("x\n\"abc").unwrap();
        lexer.next();
        assert!(matches!(lexer.next(), Some(Token::Num(_))));
        assert_eq!(lexer.next(), None);
        let errors = lexer.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is(ErrorCode::UnterminatedLiteral));
        assert_eq!(errors[0].line(), Some(2));
        assert_eq!(errors[0].column(), 2..6);
    }

    #[test]
    fn test_stray_bytes_are_skipped() {
        let mut lexer = Lexer::new("a @ é b").unwrap();
        assert!(matches!(lexer.next(), Some(Token::Ident(_))));
        assert!(matches!(lexer.next(), Some(Token::Ident(_))));
        assert_eq!(lexer.next(), None);
        assert_eq!(lexer.errors().len(), 2);
        assert!(lexer.errors()[1].is(ErrorCode::UnrecognizedCharacter));
        assert_eq!(lexer.errors()[1].column(), 4..6);
    }

    #[test]
    fn test_string_pool_exhaustion() {
        let mut lexer = Lexer::with_pool("\"abcdef\"", Pool::data(4).unwrap());
        assert!(matches!(lexer.next(), Some(Token::Num(_))));
        assert_eq!(lexer.data().top(), 4);
        assert!(lexer.errors()[0].is(ErrorCode::OutOfMemory));
    }
}
