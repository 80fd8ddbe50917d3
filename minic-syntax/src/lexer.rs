use std::str::Chars;
use minic_errors::Reporter;
use position::{Position, Spanned};
use tokens::{Keyword, Token};


pub fn lex(source: &str, reporter: Reporter) -> Vec<Spanned<Token>> {
    let mut lexer = Lexer::new(source, reporter);
    let mut tokens = Vec::new();
    while let Some(tok) = lexer.next_token() {
        tokens.push(tok);
    }
    tokens
}

struct Lexer<'a> {
    chars: Chars<'a>,
    next_char: Option<char>,
    current_pos: Position,
    reporter: Reporter,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str, reporter: Reporter) -> Self {
        let mut chars = source.chars();
        let next_char = chars.next();
        Lexer {
            chars,
            next_char,
            current_pos: Position::new(0, 0),
            reporter,
        }
    }

    fn peek(&self) -> Option<char> {
        self.next_char
    }

    fn advance(&mut self) {
        match self.next_char {
            Some('\n') => {
                self.current_pos.line += 1;
                self.current_pos.column = 0;
            }
            Some(_) => {
                self.current_pos.column += 1;
            }
            None => {}
        }
        self.next_char = self.chars.next();
    }

    fn check(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self) -> Option<char> {
        let result = self.peek();
        self.advance();
        result
    }

    fn single_char(&mut self, tok: Token) -> Spanned<Token> {
        let start = self.current_pos;
        self.advance();
        let span = start.to(self.current_pos);
        Spanned::new(tok, span)
    }

    fn test_second(&mut self, ch: char, if_one: Token, if_two: Token) -> Spanned<Token> {
        let start = self.current_pos;
        self.advance();
        let tok = if self.check(ch) { if_two } else { if_one };
        let span = start.to(self.current_pos);
        Spanned::new(tok, span)
    }

    fn skip_line_comment(&mut self) {
        loop {
            match self.consume() {
                Some('\n') | None => break,
                _ => {}
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let start = self.current_pos;
        self.advance();
        self.advance();
        let opener_span = start.to(self.current_pos);
        loop {
            match self.consume() {
                Some('*') => {
                    if self.check('/') {
                        break;
                    }
                }
                None => {
                    self.reporter.error("unterminated block comment", opener_span);
                    break;
                }
                _ => {}
            }
        }
    }

    fn lex_number(&mut self) -> Spanned<Token> {
        let start = self.current_pos;
        let mut value: i64 = 0;
        let mut overflow = false;
        while let Some(ch) = self.peek() {
            match ch.to_digit(10) {
                Some(digit) => {
                    self.advance();
                    value = value * 10 + i64::from(digit);
                    if value > i64::from(::std::i32::MAX) {
                        overflow = true;
                        value = 0;
                    }
                }
                None => break,
            }
        }
        let span = start.to(self.current_pos);
        if overflow {
            self.reporter.error("number literal is too large", span);
            Spanned::new(Token::Error, span)
        } else {
            Spanned::new(Token::Number(value as i32), span)
        }
    }

    fn lex_ident(&mut self) -> Spanned<Token> {
        let start = self.current_pos;
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        let span = start.to(self.current_pos);
        let tok = match name.as_str() {
            "int" => Token::Keyword(Keyword::Int),
            "char" => Token::Keyword(Keyword::Char),
            "if" => Token::Keyword(Keyword::If),
            "else" => Token::Keyword(Keyword::Else),
            "return" => Token::Keyword(Keyword::Return),
            _ => Token::Ident(name),
        };
        Spanned::new(tok, span)
    }

    fn lex_char(&mut self) -> Spanned<Token> {
        let start = self.current_pos;
        self.advance();
        let value = match self.consume() {
            Some('\\') => match self.consume() {
                Some('n') => Some(b'\n'),
                Some('t') => Some(b'\t'),
                Some('r') => Some(b'\r'),
                Some('0') => Some(0),
                Some('\\') => Some(b'\\'),
                Some('\'') => Some(b'\''),
                Some('"') => Some(b'"'),
                _ => None,
            },
            Some('\'') | None => None,
            Some(ch) if (ch as u32) < 128 => Some(ch as u8),
            Some(_) => None,
        };
        let closed = self.check('\'');
        let span = start.to(self.current_pos);
        match (value, closed) {
            (Some(value), true) => Spanned::new(Token::Char(value), span),
            _ => {
                self.reporter.error("malformed character literal", span);
                Spanned::new(Token::Error, span)
            }
        }
    }

    fn next_token(&mut self) -> Option<Spanned<Token>> {
        loop {
            let tok = match self.peek() {
                None => return None,
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                    continue;
                }
                Some('/') => {
                    let start = self.current_pos;
                    match self.chars.clone().next() {
                        Some('/') => {
                            self.skip_line_comment();
                            continue;
                        }
                        Some('*') => {
                            self.skip_block_comment();
                            continue;
                        }
                        _ => {
                            self.advance();
                            Spanned::new(Token::Slash, start.to(self.current_pos))
                        }
                    }
                }
                Some(ch) if ch.is_ascii_digit() => self.lex_number(),
                Some(ch) if ch.is_alphabetic() || ch == '_' => self.lex_ident(),
                Some('\'') => self.lex_char(),
                Some('+') => self.single_char(Token::Plus),
                Some('-') => self.single_char(Token::Minus),
                Some('*') => self.single_char(Token::Star),
                Some('%') => self.single_char(Token::Percent),
                Some('(') => self.single_char(Token::LeftParen),
                Some(')') => self.single_char(Token::RightParen),
                Some('{') => self.single_char(Token::LeftBrace),
                Some('}') => self.single_char(Token::RightBrace),
                Some(',') => self.single_char(Token::Comma),
                Some(';') => self.single_char(Token::Semicolon),
                Some('^') => self.single_char(Token::Caret),
                Some('=') => self.test_second('=', Token::Assign, Token::Equal),
                Some('!') => self.test_second('=', Token::Not, Token::NotEqual),
                Some('<') => self.test_second('=', Token::Less, Token::LessEqual),
                Some('>') => self.test_second('=', Token::Greater, Token::GreaterEqual),
                Some('&') => self.test_second('&', Token::Ampersand, Token::And),
                Some('|') => self.test_second('|', Token::Pipe, Token::Or),
                Some(ch) => {
                    let start = self.current_pos;
                    self.advance();
                    let span = start.to(self.current_pos);
                    self.reporter
                        .error(format!("unknown character: `{}`", ch), span);
                    Spanned::new(Token::Error, span)
                }
            };
            return Some(tok);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minic_errors::Reporter;

    fn lex_ok(source: &str) -> Vec<Token> {
        let reporter = Reporter::new();
        let tokens = lex(source, reporter.clone());
        assert!(!reporter.has_errors());
        tokens
            .into_iter()
            .map(Spanned::into_value)
            .collect()
    }

    #[test]
    fn lex_simple_function() {
        let tokens = lex_ok("int main() { return 42; }");
        assert_eq!(
            tokens,
            vec![
                Token::Keyword(Keyword::Int),
                Token::Ident("main".into()),
                Token::LeftParen,
                Token::RightParen,
                Token::LeftBrace,
                Token::Keyword(Keyword::Return),
                Token::Number(42),
                Token::Semicolon,
                Token::RightBrace,
            ]
        );
    }

    #[test]
    fn lex_operators() {
        let tokens = lex_ok("a <= b && c || d ^ !e % f");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("a".into()),
                Token::LessEqual,
                Token::Ident("b".into()),
                Token::And,
                Token::Ident("c".into()),
                Token::Or,
                Token::Ident("d".into()),
                Token::Caret,
                Token::Not,
                Token::Ident("e".into()),
                Token::Percent,
                Token::Ident("f".into()),
            ]
        );
    }

    #[test]
    fn lex_char_literals() {
        let tokens = lex_ok(r"'H' '\n' '\''");
        assert_eq!(
            tokens,
            vec![Token::Char(b'H'), Token::Char(b'\n'), Token::Char(b'\'')]
        );
    }

    #[test]
    fn lex_comments() {
        let tokens = lex_ok("1 // comment\n/* block\n comment */ 2");
        assert_eq!(tokens, vec![Token::Number(1), Token::Number(2)]);
    }

    #[test]
    fn lex_reports_unknown_character() {
        let reporter = Reporter::new();
        lex("int @", reporter.clone());
        assert!(reporter.has_errors());
    }

    #[test]
    fn lex_tracks_lines() {
        let reporter = Reporter::new();
        let tokens = lex("int\nmain", reporter);
        assert_eq!(Spanned::span(&tokens[1]).start.line, 1);
    }
}
