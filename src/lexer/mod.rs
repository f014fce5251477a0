//! A deliberately thin hand-written lexer for Grace source text.
//!
//! The scanner is conceptually an external collaborator of the compiler's
//! core; this module exists only so the crate is exercisable end-to-end
//! from a `.gr` file. It implements exactly Grace's surface token set,
//! nothing more, and is intentionally not the focus of this crate's
//! engineering effort (that is the symbol table, the semantic analyzer,
//! and the code generator).

use crate::ast::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // literals / identifiers
    IntLiteral(i32),
    CharLiteral(u8),
    StringLiteral(Vec<u8>),
    Ident(String),

    // keywords
    Fun,
    Var,
    Ref,
    If,
    Then,
    Else,
    While,
    Do,
    Return,
    And,
    Or,
    Not,
    Div,
    Mod,
    Int,
    Char,
    Nothing,

    // punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,
    Assign, // <-
    Plus,
    Minus,
    Star,
    Eq,
    Hash,
    Lt,
    Gt,
    Le,
    Ge,

    Eof,
}

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub line: u32,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for LexError {}

pub struct Lexer<'src> {
    chars: std::iter::Peekable<std::str::Chars<'src>>,
    line: u32,
}

fn keyword(ident: &str) -> Option<Token> {
    Some(match ident {
        "fun" => Token::Fun,
        "var" => Token::Var,
        "ref" => Token::Ref,
        "if" => Token::If,
        "then" => Token::Then,
        "else" => Token::Else,
        "while" => Token::While,
        "do" => Token::Do,
        "return" => Token::Return,
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "div" => Token::Div,
        "mod" => Token::Mod,
        "int" => Token::Int,
        "char" => Token::Char,
        "nothing" => Token::Nothing,
        _ => return None,
    })
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer {
            chars: source.chars().peekable(),
            line: 1,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<SpannedToken>, LexError> {
        let mut out = Vec::new();
        loop {
            let span = Span::new(self.line);
            let token = self.next_token()?;
            let done = token == Token::Eof;
            out.push(SpannedToken { token, span });
            if done {
                break;
            }
        }
        Ok(out)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut clone = self.chars.clone();
                    clone.next();
                    if clone.peek() == Some(&'/') {
                        while !matches!(self.chars.peek(), Some('\n') | None) {
                            self.bump();
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia();
        let Some(&c) = self.chars.peek() else {
            return Ok(Token::Eof);
        };

        if c.is_ascii_digit() {
            return self.lex_int();
        }
        if c.is_alphabetic() || c == '_' {
            return Ok(self.lex_ident());
        }
        if c == '"' {
            return self.lex_string();
        }
        if c == '\'' {
            return self.lex_char();
        }

        self.bump();
        match c {
            '(' => Ok(Token::LParen),
            ')' => Ok(Token::RParen),
            '[' => Ok(Token::LBracket),
            ']' => Ok(Token::RBracket),
            '{' => Ok(Token::LBrace),
            '}' => Ok(Token::RBrace),
            ',' => Ok(Token::Comma),
            ':' => Ok(Token::Colon),
            ';' => Ok(Token::Semicolon),
            '+' => Ok(Token::Plus),
            '*' => Ok(Token::Star),
            '=' => Ok(Token::Eq),
            '#' => Ok(Token::Hash),
            '-' => {
                if self.chars.peek() == Some(&'>') {
                    self.bump();
                }
                Ok(Token::Minus)
            }
            '<' => match self.chars.peek() {
                Some('-') => {
                    self.bump();
                    Ok(Token::Assign)
                }
                Some('=') => {
                    self.bump();
                    Ok(Token::Le)
                }
                _ => Ok(Token::Lt),
            },
            '>' => {
                if self.chars.peek() == Some(&'=') {
                    self.bump();
                    Ok(Token::Ge)
                } else {
                    Ok(Token::Gt)
                }
            }
            other => Err(LexError {
                message: format!("unexpected character '{other}'"),
                line: self.line,
            }),
        }
    }

    fn lex_int(&mut self) -> Result<Token, LexError> {
        let mut buf = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                buf.push(c);
                self.bump();
            } else {
                break;
            }
        }
        buf.parse::<i32>()
            .map(Token::IntLiteral)
            .map_err(|_| LexError {
                message: format!("invalid integer literal '{buf}'"),
                line: self.line,
            })
    }

    fn lex_ident(&mut self) -> Token {
        let mut buf = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                buf.push(c);
                self.bump();
            } else {
                break;
            }
        }
        keyword(&buf).unwrap_or(Token::Ident(buf))
    }

    fn lex_string(&mut self) -> Result<Token, LexError> {
        let line = self.line;
        self.bump(); // opening quote
        let mut raw = String::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => {
                    raw.push('\\');
                    if let Some(escaped) = self.bump() {
                        raw.push(escaped);
                    }
                }
                Some(c) => raw.push(c),
                None => {
                    return Err(LexError {
                        message: "unterminated string literal".into(),
                        line,
                    })
                }
            }
        }
        let unescaped = unescape::unescape(&raw).ok_or_else(|| LexError {
            message: format!("invalid escape sequence in string literal \"{raw}\""),
            line,
        })?;
        Ok(Token::StringLiteral(unescaped.into_bytes()))
    }

    fn lex_char(&mut self) -> Result<Token, LexError> {
        let line = self.line;
        self.bump(); // opening quote
        let raw = match self.bump() {
            Some('\\') => {
                let escaped = self.bump().ok_or_else(|| LexError {
                    message: "unterminated character literal".into(),
                    line,
                })?;
                format!("\\{escaped}")
            }
            Some(c) => c.to_string(),
            None => {
                return Err(LexError {
                    message: "unterminated character literal".into(),
                    line,
                })
            }
        };
        if self.bump() != Some('\'') {
            return Err(LexError {
                message: "character literal must contain exactly one character".into(),
                line,
            });
        }
        let unescaped = unescape::unescape(&raw).ok_or_else(|| LexError {
            message: format!("invalid escape sequence in character literal '{raw}'"),
            line,
        })?;
        let byte = unescaped.as_bytes().first().copied().ok_or_else(|| LexError {
            message: "empty character literal".into(),
            line,
        })?;
        Ok(Token::CharLiteral(byte))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_keywords_and_punctuation() {
        assert_eq!(
            kinds("fun main() : nothing { }"),
            vec![
                Token::Fun,
                Token::Ident("main".into()),
                Token::LParen,
                Token::RParen,
                Token::Colon,
                Token::Nothing,
                Token::LBrace,
                Token::RBrace,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_assign_and_comparisons() {
        assert_eq!(
            kinds("i <- i + 1; while i <= 3 do"),
            vec![
                Token::Ident("i".into()),
                Token::Assign,
                Token::Ident("i".into()),
                Token::Plus,
                Token::IntLiteral(1),
                Token::Semicolon,
                Token::While,
                Token::Ident("i".into()),
                Token::Le,
                Token::IntLiteral(3),
                Token::Do,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_string_with_escape() {
        assert_eq!(
            kinds(r#""hello\n""#),
            vec![Token::StringLiteral(b"hello\n".to_vec()), Token::Eof]
        );
    }

    #[test]
    fn test_line_tracking() {
        let tokens = Lexer::new("fun\nmain").tokenize().unwrap();
        assert_eq!(tokens[0].span.line, 1);
        assert_eq!(tokens[1].span.line, 2);
    }

    #[test]
    fn test_unterminated_string_errors() {
        assert!(Lexer::new("\"abc").tokenize().is_err());
    }
}
