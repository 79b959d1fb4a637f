use anyhow::anyhow;

use crate::ast::{Token, TokenType};
use crate::dialect::Dialect;

pub struct Scanner {
    source_chars: Vec<char>,
    dialect: Dialect,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: u32,
    col: u32,
}

impl Scanner {
    pub fn new(source: &str, dialect: Dialect) -> Self {
        Self {
            source_chars: source.chars().collect(),
            dialect,
            tokens: vec![],
            start: 0,
            current: 0,
            line: 1,
            col: 0,
        }
    }

    pub fn tokens(&self) -> &Vec<Token> {
        &self.tokens
    }

    fn advance(&mut self) -> char {
        let c = self.source_chars[self.current];
        self.current += 1;
        self.col += 1;
        c
    }

    fn n_advance(&mut self, n: usize) -> char {
        assert!(n > 0);
        let mut c = self.advance();
        for _ in 1..n {
            c = self.advance();
        }
        c
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source_chars.len()
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source_chars[self.current]
        }
    }

    fn peek_prev(&self) -> Option<char> {
        self.peek_prev_i(1)
    }

    fn peek_prev_i(&self, i: usize) -> Option<char> {
        let idx = self.current.checked_sub(i)?;
        Some(self.source_chars[idx])
    }

    fn peek_next_i(&mut self, i: usize) -> char {
        if self.current + i >= self.source_chars.len() {
            '\0'
        } else {
            self.source_chars[self.current + i]
        }
    }

    fn n_peek(&mut self, n: usize) -> Option<&[char]> {
        self.source_chars.get(self.current..self.current + n)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() != expected {
            return false;
        };

        self.current += 1;
        true
    }

    fn add_token(&mut self, token_type: TokenType) {
        self.tokens.push(Token {
            kind: token_type,
            lexeme: self.source_chars[self.start..self.current].iter().collect(),
            line: self.line,
            col: self.col,
        });
    }

    fn current_source_str(&self) -> String {
        self.source_chars[self.start..self.current].iter().collect()
    }

    fn reset(&mut self) {
        self.tokens.clear();
        self.start = 0;
        self.current = 0;
        self.col = 1;
        self.line = 1;
    }

    fn new_line(&mut self) {
        self.line += 1;
        self.col = 1;
    }

    pub fn scan(&mut self) -> anyhow::Result<()> {
        self.reset();
        while self.current < self.source_chars.len() {
            self.start = self.current;
            self.scan_token()?;
        }
        self.tokens.push(Token {
            kind: TokenType::Eof,
            lexeme: String::from("eof"),
            line: self.line,
            col: self.col,
        });

        Ok(())
    }

    fn scan_string(&mut self, delimiter: char) -> anyhow::Result<()> {
        loop {
            let peek_char = self.peek();
            if peek_char == '\0' {
                return Err(anyhow!(self.error_str("Found unterminated string")));
            }
            let escaped = self.peek_prev().is_some_and(|prev| {
                prev == '\\' && self.peek_prev_i(2).is_some_and(|prev_2| prev_2 != '\\')
            });
            if !escaped && self.match_char(delimiter) {
                // A doubled delimiter is an escaped quote, not a terminator
                if self.match_char(delimiter) {
                    continue;
                }
                break;
            }
            if peek_char == '\n' {
                self.new_line();
            }
            self.advance();
        }
        Ok(())
    }

    fn match_string(&mut self, delimiter: char) -> anyhow::Result<()> {
        self.scan_string(delimiter)?;
        let str_slice = self.source_chars[self.start + 1..self.current - 1]
            .iter()
            .collect::<String>();
        self.add_token(TokenType::String(str_slice));
        Ok(())
    }

    fn match_quoted_identifier(&mut self, closing: char) -> anyhow::Result<()> {
        let mut content = String::new();
        loop {
            if self.is_at_end() {
                return Err(anyhow!(
                    self.error_str("Found unterminated quoted identifier")
                ));
            }
            let curr_char = self.advance();
            if curr_char == closing {
                // Doubled closing delimiters stand for a literal one
                if self.peek() == closing {
                    content.push(closing);
                    self.advance();
                    continue;
                }
                if content.is_empty() {
                    return Err(anyhow!(self.error_str("Found empty quoted identifier")));
                }
                self.add_token(TokenType::QuotedIdentifier(content));
                break;
            }
            if curr_char == '\n' {
                self.new_line();
            }
            content.push(curr_char);
        }
        Ok(())
    }

    fn match_number(&mut self) -> anyhow::Result<()> {
        let mut found_dot = false;
        let mut found_e = false;
        loop {
            let peek_char = self.peek();

            if peek_char == '\0' {
                self.add_token(TokenType::Number(self.current_source_str()));
                break;
            }

            if peek_char == '.' {
                if found_dot || found_e {
                    return Err(anyhow!(self.error_str("Found invalid number")));
                }
                found_dot = true;
                self.advance();
            } else if peek_char == 'e' || peek_char == 'E' {
                if found_e {
                    return Err(anyhow!(self.error_str("Found invalid number")));
                }
                found_e = true;
                let peek_next_char = self.peek_next_i(1);
                if peek_next_char == '+' || peek_next_char == '-' {
                    self.advance();
                    if !(self.peek_next_i(1).is_ascii_digit()) {
                        return Err(anyhow!(self.error_str("Found invalid number")));
                    }
                    self.advance();
                } else if peek_next_char.is_ascii_digit() {
                    self.advance();
                } else {
                    return Err(anyhow!(self.error_str("Found invalid number")));
                }
            } else if peek_char.is_ascii_digit() {
                self.advance();
            } else {
                self.add_token(TokenType::Number(self.current_source_str()));
                break;
            }
        }

        Ok(())
    }

    fn match_keyword_or_identifier(&mut self) {
        loop {
            let peek_char = self.peek();
            if !(peek_char.is_alphanumeric() || peek_char == '_') {
                break;
            }
            self.advance();
        }
        let identifier: String = self.source_chars[self.start..self.current].iter().collect();

        match identifier.to_lowercase().as_str() {
            "all" => self.add_token(TokenType::All),
            "and" => self.add_token(TokenType::And),
            "as" => self.add_token(TokenType::As),
            "asc" => self.add_token(TokenType::Asc),
            "between" => self.add_token(TokenType::Between),
            "by" => self.add_token(TokenType::By),
            "case" => self.add_token(TokenType::Case),
            "create" => self.add_token(TokenType::Create),
            "cross" => self.add_token(TokenType::Cross),
            "desc" => self.add_token(TokenType::Desc),
            "distinct" => self.add_token(TokenType::Distinct),
            "else" => self.add_token(TokenType::Else),
            "end" => self.add_token(TokenType::End),
            "except" => self.add_token(TokenType::Except),
            "exists" => self.add_token(TokenType::Exists),
            "from" => self.add_token(TokenType::From),
            "full" => self.add_token(TokenType::Full),
            "group" => self.add_token(TokenType::Group),
            "having" => self.add_token(TokenType::Having),
            "in" => self.add_token(TokenType::In),
            "inner" => self.add_token(TokenType::Inner),
            "intersect" => self.add_token(TokenType::Intersect),
            "into" => self.add_token(TokenType::Into),
            "is" => self.add_token(TokenType::Is),
            "join" => self.add_token(TokenType::Join),
            "left" => self.add_token(TokenType::Left),
            "like" => self.add_token(TokenType::Like),
            "limit" => self.add_token(TokenType::Limit),
            "merge" => self.add_token(TokenType::Merge),
            "natural" => self.add_token(TokenType::Natural),
            "not" => self.add_token(TokenType::Not),
            "null" => self.add_token(TokenType::Null),
            "on" => self.add_token(TokenType::On),
            "or" => self.add_token(TokenType::Or),
            "order" => self.add_token(TokenType::Order),
            "outer" => self.add_token(TokenType::Outer),
            "right" => self.add_token(TokenType::Right),
            "select" => self.add_token(TokenType::Select),
            "then" => self.add_token(TokenType::Then),
            "union" => self.add_token(TokenType::Union),
            "using" => self.add_token(TokenType::Using),
            "when" => self.add_token(TokenType::When),
            "where" => self.add_token(TokenType::Where),
            "with" => self.add_token(TokenType::With),
            _ => self.add_token(TokenType::Identifier(self.current_source_str())),
        }
    }

    fn scan_token(&mut self) -> anyhow::Result<()> {
        let curr_char = self.advance();
        match curr_char {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            ']' => self.add_token(TokenType::RightSquare),
            '*' => self.add_token(TokenType::Star),
            ',' => self.add_token(TokenType::Comma),
            ':' => self.add_token(TokenType::Colon),
            ';' => self.add_token(TokenType::Semicolon),
            '.' => {
                let peek_char = self.peek();
                if peek_char.is_ascii_digit() {
                    self.match_number()?;
                } else {
                    self.add_token(TokenType::Dot);
                }
            }
            '+' => self.add_token(TokenType::Plus),
            '%' => self.add_token(TokenType::Percent),
            '=' => self.add_token(TokenType::Equal),
            '/' => {
                if self.match_char('*') {
                    loop {
                        if self.peek() == '\0' {
                            return Err(anyhow!(self.error_str("Found unterminated comment")));
                        }
                        if self.peek() == '\n' {
                            self.new_line();
                        }
                        let peek_chars = self.n_peek(2);
                        if peek_chars.is_some()
                            && peek_chars
                                .unwrap()
                                .iter()
                                .zip("*/".chars())
                                .all(|(&c1, c2)| c1 == c2)
                        {
                            self.n_advance(2);
                            break;
                        }
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::Slash)
                }
            }
            '#' => loop {
                let peek_char = self.peek();
                if peek_char == '\n' || peek_char == '\0' {
                    break;
                }
                self.advance();
            },
            '-' => {
                if self.match_char('-') {
                    loop {
                        let peek_char = self.peek();
                        if peek_char == '\n' || peek_char == '\0' {
                            break;
                        }
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::Minus)
                }
            }
            '<' => {
                if self.match_char('>') {
                    self.add_token(TokenType::NotEqual);
                } else if self.match_char('=') {
                    self.add_token(TokenType::LessEqual);
                } else if self.match_char('<') {
                    self.add_token(TokenType::BitwiseLeftShift);
                } else {
                    self.add_token(TokenType::Less);
                }
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenType::BangEqual);
                } else {
                    self.add_token(TokenType::Bang);
                }
            }
            '>' => {
                if self.match_char('=') {
                    self.add_token(TokenType::GreaterEqual);
                } else if self.match_char('>') {
                    self.add_token(TokenType::BitwiseRightShift);
                } else {
                    self.add_token(TokenType::Greater);
                }
            }
            '~' => {
                self.add_token(TokenType::BitwiseNot);
            }
            '&' => {
                self.add_token(TokenType::BitwiseAnd);
            }
            '|' => {
                if self.match_char('|') {
                    self.add_token(TokenType::ConcatOperator);
                } else {
                    self.add_token(TokenType::BitwiseOr);
                }
            }
            '^' => {
                self.add_token(TokenType::BitwiseXor);
            }
            '\n' => {
                self.new_line();
            }
            '\r' | ' ' | '\t' => {}

            '\'' => {
                self.match_string('\'')?;
            }

            '"' => {
                if self.dialect.double_quoted_identifiers() {
                    self.match_quoted_identifier('"')?;
                } else {
                    self.match_string('"')?;
                }
            }

            '`' => {
                if self.dialect.backtick_identifiers() {
                    self.match_quoted_identifier('`')?;
                } else {
                    return Err(anyhow!(self.error_str(&format!(
                        "Backtick-quoted identifiers are not valid in the {} dialect",
                        self.dialect
                    ))));
                }
            }

            '[' => {
                if self.dialect.bracket_identifiers() {
                    self.match_quoted_identifier(']')?;
                } else {
                    self.add_token(TokenType::LeftSquare);
                }
            }

            // numeric
            c if c.is_ascii_digit() => {
                self.match_number()?;
            }

            // Keywords and identifiers
            c if c.is_alphabetic() || c == '_' => {
                self.match_keyword_or_identifier();
            }

            _ => {
                return Err(anyhow!(self.error_str(&format!(
                    "Found unexpected character while scanning: {}",
                    curr_char
                ))));
            }
        }
        Ok(())
    }

    fn error_str(&mut self, error: &str) -> String {
        format!(
            "[line: {}, col: {}] Scanner error: {}",
            self.line, self.col, error
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_kinds(sql: &str, dialect: Dialect) -> Vec<TokenType> {
        let mut scanner = Scanner::new(sql, dialect);
        scanner.scan().unwrap();
        scanner.tokens().iter().map(|tok| tok.kind.clone()).collect()
    }

    #[test]
    fn test_doubled_quote_stays_inside_string() {
        let kinds = scan_kinds("select 'it''s'", Dialect::Ansi);
        assert!(kinds.contains(&TokenType::String("it''s".to_owned())));
    }

    #[test]
    fn test_quoted_identifier_keeps_case() {
        let kinds = scan_kinds(r#"select "MyCol" from t"#, Dialect::Ansi);
        assert!(kinds.contains(&TokenType::QuotedIdentifier("MyCol".to_owned())));
    }

    #[test]
    fn test_double_quotes_are_strings_for_backtick_dialects() {
        let kinds = scan_kinds(r#"select "MyCol" from t"#, Dialect::Mysql);
        assert!(kinds.contains(&TokenType::String("MyCol".to_owned())));
    }

    #[test]
    fn test_bracket_identifiers_only_in_mssql() {
        let kinds = scan_kinds("select a from [My Table]", Dialect::Mssql);
        assert!(kinds.contains(&TokenType::QuotedIdentifier("My Table".to_owned())));

        let kinds = scan_kinds("select arr[0] from t", Dialect::Ansi);
        assert!(kinds.contains(&TokenType::LeftSquare));
    }

    #[test]
    fn test_backticks_error_outside_backtick_dialects() {
        let mut scanner = Scanner::new("select `a` from t", Dialect::Snowflake);
        assert!(scanner.scan().is_err());
    }

    #[test]
    fn test_unterminated_string_errors() {
        let mut scanner = Scanner::new("select 'abc", Dialect::Ansi);
        assert!(scanner.scan().is_err());
    }

    #[test]
    fn test_comments_are_skipped() {
        let kinds = scan_kinds("-- line\nselect /* block */ a # tail", Dialect::Ansi);
        assert_eq!(
            kinds,
            vec![
                TokenType::Select,
                TokenType::Identifier("a".to_owned()),
                TokenType::Eof
            ]
        );
    }
}
