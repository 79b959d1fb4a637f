use anyhow::anyhow;
use strum::IntoDiscriminant;

use crate::ast::{
    ClauseSet, FromItem, JoinCondition, JoinItem, JoinKind, Name, SelectItem, TablePath,
    TableSource, Token, TokenType, TokenTypeVariant,
};
use crate::dialect::Dialect;
use crate::scanner::Scanner;

pub struct Parser<'a> {
    source_tokens: &'a Vec<Token>,
    curr: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a Vec<Token>) -> Parser<'a> {
        Self {
            source_tokens: tokens,
            curr: 0,
        }
    }

    fn peek_prev(&self) -> &Token {
        &self.source_tokens[self.curr - 1]
    }

    fn peek(&self) -> &Token {
        &self.source_tokens[self.curr]
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            // Do not advance if we peek Eof
            self.curr += 1;
        }
        self.peek_prev()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenType::Eof
    }

    fn check_token_type(&self, token_type: TokenTypeVariant) -> bool {
        self.peek().kind.discriminant() == token_type
    }

    fn match_token_type(&mut self, token_type: TokenTypeVariant) -> bool {
        if self.check_token_type(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_token_types(&mut self, token_types: &[TokenTypeVariant]) -> bool {
        for tok in token_types {
            if self.check_token_type(*tok) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check_identifier(&self) -> bool {
        self.check_token_type(TokenTypeVariant::Identifier)
            || self.check_token_type(TokenTypeVariant::QuotedIdentifier)
    }

    fn consume(&mut self, token_type: TokenTypeVariant) -> anyhow::Result<&Token> {
        if self.check_token_type(token_type) {
            Ok(self.advance())
        } else {
            let err_msg = format!("Expected `{}`.", token_type.variant_str());
            Err(anyhow!(self.error(self.peek(), &err_msg)))
        }
    }

    fn consume_identifier(&mut self) -> anyhow::Result<&Token> {
        self.consume_one_of(&[
            TokenTypeVariant::Identifier,
            TokenTypeVariant::QuotedIdentifier,
        ])
    }

    fn consume_one_of(&mut self, token_types: &[TokenTypeVariant]) -> anyhow::Result<&Token> {
        for token_type in token_types {
            if self.check_token_type(*token_type) {
                return Ok(self.advance());
            }
        }
        let err_msg = token_types
            .iter()
            .map(|el| format!("`{}`", el.variant_str()))
            .collect::<Vec<String>>()
            .join(" or ");
        Err(anyhow!(self.error(
            self.peek(),
            &format!("Expected one of: {}.", err_msg)
        )))
    }

    fn error(&self, token: &Token, message: &str) -> String {
        format!(
            "[line {}, col {}] Error {}: {}",
            token.line,
            token.col,
            &format!("at '{}'", token.lexeme),
            message
        )
    }

    /// Extracts the clauses of the first SELECT body in the token stream.
    pub fn parse(&mut self) -> anyhow::Result<ClauseSet> {
        self.skip_to_select()?;
        self.consume(TokenTypeVariant::Select)?;

        let select_items = self.parse_select_items()?;

        let mut from_items = vec![];
        let mut join_items = vec![];
        if self.match_token_type(TokenTypeVariant::From) {
            from_items = self.parse_from_items()?;
            while self.check_join_head() {
                join_items.push(self.parse_join_item()?);
            }
        }

        let mut where_predicate = None;
        if self.match_token_type(TokenTypeVariant::Where) {
            where_predicate = Some(self.parse_predicate_tokens());
        }

        Ok(ClauseSet {
            select_items,
            from_items,
            join_items,
            where_predicate,
        })
    }

    // Statement preambles (CREATE ... AS, a cleaned MERGE ... USING remnant)
    // are not lineage-bearing on their own: the lineage comes from the first
    // SELECT body, wherever it sits, including inside parentheses.
    fn skip_to_select(&mut self) -> anyhow::Result<()> {
        loop {
            if self.check_token_type(TokenTypeVariant::Select) {
                return Ok(());
            }
            if self.check_token_type(TokenTypeVariant::Eof) {
                return Err(anyhow!(self.error(self.peek(), "Expected `SELECT`.")));
            }
            self.advance();
        }
    }

    // select_items -> ["DISTINCT" | "ALL"] select_item ("," select_item)*
    fn parse_select_items(&mut self) -> anyhow::Result<Vec<SelectItem>> {
        self.match_token_types(&[TokenTypeVariant::Distinct, TokenTypeVariant::All]);
        let mut items = vec![self.parse_select_item()?];
        while self.match_token_type(TokenTypeVariant::Comma) {
            items.push(self.parse_select_item()?);
        }
        Ok(items)
    }

    // select_item -> expr [["AS"] alias]
    //
    // The expression is kept as an opaque token run; only the alias is
    // structurally interesting to the clause consumers.
    fn parse_select_item(&mut self) -> anyhow::Result<SelectItem> {
        let mut expr: Vec<Token> = vec![];
        let mut alias: Option<Name> = None;
        let mut depth = 0u32;
        loop {
            if self.check_token_type(TokenTypeVariant::Eof) {
                break;
            }
            if depth == 0 && (self.check_select_boundary() || self.check_token_type(TokenTypeVariant::Comma)) {
                break;
            }
            if depth == 0 && self.match_token_type(TokenTypeVariant::As) {
                alias = Some(Name::from_token(self.consume_identifier()?));
                continue;
            }
            if self.check_token_type(TokenTypeVariant::LeftParen) {
                depth += 1;
            } else if self.check_token_type(TokenTypeVariant::RightParen) {
                if depth == 0 {
                    // closing paren of an enclosing subquery
                    break;
                }
                depth -= 1;
            }
            expr.push(self.advance().clone());
        }

        if expr.is_empty() && alias.is_none() {
            return Err(anyhow!(self.error(self.peek(), "Expected a select expression.")));
        }

        // A trailing bare identifier right after a completed expression is an
        // implicit alias, e.g. `select count(*) cnt`.
        if alias.is_none() && expr.len() >= 2 {
            let trailing_ident = matches!(
                expr.last().map(|tok| &tok.kind),
                Some(TokenType::Identifier(_) | TokenType::QuotedIdentifier(_))
            );
            let prev_ends_expr = matches!(
                expr.get(expr.len() - 2).map(|tok| &tok.kind),
                Some(
                    TokenType::Identifier(_)
                        | TokenType::QuotedIdentifier(_)
                        | TokenType::String(_)
                        | TokenType::Number(_)
                        | TokenType::RightParen
                        | TokenType::RightSquare
                        | TokenType::Star
                        | TokenType::End
                        | TokenType::Null
                )
            );
            if trailing_ident && prev_ends_expr {
                let tok = expr.pop().unwrap();
                alias = Some(Name::from_token(&tok));
            }
        }

        Ok(SelectItem { expr, alias })
    }

    fn check_select_boundary(&self) -> bool {
        self.check_token_type(TokenTypeVariant::From) || self.check_clause_boundary()
    }

    fn check_clause_boundary(&self) -> bool {
        self.check_token_type(TokenTypeVariant::Where)
            || self.check_token_type(TokenTypeVariant::Group)
            || self.check_token_type(TokenTypeVariant::Having)
            || self.check_token_type(TokenTypeVariant::Order)
            || self.check_token_type(TokenTypeVariant::Limit)
            || self.check_token_type(TokenTypeVariant::Union)
            || self.check_token_type(TokenTypeVariant::Intersect)
            || self.check_token_type(TokenTypeVariant::Except)
            || self.check_token_type(TokenTypeVariant::Semicolon)
            || self.check_token_type(TokenTypeVariant::Eof)
    }

    fn check_join_head(&self) -> bool {
        self.check_token_type(TokenTypeVariant::Join)
            || self.check_token_type(TokenTypeVariant::Inner)
            || self.check_token_type(TokenTypeVariant::Left)
            || self.check_token_type(TokenTypeVariant::Right)
            || self.check_token_type(TokenTypeVariant::Full)
            || self.check_token_type(TokenTypeVariant::Cross)
            || self.check_token_type(TokenTypeVariant::Natural)
    }

    // from_items -> from_item ("," from_item)*
    fn parse_from_items(&mut self) -> anyhow::Result<Vec<FromItem>> {
        let mut items = vec![self.parse_from_item()?];
        while self.match_token_type(TokenTypeVariant::Comma) {
            items.push(self.parse_from_item()?);
        }
        Ok(items)
    }

    // from_item -> table_source [["AS"] alias]
    fn parse_from_item(&mut self) -> anyhow::Result<FromItem> {
        let source = self.parse_table_source()?;
        let alias = self.parse_alias()?;
        Ok(FromItem { source, alias })
    }

    // table_source -> table_path | "(" subquery ")"
    fn parse_table_source(&mut self) -> anyhow::Result<TableSource> {
        if self.match_token_type(TokenTypeVariant::LeftParen) {
            self.skip_balanced_parens()?;
            return Ok(TableSource::Subquery);
        }
        Ok(TableSource::Table(self.parse_table_path()?))
    }

    // table_path -> identifier ("." identifier)*
    fn parse_table_path(&mut self) -> anyhow::Result<TablePath> {
        let mut parts = vec![Name::from_token(self.consume_identifier()?)];
        while self.match_token_type(TokenTypeVariant::Dot) {
            parts.push(Name::from_token(self.consume_identifier()?));
        }
        Ok(TablePath { parts })
    }

    // alias -> ["AS"] (identifier | quoted_identifier)
    fn parse_alias(&mut self) -> anyhow::Result<Option<Name>> {
        if self.match_token_type(TokenTypeVariant::As) {
            return Ok(Some(Name::from_token(self.consume_identifier()?)));
        }
        if self.check_identifier() {
            return Ok(Some(Name::from_token(self.advance())));
        }
        Ok(None)
    }

    // The subquery body is opaque to the outer query; only its alias takes
    // part in binding.
    fn skip_balanced_parens(&mut self) -> anyhow::Result<()> {
        let mut depth = 1u32;
        loop {
            if self.check_token_type(TokenTypeVariant::Eof) {
                return Err(anyhow!(self.error(self.peek(), "Expected `)`.")));
            }
            if self.match_token_type(TokenTypeVariant::LeftParen) {
                depth += 1;
            } else if self.match_token_type(TokenTypeVariant::RightParen) {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            } else {
                self.advance();
            }
        }
    }

    // join_item -> ["NATURAL"] ["INNER" | ("LEFT" | "RIGHT" | "FULL") ["OUTER"] | "CROSS"] "JOIN"
    //              table_source [["AS"] alias] [join_condition]
    fn parse_join_item(&mut self) -> anyhow::Result<JoinItem> {
        self.match_token_type(TokenTypeVariant::Natural);
        let kind = if self.match_token_type(TokenTypeVariant::Inner) {
            JoinKind::Inner
        } else if self.match_token_type(TokenTypeVariant::Left) {
            self.match_token_type(TokenTypeVariant::Outer);
            JoinKind::Left
        } else if self.match_token_type(TokenTypeVariant::Right) {
            self.match_token_type(TokenTypeVariant::Outer);
            JoinKind::Right
        } else if self.match_token_type(TokenTypeVariant::Full) {
            self.match_token_type(TokenTypeVariant::Outer);
            JoinKind::Full
        } else if self.match_token_type(TokenTypeVariant::Cross) {
            JoinKind::Cross
        } else {
            JoinKind::Inner
        };
        self.consume(TokenTypeVariant::Join)?;

        let source = self.parse_table_source()?;
        let alias = self.parse_alias()?;
        let condition = self.parse_join_condition()?;

        Ok(JoinItem {
            kind,
            source,
            alias,
            condition,
        })
    }

    // join_condition -> "ON" predicate
    //                 | "USING" "(" identifier ("," identifier)* ")"
    fn parse_join_condition(&mut self) -> anyhow::Result<JoinCondition> {
        if self.match_token_type(TokenTypeVariant::On) {
            return Ok(JoinCondition::On(self.parse_predicate_tokens()));
        }
        if self.match_token_type(TokenTypeVariant::Using) {
            self.consume(TokenTypeVariant::LeftParen)?;
            let mut columns = vec![Name::from_token(self.consume_identifier()?)];
            while self.match_token_type(TokenTypeVariant::Comma) {
                columns.push(Name::from_token(self.consume_identifier()?));
            }
            self.consume(TokenTypeVariant::RightParen)?;
            return Ok(JoinCondition::Using(columns));
        }
        Ok(JoinCondition::None)
    }

    // Predicate text is collected as an opaque token run up to the next
    // clause boundary; the join-graph walk gives it structure later.
    fn parse_predicate_tokens(&mut self) -> Vec<Token> {
        let mut tokens = vec![];
        let mut depth = 0u32;
        loop {
            if self.check_token_type(TokenTypeVariant::Eof) {
                break;
            }
            if depth == 0 && (self.check_clause_boundary() || self.check_join_head()) {
                break;
            }
            if self.check_token_type(TokenTypeVariant::LeftParen) {
                depth += 1;
            } else if self.check_token_type(TokenTypeVariant::RightParen) {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            tokens.push(self.advance().clone());
        }
        tokens
    }
}

pub fn extract_clauses(sql: &str, dialect: Dialect) -> anyhow::Result<ClauseSet> {
    log::debug!("Extracting clauses from {:.50}", sql);

    let mut scanner = Scanner::new(sql, dialect);

    scanner.scan()?;

    log::debug!("Tokens:");
    scanner
        .tokens()
        .iter()
        .for_each(|tok| log::debug!("{:?}", tok));

    let mut parser = Parser::new(scanner.tokens());
    parser.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sql: &str) -> ClauseSet {
        extract_clauses(sql, Dialect::Ansi).unwrap()
    }

    #[test]
    fn test_skips_create_preamble() {
        let clauses = parse("create or replace view v as select a from t");
        assert_eq!(clauses.from_items.len(), 1);
    }

    #[test]
    fn test_implicit_and_explicit_select_aliases() {
        let clauses = parse("select count(*) cnt, a.x as total from t a");
        assert_eq!(
            clauses.select_items[0]
                .alias
                .as_ref()
                .map(|name| name.text.as_str()),
            Some("cnt")
        );
        assert_eq!(
            clauses.select_items[1]
                .alias
                .as_ref()
                .map(|name| name.text.as_str()),
            Some("total")
        );
    }

    #[test]
    fn test_subquery_source_is_opaque() {
        let clauses = parse("select s.a from (select a from t where a > 1) s");
        assert!(matches!(clauses.from_items[0].source, TableSource::Subquery));
        assert_eq!(
            clauses.from_items[0]
                .alias
                .as_ref()
                .map(|name| name.text.as_str()),
            Some("s")
        );
    }

    #[test]
    fn test_join_conditions() {
        let clauses = parse("select a from t join u on t.a = u.a join v using (b) cross join w");
        assert_eq!(clauses.join_items.len(), 3);
        assert!(matches!(clauses.join_items[0].condition, JoinCondition::On(_)));
        assert!(matches!(clauses.join_items[1].condition, JoinCondition::Using(_)));
        assert!(matches!(clauses.join_items[2].condition, JoinCondition::None));
        assert_eq!(clauses.join_items[2].kind, JoinKind::Cross);
    }

    #[test]
    fn test_where_stops_at_clause_boundary() {
        let clauses = parse("select a from t where t.a = 1 group by a");
        let predicate = clauses.where_predicate.unwrap();
        assert_eq!(predicate.len(), 5);
    }

    #[test]
    fn test_unclosed_subquery_errors() {
        assert!(extract_clauses("select a from (select b from t", Dialect::Ansi).is_err());
    }
}
