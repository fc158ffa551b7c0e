//! SQL Parser
//!
//! This module parses SQL tokens into an AST. The grammar is deliberately
//! small: one statement per call, a WHERE clause of exactly one
//! `column operator literal` comparison, and at most one equality JOIN.

use super::ast::*;
use super::lexer::{Lexeme, Lexer};
use super::token::Token;
use crate::catalog::{Column, DataType};
use crate::error::{Error, Result};
use crate::storage::Value;

/// SQL Parser
pub struct Parser {
    tokens: Vec<Lexeme>,
    position: usize,
}

impl Parser {
    /// Create a new parser from a SQL string
    pub fn new(sql: &str) -> Result<Self> {
        let mut lexer = Lexer::new(sql);
        let tokens = lexer.tokenize()?;

        Ok(Self {
            tokens,
            position: 0,
        })
    }

    /// Parse exactly one SQL statement
    pub fn parse(&mut self) -> Result<Statement> {
        let stmt = self.parse_statement()?;

        // Consume optional semicolon
        if self.check(&Token::Semicolon) {
            self.advance();
        }

        if !self.is_at_end() {
            return Err(self.error("unexpected input after end of statement"));
        }

        Ok(stmt)
    }

    /// Parse a single statement
    fn parse_statement(&mut self) -> Result<Statement> {
        match self.current() {
            Token::Select => self.parse_select().map(Statement::Select),
            Token::Insert => self.parse_insert().map(Statement::Insert),
            Token::Update => self.parse_update().map(Statement::Update),
            Token::Delete => self.parse_delete().map(Statement::Delete),
            Token::Create => self.parse_create(),
            Token::Drop => self.parse_drop(),
            _ => Err(self.error("expected SELECT, INSERT, UPDATE, DELETE, CREATE or DROP")),
        }
    }

    // ========== SELECT Statement ==========

    fn parse_select(&mut self) -> Result<SelectStatement> {
        self.expect(&Token::Select)?;

        let projection = self.parse_projection()?;

        self.expect(&Token::From)?;
        let from = self.expect_identifier()?;

        // JOIN clause
        let join = if self.check(&Token::Join) || self.check(&Token::Inner) {
            Some(self.parse_join(&from)?)
        } else {
            None
        };

        // WHERE clause
        let where_clause = self.parse_where()?;

        Ok(SelectStatement {
            projection,
            from,
            join,
            where_clause,
        })
    }

    fn parse_projection(&mut self) -> Result<Projection> {
        if self.check(&Token::Asterisk) {
            self.advance();
            return Ok(Projection::All);
        }

        let mut columns = vec![self.parse_column_ref()?];
        while self.check(&Token::Comma) {
            self.advance();
            columns.push(self.parse_column_ref()?);
        }
        Ok(Projection::Columns(columns))
    }

    fn parse_join(&mut self, from: &str) -> Result<JoinClause> {
        if self.check(&Token::Inner) {
            self.advance();
        }
        self.expect(&Token::Join)?;

        let table = self.expect_identifier()?;
        if table == from {
            return Err(Error::syntax("a table cannot be joined with itself", table));
        }

        self.expect(&Token::On)?;
        let first = self.parse_qualified_ref()?;
        self.expect(&Token::Eq)?;
        let second = self.parse_qualified_ref()?;

        // Either side may name either table; store the FROM side as `left`
        let names = |a: &ColumnRef, b: &ColumnRef| {
            a.table.as_deref() == Some(from) && b.table.as_deref() == Some(table.as_str())
        };
        let (left, right) = if names(&first, &second) {
            (first, second)
        } else if names(&second, &first) {
            (second, first)
        } else {
            return Err(Error::syntax(
                format!("JOIN condition must compare {}.<column> with {}.<column>", from, table),
                format!("{} = {}", first, second),
            ));
        };

        Ok(JoinClause { table, left, right })
    }

    // ========== INSERT Statement ==========

    fn parse_insert(&mut self) -> Result<InsertStatement> {
        self.expect(&Token::Insert)?;
        self.expect(&Token::Into)?;

        let table_name = self.expect_identifier()?;

        // Optional column list
        let columns = if self.check(&Token::LParen) {
            self.advance();
            let cols = self.parse_identifier_list()?;
            self.expect(&Token::RParen)?;
            Some(cols)
        } else {
            None
        };

        self.expect(&Token::Values)?;

        self.expect(&Token::LParen)?;
        let mut values = vec![self.parse_literal()?];
        while self.check(&Token::Comma) {
            self.advance();
            values.push(self.parse_literal()?);
        }
        self.expect(&Token::RParen)?;

        if self.check(&Token::Comma) {
            return Err(self.error("only one row of VALUES is supported per INSERT"));
        }

        Ok(InsertStatement {
            table_name,
            columns,
            values,
        })
    }

    // ========== UPDATE Statement ==========

    fn parse_update(&mut self) -> Result<UpdateStatement> {
        self.expect(&Token::Update)?;

        let table_name = self.expect_identifier()?;

        self.expect(&Token::Set)?;

        let mut assignments = Vec::new();
        loop {
            let column = self.expect_identifier()?;
            self.expect(&Token::Eq)?;
            let value = self.parse_literal()?;
            assignments.push(Assignment { column, value });

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        let where_clause = self.parse_where()?;

        Ok(UpdateStatement {
            table_name,
            assignments,
            where_clause,
        })
    }

    // ========== DELETE Statement ==========

    fn parse_delete(&mut self) -> Result<DeleteStatement> {
        self.expect(&Token::Delete)?;
        self.expect(&Token::From)?;

        let table_name = self.expect_identifier()?;
        let where_clause = self.parse_where()?;

        Ok(DeleteStatement {
            table_name,
            where_clause,
        })
    }

    // ========== CREATE Statement ==========

    fn parse_create(&mut self) -> Result<Statement> {
        self.expect(&Token::Create)?;

        match self.current() {
            Token::Table => self.parse_create_table().map(Statement::CreateTable),
            Token::Index => self.parse_create_index().map(Statement::CreateIndex),
            _ => Err(self.error("expected TABLE or INDEX")),
        }
    }

    fn parse_create_table(&mut self) -> Result<CreateTableStatement> {
        self.expect(&Token::Table)?;

        let table_name = self.expect_identifier()?;

        self.expect(&Token::LParen)?;

        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_column_def()?);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        self.expect(&Token::RParen)?;

        Ok(CreateTableStatement {
            table_name,
            columns,
        })
    }

    fn parse_create_index(&mut self) -> Result<CreateIndexStatement> {
        self.expect(&Token::Index)?;

        let index_name = self.expect_identifier()?;
        self.expect(&Token::On)?;
        let table_name = self.expect_identifier()?;

        self.expect(&Token::LParen)?;
        let column = self.expect_identifier()?;
        self.expect(&Token::RParen)?;

        Ok(CreateIndexStatement {
            index_name,
            table_name,
            column,
        })
    }

    fn parse_column_def(&mut self) -> Result<Column> {
        let name = self.expect_identifier()?;
        let data_type = self.parse_data_type()?;

        let mut column = Column::new(name, data_type);

        // Parse column constraints
        loop {
            if self.check(&Token::Not) {
                self.advance();
                self.expect(&Token::Null)?;
                column = column.not_null(true);
            } else if self.check(&Token::Null) {
                self.advance();
                // NULL is allowed (default)
            } else if self.check(&Token::Primary) {
                self.advance();
                self.expect(&Token::Key)?;
                column = column.primary_key(true);
            } else if self.check(&Token::Unique) {
                self.advance();
                column = column.unique(true);
            } else {
                break;
            }
        }

        Ok(column)
    }

    fn parse_data_type(&mut self) -> Result<DataType> {
        let data_type = match self.current() {
            Token::Integer => DataType::Integer,
            Token::Text => DataType::Text,
            Token::Boolean => DataType::Boolean,
            Token::Float => DataType::Float,
            _ => return Err(self.error("expected a column type (INTEGER, TEXT, BOOLEAN or FLOAT)")),
        };
        self.advance();
        Ok(data_type)
    }

    // ========== DROP Statement ==========

    fn parse_drop(&mut self) -> Result<Statement> {
        self.expect(&Token::Drop)?;
        self.expect(&Token::Table)?;

        let table_name = self.expect_identifier()?;
        Ok(Statement::DropTable(DropTableStatement { table_name }))
    }

    // ========== Conditions and Literals ==========

    fn parse_where(&mut self) -> Result<Option<Condition>> {
        if !self.check(&Token::Where) {
            return Ok(None);
        }
        self.advance();

        let column = self.parse_column_ref()?;
        let op = self.parse_compare_op()?;
        let value = self.parse_literal()?;

        Ok(Some(Condition { column, op, value }))
    }

    fn parse_compare_op(&mut self) -> Result<CompareOp> {
        let op = match self.current() {
            Token::Eq => CompareOp::Eq,
            Token::Neq => CompareOp::Neq,
            Token::Lt => CompareOp::Lt,
            Token::Gt => CompareOp::Gt,
            Token::Lte => CompareOp::Lte,
            Token::Gte => CompareOp::Gte,
            _ => return Err(self.error("expected a comparison operator")),
        };
        self.advance();
        Ok(op)
    }

    fn parse_literal(&mut self) -> Result<Value> {
        let value = match self.current() {
            Token::IntegerLiteral(n) => Value::Integer(*n),
            Token::FloatLiteral(n) => Value::Float(*n),
            Token::StringLiteral(s) => Value::Text(s.clone()),
            Token::True => Value::Boolean(true),
            Token::False => Value::Boolean(false),
            Token::Null => Value::Null,
            _ => return Err(self.error("expected a literal value")),
        };
        self.advance();
        Ok(value)
    }

    /// `column` or `table.column`
    fn parse_column_ref(&mut self) -> Result<ColumnRef> {
        let first = self.expect_identifier()?;

        if self.check(&Token::Dot) {
            self.advance();
            let column = self.expect_identifier()?;
            return Ok(ColumnRef::qualified(first, column));
        }

        Ok(ColumnRef::from(first))
    }

    fn parse_qualified_ref(&mut self) -> Result<ColumnRef> {
        let fragment = self.fragment();
        let column = self.parse_column_ref()?;
        if column.table.is_none() {
            return Err(Error::syntax(
                "JOIN condition columns must be qualified as table.column",
                fragment,
            ));
        }
        Ok(column)
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<String>> {
        let mut identifiers = vec![self.expect_identifier()?];

        while self.check(&Token::Comma) {
            self.advance();
            identifiers.push(self.expect_identifier()?);
        }

        Ok(identifiers)
    }

    // ========== Helper Methods ==========

    fn current(&self) -> &Token {
        self.tokens
            .get(self.position)
            .map(|l| &l.token)
            .unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(token)
    }

    /// Source text of the current token
    fn fragment(&self) -> String {
        match self.tokens.get(self.position) {
            Some(lexeme) if !lexeme.text.is_empty() => lexeme.text.clone(),
            _ => Token::Eof.to_string(),
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::syntax(message, self.fragment())
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected {}", token)))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match self.current().clone() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            token if token.is_soft_keyword() => {
                let name = self.fragment();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error("expected identifier")),
        }
    }
}
