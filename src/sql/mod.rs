//! SQL front end
//!
//! This module turns one statement string into a structured [`Statement`]:
//! - Tokens and lexer
//! - Recursive-descent parser
//! - AST

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::Statement;
pub use parser::Parser;

use crate::error::Result;

/// Parse a single statement string
pub fn parse(sql: &str) -> Result<Statement> {
    Parser::new(sql)?.parse()
}
