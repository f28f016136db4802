/// SQL Parser - converts tokens into AST
use super::ast::*;
use super::lexer::Lexer;
use super::token::{Token, TokenType};
use crate::config::truncate_chars;
use crate::error::{Result, SqlError};
use crate::types::{Column, Value};
use std::ops::Range;
use tracing::debug;

/// Statement kinds, chosen from the leading keywords alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    CreateTable,
    CreateIndex,
    Insert,
    Select,
    Update,
    Delete,
    DropTable,
    ShowTables,
    Describe,
    AlterTable,
}

impl StatementKind {
    pub fn classify(sql: &str) -> Option<Self> {
        let words = leading_words(sql, 3);
        let word = |idx: usize| words.get(idx).map(String::as_str).unwrap_or("");

        let kind = match (word(0), word(1)) {
            ("CREATE", "TABLE") => StatementKind::CreateTable,
            ("CREATE", "INDEX") => StatementKind::CreateIndex,
            ("CREATE", "UNIQUE") if word(2) == "INDEX" => StatementKind::CreateIndex,
            ("INSERT", "INTO") => StatementKind::Insert,
            ("SELECT", _) => StatementKind::Select,
            ("UPDATE", _) => StatementKind::Update,
            ("DELETE", "FROM") => StatementKind::Delete,
            ("DROP", "TABLE") => StatementKind::DropTable,
            ("SHOW", "TABLES") => StatementKind::ShowTables,
            ("DESCRIBE", _) | ("DESC", _) => StatementKind::Describe,
            ("ALTER", "TABLE") => StatementKind::AlterTable,
            _ => return None,
        };
        Some(kind)
    }
}

/// Up to `max` leading words, uppercased, stopping at the first symbol
fn leading_words(sql: &str, max: usize) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();

    for ch in sql.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            current.push(ch.to_ascii_uppercase());
            continue;
        }
        if !current.is_empty() {
            words.push(std::mem::take(&mut current));
            if words.len() == max {
                return words;
            }
        }
        if !ch.is_whitespace() {
            return words;
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Classify, tokenize and parse one comment-free statement
pub fn parse_statement(sql: &str, preview_chars: usize) -> Result<Statement> {
    let kind = StatementKind::classify(sql).ok_or_else(|| {
        SqlError::Syntax(format!(
            "unknown statement: {}...",
            truncate_chars(sql, preview_chars)
        ))
    })?;
    let tokens = Lexer::new(sql).tokenize()?;
    Parser::new(tokens, sql).parse(kind)
}

/// Pieces of a CREATE TABLE body
enum Definition {
    Column(Column),
    PrimaryKey(Vec<String>),
    Constraint,
}

pub struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    source: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, source: &'a str) -> Self {
        Self { tokens, position: 0, source }
    }

    /// Parse a statement of the given kind
    pub fn parse(&mut self, kind: StatementKind) -> Result<Statement> {
        let stmt = match kind {
            StatementKind::Select => Statement::Select(self.parse_select()?),
            StatementKind::Insert => Statement::Insert(self.parse_insert()?),
            StatementKind::Update => Statement::Update(self.parse_update()?),
            StatementKind::Delete => Statement::Delete(self.parse_delete()?),
            StatementKind::CreateTable => Statement::CreateTable(self.parse_create_table()?),
            StatementKind::CreateIndex => Statement::CreateIndex(self.parse_create_index()?),
            StatementKind::DropTable => Statement::DropTable(self.parse_drop_table()?),
            StatementKind::AlterTable => Statement::AlterTable(self.parse_alter_table()?),
            StatementKind::ShowTables => {
                self.expect(TokenType::Show)?;
                self.expect(TokenType::Tables)?;
                Statement::ShowTables
            }
            StatementKind::Describe => {
                self.advance(); // DESCRIBE | DESC
                Statement::Describe(self.parse_name()?)
            }
        };

        // Optionally consume semicolon
        self.match_token(TokenType::Semicolon);
        if !matches!(self.current().token_type, TokenType::Eof) {
            return Err(self.error(&format!("Unexpected '{}'", self.current_text())));
        }

        Ok(stmt)
    }

    /// Parse SELECT statement
    fn parse_select(&mut self) -> Result<SelectStmt> {
        self.expect(TokenType::Select)?;

        let distinct = self.match_token(TokenType::Distinct);
        let columns = self.parse_select_columns()?;

        self.expect(TokenType::From)?;
        let from = self.parse_table_ref()?;

        let mut joins = Vec::new();
        while self.is_join_keyword() {
            joins.push(self.parse_join()?);
        }

        let where_clause = if self.match_token(TokenType::Where) {
            Some(self.parse_predicate()?)
        } else {
            None
        };

        let group_by = if self.match_token(TokenType::Group) {
            self.expect(TokenType::By)?;
            let mut list = vec![self.parse_column_ref()?];
            while self.match_token(TokenType::Comma) {
                list.push(self.parse_column_ref()?);
            }
            Some(list)
        } else {
            None
        };

        let having = if self.match_token(TokenType::Having) {
            Some(self.parse_predicate()?)
        } else {
            None
        };

        let order_by = if self.match_token(TokenType::Order) {
            self.expect(TokenType::By)?;
            self.parse_order_by()?
        } else {
            Vec::new()
        };

        let limit = if self.match_token(TokenType::Limit) {
            Some(self.parse_usize()?)
        } else {
            None
        };

        let offset = if self.match_token(TokenType::Offset) {
            Some(self.parse_usize()?)
        } else {
            None
        };

        Ok(SelectStmt {
            distinct,
            columns,
            from,
            joins,
            where_clause,
            group_by,
            having,
            order_by,
            limit,
            offset,
        })
    }

    fn parse_select_columns(&mut self) -> Result<Vec<SelectColumn>> {
        let mut columns = Vec::new();

        loop {
            if self.match_token(TokenType::Star) {
                columns.push(SelectColumn::Star);
            } else if self.is_qualified_star() {
                let qualifier = self.parse_identifier()?;
                self.advance(); // .
                self.advance(); // *
                columns.push(SelectColumn::QualifiedStar(qualifier));
            } else {
                let start = self.current().start;
                let expr = self.parse_expr(0)?;
                let text = collapse_whitespace(&self.source[start..self.previous_end()]);

                let alias = if self.match_token(TokenType::As) {
                    Some(self.parse_identifier()?)
                } else if self.at_implicit_alias() {
                    Some(self.parse_identifier()?)
                } else {
                    None
                };

                columns.push(SelectColumn::Expr { expr, alias, text });
            }

            if !self.match_token(TokenType::Comma) {
                break;
            }
        }

        Ok(columns)
    }

    fn is_qualified_star(&self) -> bool {
        self.is_identifier_token(self.current())
            && matches!(self.peek(1).token_type, TokenType::Dot)
            && matches!(self.peek(2).token_type, TokenType::Star)
    }

    fn parse_order_by(&mut self) -> Result<Vec<OrderByExpr>> {
        let mut items = Vec::new();

        loop {
            let expr = self.parse_expr(0)?;
            let asc = if self.match_token(TokenType::Desc) {
                false
            } else {
                self.match_token(TokenType::Asc);
                true
            };
            items.push(OrderByExpr { expr, asc });

            if !self.match_token(TokenType::Comma) {
                break;
            }
        }

        Ok(items)
    }

    /// `table_name [[AS] alias]`
    fn parse_table_ref(&mut self) -> Result<TableRef> {
        let name = self.parse_name()?;
        let alias = if self.match_token(TokenType::As) {
            Some(self.parse_name()?)
        } else if self.at_implicit_alias() {
            Some(self.parse_name()?)
        } else {
            None
        };
        Ok(TableRef { name, alias })
    }

    /// A name right after an expression or table without AS. Clause and
    /// join keywords are reserved, so only identifiers and non-reserved
    /// keywords qualify.
    fn at_implicit_alias(&self) -> bool {
        self.is_identifier_token(self.current())
    }

    fn is_join_keyword(&self) -> bool {
        matches!(
            self.current().token_type,
            TokenType::Join
                | TokenType::Inner
                | TokenType::Left
                | TokenType::Right
                | TokenType::Full
                | TokenType::Cross
        )
    }

    fn parse_join(&mut self) -> Result<JoinClause> {
        let join_type = match self.current().token_type {
            TokenType::Left => JoinType::Left,
            TokenType::Right => JoinType::Right,
            TokenType::Full => JoinType::Full,
            TokenType::Cross => JoinType::Cross,
            _ => JoinType::Inner,
        };
        if !matches!(self.current().token_type, TokenType::Join) {
            self.advance();
            self.match_token(TokenType::Outer);
        }
        self.expect(TokenType::Join)?;

        let table = self.parse_table_ref()?;

        let on = if self.match_token(TokenType::On) {
            self.parse_join_condition()?
        } else if join_type == JoinType::Cross {
            Vec::new()
        } else {
            return Err(self.error("Expected ON"));
        };

        Ok(JoinClause { join_type, table, on })
    }

    /// `a.x = b.y [AND a.z = b.w ...]`, optionally parenthesized
    fn parse_join_condition(&mut self) -> Result<Vec<(ColumnRef, ColumnRef)>> {
        let parenthesized = self.match_token(TokenType::LParen);
        let mut pairs = Vec::new();

        loop {
            let left = self.parse_column_ref()?;
            self.expect(TokenType::Eq)?;
            let right = self.parse_column_ref()?;
            pairs.push((left, right));

            if !self.match_token(TokenType::And) {
                break;
            }
        }

        if parenthesized {
            self.expect(TokenType::RParen)?;
        }
        Ok(pairs)
    }

    fn parse_column_ref(&mut self) -> Result<ColumnRef> {
        let first = self.parse_identifier()?;
        if self.match_token(TokenType::Dot) {
            let name = self.parse_identifier()?;
            Ok(ColumnRef { table: Some(first.to_lowercase()), name })
        } else {
            Ok(ColumnRef::bare(&first))
        }
    }

    fn parse_insert(&mut self) -> Result<InsertStmt> {
        self.expect(TokenType::Insert)?;
        self.expect(TokenType::Into)?;
        let table = self.parse_name()?;

        let columns = if self.match_token(TokenType::LParen) {
            let mut list = vec![self.parse_name()?];
            while self.match_token(TokenType::Comma) {
                list.push(self.parse_name()?);
            }
            self.expect(TokenType::RParen)?;
            Some(list)
        } else {
            None
        };

        self.expect(TokenType::Values)?;

        let mut values = Vec::new();
        loop {
            self.expect(TokenType::LParen)?;
            let group = if matches!(self.current().token_type, TokenType::RParen) {
                Vec::new()
            } else {
                self.parse_expr_list()?
            };
            self.expect(TokenType::RParen)?;
            values.push(group);

            if !self.match_token(TokenType::Comma) {
                break;
            }
        }

        Ok(InsertStmt { table, columns, values })
    }

    fn parse_update(&mut self) -> Result<UpdateStmt> {
        self.expect(TokenType::Update)?;
        let table = self.parse_name()?;
        self.expect(TokenType::Set)?;

        let mut assignments = Vec::new();
        loop {
            let column = self.parse_name()?;
            self.expect(TokenType::Eq)?;
            let value = self.parse_expr(0)?;
            assignments.push((column, value));

            if !self.match_token(TokenType::Comma) {
                break;
            }
        }

        let where_clause = if self.match_token(TokenType::Where) {
            Some(self.parse_predicate()?)
        } else {
            None
        };

        Ok(UpdateStmt { table, assignments, where_clause })
    }

    fn parse_delete(&mut self) -> Result<DeleteStmt> {
        self.expect(TokenType::Delete)?;
        self.expect(TokenType::From)?;
        let table = self.parse_name()?;

        let where_clause = if self.match_token(TokenType::Where) {
            Some(self.parse_predicate()?)
        } else {
            None
        };

        Ok(DeleteStmt { table, where_clause })
    }

    fn parse_create_table(&mut self) -> Result<CreateTableStmt> {
        self.expect(TokenType::Create)?;
        self.expect(TokenType::Table)?;
        let if_not_exists = self.parse_if_not_exists()?;
        let table = self.parse_name()?;
        self.expect(TokenType::LParen)?;

        let mut columns: Vec<Column> = Vec::new();
        let mut primary_key = Vec::new();

        loop {
            let range = self.definition_range()?;
            match self.parse_definition(range)? {
                Definition::Column(column) => {
                    if columns.iter().any(|c| c.name == column.name) {
                        return Err(SqlError::Schema(format!(
                            "Duplicate column '{}' in table '{}'",
                            column.name, table
                        )));
                    }
                    columns.push(column);
                }
                Definition::PrimaryKey(names) => primary_key.extend(names),
                Definition::Constraint => {}
            }

            if !self.match_token(TokenType::Comma) {
                break;
            }
        }
        self.expect(TokenType::RParen)?;

        for name in primary_key {
            let column = columns
                .iter_mut()
                .find(|c| c.name.eq_ignore_ascii_case(&name))
                .ok_or_else(|| SqlError::unknown_column(&name))?;
            column.primary_key = true;
        }

        if columns.is_empty() {
            return Err(self.error("Table must have at least one column"));
        }

        Ok(CreateTableStmt { table, if_not_exists, columns })
    }

    /// Token range of one definition, up to a top-level `,` or `)`
    fn definition_range(&mut self) -> Result<Range<usize>> {
        let start = self.position;
        let mut depth = 0usize;

        loop {
            match self.current().token_type {
                TokenType::LParen => depth += 1,
                TokenType::RParen if depth == 0 => break,
                TokenType::RParen => depth -= 1,
                TokenType::Comma if depth == 0 => break,
                TokenType::Eof | TokenType::Semicolon => {
                    if depth == 0 && self.position > start {
                        break;
                    }
                    return Err(self.error("Expected ')'"));
                }
                _ => {}
            }
            self.advance();
        }

        Ok(start..self.position)
    }

    /// `name [type[(n)]] [PRIMARY KEY] [NOT NULL] ...` or a table constraint
    fn parse_definition(&self, range: Range<usize>) -> Result<Definition> {
        let tokens = &self.tokens[range];
        let first = tokens
            .first()
            .ok_or_else(|| self.error("Expected column definition"))?;

        match first.token_type {
            TokenType::Primary => {
                let names = tokens
                    .iter()
                    .skip_while(|t| !matches!(t.token_type, TokenType::LParen))
                    .filter(|t| self.is_identifier_token(t))
                    .map(|t| self.identifier_text(t))
                    .collect();
                return Ok(Definition::PrimaryKey(names));
            }
            TokenType::Unique | TokenType::Foreign | TokenType::Check | TokenType::Constraint => {
                return Ok(Definition::Constraint);
            }
            _ => {}
        }

        if !self.is_identifier_token(first) {
            return Err(self.error_at(first, "Expected column name"));
        }
        let name = self.identifier_text(first);

        // Type is the second token unless that token starts a constraint
        let data_type = match tokens.get(1) {
            Some(token) if matches!(token.token_type, TokenType::Identifier(_)) => {
                self.token_text(token)
            }
            _ => "TEXT",
        };

        let mut column = Column::new(&name, data_type);
        for pair in tokens.windows(2) {
            match (&pair[0].token_type, &pair[1].token_type) {
                (TokenType::Primary, TokenType::Key) => column = column.primary_key(),
                (TokenType::Not, TokenType::Null) => column = column.not_null(),
                _ => {}
            }
        }

        Ok(Definition::Column(column))
    }

    fn parse_create_index(&mut self) -> Result<CreateIndexStmt> {
        self.expect(TokenType::Create)?;
        self.match_token(TokenType::Unique);
        self.expect(TokenType::Index)?;
        self.parse_if_not_exists()?;

        let index_name = if self.is_identifier_token(self.current()) {
            Some(self.parse_name()?)
        } else {
            None
        };
        let table = if self.match_token(TokenType::On) {
            Some(self.parse_name()?)
        } else {
            None
        };

        // The column list is accepted as-is
        while !matches!(self.current().token_type, TokenType::Eof | TokenType::Semicolon) {
            self.advance();
        }

        Ok(CreateIndexStmt { index_name, table })
    }

    fn parse_drop_table(&mut self) -> Result<DropTableStmt> {
        self.expect(TokenType::Drop)?;
        self.expect(TokenType::Table)?;
        let if_exists = if self.match_token(TokenType::If) {
            self.expect(TokenType::Exists)?;
            true
        } else {
            false
        };
        let table = self.parse_name()?;
        Ok(DropTableStmt { table, if_exists })
    }

    fn parse_alter_table(&mut self) -> Result<AlterTableStmt> {
        self.expect(TokenType::Alter)?;
        self.expect(TokenType::Table)?;
        let table = self.parse_name()?;

        if matches!(self.current().token_type, TokenType::Eof | TokenType::Semicolon) {
            return Err(self.error("Expected ADD COLUMN"));
        }
        if !self.match_token(TokenType::Add) {
            return Err(SqlError::Unsupported("Only ADD COLUMN is supported".to_string()));
        }
        self.match_token(TokenType::Column);

        let range = self.definition_range()?;
        match self.parse_definition(range)? {
            Definition::Column(column) => Ok(AlterTableStmt {
                table,
                action: AlterAction::AddColumn(column),
            }),
            _ => Err(SqlError::Unsupported("Only ADD COLUMN is supported".to_string())),
        }
    }

    fn parse_if_not_exists(&mut self) -> Result<bool> {
        if self.match_token(TokenType::If) {
            self.expect(TokenType::Not)?;
            self.expect(TokenType::Exists)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    // Predicates

    /// OR of ANDs; AND binds tighter
    fn parse_predicate(&mut self) -> Result<Predicate> {
        let mut branches = vec![self.parse_and()?];
        while self.match_token(TokenType::Or) {
            branches.push(self.parse_and()?);
        }
        Ok(match branches.len() {
            1 => branches.remove(0),
            _ => Predicate::Or(branches),
        })
    }

    fn parse_and(&mut self) -> Result<Predicate> {
        let mut parts = vec![self.parse_not()?];
        while self.match_token(TokenType::And) {
            parts.push(self.parse_not()?);
        }
        Ok(match parts.len() {
            1 => parts.remove(0),
            _ => Predicate::And(parts),
        })
    }

    fn parse_not(&mut self) -> Result<Predicate> {
        if self.match_token(TokenType::Not) {
            return Ok(Predicate::Not(Box::new(self.parse_not()?)));
        }
        self.parse_condition()
    }

    fn parse_condition(&mut self) -> Result<Predicate> {
        if self.at_predicate_boundary() {
            return Err(self.error("Expected condition"));
        }

        let start = self.position;
        if matches!(self.current().token_type, TokenType::LParen) {
            if let Some(group) = self.try_parse_group() {
                return Ok(group);
            }
            self.position = start;
        }

        match self.parse_atom() {
            Ok(predicate) if self.at_predicate_boundary() => Ok(predicate),
            _ => {
                self.position = start;
                Ok(self.skip_unrecognized())
            }
        }
    }

    /// `( predicate )`, or None when the parentheses belong to an expression
    fn try_parse_group(&mut self) -> Option<Predicate> {
        self.advance();
        let inner = self.parse_predicate().ok()?;
        if !self.match_token(TokenType::RParen) || !self.at_predicate_boundary() {
            return None;
        }
        Some(inner)
    }

    fn parse_atom(&mut self) -> Result<Predicate> {
        let expr = self.parse_expr(0)?;

        if self.match_token(TokenType::Is) {
            let negated = self.match_token(TokenType::Not);
            self.expect(TokenType::Null)?;
            return Ok(Predicate::IsNull { expr, negated });
        }

        let negated = self.match_token(TokenType::Not);
        match self.current().token_type {
            TokenType::Between => {
                self.advance();
                let low = self.parse_expr(0)?;
                self.expect(TokenType::And)?;
                let high = self.parse_expr(0)?;
                Ok(Predicate::Between { expr, low, high, negated })
            }
            TokenType::In => {
                self.advance();
                self.expect(TokenType::LParen)?;
                let list = self.parse_expr_list()?;
                self.expect(TokenType::RParen)?;
                Ok(Predicate::InList { expr, list, negated })
            }
            TokenType::Like => {
                self.advance();
                let pattern = self.parse_expr(0)?;
                Ok(Predicate::Like { expr, pattern, negated })
            }
            _ if negated => Err(self.error("Expected BETWEEN, IN or LIKE after NOT")),
            _ => {
                let op = self.parse_compare_op()?;
                let right = self.parse_expr(0)?;
                Ok(Predicate::Compare { left: expr, op, right })
            }
        }
    }

    fn parse_compare_op(&mut self) -> Result<CompareOp> {
        let op = match self.current().token_type {
            TokenType::Eq => CompareOp::Eq,
            TokenType::Ne => CompareOp::Ne,
            TokenType::Lt => CompareOp::Lt,
            TokenType::Gt => CompareOp::Gt,
            TokenType::Le => CompareOp::Le,
            TokenType::Ge => CompareOp::Ge,
            _ => return Err(self.error("Expected comparison operator")),
        };
        self.advance();
        Ok(op)
    }

    fn at_predicate_boundary(&self) -> bool {
        matches!(
            self.current().token_type,
            TokenType::And
                | TokenType::Or
                | TokenType::RParen
                | TokenType::Eof
                | TokenType::Semicolon
                | TokenType::Group
                | TokenType::Having
                | TokenType::Order
                | TokenType::Limit
                | TokenType::Offset
        )
    }

    /// Consume a condition in no known form up to the next boundary.
    /// The AND of a BETWEEN inside it does not end the condition.
    fn skip_unrecognized(&mut self) -> Predicate {
        let start = self.current().start;
        let mut end = start;
        let mut depth = 0usize;
        let mut pending_between = false;

        loop {
            match self.current().token_type {
                TokenType::Eof | TokenType::Semicolon => break,
                TokenType::LParen => depth += 1,
                TokenType::RParen if depth == 0 => break,
                TokenType::RParen => depth -= 1,
                TokenType::Between => pending_between = true,
                TokenType::And if depth == 0 && pending_between => pending_between = false,
                TokenType::And
                | TokenType::Or
                | TokenType::Group
                | TokenType::Having
                | TokenType::Order
                | TokenType::Limit
                | TokenType::Offset
                    if depth == 0 =>
                {
                    break
                }
                _ => {}
            }
            end = self.current().end;
            self.advance();
        }

        let text = self.source[start..end].to_string();
        debug!(condition = %text, "unrecognized condition, treated as true");
        Predicate::Unrecognized(text)
    }

    // Expressions

    fn parse_expr(&mut self, min_precedence: u8) -> Result<Expr> {
        let mut left = self.parse_prefix_expr()?;

        while let Some(op) = self.try_parse_binary_op() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }

            self.advance(); // consume operator
            let right = self.parse_expr(precedence + 1)?;

            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_prefix_expr(&mut self) -> Result<Expr> {
        match self.current().token_type.clone() {
            TokenType::Minus => {
                self.advance();
                let expr = self.parse_expr(10)?;
                Ok(match expr {
                    Expr::Literal(Value::Number(n)) => Expr::Literal(Value::Number(-n)),
                    expr => Expr::UnaryOp {
                        op: UnaryOperator::Minus,
                        expr: Box::new(expr),
                    },
                })
            }
            TokenType::Plus => {
                self.advance();
                self.parse_expr(10)
            }
            TokenType::LParen => {
                self.advance();
                let expr = self.parse_expr(0)?;
                self.expect(TokenType::RParen)?;
                Ok(expr)
            }
            TokenType::Number(n) => {
                self.advance();
                Ok(Expr::Literal(Value::Number(n)))
            }
            TokenType::String(s) => {
                self.advance();
                Ok(Expr::Literal(Value::Text(s)))
            }
            TokenType::Null => {
                self.advance();
                Ok(Expr::Literal(Value::Null))
            }
            _ if self.is_identifier_token(self.current()) => {
                let name = self.parse_identifier()?;

                if matches!(self.current().token_type, TokenType::LParen) {
                    return self.parse_function_call(&name);
                }

                if self.match_token(TokenType::Dot) {
                    let column = self.parse_identifier()?;
                    return Ok(Expr::Column(ColumnRef {
                        table: Some(name.to_lowercase()),
                        name: column,
                    }));
                }

                Ok(Expr::Column(ColumnRef::bare(&name)))
            }
            _ => Err(self.error(&format!("Unexpected '{}'", self.current_text()))),
        }
    }

    fn parse_function_call(&mut self, name: &str) -> Result<Expr> {
        let func = Function::from_name(name)
            .ok_or_else(|| self.error(&format!("Unknown function: {}", name.to_uppercase())))?;
        self.expect(TokenType::LParen)?;

        let distinct = func == Function::Count && self.match_token(TokenType::Distinct);

        let args = if matches!(self.current().token_type, TokenType::Star) {
            if func != Function::Count {
                return Err(self.error(&format!("{}(*) is not supported", func.name())));
            }
            self.advance();
            vec![Expr::Wildcard]
        } else if matches!(self.current().token_type, TokenType::RParen) {
            Vec::new()
        } else {
            self.parse_expr_list()?
        };
        self.expect(TokenType::RParen)?;

        let (min, max) = func.arity();
        if args.len() < min || args.len() > max {
            let expected = if min == max {
                min.to_string()
            } else if max == usize::MAX {
                format!("at least {}", min)
            } else {
                format!("{} to {}", min, max)
            };
            return Err(SqlError::Syntax(format!(
                "{}() takes {} argument(s), got {}",
                func.name(),
                expected,
                args.len()
            )));
        }

        Ok(Expr::FunctionCall { func, args, distinct })
    }

    fn try_parse_binary_op(&self) -> Option<BinaryOperator> {
        match self.current().token_type {
            TokenType::Plus => Some(BinaryOperator::Add),
            TokenType::Minus => Some(BinaryOperator::Sub),
            TokenType::Star => Some(BinaryOperator::Mul),
            TokenType::Slash => Some(BinaryOperator::Div),
            _ => None,
        }
    }

    // Helper methods

    /// Identifier as written: plain, quoted, or a non-reserved keyword
    fn parse_identifier(&mut self) -> Result<String> {
        if self.is_identifier_token(self.current()) {
            let name = self.identifier_text(self.current());
            self.advance();
            Ok(name)
        } else {
            Err(self.error("Expected identifier"))
        }
    }

    /// Table or column name, canonicalized to lowercase
    fn parse_name(&mut self) -> Result<String> {
        Ok(self.parse_identifier()?.to_lowercase())
    }

    fn is_identifier_token(&self, token: &Token) -> bool {
        match &token.token_type {
            TokenType::Identifier(_) => true,
            // "double quoted" names
            TokenType::String(_) => self.source[token.start..].starts_with('"'),
            other => other.is_non_reserved(),
        }
    }

    fn identifier_text(&self, token: &Token) -> String {
        match &token.token_type {
            TokenType::Identifier(name) | TokenType::String(name) => name.clone(),
            _ => self.token_text(token).to_string(),
        }
    }

    fn parse_expr_list(&mut self) -> Result<Vec<Expr>> {
        let mut list = Vec::new();
        loop {
            list.push(self.parse_expr(0)?);
            if !self.match_token(TokenType::Comma) {
                break;
            }
        }
        Ok(list)
    }

    fn parse_usize(&mut self) -> Result<usize> {
        if let TokenType::Number(n) = self.current().token_type {
            if n < 0.0 || n.fract() != 0.0 {
                return Err(self.error("Expected non-negative integer"));
            }
            self.advance();
            Ok(n as usize)
        } else {
            Err(self.error("Expected number"))
        }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn peek(&self, distance: usize) -> &Token {
        let idx = (self.position + distance).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn previous_end(&self) -> usize {
        if self.position == 0 {
            0
        } else {
            self.tokens[self.position - 1].end
        }
    }

    fn token_text(&self, token: &Token) -> &'a str {
        &self.source[token.start..token.end]
    }

    fn current_text(&self) -> &'a str {
        match self.current().token_type {
            TokenType::Eof => "end of statement",
            _ => self.token_text(self.current()),
        }
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn match_token(&mut self, token_type: TokenType) -> bool {
        if std::mem::discriminant(&self.current().token_type) == std::mem::discriminant(&token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token_type: TokenType) -> Result<()> {
        if self.match_token(token_type.clone()) {
            Ok(())
        } else {
            Err(self.error(&format!(
                "Expected {}, found '{}'",
                describe_token(&token_type),
                self.current_text()
            )))
        }
    }

    fn error(&self, msg: &str) -> SqlError {
        self.error_at(self.current(), msg)
    }

    fn error_at(&self, token: &Token, msg: &str) -> SqlError {
        SqlError::Syntax(format!(
            "{} at line {} column {}",
            msg, token.line, token.column
        ))
    }
}

fn describe_token(token_type: &TokenType) -> String {
    match token_type {
        TokenType::LParen => "'('".to_string(),
        TokenType::RParen => "')'".to_string(),
        TokenType::Comma => "','".to_string(),
        TokenType::Eq => "'='".to_string(),
        other => format!("{:?}", other).to_uppercase(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
