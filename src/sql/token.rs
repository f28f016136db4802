/// Token types for the SQL lexer
use phf::phf_map;

// Perfect hash map for O(1) keyword lookup
static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "select" => TokenType::Select,
    "from" => TokenType::From,
    "where" => TokenType::Where,
    "insert" => TokenType::Insert,
    "into" => TokenType::Into,
    "values" => TokenType::Values,
    "update" => TokenType::Update,
    "set" => TokenType::Set,
    "delete" => TokenType::Delete,
    "create" => TokenType::Create,
    "table" => TokenType::Table,
    "index" => TokenType::Index,
    "unique" => TokenType::Unique,
    "drop" => TokenType::Drop,
    "alter" => TokenType::Alter,
    "add" => TokenType::Add,
    "column" => TokenType::Column,
    "if" => TokenType::If,
    "exists" => TokenType::Exists,
    "and" => TokenType::And,
    "or" => TokenType::Or,
    "not" => TokenType::Not,
    "like" => TokenType::Like,
    "in" => TokenType::In,
    "between" => TokenType::Between,
    "is" => TokenType::Is,
    "null" => TokenType::Null,
    "as" => TokenType::As,
    "order" => TokenType::Order,
    "by" => TokenType::By,
    "asc" => TokenType::Asc,
    "desc" => TokenType::Desc,
    "limit" => TokenType::Limit,
    "offset" => TokenType::Offset,
    "distinct" => TokenType::Distinct,
    "group" => TokenType::Group,
    "having" => TokenType::Having,
    "join" => TokenType::Join,
    "left" => TokenType::Left,
    "right" => TokenType::Right,
    "inner" => TokenType::Inner,
    "outer" => TokenType::Outer,
    "full" => TokenType::Full,
    "cross" => TokenType::Cross,
    "on" => TokenType::On,
    "primary" => TokenType::Primary,
    "key" => TokenType::Key,
    "foreign" => TokenType::Foreign,
    "check" => TokenType::Check,
    "constraint" => TokenType::Constraint,
    "show" => TokenType::Show,
    "describe" => TokenType::Describe,
    "tables" => TokenType::Tables,
};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Keywords
    Select,
    From,
    Where,
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,
    Create,
    Table,
    Index,
    Unique,
    Drop,
    Alter,
    Add,
    Column,
    If,
    Exists,
    And,
    Or,
    Not,
    Like,
    In,
    Between,
    Is,
    Null,
    As,
    Order,
    By,
    Asc,
    Desc, // DESC (ordering) or DESC (describe)
    Limit,
    Offset,
    Distinct,
    Group,
    Having,
    Join,
    Left,
    Right,
    Inner,
    Outer,
    Full,
    Cross,
    On,
    Primary,
    Key,
    Foreign,
    Check,
    Constraint,
    Show,
    Describe,
    Tables,

    // Operators
    Eq,    // =
    Ne,    // != or <>
    Lt,    // <
    Gt,    // >
    Le,    // <=
    Ge,    // >=
    Plus,  // +
    Minus, // -
    Star,  // *
    Slash, // /

    // Delimiters
    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,

    // Literals
    Number(f64),
    String(String),
    Identifier(String),

    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    /// Byte range in the statement text
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(token_type: TokenType, start: usize, end: usize, line: usize, column: usize) -> Self {
        Self { token_type, start, end, line, column }
    }
}

impl TokenType {
    /// Keyword lookup, case-insensitive
    pub fn from_keyword(s: &str) -> Option<Self> {
        let lowercase = s.to_lowercase();
        KEYWORDS.get(lowercase.as_str()).cloned()
    }

    pub fn is_keyword(&self) -> bool {
        !matches!(
            self,
            TokenType::Eq
                | TokenType::Ne
                | TokenType::Lt
                | TokenType::Gt
                | TokenType::Le
                | TokenType::Ge
                | TokenType::Plus
                | TokenType::Minus
                | TokenType::Star
                | TokenType::Slash
                | TokenType::LParen
                | TokenType::RParen
                | TokenType::Comma
                | TokenType::Semicolon
                | TokenType::Dot
                | TokenType::Number(_)
                | TokenType::String(_)
                | TokenType::Identifier(_)
                | TokenType::Eof
        )
    }

    /// Keywords that may still name a table or column (`key`, `tables`, ...)
    pub fn is_non_reserved(&self) -> bool {
        matches!(
            self,
            TokenType::Index
                | TokenType::Unique
                | TokenType::Add
                | TokenType::Column
                | TokenType::If
                | TokenType::Exists
                | TokenType::Primary
                | TokenType::Key
                | TokenType::Foreign
                | TokenType::Check
                | TokenType::Constraint
                | TokenType::Show
                | TokenType::Describe
                | TokenType::Tables
        )
    }
}
