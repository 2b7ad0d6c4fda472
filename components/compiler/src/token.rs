//! Token types produced by the scanner

/// Lox token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Single-character tokens
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `;`
    Semicolon,
    /// `/`
    Slash,
    /// `*`
    Star,
    /// `?`
    Question,
    /// `:`
    Colon,

    // One or two character tokens
    /// `!`
    Bang,
    /// `!=`
    BangEqual,
    /// `=`
    Equal,
    /// `==`
    EqualEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,

    // Literals
    /// Identifier
    Identifier,
    /// String literal, lexeme includes the quotes
    String,
    /// Number literal
    Number,

    // Keywords
    /// `and`
    And,
    /// `break`
    Break,
    /// `class`
    Class,
    /// `continue`
    Continue,
    /// `else`
    Else,
    /// `false`
    False,
    /// `for`
    For,
    /// `fun`
    Fun,
    /// `if`
    If,
    /// `nil`
    Nil,
    /// `or`
    Or,
    /// `print`
    Print,
    /// `return`
    Return,
    /// `super`
    Super,
    /// `this`
    This,
    /// `true`
    True,
    /// `var`
    Var,
    /// `while`
    While,

    /// Scanner error; the lexeme is the message
    Error,
    /// End of input
    Eof,
}

impl TokenKind {
    /// Keyword for an identifier lexeme, if it is one
    pub fn keyword(text: &str) -> Option<TokenKind> {
        let kind = match text {
            "and" => TokenKind::And,
            "break" => TokenKind::Break,
            "class" => TokenKind::Class,
            "continue" => TokenKind::Continue,
            "else" => TokenKind::Else,
            "false" => TokenKind::False,
            "for" => TokenKind::For,
            "fun" => TokenKind::Fun,
            "if" => TokenKind::If,
            "nil" => TokenKind::Nil,
            "or" => TokenKind::Or,
            "print" => TokenKind::Print,
            "return" => TokenKind::Return,
            "super" => TokenKind::Super,
            "this" => TokenKind::This,
            "true" => TokenKind::True,
            "var" => TokenKind::Var,
            "while" => TokenKind::While,
            _ => return None,
        };
        Some(kind)
    }

    /// Check if a statement can begin with this token (used to resynchronize
    /// after a syntax error)
    pub fn starts_statement(self) -> bool {
        matches!(
            self,
            TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
        )
    }
}

/// A token borrowing its lexeme from the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    /// Token kind
    pub kind: TokenKind,
    /// Source text of the token, or the message for error tokens
    pub lexeme: &'src str,
    /// 1-based source line
    pub line: u32,
}

impl<'src> Token<'src> {
    /// Token not taken from the source, e.g. the implicit `this`
    pub fn synthetic(lexeme: &'src str, line: u32) -> Self {
        Token {
            kind: TokenKind::Identifier,
            lexeme,
            line,
        }
    }
}
