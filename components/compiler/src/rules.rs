//! Pratt parser rule table

use crate::compiler::Compiler;
use crate::token::TokenKind;

/// Binding power of infix operators, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// Not an operator
    None,
    /// `,`
    Comma,
    /// `=`
    Assignment,
    /// `?:`
    Ternary,
    /// `or`
    Or,
    /// `and`
    And,
    /// `== !=`
    Equality,
    /// `< > <= >=`
    Comparison,
    /// `+ -`
    Term,
    /// `* /`
    Factor,
    /// `! -`
    Unary,
    /// `. ()`
    Call,
    /// Literals and grouping
    Primary,
}

impl Precedence {
    /// The next-higher level, used for left-associative operands
    pub fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Comma,
            Precedence::Comma => Precedence::Assignment,
            Precedence::Assignment => Precedence::Ternary,
            Precedence::Ternary => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call | Precedence::Primary => Precedence::Primary,
        }
    }
}

/// Parse action; the flag says whether an `=` may follow
pub(crate) type ParseFn<'src, 'ctx> = fn(&mut Compiler<'src, 'ctx>, bool);

pub(crate) struct ParseRule<'src, 'ctx> {
    pub prefix: Option<ParseFn<'src, 'ctx>>,
    pub infix: Option<ParseFn<'src, 'ctx>>,
    pub precedence: Precedence,
}

impl<'src, 'ctx> ParseRule<'src, 'ctx> {
    fn new(
        prefix: Option<ParseFn<'src, 'ctx>>,
        infix: Option<ParseFn<'src, 'ctx>>,
        precedence: Precedence,
    ) -> Self {
        ParseRule {
            prefix,
            infix,
            precedence,
        }
    }
}

pub(crate) fn rule<'src, 'ctx>(kind: TokenKind) -> ParseRule<'src, 'ctx> {
    use Precedence as P;
    use TokenKind as T;

    match kind {
        T::LeftParen => ParseRule::new(Some(Compiler::grouping), Some(Compiler::call), P::Call),
        T::Dot => ParseRule::new(None, Some(Compiler::dot), P::Call),
        T::Minus => ParseRule::new(Some(Compiler::unary), Some(Compiler::binary), P::Term),
        T::Plus => ParseRule::new(None, Some(Compiler::binary), P::Term),
        T::Slash | T::Star => ParseRule::new(None, Some(Compiler::binary), P::Factor),
        T::Comma => ParseRule::new(None, Some(Compiler::comma), P::Comma),
        T::Question => ParseRule::new(None, Some(Compiler::ternary), P::Ternary),
        T::Bang => ParseRule::new(Some(Compiler::unary), None, P::None),
        T::BangEqual | T::EqualEqual => ParseRule::new(None, Some(Compiler::binary), P::Equality),
        T::Greater | T::GreaterEqual | T::Less | T::LessEqual => {
            ParseRule::new(None, Some(Compiler::binary), P::Comparison)
        }
        T::Identifier => ParseRule::new(Some(Compiler::variable), None, P::None),
        T::String => ParseRule::new(Some(Compiler::string), None, P::None),
        T::Number => ParseRule::new(Some(Compiler::number), None, P::None),
        T::And => ParseRule::new(None, Some(Compiler::and), P::And),
        T::Or => ParseRule::new(None, Some(Compiler::or), P::Or),
        T::False | T::Nil | T::True => ParseRule::new(Some(Compiler::literal), None, P::None),
        T::Fun => ParseRule::new(Some(Compiler::lambda), None, P::None),
        T::Super => ParseRule::new(Some(Compiler::super_), None, P::None),
        T::This => ParseRule::new(Some(Compiler::this), None, P::None),
        _ => ParseRule::new(None, None, P::None),
    }
}
