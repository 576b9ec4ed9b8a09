use super::SymbolId;
use crate::mach::Word;
use std::convert::TryFrom;

/// First classification code after the ASCII range.
pub const NUM: Word = 128;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Token {
    /// Number, character or string literal. Strings carry the
    /// data-segment address of their first byte.
    Num(Word),
    Ident(SymbolId),
    Keyword(Keyword),
    Operator(Operator),
    /// Single ASCII punctuation returned as itself.
    Punct(u8),
}

impl Token {
    /// Numeric classification in the historical numbering: ASCII
    /// punctuation is its own byte, everything else counts up from 128.
    pub fn code(&self) -> Word {
        match self {
            Token::Num(_) => NUM,
            Token::Ident(_) => NUM + 5,
            Token::Keyword(k) => NUM + 6 + *k as Word,
            Token::Operator(op) => NUM + 14 + *op as Word,
            Token::Punct(ch) => *ch as Word,
        }
    }

    pub fn value(&self) -> Option<Word> {
        match self {
            Token::Num(v) => Some(*v),
            _ => None,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Token::*;
        match self {
            Num(n) => write!(f, "{}", n),
            Ident(id) => write!(f, "ID({})", id),
            Keyword(k) => write!(f, "{}", k),
            Operator(op) => write!(f, "{}", op),
            Punct(ch) => write!(f, "{}", *ch as char),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Keyword {
    Char,
    Else,
    Enum,
    If,
    Int,
    Return,
    Sizeof,
    While,
}

impl Keyword {
    pub const ALL: [Keyword; 8] = [
        Keyword::Char,
        Keyword::Else,
        Keyword::Enum,
        Keyword::If,
        Keyword::Int,
        Keyword::Return,
        Keyword::Sizeof,
        Keyword::While,
    ];
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Keyword::*;
        match self {
            Char => write!(f, "char"),
            Else => write!(f, "else"),
            Enum => write!(f, "enum"),
            If => write!(f, "if"),
            Int => write!(f, "int"),
            Return => write!(f, "return"),
            Sizeof => write!(f, "sizeof"),
            While => write!(f, "while"),
        }
    }
}

/// Operators in ascending precedence order.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum Operator {
    Assign,
    Cond,
    Lor,
    Lan,
    Or,
    Xor,
    And,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Inc,
    Dec,
    Brak,
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Operator::*;
        match self {
            Assign => write!(f, "<-"),
            Cond => write!(f, "?"),
            Lor => write!(f, "||"),
            Lan => write!(f, "&&"),
            Or => write!(f, "|"),
            Xor => write!(f, "^"),
            And => write!(f, "&"),
            Eq => write!(f, "=="),
            Ne => write!(f, "!="),
            Lt => write!(f, "<"),
            Gt => write!(f, ">"),
            Le => write!(f, "<="),
            Ge => write!(f, ">="),
            Shl => write!(f, "<<"),
            Shr => write!(f, ">>"),
            Add => write!(f, "+"),
            Sub => write!(f, "-"),
            Mul => write!(f, "*"),
            Div => write!(f, "/"),
            Mod => write!(f, "%"),
            Inc => write!(f, "++"),
            Dec => write!(f, "--"),
            Brak => write!(f, "["),
        }
    }
}

impl TryFrom<u8> for Operator {
    type Error = u8;
    /// Operators spelled with a single character.
    fn try_from(ch: u8) -> Result<Self, Self::Error> {
        use Operator::*;
        Ok(match ch {
            b'?' => Cond,
            b'|' => Or,
            b'^' => Xor,
            b'&' => And,
            b'=' => Eq,
            b'<' => Lt,
            b'>' => Gt,
            b'+' => Add,
            b'-' => Sub,
            b'*' => Mul,
            b'/' => Div,
            b'%' => Mod,
            b'[' => Brak,
            _ => return Err(ch),
        })
    }
}
