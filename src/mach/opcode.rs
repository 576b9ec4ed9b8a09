use super::Word;
use std::convert::TryFrom;

/// ## Virtual machine instruction set
///
/// The machine has an accumulator `ax` and a downward-growing stack.
/// Binary operations pop their left operand and combine it with `ax`,
/// leaving the result in `ax`.
///
/// For example: `10 + 20` compiles to `[IMM 10, PUSH, IMM 20, ADD]`
///
/// Each opcode occupies one code cell. `IMM`, `LEA`, `JMP`, `JZ`, `JNZ`,
/// `CALL`, `ENT` and `ADJ` are followed by one operand cell.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    // *** Memory and immediates
    /// Load address of frame slot `bp + k`.
    Lea,
    /// Load immediate value.
    Imm,

    // *** Branch control
    Jmp,
    /// Push return address and branch.
    Call,
    /// Branch if `ax` is zero.
    Jz,
    /// Branch if `ax` is not zero.
    Jnz,
    /// Push `bp`, point `bp` at it, reserve `n` local cells.
    Ent,
    /// Discard `n` argument cells.
    Adj,
    /// Tear down the frame and return.
    Lev,

    // *** Loads and stores
    Li,
    Lc,
    Si,
    Sc,
    Push,

    // *** Expression operations
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

    // *** System calls
    Open,
    Read,
    Clos,
    Prtf,
    Malc,
    Mset,
    Mcmp,
    Exit,
}

impl Opcode {
    pub fn has_operand(self) -> bool {
        use Opcode::*;
        match self {
            Lea | Imm | Jmp | Call | Jz | Jnz | Ent | Adj => true,
            _ => false,
        }
    }

    /// Operand is a code address.
    pub fn is_branch(self) -> bool {
        use Opcode::*;
        match self {
            Jmp | Call | Jz | Jnz => true,
            _ => false,
        }
    }
}

impl From<Opcode> for Word {
    fn from(op: Opcode) -> Word {
        op as Word
    }
}

impl TryFrom<Word> for Opcode {
    type Error = Word;
    fn try_from(word: Word) -> Result<Self, Self::Error> {
        use Opcode::*;
        Ok(match word {
            0 => Lea,
            1 => Imm,
            2 => Jmp,
            3 => Call,
            4 => Jz,
            5 => Jnz,
            6 => Ent,
            7 => Adj,
            8 => Lev,
            9 => Li,
            10 => Lc,
            11 => Si,
            12 => Sc,
            13 => Push,
            14 => Or,
            15 => Xor,
            16 => And,
            17 => Eq,
            18 => Ne,
            19 => Lt,
            20 => Gt,
            21 => Le,
            22 => Ge,
            23 => Shl,
            24 => Shr,
            25 => Add,
            26 => Sub,
            27 => Mul,
            28 => Div,
            29 => Mod,
            30 => Open,
            31 => Read,
            32 => Clos,
            33 => Prtf,
            34 => Malc,
            35 => Mset,
            36 => Mcmp,
            37 => Exit,
            _ => return Err(word),
        })
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Opcode::*;
        match self {
            Lea => write!(f, "LEA"),
            Imm => write!(f, "IMM"),
            Jmp => write!(f, "JMP"),
            Call => write!(f, "CALL"),
            Jz => write!(f, "JZ"),
            Jnz => write!(f, "JNZ"),
            Ent => write!(f, "ENT"),
            Adj => write!(f, "ADJ"),
            Lev => write!(f, "LEV"),
            Li => write!(f, "LI"),
            Lc => write!(f, "LC"),
            Si => write!(f, "SI"),
            Sc => write!(f, "SC"),
            Push => write!(f, "PUSH"),
            Or => write!(f, "OR"),
            Xor => write!(f, "XOR"),
            And => write!(f, "AND"),
            Eq => write!(f, "EQ"),
            Ne => write!(f, "NE"),
            Lt => write!(f, "LT"),
            Gt => write!(f, "GT"),
            Le => write!(f, "LE"),
            Ge => write!(f, "GE"),
            Shl => write!(f, "SHL"),
            Shr => write!(f, "SHR"),
            Add => write!(f, "ADD"),
            Sub => write!(f, "SUB"),
            Mul => write!(f, "MUL"),
            Div => write!(f, "DIV"),
            Mod => write!(f, "MOD"),
            Open => write!(f, "OPEN"),
            Read => write!(f, "READ"),
            Clos => write!(f, "CLOS"),
            Prtf => write!(f, "PRTF"),
            Malc => write!(f, "MALC"),
            Mset => write!(f, "MSET"),
            Mcmp => write!(f, "MCMP"),
            Exit => write!(f, "EXIT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbering() {
        assert_eq!(Word::from(Opcode::Lea), 0);
        assert_eq!(Word::from(Opcode::Push), 13);
        assert_eq!(Word::from(Opcode::Exit), 37);
        for w in 0..38 {
            assert_eq!(Opcode::try_from(w).map(Word::from), Ok(w));
        }
        assert_eq!(Opcode::try_from(38), Err(38));
        assert_eq!(Opcode::try_from(-1), Err(-1));
    }

    #[test]
    fn test_operands() {
        assert!(Opcode::Imm.has_operand());
        assert!(Opcode::Adj.has_operand());
        assert!(!Opcode::Prtf.has_operand());
        assert!(Opcode::Call.is_branch());
        assert!(!Opcode::Ent.is_branch());
    }
}
