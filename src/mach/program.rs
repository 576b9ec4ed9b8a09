use super::{Address, Opcode, Word};
use std::convert::TryFrom;

/// ## Bytecode under construction
///
/// Branch operands are encoded as code-segment addresses. A forward
/// branch can be pushed with a placeholder target and linked later with
/// `patch`.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    words: Vec<Word>,
}

impl Program {
    pub fn new() -> Program {
        Program::default()
    }

    pub fn from_words(words: Vec<Word>) -> Program {
        Program { words }
    }

    /// `IMM 10, PUSH, IMM 20, ADD, PUSH, EXIT`
    pub fn bootstrap() -> Program {
        let mut p = Program::new();
        p.push_with(Opcode::Imm, 10);
        p.push(Opcode::Push);
        p.push_with(Opcode::Imm, 20);
        p.push(Opcode::Add);
        p.push(Opcode::Push);
        p.push(Opcode::Exit);
        p
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Address of the next instruction pushed.
    pub fn here(&self) -> usize {
        self.words.len()
    }

    pub fn push(&mut self, op: Opcode) -> usize {
        debug_assert!(!op.has_operand());
        let at = self.here();
        self.words.push(op.into());
        at
    }

    pub fn push_with(&mut self, op: Opcode, operand: Word) -> usize {
        debug_assert!(op.has_operand() && !op.is_branch());
        let at = self.here();
        self.words.push(op.into());
        self.words.push(operand);
        at
    }

    pub fn push_branch(&mut self, op: Opcode, target: usize) -> usize {
        debug_assert!(op.is_branch());
        let at = self.here();
        self.words.push(op.into());
        self.words.push(Address::code(target).to_word());
        at
    }

    /// Points the branch at `at` to `target`.
    pub fn patch(&mut self, at: usize, target: usize) {
        debug_assert!(matches!(
            self.words.get(at).map(|w| Opcode::try_from(*w)),
            Some(Ok(op)) if op.is_branch()
        ));
        if let Some(operand) = self.words.get_mut(at + 1) {
            *operand = Address::code(target).to_word();
        }
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut pc = 0;
        while pc < self.words.len() {
            let word = self.words[pc];
            let op = match Opcode::try_from(word) {
                Ok(op) => op,
                Err(_) => {
                    writeln!(f, "{:>5}  ??? {}", pc, word)?;
                    pc += 1;
                    continue;
                }
            };
            if !op.has_operand() {
                writeln!(f, "{:>5}  {}", pc, op)?;
                pc += 1;
                continue;
            }
            match self.words.get(pc + 1) {
                None => writeln!(f, "{:>5}  {} ?", pc, op)?,
                Some(operand) if op.is_branch() => match Address::try_from(*operand) {
                    Ok(addr) if addr.offset % super::WORD_SIZE == 0 => {
                        writeln!(f, "{:>5}  {} {}", pc, op, addr.offset / super::WORD_SIZE)?
                    }
                    _ => writeln!(f, "{:>5}  {} {:#x}", pc, op, operand)?,
                },
                Some(operand) => writeln!(f, "{:>5}  {} {}", pc, op, operand)?,
            }
            pc += 2;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_words() {
        assert_eq!(Program::bootstrap().words(), &[1, 10, 13, 1, 20, 25, 13, 37]);
    }

    #[test]
    fn test_forward_branch() {
        let mut p = Program::new();
        let jz = p.push_branch(Opcode::Jz, 0);
        p.push_with(Opcode::Imm, 1);
        let end = p.here();
        p.patch(jz, end);
        p.push(Opcode::Lev);
        assert_eq!(p.words()[1], Address::code(4).to_word());
        assert_eq!(
            p.to_string(),
            "    0  JZ 4\n    2  IMM 1\n    4  LEV\n"
        );
    }

    #[test]
    fn test_listing_unknown_word() {
        let p = Program::from_words(vec![999, 1]);
        assert_eq!(p.to_string(), "    0  ??? 999\n    1  IMM ?\n");
    }
}
