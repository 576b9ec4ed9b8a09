use super::{Word, WORD_SIZE};
use crate::error;
use crate::lang::Error;
use std::convert::TryFrom;

const TAG_SHIFT: u32 = 40;
const OFFSET_MASK: Word = (1 << TAG_SHIFT) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Code = 1,
    Data = 2,
    Stack = 3,
    Heap = 4,
}

impl Segment {
    /// Segment named by the tag bits of `word`, if any.
    pub fn of(word: Word) -> Option<Segment> {
        match word >> TAG_SHIFT {
            1 => Some(Segment::Code),
            2 => Some(Segment::Data),
            3 => Some(Segment::Stack),
            4 => Some(Segment::Heap),
            _ => None,
        }
    }

    /// Code and stack hold whole words; data and heap hold bytes.
    pub fn is_word_addressed(self) -> bool {
        match self {
            Segment::Code | Segment::Stack => true,
            Segment::Data | Segment::Heap => false,
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Segment::*;
        match self {
            Code => write!(f, "code"),
            Data => write!(f, "data"),
            Stack => write!(f, "stack"),
            Heap => write!(f, "heap"),
        }
    }
}

/// ## Segment-scoped byte address
///
/// Encoded in a machine word as `tag << 40 | offset`. No segment has
/// tag zero, so the word `0` is the null pointer.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    pub segment: Segment,
    pub offset: usize,
}

impl Address {
    pub fn new(segment: Segment, offset: usize) -> Address {
        debug_assert!((offset as Word) <= OFFSET_MASK);
        Address { segment, offset }
    }

    pub fn code(cell: usize) -> Address {
        Address::new(Segment::Code, cell * WORD_SIZE)
    }

    pub fn stack(cell: usize) -> Address {
        Address::new(Segment::Stack, cell * WORD_SIZE)
    }

    pub fn to_word(self) -> Word {
        (self.segment as Word) << TAG_SHIFT | self.offset as Word
    }

    /// Cell index for word-addressed segments. Fails when unaligned.
    pub fn cell(self) -> Result<usize, Error> {
        if self.offset % WORD_SIZE == 0 {
            Ok(self.offset / WORD_SIZE)
        } else {
            Err(error!(SegmentationFault; &format!("unaligned word access at {}", self)))
        }
    }

    pub fn expect(self, segment: Segment) -> Result<Address, Error> {
        if self.segment == segment {
            Ok(self)
        } else {
            Err(error!(SegmentationFault; &format!("expected {} address, got {}", segment, self)))
        }
    }
}

impl From<Address> for Word {
    fn from(addr: Address) -> Word {
        addr.to_word()
    }
}

impl TryFrom<Word> for Address {
    type Error = Error;
    fn try_from(word: Word) -> Result<Self, Self::Error> {
        let segment = match Segment::of(word) {
            Some(segment) => segment,
            None if word == 0 => return Err(error!(SegmentationFault; "null pointer")),
            None => return Err(error!(SegmentationFault; &format!("bad address {:#x}", word))),
        };
        Ok(Address {
            segment,
            offset: (word & OFFSET_MASK) as usize,
        })
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}+{:#x}", self.segment, self.offset)
    }
}
