use super::{Address, Segment, Word, WORD_SIZE};
use crate::error;
use crate::lang::Error;
use std::convert::TryFrom;

type Result<T> = std::result::Result<T, Error>;

/// Default size in bytes of every segment.
pub const POOL_SIZE: usize = 256 * 1024;

/// Instructions executed per `Runtime::execute` slice by the front end.
pub const CYCLES: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub pool_size: usize,
    pub cycles: usize,
}

impl Default for Limits {
    fn default() -> Limits {
        Limits {
            pool_size: POOL_SIZE,
            cycles: CYCLES,
        }
    }
}

impl Limits {
    pub fn words(&self) -> usize {
        self.pool_size / WORD_SIZE
    }
}

fn allocate<T: Clone + Default>(name: &str, len: usize) -> Result<Vec<T>> {
    let mut vec = Vec::new();
    if vec.try_reserve_exact(len).is_err() {
        return Err(error!(OutOfMemory; &format!("could not allocate {} area", name)));
    }
    vec.resize(len, T::default());
    Ok(vec)
}

/// ## Fixed-capacity byte pool with a bump cursor
///
/// Used for the data segment, where string literals accumulate for the
/// life of the program, and for the heap behind `malloc`.

#[derive(Debug, Clone)]
pub struct Pool {
    segment: Segment,
    bytes: Vec<u8>,
    top: usize,
}

impl Pool {
    pub fn new(segment: Segment, size: usize) -> Result<Pool> {
        debug_assert!(!segment.is_word_addressed());
        Ok(Pool {
            segment,
            bytes: allocate(&segment.to_string(), size)?,
            top: 0,
        })
    }

    pub fn data(size: usize) -> Result<Pool> {
        Pool::new(Segment::Data, size)
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Bytes handed out so far.
    pub fn top(&self) -> usize {
        self.top
    }

    pub fn address(&self) -> Address {
        Address::new(self.segment, self.top)
    }

    pub fn push(&mut self, byte: u8) -> Result<()> {
        match self.bytes.get_mut(self.top) {
            Some(b) => {
                *b = byte;
                self.top += 1;
                Ok(())
            }
            None => Err(error!(OutOfMemory; &format!("{} segment full", self.segment))),
        }
    }

    pub fn alloc(&mut self, len: usize) -> Option<Address> {
        let end = self.top.checked_add(len)?;
        if end > self.bytes.len() {
            return None;
        }
        let addr = self.address();
        self.top = end;
        Some(addr)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn range(&self, offset: usize, len: usize) -> Result<std::ops::Range<usize>> {
        match offset.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(offset..end),
            _ => Err(out_of_bounds(Address::new(self.segment, offset))),
        }
    }
}

fn out_of_bounds(addr: Address) -> Error {
    error!(SegmentationFault; &format!("{} out of bounds", addr))
}

/// ## VM memory
///
/// Code and stack are arrays of words, data and heap arrays of bytes.
/// Every access decodes an `Address` and is checked against the bounds
/// of its segment. The code segment is read-only to the running program.

#[derive(Debug, Clone)]
pub struct Memory {
    code: Vec<Word>,
    code_len: usize,
    data: Pool,
    stack: Vec<Word>,
    heap: Pool,
}

impl Memory {
    pub fn new(limits: &Limits, data: Pool) -> Result<Memory> {
        Ok(Memory {
            code: allocate("code", limits.words())?,
            code_len: 0,
            data,
            stack: allocate("stack", limits.words())?,
            heap: Pool::new(Segment::Heap, limits.pool_size)?,
        })
    }

    pub fn load_code(&mut self, words: &[Word]) -> Result<()> {
        if words.len() > self.code.len() {
            return Err(error!(OutOfMemory; "program does not fit in code segment"));
        }
        self.code[..words.len()].copy_from_slice(words);
        if self.code_len > words.len() {
            for w in self.code[words.len()..self.code_len].iter_mut() {
                *w = 0;
            }
        }
        self.code_len = words.len();
        Ok(())
    }

    /// Loaded instructions.
    pub fn code(&self) -> &[Word] {
        &self.code[..self.code_len]
    }

    pub fn data(&self) -> &Pool {
        &self.data
    }

    pub fn heap(&self) -> &Pool {
        &self.heap
    }

    pub fn fetch(&self, pc: usize) -> Result<Word> {
        match self.code().get(pc) {
            Some(w) => Ok(*w),
            None => Err(out_of_bounds(Address::code(pc))),
        }
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    pub fn stack_cell(&self, index: usize) -> Result<Word> {
        match self.stack.get(index) {
            Some(w) => Ok(*w),
            None => Err(out_of_bounds(Address::stack(index))),
        }
    }

    pub fn set_stack_cell(&mut self, index: usize, value: Word) -> Result<()> {
        match self.stack.get_mut(index) {
            Some(w) => {
                *w = value;
                Ok(())
            }
            None => Err(out_of_bounds(Address::stack(index))),
        }
    }

    pub fn malloc(&mut self, len: Word) -> Word {
        if len < 0 {
            return 0;
        }
        match self.heap.alloc(len as usize) {
            Some(addr) => addr.to_word(),
            None => 0,
        }
    }

    pub fn load_word(&self, addr: Word) -> Result<Word> {
        let addr = Address::try_from(addr)?;
        match addr.segment {
            Segment::Code => self.fetch(addr.cell()?),
            Segment::Stack => self.stack_cell(addr.cell()?),
            Segment::Data | Segment::Heap => {
                let pool = self.pool(addr.segment);
                let mut buf = [0u8; WORD_SIZE];
                buf.copy_from_slice(&pool.bytes[pool.range(addr.offset, WORD_SIZE)?]);
                Ok(Word::from_le_bytes(buf))
            }
        }
    }

    pub fn store_word(&mut self, addr: Word, value: Word) -> Result<()> {
        let addr = Address::try_from(addr)?;
        match addr.segment {
            Segment::Code => Err(read_only(addr)),
            Segment::Stack => self.set_stack_cell(addr.cell()?, value),
            Segment::Data | Segment::Heap => {
                let pool = self.pool_mut(addr.segment);
                let range = pool.range(addr.offset, WORD_SIZE)?;
                pool.bytes[range].copy_from_slice(&value.to_le_bytes());
                Ok(())
            }
        }
    }

    pub fn load_byte(&self, addr: Word) -> Result<u8> {
        let addr = Address::try_from(addr)?;
        match addr.segment {
            Segment::Code | Segment::Stack => {
                let cell = if addr.segment == Segment::Code {
                    self.fetch(addr.offset / WORD_SIZE)?
                } else {
                    self.stack_cell(addr.offset / WORD_SIZE)?
                };
                Ok(cell.to_le_bytes()[addr.offset % WORD_SIZE])
            }
            Segment::Data | Segment::Heap => {
                let pool = self.pool(addr.segment);
                Ok(pool.bytes[pool.range(addr.offset, 1)?][0])
            }
        }
    }

    pub fn store_byte(&mut self, addr: Word, value: u8) -> Result<()> {
        let addr = Address::try_from(addr)?;
        match addr.segment {
            Segment::Code => Err(read_only(addr)),
            Segment::Stack => {
                let index = addr.offset / WORD_SIZE;
                let mut bytes = self.stack_cell(index)?.to_le_bytes();
                bytes[addr.offset % WORD_SIZE] = value;
                self.set_stack_cell(index, Word::from_le_bytes(bytes))
            }
            Segment::Data | Segment::Heap => {
                let pool = self.pool_mut(addr.segment);
                let range = pool.range(addr.offset, 1)?;
                pool.bytes[range][0] = value;
                Ok(())
            }
        }
    }

    /// Fails unless all of `addr..addr + len` lies inside one segment.
    pub fn check_range(&self, addr: Word, len: usize) -> Result<()> {
        let start = Address::try_from(addr)?;
        let size = match start.segment {
            Segment::Code => self.code_len * WORD_SIZE,
            Segment::Stack => self.stack.len() * WORD_SIZE,
            Segment::Data | Segment::Heap => self.pool(start.segment).capacity(),
        };
        match start.offset.checked_add(len) {
            Some(end) if end <= size => Ok(()),
            _ => Err(error!(SegmentationFault; &format!("{} + {} out of bounds", start, len))),
        }
    }

    pub fn read_bytes(&self, addr: Word, len: usize) -> Result<Vec<u8>> {
        self.check_range(addr, len)?;
        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            out.push(self.load_byte(addr.wrapping_add(i as Word))?);
        }
        Ok(out)
    }

    pub fn write_bytes(&mut self, addr: Word, bytes: &[u8]) -> Result<()> {
        self.check_range(addr, bytes.len())?;
        for (i, b) in bytes.iter().enumerate() {
            self.store_byte(addr.wrapping_add(i as Word), *b)?;
        }
        Ok(())
    }

    /// Bytes up to, not including, the first NUL.
    pub fn read_cstr(&self, addr: Word) -> Result<Vec<u8>> {
        let mut out = vec![];
        loop {
            let b = self.load_byte(addr.wrapping_add(out.len() as Word))?;
            if b == 0 {
                return Ok(out);
            }
            out.push(b);
        }
    }

    fn pool(&self, segment: Segment) -> &Pool {
        if segment == Segment::Heap {
            &self.heap
        } else {
            &self.data
        }
    }

    fn pool_mut(&mut self, segment: Segment) -> &mut Pool {
        if segment == Segment::Heap {
            &mut self.heap
        } else {
            &mut self.data
        }
    }
}

fn read_only(addr: Address) -> Error {
    error!(SegmentationFault; &format!("write to read-only {}", addr))
}
