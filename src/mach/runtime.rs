use super::host::{self, Files};
use super::{Address, Limits, Memory, Opcode, Pool, Program, Segment, Word};
use crate::error;
use crate::lang::Error;
use std::convert::TryFrom;
use std::io::Write;

type Result<T> = std::result::Result<T, Error>;

/// ## Machine registers
///
/// `pc` indexes code cells. `sp` and `bp` index stack cells; the stack
/// grows toward index zero and starts one past its last cell.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Registers {
    pub pc: usize,
    pub sp: usize,
    pub bp: usize,
    pub ax: Word,
}

/// ## Events
///
/// Returned by `Runtime::execute` so the host decides how output,
/// termination and errors are presented.

#[derive(Debug, PartialEq)]
pub enum Event {
    Stopped,
    Running,
    Print(String),
    Exit(Word),
    Error(Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Stopped,
    Running,
    Interrupt,
}

#[derive(Debug)]
pub struct Runtime {
    limits: Limits,
    memory: Memory,
    reg: Registers,
    files: Files,
    state: State,
}

impl Runtime {
    /// Allocates every segment up front. `data` is the pool the lexer
    /// filled with string literals.
    pub fn new(limits: Limits, data: Pool) -> Result<Runtime> {
        let memory = Memory::new(&limits, data)?;
        let top = memory.stack_len();
        Ok(Runtime {
            limits,
            memory,
            reg: Registers {
                pc: 0,
                sp: top,
                bp: top,
                ax: 0,
            },
            files: Files::default(),
            state: State::Stopped,
        })
    }

    pub fn with_limits(limits: Limits) -> Result<Runtime> {
        let data = Pool::data(limits.pool_size)?;
        Runtime::new(limits, data)
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn registers(&self) -> Registers {
        self.reg
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn load(&mut self, program: &Program) -> Result<()> {
        self.load_words(program.words())
    }

    pub fn load_words(&mut self, words: &[Word]) -> Result<()> {
        self.memory.load_code(words)
    }

    /// Begins execution at code cell `entry`.
    pub fn start(&mut self, entry: usize) {
        self.reg.pc = entry;
        self.state = State::Running;
    }

    /// Halt at the next `execute`.
    pub fn interrupt(&mut self) {
        if self.state == State::Running {
            self.state = State::Interrupt;
        }
    }

    /// Runs at most `cycles` instructions.
    pub fn execute(&mut self, cycles: usize) -> Event {
        match self.state {
            State::Stopped => return Event::Stopped,
            State::Interrupt => {
                self.state = State::Stopped;
                return Event::Error(error!(Interrupted, @self.reg.pc));
            }
            State::Running => {}
        }
        for _ in 0..cycles {
            let pc = self.reg.pc;
            match self.step() {
                Ok(None) => {}
                Ok(Some(event)) => {
                    if let Event::Exit(_) = event {
                        self.state = State::Stopped;
                    }
                    return event;
                }
                Err(error) => {
                    self.state = State::Stopped;
                    return Event::Error(error.at_address(pc));
                }
            }
        }
        Event::Running
    }

    /// Runs to completion, writing program output and the final
    /// `exit(N)` line to `out`.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<Word> {
        let io = |e: std::io::Error| error!(IoError; &e.to_string());
        loop {
            match self.execute(self.limits.cycles) {
                Event::Running => {}
                Event::Print(s) => write!(out, "{}", s).map_err(io)?,
                Event::Exit(code) => {
                    writeln!(out, "exit({})", code).map_err(io)?;
                    return Ok(code);
                }
                Event::Error(error) => return Err(error),
                Event::Stopped => return Err(error!(InternalError; "NOT RUNNING")),
            }
        }
    }

    fn operand(&mut self) -> Result<Word> {
        let w = self.memory.fetch(self.reg.pc)?;
        self.reg.pc += 1;
        Ok(w)
    }

    fn push(&mut self, value: Word) -> Result<()> {
        if self.reg.sp == 0 {
            return Err(error!(StackOverflow));
        }
        self.reg.sp -= 1;
        self.memory.set_stack_cell(self.reg.sp, value)
    }

    fn pop(&mut self) -> Result<Word> {
        if self.reg.sp >= self.memory.stack_len() {
            return Err(error!(StackUnderflow));
        }
        let value = self.memory.stack_cell(self.reg.sp)?;
        self.reg.sp += 1;
        Ok(value)
    }

    /// Stack cell `n` above the top, where system calls find arguments.
    fn arg(&self, n: usize) -> Result<Word> {
        match self.reg.sp.checked_add(n) {
            Some(i) if i < self.memory.stack_len() => self.memory.stack_cell(i),
            _ => Err(error!(StackUnderflow; "missing system call argument")),
        }
    }

    /// Stack index `base + delta`, which may sit one past the last cell.
    fn stack_index(&self, base: usize, delta: Word) -> Result<usize> {
        let index = match (base as Word).checked_add(delta) {
            Some(index) => index,
            None if delta < 0 => return Err(error!(StackOverflow)),
            None => return Err(error!(StackUnderflow)),
        };
        if index < 0 {
            Err(error!(StackOverflow))
        } else if index as usize > self.memory.stack_len() {
            Err(error!(StackUnderflow))
        } else {
            Ok(index as usize)
        }
    }

    fn code_target(word: Word) -> Result<usize> {
        Address::try_from(word)?.expect(Segment::Code)?.cell()
    }

    fn frame_target(&self, word: Word) -> Result<usize> {
        let index = Address::try_from(word)?.expect(Segment::Stack)?.cell()?;
        self.stack_index(index, 0)
    }

    fn step(&mut self) -> Result<Option<Event>> {
        let word = self.memory.fetch(self.reg.pc)?;
        self.reg.pc += 1;
        let op = match Opcode::try_from(word) {
            Ok(op) => op,
            Err(w) => {
                return Err(error!(UnknownInstruction; &format!("unknown instruction:{}", w)));
            }
        };
        use Opcode::*;
        match op {
            Imm => self.reg.ax = self.operand()?,
            Lea => {
                let k = self.operand()?;
                match self.stack_index(self.reg.bp, k) {
                    Ok(index) => self.reg.ax = Address::stack(index).to_word(),
                    Err(_) => return Err(error!(SegmentationFault; "frame slot outside stack")),
                }
            }
            Lc => self.reg.ax = self.memory.load_byte(self.reg.ax)? as i8 as Word,
            Li => self.reg.ax = self.memory.load_word(self.reg.ax)?,
            Sc => {
                let addr = self.pop()?;
                self.memory.store_byte(addr, self.reg.ax as u8)?;
                self.reg.ax = self.reg.ax as u8 as i8 as Word;
            }
            Si => {
                let addr = self.pop()?;
                self.memory.store_word(addr, self.reg.ax)?;
            }
            Push => self.push(self.reg.ax)?,
            Jmp => {
                let target = self.operand()?;
                self.reg.pc = Runtime::code_target(target)?;
            }
            Jz | Jnz => {
                let target = self.operand()?;
                if (self.reg.ax == 0) == (op == Jz) {
                    self.reg.pc = Runtime::code_target(target)?;
                }
            }
            Call => {
                let target = self.operand()?;
                self.push(Address::code(self.reg.pc).to_word())?;
                self.reg.pc = Runtime::code_target(target)?;
            }
            Ent => {
                let n = self.operand()?;
                self.push(Address::stack(self.reg.bp).to_word())?;
                self.reg.bp = self.reg.sp;
                let n = n.checked_neg().ok_or_else(|| error!(StackOverflow))?;
                self.reg.sp = self.stack_index(self.reg.sp, n)?;
            }
            Adj => {
                let n = self.operand()?;
                self.reg.sp = self.stack_index(self.reg.sp, n)?;
            }
            Lev => {
                self.reg.sp = self.reg.bp;
                let bp = self.pop()?;
                self.reg.bp = self.frame_target(bp)?;
                let pc = self.pop()?;
                self.reg.pc = Runtime::code_target(pc)?;
            }
            Or | Xor | And | Eq | Ne | Lt | Gt | Le | Ge | Shl | Shr | Add | Sub | Mul | Div
            | Mod => {
                let l = self.pop()?;
                self.reg.ax = Runtime::binary(op, l, self.reg.ax)?;
            }
            Open => {
                let path = self.memory.read_cstr(self.arg(1)?)?;
                self.reg.ax = self.files.open(&path, self.arg(0)?);
            }
            Read => {
                let (fd, buf, len) = (self.arg(2)?, self.arg(1)?, self.arg(0)?);
                self.reg.ax = match usize::try_from(len) {
                    Ok(len) => {
                        self.memory.check_range(buf, len)?;
                        match self.files.read(fd, len) {
                            Some(bytes) => {
                                self.memory.write_bytes(buf, &bytes)?;
                                bytes.len() as Word
                            }
                            None => -1,
                        }
                    }
                    Err(_) => -1,
                };
            }
            Clos => self.reg.ax = self.files.close(self.arg(0)?),
            Prtf => {
                // Argument count is the operand of the ADJ that follows.
                let count = self.memory.fetch(self.reg.pc + 1)?;
                if count < 1 {
                    return Err(error!(StackUnderflow; "printf without format"));
                }
                let base = self.stack_index(self.reg.sp, count)?;
                let format = self.memory.stack_cell(base - 1)?;
                let mut args = vec![];
                for i in 2..=(count.min(6) as usize) {
                    args.push(self.memory.stack_cell(base - i)?);
                }
                let fmt = self.memory.read_cstr(format)?;
                let out = host::format(&self.memory, &fmt, &args)?;
                self.reg.ax = out.len() as Word;
                return Ok(Some(Event::Print(String::from_utf8_lossy(&out).into_owned())));
            }
            Malc => self.reg.ax = self.memory.malloc(self.arg(0)?),
            Mset => {
                let (addr, fill, len) = (self.arg(2)?, self.arg(1)?, self.arg(0)?);
                let len = usize::try_from(len)
                    .map_err(|_| error!(SegmentationFault; "negative memset length"))?;
                self.memory.check_range(addr, len)?;
                self.memory.write_bytes(addr, &vec![fill as u8; len])?;
                self.reg.ax = addr;
            }
            Mcmp => {
                let (a, b, len) = (self.arg(2)?, self.arg(1)?, self.arg(0)?);
                let len = usize::try_from(len)
                    .map_err(|_| error!(SegmentationFault; "negative memcmp length"))?;
                self.memory.check_range(a, len)?;
                self.memory.check_range(b, len)?;
                let (a, b) = (self.memory.read_bytes(a, len)?, self.memory.read_bytes(b, len)?);
                self.reg.ax = a
                    .iter()
                    .zip(b.iter())
                    .map(|(x, y)| *x as Word - *y as Word)
                    .find(|d| *d != 0)
                    .unwrap_or(0);
            }
            Exit => return Ok(Some(Event::Exit(self.arg(0)?))),
        }
        Ok(None)
    }

    /// A sum or difference involving an address must stay in that
    /// address's segment. Subtracting two addresses of one segment
    /// yields a plain distance.
    fn pointer_arithmetic(op: Opcode, l: Word, r: Word, result: Word) -> Result<Word> {
        let segment = match (op, Segment::of(l), Segment::of(r)) {
            (Opcode::Sub, Some(a), Some(b)) if a == b => return Ok(result),
            (_, Some(a), _) => a,
            (Opcode::Add, None, Some(b)) => b,
            _ => return Ok(result),
        };
        if Segment::of(result) == Some(segment) {
            Ok(result)
        } else {
            Err(error!(SegmentationFault; &format!("arithmetic leaves {} segment", segment)))
        }
    }

    fn binary(op: Opcode, l: Word, r: Word) -> Result<Word> {
        use Opcode::*;
        Ok(match op {
            Or => l | r,
            Xor => l ^ r,
            And => l & r,
            Eq => (l == r) as Word,
            Ne => (l != r) as Word,
            Lt => (l < r) as Word,
            Gt => (l > r) as Word,
            Le => (l <= r) as Word,
            Ge => (l >= r) as Word,
            Shl => l.wrapping_shl(r as u32),
            Shr => l.wrapping_shr(r as u32),
            Add => Runtime::pointer_arithmetic(op, l, r, l.wrapping_add(r))?,
            Sub => Runtime::pointer_arithmetic(op, l, r, l.wrapping_sub(r))?,
            Mul => l.wrapping_mul(r),
            Div | Mod if r == 0 => return Err(error!(DivisionByZero)),
            Div => l.wrapping_div(r),
            Mod => l.wrapping_rem(r),
            _ => return Err(error!(InternalError; "NOT A BINARY OPERATION")),
        })
    }
}
