/*!
## Rust Machine Module

This Rust module is the virtual machine: its memory segments, instruction
set and execution engine.

*/

/// Machine word used for registers, stack cells and code cells.
pub type Word = i64;

/// Bytes per machine word.
pub const WORD_SIZE: usize = std::mem::size_of::<Word>();

mod address;
mod host;
mod memory;
mod opcode;
mod program;
mod runtime;

#[cfg(test)]
mod tests;

pub use address::Address;
pub use address::Segment;
pub use host::format;
pub use memory::{Limits, Memory, Pool, CYCLES, POOL_SIZE};
pub use opcode::Opcode;
pub use program::Program;
pub use runtime::{Event, Registers, Runtime};
