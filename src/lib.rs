//! # c4
//!
//! A tokenizer and symbol interner for a small subset of C, together with
//! the stack virtual machine its bytecode runs on.
//!
//! The `c4` binary reads the first line of a source file, tokenizes it,
//! then runs a built-in bootstrap program and prints its exit status.
//! ```text
//! $ c4 hello.c
//! exit(30)
//! ```
//!
//! Options: `-s` prints a listing of the bytecode, `-t` prints every
//! token, `--full` reads the whole file instead of the first line.
//! Started without a file, `c4` tokenizes each line typed at the prompt.

pub mod lang;
pub mod mach;

#[doc(hidden)]
pub mod term;
