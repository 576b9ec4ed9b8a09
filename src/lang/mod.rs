/*!
# Rust Language Module

This Rust module provides lexical analysis of the C-like source language
and the symbol table that identifiers are interned into.

*/

#[macro_use]
mod error;
mod lex;
mod source;
mod symbol;

pub use error::Error;
pub use error::ErrorCode;
pub use lex::Lexer;
pub use source::{read_source, ReadMode};
pub use symbol::{BaseType, Binding, Class, Kind, Symbol, SymbolId, SymbolTable, Type};

pub mod token;

/// Byte range of a token within the source buffer.
pub type Column = std::ops::Range<usize>;
