//! # c4
//!
//! Tokenize C source and run bytecode on the stack machine.
//!

fn main() {
    c4::term::main();
}
