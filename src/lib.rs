//! Disassembler for a subset of 16-bit 8086 machine code.
//!
//! Supports `mov`, `add`, `sub`, `cmp` and the conditional jump/loop family,
//! producing a listing that nasm reassembles to the same bytes. Anything
//! outside that subset stops decoding with an error instead of guessing.

pub mod classify;
pub mod cursor;
pub mod decode;
pub mod disassemble;
pub mod error;
pub mod operand;
mod render;
pub mod registers;

pub use decode::{DecodedInstruction, Operands};
pub use disassemble::{disassemble, Decoder, Located, HEADER};
pub use error::{DecodeError, DisassembleError};
