use tracing::{debug, trace};

use crate::cursor::ByteCursor;
use crate::decode::{decode_instruction, DecodedInstruction};
use crate::error::DisassembleError;

/// Lines emitted ahead of the first instruction.
pub const HEADER: [&str; 2] = ["bits 16", ""];

/// An instruction and the offset of its first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located {
  pub offset: usize,
  pub instruction: DecodedInstruction,
}

/// Decodes instructions front to back, stopping for good at the first error.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
  cursor: ByteCursor<'a>,
  failed: bool,
}

impl<'a> Decoder<'a> {
  pub fn new(bytes: &'a [u8]) -> Self {
    Decoder { cursor: ByteCursor::new(bytes), failed: false }
  }
}

impl Iterator for Decoder<'_> {
  type Item = Result<Located, DisassembleError>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.failed || self.cursor.is_at_end() {
      return None;
    }
    let offset = self.cursor.position();
    match decode_instruction(&mut self.cursor) {
      Ok(instruction) => {
        trace!(offset, length = instruction.length, "{instruction}");
        Some(Ok(Located { offset, instruction }))
      }
      Err(error) => {
        debug!(offset, %error, "decoding stopped");
        self.failed = true;
        Some(Err(DisassembleError { offset, error }))
      }
    }
  }
}

impl std::iter::FusedIterator for Decoder<'_> {}

/// Renders a full listing, header included, or the first decode failure.
pub fn disassemble(bytes: &[u8]) -> Result<String, DisassembleError> {
  let mut lines: Vec<String> = HEADER.iter().map(|line| line.to_string()).collect();
  for located in Decoder::new(bytes) {
    lines.push(located?.instruction.to_string());
  }
  lines.push("".to_string());
  Ok(lines.join("\n"))
}
