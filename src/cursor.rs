use crate::error::{DecodeError, DecodeResult};

/// Read position into the instruction stream.
///
/// Every read is checked against the end of the buffer before any byte is
/// taken, so a multi-byte field either reads completely or not at all.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
  bytes: &'a [u8],
  start: usize,
  position: usize,
}

impl<'a> ByteCursor<'a> {
  pub fn new(bytes: &'a [u8]) -> Self {
    ByteCursor { bytes, start: 0, position: 0 }
  }

  pub fn position(&self) -> usize {
    self.position
  }

  pub fn is_at_end(&self) -> bool {
    self.position >= self.bytes.len()
  }

  /// Marks the current position as the first byte of a new instruction.
  pub fn begin_instruction(&mut self) {
    self.start = self.position;
  }

  /// Bytes consumed since the last `begin_instruction`.
  pub fn instruction_len(&self) -> usize {
    self.position - self.start
  }

  /// Byte at `offset` from the start of the current instruction, without consuming it.
  pub fn peek(&self, offset: usize) -> DecodeResult<u8> {
    let index = self.start + offset;
    self.bytes.get(index).copied().ok_or(DecodeError::TruncatedInstruction {
      needed: offset + 1,
      available: self.bytes.len() - self.start,
    })
  }

  pub fn next_u8(&mut self) -> DecodeResult<u8> {
    self.ensure(1)?;
    let byte = self.bytes[self.position];
    self.position += 1;
    Ok(byte)
  }

  pub fn next_i8(&mut self) -> DecodeResult<i8> {
    self.next_u8().map(|byte| byte as i8)
  }

  /// Little-endian 16-bit value.
  pub fn next_u16(&mut self) -> DecodeResult<u16> {
    self.ensure(2)?;
    let value = u16::from_le_bytes([self.bytes[self.position], self.bytes[self.position + 1]]);
    self.position += 2;
    Ok(value)
  }

  fn ensure(&self, count: usize) -> DecodeResult<()> {
    if self.position + count > self.bytes.len() {
      return Err(DecodeError::TruncatedInstruction {
        needed: self.instruction_len() + count,
        available: self.bytes.len() - self.start,
      });
    }
    Ok(())
  }
}
