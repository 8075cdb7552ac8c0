use crate::error::{DecodeError, DecodeResult};

/// Operand size selected by the `w` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
  Byte,
  Word,
}

impl Width {
  pub fn from_w_bit(w_bit_set: bool) -> Self {
    if w_bit_set {
      Width::Word
    } else {
      Width::Byte
    }
  }

  pub fn keyword(self) -> &'static str {
    match self {
      Width::Byte => "byte",
      Width::Word => "word",
    }
  }
}

/// A general purpose register, addressed by its 3-bit encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
  index: u8,
  width: Width,
}

impl Register {
  pub fn new(index: u8, width: Width) -> DecodeResult<Self> {
    if index > 0b111 {
      return Err(DecodeError::InvalidField { field: "register", value: index });
    }
    Ok(Register { index, width })
  }

  pub fn accumulator(width: Width) -> Self {
    Register { index: 0b000, width }
  }

  pub fn name(self) -> &'static str {
    match (self.index, self.width) {
      (0b_000, Width::Byte) => "al",
      (0b_001, Width::Byte) => "cl",
      (0b_010, Width::Byte) => "dl",
      (0b_011, Width::Byte) => "bl",
      (0b_100, Width::Byte) => "ah",
      (0b_101, Width::Byte) => "ch",
      (0b_110, Width::Byte) => "dh",
      (0b_111, Width::Byte) => "bh",
      (0b_000, Width::Word) => "ax",
      (0b_001, Width::Word) => "cx",
      (0b_010, Width::Word) => "dx",
      (0b_011, Width::Word) => "bx",
      (0b_100, Width::Word) => "sp",
      (0b_101, Width::Word) => "bp",
      (0b_110, Width::Word) => "si",
      (0b_111, Width::Word) => "di",
      // index is range checked in `Register::new`
      _ => unreachable!(),
    }
  }
}

const EFFECTIVE_ADDRESSES: [&str; 8] = [
  "bx + si", "bx + di", "bp + si", "bp + di", "si", "di", "bp", "bx",
];

/// Base (and index) registers named by the r/m field of a memory operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveAddress(u8);

impl EffectiveAddress {
  pub fn new(rm: u8) -> DecodeResult<Self> {
    if usize::from(rm) >= EFFECTIVE_ADDRESSES.len() {
      return Err(DecodeError::InvalidField { field: "r/m", value: rm });
    }
    Ok(EffectiveAddress(rm))
  }

  pub fn expression(self) -> &'static str {
    EFFECTIVE_ADDRESSES[usize::from(self.0)]
  }
}
