use crate::registers::{EffectiveAddress, Register, Width};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
  Register(Register),
  Memory(MemoryReference),
  Immediate(Immediate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryReference {
  pub address: Address,
  /// Only printed when no register operand implies the size.
  pub width: Width,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
  /// Mode 00 with r/m 110: a bare 16-bit address.
  Direct(u16),
  Effective {
    base: EffectiveAddress,
    displacement: i16,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Immediate {
  Data(i16),
  /// Branch displacement relative to the start of the branch instruction.
  Relative(i16),
}

impl Operand {
  pub fn is_register(&self) -> bool {
    matches!(self, Operand::Register(_))
  }
}
