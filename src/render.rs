use std::fmt;

use crate::decode::{DecodedInstruction, Operands};
use crate::operand::{Address, Immediate, MemoryReference, Operand};

impl fmt::Display for DecodedInstruction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ", self.mnemonic())?;
    match &self.operands {
      Operands::Pair { destination, source } => {
        // without a register operand the assembler can't infer the size
        let sized = !destination.is_register() && !source.is_register();
        write_operand(f, destination, sized)?;
        f.write_str(", ")?;
        write_operand(f, source, sized)
      }
      Operands::Single(operand) => write_operand(f, operand, false),
    }
  }
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Operand, sized: bool) -> fmt::Result {
  match operand {
    Operand::Memory(memory) if sized => write!(f, "{} {memory}", memory.width.keyword()),
    _ => write!(f, "{operand}"),
  }
}

impl fmt::Display for Operand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Operand::Register(register) => f.write_str(register.name()),
      Operand::Memory(memory) => write!(f, "{memory}"),
      Operand::Immediate(immediate) => write!(f, "{immediate}"),
    }
  }
}

impl fmt::Display for MemoryReference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.address {
      Address::Direct(address) => write!(f, "[{address}]"),
      Address::Effective { base, displacement: 0 } => write!(f, "[{}]", base.expression()),
      Address::Effective { base, displacement } if displacement < 0 => {
        write!(f, "[{} - {}]", base.expression(), displacement.unsigned_abs())
      }
      Address::Effective { base, displacement } => {
        write!(f, "[{} + {displacement}]", base.expression())
      }
    }
  }
}

impl fmt::Display for Immediate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match *self {
      Immediate::Data(value) => write!(f, "{value}"),
      Immediate::Relative(offset) if offset >= 0 => write!(f, "$+{offset}"),
      Immediate::Relative(offset) => write!(f, "${offset}"),
    }
  }
}
