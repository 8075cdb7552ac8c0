use crate::classify::{classify, EncodingForm, InstructionClass, Opcode, OpcodeFlags};
use crate::cursor::ByteCursor;
use crate::error::DecodeResult;
use crate::operand::{Address, Immediate, MemoryReference, Operand};
use crate::registers::{EffectiveAddress, Register, Width};

/// The r/m value that means "direct address" when mod is 00.
const DIRECT_ADDRESS: u8 = 0b_110;

/// Branch displacements count from the byte after the two-byte instruction.
const BRANCH_INSTRUCTION_LEN: i16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInstruction {
  pub class: InstructionClass,
  pub operands: Operands,
  pub length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operands {
  Pair { destination: Operand, source: Operand },
  Single(Operand),
}

impl DecodedInstruction {
  pub fn mnemonic(&self) -> &'static str {
    self.class.mnemonic()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
  Memory,
  Memory8,
  Memory16,
  Register,
}

#[derive(Debug, Clone, Copy)]
struct ModRegRm {
  mode: Mode,
  reg: u8,
  rm: u8,
}

impl ModRegRm {
  fn new(byte: u8) -> Self {
    let mode = match byte >> 6 {
      0b_00 => Mode::Memory,
      0b_01 => Mode::Memory8,
      0b_10 => Mode::Memory16,
      _ => Mode::Register,
    };
    ModRegRm {
      mode,
      reg: (byte >> 3) & 0b_111,
      rm: byte & 0b_111,
    }
  }
}

/// Decodes one instruction starting at the cursor position, leaving the
/// cursor on the first byte of the next one.
pub fn decode_instruction(cursor: &mut ByteCursor) -> DecodeResult<DecodedInstruction> {
  cursor.begin_instruction();
  let opcode = classify(cursor)?;
  cursor.next_u8()?;
  let operands = decode_operands(cursor, opcode)?;
  Ok(DecodedInstruction {
    class: opcode.class,
    operands,
    length: cursor.instruction_len(),
  })
}

fn decode_operands(cursor: &mut ByteCursor, opcode: Opcode) -> DecodeResult<Operands> {
  let OpcodeFlags { reg_is_destination, wide, sign_extend } = opcode.flags;
  let width = Width::from_w_bit(wide);
  let operands = match opcode.form {
    EncodingForm::RegisterMemoryWithRegister => {
      let modrm = ModRegRm::new(cursor.next_u8()?);
      let reg = Operand::Register(Register::new(modrm.reg, width)?);
      let rm = register_or_memory(cursor, modrm, width)?;
      if reg_is_destination {
        pair(reg, rm)
      } else {
        pair(rm, reg)
      }
    }
    EncodingForm::ImmediateToRegisterMemory => {
      // reg holds the opcode extension, already consumed by the classifier
      let modrm = ModRegRm::new(cursor.next_u8()?);
      let destination = register_or_memory(cursor, modrm, width)?;
      pair(destination, immediate(cursor, wide, sign_extend)?)
    }
    EncodingForm::ImmediateToAccumulator => {
      let destination = Operand::Register(Register::accumulator(width));
      pair(destination, immediate(cursor, wide, false)?)
    }
    EncodingForm::ImmediateToRegister => {
      let destination = Operand::Register(Register::new(opcode.byte & 0b_111, width)?);
      pair(destination, immediate(cursor, wide, false)?)
    }
    EncodingForm::MemoryToAccumulator => {
      let memory = direct_memory(cursor, width)?;
      pair(Operand::Register(Register::accumulator(width)), memory)
    }
    EncodingForm::AccumulatorToMemory => {
      let memory = direct_memory(cursor, width)?;
      pair(memory, Operand::Register(Register::accumulator(width)))
    }
    EncodingForm::RelativeBranch => {
      let displacement = i16::from(cursor.next_i8()?) + BRANCH_INSTRUCTION_LEN;
      Operands::Single(Operand::Immediate(Immediate::Relative(displacement)))
    }
  };
  Ok(operands)
}

fn pair(destination: Operand, source: Operand) -> Operands {
  Operands::Pair { destination, source }
}

fn register_or_memory(
  cursor: &mut ByteCursor,
  modrm: ModRegRm,
  width: Width,
) -> DecodeResult<Operand> {
  let address = match modrm.mode {
    Mode::Register => return Ok(Operand::Register(Register::new(modrm.rm, width)?)),
    Mode::Memory if modrm.rm == DIRECT_ADDRESS => Address::Direct(cursor.next_u16()?),
    Mode::Memory => effective(modrm.rm, 0)?,
    Mode::Memory8 => effective(modrm.rm, i16::from(cursor.next_i8()?))?,
    Mode::Memory16 => effective(modrm.rm, cursor.next_u16()? as i16)?,
  };
  Ok(Operand::Memory(MemoryReference { address, width }))
}

fn effective(rm: u8, displacement: i16) -> DecodeResult<Address> {
  Ok(Address::Effective {
    base: EffectiveAddress::new(rm)?,
    displacement,
  })
}

fn direct_memory(cursor: &mut ByteCursor, width: Width) -> DecodeResult<Operand> {
  let address = Address::Direct(cursor.next_u16()?);
  Ok(Operand::Memory(MemoryReference { address, width }))
}

fn immediate(cursor: &mut ByteCursor, wide: bool, sign_extend: bool) -> DecodeResult<Operand> {
  let value = if wide && !sign_extend {
    cursor.next_u16()? as i16
  } else {
    i16::from(cursor.next_i8()?)
  };
  Ok(Operand::Immediate(Immediate::Data(value)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::DecodeError;
  use pretty_assertions::assert_eq;

  fn decode(bytes: &[u8]) -> DecodeResult<DecodedInstruction> {
    decode_instruction(&mut ByteCursor::new(bytes))
  }

  fn reg(index: u8, width: Width) -> Operand {
    Operand::Register(Register::new(index, width).unwrap())
  }

  fn mem(address: Address, width: Width) -> Operand {
    Operand::Memory(MemoryReference { address, width })
  }

  fn base(rm: u8, displacement: i16) -> Address {
    Address::Effective {
      base: EffectiveAddress::new(rm).unwrap(),
      displacement,
    }
  }

  #[test]
  fn test_register_to_register() {
    let decoded = decode(&[0b100010_0_1, 0b11_011_001]).unwrap();
    assert_eq!(decoded.class, InstructionClass::Mov);
    assert_eq!(decoded.length, 2);
    assert_eq!(
      decoded.operands,
      pair(reg(0b001, Width::Word), reg(0b011, Width::Word))
    );
  }

  #[test]
  fn test_direction_flag_selects_destination() {
    // mov al, [bx + si]
    let decoded = decode(&[0b100010_1_0, 0b00_000_000]).unwrap();
    assert_eq!(
      decoded.operands,
      pair(reg(0b000, Width::Byte), mem(base(0b000, 0), Width::Byte))
    );
    // mov [bx + si], al
    let decoded = decode(&[0b100010_0_0, 0b00_000_000]).unwrap();
    assert_eq!(
      decoded.operands,
      pair(mem(base(0b000, 0), Width::Byte), reg(0b000, Width::Byte))
    );
  }

  #[test]
  fn test_displacement_modes() {
    // mov dx, [bp + si + 4]
    let decoded = decode(&[0x8b, 0b01_010_010, 0x04]).unwrap();
    assert_eq!(decoded.length, 3);
    assert_eq!(
      decoded.operands,
      pair(reg(0b010, Width::Word), mem(base(0b010, 4), Width::Word))
    );
    // 8-bit displacement is sign extended
    let decoded = decode(&[0x8b, 0b01_000_111, 0xdb]).unwrap();
    assert_eq!(
      decoded.operands,
      pair(reg(0b000, Width::Word), mem(base(0b111, -37), Width::Word))
    );
    // mov [bp + di + 4999], cx
    let decoded = decode(&[0x89, 0b10_001_011, 0x87, 0x13]).unwrap();
    assert_eq!(decoded.length, 4);
    assert_eq!(
      decoded.operands,
      pair(mem(base(0b011, 4999), Width::Word), reg(0b001, Width::Word))
    );
  }

  #[test]
  fn test_direct_address() {
    let decoded = decode(&[0x8b, 0b00_101_110, 0xd2, 0x04]).unwrap();
    assert_eq!(decoded.length, 4);
    assert_eq!(
      decoded.operands,
      pair(reg(0b101, Width::Word), mem(Address::Direct(1234), Width::Word))
    );
  }

  #[test]
  fn test_bp_with_zero_displacement_is_not_direct() {
    let decoded = decode(&[0x8a, 0b01_000_110, 0x00]).unwrap();
    assert_eq!(
      decoded.operands,
      pair(reg(0b000, Width::Byte), mem(base(0b110, 0), Width::Byte))
    );
  }

  #[test]
  fn test_immediate_widths() {
    assert_eq!(
      decode(&[0xb1, 0x0c]).unwrap().operands,
      pair(reg(0b001, Width::Byte), Operand::Immediate(Immediate::Data(12)))
    );
    assert_eq!(
      decode(&[0xb9, 0xf4, 0xff]).unwrap().operands,
      pair(reg(0b001, Width::Word), Operand::Immediate(Immediate::Data(-12)))
    );
    // add word [bx], -3 with sign extension
    let decoded = decode(&[0x83, 0b00_000_111, 0xfd]).unwrap();
    assert_eq!(decoded.length, 3);
    assert_eq!(
      decoded.operands,
      pair(mem(base(0b111, 0), Width::Word), Operand::Immediate(Immediate::Data(-3)))
    );
    // sub word [bx], 1000 without sign extension
    let decoded = decode(&[0x81, 0b00_101_111, 0xe8, 0x03]).unwrap();
    assert_eq!(decoded.class, InstructionClass::Sub);
    assert_eq!(decoded.length, 4);
    // add bl, 5
    let decoded = decode(&[0x80, 0b11_000_011, 0x05]).unwrap();
    assert_eq!(decoded.class, InstructionClass::Add);
    assert_eq!(decoded.length, 3);
    assert_eq!(
      decoded.operands,
      pair(reg(0b011, Width::Byte), Operand::Immediate(Immediate::Data(5)))
    );
    // 0x82 sets s with w clear: still a single byte, sub cl, -5
    let decoded = decode(&[0x82, 0b11_101_001, 0xfb]).unwrap();
    assert_eq!(decoded.class, InstructionClass::Sub);
    assert_eq!(decoded.length, 3);
    assert_eq!(
      decoded.operands,
      pair(reg(0b001, Width::Byte), Operand::Immediate(Immediate::Data(-5)))
    );
  }

  #[test]
  fn test_compare_direct_address_immediate() {
    let decoded = decode(&[0x83, 0x3e, 0x00, 0x00, 0x02]).unwrap();
    assert_eq!(decoded.class, InstructionClass::Cmp);
    assert_eq!(decoded.length, 5);
    assert_eq!(
      decoded.operands,
      pair(mem(Address::Direct(0), Width::Word), Operand::Immediate(Immediate::Data(2)))
    );
  }

  #[test]
  fn test_accumulator_forms() {
    assert_eq!(
      decode(&[0x3c, 0xe2]).unwrap().operands,
      pair(reg(0b000, Width::Byte), Operand::Immediate(Immediate::Data(-30)))
    );
    assert_eq!(
      decode(&[0xa1, 0xfb, 0x09]).unwrap().operands,
      pair(reg(0b000, Width::Word), mem(Address::Direct(2555), Width::Word))
    );
    assert_eq!(
      decode(&[0xa2, 0x10, 0x00]).unwrap().operands,
      pair(mem(Address::Direct(16), Width::Byte), reg(0b000, Width::Byte))
    );
  }

  #[test]
  fn test_branch_displacement_counts_from_next_instruction() {
    let decoded = decode(&[0x75, 0x02]).unwrap();
    assert_eq!(decoded.class, InstructionClass::Jne);
    assert_eq!(
      decoded.operands,
      Operands::Single(Operand::Immediate(Immediate::Relative(4)))
    );
    let decoded = decode(&[0xe2, 0xfe]).unwrap();
    assert_eq!(
      decoded.operands,
      Operands::Single(Operand::Immediate(Immediate::Relative(0)))
    );
  }

  #[test]
  fn test_truncated_reads() {
    let cases: [(&[u8], usize); 6] = [
      (&[0x89], 2),
      (&[0x89, 0b10_000_000, 0x01], 4),
      (&[0x8b, 0b00_000_110, 0x00], 4),
      (&[0xb8, 0x01], 3),
      (&[0x75], 2),
      (&[0x83, 0b01_111_000, 0x01], 4),
    ];
    for (bytes, needed) in cases {
      assert_eq!(
        decode(bytes),
        Err(DecodeError::TruncatedInstruction { needed, available: bytes.len() })
      );
    }
  }
}
