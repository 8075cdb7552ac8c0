use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
  #[error("unsupported instruction {byte:#04x} ({byte:08b})")]
  UnsupportedInstruction { byte: u8 },
  #[error("not enough bytes in instruction stream: need {needed}, {available} available")]
  TruncatedInstruction { needed: usize, available: usize },
  #[error("invalid {field} field value {value:#b}")]
  InvalidField { field: &'static str, value: u8 },
}

/// A decode failure together with the offset of the instruction that caused it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("decoding failed at offset {offset:#06x}: {error}")]
pub struct DisassembleError {
  pub offset: usize,
  #[source]
  pub error: DecodeError,
}

pub type DecodeResult<T> = Result<T, DecodeError>;
