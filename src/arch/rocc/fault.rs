use thiserror::Error;

use super::command::RESP_FAIL;

/// Everything that can go wrong with a single command. None of these stop
/// the interface; a faulted command retires with [`RESP_FAIL`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
  #[error("command queue full")]
  QueueFull,
  #[error("memory request failed near {addr:#x}")]
  MemoryFailure { addr: u64 },
  #[error("unknown opcode {0:#x}")]
  UnknownOpcode(u8),
  #[error("array id {0} out of range")]
  InvalidArray(u64),
  #[error("read response of {got} bytes with {remaining} bytes outstanding")]
  TransferOverrun { got: u64, remaining: u64 },
  #[error("{len} bytes at {addr:#x} run past the end of the address space")]
  AddressOverflow { addr: u64, len: u64 },
  #[error("{0} response while no {0} is outstanding")]
  UnexpectedResponse(&'static str),
}

impl Fault {
  pub fn completion_value(&self) -> u64 {
    RESP_FAIL
  }
}

/// Rejected construction-time parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
  #[error("{0} must be at least 1")]
  Zero(&'static str),
  #[error("{name} is {size} bytes, {data_type} holds at most {width}")]
  OperandTooWide {
    name: &'static str,
    size: u32,
    data_type: &'static str,
    width: usize,
  },
}
