use serde::{Deserialize, Serialize};

/// Accelerator opcodes, keyed by the instruction's funct7 field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Opcode {
  /// mvm.set: load a full matrix from memory into an array
  SetMatrix,
  /// mvm.l: load an input vector from memory
  LoadVector,
  /// mvm: run the matrix-vector product on an array
  Compute,
  /// mvm.s: store an array's output vector to memory
  StoreVector,
  /// mvm.mv: copy one array's output into another array's input
  MoveVector,
  Unknown(u8),
}

impl Opcode {
  pub fn code(self) -> u8 {
    match self {
      Opcode::SetMatrix => 0x1,
      Opcode::LoadVector => 0x2,
      Opcode::Compute => 0x3,
      Opcode::StoreVector => 0x4,
      Opcode::MoveVector => 0x5,
      Opcode::Unknown(code) => code,
    }
  }
}

impl From<u8> for Opcode {
  fn from(funct: u8) -> Self {
    match funct {
      0x1 => Opcode::SetMatrix,
      0x2 => Opcode::LoadVector,
      0x3 => Opcode::Compute,
      0x4 => Opcode::StoreVector,
      0x5 => Opcode::MoveVector,
      other => Opcode::Unknown(other),
    }
  }
}

/// One host command.
///
/// For memory-bearing opcodes `operand_a` is the memory address and
/// `operand_b` the array id. Compute only reads `operand_b`. MoveVector reads
/// `operand_a` as the source array and `operand_b` as the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
  pub opcode: Opcode,
  pub operand_a: u64,
  pub operand_b: u64,
  /// destination register for the result value
  pub slot: u8,
}

impl Command {
  pub fn new(opcode: Opcode, operand_a: u64, operand_b: u64, slot: u8) -> Self {
    Self {
      opcode,
      operand_a,
      operand_b,
      slot,
    }
  }

  pub fn set_matrix(addr: u64, array_id: u32, slot: u8) -> Self {
    Self::new(Opcode::SetMatrix, addr, array_id as u64, slot)
  }

  pub fn load_vector(addr: u64, array_id: u32, slot: u8) -> Self {
    Self::new(Opcode::LoadVector, addr, array_id as u64, slot)
  }

  pub fn compute(array_id: u32, slot: u8) -> Self {
    Self::new(Opcode::Compute, 0, array_id as u64, slot)
  }

  pub fn store_vector(addr: u64, array_id: u32, slot: u8) -> Self {
    Self::new(Opcode::StoreVector, addr, array_id as u64, slot)
  }

  pub fn move_vector(src_array: u32, dst_array: u32, slot: u8) -> Self {
    Self::new(Opcode::MoveVector, src_array as u64, dst_array as u64, slot)
  }
}

/// Result of one retired command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
  pub slot: u8,
  pub value: u64,
}

/// Completion value for a command that ran to the end.
pub const RESP_OK: u64 = 0;
/// Completion value for any failed command.
pub const RESP_FAIL: u64 = 1;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_opcode_decode() {
    assert_eq!(Opcode::from(1), Opcode::SetMatrix);
    assert_eq!(Opcode::from(5), Opcode::MoveVector);
    assert_eq!(Opcode::from(0), Opcode::Unknown(0));
    assert_eq!(Opcode::from(0x7f), Opcode::Unknown(0x7f));
    for code in 0u8..=0x7f {
      assert_eq!(Opcode::from(code).code(), code);
    }
  }

  #[test]
  fn test_command_json_payload() {
    let cmd = Command::move_vector(2, 3, 10);
    let content = serde_json::to_string(&cmd).unwrap();
    assert!(content.contains("\"move_vector\""));
    let back: Command = serde_json::from_str(&content).unwrap();
    assert_eq!(back, cmd);

    let unknown: Command = serde_json::from_str(r#"{"opcode":{"unknown":9},"operand_a":0,"operand_b":0,"slot":1}"#).unwrap();
    assert_eq!(unknown.opcode, Opcode::Unknown(9));
  }
}
