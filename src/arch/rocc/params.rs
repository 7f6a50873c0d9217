use serde::{Deserialize, Serialize};

use super::fault::ParamError;
use super::operand::{DataType, OperandCodec};

/// Geometry and queue depth of one command interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoccParams {
  /// command queue capacity
  pub max_instructions: usize,
  pub num_arrays: u32,
  /// matrix columns / input vector length
  pub array_input_size: u32,
  /// matrix rows / output vector length
  pub array_output_size: u32,
  pub input_operand_size: u32,
  pub output_operand_size: u32,
  pub data_type: DataType,
}

impl Default for RoccParams {
  fn default() -> Self {
    Self {
      max_instructions: 8,
      num_arrays: 1,
      array_input_size: 2,
      array_output_size: 2,
      input_operand_size: 4,
      output_operand_size: 4,
      data_type: DataType::Float32,
    }
  }
}

impl RoccParams {
  pub fn validate(&self) -> Result<(), ParamError> {
    let counts = [
      ("max_instructions", self.max_instructions as u64),
      ("num_arrays", self.num_arrays as u64),
      ("array_input_size", self.array_input_size as u64),
      ("array_output_size", self.array_output_size as u64),
      ("input_operand_size", self.input_operand_size as u64),
      ("output_operand_size", self.output_operand_size as u64),
    ];
    if let Some((name, _)) = counts.into_iter().find(|(_, v)| *v == 0) {
      return Err(ParamError::Zero(name));
    }

    let width = self.data_type.width();
    for (name, size) in [
      ("input_operand_size", self.input_operand_size),
      ("output_operand_size", self.output_operand_size),
    ] {
      if size as usize > width {
        return Err(ParamError::OperandTooWide {
          name,
          size,
          data_type: self.data_type.name(),
          width,
        });
      }
    }
    Ok(())
  }

  /// Bytes moved by a SetMatrix.
  pub fn matrix_bytes(&self) -> u64 {
    self.array_output_size as u64 * self.array_input_size as u64 * self.input_operand_size as u64
  }

  /// Bytes moved by a LoadVector.
  pub fn input_vector_bytes(&self) -> u64 {
    self.array_input_size as u64 * self.input_operand_size as u64
  }

  /// Bytes moved by a StoreVector.
  pub fn output_vector_bytes(&self) -> u64 {
    self.array_output_size as u64 * self.output_operand_size as u64
  }

  pub fn input_codec(&self) -> OperandCodec {
    OperandCodec::new(self.data_type, self.input_operand_size as usize)
  }

  pub fn output_codec(&self) -> OperandCodec {
    OperandCodec::new(self.data_type, self.output_operand_size as usize)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_transfer_sizes() {
    let params = RoccParams {
      array_input_size: 4,
      array_output_size: 3,
      output_operand_size: 8,
      data_type: DataType::Float64,
      ..Default::default()
    };
    assert_eq!(params.matrix_bytes(), 48);
    assert_eq!(params.input_vector_bytes(), 16);
    assert_eq!(params.output_vector_bytes(), 24);
    assert!(params.validate().is_ok());
  }

  #[test]
  fn test_validate_rejects_bad_geometry() {
    let zero = RoccParams {
      num_arrays: 0,
      ..Default::default()
    };
    assert_eq!(zero.validate(), Err(ParamError::Zero("num_arrays")));

    let wide = RoccParams {
      output_operand_size: 8,
      ..Default::default()
    };
    assert!(matches!(
      wide.validate(),
      Err(ParamError::OperandTooWide { name: "output_operand_size", .. })
    ));
  }
}
