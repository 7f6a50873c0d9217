use serde::{Deserialize, Serialize};

/// Numeric type held by the compute arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
  #[default]
  Float32,
  Float64,
  Int32,
  Int64,
}

impl DataType {
  /// Native width in bytes.
  pub fn width(self) -> usize {
    match self {
      DataType::Float32 | DataType::Int32 => 4,
      DataType::Float64 | DataType::Int64 => 8,
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      DataType::Float32 => "float32",
      DataType::Float64 => "float64",
      DataType::Int32 => "int32",
      DataType::Int64 => "int64",
    }
  }
}

/// Little-endian element codec for one transfer direction.
///
/// `size` may be narrower than the data type: decoding zero-fills the high
/// bytes, encoding truncates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandCodec {
  pub data_type: DataType,
  pub size: usize,
}

impl OperandCodec {
  pub fn new(data_type: DataType, size: usize) -> Self {
    debug_assert!(size >= 1 && size <= data_type.width());
    Self { data_type, size }
  }

  pub fn decode(&self, bytes: &[u8]) -> f64 {
    let mut raw = [0u8; 8];
    let n = bytes.len().min(self.size).min(self.data_type.width());
    raw[..n].copy_from_slice(&bytes[..n]);

    match self.data_type {
      DataType::Float32 => f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64,
      DataType::Float64 => f64::from_le_bytes(raw),
      DataType::Int32 => i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64,
      DataType::Int64 => i64::from_le_bytes(raw) as f64,
    }
  }

  /// Append `value` as exactly `size` bytes.
  pub fn encode_into(&self, value: f64, out: &mut Vec<u8>) {
    let raw: [u8; 8] = match self.data_type {
      DataType::Float32 => widen((value as f32).to_le_bytes()),
      DataType::Float64 => value.to_le_bytes(),
      DataType::Int32 => widen((value as i32).to_le_bytes()),
      DataType::Int64 => (value as i64).to_le_bytes(),
    };
    out.extend_from_slice(&raw[..self.size]);
  }

  pub fn encode_all(&self, values: &[f64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * self.size);
    for &v in values {
      self.encode_into(v, &mut out);
    }
    out
  }

  pub fn decode_all(&self, bytes: &[u8]) -> Vec<f64> {
    bytes.chunks(self.size).map(|elem| self.decode(elem)).collect()
  }
}

fn widen(bytes: [u8; 4]) -> [u8; 8] {
  let mut raw = [0u8; 8];
  raw[..4].copy_from_slice(&bytes);
  raw
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_float32_layout() {
    let codec = OperandCodec::new(DataType::Float32, 4);
    let mut out = Vec::new();
    codec.encode_into(1.5, &mut out);
    assert_eq!(out, 1.5f32.to_le_bytes().to_vec());
    assert_eq!(codec.decode(&out), 1.5);
  }

  #[test]
  fn test_narrow_int_operand() {
    // 2-byte operands of an int32 array: high bytes are dropped / zero-filled
    let codec = OperandCodec::new(DataType::Int32, 2);
    let bytes = codec.encode_all(&[0x1234 as f64, 0x0001_0002 as f64]);
    assert_eq!(bytes, vec![0x34, 0x12, 0x02, 0x00]);
    assert_eq!(codec.decode_all(&bytes), vec![0x1234 as f64, 2.0]);
  }

  #[test]
  fn test_int64_saturates_on_encode() {
    let codec = OperandCodec::new(DataType::Int64, 8);
    let bytes = codec.encode_all(&[-3.9, 1e30]);
    assert_eq!(&bytes[..8], &(-3i64).to_le_bytes());
    assert_eq!(&bytes[8..], &i64::MAX.to_le_bytes());
  }
}
