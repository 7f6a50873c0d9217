//! Recording doubles of the memory service and compute engine.

use crate::arch::engine::{ComputeEngine, MemoryService};

#[derive(Debug, Clone, PartialEq)]
pub enum MemOp {
  Read { addr: u64, len: u64 },
  Write { addr: u64, data: Vec<u8> },
}

#[derive(Debug, Clone, Default)]
pub struct RecordingMemory {
  pub line_size: u64,
  pub issued: Vec<MemOp>,
}

impl RecordingMemory {
  pub fn with_line(line_size: u64) -> Self {
    Self {
      line_size,
      issued: Vec::new(),
    }
  }

  pub fn read_lens(&self) -> Vec<u64> {
    self
      .issued
      .iter()
      .filter_map(|op| match op {
        MemOp::Read { len, .. } => Some(*len),
        _ => None,
      })
      .collect()
  }

  pub fn writes(&self) -> Vec<(u64, Vec<u8>)> {
    self
      .issued
      .iter()
      .filter_map(|op| match op {
        MemOp::Write { addr, data } => Some((*addr, data.clone())),
        _ => None,
      })
      .collect()
  }
}

impl MemoryService for RecordingMemory {
  fn line_size(&self) -> u64 {
    self.line_size
  }

  fn issue_read(&mut self, addr: u64, len: u64) {
    self.issued.push(MemOp::Read { addr, len });
  }

  fn issue_write(&mut self, addr: u64, data: Vec<u8>) {
    self.issued.push(MemOp::Write { addr, data });
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineOp {
  Matrix { array: u32, index: usize, value: f64 },
  Vector { array: u32, index: usize, value: f64 },
  Begin(u32),
  Move(u32, u32),
}

#[derive(Debug, Clone, Default)]
pub struct RecordingEngine {
  pub ops: Vec<EngineOp>,
  pub outputs: Vec<Vec<f64>>,
}

impl RecordingEngine {
  pub fn with_outputs(outputs: Vec<Vec<f64>>) -> Self {
    Self {
      ops: Vec::new(),
      outputs,
    }
  }
}

impl ComputeEngine for RecordingEngine {
  fn set_matrix_element(&mut self, array: u32, index: usize, value: f64) {
    self.ops.push(EngineOp::Matrix { array, index, value });
  }

  fn set_vector_element(&mut self, array: u32, index: usize, value: f64) {
    self.ops.push(EngineOp::Vector { array, index, value });
  }

  fn begin_compute(&mut self, array_id: u32) {
    self.ops.push(EngineOp::Begin(array_id));
  }

  fn move_output_to_input(&mut self, src_array: u32, dst_array: u32) {
    self.ops.push(EngineOp::Move(src_array, dst_array));
  }

  fn output_vector(&self, array_id: u32) -> &[f64] {
    self.outputs.get(array_id as usize).map(|v| v.as_slice()).unwrap_or(&[])
  }
}
