use log::warn;
use std::sync::Arc;

use super::runtime::{EngineRuntime, RuntimeLease};
use super::ComputeEngine;

#[derive(Debug, Clone)]
struct Array {
  /// row-major, `output_size` rows of `input_size` columns
  matrix: Vec<f64>,
  input: Vec<f64>,
  output: Vec<f64>,
}

/// Ideal matrix-vector arrays: exact products, no conversion of values.
///
/// `begin_compute` only records the request; the owner calls [`finish`]
/// once the array latency has elapsed and then reports the completion.
///
/// [`finish`]: DenseArrays::finish
#[derive(Debug, Clone)]
pub struct DenseArrays {
  input_size: usize,
  output_size: usize,
  arrays: Vec<Array>,
  started: Vec<u32>,
  _lease: RuntimeLease,
}

impl DenseArrays {
  pub fn new(runtime: &Arc<EngineRuntime>, num_arrays: usize, input_size: usize, output_size: usize) -> Self {
    let array = Array {
      matrix: vec![0.0; input_size * output_size],
      input: vec![0.0; input_size],
      output: vec![0.0; output_size],
    };
    Self {
      input_size,
      output_size,
      arrays: vec![array; num_arrays],
      started: Vec::new(),
      _lease: runtime.acquire(),
    }
  }

  /// Computes started since the last call, in start order.
  pub fn take_started(&mut self) -> Vec<u32> {
    std::mem::take(&mut self.started)
  }

  /// Run the product for `array_id`: output = matrix x input.
  pub fn finish(&mut self, array_id: u32) {
    let (rows, cols) = (self.output_size, self.input_size);
    let Some(array) = self.arrays.get_mut(array_id as usize) else {
      warn!("finish on unknown array {}", array_id);
      return;
    };
    for r in 0..rows {
      let row = &array.matrix[r * cols..(r + 1) * cols];
      array.output[r] = row.iter().zip(&array.input).map(|(m, x)| m * x).sum();
    }
  }

  #[cfg(test)]
  pub fn matrix(&self, array_id: u32) -> &[f64] {
    self.arrays.get(array_id as usize).map(|a| a.matrix.as_slice()).unwrap_or(&[])
  }

  #[cfg(test)]
  pub fn input_vector(&self, array_id: u32) -> &[f64] {
    self.arrays.get(array_id as usize).map(|a| a.input.as_slice()).unwrap_or(&[])
  }
}

impl ComputeEngine for DenseArrays {
  fn set_matrix_element(&mut self, array_id: u32, index: usize, value: f64) {
    match self.arrays.get_mut(array_id as usize).and_then(|a| a.matrix.get_mut(index)) {
      Some(slot) => *slot = value,
      None => warn!("matrix element {} of array {} out of range", index, array_id),
    }
  }

  fn set_vector_element(&mut self, array_id: u32, index: usize, value: f64) {
    match self.arrays.get_mut(array_id as usize).and_then(|a| a.input.get_mut(index)) {
      Some(slot) => *slot = value,
      None => warn!("input element {} of array {} out of range", index, array_id),
    }
  }

  fn begin_compute(&mut self, array_id: u32) {
    self.started.push(array_id);
  }

  fn move_output_to_input(&mut self, src_array: u32, dst_array: u32) {
    let Some(src) = self.arrays.get(src_array as usize).map(|a| a.output.clone()) else {
      warn!("move from unknown array {}", src_array);
      return;
    };
    let Some(dst) = self.arrays.get_mut(dst_array as usize) else {
      warn!("move to unknown array {}", dst_array);
      return;
    };
    let n = src.len().min(dst.input.len());
    dst.input[..n].copy_from_slice(&src[..n]);
  }

  fn output_vector(&self, array_id: u32) -> &[f64] {
    self.arrays.get(array_id as usize).map(|a| a.output.as_slice()).unwrap_or(&[])
  }
}
