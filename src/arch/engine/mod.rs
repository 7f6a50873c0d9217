//! Contracts of the two services the command interface drives, plus the
//! in-process implementations used by the simulator.

pub mod backing;
pub mod dense;
pub mod runtime;

pub use backing::{Backing, SharedBacking};
pub use dense::DenseArrays;
pub use runtime::{EngineRuntime, RuntimeLease};

/// Byte-addressable memory with asynchronous responses.
///
/// Every `issue_read` is answered later by exactly one read response and every
/// `issue_write` by exactly one write response, delivered in issue order to
/// the interface's `on_read_response` / `on_write_response`.
pub trait MemoryService {
  /// Natural transfer granularity; 0 means "unknown".
  fn line_size(&self) -> u64;

  fn issue_read(&mut self, addr: u64, len: u64);

  fn issue_write(&mut self, addr: u64, data: Vec<u8>);
}

/// Array-based matrix-vector engine.
///
/// Completion of `begin_compute` is reported back through the interface's
/// `on_array_complete`.
pub trait ComputeEngine {
  fn set_matrix_element(&mut self, array_id: u32, index: usize, value: f64);

  fn set_vector_element(&mut self, array_id: u32, index: usize, value: f64);

  fn begin_compute(&mut self, array_id: u32);

  fn move_output_to_input(&mut self, src_array: u32, dst_array: u32);

  fn output_vector(&self, array_id: u32) -> &[f64];
}
