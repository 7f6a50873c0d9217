use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::busy::ArrayBusyTable;
use super::chunker::{assemble_elements, chunk_len, next_chunk, plan_chunks, DEFAULT_LINE_SIZE};
use super::command::{Command, Opcode, Response, RESP_OK};
use super::fault::{Fault, ParamError};
use super::op::{OpState, PendingOp, Transfer};
use super::operand::OperandCodec;
use super::params::RoccParams;
use super::queue::CommandQueue;
use crate::arch::engine::{ComputeEngine, MemoryService};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoccStats {
  pub issued: u64,
  pub rejected: u64,
  pub completed: u64,
  pub failed: u64,
  pub bytes_read: u64,
  pub bytes_written: u64,
}

/// Command interface in front of a memory service and a compute engine.
///
/// Commands run strictly one at a time in FIFO order. All multi-step work
/// advances through `tick` and the three response entry points
/// (`on_read_response`, `on_write_response`, `on_array_complete`); none of
/// them block.
#[derive(Debug, Clone)]
pub struct RoccInterface<M, E> {
  params: RoccParams,
  line_size: u64,
  input_codec: OperandCodec,
  output_codec: OperandCodec,

  queue: CommandQueue,
  pending: PendingOp,
  busy: bool,
  arrays: ArrayBusyTable,
  response: Option<Response>,
  stats: RoccStats,

  memory: M,
  engine: E,
}

impl<M: MemoryService, E: ComputeEngine> RoccInterface<M, E> {
  pub fn new(params: RoccParams, memory: M, engine: E) -> Result<Self, ParamError> {
    params.validate()?;

    let line_size = match memory.line_size() {
      0 => DEFAULT_LINE_SIZE,
      line => line,
    };
    info!(
      "rocc: arrays={} in={}*{} out={}*{} type={} line={}",
      params.num_arrays,
      params.array_input_size,
      params.input_operand_size,
      params.array_output_size,
      params.output_operand_size,
      params.data_type.name(),
      line_size
    );

    Ok(Self {
      line_size,
      input_codec: params.input_codec(),
      output_codec: params.output_codec(),
      queue: CommandQueue::new(params.max_instructions),
      pending: PendingOp::default(),
      busy: false,
      arrays: ArrayBusyTable::new(params.num_arrays as usize),
      response: None,
      stats: RoccStats::default(),
      params,
      memory,
      engine,
    })
  }

  // ------------------------------------------------------------
  // host side
  // ------------------------------------------------------------

  pub fn try_push(&mut self, cmd: Command) -> Result<(), Fault> {
    if self.queue.push(cmd) {
      self.stats.issued += 1;
      debug!("rocc: queued {:?} ({}/{})", cmd.opcode, self.queue.len(), self.queue.capacity());
      Ok(())
    } else {
      self.stats.rejected += 1;
      Err(Fault::QueueFull)
    }
  }

  pub fn push(&mut self, cmd: Command) -> bool {
    self.try_push(cmd).is_ok()
  }

  pub fn is_full(&self) -> bool {
    self.queue.is_full()
  }

  pub fn is_busy(&self) -> bool {
    self.busy
  }

  pub fn len(&self) -> usize {
    self.queue.len()
  }

  pub fn is_empty(&self) -> bool {
    self.queue.is_empty()
  }

  /// Take the result of the last retired command.
  pub fn poll_response(&mut self) -> Option<Response> {
    self.response.take()
  }

  // ------------------------------------------------------------
  // inspection
  // ------------------------------------------------------------

  pub fn state(&self) -> OpState {
    self.pending.state
  }

  pub fn pending(&self) -> &PendingOp {
    &self.pending
  }

  pub fn stats(&self) -> RoccStats {
    self.stats
  }

  pub fn arrays(&self) -> &ArrayBusyTable {
    &self.arrays
  }

  pub fn params(&self) -> &RoccParams {
    &self.params
  }

  pub fn line_size(&self) -> u64 {
    self.line_size
  }

  pub fn issued(&self) -> u64 {
    self.queue.issued()
  }

  pub fn memory(&self) -> &M {
    &self.memory
  }

  pub fn memory_mut(&mut self) -> &mut M {
    &mut self.memory
  }

  pub fn engine(&self) -> &E {
    &self.engine
  }

  pub fn engine_mut(&mut self) -> &mut E {
    &mut self.engine
  }

  // ------------------------------------------------------------
  // dispatch
  // ------------------------------------------------------------

  /// Start the queue head if nothing is in flight.
  pub fn tick(&mut self) {
    if self.busy {
      return;
    }
    let Some(&cmd) = self.queue.front() else {
      return;
    };

    self.busy = true;
    self.pending.reset();

    match cmd.opcode {
      Opcode::SetMatrix => {
        let total = self.params.matrix_bytes();
        self.start_read(cmd, OpState::AwaitReadSetMatrix, total);
      },
      Opcode::LoadVector => {
        let total = self.params.input_vector_bytes();
        self.start_read(cmd, OpState::AwaitReadLoadVector, total);
      },
      Opcode::Compute => self.start_compute(cmd),
      Opcode::StoreVector => self.start_store(cmd),
      Opcode::MoveVector => self.move_vector(cmd),
      Opcode::Unknown(code) => self.fail(Fault::UnknownOpcode(code)),
    }
  }

  fn array_operand(&self, raw: u64) -> Result<u32, Fault> {
    match u32::try_from(raw) {
      Ok(id) if self.arrays.contains(id) => Ok(id),
      _ => Err(Fault::InvalidArray(raw)),
    }
  }

  fn address_span(addr: u64, len: u64) -> Result<(), Fault> {
    match addr.checked_add(len) {
      Some(_) => Ok(()),
      None => Err(Fault::AddressOverflow { addr, len }),
    }
  }

  fn start_read(&mut self, cmd: Command, state: OpState, total: u64) {
    let checked = self
      .array_operand(cmd.operand_b)
      .and_then(|id| Self::address_span(cmd.operand_a, total).map(|_| id));
    let array_id = match checked {
      Ok(id) => id,
      Err(fault) => return self.fail(fault),
    };

    self.pending.state = state;
    self.pending.array_id = array_id;
    self.pending.read = Transfer::new(cmd.operand_a, total);
    debug!(
      "rocc: {:?} addr={:#x} aid={} bytes={} chunks={}",
      cmd.opcode,
      cmd.operand_a,
      array_id,
      total,
      plan_chunks(cmd.operand_a, total, self.line_size).len()
    );
    self.send_next_read_chunk();
  }

  fn start_compute(&mut self, cmd: Command) {
    let array_id = match self.array_operand(cmd.operand_b) {
      Ok(id) => id,
      Err(fault) => return self.fail(fault),
    };

    self.pending.state = OpState::AwaitCompute;
    self.pending.array_id = array_id;
    debug!("rocc: compute aid={}", array_id);
    self.begin_compute(array_id);
  }

  fn start_store(&mut self, cmd: Command) {
    let total = self.params.output_vector_bytes();
    let checked = self
      .array_operand(cmd.operand_b)
      .and_then(|id| Self::address_span(cmd.operand_a, total).map(|_| id));
    let array_id = match checked {
      Ok(id) => id,
      Err(fault) => return self.fail(fault),
    };

    let count = self.params.array_output_size as usize;
    let output = self.engine.output_vector(array_id);
    if output.len() < count {
      debug!("rocc: output of array {} has {} of {} elements, padding", array_id, output.len(), count);
    }
    let mut payload = Vec::with_capacity(count * self.output_codec.size);
    for i in 0..count {
      let value = output.get(i).copied().unwrap_or(0.0);
      self.output_codec.encode_into(value, &mut payload);
    }

    self.pending.state = OpState::AwaitWriteStore;
    self.pending.array_id = array_id;
    debug_assert_eq!(payload.len() as u64, total);
    self.pending.write = Transfer::new(cmd.operand_a, total);
    self.pending.payload = payload;
    debug!("rocc: store addr={:#x} aid={} bytes={}", cmd.operand_a, array_id, total);
    self.send_next_write_chunk();
  }

  fn move_vector(&mut self, cmd: Command) {
    let ids = self
      .array_operand(cmd.operand_a)
      .and_then(|src| self.array_operand(cmd.operand_b).map(|dst| (src, dst)));
    let (src, dst) = match ids {
      Ok(ids) => ids,
      Err(fault) => return self.fail(fault),
    };

    self.pending.state = OpState::MoveImmediate;
    debug!("rocc: move src={} dst={}", src, dst);
    self.engine.move_output_to_input(src, dst);
    self.complete(RESP_OK);
  }

  // ------------------------------------------------------------
  // memory chunking
  // ------------------------------------------------------------

  fn send_next_read_chunk(&mut self) {
    match next_chunk(&self.pending.read, self.line_size) {
      Some((addr, len)) => {
        debug!("rocc: read {:#x}+{}", addr, len);
        self.memory.issue_read(addr, len);
      },
      None => self.complete(RESP_OK),
    }
  }

  fn send_next_write_chunk(&mut self) {
    match next_chunk(&self.pending.write, self.line_size) {
      Some((addr, len)) => {
        let start = self.pending.write.offset as usize;
        let data = self.pending.payload[start..start + len as usize].to_vec();
        debug!("rocc: write {:#x}+{}", addr, len);
        self.memory.issue_write(addr, data);
      },
      None => self.complete(RESP_OK),
    }
  }

  /// Memory service answer to the outstanding read.
  pub fn on_read_response(&mut self, data: &[u8], failed: bool) {
    if !self.busy {
      warn!("rocc: read response while idle, dropped");
      return;
    }
    if failed {
      let addr = self.pending.read.base + self.pending.read.offset;
      return self.fail(Fault::MemoryFailure { addr });
    }
    if !self.pending.state.awaits_read() {
      return self.fail(Fault::UnexpectedResponse("read"));
    }

    let got = data.len() as u64;
    let remaining = self.pending.read.remaining();
    if got == 0 || got > remaining {
      return self.fail(Fault::TransferOverrun { got, remaining });
    }

    let array_id = self.pending.array_id;
    let to_matrix = self.pending.state == OpState::AwaitReadSetMatrix;
    let codec = self.input_codec;
    let engine = &mut self.engine;
    assemble_elements(
      &mut self.pending.carry,
      data,
      self.pending.read.offset,
      codec.size,
      |index, bytes| {
        let value = codec.decode(bytes);
        if to_matrix {
          engine.set_matrix_element(array_id, index, value);
        } else {
          engine.set_vector_element(array_id, index, value);
        }
      },
    );

    self.pending.read.advance(got);
    self.stats.bytes_read += got;
    self.pending.check_invariants();

    if self.pending.read.is_done() {
      self.complete(RESP_OK);
    } else {
      self.send_next_read_chunk();
    }
  }

  /// Memory service acknowledgement of the outstanding write.
  pub fn on_write_response(&mut self, failed: bool) {
    if !self.busy {
      warn!("rocc: write response while idle, dropped");
      return;
    }
    if failed {
      let addr = self.pending.write.base + self.pending.write.offset;
      return self.fail(Fault::MemoryFailure { addr });
    }
    if self.pending.state != OpState::AwaitWriteStore {
      return self.fail(Fault::UnexpectedResponse("write"));
    }

    // the ack carries no length: advance by what the last chunk must have been
    let sent = chunk_len(&self.pending.write, self.line_size);
    self.pending.write.advance(sent);
    self.stats.bytes_written += sent;
    self.pending.check_invariants();

    if self.pending.write.is_done() {
      self.complete(RESP_OK);
    } else {
      self.send_next_write_chunk();
    }
  }

  // ------------------------------------------------------------
  // array tracking
  // ------------------------------------------------------------

  fn begin_compute(&mut self, array_id: u32) {
    self.arrays.mark_busy(array_id);
    self.engine.begin_compute(array_id);
  }

  /// Compute engine report that `array_id` finished.
  pub fn on_array_complete(&mut self, array_id: u32) {
    let was_busy = self.arrays.clear(array_id);
    if self.busy && self.pending.state == OpState::AwaitCompute && self.pending.array_id == array_id {
      self.complete(RESP_OK);
    } else {
      debug!(
        "rocc: completion of array {} not awaited (busy flag was {})",
        array_id, was_busy
      );
    }
  }

  // ------------------------------------------------------------
  // completion
  // ------------------------------------------------------------

  fn fail(&mut self, fault: Fault) {
    warn!("rocc: {}", fault);
    self.pending.state = OpState::Error;
    self.complete(fault.completion_value());
  }

  fn complete(&mut self, value: u64) {
    let Some(cmd) = self.queue.pop_front() else {
      warn!("rocc: completion with no command in flight");
      return;
    };

    if let Some(unread) = self.response.replace(Response { slot: cmd.slot, value }) {
      debug!("rocc: response for slot {} overwritten before poll", unread.slot);
    }
    if value == RESP_OK {
      self.stats.completed += 1;
    } else {
      self.stats.failed += 1;
    }
    info!("rocc: retired {:?} slot={} value={}", cmd.opcode, cmd.slot, value);

    self.pending.reset();
    self.busy = false;
  }
}
