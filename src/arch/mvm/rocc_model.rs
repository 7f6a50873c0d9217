use log::{debug, warn};
use sim::models::model_trait::{DevsModel, Reportable, ReportableModel, SerializableModel};
use sim::models::{ModelMessage, ModelRecord};
use sim::simulator::Services;
use sim::utils::errors::SimulationError;
use std::f64::INFINITY;

use super::memory_model::{MemRequest, MemResponse};
use crate::arch::engine::{DenseArrays, MemoryService};
use crate::arch::rocc::{Command, Response, RoccInterface};
use crate::model_record;

/// Memory service handle that turns requests into outgoing messages.
#[derive(Debug, Clone, Default)]
pub struct PortMemory {
  line_size: u64,
  outbox: Vec<MemRequest>,
}

impl PortMemory {
  pub fn new(line_size: u64) -> Self {
    Self {
      line_size,
      outbox: Vec::new(),
    }
  }

  pub fn drain(&mut self) -> Vec<MemRequest> {
    std::mem::take(&mut self.outbox)
  }
}

impl MemoryService for PortMemory {
  fn line_size(&self) -> u64 {
    self.line_size
  }

  fn issue_read(&mut self, addr: u64, len: u64) {
    self.outbox.push(MemRequest::Read { addr, len });
  }

  fn issue_write(&mut self, addr: u64, data: Vec<u8>) {
    self.outbox.push(MemRequest::Write { addr, data });
  }
}

#[derive(Debug, Clone)]
pub struct RoccModel {
  command_port: String,
  mem_resp_port: String,
  admit_port: String,
  response_port: String,
  mem_req_port: String,

  tick_period: f64,
  array_latency: f64,

  iface: RoccInterface<PortMemory, DenseArrays>,
  /// (array id, cycles until its compute finishes)
  computing: Vec<(u32, f64)>,
  /// admission results not yet sent back to the host
  admits: Vec<bool>,
  /// retired commands not yet sent back to the host, oldest first
  responses: Vec<Response>,
  tick_wait: f64,

  until_next_event: f64,
  records: Vec<ModelRecord>,
}

impl RoccModel {
  #[allow(clippy::too_many_arguments)]
  pub fn new(
    command_port: String,
    mem_resp_port: String,
    admit_port: String,
    response_port: String,
    mem_req_port: String,
    tick_period: f64,
    array_latency: f64,
    iface: RoccInterface<PortMemory, DenseArrays>,
  ) -> Self {
    Self {
      command_port,
      mem_resp_port,
      admit_port,
      response_port,
      mem_req_port,
      tick_period,
      array_latency,
      iface,
      computing: Vec::new(),
      admits: Vec::new(),
      responses: Vec::new(),
      tick_wait: 0.0,
      until_next_event: INFINITY,
      records: Vec::new(),
    }
  }

  fn finish_due_computes(&mut self, services: &mut Services) {
    let (due, waiting): (Vec<_>, Vec<_>) = self.computing.drain(..).partition(|&(_, left)| left <= 0.0);
    self.computing = waiting;

    for (array_id, _) in due {
      self.iface.engine_mut().finish(array_id);
      self.iface.on_array_complete(array_id);
      self.collect_response();
      model_record!(self, services, "array_done", "aid={}", array_id);
    }
  }

  /// Move a freshly retired command out of the interface's single slot.
  /// Must run after every interface call that can retire a command.
  fn collect_response(&mut self) {
    if let Some(resp) = self.iface.poll_response() {
      self.responses.push(resp);
    }
  }

  fn schedule(&mut self) {
    let compute = self
      .computing
      .iter()
      .fold(INFINITY, |min, &(_, left)| f64::min(min, left.max(0.0)));
    let tick = if !self.iface.is_busy() && !self.iface.is_empty() {
      self.tick_wait.max(0.0)
    } else {
      INFINITY
    };
    self.until_next_event = f64::min(compute, tick);
  }
}

impl DevsModel for RoccModel {
  fn events_ext(&mut self, incoming_message: &ModelMessage, services: &mut Services) -> Result<(), SimulationError> {
    if incoming_message.port_name == self.command_port {
      let cmd: Command =
        serde_json::from_str(&incoming_message.content).map_err(|_| SimulationError::InvalidModelState)?;
      let accepted = self.iface.push(cmd);
      self.admits.push(accepted);
      model_record!(
        self,
        services,
        if accepted { "admit" } else { "reject" },
        "{:?} slot={}",
        cmd.opcode,
        cmd.slot
      );
      self.until_next_event = 0.0;
      return Ok(());
    }

    if incoming_message.port_name == self.mem_resp_port {
      let resp: MemResponse =
        serde_json::from_str(&incoming_message.content).map_err(|_| SimulationError::InvalidModelState)?;
      match resp {
        MemResponse::Read { data, failed } => self.iface.on_read_response(&data, failed),
        MemResponse::Write { failed } => self.iface.on_write_response(failed),
      }
      self.collect_response();
      self.until_next_event = 0.0;
      return Ok(());
    }

    warn!("rocc model: message on unknown port {}", incoming_message.port_name);
    Ok(())
  }

  fn events_int(&mut self, services: &mut Services) -> Result<Vec<ModelMessage>, SimulationError> {
    let mut messages = Vec::new();

    self.finish_due_computes(services);

    if self.tick_wait <= 0.0 && !self.iface.is_busy() && !self.iface.is_empty() {
      self.iface.tick();
      self.collect_response();
      self.tick_wait = self.tick_period;
      model_record!(self, services, "dispatch", "state={:?}", self.iface.state());
    }

    for array_id in self.iface.engine_mut().take_started() {
      debug!("rocc model: array {} busy for {} cycles", array_id, self.array_latency);
      self.computing.push((array_id, self.array_latency));
    }

    for req in self.iface.memory_mut().drain() {
      messages.push(ModelMessage {
        content: serde_json::to_string(&req).map_err(|_| SimulationError::InvalidModelState)?,
        port_name: self.mem_req_port.clone(),
      });
    }

    for accepted in self.admits.drain(..) {
      messages.push(ModelMessage {
        content: serde_json::to_string(&accepted).map_err(|_| SimulationError::InvalidModelState)?,
        port_name: self.admit_port.clone(),
      });
    }

    for resp in std::mem::take(&mut self.responses) {
      model_record!(self, services, "respond", "slot={} value={}", resp.slot, resp.value);
      messages.push(ModelMessage {
        content: serde_json::to_string(&resp).map_err(|_| SimulationError::InvalidModelState)?,
        port_name: self.response_port.clone(),
      });
    }

    self.schedule();
    Ok(messages)
  }

  fn time_advance(&mut self, time_delta: f64) {
    self.until_next_event -= time_delta;
    self.tick_wait -= time_delta;
    for (_, left) in self.computing.iter_mut() {
      *left -= time_delta;
    }
  }

  fn until_next_event(&self) -> f64 {
    self.until_next_event
  }
}

impl Reportable for RoccModel {
  fn status(&self) -> String {
    let stats = self.iface.stats();
    format!(
      "queued={}, state={:?}, arrays_busy={}/{}, issued={}, rejected={}, completed={}, failed={}, read={}B, written={}B",
      self.iface.len(),
      self.iface.state(),
      self.iface.arrays().busy_count(),
      self.iface.arrays().len(),
      stats.issued,
      stats.rejected,
      stats.completed,
      stats.failed,
      stats.bytes_read,
      stats.bytes_written
    )
  }

  fn records(&self) -> &Vec<ModelRecord> {
    &self.records
  }
}

impl ReportableModel for RoccModel {}

impl SerializableModel for RoccModel {
  fn get_type(&self) -> &'static str {
    "RoccModel"
  }
}
