use log::{debug, info};
use sim::models::model_trait::{DevsModel, Reportable, ReportableModel, SerializableModel};
use sim::models::{ModelMessage, ModelRecord};
use sim::simulator::Services;
use sim::utils::errors::SimulationError;
use std::collections::VecDeque;
use std::f64::INFINITY;

use crate::arch::rocc::{Command, Response};
use crate::model_record;

/// Replays a command script into the interface, one push at a time.
///
/// A rejected push is retried after `retry_delay` cycles, so the script is
/// admitted in order no matter how often the queue fills up.
#[derive(Debug, Clone)]
pub struct HostModel {
  command_port: String,
  admit_port: String,
  response_port: String,
  retry_delay: f64,

  script: VecDeque<Command>,
  awaiting_admit: bool,
  rejected: u64,
  responses: Vec<Response>,

  until_next_event: f64,
  records: Vec<ModelRecord>,
}

impl HostModel {
  pub fn new(
    command_port: String,
    admit_port: String,
    response_port: String,
    retry_delay: f64,
    script: Vec<Command>,
  ) -> Self {
    let until_next_event = if script.is_empty() { INFINITY } else { 0.0 };
    Self {
      command_port,
      admit_port,
      response_port,
      retry_delay,
      script: script.into(),
      awaiting_admit: false,
      rejected: 0,
      responses: Vec::new(),
      until_next_event,
      records: Vec::new(),
    }
  }

  pub fn responses(&self) -> &[Response] {
    &self.responses
  }

  pub fn rejected(&self) -> u64 {
    self.rejected
  }
}

impl DevsModel for HostModel {
  fn events_ext(&mut self, incoming_message: &ModelMessage, services: &mut Services) -> Result<(), SimulationError> {
    if incoming_message.port_name == self.admit_port {
      let accepted: bool =
        serde_json::from_str(&incoming_message.content).map_err(|_| SimulationError::InvalidModelState)?;
      if !self.awaiting_admit {
        debug!("host: admission result with nothing pushed, ignored");
        return Ok(());
      }
      self.awaiting_admit = false;

      if accepted {
        self.script.pop_front();
        self.until_next_event = if self.script.is_empty() { INFINITY } else { 0.0 };
      } else {
        self.rejected += 1;
        model_record!(self, services, "retry", "in {} cycles", self.retry_delay);
        self.until_next_event = self.retry_delay;
      }
      return Ok(());
    }

    if incoming_message.port_name == self.response_port {
      let resp: Response =
        serde_json::from_str(&incoming_message.content).map_err(|_| SimulationError::InvalidModelState)?;
      info!("host: slot {} <- {}", resp.slot, resp.value);
      model_record!(self, services, "response", "slot={} value={}", resp.slot, resp.value);
      self.responses.push(resp);
    }
    Ok(())
  }

  fn events_int(&mut self, services: &mut Services) -> Result<Vec<ModelMessage>, SimulationError> {
    self.until_next_event = INFINITY;

    let Some(cmd) = self.script.front() else {
      return Ok(Vec::new());
    };
    let content = serde_json::to_string(cmd).map_err(|_| SimulationError::InvalidModelState)?;
    model_record!(self, services, "push", "{:?} slot={}", cmd.opcode, cmd.slot);
    self.awaiting_admit = true;

    Ok(vec![ModelMessage {
      content,
      port_name: self.command_port.clone(),
    }])
  }

  fn time_advance(&mut self, time_delta: f64) {
    self.until_next_event -= time_delta;
  }

  fn until_next_event(&self) -> f64 {
    self.until_next_event
  }
}

impl Reportable for HostModel {
  fn status(&self) -> String {
    format!(
      "pending={}, rejected={}, responses={}",
      self.script.len(),
      self.rejected,
      self.responses.len()
    )
  }

  fn records(&self) -> &Vec<ModelRecord> {
    &self.records
  }
}

impl ReportableModel for HostModel {}

impl SerializableModel for HostModel {
  fn get_type(&self) -> &'static str {
    "HostModel"
  }
}
