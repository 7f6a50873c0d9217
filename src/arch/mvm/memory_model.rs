use log::debug;
use serde::{Deserialize, Serialize};
use sim::models::model_trait::{DevsModel, Reportable, ReportableModel, SerializableModel};
use sim::models::{ModelMessage, ModelRecord};
use sim::simulator::Services;
use sim::utils::errors::SimulationError;
use std::collections::VecDeque;
use std::f64::INFINITY;

use crate::arch::engine::SharedBacking;
use crate::model_record;

/// Request carried on the `mem_req` port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemRequest {
  Read { addr: u64, len: u64 },
  Write { addr: u64, data: Vec<u8> },
}

/// Answer carried on the `mem_resp` port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemResponse {
  Read { data: Vec<u8>, failed: bool },
  Write { failed: bool },
}

/// Memory service over a shared byte store. Requests are served in arrival
/// order, one every `latency` cycles.
#[derive(Debug, Clone)]
pub struct MemoryModel {
  request_port: String,
  response_port: String,
  latency: f64,

  backing: SharedBacking,
  queue: VecDeque<MemRequest>,
  served: u64,

  until_next_event: f64,
  records: Vec<ModelRecord>,
}

impl MemoryModel {
  pub fn new(request_port: String, response_port: String, latency: f64, backing: SharedBacking) -> Self {
    Self {
      request_port,
      response_port,
      latency,
      backing,
      queue: VecDeque::new(),
      served: 0,
      until_next_event: INFINITY,
      records: Vec::new(),
    }
  }

  fn serve(&self, req: &MemRequest) -> MemResponse {
    let mut backing = self.backing.lock();
    match req {
      MemRequest::Read { addr, len } => {
        if backing.is_faulty(*addr, *len) {
          MemResponse::Read {
            data: Vec::new(),
            failed: true,
          }
        } else {
          MemResponse::Read {
            data: backing.read(*addr, *len),
            failed: false,
          }
        }
      },
      MemRequest::Write { addr, data } => {
        let failed = backing.is_faulty(*addr, data.len() as u64);
        if !failed {
          backing.write(*addr, data);
        }
        MemResponse::Write { failed }
      },
    }
  }
}

impl DevsModel for MemoryModel {
  fn events_ext(&mut self, incoming_message: &ModelMessage, services: &mut Services) -> Result<(), SimulationError> {
    if incoming_message.port_name != self.request_port {
      return Ok(());
    }

    let req: MemRequest =
      serde_json::from_str(&incoming_message.content).map_err(|_| SimulationError::InvalidModelState)?;
    let subject = match &req {
      MemRequest::Read { addr, len } => format!("read {:#x}+{}", addr, len),
      MemRequest::Write { addr, data } => format!("write {:#x}+{}", addr, data.len()),
    };
    model_record!(self, services, "enqueue", "{}", subject);

    self.queue.push_back(req);
    if self.until_next_event == INFINITY {
      self.until_next_event = self.latency;
    }
    Ok(())
  }

  fn events_int(&mut self, services: &mut Services) -> Result<Vec<ModelMessage>, SimulationError> {
    let mut messages = Vec::new();

    if let Some(req) = self.queue.pop_front() {
      let resp = self.serve(&req);
      let failed = matches!(
        resp,
        MemResponse::Read { failed: true, .. } | MemResponse::Write { failed: true }
      );
      debug!("memory: {:?} failed={}", req, failed);

      messages.push(ModelMessage {
        content: serde_json::to_string(&resp).map_err(|_| SimulationError::InvalidModelState)?,
        port_name: self.response_port.clone(),
      });
      self.served += 1;
      model_record!(self, services, if failed { "fail" } else { "serve" }, "{:?}", req);
    }

    self.until_next_event = if self.queue.is_empty() {
      INFINITY
    } else {
      self.latency
    };
    Ok(messages)
  }

  fn time_advance(&mut self, time_delta: f64) {
    self.until_next_event -= time_delta;
  }

  fn until_next_event(&self) -> f64 {
    self.until_next_event
  }
}

impl Reportable for MemoryModel {
  fn status(&self) -> String {
    format!("queued={}, served={}", self.queue.len(), self.served)
  }

  fn records(&self) -> &Vec<ModelRecord> {
    &self.records
  }
}

impl ReportableModel for MemoryModel {}

impl SerializableModel for MemoryModel {
  fn get_type(&self) -> &'static str {
    "MemoryModel"
  }
}
