use sim::models::Model;
use sim::simulator::{Connector, Simulation};
use std::io;
use std::sync::Arc;

use super::host_model::HostModel;
use super::memory_model::MemoryModel;
use super::rocc_model::{PortMemory, RoccModel};
use crate::arch::engine::{DenseArrays, EngineRuntime, SharedBacking};
use crate::arch::rocc::{Command, RoccInterface};
use crate::simulator::config::config::AppConfig;

pub const HOST: &str = "host";
pub const ROCC: &str = "rocc";
pub const MEMORY: &str = "memory";

/// Wire host, command interface and memory into one simulation.
///
/// `script` is what the host pushes; `backing` is the memory the interface
/// reads and writes.
pub fn create_simulation(
  config: &AppConfig,
  script: Vec<Command>,
  backing: SharedBacking,
  runtime: &Arc<EngineRuntime>,
) -> io::Result<Simulation> {
  let params = config.rocc.params;
  let engine = DenseArrays::new(
    runtime,
    params.num_arrays as usize,
    params.array_input_size as usize,
    params.array_output_size as usize,
  );
  let iface = RoccInterface::new(params, PortMemory::new(config.memory.line_size), engine)
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

  let models = vec![
    Model::new(
      String::from(HOST),
      Box::new(HostModel::new(
        String::from("command"),
        String::from("admit"),
        String::from("response"),
        config.host.retry_delay,
        script,
      )),
    ),
    Model::new(
      String::from(ROCC),
      Box::new(RoccModel::new(
        String::from("command"),
        String::from("mem_resp"),
        String::from("admit"),
        String::from("response"),
        String::from("mem_req"),
        config.rocc.tick_period,
        config.array.latency,
        iface,
      )),
    ),
    Model::new(
      String::from(MEMORY),
      Box::new(MemoryModel::new(
        String::from("request"),
        String::from("response"),
        config.memory.latency,
        backing,
      )),
    ),
  ];

  let connectors = vec![
    // host <-> rocc
    Connector::new(
      String::from("host_rocc_command"),
      String::from(HOST),
      String::from(ROCC),
      String::from("command"),
      String::from("command"),
    ),
    Connector::new(
      String::from("rocc_host_admit"),
      String::from(ROCC),
      String::from(HOST),
      String::from("admit"),
      String::from("admit"),
    ),
    Connector::new(
      String::from("rocc_host_response"),
      String::from(ROCC),
      String::from(HOST),
      String::from("response"),
      String::from("response"),
    ),
    // rocc <-> memory
    Connector::new(
      String::from("rocc_memory_req"),
      String::from(ROCC),
      String::from(MEMORY),
      String::from("mem_req"),
      String::from("request"),
    ),
    Connector::new(
      String::from("memory_rocc_resp"),
      String::from(MEMORY),
      String::from(ROCC),
      String::from("response"),
      String::from("mem_resp"),
    ),
  ];

  Ok(Simulation::post(models, connectors))
}
