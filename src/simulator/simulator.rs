use log::{info, warn};
use serde::Serialize;
use sim::models::Reportable;
use sim::simulator::{Message, Simulation};
use std::fs::File;
use std::io::{self, BufWriter, Result};
use std::sync::Arc;

use super::config::AppConfig;
use super::sim::mode::StepMode;
use super::sim::model::{is_quiescent, model_step};
use super::sim::shell::{Shell, ShellCommand};
use super::utils::log::set_quiet;
use super::utils::report::print_simulation_records;
use super::workload::{DumpRegion, Workload};
use crate::arch::engine::{Backing, EngineRuntime, SharedBacking};
use crate::arch::mvm::{create_simulation, HOST};
use crate::arch::rocc::Response;

/// Outcome of one simulation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
  /// completion order
  pub responses: Vec<Response>,
  pub rejected: u64,
  pub end_time: f64,
  pub timed_out: bool,
  pub dumps: Vec<DumpRegion>,
  /// (model id, status line)
  pub statuses: Vec<(String, String)>,
}

pub struct Simulator {
  config: AppConfig,
  workload: Workload,
  simulation: Simulation,
  backing: SharedBacking,
  runtime: Arc<EngineRuntime>,
  trace_writer: Option<BufWriter<File>>,
  report: RunReport,
}

impl Simulator {
  pub fn new(config: AppConfig, workload: Workload) -> Result<Self> {
    set_quiet(config.simulation.quiet);

    let mut backing = Backing::new();
    workload.apply(&mut backing, &config.rocc.params.input_codec());
    let backing = SharedBacking::new(backing);

    let runtime = EngineRuntime::new("dense");
    let simulation = create_simulation(&config, workload.command.clone(), backing.clone(), &runtime)?;

    let trace_writer = if config.simulation.trace_file.is_empty() {
      None
    } else {
      let file = File::create(&config.simulation.trace_file)?;
      info!("writing message trace to {}", config.simulation.trace_file);
      Some(BufWriter::new(file))
    };

    info!(
      "simulator ready: {} commands, {} preloads, {} fault ranges",
      workload.command.len(),
      workload.preload.len(),
      workload.fault.len()
    );

    Ok(Self {
      config,
      workload,
      simulation,
      backing,
      runtime,
      trace_writer,
      report: RunReport::default(),
    })
  }

  pub fn backing(&self) -> &SharedBacking {
    &self.backing
  }

  pub fn runtime(&self) -> &Arc<EngineRuntime> {
    &self.runtime
  }

  pub fn time(&self) -> f64 {
    self.simulation.get_global_time()
  }

  pub fn is_done(&mut self) -> bool {
    is_quiescent(&mut self.simulation)
  }

  /// One step of simulated time. Returns false once nothing is left to do.
  pub fn step(&mut self) -> Result<bool> {
    if self.is_done() {
      return Ok(false);
    }
    if self.time() > self.config.simulation.max_time {
      if !self.report.timed_out {
        warn!("max_time {} exceeded at t={}", self.config.simulation.max_time, self.time());
      }
      self.report.timed_out = true;
      return Ok(false);
    }

    let delivered = model_step(&mut self.simulation, &mut self.trace_writer)?;
    self.observe(&delivered)?;
    Ok(true)
  }

  fn observe(&mut self, delivered: &[Message]) -> Result<()> {
    for msg in delivered.iter().filter(|m| m.target_id() == HOST) {
      match msg.target_port() {
        "response" => {
          let resp: Response = serde_json::from_str(msg.content())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
          self.report.responses.push(resp);
        },
        "admit" if msg.content() == "false" => self.report.rejected += 1,
        _ => {},
      }
    }
    Ok(())
  }

  pub fn run_to_completion(&mut self) -> Result<RunReport> {
    while self.step()? {}
    Ok(self.finish())
  }

  pub fn run(&mut self) -> Result<RunReport> {
    match StepMode::from_flag(self.config.simulation.step_mode) {
      StepMode::Continuous => self.run_to_completion(),
      StepMode::Step => self.run_step_mode(),
    }
  }

  fn run_step_mode(&mut self) -> Result<RunReport> {
    println!("Step mode - Enter steps once, 'si N' steps N times, 'c' continues, 'q' quits");
    let mut shell = Shell::new()?;

    'outer: loop {
      match shell.read_command()? {
        ShellCommand::Step(n) => {
          for _ in 0..n {
            if !self.step()? {
              println!("simulation finished at t={:.1}", self.time());
              break 'outer;
            }
          }
          println!("t={:.1}", self.time());
        },
        ShellCommand::Continue => {
          while self.step()? {}
          break;
        },
        ShellCommand::Quit => break,
      }
    }

    Ok(self.finish())
  }

  fn finish(&mut self) -> RunReport {
    self.report.end_time = self.time();
    self.report.dumps = self
      .workload
      .read_dumps(&self.backing.lock(), &self.config.rocc.params.output_codec());
    self.report.statuses = self
      .simulation
      .models()
      .iter()
      .map(|m| (m.id().to_string(), m.status()))
      .collect();

    if !self.config.simulation.quiet {
      print_simulation_records(&mut self.simulation);
    }
    info!(
      "run finished at t={:.1}: {} responses, {} rejected pushes",
      self.report.end_time,
      self.report.responses.len(),
      self.report.rejected
    );
    self.report.clone()
  }
}
