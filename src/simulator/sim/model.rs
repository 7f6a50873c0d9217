use log::{debug, LevelFilter};
use sim::models::model_trait::DevsModel;
use sim::simulator::{Message, Simulation};
use std::f64::INFINITY;
use std::fs::File;
use std::io::{self, BufWriter, Result, Write};

fn sim_error(e: impl std::fmt::Debug) -> io::Error {
  io::Error::new(io::ErrorKind::Other, format!("Simulation error: {:?}", e))
}

fn next_internal_event(simulation: &mut Simulation) -> f64 {
  simulation
    .models()
    .iter()
    .fold(INFINITY, |min, model| f64::min(min, model.until_next_event()))
}

/// No pending messages and every model passive.
pub fn is_quiescent(simulation: &mut Simulation) -> bool {
  simulation.get_messages().is_empty() && next_internal_event(simulation) == INFINITY
}

fn trace(messages: &[Message], trace_writer: &mut Option<BufWriter<File>>) -> Result<()> {
  if log::max_level() >= LevelFilter::Debug {
    for msg in messages {
      debug!(
        "[MSG] t={:.1} {}:{} -> {}:{} | {}",
        msg.time(),
        msg.source_id(),
        msg.source_port(),
        msg.target_id(),
        msg.target_port(),
        msg.content()
      );
    }
  }

  if let Some(writer) = trace_writer {
    for msg in messages {
      let trace_entry = serde_json::json!({
        "time": msg.time(),
        "source": msg.source_id(),
        "source_port": msg.source_port(),
        "target": msg.target_id(),
        "target_port": msg.target_port(),
        "content": msg.content()
      });
      writeln!(writer, "{}", trace_entry)?;
    }
    writer.flush()?;
  }
  Ok(())
}

/// Advance to the next point in simulated time.
///
/// Delivers every message pending at the current time, then runs internal
/// events until the clock moves. Returns the messages delivered on the way.
pub fn model_step(simulation: &mut Simulation, trace_writer: &mut Option<BufWriter<File>>) -> Result<Vec<Message>> {
  let mut delivered = Vec::new();

  // First, drain all pending messages
  let mut messages_to_process = simulation.get_messages().clone();

  while !messages_to_process.is_empty() {
    trace(&messages_to_process, trace_writer)?;
    delivered.append(&mut messages_to_process);

    let time0 = simulation.get_global_time();
    simulation.step().map_err(sim_error)?;
    if simulation.get_global_time() > time0 {
      return Ok(delivered);
    }

    messages_to_process = simulation.get_messages().clone();
  }

  // Then internal events until time advances or everything is idle
  loop {
    if next_internal_event(simulation) == INFINITY {
      break;
    }

    let time0 = simulation.get_global_time();
    simulation.step().map_err(sim_error)?;
    if simulation.get_global_time() > time0 || !simulation.get_messages().is_empty() {
      break;
    }
  }

  Ok(delivered)
}
