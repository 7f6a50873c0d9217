use sim::models::{Model, Reportable};
use sim::simulator::Simulation;

use crate::simulator::RunReport;

pub fn print_simulation_records(simulation: &mut Simulation) {
  println!("\n--- Simulation Records ---");

  for model in simulation.models().iter() {
    print_model_records(model);
  }

  println!("--- End Records ---\n");
}

fn print_model_records(model: &Model) {
  let records = model.records();

  if !records.is_empty() {
    println!("\n[{}] {}", model.id(), model.status());
    for record in records {
      println!("  Time {:.1}: {} {}", record.time, record.action, record.subject);
    }
  }
}

pub fn print_run_report(report: &RunReport) {
  println!("--- Run Report ---");
  println!("end time: {:.1}{}", report.end_time, if report.timed_out { " (max_time reached)" } else { "" });
  println!("rejected pushes: {}", report.rejected);
  for resp in &report.responses {
    println!("  slot {:>3} <- {}", resp.slot, resp.value);
  }
  for region in &report.dumps {
    println!("  {} @ {:#x}: {:?}", region.name, region.addr, region.values);
  }
  for (id, status) in &report.statuses {
    println!("  [{}] {}", id, status);
  }
}
