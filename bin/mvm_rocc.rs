use clap::Parser;
use log::info;
use mvm_rocc::simulator::config::load_and_merge_configs;
use mvm_rocc::simulator::utils::log::{init_log, set_quiet};
use mvm_rocc::simulator::utils::report::print_run_report;
use mvm_rocc::simulator::workload::Workload;
use mvm_rocc::simulator::Simulator;
use std::path::PathBuf;

/// mvm_rocc - matrix-vector accelerator command interface simulator
#[derive(Parser, Debug)]
#[command(name = "mvm_rocc")]
#[command(version = "0.1.0")]
#[command(about = "Discrete-event simulation of a RoCC matrix-vector accelerator", long_about = None)]
struct Args {
  /// Custom configuration file, merged over the built-in defaults
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Workload file: preloads, commands and dump regions
  #[arg(short, long, value_name = "FILE")]
  workload: PathBuf,

  /// Enable step mode (interactive stepping)
  #[arg(short, long)]
  step: bool,

  /// Quiet mode (suppress log messages)
  #[arg(short, long)]
  quiet: bool,

  /// Output trace file path
  #[arg(long, value_name = "FILE")]
  trace_file: Option<String>,

  /// Stop once simulated time passes this many cycles
  #[arg(long, value_name = "CYCLES")]
  max_time: Option<f64>,
}

fn main() -> std::io::Result<()> {
  init_log();

  let args = Args::parse();

  let config = load_and_merge_configs(
    args.config.as_deref(),
    args.quiet,
    args.step,
    args.trace_file.as_deref(),
    args.max_time,
  )?;
  set_quiet(config.simulation.quiet);
  let workload = Workload::load(&args.workload)?;
  info!("workload {:?}: {} commands", args.workload, workload.command.len());

  let mut simulator = Simulator::new(config, workload)?;
  let report = simulator.run()?;
  print_run_report(&report);

  Ok(())
}
