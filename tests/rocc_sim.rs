use mvm_rocc::arch::engine::backing::FaultRange;
use mvm_rocc::arch::rocc::{Command, Opcode, Response, RESP_FAIL, RESP_OK};
use mvm_rocc::simulator::config::config::validate_config;
use mvm_rocc::simulator::config::AppConfig;
use mvm_rocc::simulator::utils::log::init_log;
use mvm_rocc::simulator::workload::{Dump, Preload, Workload};
use mvm_rocc::simulator::{RunReport, Simulator};

fn config(num_arrays: u32, input: u32, output: u32) -> AppConfig {
  let mut config = AppConfig::default();
  config.rocc.params.num_arrays = num_arrays;
  config.rocc.params.array_input_size = input;
  config.rocc.params.array_output_size = output;
  config.memory.line_size = 16;
  config.simulation.quiet = true;
  validate_config(&config).expect("test config must be valid");
  config
}

fn preload(addr: u64, values: &[f64]) -> Preload {
  Preload {
    addr,
    values: values.to_vec(),
    bytes: Vec::new(),
  }
}

fn dump(name: &str, addr: u64, count: usize) -> Dump {
  Dump {
    name: name.to_string(),
    addr,
    count,
  }
}

fn run(config: AppConfig, workload: Workload) -> RunReport {
  init_log();
  let mut simulator = Simulator::new(config, workload).expect("failed to create simulator");
  simulator.run_to_completion().expect("simulation failed")
}

fn values(report: &RunReport) -> Vec<(u8, u64)> {
  report.responses.iter().map(|r| (r.slot, r.value)).collect()
}

#[test]
fn test_matvec_through_memory() {
  // [[1 2 3] [4 5 6]] x [1 1 2] = [9 21]
  let workload = Workload {
    preload: vec![
      preload(0x1000, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
      preload(0x2000, &[1.0, 1.0, 2.0]),
    ],
    command: vec![
      Command::set_matrix(0x1000, 0, 1),
      Command::load_vector(0x2000, 0, 2),
      Command::compute(0, 3),
      Command::store_vector(0x3000, 0, 4),
    ],
    dump: vec![dump("y", 0x3000, 2)],
    ..Default::default()
  };

  let report = run(config(1, 3, 2), workload);

  assert_eq!(values(&report), vec![(1, RESP_OK), (2, RESP_OK), (3, RESP_OK), (4, RESP_OK)]);
  assert_eq!(report.dumps[0].values, vec![9.0, 21.0]);
  assert!(!report.timed_out);
  assert!(report.end_time > 0.0);
}

#[test]
fn test_chained_arrays_misaligned_store() {
  // A0 = [[1 2] [3 4]], A1 = [[1 0] [0 2]], x = [1 1]
  // y0 = [3 7], moved into A1, y1 = [3 14]
  let workload = Workload {
    preload: vec![
      preload(0x1000, &[1.0, 2.0, 3.0, 4.0]),
      preload(0x1010, &[1.0, 0.0, 0.0, 2.0]),
      preload(0x2000, &[1.0, 1.0]),
    ],
    command: vec![
      Command::set_matrix(0x1000, 0, 1),
      Command::set_matrix(0x1010, 1, 2),
      Command::load_vector(0x2000, 0, 3),
      Command::compute(0, 4),
      Command::move_vector(0, 1, 5),
      Command::compute(1, 6),
      // crosses a 16-byte line
      Command::store_vector(0x300c, 1, 7),
    ],
    dump: vec![dump("y1", 0x300c, 2)],
    ..Default::default()
  };

  let report = run(config(2, 2, 2), workload);

  assert_eq!(report.responses.len(), 7);
  assert!(report.responses.iter().all(|r| r.value == RESP_OK));
  assert_eq!(report.dumps[0].values, vec![3.0, 14.0]);
}

#[test]
fn test_memory_faults_fail_only_their_command() {
  let workload = Workload {
    preload: vec![preload(0x2000, &[5.0, 6.0])],
    fault: vec![FaultRange { start: 0x1008, end: 0x100c }],
    command: vec![
      // the matrix line overlaps the fault
      Command::set_matrix(0x1000, 0, 1),
      Command::load_vector(0x2000, 0, 2),
      // first write chunk 0x1004..0x100c hits it too
      Command::store_vector(0x1004, 0, 3),
      Command::move_vector(0, 0, 4),
    ],
    dump: vec![dump("x", 0x2000, 2)],
    ..Default::default()
  };

  let report = run(config(1, 2, 2), workload);

  assert_eq!(
    values(&report),
    vec![(1, RESP_FAIL), (2, RESP_OK), (3, RESP_FAIL), (4, RESP_OK)]
  );
  assert_eq!(report.dumps[0].values, vec![5.0, 6.0]);
}

#[test]
fn test_moves_between_memory_commands_all_answer() {
  let workload = Workload {
    preload: vec![preload(0x2000, &[1.0, 2.0])],
    fault: vec![FaultRange { start: 0x5000, end: 0x5010 }],
    command: vec![
      Command::load_vector(0x2000, 0, 1),
      Command::move_vector(0, 0, 2),
      Command::store_vector(0x5000, 0, 3),
      Command::move_vector(0, 0, 4),
    ],
    ..Default::default()
  };

  let report = run(config(1, 2, 2), workload);
  assert_eq!(
    values(&report),
    vec![(1, RESP_OK), (2, RESP_OK), (3, RESP_FAIL), (4, RESP_OK)]
  );
}

#[test]
fn test_unknown_opcode_and_bad_array() {
  let workload = Workload {
    command: vec![
      Command::new(Opcode::Unknown(0x11), 0, 0, 1),
      Command::compute(3, 2),
      Command::compute(0, 3),
    ],
    ..Default::default()
  };

  let report = run(config(1, 2, 2), workload);
  assert_eq!(values(&report), vec![(1, RESP_FAIL), (2, RESP_FAIL), (3, RESP_OK)]);
}

#[test]
fn test_saturated_queue_keeps_order() {
  let mut config = config(2, 2, 2);
  config.rocc.params.max_instructions = 2;
  config.array.latency = 20.0;

  let command: Vec<Command> = (1..=6u8).map(|slot| Command::compute(u32::from(slot % 2), slot)).collect();
  let workload = Workload {
    command,
    ..Default::default()
  };

  let report = run(config, workload);

  assert!(report.rejected > 0, "the host should have hit a full queue");
  let slots: Vec<u8> = report.responses.iter().map(|r| r.slot).collect();
  assert_eq!(slots, vec![1, 2, 3, 4, 5, 6]);
  assert!(report.responses.iter().all(|r| r.value == RESP_OK));
  // six computes, one at a time
  assert!(report.end_time >= 6.0 * 20.0);
}

#[test]
fn test_max_time_stops_run() {
  let mut config = config(1, 2, 2);
  config.array.latency = 1000.0;
  config.simulation.max_time = 1500.0;

  let workload = Workload {
    command: (1..=4u8).map(|slot| Command::compute(0, slot)).collect(),
    ..Default::default()
  };

  let report = run(config, workload);
  assert!(report.timed_out);
  assert!(report.responses.len() < 4);
  assert_eq!(report.responses.first(), Some(&Response { slot: 1, value: RESP_OK }));
}

#[test]
fn test_trace_file_and_runtime_lease() {
  init_log();
  let path = std::env::temp_dir().join(format!("mvm_rocc_trace_{}.jsonl", std::process::id()));

  let mut config = config(1, 2, 2);
  config.simulation.trace_file = path.to_string_lossy().to_string();
  let workload = Workload {
    command: vec![Command::move_vector(0, 0, 9)],
    ..Default::default()
  };

  let mut simulator = Simulator::new(config, workload).unwrap();
  let runtime = simulator.runtime().clone();
  assert!(runtime.live_instances() >= 1);

  let report = simulator.run_to_completion().unwrap();
  assert_eq!(values(&report), vec![(9, RESP_OK)]);
  drop(simulator);
  assert_eq!(runtime.live_instances(), 0);

  let trace = std::fs::read_to_string(&path).unwrap();
  let entries: Vec<serde_json::Value> = trace.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
  assert!(entries.iter().any(|e| e["target"] == "rocc" && e["target_port"] == "command"));
  assert!(entries.iter().any(|e| e["target"] == "host" && e["target_port"] == "response"));
  let _ = std::fs::remove_file(&path);
}
