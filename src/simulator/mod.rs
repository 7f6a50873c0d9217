pub mod config;
pub mod sim;
pub mod simulator;
pub mod utils;
pub mod workload;

pub use simulator::{RunReport, Simulator};
pub use utils::log;
