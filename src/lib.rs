pub mod arch;
pub mod simulator;

pub use simulator::sim::mode::StepMode;
pub use simulator::utils::log;
