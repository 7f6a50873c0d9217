pub mod host_model;
pub mod main;
pub mod memory_model;
pub mod rocc_model;

pub use main::{create_simulation, HOST, MEMORY, ROCC};
