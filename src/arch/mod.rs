pub mod engine;
pub mod mvm;
pub mod rocc;
