pub mod mode;
pub mod model;
pub mod records;
pub mod shell;

pub use mode::StepMode;
pub use model::{is_quiescent, model_step};
