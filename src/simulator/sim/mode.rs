#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepMode {
  #[default]
  Continuous,
  Step,
}

impl StepMode {
  pub fn from_flag(step: bool) -> Self {
    if step {
      StepMode::Step
    } else {
      StepMode::Continuous
    }
  }
}
