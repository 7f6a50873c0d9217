/// Push a `ModelRecord` stamped with the current simulation time.
///
/// The subject takes `format!` arguments:
/// ```ignore
/// model_record!(self, services, "serve", "read {:#x}+{}", addr, len);
/// ```
/// The model needs a `records: Vec<ModelRecord>` field.
#[macro_export]
macro_rules! model_record {
  ($self:expr, $services:expr, $action:expr, $($subject:tt)+) => {
    $self.records.push(sim::models::ModelRecord {
      time: $services.global_time(),
      action: ::std::string::ToString::to_string(&$action),
      subject: format!($($subject)+),
    })
  };
}
