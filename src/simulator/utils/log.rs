use env_logger::Env;
use log::LevelFilter;

/// Install the global logger. `RUST_LOG` wins; otherwise `info`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_log() {
  let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
    .format_timestamp(None)
    .try_init();
}

/// Quiet mode keeps warnings and errors only.
pub fn set_quiet(quiet: bool) {
  if quiet {
    log::set_max_level(LevelFilter::Warn);
  }
}
