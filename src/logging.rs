use log::LevelFilter;
use std::env;

const ENV_FILTER: &str = "RUST_LOG";

/// Installs the logger before configuration is read. Until `apply_level`
/// runs, output is limited to info and above.
pub fn init() {
    let mut builder = env_logger::Builder::new();
    builder.target(env_logger::Target::Stdout);
    if env_overrides() {
        builder.parse_env(ENV_FILTER);
    } else {
        builder.filter_level(LevelFilter::Trace);
    }
    builder.init();

    if !env_overrides() {
        log::set_max_level(LevelFilter::Info);
    }
}

/// `RUST_LOG`, when set, wins over the configured level.
pub fn apply_level(level: LevelFilter) {
    if env_overrides() {
        log::info!("Log level taken from {}", ENV_FILTER);
        return;
    }
    log::set_max_level(level);
    log::info!("Log level set to {}", level);
}

fn env_overrides() -> bool {
    env::var_os(ENV_FILTER).is_some()
}
