use mad_config::Config;

/// Initialize the logging system.
pub fn init_logging(config: &Config) {
    mad_log::init(config.logging());
}

/// Dumps out the configuration used by this invocation.
pub fn dump_spawn_infos(config: &Config) {
    mad_log::debug!(
        version = crate::cliapp::VERSION,
        "launching mad from config folder {}",
        config.path().display()
    );
    mad_log::debug!(
        types = config.type_registry().len(),
        "  number format: {:?}",
        config.number_format()
    );
}
