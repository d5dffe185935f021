use std::sync::Once;

/// Graphics-stack crates that log validation chatter at `info`.
const NOISY_TARGETS: [&str; 3] = ["wgpu_core", "wgpu_hal", "naga"];

/// Logger settings applied by [`init_logging`].
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger` filter directives, e.g. `"tessera_engine=trace"`.
    /// Takes precedence over `RUST_LOG`.
    pub env_filter: Option<String>,

    /// Level used when neither `env_filter` nor `RUST_LOG` is set.
    pub default_level: log::LevelFilter,

    /// Cap `wgpu_core`, `wgpu_hal` and `naga` at `warn` unless a filter names them.
    pub quiet_graphics: bool,

    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: log::LevelFilter::Info,
            quiet_graphics: true,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Calls after the first are no-ops.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(config.default_level);

        let filter = config.env_filter.or_else(|| std::env::var("RUST_LOG").ok());

        if config.quiet_graphics {
            for target in NOISY_TARGETS {
                let named = filter.as_deref().is_some_and(|f| f.contains(target));
                if !named {
                    builder.filter_module(target, log::LevelFilter::Warn);
                }
            }
        }
        if let Some(filter) = &filter {
            builder.parse_filters(filter);
        }

        builder.write_style(config.write_style);
        builder.init();

        log::debug!("logging initialized (filter: {filter:?})");
    });
}
