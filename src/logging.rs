use tracing::info;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogFormat, LoggingSettings};

const LOG_ENV: &str = "UPS_LOG";

/// Фильтр: сначала UPS_LOG, потом RUST_LOG, потом уровень из конфига
fn build_filter(settings: &LoggingSettings) -> EnvFilter {
    match std::env::var(LOG_ENV) {
        Ok(directive) => EnvFilter::try_new(&directive).unwrap_or_else(|err| {
            eprintln!("невалидный {} ({}), используем {}", LOG_ENV, err, settings.level);
            EnvFilter::new(&settings.level)
        }),
        Err(_) => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&settings.level)),
    }
}

/// Повторный вызов ничего не делает
pub fn init_tracing(settings: &LoggingSettings) {
    let fmt_layer = match settings.format {
        LogFormat::Json => fmt::layer().with_target(false).json().boxed(),
        LogFormat::Pretty => fmt::layer().with_target(true).boxed(),
    };

    let initialised = tracing_subscriber::registry()
        .with(build_filter(settings))
        .with(fmt_layer)
        .try_init()
        .is_ok();

    if initialised {
        info!(format = ?settings.format, level = %settings.level, "логирование запущено");
    }
}
