use std::io::Write;

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Фильтр по умолчанию, если RUST_LOG не задан
pub const DEFAULT_LOG_FILTER: &str = "warn,podcast_assembly=info";

/// Инициализация логгера
///
/// Повторный вызов ничего не делает.
pub fn init_logger() {
    let env = Env::default().filter_or("RUST_LOG", DEFAULT_LOG_FILTER);

    let mut builder = Builder::from_env(env);

    builder
        .filter_module("symphonia_core", LevelFilter::Warn)
        .filter_module("symphonia_bundle_mp3", LevelFilter::Warn)
        .filter_module("reqwest", LevelFilter::Info)
        .filter_module("hyper", LevelFilter::Error)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}: {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr);

    let _ = builder.try_init();
}
