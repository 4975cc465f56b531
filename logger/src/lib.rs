use colored::Colorize;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use middleware::logger::LoggerMiddleware;

pub mod middleware {
    pub mod logger;
}

/// Sets up the logger for the application.
/// Logs go to stdout with colored levels and to `faceswap.log`.
pub fn setup() -> Result<(), fern::InitError> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Magenta)
        .trace(Color::BrightBlack);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} {} [{}] {}",
                chrono::Local::now()
                    .format("[%Y-%m-%d %H:%M:%S]")
                    .to_string()
                    .bright_black(),
                colors.color(record.level()),
                record.target().bright_blue(),
                message
            ))
        })
        .level(LevelFilter::Debug)
        .level_for("hyper", LevelFilter::Off)
        .level_for("hyper_util", LevelFilter::Off)
        .level_for("sqlx", LevelFilter::Warn)
        .level_for("rustls", LevelFilter::Off)
        .chain(std::io::stdout())
        .chain(fern::log_file("faceswap.log")?)
        .apply()?;
    Ok(())
}

/// Creates the request logging middleware.
pub fn middleware(console_logging_enabled: bool) -> LoggerMiddleware {
    LoggerMiddleware::new(console_logging_enabled)
}
