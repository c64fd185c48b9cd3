//! File logging. The terminal belongs to the TUI, so log records go to a file.

use std::path::Path;

use anyhow::Context as _;
use log::LevelFilter;
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l} {t} {m}{n}";

pub(crate) fn init(path: &Path, level: LevelFilter) -> anyhow::Result<()> {
    let logfile = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(level)))
                .build("logfile", Box::new(logfile)),
        )
        .build(Root::builder().appender("logfile").build(level))
        .context("invalid logging configuration")?;
    log4rs::init_config(config).context("failed to install logger")?;
    Ok(())
}
