use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use log::LevelFilter;
use std::fs;
use std::path::Path;

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} | {({l}):5.5} | {f}:{L} - {m}{n}";

pub struct LogOptions<'a> {
    pub dir: &'a str,
    /// File name inside `dir`, e.g. `repast.log`.
    pub file_name: &'a str,
    pub level: LevelFilter,
    /// Mirror log lines to stderr.
    pub console: bool,
}

pub fn setup_logging(options: &LogOptions<'_>) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(options.dir)?;

    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(Path::new(options.dir).join(options.file_name))?;

    let mut config = Config::builder().appender(Appender::builder().build("file", Box::new(file)));
    let mut root = Root::builder().appender("file");

    if options.console {
        // stderr keeps diagnostics out of the interactive prompt stream
        let console = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();
        config = config.appender(Appender::builder().build("console", Box::new(console)));
        root = root.appender("console");
    }

    let config = config.build(root.build(options.level))?;
    log4rs::init_config(config)?;

    Ok(())
}
