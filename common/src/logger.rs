use std::fmt;
use std::sync::OnceLock;
use chrono::Local;

static LOGGER: OnceLock<Logger> = OnceLock::new();

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        };
        write!(f, "{}", name)
    }
}

pub struct Logger {
    prefix: Option<String>,
}

impl Logger {
    fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    pub fn log(&self, level: Level, file: &str, line: u32, message: &str) {
        let line_text = format_line(self.prefix.as_deref(), level, file, line, message);
        if level >= Level::Warn {
            eprintln!("{}", line_text);
        } else {
            println!("{}", line_text);
        }
    }
}

fn format_line(prefix: Option<&str>, level: Level, file: &str, line: u32, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let file_name = file.rsplit(['/', '\\']).next().unwrap_or(file);
    match prefix {
        Some(prefix) => format!("[{}][{}][{}][{}:{}] {}", timestamp, level, prefix, file_name, line, message),
        None => format!("[{}][{}][{}:{}] {}", timestamp, level, file_name, line, message),
    }
}

/// Returns false if something was logged before this call; the fallback
/// logger then stays in place and the prefix is dropped with a warning.
pub fn init_logger(prefix: Option<String>) -> bool {
    install(&LOGGER, prefix)
}

fn install(cell: &OnceLock<Logger>, prefix: Option<String>) -> bool {
    match cell.set(Logger::new(prefix)) {
        Ok(()) => true,
        Err(rejected) => {
            if let Some(active) = cell.get() {
                active.log(
                    Level::Warn,
                    file!(),
                    line!(),
                    &format!(
                        "Logger already initialized, prefix {:?} ignored",
                        rejected.prefix.as_deref().unwrap_or("")
                    ),
                );
            }
            false
        }
    }
}

/// Messages logged before `init_logger` fall back to an unprefixed logger, so
/// engine code stays usable from tests and benches.
pub fn log(level: Level, file: &str, line: u32, message: &str) {
    LOGGER.get_or_init(|| Logger::new(None)).log(level, file, line, message);
}

#[macro_export]
macro_rules! log {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Info, file!(), line!(), &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Warn, file!(), line!(), &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Error, file!(), line!(), &format!($($arg)*))
    };
}
