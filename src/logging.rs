//! Console and append-only file logging.

use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing_subscriber::fmt::MakeWriter;

/// Appends every line to a log file and never reports an error.
///
/// The file is opened per event, so a log file removed or locked mid-run
/// only loses the affected lines. The first failure prints one warning
/// on stderr; later failures are silent.
#[derive(Debug, Clone)]
pub struct LogFile {
    path: PathBuf,
    warned: Arc<AtomicBool>,
}

impl LogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            warned: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn warn_once(&self, err: &io::Error) {
        if !self.warned.swap(true, Ordering::SeqCst) {
            eprintln!(
                "warning: could not write log file '{}': {}",
                self.path.display(),
                err
            );
        }
    }
}

pub struct LogFileWriter<'a> {
    owner: &'a LogFile,
    file: Option<File>,
}

impl Write for LogFileWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.write_all(buf) {
                self.owner.warn_once(&e);
                self.file = None;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.flush() {
                self.owner.warn_once(&e);
            }
        }
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        let file = match OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(f) => Some(f),
            Err(e) => {
                self.warn_once(&e);
                None
            }
        };
        LogFileWriter { owner: self, file }
    }
}

/// Console level for the `-v` count; `-q` keeps only warnings and errors.
fn console_level(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "warn";
    }
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber.
///
/// The console shows events at the level chosen by `-v`/`-q` (`RUST_LOG`
/// overrides it); the log file, when given, receives everything at debug.
pub fn init(verbosity: u8, quiet: bool, log_file: Option<&Path>) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = console_level(verbosity, quiet);

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("code_reset={}", level)));

    let file_layer = log_file.map(|path| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(LogFile::new(path))
            .with_filter(EnvFilter::new("code_reset=debug"))
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(io::stderr().is_terminal())
                .with_writer(io::stderr)
                .with_filter(console_filter),
        )
        .with(file_layer)
        .init();
}
