use crate::config::DEFAULT_LOG_FILTER;
use lazy_static::lazy_static;
use std::io::{self, Write};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

pub const DEBUG_OUTPUT_LIMIT: usize = 64 * 1024;

lazy_static! {
    static ref DEBUG_LOG: Mutex<String> = Mutex::new(String::new());
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DebugBuffer;

impl Write for DebugBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut log) = DEBUG_LOG.lock() {
            log.push_str(&String::from_utf8_lossy(buf));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for DebugBuffer {
    type Writer = DebugBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        *self
    }
}

pub fn init(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(io::stderr.and(DebugBuffer))
        .try_init();
}

/// Moves buffered log lines into `output`, trimming from the front once it
/// grows past [`DEBUG_OUTPUT_LIMIT`].
pub fn drain_into(output: &mut String) {
    let pending = match DEBUG_LOG.lock() {
        Ok(mut log) => std::mem::take(&mut *log),
        Err(_) => return,
    };
    if pending.is_empty() {
        return;
    }
    output.push_str(&pending);

    if output.len() > DEBUG_OUTPUT_LIMIT {
        let mut cut = output.len() - DEBUG_OUTPUT_LIMIT;
        while !output.is_char_boundary(cut) {
            cut += 1;
        }
        // keep whole lines
        if let Some(nl) = output[cut..].find('\n') {
            cut += nl + 1;
        }
        output.drain(..cut);
    }
}
