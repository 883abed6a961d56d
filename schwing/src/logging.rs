//! Log subscriber setup for the `schwing` binary.

use std::io::{self, Write};

use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "warn,schwing=debug"
    } else {
        "warn,schwing=info"
    }
}

/// Initialize logging to stderr.
///
/// `RUST_LOG` overrides the default filter.  With `raw` set, line endings
/// are written as `\r\n` so output stays aligned while the terminal is in
/// raw mode.
pub fn init_logging(debug: bool, raw: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .with_writer(move || CrlfWriter::new(io::stderr(), raw))
        .init();
}

/// Writer that optionally expands `\n` to `\r\n`.
pub struct CrlfWriter<W: Write> {
    inner: W,
    raw: bool,
}

impl<W: Write> CrlfWriter<W> {
    pub fn new(inner: W, raw: bool) -> Self {
        CrlfWriter { inner, raw }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CrlfWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.raw {
            return self.inner.write(buf);
        }
        for chunk in buf.split_inclusive(|&b| b == b'\n') {
            match chunk.strip_suffix(b"\n") {
                Some(line) => {
                    self.inner.write_all(line)?;
                    self.inner.write_all(b"\r\n")?;
                }
                None => self.inner.write_all(chunk)?,
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
