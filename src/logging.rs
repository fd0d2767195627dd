//! Logging setup with secret redaction.
//!
//! Every formatted log line passes through [`RedactionPatterns`] before it
//! reaches stderr, so tokens echoed by HTTP client errors never hit the log.

use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting sensitive data
pub struct RedactionPatterns {
    bot_url_token: Regex,
    bare_token: Regex,
    aws_key_id: Regex,
    aws_secret: Regex,
    bearer: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            bot_url_token: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)")?,
            bare_token: Regex::new(r"\b[0-9]{8,10}:[A-Za-z0-9_-]{35}\b")?,
            aws_key_id: Regex::new(r"(?i)(aws_access_key_id['\x22]?\s*[=:]\s*['\x22]?)[^\s&'\x22,]+")?,
            aws_secret: Regex::new(
                r"(?i)(aws_secret_access_key['\x22]?\s*[=:]\s*['\x22]?)[^\s&'\x22,]+",
            )?,
            bearer: Regex::new(r"(?i)(bearer\s+)[A-Za-z0-9._~+/=-]+")?,
        })
    }

    /// Replace every secret in `input` with a placeholder.
    #[must_use]
    pub fn redact(&self, input: &str) -> String {
        let output = self
            .bot_url_token
            .replace_all(input, "$1[TELEGRAM_TOKEN]");
        let output = self.bare_token.replace_all(&output, "[TELEGRAM_TOKEN]");
        let output = self.aws_key_id.replace_all(&output, "${1}[MASKED]");
        let output = self.aws_secret.replace_all(&output, "${1}[MASKED]");
        let output = self.bearer.replace_all(&output, "${1}[MASKED]");
        output.into_owned()
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        self.inner.write_all(self.patterns.redact(&s).as_bytes())?;
        // Report the original length even though the redacted text may differ.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: (self.make_inner)(),
            patterns: Arc::clone(&self.patterns),
        }
    }
}

/// Install the global subscriber: `RUST_LOG` filter (default `info`), redacted stderr output.
pub fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter {
        make_inner: io::stderr,
        patterns,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}
