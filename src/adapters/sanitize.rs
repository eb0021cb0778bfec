//! Log redaction for patient identifiers.
//!
//! Feature values never carry identity, but free text that reaches a log line
//! (paths typed by an operator, panic messages, error sources) might. Every
//! formatted log line is passed through [`sanitize`] by [`SanitizingMakeWriter`]
//! before it reaches the sink. Patterns covered:
//! - Malaysian identity card numbers (MyKad, `YYMMDD-PB-###G`)
//! - Hospital record numbers (`MRN` / `RN` prefixed)
//! - Email addresses
//! - Malaysian phone numbers
//! - UUIDs
//!
//! Input is capped at `SLECARE_SANITIZE_MAX_BYTES` (default 16 KiB) per call.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PATTERNS: OnceLock<Redactions> = OnceLock::new();

const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

const RULES: &[(&str, &str)] = &[
    (r"\b\d{6}-\d{2}-\d{4}\b", "[REDACTED-MYKAD]"),
    (r"(?i)\b(?:MRN|RN)[:#\s]?\s*[A-Z]?\d{6,10}\b", "[REDACTED-MRN]"),
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
    (
        r"(?:\+?60|\b0)1\d[-\s]?\d{3,4}[-\s]?\d{4}\b",
        "[REDACTED-PHONE]",
    ),
    (
        r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b",
        "[REDACTED-UUID]",
    ),
];

struct Redaction {
    regex: Regex,
    replacement: &'static str,
}

struct Redactions {
    set: RegexSet,
    rules: Vec<Redaction>,
}

fn patterns() -> &'static Redactions {
    PATTERNS.get_or_init(|| {
        let rules: Vec<Redaction> = RULES
            .iter()
            .filter_map(|&(pattern, replacement)| {
                Regex::new(pattern)
                    .ok()
                    .map(|regex| Redaction { regex, replacement })
            })
            .collect();
        let set = RegexSet::new(rules.iter().map(|r| r.regex.as_str()))
            .unwrap_or_else(|_| RegexSet::empty());
        Redactions { set, rules }
    })
}

fn max_sanitize_bytes() -> usize {
    std::env::var("SLECARE_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Replace identifier-like substrings with redaction markers.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in patterns.set.matches(prefix).into_iter() {
        let rule = &patterns.rules[idx];
        result = rule.regex.replace_all(&result, rule.replacement).into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// A `tracing_subscriber` writer that redacts each formatted line before
/// handing it to the inner writer.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    pending: Vec<u8>,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn emit(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        self.inner.write_all(sanitize(&text).as_bytes())
    }

    fn drain_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.emit(&line)?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.pending.extend_from_slice(buf);

        // A line with no newline in sight is flushed once it grows past twice the cap.
        if self.pending.len() > max_sanitize_bytes().saturating_mul(2) {
            let pending = std::mem::take(&mut self.pending);
            self.emit(&pending)?;
            self.inner.write_all(b"\n")?;
            return Ok(buf.len());
        }

        self.drain_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.drain_lines()?;
        if !self.pending.is_empty() {
            let pending = std::mem::take(&mut self.pending);
            self.emit(&pending)?;
        }
        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
            pending: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_all_rules_compile() {
        assert_eq!(patterns().rules.len(), RULES.len());
    }

    #[test]
    fn test_sanitize_mykad() {
        let sanitized = sanitize("IC 900101-14-5678 submitted");
        assert!(sanitized.contains("[REDACTED-MYKAD]"));
        assert!(!sanitized.contains("900101"));
    }

    #[test]
    fn test_sanitize_mrn() {
        assert!(sanitize("MRN: 00123456 loaded").contains("[REDACTED-MRN]"));
        assert!(sanitize("rn#K1234567").contains("[REDACTED-MRN]"));
    }

    #[test]
    fn test_sanitize_email_and_phone() {
        let sanitized = sanitize("contact dr.aminah@hukm.ukm.my or 012-345 6789");
        assert!(sanitized.contains("[REDACTED-EMAIL]"));
        assert!(sanitized.contains("[REDACTED-PHONE]"));
        assert!(!sanitized.contains("6789"));
    }

    #[test]
    fn test_sanitize_uuid() {
        let sanitized = sanitize("session 550e8400-e29b-41d4-a716-446655440000");
        assert!(sanitized.contains("[REDACTED-UUID]"));
    }

    #[test]
    fn test_feature_values_pass_through() {
        let line = "Assembled record target=CKD EGFR=87.5 UPCR=1.25 RACE=2";
        assert_eq!(sanitize(line), line);
        assert!(!patterns().set.is_match(line));
    }

    #[test]
    fn test_truncation_respects_char_boundary() {
        let sanitized = sanitize_with_limit("Perempuan é é é é", 11);
        assert!(sanitized.ends_with("[TRUNCATED]"));
    }

    #[test]
    fn test_writer_redacts_per_line() {
        let mut out = Vec::new();
        {
            let mut writer = SanitizingWriter {
                inner: &mut out,
                pending: Vec::new(),
            };
            writer.write_all(b"first 900101-14-").unwrap();
            writer.write_all(b"5678\nsecond line").unwrap();
            writer.flush().unwrap();
        }
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "first [REDACTED-MYKAD]\nsecond line");
    }
}
