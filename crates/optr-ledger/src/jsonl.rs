//! File-backed ledger: one JSON object per line.
//!
//! A record is committed once its terminating `\n` is on disk. An
//! unterminated final line is a torn write: `read` and `append` refuse it,
//! `verify` reports it. Blank lines are ignored everywhere.
//!
//! Nothing is cached between calls. `append` reads only the tail of the
//! file to find the chain head; `read` and `verify` read the whole file.
//!
//! # Single writer
//!
//! There is no locking. Two processes appending at once may both link to the
//! same head and fork the chain; `verify` reports the fork as one
//! `LinkBroken` violation. Multi-writer deployments must hold an external
//! lock across each `append`.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::Path,
};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use optr_contracts::{
    error::{OptrError, OptrResult},
    event::{EventDraft, LedgerEvent},
    verify::{VerificationReport, Violation},
};
use optr_core::traits::EventLedger;

use crate::{
    chain::{self, check_event},
    config::LedgerConfig,
    schema::RecordSchema,
};

/// Bytes read per step when scanning backwards for the last record.
const TAIL_CHUNK: u64 = 4096;

/// An append-only, hash-chained JSON Lines ledger.
#[derive(Debug, Clone)]
pub struct JsonlLedger {
    config: LedgerConfig,
}

impl JsonlLedger {
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }

    /// A ledger at `path` with default settings.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::new(LedgerConfig::new(path.as_ref()))
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Create the ledger's parent directory if it is missing.
    ///
    /// Idempotent. The ledger file itself is created by the first append.
    pub fn init(&self) -> OptrResult<()> {
        if let Some(parent) = self.path().parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| storage_error("create directory", parent, e))?;
        }
        debug!(path = %self.path().display(), "ledger initialized");
        Ok(())
    }

    /// The hash the next appended event will link to.
    ///
    /// `GENESIS_HASH` when the file is missing or holds no records. Fails with
    /// `MalformedRecord` when the last record is torn or unparseable.
    pub fn head_hash(&self) -> OptrResult<String> {
        let mut file = match File::open(self.path()) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(LedgerEvent::GENESIS_HASH.to_string());
            }
            Err(e) => return Err(storage_error("open", self.path(), e)),
        };

        let line = match read_tail(&mut file).map_err(|e| storage_error("read", self.path(), e))? {
            Tail::Empty => return Ok(LedgerEvent::GENESIS_HASH.to_string()),
            Tail::Unterminated => {
                return Err(OptrError::MalformedRecord {
                    reason: format!(
                        "last record in '{}' is not newline-terminated (torn write); refusing to extend the chain",
                        self.path().display()
                    ),
                });
            }
            Tail::Line(bytes) => bytes,
        };

        let text = String::from_utf8(line).map_err(|_| OptrError::MalformedRecord {
            reason: "last record is not valid UTF-8".to_string(),
        })?;
        let last: LedgerEvent =
            serde_json::from_str(&text).map_err(|e| OptrError::MalformedRecord {
                reason: format!("last record: {}", e),
            })?;
        if !chain::is_sha256_hex(&last.current_hash) {
            return Err(OptrError::MalformedRecord {
                reason: format!(
                    "last record '{}' has an invalid current_hash",
                    last.event_id
                ),
            });
        }

        debug!(event_id = %last.event_id, head = %last.current_hash, "chain head read");
        Ok(last.current_hash)
    }

    /// Whole file contents, or `None` if the file does not exist.
    ///
    /// Raw bytes: an undecodable record is a per-line problem, not a storage
    /// failure.
    fn read_contents(&self) -> OptrResult<Option<Vec<u8>>> {
        match fs::read(self.path()) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("read", self.path(), e)),
        }
    }
}

impl EventLedger for JsonlLedger {
    /// Link `draft` to the current head, hash it, and append it as one line.
    ///
    /// The draft is validated by `chain::seal`, before anything is written.
    ///
    /// The line is written with a single `write_all` on an append-mode
    /// handle, then synced when `sync_on_append` is set. I/O failures are
    /// returned as `Storage` and not retried.
    fn append(&self, draft: EventDraft) -> OptrResult<LedgerEvent> {
        let previous_hash = self.head_hash()?;
        let event = chain::seal(draft, previous_hash, Utc::now())?;

        let mut line = serde_json::to_string(&event).map_err(|e| OptrError::Serialization {
            reason: format!("failed to encode event '{}': {}", event.event_id, e),
        })?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path())
            .map_err(|e| storage_error("open", self.path(), e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| storage_error("append to", self.path(), e))?;
        if self.config.sync_on_append {
            file.sync_data()
                .map_err(|e| storage_error("sync", self.path(), e))?;
        }

        info!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            current_hash = %event.current_hash,
            "event appended"
        );

        Ok(event)
    }

    /// Events in file order; the last `limit` of them when given.
    ///
    /// A missing file reads as empty. Any non-blank line that is not a
    /// complete event is an error naming its line number.
    fn read(&self, limit: Option<usize>) -> OptrResult<Vec<LedgerEvent>> {
        let Some(contents) = self.read_contents()? else {
            return Ok(Vec::new());
        };

        let mut events = Vec::new();
        for record in records(&contents) {
            if !record.terminated {
                return Err(OptrError::MalformedRecord {
                    reason: format!("line {}: unterminated trailing record (torn write)", record.line),
                });
            }
            let text = record
                .text()
                .map_err(|reason| OptrError::MalformedRecord { reason })?;
            let event: LedgerEvent =
                serde_json::from_str(text).map_err(|e| OptrError::MalformedRecord {
                    reason: format!("line {}: {}", record.line, e),
                })?;
            events.push(event);
        }

        if let Some(limit) = limit {
            let start = events.len().saturating_sub(limit);
            events.drain(..start);
        }

        debug!(path = %self.path().display(), count = events.len(), "events read");
        Ok(events)
    }

    /// Replay the file and collect every violation.
    ///
    /// Each record is first checked structurally (JSON, record schema,
    /// newline framing), then for linkage and content. A structurally broken
    /// record suspends the link check for the record after it. An existing
    /// file with no records is reported as truncated.
    fn verify(&self) -> OptrResult<VerificationReport> {
        let Some(contents) = self.read_contents()? else {
            info!(path = %self.path().display(), "no ledger file; nothing to verify");
            return Ok(VerificationReport::empty());
        };

        let schema = RecordSchema::new()?;
        let records = records(&contents);
        let mut violations = Vec::new();

        if records.is_empty() {
            violations.push(Violation::malformed(
                0,
                "ledger file exists but holds no records (truncated)",
            ));
        }

        let mut expected: Option<String> = Some(LedgerEvent::GENESIS_HASH.to_string());
        for record in &records {
            match parse_record(&schema, record) {
                Ok(event) => {
                    check_event(record.index, &event, expected.as_deref(), &mut violations);
                    expected = Some(event.current_hash);
                }
                Err(reason) => {
                    violations.push(Violation::malformed(record.index, reason));
                    expected = None;
                }
            }
        }

        for violation in &violations {
            warn!(path = %self.path().display(), %violation, "ledger integrity violation");
        }

        let report = VerificationReport::from_violations(records.len(), violations);
        info!(
            path = %self.path().display(),
            total_events = report.total_events,
            violations = report.violations.len(),
            valid = report.valid,
            "ledger verified"
        );
        Ok(report)
    }
}

// ── Record framing ────────────────────────────────────────────────────────────

/// One non-blank line of the ledger file.
struct RawRecord<'a> {
    /// 0-based position among non-blank lines.
    index: usize,
    /// 1-based physical line number.
    line: usize,
    /// The line with surrounding ASCII whitespace removed.
    bytes: &'a [u8],
    terminated: bool,
}

impl<'a> RawRecord<'a> {
    fn text(&self) -> Result<&'a str, String> {
        std::str::from_utf8(self.bytes)
            .map_err(|e| format!("line {}: invalid UTF-8: {}", self.line, e))
    }
}

/// Split `contents` into records. A line is blank when it holds only ASCII
/// whitespace, the same rule `read_tail` applies.
fn records(contents: &[u8]) -> Vec<RawRecord<'_>> {
    contents
        .split_inclusive(|&b| b == b'\n')
        .enumerate()
        .filter_map(|(i, raw)| {
            let bytes = trim_ascii_whitespace(raw);
            (!bytes.is_empty()).then(|| (i + 1, bytes, raw.ends_with(b"\n")))
        })
        .enumerate()
        .map(|(index, (line, bytes, terminated))| RawRecord {
            index,
            line,
            bytes,
            terminated,
        })
        .collect()
}

fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |last| last + 1);
    &bytes[start..end]
}

/// Structural phase of verification. `Err` carries the violation detail.
fn parse_record(schema: &RecordSchema, record: &RawRecord<'_>) -> Result<LedgerEvent, String> {
    if !record.terminated {
        return Err("unterminated trailing record (torn write)".to_string());
    }

    let value: Value = serde_json::from_str(record.text()?)
        .map_err(|e| format!("line {}: invalid JSON: {}", record.line, e))?;

    let problems = schema.check(&value);
    if !problems.is_empty() {
        return Err(format!("line {}: {}", record.line, problems.join("; ")));
    }

    serde_json::from_value(value).map_err(|e| format!("line {}: {}", record.line, e))
}

enum Tail {
    /// No non-whitespace bytes in the file.
    Empty,
    /// The last record has no terminating newline.
    Unterminated,
    /// The last non-blank line, without its newline.
    Line(Vec<u8>),
}

/// Scan backwards from the end of `file` for the last non-blank line.
fn read_tail(file: &mut File) -> io::Result<Tail> {
    let mut pos = file.metadata()?.len();
    let mut buf: Vec<u8> = Vec::new();

    loop {
        let start = pos.saturating_sub(TAIL_CHUNK);
        let mut chunk = vec![0u8; (pos - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(&mut chunk)?;
        chunk.extend_from_slice(&buf);
        buf = chunk;
        pos = start;

        let Some(end) = buf.iter().rposition(|b| !b.is_ascii_whitespace()) else {
            if pos == 0 {
                return Ok(Tail::Empty);
            }
            continue;
        };

        let begin = match buf[..end].iter().rposition(|&b| b == b'\n') {
            Some(newline) => newline + 1,
            None if pos == 0 => 0,
            None => continue,
        };

        if !buf[end..].contains(&b'\n') {
            return Ok(Tail::Unterminated);
        }
        return Ok(Tail::Line(trim_ascii_whitespace(&buf[begin..=end]).to_vec()));
    }
}

fn storage_error(action: &str, path: &Path, e: io::Error) -> OptrError {
    OptrError::Storage {
        reason: format!("failed to {} '{}': {}", action, path.display(), e),
    }
}
