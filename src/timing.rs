//! Timing and provenance log.
//!
//! Every phase that completes successfully appends one block:
//!
//! ```text
//! features: 12.345s (start 2026-10-17T09:00:00Z end 2026-10-17T09:00:12Z)
//! revision: 3f2c... Tune metric normalisation
//!
//! ```
//!
//! Failed phases append nothing. The log is never truncated, rotated or
//! read back.

use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::git::{Revision, RevisionSource};
use crate::{mlog, mlog_warn, Result};

/// One successfully completed phase.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub elapsed: Duration,
    pub revision: Revision,
}

impl LogEntry {
    pub fn render(&self) -> String {
        format!(
            "{}: {:.3}s (start {} end {})\nrevision: {}\n\n",
            self.label,
            self.elapsed.as_secs_f64(),
            self.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.end.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.revision
        )
    }
}

/// Append-only destination for timing blocks.
pub trait LogSink {
    /// Make sure the log exists without touching existing content.
    fn ensure(&mut self) -> Result<()>;
    fn append(&mut self, block: &str) -> Result<()>;
}

/// Timing log on disk. Each append opens, appends and closes the file.
#[derive(Debug, Clone)]
pub struct FileLogSink {
    path: PathBuf,
}

impl FileLogSink {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<std::fs::File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?)
    }
}

impl LogSink for FileLogSink {
    fn ensure(&mut self) -> Result<()> {
        self.open().map(|_| ())
    }

    fn append(&mut self, block: &str) -> Result<()> {
        let mut file = self.open()?;
        file.write_all(block.as_bytes())?;
        Ok(())
    }
}

/// In-memory log; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogSink {
    blocks: Rc<RefCell<Vec<String>>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> Vec<String> {
        self.blocks.borrow().clone()
    }

    pub fn contents(&self) -> String {
        self.blocks.borrow().concat()
    }
}

impl LogSink for MemoryLogSink {
    fn ensure(&mut self) -> Result<()> {
        Ok(())
    }

    fn append(&mut self, block: &str) -> Result<()> {
        self.blocks.borrow_mut().push(block.to_string());
        Ok(())
    }
}

pub struct TimingLogger {
    sink: Box<dyn LogSink>,
    revision: Box<dyn RevisionSource>,
}

impl TimingLogger {
    pub fn new(sink: Box<dyn LogSink>, revision: Box<dyn RevisionSource>) -> Self {
        Self { sink, revision }
    }

    /// Run `f` and, only if it succeeds, append a timing block for `label`.
    pub fn with_timing<T, F>(&mut self, label: &str, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        self.sink.ensure()?;
        let start = Utc::now();
        let clock = Instant::now();
        mlog!("Phase '{}' started", label);

        let value = f()?;

        let entry = LogEntry {
            label: label.to_string(),
            start,
            end: Utc::now(),
            elapsed: clock.elapsed(),
            revision: self.current_revision(),
        };
        self.sink.append(&entry.render())?;
        mlog!(
            "Phase '{}' finished in {:.3}s",
            label,
            entry.elapsed.as_secs_f64()
        );
        Ok(value)
    }

    fn current_revision(&self) -> Revision {
        self.revision.revision().unwrap_or_else(|e| {
            mlog_warn!("Could not read revision for timing log: {}", e);
            Revision::unknown()
        })
    }
}
