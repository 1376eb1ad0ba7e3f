use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What the loop reports once an episode has finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Zero-based episode index.
    pub episode: usize,
    /// Environment steps executed in the episode.
    pub steps: usize,
    pub reward: f32,
    pub rolling_average: f32,
    /// Actions in the order they were applied.
    pub actions: Vec<usize>,
    /// True when the episode ended on `done` rather than the step bound.
    pub terminated: bool,
}

/// Receives one record per finished episode.
pub trait EpisodeSink {
    fn record(&mut self, summary: &EpisodeSummary) -> Result<()>;
}

impl<S: EpisodeSink + ?Sized> EpisodeSink for Box<S> {
    fn record(&mut self, summary: &EpisodeSummary) -> Result<()> {
        (**self).record(summary)
    }
}

/// One tab-separated line: steps, reward, rolling average, the
/// `Actions list:` label, then the action sequence.
pub fn format_record(summary: &EpisodeSummary) -> String {
    format!(
        "{}\t{:?}\t{:?}\tActions list:\t{:?}",
        summary.steps, summary.reward, summary.rolling_average, summary.actions
    )
}

/// Writes [`format_record`] lines to a file, truncating it on creation.
pub struct TextLogSink {
    writer: BufWriter<File>,
}

impl TextLogSink {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        info!("Write episode log to {:?}", path.as_ref());
        Ok(TextLogSink {
            writer: BufWriter::new(file),
        })
    }
}

impl EpisodeSink for TextLogSink {
    fn record(&mut self, summary: &EpisodeSummary) -> Result<()> {
        writeln!(self.writer, "{}", format_record(summary))?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps every summary in memory.
///
/// Clones share the same storage, so a clone handed to the loop can be read
/// back through the one kept by the caller.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    summaries: Arc<Mutex<Vec<EpisodeSummary>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summaries(&self) -> Vec<EpisodeSummary> {
        self.summaries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.summaries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EpisodeSink for MemorySink {
    fn record(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.summaries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(summary.clone());
        Ok(())
    }
}
