//! Progress and diagnostic hooks.
//!
//! The chain never prints. It calls a [`SamplerObserver`] after every
//! iteration and hands it an [`IterationReport`] at every checkpoint; what
//! happens to either is up to the observer.

use super::hyper::{FeatureHyper, ResampleStats};
use crate::metrics::Evaluation;
use std::fmt;
use std::io;

/// Diagnostics gathered at a checkpoint iteration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IterationReport {
    /// 1-based iteration.
    pub iteration: usize,
    /// Log posterior of the current assignment, before hyperparameter
    /// resampling.
    pub log_posterior: f64,
    /// Scores of the current assignment, when gold tags are available.
    pub evaluation: Option<Evaluation>,
    /// Annealing factor of this iteration.
    pub temperature: f64,
    /// Class concentration after resampling.
    pub class_hyper: f64,
    /// Feature concentrations after resampling, one per channel.
    pub feature_hypers: Vec<FeatureHyper>,
    /// Metropolis-Hastings acceptance counts.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub acceptance: ResampleStats,
}

impl fmt::Display for IterationReport {
    /// Tab-separated: iteration, log posterior, [many-to-one, V-measure],
    /// temperature, class concentration, one column per channel.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.iteration, self.log_posterior)?;
        if let Some(e) = &self.evaluation {
            write!(f, "\t{}\t{}", e.many_to_one, e.v_measure)?;
        }
        write!(f, "\t{}\t{}", self.temperature, self.class_hyper)?;
        for h in &self.feature_hypers {
            write!(f, "\t{h}")?;
        }
        Ok(())
    }
}

/// Receives progress from a running chain.
pub trait SamplerObserver {
    /// Called after every iteration.
    fn on_iteration(&mut self, _iteration: usize, _total: usize) {}

    /// Called at every checkpoint, after hyperparameter resampling.
    fn on_report(&mut self, _report: &IterationReport) {}
}

/// Ignores everything.
impl SamplerObserver for () {}

/// Forwards reports to the `log` facade: `info` for checkpoints, `trace`
/// for plain iterations.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl SamplerObserver for LogObserver {
    fn on_iteration(&mut self, iteration: usize, total: usize) {
        log::trace!("iter {iteration}/{total}");
    }

    fn on_report(&mut self, report: &IterationReport) {
        log::info!("{}", log_line(report));
    }
}

fn log_line(report: &IterationReport) -> String {
    let mut line = format!("{} - logP: {:.4}", report.iteration, report.log_posterior);
    if let Some(e) = &report.evaluation {
        line.push_str(&format!("\tM-1: {:.2}\tVM: {:.2}", e.many_to_one, e.v_measure));
    }
    line.push_str(&format!(
        "\ttemp: {:.4}\thyperClass: {:.6}\thyperFeats:",
        report.temperature, report.class_hyper
    ));
    for h in &report.feature_hypers {
        line.push_str(&format!(" {h}"));
    }
    line
}

/// Writes one tab-separated line per report.
///
/// The first write error is kept and every later report is dropped;
/// [`finish`](Self::finish) surfaces it.
#[derive(Debug)]
pub struct WriterObserver<W: io::Write> {
    writer: W,
    error: Option<io::Error>,
}

impl<W: io::Write> WriterObserver<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
        }
    }

    /// Flush and return the writer, or the first error hit while writing.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: io::Write> SamplerObserver for WriterObserver<W> {
    fn on_report(&mut self, report: &IterationReport) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = writeln!(self.writer, "{report}") {
            self.error = Some(err);
        }
    }
}
