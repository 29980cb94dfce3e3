//! Soft-limit overflow reporting.
//!
//! Crossing the soft limit is a performance smell (some language is
//! registering kinds dynamically), not an error. It is reported exactly once
//! per registry, from a background thread so registration never waits on
//! the sink.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{error, warn};

use crate::kind::Language;

/// Diagnostic emitted when a registry crosses its soft limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverflowReport {
    pub live_count: usize,
    pub soft_limit: usize,
    /// Language with the most live registrations.
    pub dominant_language: Language,
    pub dominant_count: usize,
}

/// Receiver of overflow reports.
pub trait OverflowSink: Send + Sync + 'static {
    fn report(&self, report: &OverflowReport);
}

impl<F> OverflowSink for F
where
    F: Fn(&OverflowReport) + Send + Sync + 'static,
{
    fn report(&self, report: &OverflowReport) {
        self(report);
    }
}

/// Default sink: a `warn!` event.
pub struct TracingOverflowSink;

impl OverflowSink for TracingOverflowSink {
    fn report(&self, report: &OverflowReport) {
        warn!(
            live = report.live_count,
            limit = report.soft_limit,
            language = %report.dominant_language,
            registered = report.dominant_count,
            "too many syntax kinds registered; `{}` registered most of them",
            report.dominant_language,
        );
    }
}

pub(crate) struct OverflowMonitor {
    soft_limit: usize,
    reported: AtomicBool,
    sink: Arc<dyn OverflowSink>,
}

impl OverflowMonitor {
    pub(crate) fn new(soft_limit: usize, sink: Arc<dyn OverflowSink>) -> Self {
        OverflowMonitor {
            soft_limit,
            reported: AtomicBool::new(false),
            sink,
        }
    }

    /// Build a report if `live` reached the limit and none was built yet.
    ///
    /// Called with the writer lock held, so `per_language` is consistent.
    pub(crate) fn check(
        &self,
        live: usize,
        per_language: &FxHashMap<Language, usize>,
    ) -> Option<OverflowReport> {
        if live < self.soft_limit || self.reported.swap(true, Ordering::AcqRel) {
            return None;
        }
        let (dominant_language, dominant_count) = per_language
            .iter()
            .max_by(|(la, ca), (lb, cb)| ca.cmp(cb).then_with(|| lb.cmp(la)))
            .map_or((Language::ANY, 0), |(lang, count)| (lang.clone(), *count));
        Some(OverflowReport {
            live_count: live,
            soft_limit: self.soft_limit,
            dominant_language,
            dominant_count,
        })
    }

    /// Deliver `report` to the sink off the calling thread.
    pub(crate) fn dispatch(&self, report: OverflowReport) {
        let sink = Arc::clone(&self.sink);
        let spawned = std::thread::Builder::new()
            .name("tessel-kind-overflow".to_owned())
            .spawn(move || sink.report(&report));
        if let Err(err) = spawned {
            error!(%err, "could not spawn kind overflow reporter");
        }
    }
}
