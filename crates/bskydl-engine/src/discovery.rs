use std::future::Future;
use std::time::Duration;

use bskydl_dom::Document;
use bskydl_dom::NodeId;
use tokio::time::MissedTickBehavior;

use crate::affordance::AttachOutcome;
use crate::engine::Engine;

/// Attribute set on every image the scan has handled.
pub const PROCESSED_MARKER: &str = "processed";

/// Counters for one pass over the document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Thumbnail images seen.
    pub scanned: usize,
    pub attached: usize,
    pub already_processed: usize,
    /// Images without an `alt` attribute: video posters, not post images.
    pub without_alt: usize,
    /// Images handled but left without a button.
    pub unresolved: usize,
}

/// Images whose `src` starts with `prefix`, in document order.
#[must_use]
pub fn find_candidates(doc: &Document, prefix: &str) -> Vec<NodeId> {
    doc.elements_by_tag(doc.root(), "img")
        .filter(|img| doc.attr(*img, "src").is_some_and(|src| src.starts_with(prefix)))
        .collect()
}

impl Engine {
    /// One discovery pass.
    ///
    /// Every unprocessed thumbnail that has an `alt` attribute gets a
    /// button attached (when its post can be resolved) and is then marked
    /// processed, so later passes skip it for as long as the node lives.
    /// A node the page re-renders is a new node and is handled again.
    pub fn tick(&mut self, doc: &mut Document, page_path: &str) -> TickReport {
        let mut report = TickReport::default();
        let pruned = self.prune(doc);
        if pruned > 0 {
            tracing::debug!(pruned, "dropped affordances for removed buttons");
        }

        let candidates = find_candidates(doc, &self.options.thumbnail_prefix);
        report.scanned = candidates.len();

        for image in candidates {
            if !doc.has_attr(image, "alt") {
                report.without_alt += 1;
                continue;
            }
            if doc.has_attr(image, PROCESSED_MARKER) {
                report.already_processed += 1;
                continue;
            }

            match self.attach(doc, image, page_path) {
                AttachOutcome::Attached { .. } => {
                    report.attached += 1;
                    if let Some(src) = doc.attr(image, "src") {
                        tracing::info!("Added download button to {src}");
                    }
                }
                outcome => {
                    report.unresolved += 1;
                    tracing::debug!(?outcome, "image left without a download button");
                }
            }

            doc.set_attr(image, PROCESSED_MARKER, "");
        }

        report
    }
}

/// Fixed-period driver for discovery passes.
///
/// Passes run on the caller's task one after another, so they can never
/// overlap; if a pass runs long, missed periods are skipped rather than
/// bunched up.
#[derive(Clone, Copy, Debug)]
pub struct DiscoveryLoop {
    period: Duration,
    max_ticks: Option<u64>,
}

impl DiscoveryLoop {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            max_ticks: None,
        }
    }

    /// Stop after `ticks` passes instead of waiting for shutdown.
    #[must_use]
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    /// Call `on_tick` once per period until `shutdown` resolves or the
    /// tick limit is reached. Returns the number of ticks run.
    pub async fn run<F, S>(&self, mut on_tick: F, shutdown: S) -> u64
    where
        F: FnMut(u64),
        S: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let mut ticks = 0;
        loop {
            if self.max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }
            tokio::select! {
                () = &mut shutdown => break,
                _ = interval.tick() => {
                    on_tick(ticks);
                    ticks += 1;
                }
            }
        }
        ticks
    }
}
