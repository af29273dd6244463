//! Site frontier: the deduplicated registry of known sites
//!
//! Every site the crawler has ever heard of is in exactly one of three
//! states: queued (waiting in the FIFO site queue), in progress (its
//! sitemap pass is running), or done (passed at least once). Discovery
//! checks membership and enqueues in a single critical section, so a
//! site can never be queued twice no matter how the crawl loops
//! interleave, and `Done` is terminal for the life of the process.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use super::Site;

/// Crawl state of a known site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteState {
    /// Waiting in the site queue
    Queued,
    /// Sitemap pass currently running
    InProgress,
    /// Sitemap pass finished, successfully or not
    Done,
}

impl SiteState {
    /// True once a site will never be crawled again this run
    pub fn is_terminal(&self) -> bool {
        matches!(self, SiteState::Done)
    }
}

#[derive(Debug, Default)]
struct FrontierInner {
    queue: VecDeque<Site>,
    states: HashMap<Site, SiteState>,
}

/// Deduplicated three-state site registry with a FIFO work queue
///
/// Shared between the crawl loops behind an `Arc`; all mutation happens
/// inside short lock-held sections with no suspension points.
#[derive(Debug, Default)]
pub struct SiteFrontier {
    inner: Mutex<FrontierInner>,
}

impl SiteFrontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues every genuinely new candidate site
    ///
    /// Candidates that are already queued, in progress, or done are
    /// skipped, as are identifiers that cannot name a site: empty
    /// strings and anything path-like. Returns how many candidates
    /// were newly queued.
    pub fn discover(&self, candidates: &[Site]) -> usize {
        let mut inner = self.inner.lock().unwrap();
        let mut added = 0;
        for candidate in candidates {
            if !is_single_component(candidate) || inner.states.contains_key(candidate) {
                continue;
            }
            inner
                .states
                .insert(candidate.clone(), SiteState::Queued);
            inner.queue.push_back(candidate.clone());
            added += 1;
        }
        added
    }

    /// Takes the oldest queued site, if any, marking it in progress
    pub fn try_take(&self) -> Option<Site> {
        let mut inner = self.inner.lock().unwrap();
        let site = inner.queue.pop_front()?;
        inner.states.insert(site.clone(), SiteState::InProgress);
        Some(site)
    }

    /// Waits until a site is queued, then takes it
    ///
    /// The wait polls at `poll` intervals rather than blocking on a
    /// wake signal; an idle frontier costs one check per interval.
    pub async fn take_next(&self, poll: Duration) -> Site {
        loop {
            if let Some(site) = self.try_take() {
                return site;
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Moves an in-progress site to done
    ///
    /// Done is permanent: calls for queued, done, or unknown sites
    /// change nothing.
    pub fn mark_done(&self, site: &str) {
        let mut inner = self.inner.lock().unwrap();
        if inner.states.get(site) == Some(&SiteState::InProgress) {
            inner.states.insert(site.to_string(), SiteState::Done);
        }
    }

    /// Current state of a site, `None` if it was never discovered
    pub fn state(&self, site: &str) -> Option<SiteState> {
        self.inner.lock().unwrap().states.get(site).copied()
    }

    /// Number of sites waiting in the queue
    pub fn queued_len(&self) -> usize {
        self.inner.lock().unwrap().queue.len()
    }

    /// (queued, in-progress, done) counts across all known sites
    pub fn counts(&self) -> (usize, usize, usize) {
        let inner = self.inner.lock().unwrap();
        let mut counts = (0, 0, 0);
        for state in inner.states.values() {
            match state {
                SiteState::Queued => counts.0 += 1,
                SiteState::InProgress => counts.1 += 1,
                SiteState::Done => counts.2 += 1,
            }
        }
        counts
    }
}

/// True when the identifier is exactly one path component
///
/// A site doubles as a directory name under the data root; separators
/// and relative components disqualify a candidate.
fn is_single_component(site: &str) -> bool {
    !site.is_empty() && !site.contains('/') && site != "." && site != ".."
}
