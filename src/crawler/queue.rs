//! Page work queue
//!
//! Sitemap passes produce page jobs; the page loop consumes them. The
//! queue is a plain mutex-guarded FIFO: pushes and pops are short
//! critical sections with no suspension points, and the consumer polls
//! rather than parking on a wake signal.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::{Site, Slug};

/// A page judged missing or stale by a sitemap pass
///
/// `date` carries the sitemap-declared modification time in epoch
/// milliseconds; after the fetch it becomes the page's stored
/// baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageJob {
    /// Site the page belongs to
    pub site: Site,
    /// Page identifier within the site
    pub slug: Slug,
    /// Sitemap-declared modification time, epoch milliseconds
    pub date: u64,
}

/// Unbounded FIFO queue shared between producer and consumer loops
#[derive(Debug)]
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Appends one work item
    pub fn push(&self, item: T) {
        self.items.lock().unwrap().push_back(item);
    }

    /// Pops the oldest work item, if any
    pub fn try_pop(&self) -> Option<T> {
        self.items.lock().unwrap().pop_front()
    }

    /// Waits until an item is available, polling at `poll` intervals
    pub async fn pop_next(&self, poll: Duration) -> T {
        loop {
            if let Some(item) = self.try_pop() {
                return item;
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::time::timeout;

    fn job(site: &str, slug: &str, date: u64) -> PageJob {
        PageJob {
            site: site.to_string(),
            slug: slug.to_string(),
            date,
        }
    }

    #[test]
    fn pops_in_push_order() {
        let queue = WorkQueue::new();
        queue.push(job("a.example", "welcome", 1_000));
        queue.push(job("a.example", "about", 2_000));
        queue.push(job("b.example", "welcome", 3_000));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.try_pop().unwrap().slug, "welcome");
        assert_eq!(queue.try_pop().unwrap().slug, "about");
        assert_eq!(queue.try_pop().unwrap().site, "b.example");
        assert!(queue.try_pop().is_none());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn pop_next_waits_for_a_push() {
        let queue = Arc::new(WorkQueue::new());
        let producer = Arc::clone(&queue);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            producer.push(job("late.example", "welcome", 1_000));
        });

        let popped = timeout(
            Duration::from_secs(2),
            queue.pop_next(Duration::from_millis(5)),
        )
        .await
        .expect("pop_next should pick up the late push");

        assert_eq!(popped.site, "late.example");
        assert!(queue.is_empty());
    }
}
