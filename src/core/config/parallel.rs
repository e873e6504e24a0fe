//! Parallel page processing policy.

use serde::{Deserialize, Serialize};

/// Controls how pages of a document are fanned out over rayon.
///
/// Pages are independent, so a document larger than `page_threshold` is
/// processed in parallel; smaller batches run sequentially to avoid the
/// pool overhead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelPolicy {
    /// Maximum number of threads to use for parallel processing.
    /// If None, rayon will use the default thread pool size.
    #[serde(default)]
    pub max_threads: Option<usize>,

    /// Batches with at most this many pages are processed sequentially.
    /// Default: 4
    #[serde(default = "ParallelPolicy::default_page_threshold")]
    pub page_threshold: usize,
}

impl ParallelPolicy {
    /// Create a new ParallelPolicy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of threads.
    pub fn with_max_threads(mut self, max_threads: Option<usize>) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Set the page count threshold.
    pub fn with_page_threshold(mut self, threshold: usize) -> Self {
        self.page_threshold = threshold;
        self
    }

    /// Whether a batch of `pages` pages should use the thread pool.
    pub fn should_parallelize(&self, pages: usize) -> bool {
        pages > self.page_threshold && self.max_threads != Some(1)
    }

    /// Install the global rayon thread pool with the configured number of threads.
    ///
    /// Call once at startup, before any page is processed.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the thread pool was configured
    /// - `Ok(false)` if `max_threads` is None
    /// - `Err` if the global pool was already initialized
    pub fn install_global_thread_pool(&self) -> Result<bool, rayon::ThreadPoolBuildError> {
        match self.max_threads {
            Some(num_threads) => {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build_global()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn default_page_threshold() -> usize {
        4
    }
}

impl Default for ParallelPolicy {
    fn default() -> Self {
        Self {
            max_threads: None,
            page_threshold: Self::default_page_threshold(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parallelize() {
        let policy = ParallelPolicy::new();
        assert!(!policy.should_parallelize(4));
        assert!(policy.should_parallelize(5));
        assert!(!policy.with_max_threads(Some(1)).should_parallelize(50));
    }

    #[test]
    fn test_serde_defaults() {
        let policy: ParallelPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, ParallelPolicy::default());
    }
}
