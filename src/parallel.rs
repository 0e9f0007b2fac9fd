//! Parallel processing configuration
//!
//! Per-cell reductions run on Rayon's global pool; this module sizes that pool.

use crate::errors::{GridError, Result};
use log::info;
use rayon::ThreadPoolBuilder;

/// Configuration for parallel processing
#[derive(Debug, Clone, Default)]
pub struct ParallelConfig {
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Set up the global Rayon thread pool
    ///
    /// Without an explicit thread count Rayon's default sizing is kept.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ThreadPoolError`] if the pool was already built
    /// or cannot be created.
    pub fn setup_global_pool(&self) -> Result<()> {
        if let Some(num_threads) = self.num_threads {
            ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
                .map_err(|e| {
                    GridError::ThreadPoolError(format!(
                        "Failed to initialize thread pool with {} threads: {}",
                        num_threads, e
                    ))
                })?;
            info!("Configured parallel processing with {} threads", num_threads);
        } else {
            info!("Using default thread pool configuration");
        }
        Ok(())
    }
}

/// Information about the parallel processing environment
#[derive(Debug, Clone)]
pub struct ParallelInfo {
    pub current_threads: usize,
    pub available_cores: usize,
}

pub fn get_parallel_info() -> ParallelInfo {
    ParallelInfo {
        current_threads: rayon::current_num_threads(),
        available_cores: num_cpus::get(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_keeps_rayon_sizing() {
        assert_eq!(ParallelConfig::default().num_threads, None);

        let info = get_parallel_info();
        assert!(info.current_threads >= 1);
        assert!(info.available_cores >= 1);
    }
}
