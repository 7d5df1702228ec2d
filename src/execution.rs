//! Row-parallel execution
//!
//! Both SpGEMM phases are a loop over independent output rows. The executor
//! runs that loop either on the caller's thread or on a rayon pool, giving
//! each worker its own scratch state (`init`) that it reuses across rows.
//! Every call returns only after all rows have finished.
//!
//! A configured thread count equal to the current rayon pool's runs on that
//! pool. Any other count gets a dedicated pool, built once per thread count
//! and shared by every executor that asks for it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use tracing::{debug, warn};

use crate::error::Result;
use crate::matrix::config::{ExecutionSpace, SpgemmConfig};

static POOLS: OnceLock<Mutex<HashMap<usize, Arc<ThreadPool>>>> = OnceLock::new();

fn shared_pool(n_threads: usize) -> std::result::Result<Arc<ThreadPool>, ThreadPoolBuildError> {
    let mut pools = POOLS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(pool) = pools.get(&n_threads) {
        return Ok(Arc::clone(pool));
    }

    let pool = Arc::new(ThreadPoolBuilder::new().num_threads(n_threads).build()?);
    debug!(n_threads, "built dedicated rayon pool");
    pools.insert(n_threads, Arc::clone(&pool));
    Ok(pool)
}

pub(crate) struct Executor {
    space: ExecutionSpace,
    pool: Option<Arc<ThreadPool>>,
}

impl Executor {
    pub fn new(config: &SpgemmConfig) -> Self {
        let pool = match config.execution {
            ExecutionSpace::Serial => None,
            ExecutionSpace::Parallel => {
                let n_threads = config.system_params.n_threads.max(1);
                if n_threads == rayon::current_num_threads() {
                    None
                } else {
                    match shared_pool(n_threads) {
                        Ok(pool) => Some(pool),
                        Err(err) => {
                            warn!(%err, n_threads, "could not build a dedicated pool, using the global rayon pool");
                            None
                        }
                    }
                }
            }
        };

        Self {
            space: config.execution,
            pool,
        }
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Computes `f(scratch, row)` for every row in `0..n_rows`
    pub fn map_rows<W, R, INIT, F>(&self, n_rows: usize, init: INIT, f: F) -> Vec<R>
    where
        R: Send,
        INIT: Fn() -> W + Sync + Send,
        F: Fn(&mut W, usize) -> R + Sync + Send,
    {
        match self.space {
            ExecutionSpace::Serial => {
                let mut scratch = init();
                (0..n_rows).map(|i| f(&mut scratch, i)).collect()
            }
            ExecutionSpace::Parallel => self.install(|| {
                (0..n_rows)
                    .into_par_iter()
                    .map_init(init, |scratch, i| f(scratch, i))
                    .collect()
            }),
        }
    }

    /// Runs `f(scratch, row, item)` for every per-row item, stopping at the
    /// first error
    pub fn try_for_each_row<W, I, INIT, F>(&self, items: Vec<I>, init: INIT, f: F) -> Result<()>
    where
        I: Send,
        INIT: Fn() -> W + Sync + Send,
        F: Fn(&mut W, usize, I) -> Result<()> + Sync + Send,
    {
        match self.space {
            ExecutionSpace::Serial => {
                let mut scratch = init();
                items
                    .into_iter()
                    .enumerate()
                    .try_for_each(|(i, item)| f(&mut scratch, i, item))
            }
            ExecutionSpace::Parallel => self.install(|| {
                items
                    .into_par_iter()
                    .enumerate()
                    .try_for_each_init(init, |scratch, (i, item)| f(scratch, i, item))
            }),
        }
    }
}
