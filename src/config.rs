use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::thread;

/// Name of the output subdirectory created inside the input directory.
pub const OUTPUT_SUBDIR: &str = "dist";

/// Default render stride: every 8th pose file becomes a frame.
pub const DEFAULT_RENDER_STRIDE: usize = 8;

fn default_pool_size() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Configuration for one batch run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory containing the input artifacts (images or pose JSON).
    pub input_dir: PathBuf,
    /// Directory outputs are written to. Defaults to `<input_dir>/dist`.
    pub output_dir: PathBuf,
    /// Number of concurrently running workers.
    pub pool_size: usize,
    /// Every `stride`-th entry of the job list becomes a job.
    pub stride: NonZeroUsize,
}

impl RunConfig {
    /// Build a config for `input_dir` with a full-CPU pool and stride 1.
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        let input_dir = input_dir.into();
        let output_dir = input_dir.join(OUTPUT_SUBDIR);
        Self {
            input_dir,
            output_dir,
            pool_size: default_pool_size(),
            stride: NonZeroUsize::MIN,
        }
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = NonZeroUsize::new(stride).unwrap_or(NonZeroUsize::MIN);
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
