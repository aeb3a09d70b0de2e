//! Concurrent batch conversion.
//!
//! A fixed pool of workers drains the input list; every job runs the full
//! portrait pipeline independently and failures never cross job boundaries.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, error, info};
use rayon::prelude::*;

use crate::error::PortraitError;
use crate::exif::{decode_file, decode_file_with_exif};
use crate::{save_portrait, PortraitConfig, PortraitConverter};

/// Terminal-state counts for one batch run. Every input path ends up in
/// exactly one of the three buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Portraits written.
    pub converted: usize,
    /// Existing outputs left alone because overwriting was disabled.
    pub skipped: usize,
    /// Jobs that failed to decode, detect, or write.
    pub failed: usize,
}

/// What one job did, for the summary buckets.
enum JobOutcome {
    Written,
    Skipped,
}

/// Converts many images to portraits concurrently.
///
/// Workers share only the read-only converter and the input list; per-job
/// state never outlives its job. Job failures are logged with path context
/// and counted, not propagated — a bad input cannot take down the batch.
pub struct BatchConverter<'a> {
    converter: &'a PortraitConverter,
    workers: usize,
    overwrite: bool,
    use_exif: bool,
    config: PortraitConfig,
}

impl<'a> BatchConverter<'a> {
    /// Create a batch converter with default settings: one worker per
    /// available CPU, no overwriting, EXIF-aware decoding, and the default
    /// portrait configuration.
    pub fn new(converter: &'a PortraitConverter) -> Self {
        Self {
            converter,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            overwrite: false,
            use_exif: true,
            config: PortraitConfig::default(),
        }
    }

    /// Set the number of concurrent workers. Clamped to the input count at
    /// run time.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Overwrite existing output files (default: false — existing outputs
    /// are skipped, not failures).
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Rotate inputs according to their EXIF orientation before detection
    /// (default: true).
    pub fn use_exif(mut self, use_exif: bool) -> Self {
        self.use_exif = use_exif;
        self
    }

    /// Set the portrait configuration applied to every job.
    pub fn config(mut self, config: PortraitConfig) -> Self {
        self.config = config;
        self
    }

    /// Convert every input, writing each result under `outdir` with the
    /// input's file name.
    ///
    /// The output directory is created if absent. Every input reaches a
    /// terminal state exactly once; completion order is unspecified. Errors
    /// returned here are batch-level only (directory creation, pool
    /// startup); per-job failures are in [`BatchSummary::failed`].
    pub fn run(&self, inputs: &[PathBuf], outdir: &Path) -> Result<BatchSummary, PortraitError> {
        self.config.validate()?;
        std::fs::create_dir_all(outdir)?;

        let workers = self.workers.clamp(1, inputs.len().max(1));
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| PortraitError::WorkerPool(e.to_string()))?;

        let converted = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        pool.install(|| {
            inputs.par_iter().for_each(|inpath| {
                let outpath = outdir.join(output_name(inpath));
                match self.convert_one(inpath, &outpath) {
                    Ok(JobOutcome::Written) => {
                        info!(
                            "portrait converted: {} -> {}",
                            inpath.display(),
                            outpath.display()
                        );
                        converted.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(JobOutcome::Skipped) => {
                        skipped.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        error!(
                            "conversion failed: {} -> {}: {e}",
                            inpath.display(),
                            outpath.display()
                        );
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        });

        Ok(BatchSummary {
            converted: converted.into_inner(),
            skipped: skipped.into_inner(),
            failed: failed.into_inner(),
        })
    }

    fn convert_one(&self, inpath: &Path, outpath: &Path) -> Result<JobOutcome, PortraitError> {
        if outpath.exists() {
            if !self.overwrite {
                debug!(
                    "not overwriting existing file: {} -> {}",
                    inpath.display(),
                    outpath.display()
                );
                return Ok(JobOutcome::Skipped);
            }
            debug!(
                "overwriting file: {} -> {}",
                inpath.display(),
                outpath.display()
            );
        }

        let image = if self.use_exif {
            decode_file_with_exif(inpath)?
        } else {
            decode_file(inpath)?
        };

        let portrait = self.converter.portrait(&image, &self.config)?;
        save_portrait(&portrait, outpath)?;
        Ok(JobOutcome::Written)
    }
}

/// Output file name for an input path: its base name, or the whole path
/// rendered flat when it has none.
fn output_name(inpath: &Path) -> PathBuf {
    inpath
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(inpath.to_string_lossy().replace('/', "_")))
}
