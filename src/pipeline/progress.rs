// file: src/pipeline/progress.rs
// description: progress tracking and statistics reporting for embedding builds
// reference: uses indicatif for progress bars and tracks build metrics

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    pub rows_total: usize,
    pub rows_embedded: usize,
    pub batches_completed: usize,
    pub dimension: usize,
    pub duration_secs: f64,
}

impl BuildStats {
    pub fn rows_per_second(&self) -> f64 {
        if self.duration_secs <= 0.0 {
            return 0.0;
        }
        self.rows_embedded as f64 / self.duration_secs
    }
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    rows_total: usize,
    rows_embedded: Arc<AtomicUsize>,
    batches_completed: Arc<AtomicUsize>,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn with_color(total_batches: usize, total_rows: usize, colored: bool) -> Self {
        let multi_progress = MultiProgress::new();

        let main_bar = create_progress_bar(&multi_progress, total_batches as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self::from_bars(main_bar, detail_bar, total_rows)
    }

    /// A tracker that counts but never draws.
    pub fn hidden(total_batches: usize, total_rows: usize) -> Self {
        let main_bar = ProgressBar::with_draw_target(
            Some(total_batches as u64),
            ProgressDrawTarget::hidden(),
        );
        let detail_bar = ProgressBar::hidden();
        Self::from_bars(main_bar, detail_bar, total_rows)
    }

    fn from_bars(main_bar: ProgressBar, detail_bar: ProgressBar, rows_total: usize) -> Self {
        Self {
            main_bar,
            detail_bar,
            rows_total,
            rows_embedded: Arc::new(AtomicUsize::new(0)),
            batches_completed: Arc::new(AtomicUsize::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_batch(&self, rows: usize) {
        self.batches_completed.fetch_add(1, Ordering::SeqCst);
        self.rows_embedded.fetch_add(rows, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Embedding complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> BuildStats {
        BuildStats {
            rows_total: self.rows_total,
            rows_embedded: self.rows_embedded.load(Ordering::SeqCst),
            batches_completed: self.batches_completed.load(Ordering::SeqCst),
            dimension: 0,
            duration_secs: self.start_time.elapsed().as_secs_f64(),
        }
    }

    fn update_detail_bar(&self) {
        let rows = self.rows_embedded.load(Ordering::SeqCst);
        let message = format!("Rows: {}/{}", rows, self.rows_total);
        self.detail_bar.set_message(message);
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    let template = if colored {
        "{spinner:.green} Embedding [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({eta}) {msg}"
    } else {
        "{spinner} Embedding [{elapsed_precise}] [{bar:40}] {pos}/{len} batches ({eta}) {msg}"
    };
    let chars = if colored { "█▓▒░" } else { "=>-" };

    // Templates are static; a bad one falls back to the default style.
    let style = ProgressStyle::default_bar()
        .template(template)
        .map(|s| s.progress_chars(chars))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    if let Ok(style) = ProgressStyle::default_bar().template("{msg}") {
        bar.set_style(style);
    }
    bar
}
