use indicatif::{ProgressBar, ProgressStyle};

/// Receives one tick per completed statement execution.
///
/// Called from whichever worker finished the execution.
pub trait Progress: Send + Sync {
    fn advance(&self);

    fn finish(&self) {}
}

impl Progress for ProgressBar {
    fn advance(&self) {
        self.inc(1);
    }

    fn finish(&self) {
        ProgressBar::finish(self);
    }
}

/// Silent progress sink
pub struct NoProgress;

impl Progress for NoProgress {
    fn advance(&self) {}
}

pub fn progress_bar(label: &str, total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{prefix:.bold} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} transactions ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_prefix(label.to_string());
    pb
}
