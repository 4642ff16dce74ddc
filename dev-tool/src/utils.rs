use indicatif::{ProgressBar, ProgressStyle};

/// Shows a spinner while a ratings file is read or split.
///
/// The spinner ticks on its own, the caller clears it once the work is done.
pub(crate) fn file_spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner().with_style(
        ProgressStyle::default_spinner().template("{spinner:.green} {msg} ({elapsed})"),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(120);
    spinner
}

/// Creates a progress bar counting the iterations of a training.
pub(crate) fn iteration_progress(iterations: usize) -> ProgressBar {
    ProgressBar::new(iterations as u64).with_style(
        ProgressStyle::default_bar()
            .template("{msg} {wide_bar} {pos}/{len} ({elapsed_precise})")
            .progress_chars("=> "),
    )
}
