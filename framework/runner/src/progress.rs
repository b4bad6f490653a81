use indicatif::{ProgressBar, ProgressState, ProgressStyle};
use perf_tunnel_core::prelude::DelegatedShutdownListener;
use std::cmp::min;
use std::fmt::Write;
use std::time::{Duration, Instant};

/// Displays a progress bar while the run is going to show the user how long is left.
pub(crate) fn start_progress(
    planned_runtime: Duration,
    mut shutdown_listener: DelegatedShutdownListener,
) -> anyhow::Result<()> {
    let hours = planned_runtime.as_secs() / 3600;
    let minutes = (planned_runtime.as_secs() % 3600) / 60;
    let seconds = planned_runtime.as_secs() % 60;
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{wide_bar:.cyan/blue}] [{elapsed_precise} / {planned_runtime}]",
    )?
    .with_key(
        "planned_runtime",
        move |_state: &ProgressState, w: &mut dyn Write| {
            // Writing to the bar's buffer cannot fail
            let _ = write!(w, "{hours:02}:{minutes:02}:{seconds:02}");
        },
    )
    .progress_chars("#>-");

    std::thread::Builder::new()
        .name("progress".to_string())
        .spawn(move || {
            let start_time = Instant::now();
            let pb = ProgressBar::new(planned_runtime.as_secs());
            pb.set_style(style);

            loop {
                let new = min(start_time.elapsed().as_secs(), planned_runtime.as_secs());
                pb.set_position(new);

                if shutdown_listener.should_shutdown() || new >= planned_runtime.as_secs() {
                    log::trace!("Progress thread shutting down");
                    pb.finish_and_clear();
                    break;
                }

                std::thread::sleep(Duration::from_secs(1));
            }
        })?;

    Ok(())
}
