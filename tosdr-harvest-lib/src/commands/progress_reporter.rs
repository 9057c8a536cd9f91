//! Stderr progress display for the `crawl` subcommand.

use crate::crawl::{Progress, Throughput};
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinHandle;

const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

const BAR_TEMPLATE: &str = "{prefix:>12.bold.cyan} [{bar:25}] {msg} {eta}";
const BAR_TEMPLATE_PLAIN: &str = "{prefix:>12} [{bar:25}] {msg} {eta}";
const SPINNER_TEMPLATE: &str = "{prefix:>12.bold.cyan} {spinner} {elapsed}: {msg}";
const SPINNER_TEMPLATE_PLAIN: &str = "{prefix:>12} {spinner} {elapsed}: {msg}";

/// What the crawl is doing right now.
#[derive(Debug)]
enum Stage {
    /// Listing walk: pages read and distinct ids found so far.
    Indexing { pages: u32, found: usize },

    /// Detail fetches, counted by the collector.
    Harvesting(Arc<Throughput>),
}

#[derive(Debug)]
struct Shared {
    bar: ProgressBar,
    stage: Mutex<Stage>,

    // `None` keeps the bar hidden for good.
    visible_after: Option<Instant>,
    visible: AtomicBool,
    use_colors: bool,
}

impl Shared {
    fn style(&self, template: &str, plain: &str) -> ProgressStyle {
        let template = if self.use_colors { template } else { plain };
        ProgressStyle::default_bar()
            .template(template)
            .expect("could not create progress bar style")
    }

    fn render(&self) {
        match &*self.stage.lock().expect("lock poisoned") {
            Stage::Indexing { pages, found } => {
                self.bar.set_message(format!("page {pages} - {found} services found"));
            }
            Stage::Harvesting(throughput) => {
                self.bar.set_length(throughput.total());
                self.bar.set_position(throughput.completed());
                self.bar.set_message(throughput.status_line(self.use_colors));
            }
        }
    }

    fn reveal_if_due(&self) {
        if !self.visible.load(Ordering::Relaxed) && self.visible_after.is_some_and(|at| Instant::now() >= at) {
            self.visible.store(true, Ordering::Relaxed);
            self.bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        }
    }
}

/// Progress bar on stderr that only shows itself once a crawl has run for a while.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    shared: Arc<Shared>,
    refresh_task: Arc<JoinHandle<()>>,
}

impl ProgressReporter {
    /// Create a new progress reporter. Must be called from within a tokio runtime.
    ///
    /// The bar becomes visible once `delay` has elapsed. When `use_colors` is
    /// false, the bar is rendered without ANSI styling.
    #[must_use]
    pub fn new(delay: Duration, use_colors: bool) -> Self {
        let shared = Arc::new(Shared {
            bar: ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden()),
            stage: Mutex::new(Stage::Indexing { pages: 0, found: 0 }),
            visible_after: Instant::now().checked_add(delay),
            visible: AtomicBool::new(false),
            use_colors,
        });

        shared.bar.set_style(
            shared
                .style(SPINNER_TEMPLATE, SPINNER_TEMPLATE_PLAIN)
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✔"]),
        );
        shared.bar.enable_steady_tick(REFRESH_INTERVAL);

        Self {
            refresh_task: Arc::new(tokio::spawn(refresh(Arc::clone(&shared)))),
            shared,
        }
    }
}

impl Progress for ProgressReporter {
    fn set_phase(&self, phase: &str) {
        self.shared.bar.set_prefix(phase.to_string());
    }

    fn page_scanned(&self, page: u32, found: usize) {
        *self.shared.stage.lock().expect("lock poisoned") = Stage::Indexing { pages: page, found };
    }

    fn track_throughput(&self, throughput: Arc<Throughput>) {
        self.shared.bar.disable_steady_tick();
        self.shared.bar.set_position(0);
        self.shared
            .bar
            .set_style(self.shared.style(BAR_TEMPLATE, BAR_TEMPLATE_PLAIN).progress_chars("=> "));
        *self.shared.stage.lock().expect("lock poisoned") = Stage::Harvesting(throughput);
    }

    fn println(&self, msg: &str) {
        self.shared.bar.suspend(|| eprintln!("{msg}"));
    }

    fn done(&self) {
        self.refresh_task.abort();
        if self.shared.visible.load(Ordering::Relaxed) {
            self.shared.bar.finish_and_clear();
        }
    }
}

async fn refresh(shared: Arc<Shared>) {
    let mut interval = tokio::time::interval(REFRESH_INTERVAL);
    #[expect(clippy::infinite_loop, reason = "task runs until aborted")]
    loop {
        let _ = interval.tick().await;

        shared.reveal_if_due();
        if shared.visible.load(Ordering::Relaxed) {
            shared.render();
        }
    }
}
