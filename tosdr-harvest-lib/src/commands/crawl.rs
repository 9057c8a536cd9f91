use super::Host;
use super::common::{ColorMode, LogLevel, init_logging};
use super::config::Config;
use super::output::write_json;
use super::progress_reporter::ProgressReporter;
use crate::Result;
use crate::crawl::{CrawlReport, Crawler};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use core::time::Duration;
use std::io::Write;

const LOG_TARGET: &str = "     crawl";

/// How long a crawl runs before the progress bar shows up.
const PROGRESS_DELAY: Duration = Duration::from_millis(300);

#[derive(Parser, Debug)]
pub struct CrawlArgs {
    /// Path to configuration file (default is `tosdr-harvest.toml` if present)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Where to write the dataset (overrides the configuration file)
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<Utf8PathBuf>,

    /// Root of the API to crawl (overrides the configuration file)
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Number of concurrent detail requests (overrides the configuration file)
    #[arg(long, short = 'w', value_name = "N")]
    pub workers: Option<usize>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,
}

impl CrawlArgs {
    /// Load the configuration and apply command-line overrides on top of it.
    fn effective_config(&self, base_dir: &Utf8Path) -> Result<Config> {
        let mut config = Config::load(base_dir, self.config.as_ref())?;

        if let Some(output) = &self.output {
            config.output.clone_from(output);
        }

        if let Some(base_url) = &self.base_url {
            config.base_url.clone_from(base_url);
        }

        if let Some(workers) = self.workers {
            config.workers = workers;
        }

        config.validate()?;
        Ok(config)
    }
}

pub async fn process_crawl<H: Host>(host: &mut H, args: &CrawlArgs) -> Result<()> {
    init_logging(args.log_level);

    match crawl(args).await {
        Ok((report, output)) => {
            summarize(host, &report, &output)?;
            Ok(())
        }
        Err(e) => {
            let _ = writeln!(host.error(), "❌ Crawl failed: {e}");
            host.exit(1);
            Err(e)
        }
    }
}

async fn crawl(args: &CrawlArgs) -> Result<(CrawlReport, Utf8PathBuf)> {
    let config = args.effective_config(Utf8Path::new("."))?;
    log::debug!(target: LOG_TARGET, "Effective configuration: {config:?}");

    // Log lines and the progress bar fight over stderr, so only one of them gets it
    let delay = if args.log_level == LogLevel::None {
        PROGRESS_DELAY
    } else {
        Duration::MAX
    };
    let progress = ProgressReporter::new(delay, args.color.use_colors_on_stderr());

    let report = Crawler::new(&config.crawl_settings(), progress)?.run().await?;

    write_json(&report.records, &config.output)?;
    log::info!(target: LOG_TARGET, "Wrote {} record(s) to '{}'", report.kept(), config.output);

    Ok((report, config.output))
}

fn summarize<H: Host>(host: &mut H, report: &CrawlReport, output: &Utf8Path) -> Result<()> {
    let mut out = host.output();

    let _ = writeln!(out, "Saved {} services to {output}", report.kept());
    if report.dropped() > 0 {
        let _ = writeln!(out, "{} of {} services yielded no usable data", report.dropped(), report.discovered);
    }

    if let Some(first) = report.records.first() {
        let _ = writeln!(out, "\nFirst record:\n{}", serde_json::to_string_pretty(first)?);
    }

    Ok(())
}
