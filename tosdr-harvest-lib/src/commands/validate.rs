use super::Host;
use super::config::Config;
use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file (default is `tosdr-harvest.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,
}

pub fn validate_config<H: Host>(host: &mut H, args: &ValidateArgs) -> Result<()> {
    validate_config_in(host, Utf8Path::new("."), args)
}

fn validate_config_in<H: Host>(host: &mut H, base_dir: &Utf8Path, args: &ValidateArgs) -> Result<()> {
    let config_path = args.config.as_ref();

    match Config::load(base_dir, config_path) {
        Ok(config) => {
            let _ = writeln!(host.output(), "Configuration file is valid");
            if let Some(path) = config_path {
                let _ = writeln!(host.output(), "Config file: {path}");
            } else {
                let _ = writeln!(host.output(), "Using configuration from '{base_dir}' (defaults if no file was found)");
            }
            let _ = writeln!(
                host.output(),
                "Crawling {} with {} worker(s), writing to {}",
                config.base_url,
                config.workers,
                config.output
            );
            Ok(())
        }
        Err(e) => {
            let _ = writeln!(host.error(), "❌ Configuration validation failed: {e}");
            host.exit(1);
            Err(e)
        }
    }
}
