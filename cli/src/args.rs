//! Command-line arguments and how they override the config file.

use anyhow::{bail, Result};
use clap::Parser;
use leadscout_core::{AppConfig, City, Niche, SourceKind};
use leadscout_pipeline::RunConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
#[command(name = "leadscout")]
#[command(about = "Collect a lead dataset of local businesses in Baden-Württemberg")]
#[command(version)]
pub struct Cli {
    /// Data source: google (Places API, needs a key) or osm (free)
    #[arg(long, value_name = "SOURCE")]
    pub source: Option<SourceKind>,

    /// Config file (defaults to the user config directory)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Global lead budget, counting leads from resumed runs
    #[arg(long, value_name = "N")]
    pub max_leads: Option<usize>,

    /// Visit each website looking for a contact email
    #[arg(long, value_name = "BOOL")]
    pub extract_emails: Option<bool>,

    /// Minimum seconds between source API calls
    #[arg(long, value_name = "SECS")]
    pub sleep_api: Option<f64>,

    /// Minimum seconds between website fetches
    #[arg(long, value_name = "SECS")]
    pub sleep_web: Option<f64>,

    /// CSV dataset to write
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Checkpoint file
    #[arg(long, value_name = "PATH")]
    pub checkpoint: Option<PathBuf>,

    /// Delete the checkpoint and start a clean run
    #[arg(long)]
    pub clear_checkpoint: bool,

    /// Ignore any checkpoint and truncate the dataset
    #[arg(long)]
    pub no_resume: bool,

    /// Only collect this niche (repeatable)
    #[arg(long = "niche", value_name = "NICHE")]
    pub niches: Vec<Niche>,

    /// Only collect in this city (repeatable)
    #[arg(long = "city", value_name = "CITY")]
    pub cities: Vec<City>,

    /// After the run, write leads with both website and email to PATH
    #[arg(long, value_name = "PATH")]
    pub export_contactable: Option<PathBuf>,

    /// Print available niches and cities as JSON and exit
    #[arg(long)]
    pub list_options: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

fn seconds(flag: &str, secs: f64) -> Result<Duration> {
    match Duration::try_from_secs_f64(secs) {
        Ok(d) => Ok(d),
        Err(_) => bail!("--{flag} must be a non-negative number of seconds, got {secs}"),
    }
}

impl Cli {
    /// Apply command-line overrides on top of file and environment config.
    pub fn apply(&self, config: &mut AppConfig) -> Result<()> {
        if let Some(kind) = self.source {
            config.source.kind = kind;
        }
        let c = &mut config.collection;
        if let Some(max) = self.max_leads {
            c.max_leads = max;
        }
        if let Some(extract) = self.extract_emails {
            c.extract_emails = extract;
        }
        if let Some(secs) = self.sleep_api {
            c.sleep_api_ms = u64::try_from(seconds("sleep-api", secs)?.as_millis())?;
        }
        if let Some(secs) = self.sleep_web {
            c.sleep_web_ms = u64::try_from(seconds("sleep-web", secs)?.as_millis())?;
        }
        if let Some(path) = &self.output {
            c.output_path.clone_from(path);
        }
        if let Some(path) = &self.checkpoint {
            c.checkpoint_path.clone_from(path);
        }
        if !self.niches.is_empty() {
            c.niches.clone_from(&self.niches);
        }
        if !self.cities.is_empty() {
            c.cities.clone_from(&self.cities);
        }
        Ok(())
    }

    /// Run parameters for the merged config.
    pub fn run_config(&self, config: &AppConfig) -> RunConfig {
        let mut run = RunConfig::from_app_config(config);
        run.resume = !self.no_resume && !self.clear_checkpoint;
        run.clear_checkpoint = self.clear_checkpoint;
        run
    }
}

/// Niches and cities as printed by `--list-options`.
pub fn options_json() -> serde_json::Value {
    serde_json::json!({
        "niches": Niche::ALL.iter().map(Niche::label).collect::<Vec<_>>(),
        "cities": City::ALL.iter().map(City::label).collect::<Vec<_>>(),
    })
}
