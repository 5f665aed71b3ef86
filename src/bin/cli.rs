//! report-nav CLI
//!
//! Runs one navigation session against the configured site and prints the
//! structured result as JSON. The exit code follows the status: 0 for 200,
//! 2 for 400 and 1 for anything else.

use anyhow::{Context, bail};
use clap::Parser;
use report_nav::{ChromeProvider, EnvSecretStore, FileSecretStore, FlowConfig, Handler, LaunchOptions, SecretStore};
use serde_json::json;
use std::{path::PathBuf, process::ExitCode, time::Duration};

#[derive(Parser)]
#[command(name = "report-nav")]
#[command(version)]
#[command(about = "Navigate a headless browser to the attendance report behind a login", long_about = None)]
struct Cli {
    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH", env = "CHROME_PATH")]
    executable_path: Option<PathBuf>,

    /// Writable directory for the browser profile, data and cache
    #[arg(long, value_name = "DIR", env = "REPORT_NAV_WRITABLE_ROOT", default_value = "/tmp")]
    writable_root: PathBuf,

    /// Site origin (overrides REPORT_NAV_BASE_URL)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Report tab to select (overrides REPORT_NAV_TAB)
    #[arg(long, value_name = "LABEL")]
    tab: Option<String>,

    /// Secret id of the credentials (overrides SECRET_NAME)
    #[arg(long, value_name = "ID")]
    secret_id: Option<String>,

    /// Region of the secret (overrides REGION)
    #[arg(long)]
    region: Option<String>,

    /// Directory laid out as <dir>/<region>/<secret-id>.json
    #[arg(long, value_name = "DIR", env = "REPORT_NAV_SECRETS_DIR", conflicts_with = "secret_env")]
    secrets_dir: Option<PathBuf>,

    /// Environment variable holding the credentials JSON
    #[arg(long, value_name = "VAR")]
    secret_env: Option<String>,

    /// Overall time limit in seconds (overrides REPORT_NAV_DEADLINE_SECS)
    #[arg(long, value_name = "SECS")]
    deadline: Option<u64>,

    /// Pretty-print the result
    #[arg(long)]
    pretty: bool,
}

impl Cli {
    fn flow_config(&self) -> anyhow::Result<FlowConfig> {
        let mut config = FlowConfig::from_env().context("Failed to load configuration from environment")?;

        if let Some(base_url) = &self.base_url {
            config = config.base_url(base_url);
        }
        if let Some(tab) = &self.tab {
            config = config.tab_label(tab);
        }
        if let Some(secret_id) = &self.secret_id {
            config = config.secret_id(secret_id);
        }
        if let Some(region) = &self.region {
            config = config.region(region);
        }
        if let Some(secs) = self.deadline {
            config = config.deadline(Duration::from_secs(secs));
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    fn launch_options(&self) -> LaunchOptions {
        let mut options = LaunchOptions::new().headless(!self.headed).writable_root(&self.writable_root);
        if let Some(path) = &self.executable_path {
            options = options.chrome_path(path);
        }
        options
    }

    fn secret_store(&self) -> anyhow::Result<Box<dyn SecretStore>> {
        match (&self.secrets_dir, &self.secret_env) {
            (Some(dir), _) => Ok(Box::new(FileSecretStore::new(dir))),
            (None, Some(variable)) => Ok(Box::new(EnvSecretStore::new(variable))),
            (None, None) => bail!("No credential source: pass --secrets-dir or --secret-env"),
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.flow_config()?;
    let secrets = cli.secret_store()?;
    let options = cli.launch_options();

    log::info!(
        "Starting session against {} ({} browser)",
        config.base_url,
        if options.headless { "headless" } else { "headed" }
    );

    let handler = Handler::new(config, secrets, ChromeProvider::new(options));
    let result = handler.handle(&json!({}), &json!({"source": "cli"}));

    let output = if cli.pretty { serde_json::to_string_pretty(&result)? } else { serde_json::to_string(&result)? };
    println!("{}", output);

    Ok(match result.status_code {
        200 => ExitCode::SUCCESS,
        400 => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    })
}
