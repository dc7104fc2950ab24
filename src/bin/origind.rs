//! `origind` — the preforking origin server daemon. Loads `origind.yaml`
//! (or the path given via `--config`), lets CLI flags override individual
//! fields, then hands off to the supervisor for the rest of the process's
//! life.

use clap::Parser;
use origin_server::config::{load_config, DaemonConfig};
use origin_server::prelude::{error, info, Result};
use origin_server::supervisor;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "origind", about = "Preforking HTTP origin server")]
struct Cli {
    #[arg(long, default_value = "origind.yaml")]
    config: PathBuf,

    #[arg(long)]
    listen_port: Option<u16>,

    #[arg(long)]
    worker_count: Option<u32>,

    #[arg(long)]
    document_root: Option<String>,

    #[arg(long)]
    plugin_path: Option<String>,

    #[arg(long)]
    kv_store_path: Option<String>,
}

impl Cli {
    fn apply_overrides(&self, mut config: DaemonConfig) -> DaemonConfig {
        if let Some(v) = self.listen_port {
            config.listen_port = v;
        }
        if let Some(v) = self.worker_count {
            config.worker_count = v;
        }
        if let Some(v) = &self.document_root {
            config.document_root = v.clone();
        }
        if let Some(v) = &self.plugin_path {
            config.plugin_path = v.clone();
        }
        if let Some(v) = &self.kv_store_path {
            config.kv_store_path = v.clone();
        }
        config
    }
}

fn main() {
    if let Err(e) = run() {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let config = cli.apply_overrides(config);

    info!("starting with document_root={:?} plugin_path={:?}", config.document_root, config.plugin_path);
    supervisor::run(&config)
}
