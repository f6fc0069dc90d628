use anyhow::{bail, Context, Result};
use ast::Script;
use change_impact::{analyze_commits, analyze_file, Commit, FileChange};
use config::{convert_json_err, load_config};
use serde::de::DeserializeOwned;
use std::{env, fs::read_to_string, path::Path};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

const USAGE: &str = "usage: cli batch <commits.json> | cli file <src.json> <dst.json>";

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).map_err(|e| convert_json_err(e, &path.display().to_string()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    let config = load_config(Path::new("config.json"))?;
    let options = config.analysis;

    let output = match args.get(1).map(String::as_str) {
        Some("batch") if args.len() == 3 => {
            let commits: Vec<Commit> = read_json(Path::new(&args[2]))?;
            info!(commits = commits.len(), "analyzing batch");
            let report = analyze_commits(&commits, &options);
            serde_json::to_string_pretty(&report)?
        }
        Some("file") if args.len() == 4 => {
            let src: Script = read_json(Path::new(&args[2]))?;
            let dst: Script = read_json(Path::new(&args[3]))?;
            let change = FileChange {
                path: args[3].clone(),
                src,
                dst,
            };
            let report = analyze_file(&change, &options)
                .with_context(|| format!("Failed to analyze {}", change.path))?;
            serde_json::to_string_pretty(&report)?
        }
        _ => bail!(USAGE),
    };

    println!("{}", output);
    Ok(())
}
