use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use chainsweep_exp::{prepare_engine, run_sweep_pipeline, SweepConfig};
use clap::Parser;
use tokio::runtime::Builder;
use tracing::info;

mod logging;

use logging::init_logging;

#[derive(Parser, Debug)]
#[command(
    name = "chainsweep",
    about = "Sweep the chain finder over S_n and plot the ratio of non-unique choices to chain length"
)]
struct Cli {
    /// Upper bound of the sweep: the n in S_n.
    #[arg(short = 'n', long = "symmetric-n", visible_alias = "symmetric_n")]
    symmetric_n: u32,
    /// YAML configuration overriding engine, build and output defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Build root of the engine (overrides `engine.root`).
    #[arg(long)]
    engine_root: Option<PathBuf>,
    /// Directory for the table, chart and sweep report (overrides `output.directory`).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Skip the release build and use the existing engine binary.
    #[arg(long)]
    no_build: bool,
    /// Log level used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = resolve_config(&cli)?;
    // The build runs before the runtime exists so no sweep task can start early.
    let engine = prepare_engine(&config)?;
    let plan = config.plan(cli.symmetric_n);

    let runtime = Builder::new_current_thread().enable_all().build()?;
    let artifacts =
        runtime.block_on(run_sweep_pipeline(Arc::new(engine), &plan, &config.output))?;

    info!(
        rows = artifacts.table.len(),
        table = %artifacts.table_path.display(),
        chart = ?artifacts.chart_path,
        "sweep complete"
    );
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<SweepConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => SweepConfig::load(path)?,
        None => SweepConfig::default(),
    };
    if let Some(root) = &cli.engine_root {
        config.engine.root = root.clone();
    }
    if let Some(out) = &cli.out {
        config.output.directory = out.clone();
    }
    if cli.no_build {
        config.build.enabled = false;
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_bound_is_the_only_required_argument() {
        let cli = Cli::try_parse_from(["chainsweep", "-n", "7"]).unwrap();
        assert_eq!(cli.symmetric_n, 7);
        assert!(cli.config.is_none());
        assert!(!cli.no_build);
        assert_eq!(cli.log_level, "info");
        assert!(Cli::try_parse_from(["chainsweep"]).is_err());
    }

    #[test]
    fn long_form_accepts_both_spellings() {
        let dashed = Cli::try_parse_from(["chainsweep", "--symmetric-n", "6"]).unwrap();
        let underscored = Cli::try_parse_from(["chainsweep", "--symmetric_n", "6"]).unwrap();
        assert_eq!(dashed.symmetric_n, underscored.symmetric_n);
    }

    #[test]
    fn flags_override_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.yaml");
        std::fs::write(&path, "engine:\n  root: /from/file\nsweep:\n  lower: 4\n").unwrap();
        let arg = path.display().to_string();
        let cli = Cli::try_parse_from([
            "chainsweep",
            "-n",
            "9",
            "--config",
            arg.as_str(),
            "--engine-root",
            "/from/flag",
            "--out",
            "/results",
            "--no-build",
        ])
        .unwrap();

        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.engine.root, PathBuf::from("/from/flag"));
        assert_eq!(config.output.directory, PathBuf::from("/results"));
        assert!(!config.build.enabled);
        assert_eq!(config.plan(cli.symmetric_n).range.start, 4);
    }

    #[test]
    fn logging_filter_names_both_crates() {
        assert_eq!(
            logging::default_filter("debug"),
            "chainsweep=debug,chainsweep_exp=debug"
        );
    }
}
