//! # knobs-cli
//!
//! Non-interactive front end for the knobs configuration engine: builds a
//! node graph from a declaration file, optionally restores a saved value
//! snapshot, and checks, dumps, or exports the resolved configuration.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use knobs::builder::NodeBuilder;
use knobs::environment::ConfigEnvironment;
use knobs::export::{export, CHeader, ExportFormat, MakefileFragment};
use knobs::snapshot::{load_snapshot, save_snapshot, snapshot};

#[derive(Parser)]
#[command(name = "knobs")]
#[command(about = "Declarative build-configuration engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph, run one refresh, and report diagnostics.
    Check {
        /// Root declaration file.
        root: PathBuf,
        /// Restore a value snapshot before refreshing.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print every resolved term value as JSON.
    Dump {
        root: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Save the resolved values as a snapshot file.
    Snapshot {
        root: PathBuf,
        /// Output path.
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Write a build-system fragment for the resolved configuration.
    Export {
        root: PathBuf,
        /// Output dialect.
        #[arg(long, value_enum)]
        format: Dialect,
        /// Output path.
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Dialect {
    Makefile,
    Header,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .without_time()
        .init();

    match Cli::parse().command {
        Commands::Check { root, config } => {
            let env = load(&root, config.as_ref())?;
            report_diagnostics(&env);
            println!(
                "{} {} nodes resolved",
                "ok:".green().bold(),
                env.nodes().len()
            );
            Ok(())
        }
        Commands::Dump { root, config } => {
            let env = load(&root, config.as_ref())?;
            report_diagnostics(&env);
            serde_json::to_writer_pretty(std::io::stdout().lock(), &snapshot(&env))?;
            println!();
            Ok(())
        }
        Commands::Snapshot { root, out, config } => {
            let env = load(&root, config.as_ref())?;
            report_diagnostics(&env);
            save_snapshot(&env, &out)?;
            println!("{} wrote {}", "ok:".green().bold(), out.display());
            Ok(())
        }
        Commands::Export {
            root,
            format,
            out,
            config,
        } => {
            let env = load(&root, config.as_ref())?;
            report_diagnostics(&env);

            let file = File::create(&out)
                .with_context(|| format!("unable to create {}", out.display()))?;
            let mut writer = BufWriter::new(file);
            let dialect: &dyn ExportFormat = match format {
                Dialect::Makefile => &MakefileFragment,
                Dialect::Header => &CHeader,
            };
            export(&env, dialect, &mut writer)?;
            writer.flush()?;
            println!("{} wrote {}", "ok:".green().bold(), out.display());
            Ok(())
        }
    }
}

fn load(root: &PathBuf, config: Option<&PathBuf>) -> Result<ConfigEnvironment> {
    let env = ConfigEnvironment::new();
    NodeBuilder::build_root(&env, root)
        .with_context(|| format!("failure loading {}", root.display()))?;

    if let Some(config) = config {
        load_snapshot(&env, config)
            .with_context(|| format!("failure restoring {}", config.display()))?;
    } else {
        env.refresh()?;
    }

    Ok(env)
}

fn report_diagnostics(env: &ConfigEnvironment) {
    for diagnostic in env.take_diagnostics() {
        eprintln!("{} {}", "warning:".yellow().bold(), diagnostic);
    }
}
