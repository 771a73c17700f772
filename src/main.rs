//! Collate - A build engine for module-organized css, js and templates.

#![allow(dead_code)]

mod adapter;
mod asset;
mod cli;
mod collation;
mod config;
mod embed;
mod error;
mod freshness;
mod logger;
mod module;
mod output;
mod template;
mod utils;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands, build::Collate};
use config::CollateConfig;

fn main() {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    if let Err(e) = run(&cli) {
        log!("error"; "{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let build_args = cli.command.build_args().cloned().unwrap_or_default();
    logger::set_verbose(build_args.verbose);

    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let config = CollateConfig::load(&cwd, &cli.config)?;

    match &cli.command {
        Commands::Config { args } => return cli::query::config(&config, args),
        Commands::Modules { args } => {
            return cli::query::modules(&config.settings(None)?, args);
        }
        _ => {}
    }

    let settings = config.settings(build_args.dev.then_some(true))?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async {
        let collate = Collate::new(settings)?;
        match &cli.command {
            Commands::Build { .. } => collate.build().await,
            Commands::Styles { .. } => collate.styles().await.map(drop),
            Commands::Scripts { .. } => collate.scripts().await.map(drop),
            Commands::Mirror { .. } => collate.mirror().await.map(drop),
            Commands::Documents { .. } => collate.documents().await.map(drop),
            Commands::Document { module, doc, .. } => {
                collate.document(module, doc.as_deref()).await.map(drop)
            }
            Commands::Clean { .. } => collate.delete().await,
            Commands::Modules { .. } | Commands::Config { .. } => Ok(()),
        }?;
        collate.context().report.flush();
        Ok::<_, anyhow::Error>(())
    })
}
