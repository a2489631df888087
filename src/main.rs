//! aptprice - apartment price estimation CLI

use apartment_pricing::cli::{
    cmd_engineer, cmd_info, cmd_models, cmd_predict, cmd_train, show_help, train_config, Cli,
    Commands,
};
use clap::Parser;
use colored::*;

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Train {
            config,
            data,
            target,
            models_dir,
            test_size,
            seed,
            full_table_stats,
            only,
        }) => {
            let config = train_config(
                config.as_deref(),
                data,
                target,
                models_dir,
                test_size,
                seed,
                full_table_stats,
                &only,
            )?;
            cmd_train(config)?;
        }
        Some(Commands::Predict { model, models_dir, input, data, output }) => {
            cmd_predict(
                model.as_deref(),
                &models_dir,
                input.as_deref(),
                data.as_deref(),
                output.as_deref(),
            )?;
        }
        Some(Commands::Models { models_dir }) => {
            cmd_models(&models_dir)?;
        }
        Some(Commands::Engineer { data, output, target }) => {
            cmd_engineer(&data, &output, &target)?;
        }
        Some(Commands::Info { data }) => {
            cmd_info(&data)?;
        }
        None => show_help(),
    }
    Ok(())
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "apartment_pricing=info".into()),
        )
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!();
        eprintln!("  {} {:#}", "error".red().bold(), e);
        eprintln!();
        std::process::exit(1);
    }
}
