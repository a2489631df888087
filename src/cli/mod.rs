//! Command-line interface: training, prediction, artifact listing and dataset inspection.

use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{GroupStatsMode, PipelineConfig};
use crate::data::DatasetLoader;
use crate::export::ArtifactStore;
use crate::features::FeatureEngineer;
use crate::inference::{ListingInput, Predictor};
use crate::preprocessing::{ColumnType, FeatureStats};
use crate::training::{Trainer, TrainingReport};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌───────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└───────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├───────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

/// `12345678.9` → `12,345,679`
fn format_egp(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "aptprice")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Apartment price estimation: train candidate models and price listings")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train every candidate model and write the evaluation summary
    Train {
        /// JSON pipeline configuration; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Input data file (CSV or JSON)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Target column name
        #[arg(short, long)]
        target: Option<String>,

        /// Directory for artifacts and the summary
        #[arg(short, long)]
        models_dir: Option<PathBuf>,

        /// Fraction of rows held out for evaluation
        #[arg(long)]
        test_size: Option<f64>,

        /// Seed for the split and the estimators
        #[arg(long)]
        seed: Option<u64>,

        /// Fit group means on the full table instead of the training rows
        #[arg(long)]
        full_table_stats: bool,

        /// Train only these candidates (comma separated)
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,
    },

    /// Estimate prices with a trained model
    Predict {
        /// Artifact to use; defaults to the best one in the models directory
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Directory searched for the best artifact
        #[arg(long, default_value = "models")]
        models_dir: PathBuf,

        /// Single listing as JSON
        #[arg(short, long, conflicts_with = "data")]
        input: Option<PathBuf>,

        /// Table of listings (CSV or JSON)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Output CSV for table predictions
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List trained model artifacts
    Models {
        /// Directory holding the artifacts
        #[arg(long, default_value = "models")]
        models_dir: PathBuf,
    },

    /// Run feature engineering and write the engineered table
    Engineer {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,

        /// Target column name
        #[arg(short, long, default_value = "price_egp")]
        target: String,
    },

    /// Show data information
    Info {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,
    },
}

// ─── Configuration ─────────────────────────────────────────────────────────────

/// Load the optional config file and apply command-line overrides
#[allow(clippy::too_many_arguments)]
pub fn train_config(
    config_path: Option<&Path>,
    data: Option<PathBuf>,
    target: Option<String>,
    models_dir: Option<PathBuf>,
    test_size: Option<f64>,
    seed: Option<u64>,
    full_table_stats: bool,
    only: &[String],
) -> anyhow::Result<PipelineConfig> {
    let mut config = match config_path {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(data) = data { config = config.with_data_path(data); }
    if let Some(target) = target { config = config.with_target(target); }
    if let Some(dir) = models_dir { config = config.with_models_dir(dir); }
    if let Some(test_size) = test_size { config = config.with_test_size(test_size); }
    if let Some(seed) = seed { config = config.with_seed(seed); }
    if full_table_stats {
        config = config.with_group_stats(GroupStatsMode::FullTable);
    }
    if !only.is_empty() {
        let unknown: Vec<&String> = only
            .iter()
            .filter(|name| !config.candidates.iter().any(|c| &c.name == *name))
            .collect();
        if !unknown.is_empty() {
            anyhow::bail!("Unknown candidate(s): {:?}", unknown);
        }
        let candidates = config.registry().retain_names(only).iter().cloned().collect();
        config = config.with_candidates(candidates);
    }

    config.validate()?;
    Ok(config)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(config: PipelineConfig) -> anyhow::Result<()> {
    section("Train");

    step_run("Loading data");
    let start = Instant::now();
    let raw = DatasetLoader::new().load(&config.data_path)?;
    step_done(&format!("{} rows × {} cols in {:?}", raw.height(), raw.width(), start.elapsed()));

    let trainer = Trainer::new(config)?;
    let names = trainer.registry().names().join(", ");
    step_run(&format!("Training {}", names.cyan()));
    let start = Instant::now();
    let report = trainer.train(&raw)?;
    step_done(&format!("{:.2?}", start.elapsed()));

    print_report(&report);
    Ok(())
}

fn print_report(report: &TrainingReport) {
    println!();
    println!("  {:<12} {}", muted("Run"), report.run_id);
    println!("  {:<12} {} train / {} eval", muted("Rows"), report.n_train, report.n_eval);
    println!("  {:<12} {}", muted("Features"), report.n_features);
    println!();

    println!(
        "  {:<20} {:>14} {:>14} {:>8} {:>9}",
        muted("Model"), muted("MAE"), muted("RMSE"), muted("R²"), muted("Time")
    );
    println!("  {}", dim(&"─".repeat(69)));

    for outcome in &report.outcomes {
        match (&outcome.metrics, &outcome.error) {
            (Some(m), _) => println!(
                "  {:<20} {:>14} {:>14} {:>8.4} {:>9.2?}",
                outcome.name,
                format_egp(m.mae),
                format_egp(m.rmse),
                m.r2,
                outcome.elapsed
            ),
            (None, err) => println!(
                "  {:<20} {}",
                outcome.name,
                format!("err: {}", err.as_deref().unwrap_or("unknown")).red()
            ),
        }
    }
    println!("  {}", dim(&"─".repeat(69)));

    if let Some(best) = report.best() {
        let r2 = best.metrics.map(|m| m.r2).unwrap_or(f64::NAN);
        println!();
        println!("  {} {} {} {:.4}", ok("best"), best.name.white().bold(), muted("R²:"), r2);
    }

    println!();
    step_ok(&format!("Summary written to {}", report.summary_path.display()));
    println!();
}

pub fn cmd_predict(
    model: Option<&Path>,
    models_dir: &Path,
    input: Option<&Path>,
    data: Option<&Path>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading model");
    let predictor = match model {
        Some(path) => Predictor::load(path)?,
        None => Predictor::best(models_dir)?,
    };
    step_done(&format!(
        "{} (R² {:.4})",
        predictor.model_name(),
        predictor.metadata().metrics.r2
    ));

    match (input, data) {
        (Some(path), _) => {
            let listing = ListingInput::from_json(&std::fs::read_to_string(path)?)?;
            let prediction = predictor.predict_listing(&listing)?;

            println!();
            line_box_top();
            line_box_empty();
            line_box_center(&format!("{}", "Estimated Price".white().bold()));
            line_box_center(&format!("{} EGP", format_egp(prediction.price_egp).white().bold()));
            line_box_empty();
            line_box_sep();
            line_box_empty();
            line_box(&kv("Model   ", &prediction.model));
            line_box(&kv("Artifact", &predictor.path().display().to_string()));
            if prediction.out_of_distribution {
                line_box(&format!("{}", "bedrooms outside the trained range (2-3)".yellow()));
            }
            line_box_empty();
            line_box_bottom();
            println!();
        }
        (None, Some(path)) => {
            step_run("Loading data");
            let mut raw = DatasetLoader::new().load(path)?;
            step_done(&format!("{} rows × {} cols", raw.height(), raw.width()));

            step_run("Predicting");
            let start = Instant::now();
            let predictions = predictor.predict_frame(&raw)?;
            step_done(&format!("{:?}", start.elapsed()));

            let flagged = predictions.iter().filter(|p| p.out_of_distribution).count();
            println!();
            println!("  {:<6} {:>16}", muted("Row"), muted("Price (EGP)"));
            println!("  {}", dim(&"─".repeat(24)));
            for (i, p) in predictions.iter().take(10).enumerate() {
                let marker = if p.out_of_distribution { " *".yellow() } else { "".normal() };
                println!("  {:<6} {:>16}{}", i, format_egp(p.price_egp), marker);
            }
            if predictions.len() > 10 {
                println!("  {}", dim(&format!("… {} more", predictions.len() - 10)));
            }
            if flagged > 0 {
                println!();
                println!("  {} {} rows outside the trained bedroom range", "*".yellow(), flagged);
            }

            if let Some(out) = output {
                let prices: Vec<f64> = predictions.iter().map(|p| p.price_egp).collect();
                let flags: Vec<bool> = predictions.iter().map(|p| p.out_of_distribution).collect();
                raw.with_column(Column::new("predicted_price_egp".into(), prices))?;
                raw.with_column(Column::new("out_of_distribution".into(), flags))?;

                let mut file = std::fs::File::create(out)?;
                CsvWriter::new(&mut file).finish(&mut raw)?;
                println!();
                step_ok(&format!("Predictions written to {}", out.display()));
            }
            println!();
        }
        (None, None) => anyhow::bail!("Provide a listing with --input or a table with --data"),
    }

    Ok(())
}

pub fn cmd_models(models_dir: &Path) -> anyhow::Result<()> {
    section("Models");

    let store = ArtifactStore::new(models_dir);
    let artifacts = store.list_metadata()?;
    if artifacts.is_empty() {
        println!("  {}", format!("No trained models in {}", models_dir.display()).yellow());
        println!("  {}", dim("run `aptprice train` first"));
        println!();
        return Ok(());
    }

    let best = artifacts
        .iter()
        .max_by(|a, b| a.1.metrics.r2.total_cmp(&b.1.metrics.r2))
        .map(|(path, _)| path.clone());

    println!(
        "  {:<28} {:<18} {:>8} {:>14}  {}",
        muted("Artifact"), muted("Type"), muted("R²"), muted("MAE"), muted("Run")
    );
    println!("  {}", dim(&"─".repeat(86)));

    for (path, meta) in &artifacts {
        let file = path.file_name().and_then(|f| f.to_str()).unwrap_or("?");
        let marker = if Some(path) == best.as_ref() { ok(" best") } else { "".normal() };
        println!(
            "  {:<28} {:<18} {:>8.4} {:>14}  {}{}",
            file,
            meta.model_type,
            meta.metrics.r2,
            format_egp(meta.metrics.mae),
            dim(&meta.run_id),
            marker
        );
    }

    println!();
    Ok(())
}

pub fn cmd_engineer(data_path: &Path, output_path: &Path, target: &str) -> anyhow::Result<()> {
    section("Engineer");

    step_run("Loading data");
    let raw = DatasetLoader::new().load(data_path)?;
    step_done(&format!("{} rows × {} cols", raw.height(), raw.width()));

    step_run("Engineering features");
    let start = Instant::now();
    let engineer = FeatureEngineer::with_target(target);
    let mut engineered = engineer.engineer(&raw);
    step_done(&format!("{:?}", start.elapsed()));

    step_run(&format!("Saving → {}", output_path.display()));
    let mut file = std::fs::File::create(output_path)?;
    CsvWriter::new(&mut file).finish(&mut engineered)?;
    step_done(&format!("{} rows × {} cols", engineered.height(), engineered.width()));

    println!();
    println!("  {:<12} {}", muted("Steps"), engineer.step_names().join(" → "));
    println!("  {:<12} {}", muted("Dropped"), raw.height() - engineered.height());
    println!();
    Ok(())
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Data Info");

    let df = DatasetLoader::new().load(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!("  {:<12} {:.2} MB", muted("Memory"), df.estimated_size() as f64 / 1024.0 / 1024.0);
    println!();

    println!(
        "  {:<24} {:<10} {:>6} {:>8} {:>14} {:>14}",
        muted("Column"), muted("Type"), muted("Nulls"), muted("Unique"), muted("Mean"), muted("Std")
    );
    println!("  {}", dim(&"─".repeat(82)));

    for stats in FeatureStats::for_frame(&df)? {
        let (mean, std) = match stats.kind {
            Some(ColumnType::Numeric) => (
                stats.mean.map(|m| format!("{:.2}", m)).unwrap_or_default(),
                stats.std.map(|s| format!("{:.2}", s)).unwrap_or_default(),
            ),
            _ => (String::new(), String::new()),
        };
        println!(
            "  {:<24} {:<10} {:>6} {:>8} {:>14} {:>14}",
            stats.name,
            stats.dtype.truecolor(140, 140, 140),
            stats.null_count,
            stats.unique_count,
            mean,
            std
        );
    }

    println!();
    Ok(())
}

pub fn show_help() {
    section("Commands");

    let cmds: &[(&str, &str)] = &[
        ("aptprice train", "Train all candidates on the default dataset"),
        ("aptprice train -d data.csv -c config.json", "Train with a config file"),
        ("aptprice predict -i listing.json", "Price one listing with the best model"),
        ("aptprice predict -d listings.csv -o out.csv", "Price a table of listings"),
        ("aptprice models", "List trained artifacts"),
        ("aptprice engineer -d data.csv -o out.csv", "Write the engineered table"),
        ("aptprice info -d data.csv", "Inspect a dataset"),
    ];

    for (cmd, desc) in cmds {
        println!("  {:<44} {}", cmd.white(), muted(desc));
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_egp() {
        assert_eq!(format_egp(0.0), "0");
        assert_eq!(format_egp(999.4), "999");
        assert_eq!(format_egp(1_234_567.6), "1,234,568");
        assert_eq!(format_egp(-12_000.0), "-12,000");
    }

    #[test]
    fn test_train_config_overrides() {
        let config = train_config(
            None,
            Some(PathBuf::from("listings.csv")),
            None,
            None,
            Some(0.3),
            Some(7),
            true,
            &["LinearRegression".to_string()],
        )
        .unwrap();
        assert_eq!(config.data_path, PathBuf::from("listings.csv"));
        assert_eq!(config.test_size, 0.3);
        assert_eq!(config.seed, 7);
        assert_eq!(config.group_stats, GroupStatsMode::FullTable);
        assert_eq!(config.candidates.len(), 1);
    }

    #[test]
    fn test_train_config_unknown_candidate() {
        let result = train_config(None, None, None, None, None, None, false, &["Nope".to_string()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["aptprice", "train", "--only", "LinearRegression,RandomForest"]).unwrap();
        match cli.command {
            Some(Commands::Train { only, .. }) => assert_eq!(only.len(), 2),
            _ => panic!("expected train"),
        }

        assert!(Cli::try_parse_from(["aptprice", "predict", "-i", "a.json", "-d", "b.csv"]).is_err());
    }
}
