//! plantdoc CLI
//!
//! Diagnose a leaf photo from the command line and inspect the reference
//! table the diagnosis is resolved against.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use burn::module::Module;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use plantdoc::backend::{backend_name, default_device, DefaultBackend};
use plantdoc::classes::{normalize_label, CLASS_LABELS};
use plantdoc::disease::{DiseaseRecord, DiseaseTable};
use plantdoc::inference::{Predictor, PredictorConfig};
use plantdoc::model::{save_model, ResNet9, ResNet9Config};
use plantdoc::utils::logging::{init_logging, LogConfig};
use plantdoc::utils::{format_millis, format_percent};
use plantdoc::{Diagnoser, Diagnosis};

/// Plant disease diagnosis from a single leaf photo
#[derive(Parser, Debug)]
#[command(name = "plantdoc")]
#[command(version)]
#[command(about = "Plant disease diagnosis with a ResNet9 classifier built on Burn", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a leaf image and show its disease information
    Diagnose {
        /// Path to the model weights (manifest is expected next to them)
        #[arg(short, long)]
        model: PathBuf,

        /// Path to a JPEG or PNG image
        #[arg(short, long)]
        input: PathBuf,

        /// Number of ranked classes to show (overrides the config file)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Print the diagnosis as JSON
        #[arg(long, default_value = "false")]
        json: bool,

        /// Predictor configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List every class label, its lookup key and whether it resolves
    Labels,

    /// Look up a normalized key in the disease table
    Lookup {
        /// Key as produced by label normalization, e.g. "late blight"
        key: String,
    },

    /// Show keys that more than one table entry was stored under
    Collisions,

    /// Write randomly initialized weights and a manifest for smoke testing
    InitModel {
        /// Output path for the weights
        #[arg(short, long, default_value = "output/models/resnet9")]
        output: PathBuf,

        /// Channel width of the first convolution
        #[arg(long, default_value = "64")]
        base_width: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let machine_output = matches!(cli.command, Commands::Diagnose { json: true, .. });

    let log_config = if machine_output {
        LogConfig::quiet()
    } else if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };

    let _ = init_logging(&log_config);

    if !machine_output {
        print_banner();
    }

    match cli.command {
        Commands::Diagnose {
            model,
            input,
            top_k,
            json,
            config,
        } => {
            cmd_diagnose(&model, &input, top_k, json, config.as_deref())?;
        }

        Commands::Labels => {
            cmd_labels()?;
        }

        Commands::Lookup { key } => {
            cmd_lookup(&key)?;
        }

        Commands::Collisions => {
            cmd_collisions()?;
        }

        Commands::InitModel { output, base_width } => {
            cmd_init_model(&output, base_width)?;
        }
    }

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        r#"
 ╔══════════════════════════════════════════════════════╗
 ║   🌱 plantdoc                                        ║
 ║   Leaf Disease Diagnosis with Burn + Rust            ║
 ╚══════════════════════════════════════════════════════╝
  "#
        .green()
    );
}

fn cmd_diagnose(
    model: &Path,
    input: &Path,
    top_k: Option<usize>,
    json: bool,
    config: Option<&Path>,
) -> Result<()> {
    let mut predictor_config = match config {
        Some(path) => PredictorConfig::load(path)
            .with_context(|| format!("Failed to load predictor config {:?}", path))?,
        None => PredictorConfig::default(),
    };
    if let Some(k) = top_k {
        predictor_config = predictor_config.with_top_k(k);
    }

    if !json {
        println!(
            "{} {} on {}",
            "Loading model".cyan(),
            model.display(),
            backend_name()
        );
    }

    let device = default_device();
    let predictor = Predictor::<DefaultBackend>::load(model, &device, predictor_config)
        .with_context(|| format!("Failed to load model {:?}", model))?;
    let table = DiseaseTable::builtin().context("Failed to load the disease table")?;
    let diagnoser = Diagnoser::new(predictor, table);

    let diagnosis = diagnoser
        .diagnose_path(input)
        .with_context(|| format!("Failed to diagnose {:?}", input))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&diagnosis)?);
    } else {
        print_diagnosis(&diagnosis);
    }

    Ok(())
}

fn print_diagnosis(diagnosis: &Diagnosis) {
    let prediction = &diagnosis.prediction;

    println!();
    println!("{}", "Diagnosis".green().bold());
    println!("{}", "=".repeat(60));
    println!(
        "  Predicted:  {} (class {})",
        prediction.label.bold(),
        prediction.class_index
    );
    println!("  Confidence: {}", format_percent(prediction.confidence));
    println!("  Inference:  {}", format_millis(prediction.inference_time_ms));
    println!("  Lookup key: {:?}", diagnosis.lookup_key);

    println!();
    println!("{}", "Top predictions".cyan());
    for (rank, (index, label, probability)) in prediction.top_k.iter().enumerate() {
        println!(
            "  {}. {:<50} {:>8}  (class {})",
            rank + 1,
            label,
            format_percent(*probability),
            index
        );
    }

    println!();
    match &diagnosis.record {
        Some(record) => print_record(record),
        None => println!(
            "{} No reference information for '{}'",
            "Note:".yellow(),
            diagnosis.lookup_key
        ),
    }
}

fn print_record(record: &DiseaseRecord) {
    println!("{}", "Description".cyan());
    println!("  {}", record.description);

    if !record.symptoms.is_empty() {
        println!();
        println!("{}", "Symptoms".cyan());
        for symptom in &record.symptoms {
            println!("  - {}", symptom);
        }
    }

    if !record.diagnosis.is_empty() {
        println!();
        println!("{}", "Treatment".cyan());
        for tip in &record.diagnosis {
            println!("  - {}", tip);
        }
    }

    if let Some(url) = &record.video_url {
        println!();
        println!("{} {}", "Video:".cyan(), url);
    }
}

fn cmd_labels() -> Result<()> {
    let table = DiseaseTable::builtin()?;

    println!("{}", "Class labels".green().bold());
    println!("{}", "=".repeat(60));

    let mut unresolved = 0;
    for (index, label) in CLASS_LABELS.iter().enumerate() {
        let key = normalize_label(label);
        let status = if table.contains(&key) {
            "ok".green()
        } else {
            unresolved += 1;
            "missing".red()
        };
        println!("  {:>2}  {:<52} {:<36} {}", index, label, format!("{:?}", key), status);
    }

    println!();
    println!(
        "{} of {} labels have no reference information",
        unresolved,
        CLASS_LABELS.len()
    );
    Ok(())
}

fn cmd_lookup(key: &str) -> Result<()> {
    let table = DiseaseTable::builtin()?;

    match table.lookup(key) {
        Ok(record) => {
            if let Some(source) = table.source_of(key) {
                println!("{} {}", "Entry from:".cyan(), source);
                println!();
            }
            print_record(record);
        }
        Err(e) if e.is_recoverable() => {
            println!("{} {}", "Not found:".yellow(), e);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn cmd_collisions() -> Result<()> {
    let table = DiseaseTable::builtin()?;

    println!("{}", "Key collisions".green().bold());
    println!("{}", "=".repeat(60));

    if table.collisions().is_empty() {
        println!("  none");
    }

    for collision in table.collisions() {
        println!("  {:?}", collision.key);
        println!("    kept:        {}", collision.winner.green());
        for label in &collision.overwritten {
            println!("    overwritten: {}", label.red());
        }
    }

    let orphans = table.orphan_keys();
    if !orphans.is_empty() {
        println!();
        println!("{}", "Keys no class label produces".cyan());
        for key in orphans {
            println!("  {:?}", key);
        }
    }
    Ok(())
}

fn cmd_init_model(output: &Path, base_width: usize) -> Result<()> {
    let config = ResNet9Config::new().with_base_width(base_width);
    let device = default_device();
    let model: ResNet9<DefaultBackend> = config.init(&device);

    info!("Initialized {} parameters", model.num_params());

    save_model(model, &config, output)
        .with_context(|| format!("Failed to write model to {:?}", output))?;

    println!(
        "{} Random weights written to {} (not trained, for smoke testing only)",
        "Done:".green(),
        output.display()
    );
    Ok(())
}
