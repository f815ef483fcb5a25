//! Command-line access to metadata lookups and the annotation build.
//!
//! # Responsibility
//! - Print dataset/phenotype records as JSON for operators.
//! - Run the canonical annotation build offline.
//!
//! Exit status is non-zero on any error, including missing phenotype rows.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use phenometa_core::annotation::build_annotation_tables;
use phenometa_core::{default_log_level, init_logging, MetadataConfig, MetadataService};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "phenometa")]
#[command(about = "Genomic study metadata lookups", long_about = None)]
#[command(version)]
struct Cli {
    /// Absolute directory for rolling log files; logging is off when omitted
    #[arg(long, global = true)]
    log_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one dataset record, or `null` when the id is unknown
    Dataset {
        /// JSON config file containing `metadata_db`
        #[arg(short, long)]
        config: PathBuf,

        /// Dataset id as issued by the store
        dataset_id: String,
    },

    /// Print one phenotype record
    Phenotype {
        /// JSON config file containing `metadata_db`
        #[arg(short, long)]
        config: PathBuf,

        #[arg(short, long)]
        resource: String,

        #[arg(short, long)]
        phenocode: String,

        /// Reported in diagnostics only
        #[arg(long, default_value = "NA")]
        data_type: String,

        /// Reported in diagnostics only
        #[arg(long, default_value = "NA")]
        dataset: String,
    },

    /// Build the canonical annotation and gene position tables
    Annotate {
        /// BioMart exon annotation export
        #[arg(long)]
        anno: PathBuf,

        /// BioMart canonical transcript export
        #[arg(long)]
        canonical: PathBuf,

        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or_else(|| default_log_level());
        init_logging(level, log_dir).map_err(anyhow::Error::msg)?;
    }

    match cli.command {
        Commands::Dataset { config, dataset_id } => {
            let service = open_service(&config)?;
            let record = service
                .get_dataset(&dataset_id)
                .with_context(|| format!("dataset lookup failed for `{dataset_id}`"))?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Phenotype {
            config,
            resource,
            phenocode,
            data_type,
            dataset,
        } => {
            let service = open_service(&config)?;
            let record = service.get_phenotype(&resource, &data_type, &dataset, &phenocode)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Annotate {
            anno,
            canonical,
            out_dir,
        } => {
            let summary = build_annotation_tables(&anno, &canonical, &out_dir)?;
            println!(
                "wrote {} canonical rows to {}",
                summary.canonical_rows,
                summary.canonical_table.display()
            );
            println!(
                "wrote {} gene positions to {}",
                summary.gene_positions,
                summary.gene_position_table.display()
            );
        }
    }

    Ok(())
}

fn open_service(config_path: &Path) -> Result<&'static MetadataService> {
    let config = MetadataConfig::from_json_file(config_path)
        .with_context(|| format!("failed to load config `{}`", config_path.display()))?;
    Ok(MetadataService::install_global(config)?)
}
