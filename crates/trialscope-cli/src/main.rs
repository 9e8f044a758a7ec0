mod display;
mod pipeline;

use std::path::{Path, PathBuf};

use anyhow::Context;
use arrow::record_batch::RecordBatch;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use trialscope_collect::{
    ClinicalTrialsClient, DrugQuery, OpenFdaClient, TrialQuery, add_manual_drugs, drugs, trials,
};
use trialscope_store::{TableShape, write_json, write_table};

use pipeline::{
    CLEAN_PREFIX, DRUGS_PREFIX, DataLayout, LABELED_PREFIX, TRIALS_RAW_INPUTS, TRIALS_RAW_PREFIX,
    timestamp, timestamped,
};

#[derive(Parser)]
#[command(name = "trialscope", version, about = "Clinical trial collection and completion labelling")]
struct Cli {
    /// Root data directory (raw/clinicaltrials, raw/fda, processed)
    #[arg(long, env = "TRIALSCOPE_DATA_DIR", default_value = "data", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collect cancer trials with resolved outcomes from ClinicalTrials.gov
    CollectTrials {
        /// Stop after this many trials
        #[arg(long, default_value_t = 10_000)]
        max_trials: usize,

        /// Studies per request (capped at 1000)
        #[arg(long, default_value_t = 100)]
        page_size: usize,

        /// Give up after this many consecutive failed requests (default: never)
        #[arg(long)]
        max_retries: Option<u32>,

        /// Studies endpoint
        #[arg(long, default_value = trials::STUDIES_URL)]
        url: String,

        /// Output JSON file (default: timestamped under raw/clinicaltrials)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Collect approved cancer drugs from openFDA
    CollectDrugs {
        /// Skip merging the built-in list of common oncology drugs
        #[arg(long)]
        no_manual: bool,

        /// drugs@FDA endpoint
        #[arg(long, default_value = drugs::DRUGSFDA_URL)]
        url: String,

        /// Output JSON file (default: timestamped under raw/fda)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Flatten raw trials into a cleaned feature table
    Clean {
        /// Raw trials JSON (default: newest in raw/clinicaltrials)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output table (default: timestamped under processed)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = TableFormat::Csv)]
        format: TableFormat,

        /// Print the first N rows of the cleaned table
        #[arg(long, default_value_t = 0)]
        preview: usize,
    },

    /// Label a cleaned table for completion prediction
    Label {
        /// Cleaned table (default: newest in processed)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Approved-drug JSON (default: newest in raw/fda, skipped if none)
        #[arg(long)]
        drugs: Option<PathBuf>,

        /// Output table (default: timestamped under processed)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = TableFormat::Csv)]
        format: TableFormat,
    },

    /// Clean and label in one pass
    Run {
        /// Raw trials JSON (default: newest in raw/clinicaltrials)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Approved-drug JSON (default: newest in raw/fda, skipped if none)
        #[arg(long)]
        drugs: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = TableFormat::Csv)]
        format: TableFormat,
    },
}

/// Output table formats compiled into this binary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum TableFormat {
    Csv,
    #[cfg(feature = "parquet")]
    Parquet,
}

impl TableFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            #[cfg(feature = "parquet")]
            Self::Parquet => "parquet",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let layout = DataLayout::new(&cli.data_dir);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %cli.data_dir.display(),
        "trialscope"
    );

    match cli.command {
        Command::CollectTrials {
            max_trials,
            page_size,
            max_retries,
            url,
            output,
        } => {
            let query = TrialQuery {
                max_trials,
                page_size,
                max_retries,
                ..Default::default()
            };
            let collection = ClinicalTrialsClient::new(url).collect(&query).await;
            display::print_collection_summary(&collection);
            if collection.is_empty() {
                anyhow::bail!("no trials collected");
            }
            let path = output.unwrap_or_else(|| {
                timestamped(&layout.raw_trials(), TRIALS_RAW_PREFIX, &timestamp(), "json")
            });
            let bytes = write_json(&path, &collection.trials)
                .with_context(|| format!("writing {}", path.display()))?;
            display::print_file_info(&path, bytes, None);
        }

        Command::CollectDrugs {
            no_manual,
            url,
            output,
        } => {
            let mut drugs = OpenFdaClient::new(url).collect(&DrugQuery::default()).await;
            if !no_manual {
                let added = add_manual_drugs(&mut drugs);
                tracing::info!(added, total = drugs.len(), "merged manual drug list");
            }
            if drugs.is_empty() {
                anyhow::bail!("no drugs collected");
            }
            let path = output.unwrap_or_else(|| {
                timestamped(
                    &layout.raw_drugs(),
                    &format!("{DRUGS_PREFIX}combined_"),
                    &timestamp(),
                    "json",
                )
            });
            let bytes = write_json(&path, &drugs)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Drugs: {}", drugs.len());
            display::print_file_info(&path, bytes, None);
        }

        Command::Clean {
            input,
            output,
            format,
            preview,
        } => {
            let raw =
                pipeline::resolve_input(input, &layout.raw_trials(), TRIALS_RAW_INPUTS, "json")?;
            let cleaned = pipeline::clean(&raw)?;
            display::print_flatten_summary(&cleaned.flatten, &cleaned.assembly);
            display::print_quality_report(&cleaned.quality);
            if preview > 0 {
                display::print_preview(&cleaned.table, preview)?;
            }
            let path = output.unwrap_or_else(|| {
                timestamped(&layout.processed(), CLEAN_PREFIX, &timestamp(), format.extension())
            });
            save_table(&path, &cleaned.table)?;
        }

        Command::Label {
            input,
            drugs,
            output,
            format,
        } => {
            let path = pipeline::resolve_input(
                input,
                &layout.processed(),
                &[CLEAN_PREFIX],
                format.extension(),
            )?;
            let cleaned = pipeline::read_cleaned(&path)?;
            let reference = pipeline::load_reference(drugs, &layout.raw_drugs())?;
            let labeled = label_and_report(&cleaned, reference.as_ref())?;
            let path = output.unwrap_or_else(|| {
                timestamped(&layout.processed(), LABELED_PREFIX, &timestamp(), format.extension())
            });
            save_table(&path, &labeled)?;
        }

        Command::Run {
            input,
            drugs,
            format,
        } => {
            let raw =
                pipeline::resolve_input(input, &layout.raw_trials(), TRIALS_RAW_INPUTS, "json")?;
            let cleaned = pipeline::clean(&raw)?;
            display::print_flatten_summary(&cleaned.flatten, &cleaned.assembly);
            display::print_quality_report(&cleaned.quality);

            let stamp = timestamp();
            let ext = format.extension();
            save_table(
                &timestamped(&layout.processed(), CLEAN_PREFIX, &stamp, ext),
                &cleaned.table,
            )?;

            let reference = pipeline::load_reference(drugs, &layout.raw_drugs())?;
            let labeled = label_and_report(&cleaned.table, reference.as_ref())?;
            save_table(
                &timestamped(&layout.processed(), LABELED_PREFIX, &stamp, ext),
                &labeled,
            )?;
        }
    }

    Ok(())
}

fn label_and_report(
    cleaned: &RecordBatch,
    reference: Option<&trialscope_ml::ApprovedDrugs>,
) -> anyhow::Result<RecordBatch> {
    if let Some(reference) = reference {
        let sample: Vec<&str> = reference.names().iter().take(5).map(String::as_str).collect();
        println!("Approved drugs in reference set: {}", reference.len());
        println!("  {}...", sample.join(", "));
        println!();
    }
    let labeled = pipeline::label(cleaned, reference)?;
    display::print_completion_report(&labeled.report);
    if let Some(cmp) = &labeled.drugs {
        display::print_drug_comparison(cmp);
    }
    Ok(labeled.table)
}

fn save_table(path: &Path, batch: &RecordBatch) -> anyhow::Result<()> {
    let bytes = write_table(path, batch).with_context(|| format!("writing {}", path.display()))?;
    display::print_file_info(path, bytes, Some(TableShape::of(batch)));
    Ok(())
}
