//! Submerge CLI
//!
//! Headless front end for the caption merge engine: merge any number of
//! `.srt` files onto one timeline, shift a file in time, or enforce a
//! minimum gap between captions.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use submerge_core::{
    document_from_srt, export_srt, merge, Document, MergeDirection, MergePolicy, StyleTransform,
    Tick, DEFAULT_MIN_GAP,
};

/// Caption document merge tool
///
/// Reads SubRip (.srt) files, reconciles overlapping captions through the
/// merge engine, and writes SubRip back out. Overlap handling is governed
/// by a merge method (how colliding texts are laid out) and optional
/// per-input style transforms (e.g. color the second language).
#[derive(Parser)]
#[command(name = "submerge")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge caption files onto a single timeline
    ///
    /// Inputs are merged left to right: the first file seeds the document
    /// and every further file is replayed through the merge engine.
    Merge {
        /// Input .srt files, in merge order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output path; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Layout for colliding captions: top2bottom, bottom2top,
        /// left2right or right2left
        #[arg(short, long, default_value = "top2bottom")]
        method: String,

        /// Style spec applied to the input at the same position; repeat
        /// once per input. Tokens: b/i/u, a leading-digit font size, a
        /// color name or #rrggbb, or "normal" for none
        #[arg(short, long)]
        style: Vec<String>,

        /// Minimum gap enforced between adjacent captions, in milliseconds
        #[arg(short, long, default_value_t = DEFAULT_MIN_GAP)]
        gap: Tick,

        /// Shift the merged result by this many milliseconds
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        shift: i64,

        /// Emit the merged document as JSON instead of SubRip
        #[arg(long)]
        json: bool,

        /// Overwrite the output file if it exists
        #[arg(short, long)]
        force: bool,
    },

    /// Concatenate caption files back to back
    ///
    /// Each input after the first is shifted to start where the running
    /// result ends, so the files play sequentially instead of overlapping.
    Append {
        /// Input .srt files, in playback order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output path; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite the output file if it exists
        #[arg(short, long)]
        force: bool,
    },

    /// Shift every caption of a file in time
    Shift {
        /// Input .srt file
        input: PathBuf,

        /// Signed shift in milliseconds
        #[arg(short, long, allow_hyphen_values = true)]
        by: i64,

        /// Output path; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite the output file if it exists
        #[arg(short, long)]
        force: bool,
    },

    /// Enforce a minimum gap between adjacent captions
    Gap {
        /// Input .srt file
        input: PathBuf,

        /// Minimum gap in milliseconds
        #[arg(short, long, default_value_t = DEFAULT_MIN_GAP)]
        min: Tick,

        /// Output path; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite the output file if it exists
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Commands::Merge {
            inputs,
            output,
            method,
            style,
            gap,
            shift,
            json,
            force,
        } => {
            let direction: MergeDirection = method
                .parse()
                .with_context(|| format!("invalid merge method '{method}'"))?;
            let policy = MergePolicy {
                direction,
                min_gap: gap,
                ..MergePolicy::default()
            };

            let mut doc = run_merge(&inputs, &style, &policy)?;
            if shift != 0 {
                doc.shift(shift);
            }
            doc.gap(policy.min_gap);

            let rendered = if json {
                serde_json::to_string_pretty(&doc).context("serializing merged document")?
            } else {
                export_srt(&doc)
            };
            emit(rendered, output.as_deref(), force)
        }

        Commands::Append {
            inputs,
            output,
            force,
        } => {
            let policy = MergePolicy::default();
            let doc = run_append(&inputs, &policy)?;
            emit(export_srt(&doc), output.as_deref(), force)
        }

        Commands::Shift {
            input,
            by,
            output,
            force,
        } => {
            let mut doc = load_document(&input, &MergePolicy::default())?;
            doc.shift(by);
            emit(export_srt(&doc), output.as_deref(), force)
        }

        Commands::Gap {
            input,
            min,
            output,
            force,
        } => {
            let mut doc = load_document(&input, &MergePolicy::default())?;
            doc.gap(min);
            emit(export_srt(&doc), output.as_deref(), force)
        }
    }
}

// =============================================================================
// Command Bodies
// =============================================================================

/// Loads every input, applies its positional style spec, and folds the
/// documents together under `policy`.
fn run_merge(inputs: &[PathBuf], styles: &[String], policy: &MergePolicy) -> Result<Document> {
    let mut merged = Document::new();
    for (index, path) in inputs.iter().enumerate() {
        let mut doc = load_document(path, policy)?;
        if let Some(spec) = styles.get(index) {
            doc.restyle(&parse_style_spec(spec)?);
        }
        merged = merge(&merged, &doc, policy);
        info!(
            input = %path.display(),
            captions = doc.len(),
            total = merged.len(),
            "merged input"
        );
    }
    Ok(merged)
}

/// Loads every input and chains the documents tail to tail.
fn run_append(inputs: &[PathBuf], policy: &MergePolicy) -> Result<Document> {
    let mut out = Document::new();
    for path in inputs {
        let doc = load_document(path, policy)?;
        out.append_in_place(&doc, policy);
        info!(
            input = %path.display(),
            captions = doc.len(),
            total = out.len(),
            "appended input"
        );
    }
    Ok(out)
}

fn load_document(path: &Path, policy: &MergePolicy) -> Result<Document> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    document_from_srt(&content, policy).with_context(|| format!("parsing {}", path.display()))
}

/// Writes to `output`, refusing to clobber an existing file without
/// `--force`; prints to stdout when no output path was given.
fn emit(rendered: String, output: Option<&Path>, force: bool) -> Result<()> {
    match output {
        Some(path) => {
            if path.exists() && !force {
                bail!(
                    "{} already exists (pass --force to overwrite)",
                    path.display()
                );
            }
            fs::write(path, &rendered)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

/// Parses one style spec into transforms. Specs are comma- or
/// whitespace-separated tokens; `normal` yields no transforms.
fn parse_style_spec(spec: &str) -> Result<Vec<StyleTransform>> {
    let mut transforms = Vec::new();
    for token in spec.split([',', ' ']).filter(|t| !t.is_empty()) {
        let lowered = token.to_ascii_lowercase();
        let transform = match lowered.as_str() {
            "normal" => continue,
            "b" | "bold" | "strong" => StyleTransform::Bold,
            "i" | "italic" | "italics" => StyleTransform::Italic,
            "u" | "underline" | "underlined" => StyleTransform::Underline,
            _ if lowered.starts_with(|c: char| c.is_ascii_digit()) => {
                StyleTransform::FontSize(lowered)
            }
            _ => StyleTransform::Color(token.to_string()),
        };
        transforms.push(transform);
    }
    Ok(transforms)
}

// =============================================================================
// Tests
// =============================================================================
