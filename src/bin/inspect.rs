//! Inspect a file's tokenization under a syntax profile.
//!
//! Usage:
//!   tint-inspect src/mailer.php --profile php
//!   tint-inspect notes.py --profile python --flat
//!   RUST_LOG=debug tint-inspect broken.js --profile ./my-profile.yaml

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use tint::layering::resolve_winners;
use tint::registry::{ProfileRegistry, ProfileSource};
use tint::text::SourceText;

#[derive(Parser, Debug)]
#[command(name = "tint-inspect")]
#[command(about = "Tokenize a file with a syntax profile and print the ranges")]
struct Args {
    /// File to tokenize
    file: PathBuf,

    /// Profile identifier: bare name, path, or URL
    #[arg(long, default_value = "default")]
    profile: String,

    /// Print flattened winner spans instead of per-type ranges
    #[arg(long)]
    flat: bool,
}

fn main() -> Result<()> {
    tint::logging::init();
    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let text = SourceText::new(&raw);

    let registry = ProfileRegistry::new();
    let profile = registry.resolve_blocking(ProfileSource::Named(args.profile.clone()));
    let result = tint::extract::extract_all(&profile, &text);

    if args.flat {
        for span in resolve_winners(&result) {
            println!(
                "{:>6}..{:<6} {:<12} {:?}",
                span.range.start,
                span.range.end,
                span.type_name,
                text.slice(span.range.start..span.range.end)
            );
        }
    } else {
        for (name, ranges) in result.iter() {
            println!("{} ({} ranges)", name, ranges.len());
            for range in ranges {
                println!(
                    "  {:>6}..{:<6} {:?}",
                    range.start,
                    range.end,
                    text.slice(range.start..range.end)
                );
            }
        }
    }

    Ok(())
}
