use std::{fs, path::PathBuf};

use anyhow::Result;
use clap::Parser;
use namesmith::{ComplexResolver, NameValidator, PeptideResolver, Resolver, ShorthandValidator};

/// Resolve chemical names — peptide shorthand into IUPAC names,
/// coordination-complex formulas into SMILES
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Names to resolve; use --input to read them from a file instead
    names: Vec<String>,
    /// A file of newline-separated names
    #[arg(short, long)]
    input: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut names = args.names;
    if let Some(input) = args.input {
        let file = fs::read_to_string(input)?;
        names.extend(file.lines().map(str::to_owned));
    }

    let router = ShorthandValidator::default();
    let peptide = PeptideResolver::default();
    let complex = ComplexResolver::default();

    for name in &names {
        let resolver: &dyn Resolver = if router.validate(name).accepted {
            &peptide
        } else {
            &complex
        };
        // One malformed name must not abort the batch
        match resolver.resolve(name) {
            Ok(resolved) => println!("{name}\t{resolved}"),
            Err(report) => eprintln!("{name}\terror ({}): {report}", resolver.name()),
        }
    }

    Ok(())
}
