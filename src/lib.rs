//! Ties the two name-resolution pipelines (`peptidic` and `organometal`)
//! behind common front-end seams

use miette::Result;
use organometal::{complex_to_smiles, ComplexDatabase};
use peptidic::{looks_like_shorthand, shorthand_to_iupac, ResidueDatabase};

/// A single name-resolution strategy: one name in, one string out.
///
/// Aggregating and ranking answers from several resolvers (local or
/// network-backed) lives outside this crate; this trait is the contract
/// that orchestration layer consumes.
pub trait Resolver {
    fn name(&self) -> &'static str;
    fn resolve(&self, input: &str) -> Result<String>;
}

/// Expands peptide shorthand into IUPAC-style names.
#[derive(Default)]
pub struct PeptideResolver {
    db: ResidueDatabase,
}

impl Resolver for PeptideResolver {
    fn name(&self) -> &'static str {
        "peptide-shorthand"
    }

    fn resolve(&self, input: &str) -> Result<String> {
        Ok(shorthand_to_iupac(&self.db, input)?)
    }
}

/// Converts coordination-complex names into best-effort SMILES.
#[derive(Default)]
pub struct ComplexResolver {
    db: ComplexDatabase,
}

impl Resolver for ComplexResolver {
    fn name(&self) -> &'static str {
        "inorganic-complex"
    }

    fn resolve(&self, input: &str) -> Result<String> {
        Ok(complex_to_smiles(&self.db, input)?)
    }
}

// ===

/// Verdict from a [`NameValidator`].
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Validation {
    pub accepted: bool,
    pub reason: Option<String>,
}

/// A narrow seam for pluggable name validation — pre-processing
/// collaborators (spell-checkers, format sniffers) implement this one
/// method and nothing else.
pub trait NameValidator {
    fn validate(&self, name: &str) -> Validation;
}

/// Routes names between the pipelines: accepts whatever looks like peptide
/// shorthand and rejects the rest (which then goes to the complex parser).
#[derive(Default)]
pub struct ShorthandValidator {
    db: ResidueDatabase,
}

impl NameValidator for ShorthandValidator {
    fn validate(&self, name: &str) -> Validation {
        if looks_like_shorthand(&self.db, name) {
            Validation {
                accepted: true,
                reason: None,
            }
        } else {
            Validation {
                accepted: false,
                reason: Some("no residue tokens found".to_owned()),
            }
        }
    }
}
