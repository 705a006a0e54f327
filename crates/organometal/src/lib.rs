//! Responsible for parsing inorganic/organometallic complex names
//! (`[IrCl(cod)]2`) into structured form and assembling best-effort SMILES

mod builder;
pub mod complex_database;
mod parser;

use miette::Diagnostic;
use thiserror::Error;

pub use builder::SmilesBuilder;
pub use complex_database::{
    ComplexDatabase, ComplexDatabaseError, LigandInfo, LigandType, MetalInfo,
};
pub use parser::ComplexNameParser;

/// A ligand as it appeared in a complex name. Unrecognized abbreviations
/// are stored verbatim — resolution against the database is deferred to the
/// SMILES builder, so a partially-understood complex can still be
/// inspected.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ParsedLigand {
    pub name: String,
    pub count: u32,
    /// Prefix/suffix modifiers not yet structurally interpreted
    pub modifiers: Vec<String>,
}

impl ParsedLigand {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_count(name, 1)
    }

    pub fn with_count(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
            modifiers: Vec::new(),
        }
    }
}

/// One parse call's result: metal, ligands in order of appearance, overall
/// ionic charge, formula-unit multiplicity (2 for dimers), and counter
/// ions. Plain data — holds no database references.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ParsedComplex {
    pub metal: String,
    pub ligands: Vec<ParsedLigand>,
    pub complex_charge: i32,
    pub multiplicity: u32,
    pub counter_ions: Vec<(String, u32)>,
}

// ===

#[derive(Clone, Eq, PartialEq, Debug, Diagnostic, Error)]
pub enum ComplexError {
    #[diagnostic(help(
        "metal symbols are matched longest-first against the start of the bracketed formula"
    ))]
    #[error("could not identify a metal in {name:?}")]
    UnknownMetal { name: String },

    #[diagnostic(help(
        "new ligands can be added at runtime with `ComplexDatabase::register_ligand`"
    ))]
    #[error("unknown ligand {name:?}")]
    UnknownLigand { name: String },

    #[diagnostic(help(
        "new counter ions can be added at runtime with `ComplexDatabase::register_counter_ion`"
    ))]
    #[error("unknown counter ion {name:?}")]
    UnknownCounterIon { name: String },
}

pub type Result<T, E = ComplexError> = std::result::Result<T, E>;

/// Parse a complex name and assemble its SMILES in one call.
///
/// SMILES has no syntax for coordinate/dative bonds, so the output is a
/// disconnected-fragment approximation of the complex, not a bonded
/// structure — callers must treat it as a correctness boundary.
pub fn complex_to_smiles(db: &ComplexDatabase, name: impl AsRef<str>) -> Result<String> {
    let parsed = ComplexNameParser::new(db).parse(name.as_ref())?;
    SmilesBuilder::new(db).build(&parsed)
}
