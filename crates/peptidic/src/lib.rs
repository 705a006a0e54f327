//! Responsible for expanding peptide shorthand (`Boc-Gly-L-Ala-OMe`) into
//! full IUPAC-style chemical names

mod namer;
mod parser;
pub mod residue_database;

use derive_more::Display;
use miette::Diagnostic;
use thiserror::Error;

pub use parser::split_shorthand;
pub use residue_database::{
    AminoAcidDescription, ProtectedResidue, ResidueDatabase, ResidueDatabaseError,
};

/// A peptide parsed from shorthand notation. Built fresh per input string;
/// holds no references to the database it was parsed against.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Peptide {
    cyclic: bool,
    n_cap: String,
    c_cap: String,
    counter_acid: Option<String>,
    residues: Vec<Residue>,
}

impl Peptide {
    pub fn is_cyclic(&self) -> bool {
        self.cyclic
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Residue {
    Known {
        stereo: Option<Stereo>,
        greek: Option<char>,
        methylated: bool,
        /// Full amino-acid name ("lysine")
        name: String,
        /// Side-chain protection description, if any
        protection: Option<String>,
    },
    /// Tokens that don't resolve to a known residue are carried through
    /// verbatim rather than rejected
    Unknown {
        stereo: Option<Stereo>,
        text: String,
    },
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
pub enum Stereo {
    #[display("d")]
    D,
    #[display("l")]
    L,
    #[display("dl")]
    Dl,
}

impl Stereo {
    /// Literal emitted when a stereo-descriptor token has nothing after it
    pub(crate) fn dangling(self) -> &'static str {
        match self {
            Self::D => "d",
            Self::L => "l",
            Self::Dl => "d/l",
        }
    }
}

// ===

#[derive(Clone, Eq, PartialEq, Debug, Diagnostic, Error)]
pub enum Error {
    #[diagnostic(help(
        "after stripping any N-/C-terminal caps and salt suffixes, at least one residue token \
        must remain"
    ))]
    #[error("no residues found")]
    NoResidues,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Expand a peptide shorthand string into an IUPAC-style name.
pub fn shorthand_to_iupac(db: &ResidueDatabase, shorthand: impl AsRef<str>) -> Result<String> {
    Ok(Peptide::parse(db, shorthand.as_ref())?.iupac_name(db))
}

/// Cheap pre-filter for routing: does this name look like peptide shorthand
/// at all? Used by callers to decide whether expansion is worth attempting.
pub fn looks_like_shorthand(db: &ResidueDatabase, name: &str) -> bool {
    let name = name.trim();
    let cyclic = name
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("cyclo"));
    let tokens = split_shorthand(name);
    let residue_like = tokens
        .iter()
        .filter(|token| db.amino_acid(token).is_some() || db.protection(token).is_some())
        .count();
    residue_like >= 1 && (cyclic || tokens.len() >= 2)
}
