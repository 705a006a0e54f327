// Standard Library Imports
use std::collections::hash_map::Entry;

// External Crate Imports
use ahash::{HashMap, HashMapExt};
use knuffel::Decode;
use miette::{Diagnostic, Result};
use thiserror::Error;

// Public API ==========================================================================================================

/// The lookup tables backing peptide-shorthand expansion, loaded once from a
/// KDL file and immutable afterwards.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ResidueDatabase {
    pub amino_acids: AminoAcids,
    pub protecting_groups: ProtectingGroups,
    pub protections: Protections,
    pub n_caps: Caps,
    pub c_caps: Caps,
    pub counter_acids: Caps,
}

impl ResidueDatabase {
    pub fn new(file_name: impl AsRef<str>, kdl_text: impl AsRef<str>) -> Result<Self> {
        let parsed_db: ResidueDatabaseKdl = knuffel::parse(file_name.as_ref(), kdl_text.as_ref())?;
        Ok(parsed_db.try_into()?)
    }

    pub fn amino_acid(&self, code: &str) -> Option<&AminoAcidDescription> {
        self.amino_acids.get(&lookup_key(code))
    }

    /// Reverse lookup from a full amino-acid name (e.g. from a protected
    /// residue entry) back to its description.
    pub fn amino_acid_by_name(&self, name: &str) -> Option<&AminoAcidDescription> {
        self.amino_acids.values().find(|aa| aa.name == name)
    }

    pub fn protection(&self, token: &str) -> Option<&ProtectedResidue> {
        self.protections.get(&lookup_key(token))
    }

    pub fn n_cap(&self, token: &str) -> Option<&str> {
        self.n_caps.get(&lookup_key(token)).map(String::as_str)
    }

    pub fn c_cap(&self, token: &str) -> Option<&str> {
        self.c_caps.get(&lookup_key(token)).map(String::as_str)
    }

    pub fn counter_acid(&self, segment: &str) -> Option<&str> {
        self.counter_acids
            .get(&lookup_key(segment))
            .map(String::as_str)
    }
}

impl Default for ResidueDatabase {
    fn default() -> Self {
        Self::new(
            "residue_database.kdl",
            include_str!("../data/residue_database.kdl"),
        )
        .expect("the bundled residue database is valid")
    }
}

/// Every key is lower-cased (and space-stripped) before lookup; the tables
/// store their keys in the same normalized form.
pub(crate) fn lookup_key(token: &str) -> String {
    token.trim().to_lowercase().replace(' ', "")
}

// ---------------------------------------------------------------------------------------------------------------------

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct AminoAcidDescription {
    /// Free-acid form, used for the C-terminal residue ("alanine")
    pub name: String,
    /// Acyl form, used for every non-terminal residue ("alanyl")
    pub acyl: String,
    /// Side-chain substitution site ("Nε"), if the residue has a side chain
    /// that the protecting-group tables know how to describe
    pub site: Option<String>,
    /// Whether side-chain protection forms an ester (Asp/Glu)
    pub ester_site: bool,
    /// Achiral residues (glycine) never receive a stereo prefix
    pub achiral: bool,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ProtectingGroupDescription {
    pub name: String,
    /// Ester-form groups ("OtBu") already carry "ester" in their name
    pub ester: bool,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ProtectedResidue {
    /// Full name of the underlying amino acid ("lysine")
    pub name: String,
    /// Description of the side-chain protection ("Nε-(tert-butoxycarbonyl)")
    pub protection: String,
}

// Private Types =======================================================================================================

type AminoAcids = HashMap<String, AminoAcidDescription>;
type ProtectingGroups = HashMap<String, ProtectingGroupDescription>;
type Protections = HashMap<String, ProtectedResidue>;
type Caps = HashMap<String, String>;

// KDL File Schema =====================================================================================================

#[derive(Debug, Decode)]
struct ResidueDatabaseKdl {
    #[knuffel(children(name = "amino-acids"))]
    amino_acids: Vec<AminoAcidsKdl>,
    #[knuffel(children(name = "protecting-groups"))]
    protecting_groups: Vec<ProtectingGroupsKdl>,
    #[knuffel(children(name = "special-cases"))]
    special_cases: Vec<SpecialCasesKdl>,
    #[knuffel(children(name = "n-caps"))]
    n_caps: Vec<CapsKdl>,
    #[knuffel(children(name = "c-caps"))]
    c_caps: Vec<CapsKdl>,
    #[knuffel(children(name = "counter-acids"))]
    counter_acids: Vec<CapsKdl>,
}

#[derive(Debug, Decode)]
struct AminoAcidsKdl {
    #[knuffel(children)]
    residues: Vec<AminoAcidKdl>,
}

#[derive(Debug, Decode)]
struct AminoAcidKdl {
    #[knuffel(argument)]
    code: String,
    #[knuffel(argument)]
    name: String,
    #[knuffel(property)]
    acyl: Option<String>,
    #[knuffel(property)]
    site: Option<String>,
    #[knuffel(property(name = "ester-site"))]
    ester_site: Option<bool>,
    #[knuffel(property)]
    achiral: Option<bool>,
}

#[derive(Debug, Decode)]
struct ProtectingGroupsKdl {
    #[knuffel(children)]
    groups: Vec<ProtectingGroupKdl>,
}

#[derive(Debug, Decode)]
struct ProtectingGroupKdl {
    #[knuffel(argument)]
    code: String,
    #[knuffel(argument)]
    name: String,
    #[knuffel(property)]
    ester: Option<bool>,
}

#[derive(Debug, Decode)]
struct SpecialCasesKdl {
    #[knuffel(children)]
    cases: Vec<SpecialCaseKdl>,
}

#[derive(Debug, Decode)]
struct SpecialCaseKdl {
    #[knuffel(argument)]
    key: String,
    #[knuffel(argument)]
    name: String,
    #[knuffel(argument)]
    protection: String,
}

#[derive(Debug, Decode)]
struct CapsKdl {
    #[knuffel(children)]
    caps: Vec<CapKdl>,
}

#[derive(Debug, Decode)]
struct CapKdl {
    #[knuffel(argument)]
    code: String,
    #[knuffel(argument)]
    name: String,
}

// Conversion From Parsed KDL to Internal Representation ===============================================================

impl TryFrom<ResidueDatabaseKdl> for ResidueDatabase {
    type Error = ResidueDatabaseError;

    fn try_from(value: ResidueDatabaseKdl) -> Result<Self, Self::Error> {
        let amino_acids: AminoAcids = build_amino_acids(value.amino_acids)?;
        let protecting_groups: ProtectingGroups = build_protecting_groups(value.protecting_groups)?;
        let protections =
            build_protections(&amino_acids, &protecting_groups, value.special_cases)?;
        Ok(Self {
            amino_acids,
            protecting_groups,
            protections,
            n_caps: validate_caps(value.n_caps, "N-terminal cap")?,
            c_caps: validate_caps(value.c_caps, "C-terminal cap")?,
            counter_acids: validate_caps(value.counter_acids, "counter acid")?,
        })
    }
}

fn build_amino_acids(value: Vec<AminoAcidsKdl>) -> Result<AminoAcids, ResidueDatabaseError> {
    let mut amino_acids = AminoAcids::new();
    for residue in value.into_iter().flat_map(|block| block.residues) {
            let code = lookup_key(&residue.code);
            let acyl = residue
                .acyl
                .unwrap_or_else(|| synthesize_acyl(&residue.name));
            let description = AminoAcidDescription {
                name: residue.name,
                acyl,
                site: residue.site,
                ester_site: residue.ester_site.unwrap_or(false),
                achiral: residue.achiral.unwrap_or(false),
            };
            match amino_acids.entry(code) {
                Entry::Occupied(e) => {
                    return Err(ResidueDatabaseError::DuplicateAminoAcid {
                        code: e.key().clone(),
                    });
                }
                Entry::Vacant(e) => e.insert(description),
            };
        }
        Ok(amino_acids)
}

fn build_protecting_groups(
    value: Vec<ProtectingGroupsKdl>,
) -> Result<ProtectingGroups, ResidueDatabaseError> {
    let mut groups = ProtectingGroups::new();
    for group in value.into_iter().flat_map(|block| block.groups) {
            let code = lookup_key(&group.code);
            let description = ProtectingGroupDescription {
                name: group.name,
                ester: group.ester.unwrap_or(false),
            };
            match groups.entry(code) {
                Entry::Occupied(e) => {
                    return Err(ResidueDatabaseError::DuplicateProtectingGroup {
                        code: e.key().clone(),
                    });
                }
                Entry::Vacant(e) => e.insert(description),
            };
        }
        Ok(groups)
}

fn validate_caps(blocks: Vec<CapsKdl>, kind: &'static str) -> Result<Caps, ResidueDatabaseError> {
    let mut caps = Caps::new();
    for cap in blocks.into_iter().flat_map(|block| block.caps) {
        match caps.entry(lookup_key(&cap.code)) {
            Entry::Occupied(e) => {
                return Err(ResidueDatabaseError::DuplicateCap {
                    kind,
                    code: e.key().clone(),
                });
            }
            Entry::Vacant(e) => e.insert(cap.name),
        };
    }
    Ok(caps)
}

/// Cross product of every sited amino acid with every protecting group,
/// then an explicit special-case overlay — special cases always win, so
/// collisions are deterministic.
fn build_protections(
    amino_acids: &AminoAcids,
    protecting_groups: &ProtectingGroups,
    special_cases: Vec<SpecialCasesKdl>,
) -> Result<Protections, ResidueDatabaseError> {
    let mut protections = Protections::new();

    for (code, amino_acid) in amino_acids {
        let Some(site) = &amino_acid.site else {
            continue;
        };
        for (group_code, group) in protecting_groups {
            let key = format!("{code}({group_code})");
            let protection = if group.ester || !amino_acid.ester_site {
                format!("{site}-{}", group.name)
            } else {
                format!("{site}-{} ester", group.name)
            };
            protections.insert(
                key,
                ProtectedResidue {
                    name: amino_acid.name.clone(),
                    protection,
                },
            );
        }
    }

    let mut seen_cases = HashMap::new();
    for case in special_cases.into_iter().flat_map(|block| block.cases) {
        let key = lookup_key(&case.key);
        if seen_cases.insert(key.clone(), ()).is_some() {
            return Err(ResidueDatabaseError::DuplicateSpecialCase { key });
        }
        if !amino_acids.values().any(|aa| aa.name == case.name) {
            return Err(ResidueDatabaseError::UnknownSpecialCaseResidue {
                key,
                name: case.name,
            });
        }
        protections.insert(
            key,
            ProtectedResidue {
                name: case.name,
                protection: case.protection,
            },
        );
    }

    Ok(protections)
}

/// Fallback acyl form for residues without an explicit override: trailing
/// "ine" or "ic acid" becomes "yl" ("valine" -> "valyl", "aspartic acid" ->
/// "aspartyl"); anything else is left unchanged.
pub(crate) fn synthesize_acyl(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ine") {
        format!("{stem}yl")
    } else if let Some(stem) = name.strip_suffix("ic acid") {
        format!("{stem}yl")
    } else {
        name.to_owned()
    }
}

// Errors ==============================================================================================================

#[derive(Clone, Eq, PartialEq, Debug, Diagnostic, Error)]
pub enum ResidueDatabaseError {
    #[error("the amino acid {code:?} is defined more than once")]
    DuplicateAminoAcid { code: String },

    #[error("the protecting group {code:?} is defined more than once")]
    DuplicateProtectingGroup { code: String },

    #[error("the {kind} {code:?} is defined more than once")]
    DuplicateCap { kind: &'static str, code: String },

    #[error("the special case {key:?} is defined more than once")]
    DuplicateSpecialCase { key: String },

    #[diagnostic(help("special cases must name an amino acid defined in the amino-acids block"))]
    #[error("the special case {key:?} refers to the unknown amino acid {name:?}")]
    UnknownSpecialCaseResidue { key: String, name: String },
}

// Module Tests ========================================================================================================
