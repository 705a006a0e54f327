// Standard Library Imports
use std::{cmp::Reverse, collections::hash_map::Entry};

// External Crate Imports
use ahash::{HashMap, HashMapExt};
use derive_more::Display;
use knuffel::Decode;
use miette::{Diagnostic, Result};
use thiserror::Error;

// Public API ==========================================================================================================

/// The ligand, metal, and counter-ion tables backing complex-name parsing
/// and SMILES assembly. Loaded once from a KDL file; the only mutation
/// path afterwards is explicit registration, which requires `&mut self`.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ComplexDatabase {
    ligands: Ligands,
    metals: Metals,
    counter_ions: Ligands,
    // Key lists sorted longest-first so that greedy prefix/suffix matching
    // prefers the more specific abbreviation ("Cp*" over "Cp", "Ir" over "I")
    ligand_index: Vec<String>,
    metal_index: Vec<String>,
    counter_ion_index: Vec<String>,
}

impl ComplexDatabase {
    pub fn new(file_name: impl AsRef<str>, kdl_text: impl AsRef<str>) -> Result<Self> {
        let parsed_db: ComplexDatabaseKdl = knuffel::parse(file_name.as_ref(), kdl_text.as_ref())?;
        Ok(parsed_db.try_into()?)
    }

    pub fn ligand(&self, abbr: &str) -> Option<&LigandInfo> {
        self.ligands.get(abbr)
    }

    pub fn metal(&self, symbol: &str) -> Option<&MetalInfo> {
        self.metals.get(symbol)
    }

    pub fn counter_ion(&self, name: &str) -> Option<&LigandInfo> {
        self.counter_ions.get(name)
    }

    pub fn ligands(&self) -> impl Iterator<Item = (&str, &LigandInfo)> {
        self.ligands.iter().map(|(abbr, info)| (abbr.as_str(), info))
    }

    pub fn metals(&self) -> impl Iterator<Item = (&str, &MetalInfo)> {
        self.metals.iter().map(|(sym, info)| (sym.as_str(), info))
    }

    pub fn counter_ions(&self) -> impl Iterator<Item = (&str, &LigandInfo)> {
        self.counter_ions
            .iter()
            .map(|(name, info)| (name.as_str(), info))
    }

    /// Register a new ligand at runtime, replacing any existing entry with
    /// the same abbreviation.
    pub fn register_ligand(&mut self, abbr: impl Into<String>, info: LigandInfo) {
        self.ligands.insert(abbr.into(), info);
        self.ligand_index = key_index(&self.ligands);
    }

    /// Register a new counter ion at runtime, replacing any existing entry
    /// with the same name.
    pub fn register_counter_ion(&mut self, name: impl Into<String>, info: LigandInfo) {
        self.counter_ions.insert(name.into(), info);
        self.counter_ion_index = key_index(&self.counter_ions);
    }

    /// Resolve a ligand name to its database entry: direct abbreviation
    /// first, then aliases, then a longest-base-name suffix match (so a
    /// modified-ligand name like `dF(CF3)ppy` falls back to `ppy`).
    pub fn resolve_ligand(&self, name: &str) -> Option<&LigandInfo> {
        if let Some(info) = self.ligands.get(name) {
            return Some(info);
        }
        if let Some(info) = self
            .ligands
            .values()
            .find(|info| info.aliases.iter().any(|alias| alias == name))
        {
            return Some(info);
        }
        self.ligand_index
            .iter()
            .find(|abbr| name.ends_with(abbr.as_str()))
            .and_then(|abbr| self.ligands.get(abbr))
    }

    /// Resolve a counter-ion name: direct, then aliases. Counter ions take
    /// no modifiers, so there is no suffix fallback.
    pub fn resolve_counter_ion(&self, name: &str) -> Option<&LigandInfo> {
        if let Some(info) = self.counter_ions.get(name) {
            return Some(info);
        }
        self.counter_ions
            .values()
            .find(|info| info.aliases.iter().any(|alias| alias == name))
    }

    pub(crate) fn metals_longest_first(&self) -> impl Iterator<Item = &str> {
        self.metal_index.iter().map(String::as_str)
    }

    pub(crate) fn ligands_longest_first(&self) -> impl Iterator<Item = &str> {
        self.ligand_index.iter().map(String::as_str)
    }

    pub(crate) fn counter_ions_longest_first(&self) -> impl Iterator<Item = &str> {
        self.counter_ion_index.iter().map(String::as_str)
    }
}

impl Default for ComplexDatabase {
    fn default() -> Self {
        Self::new(
            "complex_database.kdl",
            include_str!("../data/complex_database.kdl"),
        )
        .expect("the bundled complex database is valid")
    }
}

// ---------------------------------------------------------------------------------------------------------------------

/// One ligand (or counter ion — same shape, different table).
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct LigandInfo {
    /// SMILES fragment; empty when the structure hasn't been curated
    pub smiles: String,
    /// Number of coordination sites
    pub denticity: u32,
    /// Formal charge
    pub charge: i32,
    /// Alternate names and abbreviations
    pub aliases: Vec<String>,
    /// Human-readable description
    pub description: String,
}

impl LigandInfo {
    pub fn ligand_type(&self) -> LigandType {
        match self.charge {
            c if c < 0 => LigandType::Anionic,
            c if c > 0 => LigandType::Cationic,
            _ => LigandType::Neutral,
        }
    }
}

impl Default for LigandInfo {
    fn default() -> Self {
        Self {
            smiles: String::new(),
            denticity: 1,
            charge: 0,
            aliases: Vec::new(),
            description: String::new(),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
pub enum LigandType {
    Neutral,
    Anionic,
    Cationic,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct MetalInfo {
    pub symbol: String,
    pub name: String,
    pub oxidation_states: Vec<i32>,
    pub atomic_number: u32,
}

// Private Types =======================================================================================================

type Ligands = HashMap<String, LigandInfo>;
type Metals = HashMap<String, MetalInfo>;

fn key_index<V>(map: &HashMap<String, V>) -> Vec<String> {
    let mut keys: Vec<_> = map.keys().cloned().collect();
    keys.sort_unstable_by_key(|key| (Reverse(key.len()), key.clone()));
    keys
}

// KDL File Schema =====================================================================================================

#[derive(Debug, Decode)]
struct ComplexDatabaseKdl {
    #[knuffel(children(name = "metals"))]
    metals: Vec<MetalsKdl>,
    #[knuffel(children(name = "ligands"))]
    ligands: Vec<LigandsKdl>,
    #[knuffel(children(name = "counter-ions"))]
    counter_ions: Vec<LigandsKdl>,
}

#[derive(Debug, Decode)]
struct MetalsKdl {
    #[knuffel(children)]
    metals: Vec<MetalKdl>,
}

#[derive(Debug, Decode)]
struct MetalKdl {
    #[knuffel(argument)]
    symbol: String,
    #[knuffel(argument)]
    name: String,
    #[knuffel(arguments)]
    oxidation_states: Vec<i32>,
    #[knuffel(property)]
    number: u32,
}

#[derive(Debug, Decode)]
struct LigandsKdl {
    #[knuffel(children)]
    ligands: Vec<LigandKdl>,
}

#[derive(Debug, Decode)]
struct LigandKdl {
    #[knuffel(argument)]
    abbr: String,
    #[knuffel(arguments)]
    aliases: Vec<String>,
    #[knuffel(property)]
    smiles: Option<String>,
    #[knuffel(property)]
    denticity: Option<u32>,
    #[knuffel(property)]
    charge: Option<i32>,
    #[knuffel(property)]
    description: Option<String>,
}

// Conversion From Parsed KDL to Internal Representation ===============================================================

impl TryFrom<ComplexDatabaseKdl> for ComplexDatabase {
    type Error = ComplexDatabaseError;

    fn try_from(value: ComplexDatabaseKdl) -> Result<Self, Self::Error> {
        let metals: Metals = build_metals(value.metals)?;
        let ligands = validate_ligands(value.ligands, Table::Ligand)?;
        let counter_ions = validate_ligands(value.counter_ions, Table::CounterIon)?;
        let ligand_index = key_index(&ligands);
        let metal_index = key_index(&metals);
        let counter_ion_index = key_index(&counter_ions);
        Ok(Self {
            ligands,
            metals,
            counter_ions,
            ligand_index,
            metal_index,
            counter_ion_index,
        })
    }
}

fn build_metals(value: Vec<MetalsKdl>) -> Result<Metals, ComplexDatabaseError> {
    let mut metals = Metals::new();
    for metal in value.into_iter().flat_map(|block| block.metals) {
            let info = MetalInfo {
                symbol: metal.symbol.clone(),
                name: metal.name,
                oxidation_states: metal.oxidation_states,
                atomic_number: metal.number,
            };
            match metals.entry(metal.symbol) {
                Entry::Occupied(e) => {
                    return Err(ComplexDatabaseError::DuplicateMetal {
                        symbol: e.key().clone(),
                    });
                }
                Entry::Vacant(e) => e.insert(info),
            };
        }
        Ok(metals)
}

fn validate_ligands(
    blocks: Vec<LigandsKdl>,
    table: Table,
) -> Result<Ligands, ComplexDatabaseError> {
    let mut ligands = Ligands::new();
    for ligand in blocks.into_iter().flat_map(|block| block.ligands) {
        let denticity = ligand.denticity.unwrap_or(1);
        if denticity == 0 {
            return Err(ComplexDatabaseError::InvalidDenticity { abbr: ligand.abbr });
        }
        let info = LigandInfo {
            smiles: ligand.smiles.unwrap_or_default(),
            denticity,
            charge: ligand.charge.unwrap_or(0),
            aliases: ligand.aliases,
            description: ligand.description.unwrap_or_default(),
        };
        match ligands.entry(ligand.abbr) {
            Entry::Occupied(e) => {
                return Err(ComplexDatabaseError::DuplicateEntry {
                    table,
                    abbr: e.key().clone(),
                });
            }
            Entry::Vacant(e) => e.insert(info),
        };
    }
    Ok(ligands)
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
pub enum Table {
    #[display("ligand")]
    Ligand,
    #[display("counter ion")]
    CounterIon,
}

// Errors ==============================================================================================================

#[derive(Clone, Eq, PartialEq, Debug, Diagnostic, Error)]
pub enum ComplexDatabaseError {
    #[error("the metal {symbol:?} is defined more than once")]
    DuplicateMetal { symbol: String },

    #[error("the {table} {abbr:?} is defined more than once")]
    DuplicateEntry { table: Table, abbr: String },

    #[diagnostic(help("denticity counts coordination sites, so it must be at least 1"))]
    #[error("the ligand {abbr:?} has a denticity of 0")]
    InvalidDenticity { abbr: String },
}

// Module Tests ========================================================================================================
