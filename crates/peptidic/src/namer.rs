//! Emits an IUPAC-style name from a parsed `Peptide`

use std::fmt::Write;

use itertools::Itertools;

use crate::{residue_database::synthesize_acyl, Peptide, Residue, ResidueDatabase, Stereo};

impl Peptide {
    /// The expanded IUPAC-style name for this peptide.
    ///
    /// Residue order is preserved; every residue but the last uses the acyl
    /// ("-yl") form, and cyclic peptides use it everywhere since a ring has
    /// no terminus.
    pub fn iupac_name(&self, db: &ResidueDatabase) -> String {
        let last = self.residues.len().saturating_sub(1);
        let mut fragments = self.residues.iter().enumerate().map(|(i, residue)| {
            let is_last = !self.cyclic && i == last;
            residue_fragment(db, residue, is_last)
        });

        let mut name = fragments.join("-");
        if self.cyclic {
            name = format!("cyclo({name})");
        }
        if !self.n_cap.is_empty() {
            name = format!("{}-{name}", self.n_cap);
        }
        if !self.c_cap.is_empty() {
            write!(name, " {}", self.c_cap).unwrap();
        }
        if let Some(counter_acid) = &self.counter_acid {
            write!(name, " {counter_acid}").unwrap();
        }
        name
    }
}

fn residue_fragment(db: &ResidueDatabase, residue: &Residue, is_last: bool) -> String {
    match residue {
        // Unresolved tokens pass through verbatim — optionally with the
        // stereo descriptor reattached as plain text
        Residue::Unknown { stereo, text } => match stereo {
            Some(stereo) => format!("{stereo}-{text}"),
            None => text.clone(),
        },
        Residue::Known {
            stereo,
            greek,
            methylated,
            name,
            protection,
        } => {
            let description = db.amino_acid_by_name(name);
            let mut fragment = if is_last {
                name.clone()
            } else {
                description.map_or_else(|| synthesize_acyl(name), |aa| aa.acyl.clone())
            };
            // Achiral residues (glycine) never take a stereo prefix;
            // everything else defaults to L when unmarked
            let achiral = description.is_some_and(|aa| aa.achiral);
            if !achiral {
                let stereo = stereo.unwrap_or(Stereo::L);
                fragment = format!("{stereo}-{fragment}");
            }
            if let Some(greek) = greek {
                fragment = format!("{greek}-{fragment}");
            }
            if *methylated {
                fragment = format!("methyl-{fragment}");
            }
            if let Some(protection) = protection {
                fragment = format!("{protection}-{fragment}");
            }
            fragment
        }
    }
}
