//! Assembles best-effort SMILES strings from parsed complexes

use std::iter;

use itertools::Itertools;

use crate::{ComplexDatabase, ComplexError, ParsedComplex, Result};

/// Builds SMILES from a `ParsedComplex`.
///
/// SMILES cannot express coordinate bonding, so the metal centre and its
/// ligands are emitted as disconnected fragments joined by `.` — the
/// components are right, the topology is approximate.
pub struct SmilesBuilder<'d> {
    db: &'d ComplexDatabase,
}

impl<'d> SmilesBuilder<'d> {
    pub fn new(db: &'d ComplexDatabase) -> Self {
        Self { db }
    }

    /// Build the SMILES for one parsed complex. Fails only when a ligand
    /// or counter-ion name cannot be resolved at all; known species without
    /// curated SMILES resolve but contribute no fragment.
    pub fn build(&self, parsed: &ParsedComplex) -> Result<String> {
        let metal_charge = self.metal_charge(parsed);

        let mut fragments = vec![format_metal(&parsed.metal, metal_charge)];
        for ligand in &parsed.ligands {
            let info =
                self.db
                    .resolve_ligand(&ligand.name)
                    .ok_or_else(|| ComplexError::UnknownLigand {
                        name: ligand.name.clone(),
                    })?;
            if info.smiles.is_empty() {
                continue;
            }
            for _ in 0..ligand.count {
                fragments.push(info.smiles.clone());
            }
        }

        let unit = fragments.join(".");
        let multiplicity = parsed.multiplicity.max(1) as usize;
        let mut smiles = iter::repeat(unit).take(multiplicity).join(".");

        for (name, count) in &parsed.counter_ions {
            let info =
                self.db
                    .resolve_counter_ion(name)
                    .ok_or_else(|| ComplexError::UnknownCounterIon { name: name.clone() })?;
            if info.smiles.is_empty() {
                continue;
            }
            for _ in 0..*count {
                smiles.push('.');
                smiles.push_str(&info.smiles);
            }
        }

        Ok(smiles)
    }

    /// Charge balance for the metal centre:
    /// `metal = complex charge per formula unit - total ligand charge`.
    /// With counter ions present, the complex charge is inferred from them
    /// instead of the parsed value, since the overall compound is neutral.
    fn metal_charge(&self, parsed: &ParsedComplex) -> i32 {
        let ligand_charge: i32 = parsed
            .ligands
            .iter()
            .map(|ligand| {
                self.db
                    .resolve_ligand(&ligand.name)
                    .map_or(0, |info| info.charge * ligand.count as i32)
            })
            .sum();

        let complex_charge = if parsed.counter_ions.is_empty() {
            parsed.complex_charge
        } else {
            -parsed
                .counter_ions
                .iter()
                .map(|(name, count)| {
                    self.db
                        .resolve_counter_ion(name)
                        .map_or(0, |info| info.charge * *count as i32)
                })
                .sum::<i32>()
        };

        let per_unit = complex_charge.div_euclid(parsed.multiplicity.max(1) as i32);
        per_unit - ligand_charge
    }
}

fn format_metal(symbol: &str, charge: i32) -> String {
    match charge {
        0 => format!("[{symbol}]"),
        1 => format!("[{symbol}+]"),
        -1 => format!("[{symbol}-]"),
        c if c > 1 => format!("[{symbol}+{c}]"),
        c => format!("[{symbol}{c}]"),
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use insta::assert_snapshot;

    use super::*;
    use crate::{complex_to_smiles, ComplexNameParser, LigandInfo, ParsedLigand};

    static DB: LazyLock<ComplexDatabase> = LazyLock::new(ComplexDatabase::default);

    fn convert(name: &str) -> String {
        complex_to_smiles(&DB, name).unwrap()
    }

    #[test]
    fn test_format_metal() {
        assert_eq!(format_metal("Ir", 0), "[Ir]");
        assert_eq!(format_metal("Ir", 1), "[Ir+]");
        assert_eq!(format_metal("Ir", 3), "[Ir+3]");
        assert_eq!(format_metal("Ir", -1), "[Ir-]");
        assert_eq!(format_metal("Ir", -2), "[Ir-2]");
    }

    #[test]
    fn dimers_repeat_the_whole_unit() {
        assert_snapshot!(
            convert("[IrCl(cod)]2"),
            @"[Ir+].[Cl-].C1=CCCC=CCC1.[Ir+].[Cl-].C1=CCCC=CCC1"
        );
    }

    #[test]
    fn counter_ions_fix_the_complex_charge() {
        // PF6⁻ implies a +1 complex; with two anionic ppy ligands the
        // balance lands on Ir(III)
        assert_snapshot!(
            convert("[Ir(ppy)2(bpy)]PF6"),
            @"[Ir+3].[c-]1ccccc1-c1ccccn1.[c-]1ccccc1-c1ccccn1.c1ccc(-c2ccccn2)nc1.F[P-](F)(F)(F)(F)F"
        );
    }

    #[test]
    fn explicit_charge_reaches_the_metal() {
        assert_snapshot!(
            convert("[Ru(NH3)6]3+"),
            @"[Ru+3].N.N.N.N.N.N"
        );
        assert_snapshot!(
            convert("[Fe(CO)5]"),
            @"[Fe].[C-]#[O+].[C-]#[O+].[C-]#[O+].[C-]#[O+].[C-]#[O+]"
        );
    }

    #[test]
    fn neutral_complexes() {
        assert_snapshot!(
            convert("[Pd(PPh3)4]"),
            @"[Pd].c1ccc(P(c2ccccc2)c3ccccc3)cc1.c1ccc(P(c2ccccc2)c3ccccc3)cc1.c1ccc(P(c2ccccc2)c3ccccc3)cc1.c1ccc(P(c2ccccc2)c3ccccc3)cc1"
        );
        assert_snapshot!(
            convert("[PtCl2(en)]"),
            @"[Pt+2].[Cl-].[Cl-].NCCN"
        );
    }

    #[test]
    fn modified_ligands_fall_back_to_their_base() {
        // `dF(CF3)ppy` resolves to `ppy` by suffix, charge included, so the
        // balance matches the unmodified complex
        assert_snapshot!(
            convert("[Ir(dF(CF3)ppy)2(bpy)]PF6"),
            @"[Ir+3].[c-]1ccccc1-c1ccccn1.[c-]1ccccc1-c1ccccn1.c1ccc(-c2ccccn2)nc1.F[P-](F)(F)(F)(F)F"
        );
    }

    #[test]
    fn known_species_without_smiles_contribute_no_fragment() {
        // hfac is in the database (charge -1) but has no curated SMILES
        assert_snapshot!(convert("[Fe(hfac)3]"), @"[Fe+3]");
    }

    #[test]
    fn metal_charge_balances() {
        let builder = SmilesBuilder::new(&DB);
        let parser = ComplexNameParser::new(&DB);

        // No counter ions, no charged ligands: metal charge is the complex
        // charge divided by multiplicity
        let parsed = parser.parse("[Ru(bpy)3]2+").unwrap();
        assert_eq!(builder.metal_charge(&parsed), 2);

        let mut parsed = parser.parse("[Ru(bpy)3]2+").unwrap();
        parsed.complex_charge = 4;
        parsed.multiplicity = 2;
        assert_eq!(builder.metal_charge(&parsed), 2);

        // Anionic ligands push the metal up
        let parsed = parser.parse("[Fe(CN)6]4-").unwrap();
        assert_eq!(builder.metal_charge(&parsed), 2);

        // Counter ions override the parsed complex charge
        let parsed = parser.parse("[Ir(ppy)2(bpy)]PF6").unwrap();
        assert_eq!(builder.metal_charge(&parsed), 3);
    }

    #[test]
    fn unknown_ligands_fail_the_build_not_the_parse() {
        let parsed = ComplexNameParser::new(&DB).parse("[Fe(xyzzy)2]").unwrap();
        assert_eq!(parsed.ligands, vec![ParsedLigand::with_count("xyzzy", 2)]);
        assert_eq!(
            SmilesBuilder::new(&DB).build(&parsed),
            Err(ComplexError::UnknownLigand {
                name: "xyzzy".to_owned(),
            })
        );
    }

    #[test]
    fn unknown_counter_ions_fail_the_build() {
        let parsed = ParsedComplex {
            metal: "Fe".to_owned(),
            ligands: Vec::new(),
            complex_charge: 0,
            multiplicity: 1,
            counter_ions: vec![("Qq".to_owned(), 1)],
        };
        assert_eq!(
            SmilesBuilder::new(&DB).build(&parsed),
            Err(ComplexError::UnknownCounterIon {
                name: "Qq".to_owned(),
            })
        );
    }

    #[test]
    fn registered_ligands_are_usable_immediately() {
        let mut db = ComplexDatabase::default();
        db.register_ligand(
            "PhCN",
            LigandInfo {
                smiles: "N#Cc1ccccc1".to_owned(),
                description: "Benzonitrile".to_owned(),
                ..LigandInfo::default()
            },
        );
        assert_eq!(
            complex_to_smiles(&db, "[Pd(PhCN)2Cl2]").unwrap(),
            "[Pd+2].N#Cc1ccccc1.N#Cc1ccccc1.[Cl-].[Cl-]"
        );
    }
}
