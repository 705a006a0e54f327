//! Turns shorthand strings into `Peptide` structures; emission lives in
//! `namer`

use crate::{
    residue_database::lookup_key, Error, Peptide, Residue, ResidueDatabase, Result, Stereo,
};

const GREEK_LETTERS: [char; 24] = [
    'α', 'β', 'γ', 'δ', 'ε', 'ζ', 'η', 'θ', 'ι', 'κ', 'λ', 'μ', 'ν', 'ξ', 'ο', 'π', 'ρ', 'σ',
    'τ', 'υ', 'φ', 'χ', 'ψ', 'ω',
];

/// Cyclic-peptide opening markers, each paired with its closing delimiter.
/// A bare `cyclo` prefix (no bracket) is handled separately, after these.
const CYCLO_MARKERS: [(&str, char); 5] = [
    ("cyclo(", ')'),
    ("cyclo[", ']'),
    ("cyclo-(", ')'),
    ("cyclo-[", ']'),
    ("cyclo-{", '}'),
];

/// Inline stereo markers prefixed directly onto a residue token. The
/// five-character marker must be tried first.
const INLINE_STEREO_MARKERS: [(&str, Stereo); 3] = [
    ("(d/l)", Stereo::Dl),
    ("(d)", Stereo::D),
    ("(l)", Stereo::L),
];

/// Split shorthand into residue tokens at `-`, but only at paren-depth 0 —
/// protected residues like `Asp(OtBu)` must survive intact. Empty tokens
/// (from doubled delimiters) are dropped. Unbalanced parentheses are not an
/// error here; a `-` at non-zero depth is simply literal text.
pub fn split_shorthand(shorthand: &str) -> Vec<&str> {
    let shorthand = shorthand.trim();
    let mut tokens = Vec::new();
    let mut depth = 0_i32;
    let mut start = 0;
    for (i, c) in shorthand.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            '-' if depth == 0 => {
                if i > start {
                    tokens.push(&shorthand[start..i]);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < shorthand.len() {
        tokens.push(&shorthand[start..]);
    }
    tokens
}

impl Peptide {
    pub fn parse(db: &ResidueDatabase, shorthand: impl AsRef<str>) -> Result<Self> {
        let normalized = normalize(shorthand.as_ref());
        let (cyclic, inner) = strip_cyclic(&normalized);
        let renormalized = normalize(inner);
        let (counter_acid, remaining) = extract_counter_acid(db, &renormalized);
        let mut tokens = split_shorthand(&remaining);

        let mut n_cap = String::new();
        if let Some(&first) = tokens.first() {
            if let Some(cap) = db.n_cap(first) {
                n_cap = cap.to_owned();
                tokens.remove(0);
            }
        }

        let mut c_cap = String::new();
        if let Some(&last) = tokens.last() {
            if let Some(cap) = db.c_cap(last) {
                c_cap = cap.to_owned();
                tokens.pop();
            }
        }

        if tokens.is_empty() {
            return Err(Error::NoResidues);
        }

        let mut residues = Vec::new();
        let mut tokens = tokens.into_iter();
        while let Some(token) = tokens.next() {
            if let Some(stereo) = standalone_stereo(token) {
                // The descriptor applies to the *following* token
                match tokens.next() {
                    Some(residue) => residues.push(classify(db, Some(stereo), residue)),
                    // A trailing stereo descriptor is emitted literally
                    None => residues.push(Residue::Unknown {
                        stereo: None,
                        text: stereo.dangling().to_owned(),
                    }),
                }
            } else {
                residues.push(classify(db, None, token));
            }
        }

        Ok(Self {
            cyclic,
            n_cap,
            c_cap,
            counter_acid,
            residues,
        })
    }
}

fn normalize(shorthand: &str) -> String {
    shorthand.trim().trim_matches('-').replace("--", "-")
}

fn strip_cyclic(shorthand: &str) -> (bool, &str) {
    for (marker, closer) in CYCLO_MARKERS {
        if let Some(rest) = strip_prefix_ci(shorthand, marker) {
            if let Some(inner) = rest.strip_suffix(closer) {
                return (true, inner);
            }
        }
    }
    if let Some(rest) = strip_prefix_ci(shorthand, "cyclo") {
        return (true, rest);
    }
    (false, shorthand)
}

/// A counter-acid suffix is extracted only from unambiguous `A.B` forms
/// where exactly one of the two segments is a known salt; anything else is
/// deliberately left untouched.
fn extract_counter_acid(db: &ResidueDatabase, shorthand: &str) -> (Option<String>, String) {
    let segments: Vec<&str> = shorthand.split('.').collect();
    if segments.len() != 2 {
        return (None, shorthand.to_owned());
    }
    let matches: Vec<_> = segments
        .iter()
        .enumerate()
        .filter(|(_, segment)| db.counter_acid(segment).is_some())
        .collect();
    if let &[(index, segment)] = &matches[..] {
        let suffix = db.counter_acid(segment).map(str::to_owned);
        (suffix, segments[1 - index].to_owned())
    } else {
        (None, shorthand.to_owned())
    }
}

fn standalone_stereo(token: &str) -> Option<Stereo> {
    match lookup_key(token).as_str() {
        "d" | "(d)" => Some(Stereo::D),
        "l" | "(l)" => Some(Stereo::L),
        "dl" | "(dl)" | "d/l" | "(d/l)" | "d,l" | "(d,l)" => Some(Stereo::Dl),
        _ => None,
    }
}

fn classify(db: &ResidueDatabase, explicit_stereo: Option<Stereo>, token: &str) -> Residue {
    let mut text = token;
    let mut stereo = explicit_stereo;

    if stereo.is_none() {
        for (marker, parsed) in INLINE_STEREO_MARKERS {
            if let Some(rest) = strip_prefix_ci(text, marker) {
                stereo = Some(parsed);
                text = rest;
                break;
            }
        }
    }

    let mut greek = None;
    if let Some(c) = text.chars().next() {
        if GREEK_LETTERS.contains(&c) {
            greek = Some(c);
            text = &text[c.len_utf8()..];
        }
    }

    let mut methylated = false;
    for marker in ["(me)", "me"] {
        if let Some(rest) = strip_prefix_ci(text, marker) {
            if db.amino_acid(rest).is_some() {
                methylated = true;
                text = rest;
                break;
            }
        }
    }

    if text.contains('(') && text.ends_with(')') {
        if let Some(protected) = db.protection(text) {
            return Residue::Known {
                stereo,
                greek,
                methylated,
                name: protected.name.clone(),
                protection: Some(protected.protection.clone()),
            };
        }
        // SAFETY: The `.unwrap()` is fine — we just checked for a '('
        let (base, inside) = text.split_once('(').unwrap();
        let description = inside.strip_suffix(')').unwrap_or(inside);
        if let Some(amino_acid) = db.amino_acid(base) {
            return Residue::Known {
                stereo,
                greek,
                methylated,
                name: amino_acid.name.clone(),
                protection: Some(format!("with {description} protection")),
            };
        }
    }

    if let Some(amino_acid) = db.amino_acid(text) {
        return Residue::Known {
            stereo,
            greek,
            methylated,
            name: amino_acid.name.clone(),
            protection: None,
        };
    }

    Residue::Unknown {
        stereo,
        text: text.to_owned(),
    }
}

fn strip_prefix_ci<'s>(text: &'s str, prefix: &str) -> Option<&'s str> {
    let candidate = text.get(..prefix.len())?;
    candidate
        .eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use super::*;

    static DB: LazyLock<ResidueDatabase> = LazyLock::new(ResidueDatabase::default);

    #[test]
    fn test_split_shorthand() {
        // Hyphens inside parens must not split
        assert_eq!(split_shorthand("Asp(OtBu)-Phe"), vec!["Asp(OtBu)", "Phe"]);
        assert_eq!(
            split_shorthand("Boc-Gly-L-Ala-OMe"),
            vec!["Boc", "Gly", "L", "Ala", "OMe"]
        );
        assert_eq!(
            split_shorthand("Tyr(2-br-z)-Gly"),
            vec!["Tyr(2-br-z)", "Gly"]
        );
        // Empty tokens are dropped
        assert_eq!(split_shorthand("Gly--Ala"), vec!["Gly", "Ala"]);
        assert_eq!(split_shorthand("-Gly-"), vec!["Gly"]);
        // Unbalanced parens: no panic, hyphens at depth > 0 stay literal
        assert_eq!(split_shorthand("Ala(x-y"), vec!["Ala(x-y"]);
        // A stray ')' leaves the counter negative, so later hyphens stay put
        assert_eq!(split_shorthand("Ala)x-y"), vec!["Ala)x-y"]);
        // Degenerate inputs
        assert_eq!(split_shorthand(""), Vec::<&str>::new());
        assert_eq!(split_shorthand("---"), Vec::<&str>::new());
    }

    #[test]
    fn caps_are_stripped() {
        let peptide = Peptide::parse(&DB, "Boc-Gly-Ala-OMe").unwrap();
        assert_eq!(peptide.n_cap, "tert-butoxycarbonyl");
        assert_eq!(peptide.c_cap, "methyl ester");
        assert_eq!(peptide.residues.len(), 2);
    }

    #[test]
    fn free_termini_caps_are_empty() {
        let peptide = Peptide::parse(&DB, "H-Gly-OH").unwrap();
        assert_eq!(peptide.n_cap, "");
        assert_eq!(peptide.c_cap, "");
        assert_eq!(peptide.residues.len(), 1);
    }

    #[test]
    fn no_residues_is_an_error() {
        assert_eq!(Peptide::parse(&DB, "Boc-OH"), Err(Error::NoResidues));
        assert_eq!(Peptide::parse(&DB, ""), Err(Error::NoResidues));
        assert_eq!(Peptide::parse(&DB, "---"), Err(Error::NoResidues));
    }

    #[test]
    fn cyclic_markers() {
        for shorthand in [
            "cyclo(Gly-Ala)",
            "cyclo[Gly-Ala]",
            "cyclo-(Gly-Ala)",
            "cyclo-[Gly-Ala]",
            "cyclo-{Gly-Ala}",
            "CYCLO(Gly-Ala)",
            "cyclo-Gly-Ala",
        ] {
            let peptide = Peptide::parse(&DB, shorthand).unwrap();
            assert!(peptide.cyclic, "{shorthand} should parse as cyclic");
            assert_eq!(peptide.residues.len(), 2, "{shorthand}");
        }
        assert!(!Peptide::parse(&DB, "Gly-Ala").unwrap().cyclic);
    }

    #[test]
    fn stereo_descriptor_tokens() {
        let peptide = Peptide::parse(&DB, "D-Ala-L-Ser-DL-Val").unwrap();
        let stereos: Vec<_> = peptide
            .residues
            .iter()
            .map(|residue| match residue {
                Residue::Known { stereo, .. } | Residue::Unknown { stereo, .. } => *stereo,
            })
            .collect();
        assert_eq!(
            stereos,
            vec![Some(Stereo::D), Some(Stereo::L), Some(Stereo::Dl)]
        );
    }

    #[test]
    fn dangling_stereo_descriptor() {
        let peptide = Peptide::parse(&DB, "Gly-D").unwrap();
        assert_eq!(
            peptide.residues[1],
            Residue::Unknown {
                stereo: None,
                text: "d".to_owned(),
            }
        );
        let peptide = Peptide::parse(&DB, "Gly-DL").unwrap();
        assert_eq!(
            peptide.residues[1],
            Residue::Unknown {
                stereo: None,
                text: "d/l".to_owned(),
            }
        );
    }

    #[test]
    fn inline_stereo_markers() {
        let peptide = Peptide::parse(&DB, "(D)Leu-Gly").unwrap();
        assert_eq!(
            peptide.residues[0],
            Residue::Known {
                stereo: Some(Stereo::D),
                greek: None,
                methylated: false,
                name: "leucine".to_owned(),
                protection: None,
            }
        );
        // (D/L) normalizes to the same descriptor as a standalone DL- token
        let peptide = Peptide::parse(&DB, "(D/L)Ala-Gly").unwrap();
        assert!(matches!(
            &peptide.residues[0],
            Residue::Known {
                stereo: Some(Stereo::Dl),
                ..
            }
        ));
    }

    #[test]
    fn greek_letter_locants() {
        let peptide = Peptide::parse(&DB, "H-βAla-OH").unwrap();
        assert_eq!(
            peptide.residues[0],
            Residue::Known {
                stereo: None,
                greek: Some('β'),
                methylated: false,
                name: "alanine".to_owned(),
                protection: None,
            }
        );
    }

    #[test]
    fn n_methylation_markers() {
        for token in ["MeLeu", "(Me)Leu", "meleu"] {
            let peptide = Peptide::parse(&DB, format!("{token}-Gly")).unwrap();
            assert_eq!(
                peptide.residues[0],
                Residue::Known {
                    stereo: None,
                    greek: None,
                    methylated: true,
                    name: "leucine".to_owned(),
                    protection: None,
                },
                "{token}"
            );
        }
        // "Met" starts with "me", but "t" is no amino acid — not a marker
        let peptide = Peptide::parse(&DB, "Met-Gly").unwrap();
        assert!(matches!(
            &peptide.residues[0],
            Residue::Known {
                methylated: false,
                name,
                ..
            } if name == "methionine"
        ));
    }

    #[test]
    fn protected_residues() {
        // Composite key straight from the protections table
        let peptide = Peptide::parse(&DB, "Lys(Boc)-Gly").unwrap();
        assert_eq!(
            peptide.residues[0],
            Residue::Known {
                stereo: None,
                greek: None,
                methylated: false,
                name: "lysine".to_owned(),
                protection: Some("Nε-(tert-butoxycarbonyl)".to_owned()),
            }
        );
        // Known base residue with free-text protection
        let peptide = Peptide::parse(&DB, "Lys(Xyz)-Gly").unwrap();
        assert_eq!(
            peptide.residues[0],
            Residue::Known {
                stereo: None,
                greek: None,
                methylated: false,
                name: "lysine".to_owned(),
                protection: Some("with Xyz protection".to_owned()),
            }
        );
        // Unknown base residue stays unparsed
        let peptide = Peptide::parse(&DB, "Xen(Boc)-Gly").unwrap();
        assert_eq!(
            peptide.residues[0],
            Residue::Unknown {
                stereo: None,
                text: "Xen(Boc)".to_owned(),
            }
        );
    }

    #[test]
    fn counter_acid_extraction() {
        let peptide = Peptide::parse(&DB, "H-Phe-Leu-OH.2HCl").unwrap();
        assert_eq!(peptide.counter_acid.as_deref(), Some("dihydrochloride"));
        assert_eq!(peptide.residues.len(), 2);
        // The salt segment may come first, too
        let peptide = Peptide::parse(&DB, "TFA.H-Gly-OH").unwrap();
        assert_eq!(peptide.counter_acid.as_deref(), Some("trifluoroacetate"));
        // Ambiguous (both segments match) — left untouched
        let peptide = Peptide::parse(&DB, "HCl.2HBr").unwrap();
        assert_eq!(peptide.counter_acid, None);
        // Three segments — left untouched
        let peptide = Peptide::parse(&DB, "H-Gly-OH.HCl.H2O").unwrap();
        assert_eq!(peptide.counter_acid, None);
    }
}
