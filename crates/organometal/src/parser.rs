//! Parses bracketed coordination-complex notation into `ParsedComplex`
//! structures; SMILES assembly lives in `builder`

use std::sync::LazyLock;

use nom::{
    bytes::complete::take_till1,
    character::complete::{char, digit0},
    combinator::map,
    IResult,
};
use regex::Regex;

use crate::{ComplexDatabase, ComplexError, ParsedComplex, ParsedLigand, Result};

// End-anchored notation is peeled off the string back-to-front before the
// bracketed core is read; each pattern keys off the final ']'.
static MULTIPLICITY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\](\d+)$").unwrap());
static CHARGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\](\d*)([+-])$").unwrap());
static COUNTER_TAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\]([A-Za-z0-9()]+)$").unwrap());

/// Parser for complex names in the common formats:
///   - `[Metal(Ligand)n(Ligand2)m]charge`
///   - `[Metal(Ligand)n]multiplicity`
///   - `[Metal(Ligand)n]CounterIon`
pub struct ComplexNameParser<'d> {
    db: &'d ComplexDatabase,
}

impl<'d> ComplexNameParser<'d> {
    pub fn new(db: &'d ComplexDatabase) -> Self {
        Self { db }
    }

    /// Parse a complex name into its components. Unknown ligands and
    /// unmatched counter-ion text never fail the parse — only a missing
    /// metal symbol is fatal.
    pub fn parse(&self, name: &str) -> Result<ParsedComplex> {
        let mut working = name.trim().to_owned();

        let multiplicity = extract_multiplicity(&mut working);
        let counter_ions = self.extract_counter_ions(&mut working);
        let complex_charge = extract_charge(&mut working);
        strip_brackets(&mut working);
        let (metal, ligand_text) = self.extract_metal(&working)?;
        let ligands = self.parse_ligands(ligand_text);

        Ok(ParsedComplex {
            metal,
            ligands,
            complex_charge,
            multiplicity,
            counter_ions,
        })
    }

    /// Counter-ion text sits after the final ']'. Known ions are matched
    /// longest-name-first, each at most once, with an optional digit run as
    /// a repeat count; whatever remains unmatched is dropped.
    fn extract_counter_ions(&self, name: &mut String) -> Vec<(String, u32)> {
        let mut counter_ions = Vec::new();
        if name.ends_with(']') {
            return counter_ions;
        }
        let Some(captures) = COUNTER_TAIL_RE.captures(name) else {
            return counter_ions;
        };
        let mut counter_text = captures[1].to_owned();
        let end = captures.get(0).unwrap().start() + 1;
        name.truncate(end);

        for key in self.db.counter_ions_longest_first() {
            let Some(position) = counter_text.find(key) else {
                continue;
            };
            let after = position + key.len();
            let digits = counter_text[after..]
                .bytes()
                .take_while(u8::is_ascii_digit)
                .count();
            let count = counter_text[after..after + digits].parse().unwrap_or(1);
            counter_ions.push((key.to_owned(), count));
            counter_text.replace_range(position..after + digits, "");
        }

        counter_ions
    }

    fn extract_metal<'n>(&self, name: &'n str) -> Result<(String, &'n str)> {
        // Longest symbols first, so "Ir" isn't shadowed by a shorter match
        for symbol in self.db.metals_longest_first() {
            if let Some(rest) = name.strip_prefix(symbol) {
                return Ok((symbol.to_owned(), rest));
            }
        }
        Err(ComplexError::UnknownMetal {
            name: name.to_owned(),
        })
    }

    /// Ligands = { Parenthesized Ligand | Known Ligand | Unknown Ligand } ;
    fn parse_ligands(&self, text: &str) -> Vec<ParsedLigand> {
        let mut ligands = Vec::new();
        let mut rest = text.trim_start();
        while !rest.is_empty() {
            let parsed = parenthesized_ligand(rest)
                .or_else(|_| known_ligand(self.db)(rest))
                .or_else(|_| unknown_ligand(rest));
            match parsed {
                Ok((remaining, ligand)) => {
                    if !ligand.name.is_empty() {
                        ligands.push(ligand);
                    }
                    rest = remaining;
                }
                // A stray bracket character — drop it and carry on
                Err(_) => {
                    let mut chars = rest.chars();
                    chars.next();
                    rest = chars.as_str();
                }
            }
            rest = rest.trim_start();
        }
        ligands
    }
}

fn extract_multiplicity(name: &mut String) -> u32 {
    let Some(captures) = MULTIPLICITY_RE.captures(name) else {
        return 1;
    };
    let multiplicity = captures[1].parse().unwrap_or(1);
    // Keep the closing bracket, drop the digits
    let end = captures.get(0).unwrap().start() + 1;
    name.truncate(end);
    multiplicity
}

fn extract_charge(name: &mut String) -> i32 {
    let Some(captures) = CHARGE_RE.captures(name) else {
        return 0;
    };
    let magnitude: i32 = if captures[1].is_empty() {
        1
    } else {
        captures[1].parse().unwrap_or(1)
    };
    let sign = if &captures[2] == "+" { 1 } else { -1 };
    let end = captures.get(0).unwrap().start() + 1;
    name.truncate(end);
    magnitude * sign
}

fn strip_brackets(name: &mut String) {
    let trimmed = name.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('[') && trimmed.ends_with(']') {
        *name = trimmed[1..trimmed.len() - 1].to_owned();
    } else if trimmed.len() != name.len() {
        *name = trimmed.to_owned();
    }
}

// Ligand sub-parsers ==================================================================================================

type ParseResult<'s, O> = IResult<&'s str, O>;

/// Parenthesized Ligand = "(" , { any } , ")" , [ Count ] ;
///
/// The balanced close is found by depth counting, so nested names like
/// `(dF(CF3)ppy)` survive intact. An unbalanced group swallows the rest of
/// the string rather than erroring.
fn parenthesized_ligand(i: &str) -> ParseResult<'_, ParsedLigand> {
    let (rest, _) = char('(')(i)?;
    let mut depth = 1_u32;
    let mut close = None;
    for (index, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(index);
                    break;
                }
            }
            _ => {}
        }
    }
    let (name, after) = match close {
        Some(index) => (&rest[..index], &rest[index + 1..]),
        None => (rest, ""),
    };
    let (after, count) = trailing_count(after)?;
    Ok((after, ParsedLigand::with_count(name, count)))
}

/// Known Ligand = ligand abbreviation (longest first) , [ Count ] ;
fn known_ligand<'d, 's>(
    db: &'d ComplexDatabase,
) -> impl FnMut(&'s str) -> ParseResult<'s, ParsedLigand> + 'd {
    move |i| {
        for abbr in db.ligands_longest_first() {
            if let Some(rest) = i.strip_prefix(abbr) {
                let (rest, count) = trailing_count(rest)?;
                return Ok((rest, ParsedLigand::with_count(abbr, count)));
            }
        }
        Err(nom::Err::Error(nom::error::Error::new(
            i,
            nom::error::ErrorKind::Tag,
        )))
    }
}

/// Unknown Ligand = { any character except brackets }- , [ Count ] ;
fn unknown_ligand(i: &str) -> ParseResult<'_, ParsedLigand> {
    let (rest, token) = take_till1(|c| "()[]".contains(c))(i)?;
    let (name, count) = split_trailing_count(token);
    Ok((rest, ParsedLigand::with_count(name, count)))
}

/// Count = { digit } ; (an absent count means 1)
fn trailing_count(i: &str) -> ParseResult<'_, u32> {
    map(digit0, |digits: &str| digits.parse().unwrap_or(1))(i)
}

fn split_trailing_count(token: &str) -> (&str, u32) {
    let digits = token
        .bytes()
        .rev()
        .take_while(u8::is_ascii_digit)
        .count();
    let split = token.len() - digits;
    if digits == 0 || split == 0 {
        (token, 1)
    } else {
        (&token[..split], token[split..].parse().unwrap_or(1))
    }
}

// Module Tests ========================================================================================================
