use std::sync::LazyLock;

use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};
use organometal::{complex_to_smiles, ComplexDatabase};
use peptidic::{looks_like_shorthand, shorthand_to_iupac, ResidueDatabase};
use rustyline::DefaultEditor;
use thiserror::Error;

static RESIDUE_DB: LazyLock<ResidueDatabase> = LazyLock::new(ResidueDatabase::default);
static COMPLEX_DB: LazyLock<ComplexDatabase> = LazyLock::new(ComplexDatabase::default);

#[derive(Clone, Debug, Diagnostic, Error)]
enum ReplError {
    #[diagnostic(transparent)]
    #[error(transparent)]
    Peptide(#[from] peptidic::Error),

    #[diagnostic(transparent)]
    #[error(transparent)]
    Complex(#[from] organometal::ComplexError),
}

fn main() {
    let mut rl = DefaultEditor::new().unwrap();
    while let Ok(name) = rl.readline("Name: ") {
        rl.add_history_entry(&name).unwrap();
        match resolve(&name) {
            Ok(resolved) => println!("{resolved}\n"),
            Err(diagnostic) => render_error(&diagnostic),
        }
    }
}

fn resolve(name: &str) -> Result<String, ReplError> {
    if looks_like_shorthand(&RESIDUE_DB, name) {
        Ok(shorthand_to_iupac(&RESIDUE_DB, name)?)
    } else {
        Ok(complex_to_smiles(&COMPLEX_DB, name)?)
    }
}

fn render_error(diagnostic: &dyn Diagnostic) {
    let mut buf = String::new();
    GraphicalReportHandler::new_themed(GraphicalTheme::unicode())
        .render_report(&mut buf, diagnostic)
        .unwrap();
    println!("{buf}");
}
