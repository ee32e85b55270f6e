//! Fixture-driven checks of tokenization and id assignment.
//!
//! Every `test-data/markup/*.json` file is one case: input markup, the
//! expected tokenized markup and either the expected markup with ids or the
//! kind of error id assignment must raise.

use std::fs;
use std::path::{Path, PathBuf};

use libtest_mimic::{Arguments, Failed, Trial};
use readalong_align::text::ids::assign_ids;
use readalong_align::text::tokenize::tokenize;
use readalong_align::{AlignmentError, Document, LanguageRegistry};
use serde::Deserialize;

const SUITE_NAME: &str = "markup_reference";
const UNIT_TAG: &str = "w";

#[derive(Debug, Deserialize)]
struct MarkupCase {
    #[serde(default)]
    description: String,
    input: String,
    tokenized: String,
    #[serde(default)]
    with_ids: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn main() {
    let args = Arguments::from_args();
    let fixture_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test-data/markup");

    let cases = match load_cases(&fixture_dir) {
        Ok(cases) => cases,
        Err(err) => {
            run_setup_failure(&args, err);
            return;
        }
    };
    if cases.is_empty() {
        run_setup_failure(
            &args,
            "No markup fixtures found under test-data/markup.".to_string(),
        );
        return;
    }

    let tests = cases
        .into_iter()
        .map(|(name, case)| {
            Trial::test(format!("{SUITE_NAME}::{name}"), move || {
                run_case(&case).map_err(Failed::from)
            })
        })
        .collect();
    libtest_mimic::run(&args, tests).exit();
}

fn run_setup_failure(args: &Arguments, message: String) {
    let test = Trial::test(format!("{SUITE_NAME}::setup"), move || {
        Err(Failed::from(message))
    });
    libtest_mimic::run(args, vec![test]).exit();
}

fn load_cases(dir: &Path) -> Result<Vec<(String, MarkupCase)>, String> {
    let entries = fs::read_dir(dir)
        .map_err(|err| format!("Failed to read fixture dir '{}': {err}", dir.display()))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| format!("Failed to list fixture dir '{}': {err}", dir.display()))?
            .path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let data = fs::read_to_string(&path)
                .map_err(|err| format!("Failed to open fixture '{}': {err}", path.display()))?;
            let case: MarkupCase = serde_json::from_str(&data)
                .map_err(|err| format!("Failed to parse fixture '{}': {err}", path.display()))?;
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok((name, case))
        })
        .collect()
}

fn run_case(case: &MarkupCase) -> Result<(), String> {
    let registry = LanguageRegistry::builtin().map_err(|err| err.to_string())?;
    let doc = Document::parse(&case.input).map_err(|err| format!("input: {err}"))?;

    let tokenized = tokenize(&doc, registry, UNIT_TAG);
    let tokenized_text = tokenized.to_xml_string().map_err(|err| err.to_string())?;
    expect_same("tokenized", &case.description, &tokenized_text, &case.tokenized)?;

    let result = assign_ids(&tokenized, UNIT_TAG);
    match (&case.error, result) {
        (Some(kind), Err(err)) => {
            if kind == "structural" && matches!(err, AlignmentError::Structural { .. }) {
                Ok(())
            } else {
                Err(format!("expected a {kind} error, got: {err}"))
            }
        }
        (Some(kind), Ok(_)) => Err(format!("expected a {kind} error, got success")),
        (None, Err(err)) => Err(format!("id assignment failed: {err}")),
        (None, Ok(with_ids)) => {
            let Some(expected) = &case.with_ids else {
                return Ok(());
            };
            let with_ids_text = with_ids.to_xml_string().map_err(|err| err.to_string())?;
            expect_same("with ids", &case.description, &with_ids_text, expected)?;

            let again = assign_ids(&with_ids, UNIT_TAG).map_err(|err| err.to_string())?;
            let again_text = again.to_xml_string().map_err(|err| err.to_string())?;
            expect_same("ids re-assigned", &case.description, &again_text, expected)
        }
    }
}

fn expect_same(stage: &str, description: &str, actual: &str, expected: &str) -> Result<(), String> {
    if actual == expected {
        return Ok(());
    }
    Err(format!(
        "{stage} markup differs ({description})\n--- expected\n{expected}\n--- actual\n{actual}"
    ))
}
