//! The `ieltsim validate` command.

use std::path::PathBuf;

use anyhow::Result;

use ieltsim_core::model::Test;
use ieltsim_core::validate::{lint_test, validate_test};

pub fn execute(test_path: PathBuf) -> Result<()> {
    let test = Test::load_json(&test_path)?;

    if let Err(error) = validate_test(&test) {
        for defect in &error.defects {
            eprintln!("defect: {defect}");
        }
        anyhow::bail!(
            "{}: {} contract violation(s)",
            test_path.display(),
            error.defects.len()
        );
    }

    for warning in lint_test(&test) {
        match warning.question_id {
            Some(id) => eprintln!("warning: question {id}: {}", warning.message),
            None => eprintln!("warning: {}", warning.message),
        }
    }

    eprintln!(
        "OK: {} passages, {} questions, {} groups",
        test.reading.passages.len(),
        test.question_count(),
        test.group_count()
    );
    Ok(())
}
