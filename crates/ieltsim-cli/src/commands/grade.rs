//! The `ieltsim grade` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::Table;

use ieltsim_core::model::WritingSubmission;
use ieltsim_core::scoring::{word_count, TASK1_MIN_WORDS, TASK2_MIN_WORDS};
use ieltsim_providers::config::load_config_from;

use super::resolve_provider;

pub async fn execute(
    task1: PathBuf,
    task2: PathBuf,
    provider: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let provider = resolve_provider(&config, provider.as_deref())?;

    let submission = WritingSubmission {
        task1: std::fs::read_to_string(&task1)
            .with_context(|| format!("failed to read task 1 from {}", task1.display()))?,
        task2: std::fs::read_to_string(&task2)
            .with_context(|| format!("failed to read task 2 from {}", task2.display()))?,
    };

    if word_count(&submission.task1) < TASK1_MIN_WORDS {
        eprintln!("warning: task 1 is below the recommended {TASK1_MIN_WORDS} words");
    }
    if word_count(&submission.task2) < TASK2_MIN_WORDS {
        eprintln!("warning: task 2 is below the recommended {TASK2_MIN_WORDS} words");
    }

    eprintln!("Evaluating writing with provider '{}'...", provider.name());
    let feedback = provider.grade_writing(&submission).await?;

    let mut table = Table::new();
    table.set_header(vec!["Criterion", "Band", "Feedback"]);
    for (name, criterion) in feedback.criteria() {
        table.add_row(vec![
            name.to_string(),
            format!("{:.1}", criterion.band),
            criterion.feedback.clone(),
        ]);
    }
    eprintln!("\n{table}");
    eprintln!(
        "\nWord counts: task 1 = {}, task 2 = {}",
        feedback.word_count_task1, feedback.word_count_task2
    );
    eprintln!("Overall writing band: {:.1}", feedback.overall_band);
    Ok(())
}
