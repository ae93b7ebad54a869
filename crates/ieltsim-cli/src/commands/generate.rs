//! The `ieltsim generate` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::Table;

use ieltsim_core::validate::{lint_test, validate_test};
use ieltsim_providers::config::load_config_from;

use super::resolve_provider;

pub async fn execute(
    output: PathBuf,
    provider: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let provider = resolve_provider(&config, provider.as_deref())?;

    eprintln!("Generating test with provider '{}'...", provider.name());
    let test = provider.generate_test().await?;
    validate_test(&test)?;

    for warning in lint_test(&test) {
        match warning.question_id {
            Some(id) => eprintln!("warning: question {id}: {}", warning.message),
            None => eprintln!("warning: {}", warning.message),
        }
    }

    let mut table = Table::new();
    table.set_header(vec!["Passage", "Title", "Questions"]);
    for passage in &test.reading.passages {
        let count: usize = passage
            .question_groups
            .iter()
            .map(|g| g.questions.len())
            .sum();
        table.add_row(vec![
            passage.passage_number.to_string(),
            passage.title.clone(),
            count.to_string(),
        ]);
    }
    eprintln!("\n{table}");

    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let path = output.join(format!("test-{timestamp}.json"));
    test.save_json(&path)?;
    eprintln!("Test saved to: {}", path.display());

    Ok(())
}
