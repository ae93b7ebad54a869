//! The `ieltsim run` command: drive a full attempt end to end.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::Table;

use ieltsim_core::model::{Results, TestMode, UserAnswers};
use ieltsim_core::session::{Phase, SessionEngine};
use ieltsim_core::traits::AlwaysConfirm;
use ieltsim_providers::config::load_config_from;

use super::resolve_provider;

pub async fn execute(
    section: String,
    answers: Option<PathBuf>,
    task1: Option<PathBuf>,
    task2: Option<PathBuf>,
    provider: Option<String>,
    output: PathBuf,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let provider = resolve_provider(&config, provider.as_deref())?;

    let mode = match section.as_str() {
        "full" => TestMode::full(),
        "reading" => TestMode::reading_practice(),
        "writing" => TestMode::writing_practice(),
        other => anyhow::bail!("unknown section '{other}' (expected reading, writing or full)"),
    };

    let mut engine = SessionEngine::new(provider, Arc::new(AlwaysConfirm));

    eprintln!("Generating test...");
    engine.start_test(mode).await;
    if let Some(message) = engine.session().error.clone() {
        anyhow::bail!("{message}");
    }

    if engine.session().phase == Phase::TakingReading {
        if let Some(path) = &answers {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read answers from {}", path.display()))?;
            let loaded: UserAnswers =
                serde_json::from_str(&content).context("failed to parse answers JSON")?;
            for (id, value) in loaded {
                engine.answer_changed(id, value);
            }
        }
        // Non-interactive: submit whatever answers are present.
        engine.submit_reading(true).await?;
    }

    if engine.session().phase == Phase::TakingWriting {
        if let Some(path) = &task1 {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read task 1 from {}", path.display()))?;
            engine.edit_task1(text);
        }
        if let Some(path) = &task2 {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read task 2 from {}", path.display()))?;
            engine.edit_task2(text);
        }
        eprintln!("Submitting writing for evaluation...");
        engine.submit_writing(true).await?;
    }

    if let Some(warning) = &engine.session().warning {
        eprintln!("Warning: {warning}");
    }

    let Some(results) = engine.session().results.clone() else {
        anyhow::bail!("session ended without results");
    };

    print_results(&results);

    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let path = output.join(format!("results-{timestamp}.json"));
    results.save_json(&path)?;
    eprintln!("Results saved to: {}", path.display());

    Ok(())
}

fn print_results(results: &Results) {
    let mut table = Table::new();
    table.set_header(vec!["Section", "Detail", "Band"]);

    if let Some(reading) = &results.reading {
        table.add_row(vec![
            "Reading".to_string(),
            format!("{} / 40 correct", reading.score),
            format!("{:.1}", reading.band),
        ]);
    }

    if let Some(writing) = &results.writing {
        match &writing.feedback {
            Some(feedback) => {
                for (name, criterion) in feedback.criteria() {
                    table.add_row(vec![
                        "Writing".to_string(),
                        name.to_string(),
                        format!("{:.1}", criterion.band),
                    ]);
                }
                table.add_row(vec![
                    "Writing".to_string(),
                    format!(
                        "{} + {} words",
                        feedback.word_count_task1, feedback.word_count_task2
                    ),
                    format!("{:.1}", feedback.overall_band),
                ]);
            }
            None => {
                table.add_row(vec![
                    "Writing".to_string(),
                    "feedback unavailable".to_string(),
                    "-".to_string(),
                ]);
            }
        }
    }

    table.add_row(vec![
        "Overall".to_string(),
        String::new(),
        format!("{:.1}", results.overall_band),
    ]);

    eprintln!("\n{table}");
}
