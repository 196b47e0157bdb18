//! Generate Command
//!
//! Runs one generation batch over local files and prints the resulting
//! questions. The in-memory sink stands in for a question bank; the batch
//! report tells the user what succeeded, what was skipped and what failed.

use std::path::PathBuf;
use std::sync::Arc;

use console::style;

use crate::config::ConfigLoader;
use crate::credentials::CredentialStore;
use crate::extract::ResourceRef;
use crate::pipeline::{BatchReport, GenerationBatch, Pipeline, UnitOutcome};
use crate::sink::MemorySink;
use crate::types::Result;

pub struct GenerateOptions {
    pub files: Vec<PathBuf>,
    pub course_id: u64,
    pub user_id: u64,
    pub context_id: u64,
    pub count: Option<usize>,
    pub model: Option<String>,
}

pub async fn run(options: GenerateOptions) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    if let Some(count) = options.count {
        config.generation.question_count = count;
    }
    if let Some(model) = options.model {
        config.llm.model = Some(model);
    }
    config.validate()?;

    let resources: Vec<ResourceRef> = options
        .files
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let display = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("resource")
                .to_string();
            ResourceRef::new(i as u64 + 1, path.clone(), display)
        })
        .collect();

    let store = CredentialStore::from_config(&config.llm);
    let sink = Arc::new(MemorySink::new());
    let batch = GenerationBatch::new(
        resources,
        options.course_id,
        options.user_id,
        options.context_id,
    );

    let pipeline = Pipeline::for_batch(&store, &config, sink.clone(), &batch)?;
    let report = pipeline.run(&batch).await?;

    print_report(&report, &sink);
    Ok(())
}

fn print_report(report: &BatchReport, sink: &MemorySink) {
    println!();
    println!("{} {}", style("Category:").bold(), report.category.name);
    println!();

    for unit in &report.units {
        match &unit.outcome {
            UnitOutcome::Generated { count } => {
                println!(
                    "  {} {} ({} questions)",
                    style("✓").green(),
                    unit.display_name,
                    count
                );
            }
            UnitOutcome::Skipped { reason } => {
                println!(
                    "  {} {} ({})",
                    style("-").yellow(),
                    unit.display_name,
                    reason
                );
            }
            UnitOutcome::Failed { message } => {
                println!(
                    "  {} {} ({})",
                    style("✗").red(),
                    unit.display_name,
                    message
                );
            }
        }
    }

    let questions = sink.questions_in(report.category.id);
    if !questions.is_empty() {
        println!();
        for question in &questions {
            println!("{} {}", style(&question.name).bold(), question.stem);
            for answer in &question.answers {
                let marker = if answer.weight > 0.0 {
                    style("✓").green()
                } else {
                    style(" ").dim()
                };
                println!("    {} {}", marker, answer.text);
            }
        }
    }

    println!();
    println!(
        "{} generated, {} failed",
        style(report.generated_total()).green().bold(),
        style(report.failed_count()).red()
    );
}
