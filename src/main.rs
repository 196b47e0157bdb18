use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quizforge::cli::commands;

#[derive(Parser)]
#[command(name = "quizforge")]
#[command(
    version,
    about = "LLM-backed quiz question generator for course materials"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate questions from one or more local files
    Generate {
        #[arg(required = true, help = "Files to generate questions from")]
        files: Vec<PathBuf>,

        #[arg(long, default_value = "0", help = "Course id for credential lookup")]
        course_id: u64,

        #[arg(long, default_value = "0", help = "Acting user id for credential lookup")]
        user_id: u64,

        #[arg(long, default_value = "0", help = "Context id the category is created in")]
        context_id: u64,

        #[arg(long, short = 'n', help = "Questions per file (default from config)")]
        count: Option<usize>,

        #[arg(long, help = "Model override")]
        model: Option<String>,
    },

    /// Assign topic tags to questions from a JSON file
    Tag {
        #[arg(help = "JSON file with question records")]
        input: PathBuf,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Show configuration file paths
    Path,
    /// Initialize a project configuration file
    Init {
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Generate {
            files,
            course_id,
            user_id,
            context_id,
            count,
            model,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::generate::run(commands::generate::GenerateOptions {
                files,
                course_id,
                user_id,
                context_id,
                count,
                model,
            }))?;
        }
        Commands::Tag { input } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::tag::run(&input))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => {
                commands::config::show(json)?;
            }
            ConfigAction::Path => {
                commands::config::path()?;
            }
            ConfigAction::Init { force } => {
                commands::config::init(force)?;
            }
        },
    }

    Ok(())
}
