use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use genai_stack::stack::config::Settings;
use genai_stack::stack::server;
use genai_stack::stack::workflow::loader::WorkflowLoader;
use genai_stack::stack::workflow::result::NodeResult;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a workflow file without running it
    Validate {
        /// Path to the workflow file (.json, .yaml or .yml)
        #[arg(short, long)]
        file: String,
    },
    /// Run a workflow from a file
    Run {
        /// Path to the workflow file (.json, .yaml or .yml)
        #[arg(short, long)]
        file: String,

        /// Input to the workflow
        #[arg(short, long)]
        input: String,

        /// Session identifier recorded in the execution context
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Start the HTTP API
    Serve {
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let settings = Settings::from_env()?;
    let loader = WorkflowLoader::new();

    match args.command {
        Commands::Validate { file } => {
            let config = loader
                .load_workflow(&file)
                .with_context(|| format!("Failed to load workflow {}", file))?;
            let validation = settings.workflow_engine().validate_workflow(&config);

            for error in &validation.errors {
                println!("error: {}", error);
            }
            for warning in &validation.warnings {
                println!("warning: {}", warning);
            }
            if !validation.valid {
                anyhow::bail!("Workflow {} is invalid", file);
            }
            println!("Workflow {} is valid", file);
        }
        Commands::Run {
            file,
            input,
            session,
        } => {
            let config = loader
                .load_workflow(&file)
                .with_context(|| format!("Failed to load workflow {}", file))?;
            let engine = settings.workflow_engine();

            let name = config.id.as_deref().unwrap_or(&file);
            println!("Running workflow: {}", name);
            let result = engine.execute(&config, input, session).await?;

            for output in &result.output {
                match output {
                    NodeResult::Error { error } => println!("error: {}", error),
                    other => println!("{}", other.content().unwrap_or_default()),
                }
            }
            println!(
                "Executed {}/{} nodes, {} errors",
                result.execution_summary.executed_nodes,
                result.execution_summary.total_nodes,
                result.execution_summary.errors
            );
        }
        Commands::Serve { port } => {
            server::serve(port, settings.workflow_engine()).await?;
        }
    }

    Ok(())
}
