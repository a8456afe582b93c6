use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loadsconf::cli::commands;

#[derive(Parser)]
#[command(
    name = "loadsconf",
    about = "Validate load-test plans and telemetry pipeline configs",
    version
)]
struct Cli {
    /// Raise the log level (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with JSON load-test plans
    Plan {
        #[command(subcommand)]
        command: PlanCommand,
    },

    /// Work with sectioned pipeline configs
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommand,
    },
}

#[derive(Subcommand)]
enum PlanCommand {
    /// Validate plan files
    Validate {
        /// Input .json plan files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print a plan in normalized form
    Show {
        file: PathBuf,

        /// Output format: json, yaml
        #[arg(long, default_value = "json")]
        format: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PipelineCommand {
    /// Validate pipeline config files
    Validate {
        /// Input .toml config files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Template variable as KEY=VALUE (repeatable)
        #[arg(long = "var")]
        vars: Vec<String>,
    },

    /// Print a config in normalized form
    Show {
        file: PathBuf,

        /// Output format: toml, yaml
        #[arg(long, default_value = "toml")]
        format: String,

        /// Template variable as KEY=VALUE (repeatable)
        #[arg(long = "var")]
        vars: Vec<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print how sections reference each other as a DOT diagram
    Graph {
        file: PathBuf,

        /// Template variable as KEY=VALUE (repeatable)
        #[arg(long = "var")]
        vars: Vec<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "loadsconf=warn",
        1 => "loadsconf=info",
        _ => "loadsconf=debug",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Plan { command } => match command {
            PlanCommand::Validate { files } => {
                commands::run_plan_validate(&files).map(|out| out + "\n")
            }
            PlanCommand::Show {
                file,
                format,
                output,
            } => commands::run_plan_show(&file, &format, output.as_ref()),
        },
        Commands::Pipeline { command } => match command {
            PipelineCommand::Validate { files, vars } => {
                commands::run_pipeline_validate(&files, &vars).map(|out| out + "\n")
            }
            PipelineCommand::Show {
                file,
                format,
                vars,
                output,
            } => commands::run_pipeline_show(&file, &format, &vars, output.as_ref()),
            PipelineCommand::Graph { file, vars, output } => {
                commands::run_pipeline_graph(&file, &vars, output.as_ref())
            }
        },
    };

    match result {
        Ok(out) => print!("{out}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
