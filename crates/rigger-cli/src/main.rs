mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_MANIFEST_ERROR, EXIT_PLATFORM_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "rigger",
    version,
    about = "Match manifest apps and reconcile their services with a target"
)]
struct Cli {
    /// Manifest to use instead of the nearest manifest.yml above the working directory.
    #[arg(short, long, global = true)]
    manifest: Option<PathBuf>,

    /// Target state file (overrides ~/.config/rigger/target.json).
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve app names or paths against the manifest.
    Apps {
        /// App names or directories; all manifest apps when omitted.
        apps: Vec<String>,
    },
    /// List manifest apps whose path is the working directory.
    Current,
    /// Write a manifest describing apps deployed on the target.
    Save {
        /// Names of deployed apps.
        #[arg(required = true)]
        apps: Vec<String>,
        /// Value written as each entry's path.
        #[arg(long, default_value = ".")]
        path: String,
        /// Destination file (defaults to ./manifest.yml).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite an existing destination.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Create and bind the services declared for manifest apps.
    Services {
        /// App names or directories; apps in the working directory when omitted.
        apps: Vec<String>,
        /// Print the plan without changing the target.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Record the target state file used when --state is not given.
    Target {
        /// State file to use; shows the current target when omitted.
        state_file: Option<PathBuf>,
        /// Base domain override written into generated manifests.
        #[arg(long, requires = "state_file")]
        base: Option<String>,
    },
    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn exit_code_for(msg: &str) -> u8 {
    if msg.starts_with("manifest error:")
        || msg.starts_with("failed to parse manifest")
        || msg.starts_with("failed to read manifest")
        || msg.starts_with("Path ")
    {
        EXIT_MANIFEST_ERROR
    } else if msg.starts_with("platform error:") || msg.starts_with("no --state") {
        EXIT_PLATFORM_ERROR
    } else {
        EXIT_FAILURE
    }
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RIGGER_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let cwd = match commands::working_dir() {
        Ok(dir) => dir,
        Err(msg) => {
            eprintln!("error: {msg}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    // Entry paths are anchored to the manifest's directory, so keep it absolute.
    let manifest = cli.manifest.map(|p| cwd.join(p));
    let manifest = manifest.as_deref();
    let state = cli.state.map(|p| cwd.join(p));
    let state = state.as_deref();
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Apps { apps } => commands::apps::run(manifest, &cwd, &apps, json_output),
        Commands::Current => commands::current::run(manifest, &cwd, json_output),
        Commands::Save {
            apps,
            path,
            output,
            force,
        } => commands::save::run(
            state,
            &cwd,
            &apps,
            &path,
            output.map(|p| cwd.join(p)).as_deref(),
            force,
            json_output,
        ),
        Commands::Services { apps, dry_run } => {
            commands::services::run(manifest, state, &cwd, &apps, dry_run, json_output)
        }
        Commands::Target { state_file, base } => {
            commands::target::run(&cwd, state_file.as_deref(), base.as_deref(), json_output)
        }
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(exit_code_for(&msg))
        }
    }
}
