//! Studbook CLI - pedigree viewer and account client for the studbook registry.

use chrono::Utc;
use clap::Parser;
use std::process;
use studbook::cli::{AnimalCommands, Cli, Commands, ConfigCommands, OrgCommands, PlanCommands};
use studbook::commands::{self, CommandResult, Context, TreeSource};
use studbook::config::{ConfigOverrides, OutputFormat, load_and_resolve};
use studbook::view::Orientation;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter (e.g. `debug`, `studbook=trace`)
const LOG_ENV: &str = "STUDBOOK_LOG";
/// Set to `json` for structured log lines
const LOG_FORMAT_ENV: &str = "STUDBOOK_LOG_FORMAT";

fn main() {
    let cli = Cli::parse();
    init_logging();

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("STUDBOOK_GIT_COMMIT"),
        built = env!("STUDBOOK_BUILD_TIMESTAMP"),
        "starting"
    );

    let mut overrides = ConfigOverrides::new();
    overrides.api_url = cli.api_url.clone();
    overrides.token_file = cli.token_file.clone();
    if cli.human_readable {
        overrides.output_format = Some(OutputFormat::Human);
    }

    // Errors follow the resolved format; without a config only -H counts.
    let mut human = cli.human_readable;
    let result = load_and_resolve(cli.config.as_deref(), &overrides).and_then(|config| {
        human = config.output_format() == OutputFormat::Human;
        let ctx = Context::new(config, Utc::now());
        run_command(cli.command, &ctx, human)
    });

    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var(LOG_FORMAT_ENV).is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn run_command(command: Commands, ctx: &Context, human: bool) -> Result<(), studbook::Error> {
    match command {
        Commands::Login {
            email,
            password,
            admin,
        } => output(&commands::login(ctx, &email, &password, admin)?, human),
        Commands::Register {
            name,
            email,
            password,
        } => output(&commands::register(ctx, &name, &email, &password)?, human),
        Commands::Logout => output(&commands::logout(ctx)?, human),
        Commands::Whoami { at } => output(&commands::whoami(ctx, at.as_deref())?, human),
        Commands::Access { path, at } => {
            output(&commands::access(ctx, &path, at.as_deref())?, human)
        }
        Commands::Tree {
            animal_id,
            input,
            svg,
            layout,
            width,
            height,
        } => {
            let source = match (input, animal_id) {
                (Some(path), _) => TreeSource::File(path),
                (None, Some(id)) => TreeSource::Remote(id),
                (None, None) => {
                    return Err(studbook::Error::InvalidInput(
                        "either an animal ID or --input is required".to_string(),
                    ));
                }
            };
            let orientation = layout.as_deref().and_then(Orientation::parse);
            let result = commands::tree(ctx, source, svg.as_deref(), orientation, width, height)?;
            output(&result, human)
        }
        Commands::Animals { command } => match command {
            AnimalCommands::List => output(&commands::animals_list(ctx)?, human),
            AnimalCommands::Show { id } => output(&commands::animals_show(ctx, &id)?, human),
        },
        Commands::Plans { command } => match command {
            PlanCommands::List => output(&commands::plans_list(ctx)?, human),
        },
        Commands::Orgs { command } => match command {
            OrgCommands::List => output(&commands::orgs_list(ctx)?, human),
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => output(&commands::config_show(ctx), human),
        },
    }
    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: CommandResult>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
