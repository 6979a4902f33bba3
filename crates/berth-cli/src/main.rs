//! Berth - installer context and credential preparation
//!
//! Usage:
//!   berth bootstrap --name cnab          # Import the packaged connection profile
//!   berth context resolve                # Show installer and target contexts
//!   berth prepare --credential-set prod  # Compose installer credentials
//!   berth profile show prod              # Inspect a stored profile

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use berth_core::commands::{
    BootstrapCommand, BootstrapOptions, BootstrapReport, PrepareCommand, PrepareOptions,
    PrepareReport, ProfileCommand, ProfileSummary,
};
use berth_core::installer::InstallerTargets;

#[derive(Parser)]
#[command(name = "berth")]
#[command(about = "Installer context and credential preparation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import packaged connection profile material into the profile store
    Bootstrap {
        /// Name to store the profile under
        #[arg(long)]
        name: String,

        /// Profile material (JSON or zip); defaults to the material packaged
        /// in the installer image
        #[arg(long)]
        material: Option<PathBuf>,

        /// Packaged registry credentials (JSON map of registry host to auth)
        #[arg(long)]
        registry_creds: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Inspect context resolution
    Context(ContextArgs),

    /// Compose the credentials an installer run receives
    ///
    /// Sources apply lowest precedence first: credential sets, then
    /// --credential overrides, then the target context's endpoints, then
    /// registry auth. Only key names are printed, never values.
    Prepare(PrepareArgs),

    /// Inspect stored connection profiles
    Profile(ProfileArgs),
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[derive(Args)]
struct ContextArgs {
    #[command(subcommand)]
    command: ContextSubcommand,
}

#[derive(Subcommand)]
enum ContextSubcommand {
    /// Show the installer and target contexts without changing anything
    Resolve {
        /// Profile the installer runs under (defaults to the active context)
        #[arg(long)]
        installer_context: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct PrepareArgs {
    /// Profile the installer runs under (defaults to the active context)
    #[arg(long)]
    installer_context: Option<String>,

    /// Credential set name or file (can be repeated)
    #[arg(long = "credential-set", short = 'c')]
    credential_sets: Vec<String>,

    /// Single credential as KEY=VALUE (can be repeated)
    #[arg(long = "credential")]
    credentials: Vec<String>,

    /// Include registry auth from the client config
    #[arg(long, conflicts_with = "without_registry_auth")]
    with_registry_auth: bool,

    /// Exclude registry auth even if enabled in berth.toml
    #[arg(long)]
    without_registry_auth: bool,

    /// Output format
    #[arg(short, long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Args)]
struct ProfileArgs {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand)]
enum ProfileSubcommand {
    /// Show endpoint metadata of a profile (credential material is not shown)
    Show {
        /// Profile name
        name: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr so JSON output stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "berth_core=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    run_cli(cli.command)
}

fn run_cli(command: Commands) -> Result<()> {
    match command {
        Commands::Bootstrap {
            name,
            material,
            registry_creds,
            format,
        } => {
            let mut options = match material {
                Some(material) => BootstrapOptions::new(name, material),
                None => BootstrapOptions::packaged(name),
            };
            if let Some(path) = registry_creds {
                options = options.with_registry_creds(path);
            }
            let report = BootstrapCommand::with_defaults()?.execute(&options)?;
            print_bootstrap_result(&report, format)?;
        }
        Commands::Context(args) => match args.command {
            ContextSubcommand::Resolve {
                installer_context,
                format,
            } => {
                let mut options = PrepareOptions::new();
                if let Some(context) = installer_context {
                    options = options.with_installer_context(context);
                }
                let targets = PrepareCommand::with_defaults()?.resolve_contexts(&options)?;
                print_targets(&targets, format)?;
            }
        },
        Commands::Prepare(args) => run_prepare(args)?,
        Commands::Profile(args) => match args.command {
            ProfileSubcommand::Show { name, format } => {
                let summary = ProfileCommand::with_defaults()?.show(&name)?;
                print_profile(&summary, format)?;
            }
        },
    }

    Ok(())
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    let mut options = PrepareOptions::new();

    if let Some(context) = &args.installer_context {
        options = options.with_installer_context(context);
    }
    for name in &args.credential_sets {
        options = options.with_credential_set(name);
    }
    for pair in &args.credentials {
        options = options.with_credential(pair);
    }
    if args.with_registry_auth {
        options = options.with_registry_auth(true);
    } else if args.without_registry_auth {
        options = options.with_registry_auth(false);
    }

    let report = PrepareCommand::with_defaults()?.execute(&options)?;
    print_prepare_result(&report, args.format)
}

fn print_bootstrap_result(report: &BootstrapReport, format: OutputFormat) -> Result<()> {
    let endpoints: Vec<&str> = report.endpoints.iter().map(|kind| kind.as_str()).collect();

    match format {
        OutputFormat::Table => {
            println!("{} Imported profile '{}'", style("✓").green(), report.profile);
            println!("  Endpoints: {}", endpoints.join(", "));
            if !report.registry_auth.is_empty() {
                println!("  Registry credentials: {}", report.registry_auth.len());
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "profile": report.profile,
                "endpoints": endpoints,
                "registries": report.registry_auth.keys().collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn print_targets(targets: &InstallerTargets, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("Installer context: {}", targets.installer_context);
            println!("Target context:    {}", targets.target_context);
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "installer_context": targets.installer_context,
                "target_context": targets.target_context,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn print_prepare_result(report: &PrepareReport, format: OutputFormat) -> Result<()> {
    let warnings: Vec<String> = report.warnings.iter().map(ToString::to_string).collect();

    match format {
        OutputFormat::Table => {
            println!("Installer context: {}", report.installer_context);
            println!("Target context:    {}", report.target_context);

            if report.credentials.is_empty() {
                println!("\nNo credentials composed.");
            } else {
                println!("\n{:<32} ORIGIN", "CREDENTIAL");
                println!("{}", "-".repeat(56));
                for key in report.credentials.keys() {
                    let origin = report
                        .origins
                        .get(key)
                        .map(ToString::to_string)
                        .unwrap_or_default();
                    println!("{:<32} {}", key, origin);
                }
                for host in report.credentials.registry_auth.keys() {
                    println!("{:<32} registry auth", host);
                }
            }

            for warning in &warnings {
                println!("{} {}", style("⚠").yellow(), warning);
            }
        }
        OutputFormat::Json => {
            let credentials: Vec<serde_json::Value> = report
                .credentials
                .keys()
                .map(|key| {
                    serde_json::json!({
                        "key": key,
                        "origin": report.origins.get(key).map(ToString::to_string),
                    })
                })
                .collect();
            let output = serde_json::json!({
                "installer_context": report.installer_context,
                "target_context": report.target_context,
                "credentials": credentials,
                "registries": report.credentials.registry_auth.keys().collect::<Vec<_>>(),
                "warnings": warnings,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn print_profile(summary: &ProfileSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("Profile: {}", style(&summary.name).bold());
            if let Some(description) = &summary.description {
                println!("  {}", description);
            }
            for endpoint in &summary.endpoints {
                println!("\n[{}]", endpoint.kind);
                println!("  Host:            {}", endpoint.host);
                if let Some(namespace) = &endpoint.namespace {
                    println!("  Namespace:       {}", namespace);
                }
                println!("  Skip TLS verify: {}", endpoint.skip_tls_verify);
                println!("  TLS material:    {}", yes_no(endpoint.has_tls));
                println!("  Token:           {}", yes_no(endpoint.has_token));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
    }
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
