use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use shadow_trail::cli::{
    handle_log_command, handle_record_command, handle_tables_command, LogCommands,
    RecordCommands, TablesCommands,
};
use shadow_trail::config::{paths::ShadowPaths, settings::Settings};
use shadow_trail::session::Session;

/// Environment variable holding a `tracing` filter directive
const LOG_ENV_VAR: &str = "SHADOW_LOG";

#[derive(Parser)]
#[command(
    name = "shadow",
    author = "Kaylee Beyene",
    version,
    about = "Attribute and association audit trails for a JSON record store",
    long_about = "shadow-trail records which tracked fields changed on every save and \
                  every add/remove on tracked associations, stamping each audit row \
                  with the ids of its configured attachments."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a settings file (and create shadow tables for tracked types)
    Init {
        /// Start from an example invoicing schema
        #[arg(long)]
        sample: bool,
    },

    /// Show current configuration and paths
    Config,

    /// Shadow table management
    #[command(subcommand)]
    Tables(TablesCommands),

    /// Save and relate records
    #[command(subcommand)]
    Record(RecordCommands),

    /// Read the shadow tables
    #[command(subcommand)]
    Log(LogCommands),
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = ShadowPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    init_tracing(&settings);

    match cli.command {
        Some(Commands::Init { sample }) => {
            if paths.is_initialized() {
                println!(
                    "Settings already exist at {}",
                    paths.settings_file().display()
                );
                return Ok(());
            }

            let settings = if sample { Settings::sample() } else { settings };
            settings.save(&paths)?;
            println!("Initialized shadow-trail at: {}", paths.base_dir().display());

            let session = Session::open(paths)?;
            for config in session.registry().configs() {
                session.storage().create_shadow_tables(config)?;
                println!(
                    "  Created {} and {}",
                    config.attribute_table.name, config.association_table.name
                );
            }
        }
        Some(Commands::Config) => {
            println!("shadow-trail Configuration");
            println!("==========================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!("Records file:     {}", paths.records_file().display());
            println!("Tables directory: {}", paths.tables_dir().display());
            println!();
            println!("Settings:");
            println!("  Table name prefix: {:?}", settings.table_name_prefix);
            println!("  Table name suffix: {:?}", settings.table_name_suffix);
            println!("  Log filter:        {}", settings.log_filter);
            println!(
                "  Entity types:      {}",
                settings
                    .entities
                    .iter()
                    .map(|e| e.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            println!(
                "  Shadowed types:    {}",
                settings.shadows.keys().cloned().collect::<Vec<_>>().join(", ")
            );
        }
        Some(Commands::Tables(cmd)) => {
            let session = Session::open(paths)?;
            handle_tables_command(&session, cmd)?;
        }
        Some(Commands::Record(cmd)) => {
            let session = Session::open(paths)?;
            handle_record_command(&session, cmd)?;
        }
        Some(Commands::Log(cmd)) => {
            let session = Session::open(paths)?;
            handle_log_command(&session, cmd)?;
        }
        None => {
            println!("shadow-trail - attribute and association audit trails");
            println!();
            println!("Run 'shadow --help' for usage information.");
            println!("Run 'shadow init --sample' to start from an example schema.");
        }
    }

    Ok(())
}
