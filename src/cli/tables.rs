//! Shadow table CLI commands

use clap::Subcommand;

use crate::display::format_shadow_config;
use crate::error::{ShadowError, ShadowResult};
use crate::session::Session;
use crate::shadow::ShadowKind;

/// Shadow table subcommands
#[derive(Subcommand)]
pub enum TablesCommands {
    /// Create both shadow tables for a type (existing rows are discarded)
    Create {
        /// Tracked entity type (e.g. Invoice)
        #[arg(required_unless_present = "all")]
        entity_type: Option<String>,
        /// Create tables for every tracked type
        #[arg(long, conflicts_with = "entity_type")]
        all: bool,
    },
    /// Drop both shadow tables for a type
    Drop {
        /// Tracked entity type
        entity_type: String,
    },
    /// Show the shadow configuration and table layouts for a type
    Show {
        /// Tracked entity type
        entity_type: String,
    },
}

/// Handle a tables command
pub fn handle_tables_command(session: &Session, cmd: TablesCommands) -> ShadowResult<()> {
    let registry = session.registry();
    let storage = session.storage();

    match cmd {
        TablesCommands::Create { entity_type, all } => {
            let types: Vec<String> = if all {
                registry.tracked_types().map(str::to_string).collect()
            } else {
                entity_type.into_iter().collect()
            };

            if types.is_empty() {
                println!("No tracked types configured.");
                return Ok(());
            }

            for entity_type in types {
                let config = registry.require(&entity_type)?;
                storage.create_shadow_tables(config)?;
                println!(
                    "Created {} and {}",
                    config.attribute_table.name, config.association_table.name
                );
            }
        }

        TablesCommands::Drop { entity_type } => {
            let config = registry.require(&entity_type)?;
            storage.drop_shadow_tables(config)?;
            println!(
                "Dropped {} and {}",
                config.attribute_table.name, config.association_table.name
            );
        }

        TablesCommands::Show { entity_type } => {
            let config = registry.require(&entity_type)?;
            print!("{}", format_shadow_config(config));
            println!();
            for kind in [ShadowKind::Attribute, ShadowKind::Association] {
                let layout = config.table(kind);
                let status = if storage.table_exists(config, kind) {
                    let rows = match kind {
                        ShadowKind::Attribute => storage.attribute_table(config).row_count()?,
                        ShadowKind::Association => storage.association_table(config).row_count()?,
                    };
                    format!("{} rows", rows)
                } else {
                    "not created".to_string()
                };
                println!("{}: {}", layout.name, status);
            }
        }
    }

    Ok(())
}

/// Fail early with a hint when a type's tables have not been created
pub fn require_tables(session: &Session, entity_type: &str) -> ShadowResult<()> {
    let config = session.registry().require(entity_type)?;
    for kind in [ShadowKind::Attribute, ShadowKind::Association] {
        if !session.storage().table_exists(config, kind) {
            return Err(ShadowError::Storage(format!(
                "table {} does not exist; run 'shadow tables create {}'",
                config.table(kind).name,
                entity_type
            )));
        }
    }
    Ok(())
}
