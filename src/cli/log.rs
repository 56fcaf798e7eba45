//! Shadow log CLI commands

use clap::Subcommand;

use crate::display::{format_association_shadows, format_attribute_shadows};
use crate::error::ShadowResult;
use crate::models::RecordId;
use crate::session::Session;

/// Log subcommands
#[derive(Subcommand)]
pub enum LogCommands {
    /// Show attribute shadows for a type
    Attributes {
        /// Tracked entity type
        entity_type: String,
        /// Only rows for this owner id
        #[arg(short, long)]
        owner: Option<i64>,
        /// Show only the most recent rows
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show association shadows for a type
    Associations {
        /// Tracked entity type
        entity_type: String,
        /// Only rows for this owner id
        #[arg(short, long)]
        owner: Option<i64>,
        /// Show only the most recent rows
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

fn most_recent<T>(mut rows: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        let start = rows.len().saturating_sub(limit);
        rows.drain(..start);
    }
    rows
}

/// Handle a log command
pub fn handle_log_command(session: &Session, cmd: LogCommands) -> ShadowResult<()> {
    let storage = session.storage();

    match cmd {
        LogCommands::Attributes {
            entity_type,
            owner,
            limit,
        } => {
            let config = session.registry().require(&entity_type)?;
            let rows = match owner {
                Some(owner) => storage.attribute_shadows_for(config, RecordId::new(owner))?,
                None => storage.attribute_shadows(config)?,
            };
            print!(
                "{}",
                format_attribute_shadows(&most_recent(rows, limit), &config.attribute_table)
            );
        }

        LogCommands::Associations {
            entity_type,
            owner,
            limit,
        } => {
            let config = session.registry().require(&entity_type)?;
            let rows = match owner {
                Some(owner) => storage.association_shadows_for(config, RecordId::new(owner))?,
                None => storage.association_shadows(config)?,
            };
            print!(
                "{}",
                format_association_shadows(&most_recent(rows, limit), &config.association_table)
            );
        }
    }

    Ok(())
}
