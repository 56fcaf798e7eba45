//! Record CLI commands
//!
//! Saves, links and unlinks records through the session so every change
//! passes the shadow hooks.

use clap::Subcommand;

use super::tables::require_tables;
use super::{parse_assignment, parse_attachment};
use crate::error::{ShadowError, ShadowResult};
use crate::models::{Entity, RecordId, Tracked};
use crate::session::Session;

/// Record subcommands
#[derive(Subcommand)]
pub enum RecordCommands {
    /// Create or update a record
    Save {
        /// Entity type (e.g. Invoice)
        entity_type: String,
        /// Update the record with this id instead of creating one
        #[arg(long)]
        id: Option<i64>,
        /// Field assignments (e.g. amount=150 status=paid)
        fields: Vec<String>,
        /// Attachments (e.g. editor=User#7)
        #[arg(short, long = "attach")]
        attach: Vec<String>,
    },
    /// Add a related record to an association
    Link {
        /// Owner entity type
        entity_type: String,
        /// Owner id
        id: i64,
        /// Association name (e.g. line_items)
        association: String,
        /// Related record id
        related_id: i64,
        /// Attachments set on the related record (e.g. editor=User#7)
        #[arg(short, long = "attach")]
        attach: Vec<String>,
    },
    /// Remove a related record from an association
    Unlink {
        /// Owner entity type
        entity_type: String,
        /// Owner id
        id: i64,
        /// Association name
        association: String,
        /// Related record id
        related_id: i64,
        /// Attachments set on the related record
        #[arg(short, long = "attach")]
        attach: Vec<String>,
    },
}

fn apply_attachments(entity: &mut Entity, attach: &[String]) -> ShadowResult<()> {
    for raw in attach {
        let (name, attachment) = parse_attachment(raw)?;
        entity.attach(&name, attachment)?;
    }
    Ok(())
}

fn check_tables(session: &Session, entity_type: &str) -> ShadowResult<()> {
    if session.registry().is_tracked(entity_type) {
        require_tables(session, entity_type)?;
    }
    Ok(())
}

/// Handle a record command
pub fn handle_record_command(session: &Session, cmd: RecordCommands) -> ShadowResult<()> {
    match cmd {
        RecordCommands::Save {
            entity_type,
            id,
            fields,
            attach,
        } => {
            check_tables(session, &entity_type)?;

            let mut entity = match id {
                Some(id) => session.find(&entity_type, RecordId::new(id))?,
                None => session.new_entity(&entity_type)?,
            };
            for raw in &fields {
                let (field, value) = parse_assignment(raw)?;
                entity.set(field, value);
            }
            apply_attachments(&mut entity, &attach)?;

            let row = session.save(&mut entity)?;

            let id = entity
                .id
                .ok_or_else(|| ShadowError::Storage("record was not assigned an id".into()))?;
            match entity.version {
                Some(version) => println!("Saved {} {} (version {})", entity.entity_type, id, version),
                None => println!("Saved {} {}", entity.entity_type, id),
            }

            if let Some(summary) = entity
                .shadow_state()
                .updated_attributes()
                .and_then(|changes| changes.summary())
            {
                println!("  Changes: {}", summary);
            }
            if let Some(row) = row {
                println!(
                    "  Shadowed: {} ({})",
                    row.id,
                    row.updated_attributes.join(", ")
                );
            }
        }

        RecordCommands::Link {
            entity_type,
            id,
            association,
            related_id,
            attach,
        } => {
            mutate(session, &entity_type, id, &association, related_id, &attach, true)?;
        }

        RecordCommands::Unlink {
            entity_type,
            id,
            association,
            related_id,
            attach,
        } => {
            mutate(session, &entity_type, id, &association, related_id, &attach, false)?;
        }
    }

    Ok(())
}

fn mutate(
    session: &Session,
    entity_type: &str,
    id: i64,
    association: &str,
    related_id: i64,
    attach: &[String],
    add: bool,
) -> ShadowResult<()> {
    check_tables(session, entity_type)?;

    let mut owner = session.find(entity_type, RecordId::new(id))?;
    let target = session
        .registry()
        .catalog()
        .require(entity_type)?
        .association(association)
        .map(|a| a.target())
        .ok_or_else(|| {
            ShadowError::Validation(format!(
                "{} has no association '{}'",
                entity_type, association
            ))
        })?;

    let mut related = session.find(&target, RecordId::new(related_id))?;
    apply_attachments(&mut related, attach)?;

    let row = if add {
        session.add(&mut owner, association, &related)?
    } else {
        session.remove(&mut owner, association, &related)?
    };

    let verb = if add { "Linked" } else { "Unlinked" };
    println!(
        "{} {} {} {} {}.{}",
        verb,
        target,
        related.id.map(|id| id.to_string()).unwrap_or_default(),
        if add { "to" } else { "from" },
        entity_type,
        association
    );
    if let Some(row) = row {
        println!("  Shadowed: {} ({} {})", row.id, row.action, row.record_id);
    }
    Ok(())
}
