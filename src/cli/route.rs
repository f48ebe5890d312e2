//! CLI route: single route table and run context. Dispatches to the access layer and presentation.

use crate::access::{NodeCursor, Resource};
use crate::cli::help::command_name;
use crate::cli::parse::{Commands, InspectFormat};
use crate::cli::presentation::{
    format_info_text, format_inspect_json, format_inspect_text, format_verify_text, InspectRow,
    ResourceInfo, RevisionInfo,
};
use crate::config::{ConfigLoader, ResourceConfig, TreehashConfig, RESOURCE_CONFIG_FILE};
use crate::error::{ApiError, HashError};
use crate::hash::HashKind;
use crate::store::NodeStore;
use crate::types::{digest_hex, DOCUMENT_NODE_KEY};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runtime context for CLI execution: merged process configuration only.
/// Resources are opened per command.
pub struct RunContext {
    config: TreehashConfig,
}

impl RunContext {
    /// Create run context from an optional explicit config path. Uses ConfigLoader only.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        if let Err(errors) = config.validate() {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return Err(ApiError::ConfigError(messages.join("; ")));
        }
        Ok(Self { config })
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        debug!(command = name, "Executing command");
        let result = self.execute_inner(command);
        match &result {
            Ok(_) => info!(
                command = name,
                duration_ms = started.elapsed().as_millis() as u64,
                "Command finished"
            ),
            Err(e) => warn!(command = name, error = %e, "Command failed"),
        }
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Init { dir, hash_kind } => self.handle_init(dir, *hash_kind),
            Commands::Info { dir } => self.handle_info(dir),
            Commands::Inspect {
                dir,
                revision,
                format,
            } => {
                let resource = Resource::open(dir)?;
                let rtx = resource.begin_read(*revision)?;
                let rows = InspectRow::collect(rtx.tree())?;
                match format {
                    InspectFormat::Text => Ok(format_inspect_text(rtx.revision_number(), &rows)),
                    InspectFormat::Json => format_inspect_json(rtx.revision_number(), &rows),
                }
            }
            Commands::Verify { dir, revision } => {
                let resource = Resource::open(dir)?;
                let rtx = resource.begin_read(*revision)?;
                let mismatches = rtx.verify()?;
                let report = format_verify_text(rtx.revision_number(), rtx.tree().len(), &mismatches);
                match mismatches.first() {
                    None => Ok(report),
                    Some(first) => Err(ApiError::Hash(HashError::violation(
                        first.key,
                        format!("{} digests disagree with their members\n{}", mismatches.len(), report),
                    ))),
                }
            }
            Commands::Demo { dir } => self.handle_demo(dir),
        }
    }

    fn handle_init(&self, dir: &Path, hash_kind: Option<HashKind>) -> Result<String, ApiError> {
        let config = ResourceConfig::new(hash_kind.unwrap_or(self.config.resource.hash_kind));
        let resource = Resource::create_at(dir, config)?;
        Ok(format!(
            "Created resource at {}\n  Hash kind: {}\n  Config: {}",
            dir.display(),
            resource.hash_kind(),
            dir.join(RESOURCE_CONFIG_FILE).display()
        ))
    }

    fn handle_info(&self, dir: &Path) -> Result<String, ApiError> {
        let resource = Resource::open(dir)?;
        let mut revisions = Vec::new();
        for revision in resource.revisions() {
            revisions.push(RevisionInfo {
                number: revision.number,
                committed_at: revision.committed_at,
                nodes: revision.tree.len(),
                root_digest: digest_hex(revision.tree.read_digest(DOCUMENT_NODE_KEY)?),
            });
        }
        Ok(format_info_text(&ResourceInfo {
            location: resource.location().unwrap_or(dir).display().to_string(),
            hash_kind: resource.hash_kind(),
            revisions,
        }))
    }

    /// Element `a` holding text "a" and an element `b` with attribute b="a"
    fn handle_demo(&self, dir: &Path) -> Result<String, ApiError> {
        let resource = if dir.join(RESOURCE_CONFIG_FILE).exists() {
            Resource::open(dir)?
        } else {
            Resource::create_at(dir, self.config.resource)?
        };

        let mut wtx = resource.begin_write()?;
        wtx.move_to_document_root();
        let root = wtx.insert_element_as_first_child("a")?;
        wtx.insert_text_as_first_child("a")?;
        wtx.insert_element_as_right_sibling("b")?;
        wtx.insert_attribute("b", "a")?;
        let revision = wtx.commit()?;
        wtx.move_to(root)?;
        let root_digest = digest_hex(wtx.digest());
        drop(wtx);

        Ok(format!(
            "Committed revision {}\n  Hash kind: {}\n  Digest of <a>: {}",
            revision,
            resource.hash_kind(),
            root_digest
        ))
    }
}
