//! wn-project: deployment file format and validation.
//!
//! A deployment names the input files for each entity role and fixes the
//! policies a build and analysis run under.

pub mod migrate;
pub mod schema;
pub mod validate;

use std::path::Path;

pub use migrate::{LATEST_VERSION, migrate_to_latest};
pub use schema::*;
pub use validate::{ValidationError, validate_deployment};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub fn from_yaml_str(content: &str) -> ProjectResult<Deployment> {
    let deployment: Deployment = serde_yaml::from_str(content)?;
    let deployment = migrate_to_latest(deployment)?;
    validate_deployment(&deployment)?;
    Ok(deployment)
}

pub fn load_yaml(path: &Path) -> ProjectResult<Deployment> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn save_yaml(path: &Path, deployment: &Deployment) -> ProjectResult<()> {
    validate_deployment(deployment)?;
    let content = serde_yaml::to_string(deployment)?;
    std::fs::write(path, content)?;
    Ok(())
}
