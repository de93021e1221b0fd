//! Schema migration.

use crate::ProjectError;
use crate::schema::Deployment;

pub const LATEST_VERSION: u32 = 1;

/// Files without a `version` key deserialize as version 0 and are lifted to 1.
pub fn migrate_to_latest(mut deployment: Deployment) -> Result<Deployment, ProjectError> {
    while deployment.version < LATEST_VERSION {
        deployment = match deployment.version {
            0 => Deployment {
                version: 1,
                ..deployment
            },
            v => {
                return Err(ProjectError::Migration {
                    what: format!("No migration path from version {v}"),
                });
            }
        };
    }
    Ok(deployment)
}
