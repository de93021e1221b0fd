//! Per-request context.
//!
//! A request carries the deployment it runs under and the raw bytes of every
//! input role. It is built once and only read afterwards.

use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;
use wn_project::Deployment;

use crate::error::{AppError, AppResult};

/// Raw input bytes per entity role.
#[derive(Debug, Clone, Default)]
pub struct InputBuffers {
    pub nodes: Option<Vec<u8>>,
    pub pipes: Option<Vec<u8>>,
    /// A single model holding nodes and pipes (INP).
    pub network: Option<Vec<u8>>,
    pub assets: Option<Vec<u8>>,
    pub leaks: Option<Vec<u8>>,
}

impl InputBuffers {
    /// Read every file the deployment names, relative to `base_dir`.
    pub fn read(deployment: &Deployment, base_dir: &Path) -> AppResult<Self> {
        let mut buffers = InputBuffers::default();
        for (role, rel) in deployment.inputs.roles() {
            let path = base_dir.join(rel);
            let bytes = std::fs::read(&path).map_err(|e| AppError::InputFileRead {
                role,
                path: path.clone(),
                source: e,
            })?;
            debug!(role, path = %path.display(), bytes = bytes.len(), "read input");
            let slot = match role {
                "nodes" => &mut buffers.nodes,
                "pipes" => &mut buffers.pipes,
                "network" => &mut buffers.network,
                "assets" => &mut buffers.assets,
                _ => &mut buffers.leaks,
            };
            *slot = Some(bytes);
        }
        Ok(buffers)
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub deployment: Deployment,
    /// Directory relative input paths and the scenario store resolve against.
    pub base_dir: PathBuf,
    pub inputs: InputBuffers,
}

impl RequestContext {
    pub fn new(deployment: Deployment, base_dir: impl Into<PathBuf>, inputs: InputBuffers) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            deployment,
            base_dir: base_dir.into(),
            inputs,
        }
    }

    /// Load a deployment file and every input it names.
    pub fn load(deployment_path: &Path) -> AppResult<Self> {
        let deployment = wn_project::load_yaml(deployment_path)?;
        let base_dir = deployment_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let inputs = InputBuffers::read(&deployment, &base_dir)?;
        Ok(Self::new(deployment, base_dir, inputs))
    }
}
