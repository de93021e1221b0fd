//! Scenario storage API.
//!
//! Layout: `<root>/<scenario_id>/manifest.json` and `result.json`.

use std::fs;
use std::path::{Path, PathBuf};

use wn_solver::SimulationResult;

use crate::hash::is_valid_id;
use crate::types::{ScenarioManifest, StoredScenario};
use crate::{ResultsError, ResultsResult};

const MANIFEST: &str = "manifest.json";
const RESULT: &str = "result.json";

#[derive(Debug, Clone)]
pub struct ScenarioStore {
    root_dir: PathBuf,
}

impl ScenarioStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// The store next to a deployment file: `<dir>/.waternet/scenarios`.
    pub fn for_deployment(deployment_path: &Path) -> ResultsResult<Self> {
        let dir = deployment_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "deployment path has no parent directory".to_string(),
            })?;
        Self::new(dir.join(".waternet").join("scenarios"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn scenario_dir(&self, scenario_id: &str) -> ResultsResult<PathBuf> {
        if !is_valid_id(scenario_id) {
            return Err(ResultsError::InvalidId(scenario_id.to_string()));
        }
        Ok(self.root_dir.join(scenario_id))
    }

    pub fn has(&self, scenario_id: &str) -> bool {
        self.scenario_dir(scenario_id)
            .map(|d| d.join(MANIFEST).exists() && d.join(RESULT).exists())
            .unwrap_or(false)
    }

    pub fn save(&self, manifest: &ScenarioManifest, result: &SimulationResult) -> ResultsResult<()> {
        let dir = self.scenario_dir(&manifest.scenario_id)?;
        fs::create_dir_all(&dir)?;

        // Result first: a manifest is only visible once its result exists.
        fs::write(dir.join(RESULT), serde_json::to_string(result)?)?;
        fs::write(dir.join(MANIFEST), serde_json::to_string_pretty(manifest)?)?;
        Ok(())
    }

    pub fn load_manifest(&self, scenario_id: &str) -> ResultsResult<ScenarioManifest> {
        let path = self.scenario_dir(scenario_id)?.join(MANIFEST);
        if !path.exists() {
            return Err(ResultsError::ScenarioNotFound {
                scenario_id: scenario_id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_result(&self, scenario_id: &str) -> ResultsResult<SimulationResult> {
        let path = self.scenario_dir(scenario_id)?.join(RESULT);
        if !path.exists() {
            return Err(ResultsError::ScenarioNotFound {
                scenario_id: scenario_id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load(&self, scenario_id: &str) -> ResultsResult<StoredScenario> {
        Ok(StoredScenario {
            manifest: self.load_manifest(scenario_id)?,
            result: self.load_result(scenario_id)?,
        })
    }

    /// Manifests stored for one deployment, oldest first.
    pub fn list(&self, deployment: &str) -> ResultsResult<Vec<ScenarioManifest>> {
        let mut manifests = Vec::new();

        if !self.root_dir.exists() {
            return Ok(manifests);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&id)
                    && manifest.deployment == deployment
                {
                    manifests.push(manifest);
                }
            }
        }

        manifests.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.scenario_id.cmp(&b.scenario_id))
        });
        Ok(manifests)
    }

    pub fn delete(&self, scenario_id: &str) -> ResultsResult<()> {
        let dir = self.scenario_dir(scenario_id)?;
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}
