use crate::{
    Error, Result,
    config::{HubConfig, ModelSource},
};
use hf_hub::{Repo, RepoType, api::tokio::ApiBuilder};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Local paths of the files a model needs.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    files: HashMap<String, PathBuf>,
}

impl ModelFiles {
    /// Resolves `names` from the local model directory when one is
    /// configured, from the hub (download or cache hit) otherwise.
    pub async fn fetch(source: &ModelSource, hub: &HubConfig, names: &[&str]) -> Result<Self> {
        if let Some(dir) = &source.model_dir {
            return Self::from_dir(dir, names);
        }

        info!(
            "Resolving {} file(s) from {}@{}",
            names.len(),
            source.repo,
            source.revision
        );

        let mut builder = ApiBuilder::new().with_progress(false);
        if let Some(cache_dir) = &hub.cache_dir {
            builder = builder.with_cache_dir(cache_dir.clone());
        }
        let api = builder.build()?;
        let repo = api.repo(Repo::with_revision(
            source.repo.clone(),
            RepoType::Model,
            source.revision.clone(),
        ));

        let mut files = HashMap::with_capacity(names.len());
        for name in names {
            let path = repo.get(name).await?;
            debug!("Resolved {} -> {}", name, path.display());
            files.insert(name.to_string(), path);
        }

        Ok(Self { files })
    }

    pub fn from_dir(dir: &Path, names: &[&str]) -> Result<Self> {
        let mut files = HashMap::with_capacity(names.len());
        for name in names {
            let path = dir.join(name);
            if !path.is_file() {
                return Err(Error::model(format!(
                    "Model file not found: {}",
                    path.display()
                )));
            }
            files.insert(name.to_string(), path);
        }

        debug!("Using {} model file(s) from {}", files.len(), dir.display());
        Ok(Self { files })
    }

    pub fn path(&self, name: &str) -> Result<&Path> {
        self.files
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::internal(format!("Model file {} was not resolved", name)))
    }
}
