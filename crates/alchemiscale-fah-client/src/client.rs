// FahAdaptiveSamplingClient - facade for the FAH assignment and work server APIs

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info};
use url::Url;
use validator::Validate;

use crate::{
    config::FahClientConfig,
    constants::{as_api_path, ws_api_path},
    error::{FahError, Result},
    http::FahHttpClient,
    keys::Identity,
    model::{
        AsProjectData, AsWorkServerData, FileData, JobAction, JobActionKind, JobData, JobResults,
        ProjectData,
    },
};

/// Client for interacting with a Folding@Home assignment and work server
#[derive(Clone, Debug)]
pub struct FahAdaptiveSamplingClient {
    http_client: FahHttpClient,
    as_api_url: Url,
    ws_api_url: Url,
    ws_ip_addr: Ipv4Addr,
}

impl FahAdaptiveSamplingClient {
    /// Create a client, loading the TLS identity from the configured files
    pub fn new(config: FahClientConfig) -> Result<Self> {
        let identity = Identity::from_files(&config.certificate_file, &config.key_file)?;
        Self::with_identity(config, &identity)
    }

    /// Create a client with an identity already held in memory
    pub fn with_identity(config: FahClientConfig, identity: &Identity) -> Result<Self> {
        let http_client = FahHttpClient::new(
            identity,
            config.verify,
            config.connect_timeout_ms,
            config.read_timeout_ms,
        )?;

        Ok(Self {
            http_client,
            as_api_url: Url::parse(&config.as_api_url)?,
            ws_api_url: Url::parse(&config.ws_api_url)?,
            ws_ip_addr: config.ws_ip_addr,
        })
    }

    pub fn ws_ip_addr(&self) -> Ipv4Addr {
        self.ws_ip_addr
    }

    // ============================================================================
    // Assignment Server APIs
    // ============================================================================

    /// Get work server attributes from the assignment server
    pub async fn as_get_ws(&self) -> Result<AsWorkServerData> {
        self.http_client
            .get(&self.as_api_url, &as_api_path::work_server(self.ws_ip_addr))
            .await
    }

    /// Set work server attributes on the assignment server
    pub async fn as_set_ws(&self, data: &AsWorkServerData) -> Result<()> {
        self.http_client
            .put_json(&self.as_api_url, &as_api_path::work_server(self.ws_ip_addr), data)
            .await
    }

    /// Get project attributes from the assignment server
    pub async fn as_get_project(&self, project_id: u64) -> Result<AsProjectData> {
        self.http_client
            .get(&self.as_api_url, &as_api_path::project(self.ws_ip_addr, project_id))
            .await
    }

    /// Set project attributes on the assignment server
    pub async fn as_set_project(&self, project_id: u64, weight: f64, constraints: &str) -> Result<()> {
        let data = AsProjectData {
            ws: self.ws_ip_addr,
            weight,
            constraints: constraints.to_string(),
        };
        self.http_client
            .put_json(&self.as_api_url, &as_api_path::project(self.ws_ip_addr, project_id), &data)
            .await
    }

    /// Reset project attributes on the assignment server.
    ///
    /// Sets the project weight to 0 and drops all constraints.
    pub async fn as_reset_project(&self, project_id: u64) -> Result<()> {
        self.as_set_project(project_id, 0.0, "").await
    }

    // ============================================================================
    // Work Server Project APIs
    // ============================================================================

    pub async fn list_projects(&self) -> Result<HashMap<String, ProjectData>> {
        self.http_client
            .get(&self.ws_api_url, ws_api_path::PROJECTS)
            .await
    }

    pub async fn create_project(&self, project_id: u64, project_data: &ProjectData) -> Result<()> {
        project_data.validate()?;
        self.http_client
            .put_json(&self.ws_api_url, &ws_api_path::project(project_id), project_data)
            .await
    }

    pub async fn update_project(&self, project_id: u64, project_data: &ProjectData) -> Result<()> {
        self.create_project(project_id, project_data).await
    }

    pub async fn delete_project(&self, project_id: u64) -> Result<()> {
        self.http_client
            .delete(&self.ws_api_url, &ws_api_path::project(project_id))
            .await
    }

    pub async fn get_project(&self, project_id: u64) -> Result<ProjectData> {
        self.http_client
            .get(&self.ws_api_url, &ws_api_path::project(project_id))
            .await
    }

    /// Get the files in a project's directory tree
    pub async fn list_project_files(&self, project_id: u64) -> Result<Vec<FileData>> {
        self.http_client
            .get(&self.ws_api_url, &ws_api_path::project_files(project_id))
            .await
    }

    /// Upload a local file to `dest`, relative to the PROJECT directory
    pub async fn create_project_file(&self, project_id: u64, src: &Path, dest: &str) -> Result<()> {
        self.http_client
            .upload(&self.ws_api_url, &ws_api_path::project_file(project_id, dest), src)
            .await
    }

    /// Upload an in-memory buffer to `dest`, relative to the PROJECT directory
    pub async fn create_project_file_from_bytes(
        &self,
        project_id: u64,
        bytes: impl Into<Bytes>,
        dest: &str,
    ) -> Result<()> {
        self.http_client
            .put_bytes(&self.ws_api_url, &ws_api_path::project_file(project_id, dest), bytes.into())
            .await
    }

    pub async fn delete_project_file(&self, project_id: u64, path: &str) -> Result<()> {
        self.http_client
            .delete(&self.ws_api_url, &ws_api_path::project_file(project_id, path))
            .await
    }

    /// Download `src` from the PROJECT directory to the local path `dest`
    pub async fn get_project_file(&self, project_id: u64, src: &str, dest: &Path) -> Result<u64> {
        self.http_client
            .download(&self.ws_api_url, &ws_api_path::project_file(project_id, src), dest)
            .await
    }

    pub async fn get_project_file_to_bytes(&self, project_id: u64, src: &str) -> Result<Bytes> {
        self.http_client
            .get_bytes(&self.ws_api_url, &ws_api_path::project_file(project_id, src))
            .await
    }

    /// Get the active jobs of a project, optionally only those updated since `since`
    pub async fn get_project_jobs(
        &self,
        project_id: u64,
        since: Option<DateTime<Utc>>,
    ) -> Result<JobResults> {
        #[derive(Serialize)]
        struct Query {
            #[serde(skip_serializing_if = "Option::is_none")]
            since: Option<String>,
        }

        let query = Query {
            since: since.map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
        };
        self.http_client
            .get_with_query(&self.ws_api_url, &ws_api_path::project_jobs(project_id), &query)
            .await
    }

    // ============================================================================
    // Run APIs
    // ============================================================================

    /// Create a new RUN from its four input files and return its id.
    ///
    /// The id is the project's current run count; the files are uploaded to
    /// `RUN{id}/` under their own names and the run count is then bumped.
    pub async fn create_run(
        &self,
        project_id: u64,
        core_file: &Path,
        system_file: &Path,
        state_file: &Path,
        integrator_file: &Path,
    ) -> Result<u64> {
        let mut project_data = self.get_project(project_id).await?;
        let run_id = project_data.runs;

        for src in [core_file, system_file, state_file, integrator_file] {
            let name = file_name(src)?;
            self.create_run_file(project_id, run_id, src, &name).await?;
        }

        project_data.runs = run_id + 1;
        self.update_project(project_id, &project_data).await?;

        info!(project_id, run_id, "Created run");
        Ok(run_id)
    }

    pub async fn create_run_file(&self, project_id: u64, run_id: u64, src: &Path, dest: &str) -> Result<()> {
        self.http_client
            .upload(&self.ws_api_url, &ws_api_path::run_file(project_id, run_id, dest), src)
            .await
    }

    pub async fn create_run_file_from_bytes(
        &self,
        project_id: u64,
        run_id: u64,
        bytes: impl Into<Bytes>,
        dest: &str,
    ) -> Result<()> {
        self.http_client
            .put_bytes(
                &self.ws_api_url,
                &ws_api_path::run_file(project_id, run_id, dest),
                bytes.into(),
            )
            .await
    }

    pub async fn delete_run_file(&self, project_id: u64, run_id: u64, path: &str) -> Result<()> {
        self.http_client
            .delete(&self.ws_api_url, &ws_api_path::run_file(project_id, run_id, path))
            .await
    }

    pub async fn get_run_file(&self, project_id: u64, run_id: u64, path: &str, dest: &Path) -> Result<u64> {
        self.http_client
            .download(&self.ws_api_url, &ws_api_path::run_file(project_id, run_id, path), dest)
            .await
    }

    pub async fn get_run_file_to_bytes(&self, project_id: u64, run_id: u64, path: &str) -> Result<Bytes> {
        self.http_client
            .get_bytes(&self.ws_api_url, &ws_api_path::run_file(project_id, run_id, path))
            .await
    }

    // ============================================================================
    // Clone / Gen APIs
    // ============================================================================

    /// Start a new CLONE for a given RUN
    pub async fn create_clone(&self, project_id: u64, run_id: u64, clone_id: u64) -> Result<()> {
        self.clone_action(project_id, run_id, clone_id, JobActionKind::Create)
            .await
    }

    /// Apply a job action to a CLONE
    pub async fn clone_action(
        &self,
        project_id: u64,
        run_id: u64,
        clone_id: u64,
        action: JobActionKind,
    ) -> Result<()> {
        debug!(project_id, run_id, clone_id, %action, "Applying clone action");
        self.http_client
            .put_json(
                &self.ws_api_url,
                &ws_api_path::clone(project_id, run_id, clone_id),
                &JobAction::from(action),
            )
            .await
    }

    /// Get state information for the given CLONE
    pub async fn get_clone(&self, project_id: u64, run_id: u64, clone_id: u64) -> Result<JobData> {
        self.http_client
            .get(&self.ws_api_url, &ws_api_path::clone(project_id, run_id, clone_id))
            .await
    }

    pub async fn list_clone_files(&self, project_id: u64, run_id: u64, clone_id: u64) -> Result<Vec<FileData>> {
        self.http_client
            .get(&self.ws_api_url, &ws_api_path::clone_files(project_id, run_id, clone_id))
            .await
    }

    pub async fn create_clone_file(
        &self,
        project_id: u64,
        run_id: u64,
        clone_id: u64,
        src: &Path,
        dest: &str,
    ) -> Result<()> {
        self.http_client
            .upload(
                &self.ws_api_url,
                &ws_api_path::clone_file(project_id, run_id, clone_id, dest),
                src,
            )
            .await
    }

    pub async fn create_clone_file_from_bytes(
        &self,
        project_id: u64,
        run_id: u64,
        clone_id: u64,
        bytes: impl Into<Bytes>,
        dest: &str,
    ) -> Result<()> {
        self.http_client
            .put_bytes(
                &self.ws_api_url,
                &ws_api_path::clone_file(project_id, run_id, clone_id, dest),
                bytes.into(),
            )
            .await
    }

    pub async fn get_clone_output_file(
        &self,
        project_id: u64,
        run_id: u64,
        clone_id: u64,
        path: &str,
        dest: &Path,
    ) -> Result<u64> {
        self.http_client
            .download(
                &self.ws_api_url,
                &ws_api_path::clone_file(project_id, run_id, clone_id, path),
                dest,
            )
            .await
    }

    pub async fn get_clone_output_file_to_bytes(
        &self,
        project_id: u64,
        run_id: u64,
        clone_id: u64,
        path: &str,
    ) -> Result<Bytes> {
        self.http_client
            .get_bytes(
                &self.ws_api_url,
                &ws_api_path::clone_file(project_id, run_id, clone_id, path),
            )
            .await
    }

    pub async fn list_gen_files(
        &self,
        project_id: u64,
        run_id: u64,
        clone_id: u64,
        gen_id: u64,
    ) -> Result<Vec<FileData>> {
        self.http_client
            .get(
                &self.ws_api_url,
                &ws_api_path::gen_files(project_id, run_id, clone_id, gen_id),
            )
            .await
    }

    pub async fn get_gen_output_file(
        &self,
        project_id: u64,
        run_id: u64,
        clone_id: u64,
        gen_id: u64,
        path: &str,
        dest: &Path,
    ) -> Result<u64> {
        self.http_client
            .download(
                &self.ws_api_url,
                &ws_api_path::gen_file(project_id, run_id, clone_id, gen_id, path),
                dest,
            )
            .await
    }

    pub async fn get_gen_output_file_to_bytes(
        &self,
        project_id: u64,
        run_id: u64,
        clone_id: u64,
        gen_id: u64,
        path: &str,
    ) -> Result<Bytes> {
        self.http_client
            .get_bytes(
                &self.ws_api_url,
                &ws_api_path::gen_file(project_id, run_id, clone_id, gen_id, path),
            )
            .await
    }

    /// Download every clone file ending in `extension` (e.g. `.xtc`) into `dest_dir`.
    ///
    /// Files keep their path relative to the clone directory. Returns the
    /// local paths written. Nothing is downloaded if any matching path from
    /// the listing would land outside `dest_dir`.
    pub async fn download_clone_files_with_extension(
        &self,
        project_id: u64,
        run_id: u64,
        clone_id: u64,
        extension: &str,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let files = self.list_clone_files(project_id, run_id, clone_id).await?;

        let targets = files
            .iter()
            .filter(|f| f.has_extension(extension))
            .map(|f| local_path(dest_dir, &f.path).map(|dest| (f, dest)))
            .collect::<Result<Vec<_>>>()?;

        let mut written = Vec::with_capacity(targets.len());
        for (file, dest) in targets {
            self.get_clone_output_file(project_id, run_id, clone_id, &file.path, &dest)
                .await?;
            written.push(dest);
        }

        debug!(project_id, run_id, clone_id, count = written.len(), "Downloaded clone files");
        Ok(written)
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("not a file path: {}", path.display()).into())
}

/// Place a server-relative `path` under `dest_dir`, refusing `..`, roots and prefixes
fn local_path(dest_dir: &Path, path: &str) -> Result<PathBuf> {
    let relative = Path::new(path.trim_start_matches('/'));
    let mut local = dest_dir.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => local.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(FahError::UnsafePath(path.to_string()));
            }
        }
    }
    if local == dest_dir {
        return Err(FahError::UnsafePath(path.to_string()));
    }
    Ok(local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(Path::new("/tmp/inputs/system.xml.bz2")).unwrap(), "system.xml.bz2");
        assert!(file_name(Path::new("/")).is_err());
    }

    #[test]
    fn test_local_path_stays_below_dest_dir() {
        let dest = Path::new("/data/clone0");
        assert_eq!(
            local_path(dest, "/traj/./positions.xtc").unwrap(),
            PathBuf::from("/data/clone0/traj/positions.xtc")
        );
        for bad in ["../../escape.xtc", "traj/../../escape.xtc", "", "."] {
            assert!(
                matches!(local_path(dest, bad), Err(FahError::UnsafePath(_))),
                "{bad} accepted"
            );
        }
    }
}
