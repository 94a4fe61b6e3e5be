//! Per-job temporary credential file

use std::io;
use std::path::{Path, PathBuf};

use crate::jobs::JobId;

/// Cookie export stored on disk for the lifetime of one job
///
/// Deletes its file on drop. The job task owns it, so the file is gone once the
/// task ends, whether it completed, failed or panicked.
#[derive(Debug)]
pub struct CredentialArtifact {
    path: PathBuf,
}

impl CredentialArtifact {
    /// File name used for a job's artifact
    #[must_use]
    pub fn file_name(job_id: &JobId) -> String {
        format!("cookies_{job_id}.json")
    }

    /// Write `bytes` to `<dir>/cookies_<job id>.json`
    ///
    /// The guard exists before the first byte is written, so a failed or
    /// interrupted write leaves no partial file behind.
    pub async fn write(dir: &Path, job_id: &JobId, bytes: &[u8]) -> io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        let artifact = Self {
            path: dir.join(Self::file_name(job_id)),
        };
        tokio::fs::write(&artifact.path, bytes).await?;
        log::debug!(
            "Stored credential artifact for job {job_id} at {}",
            artifact.path.display()
        );
        Ok(artifact)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CredentialArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed credential artifact {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Failed to remove credential artifact {}: {e}",
                self.path.display()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_is_named_by_job_and_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let job_id = JobId::new();

        let artifact = CredentialArtifact::write(dir.path(), &job_id, b"[]")
            .await
            .unwrap();
        let path = artifact.path().to_path_buf();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            format!("cookies_{job_id}.json")
        );
        assert!(path.exists());

        drop(artifact);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn failed_write_is_reported_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let job_id = JobId::new();
        // A directory squatting on the file name makes the write fail
        let squatter = dir.path().join(CredentialArtifact::file_name(&job_id));
        std::fs::create_dir(&squatter).unwrap();

        assert!(CredentialArtifact::write(dir.path(), &job_id, b"[]").await.is_err());
        // The guard's cleanup only removes files, never what it did not write
        assert!(squatter.is_dir());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
