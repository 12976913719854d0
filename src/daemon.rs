//! Process plumbing for the long running mode: PID file and shutdown signals.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{debug, error, info, warn};

/// Holds the PID file for the lifetime of the process and removes it on drop.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Write the current process id to `path`.
    ///
    /// Fails if the file already exists, so two daemons cannot share a PID file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        Self::write(&path, std::process::id())?;
        debug!("PIDfile written to '{}'.", path.display());
        Ok(Self { path })
    }

    fn write(path: &Path, pid: u32) -> Result<()> {
        use std::io::Write;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .with_context(|| format!("PIDfile creation failed: '{}'", path.display()))?;
        writeln!(file, "{pid}")
            .with_context(|| format!("could not write PIDfile '{}'", path.display()))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("could not remove PIDfile '{}': {e}", self.path.display());
        }
    }
}

/// Resolves once SIGINT or (on unix) SIGTERM is received.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("failed to install SIGINT handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                error!("failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received SIGINT, shutting down");
        }
        _ = terminate => {
            info!("received SIGTERM, shutting down");
        }
    }
}
