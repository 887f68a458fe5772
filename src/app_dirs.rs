use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "prepdrill";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::project().map(|pd| pd.config_dir().join("config.json"))
    }

    /// Log file under the XDG state dir, falling back to the platform data dir.
    pub fn log_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME);
            Some(state_dir.join("prepdrill.log"))
        } else {
            Self::project().map(|pd| pd.data_local_dir().join("prepdrill.log"))
        }
    }
}
