use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Leaderboard database path under $HOME/.local/state/revadim
    pub fn db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("revadim");
            Some(state_dir.join("scores.db"))
        } else {
            ProjectDirs::from("", "", "revadim")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("scores.db"))
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "revadim").map(|proj_dirs| proj_dirs.config_dir().join("config.json"))
    }
}
