//! Run configuration.

use std::path::PathBuf;

use crate::error::AppError;

/// Environment variable holding the scene path.
pub const SCENE_ENV: &str = "CASCADE_SCENE";

/// Where to find the scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Scene definition file, `.json`, `.yaml` or `.yml`.
    pub scene_path: PathBuf,
}

impl Config {
    /// Reads the scene path from `CASCADE_SCENE`, falling back to the first
    /// command line argument.
    ///
    /// # Errors
    /// Returns `AppError::MissingScene` if neither is set.
    pub fn from_env() -> Result<Self, AppError> {
        Self::resolve(std::env::var(SCENE_ENV).ok(), std::env::args().skip(1))
    }

    /// Resolves the configuration from an environment value and arguments.
    ///
    /// # Errors
    /// Returns `AppError::MissingScene` if neither yields a path.
    pub fn resolve(
        env: Option<String>,
        mut args: impl Iterator<Item = String>,
    ) -> Result<Self, AppError> {
        env.filter(|value| !value.is_empty())
            .or_else(|| args.next())
            .map(|path| Self {
                scene_path: PathBuf::from(path),
            })
            .ok_or(AppError::MissingScene)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_env_wins_over_args() {
        let config = Config::resolve(Some("env.yaml".into()), vec!["arg.json".to_string()].into_iter())
            .unwrap();
        assert_eq!(config.scene_path, PathBuf::from("env.yaml"));
    }

    #[test]
    fn test_empty_env_falls_back_to_args() {
        let config =
            Config::resolve(Some(String::new()), vec!["arg.json".to_string()].into_iter()).unwrap();
        assert_eq!(config.scene_path, PathBuf::from("arg.json"));
    }

    #[test]
    fn test_missing_scene() {
        let result = Config::resolve(None, std::iter::empty());
        assert!(matches!(result, Err(AppError::MissingScene)));
    }
}
