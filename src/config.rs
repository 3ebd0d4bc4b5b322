use std::path::PathBuf;

use crate::data::filter::PREVIEW_LIMIT;

/// Archive shipped next to the binary.
pub const DEFAULT_ARCHIVE: &str = "Banco de Preço em Saúde - BPS Unificado BI Mundimed.zip";

/// Environment variable overriding [`DEFAULT_ARCHIVE`].
pub const ARCHIVE_ENV: &str = "BPS_ARCHIVE";

/// Runtime settings shared by the dashboard and the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Dataset loaded at start-up.
    pub archive_path: PathBuf,
    /// Maximum product descriptions in the search preview.
    pub preview_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            archive_path: PathBuf::from(DEFAULT_ARCHIVE),
            preview_limit: PREVIEW_LIMIT,
        }
    }
}

impl AppConfig {
    /// Defaults, overridden by `BPS_ARCHIVE` when set and non-empty.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup(ARCHIVE_ENV).filter(|p| !p.trim().is_empty()) {
            config.archive_path = PathBuf::from(path);
        }
        config
    }

    /// Replace the archive path when one was given explicitly.
    pub fn with_archive(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.archive_path = path;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.archive_path, PathBuf::from(DEFAULT_ARCHIVE));
        assert_eq!(config.preview_limit, 10);
    }

    #[test]
    fn env_then_explicit_override() {
        let config = AppConfig::from_lookup(|key| (key == ARCHIVE_ENV).then(|| "dados.zip".to_string()));
        assert_eq!(config.archive_path, PathBuf::from("dados.zip"));

        let blank = AppConfig::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(blank.archive_path, PathBuf::from(DEFAULT_ARCHIVE));

        let explicit = config.with_archive(Some(PathBuf::from("outro.csv")));
        assert_eq!(explicit.archive_path, PathBuf::from("outro.csv"));
    }
}
