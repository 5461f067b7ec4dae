//! Optional `config.toml` in the data dir.
//!
//! Every field is optional. Flags and env vars win over the file.

use std::path::Path;

use clap::ValueEnum;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub output_format: Option<OutputFormat>,
    pub log: LogConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub filter: Option<String>,
    pub format: Option<String>,
}

/// Load the config file, or defaults when it doesn't exist.
pub fn load(path: &Path) -> anyhow::Result<FileConfig> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(FileConfig::default())
        }
        Err(err) => {
            return Err(anyhow::anyhow!(
                "failed to read {}: {}",
                path.display(),
                err
            ))
        }
    };

    toml::from_str(&raw).map_err(|err| anyhow::anyhow!("invalid {}: {}", path.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config = load(&tmp.path().join("config.toml")).expect("load");
        assert_eq!(config.output_format, None);
        assert!(config.log.filter.is_none());
    }

    #[test]
    fn reads_output_and_log_settings() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "output_format = \"json\"\n\n[log]\nfilter = \"packetline_timeline=debug\"\nformat = \"pretty\"\n",
        )
        .expect("write config");

        let config = load(&path).expect("load");
        assert_eq!(config.output_format, Some(OutputFormat::Json));
        assert_eq!(config.log.filter.as_deref(), Some("packetline_timeline=debug"));
        assert_eq!(config.log.format.as_deref(), Some("pretty"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "output_format = \"yaml\"").expect("write config");

        let err = load(&path).expect_err("unknown format");
        assert!(err.to_string().contains("config.toml"));
    }
}
