use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::imaging::OutputFormat;
use crate::kernel::FilterParams;
use crate::pipeline::{JobSpec, NamingPolicy};

/// Service settings. Every field has a default, so a config file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: String,
    /// Root of the `/static` tree (samples and downloads live below it).
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub max_extracted_bytes: u64,
    pub workers: usize,
    /// Side length of the grayscale preview returned for single images.
    pub preview_size: u32,
    pub jpeg_quality: u8,
    pub max_kernel_size: usize,
    /// Defaults for the tunable dataset endpoint.
    pub tuned_defaults: FilterParams,
    /// Fixed parameters of the direct-download dataset endpoint.
    pub download_defaults: FilterParams,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            bind_addr: "127.0.0.1:8000".into(),
            static_dir: PathBuf::from("static"),
            max_upload_bytes: 200 * 1024 * 1024,
            max_extracted_bytes: 1 << 30,
            workers: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            preview_size: 256,
            jpeg_quality: 95,
            max_kernel_size: 31,
            tuned_defaults: FilterParams::new(3, 0.3, Some(1.0)),
            download_defaults: FilterParams::new(3, 1.0, Some(1.0)),
        }
    }
}

impl ServiceConfig {
    /// Deserializes a config from a JSON file.
    pub fn load_json(path: &Path) -> Result<ServiceConfig, ConfigError> {
        let file = std::fs::File::open(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.preview_size == 0 {
            return Err(ConfigError::Invalid("preview_size must be at least 1".into()));
        }
        if self.max_upload_bytes == 0 || self.max_extracted_bytes == 0 {
            return Err(ConfigError::Invalid("size limits must be non-zero".into()));
        }
        for params in [&self.tuned_defaults, &self.download_defaults] {
            params.validate().map_err(|e| ConfigError::Invalid(e.to_string()))?;
            if params.kernel_size > self.max_kernel_size {
                return Err(ConfigError::Invalid(format!(
                    "default kernel_size {} exceeds max_kernel_size {}",
                    params.kernel_size, self.max_kernel_size
                )));
            }
        }
        Ok(())
    }

    pub fn samples_dir(&self) -> PathBuf {
        self.static_dir.join("samples")
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.static_dir.join("downloads")
    }

    /// Job settings derived from this config for a given parameter set.
    pub fn job_spec(&self, params: FilterParams, samples_dir: Option<PathBuf>) -> JobSpec {
        JobSpec {
            params,
            workers: self.workers,
            naming: NamingPolicy::new(OutputFormat::Jpeg { quality: self.jpeg_quality }),
            samples_dir,
            max_extracted_bytes: self.max_extracted_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ServiceConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{ "bind_addr": "0.0.0.0:9000", "workers": 2 }"#).unwrap();

        let cfg = ServiceConfig::load_json(&path).unwrap();

        assert_eq!(cfg.bind_addr, "0.0.0.0:9000");
        assert_eq!(cfg.workers, 2);
        assert_eq!(cfg.preview_size, 256);
        assert_eq!(cfg.tuned_defaults, FilterParams::new(3, 0.3, Some(1.0)));
    }

    #[test]
    fn bad_defaults_are_rejected() {
        let mut cfg = ServiceConfig::default();
        cfg.download_defaults = FilterParams::new(3, 0.0, None);
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        let mut cfg = ServiceConfig::default();
        cfg.max_kernel_size = 1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ServiceConfig::load_json(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
