//! Runtime settings read from the environment.
//!
//! Keys and defaults follow the service's deployment contract: `UPLOAD_DIR`,
//! `TEMP_DIR`, `CACHE_DIR`, `OCR_DPI`, `MAX_WORKERS`, `TESSDATA_DIR`,
//! `SOAP_URL`, `SOAP_USERNAME`, `SOAP_PASSWORD`.

use std::env;
use std::path::PathBuf;

use tracing::warn;

#[derive(Debug, Clone)]
pub struct Settings {
    pub upload_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub cache_dir: PathBuf,
    /// Rendering resolution for the optical and OCR stages.
    pub ocr_dpi: u32,
    /// Bound on concurrent pipeline invocations in a batch.
    pub max_workers: usize,
    /// Parent directory of the tesseract `tessdata` files; system default
    /// when unset.
    pub tessdata_dir: Option<String>,
    pub soap_url: String,
    pub soap_username: String,
    pub soap_password: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            upload_dir: PathBuf::from("./uploads"),
            temp_dir: PathBuf::from("./temp"),
            cache_dir: PathBuf::from("./cache"),
            ocr_dpi: 300,
            max_workers: 4,
            tessdata_dir: None,
            soap_url: String::new(),
            soap_username: String::new(),
            soap_password: String::new(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Settings::default();
        Settings {
            upload_dir: env_path("UPLOAD_DIR", defaults.upload_dir),
            temp_dir: env_path("TEMP_DIR", defaults.temp_dir),
            cache_dir: env_path("CACHE_DIR", defaults.cache_dir),
            ocr_dpi: env_parse("OCR_DPI", defaults.ocr_dpi),
            max_workers: env_parse("MAX_WORKERS", defaults.max_workers),
            tessdata_dir: env::var("TESSDATA_DIR").ok().filter(|v| !v.is_empty()),
            soap_url: env::var("SOAP_URL").unwrap_or_default(),
            soap_username: env::var("SOAP_USERNAME").unwrap_or_default(),
            soap_password: env::var("SOAP_PASSWORD").unwrap_or_default(),
        }
    }

    /// Create the working directories if they do not exist yet.
    pub fn create_directories(&self) -> std::io::Result<()> {
        for dir in [&self.upload_dir, &self.temp_dir, &self.cache_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    match env::var(key) {
        Ok(value) if !value.is_empty() => PathBuf::from(value),
        _ => default,
    }
}

fn env_parse<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring invalid {key}={value:?}, using default");
            default
        }),
        Err(_) => default,
    }
}
