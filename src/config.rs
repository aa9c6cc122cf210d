use crate::attachments::DEFAULT_MAX_UPLOAD_BYTES;
use crate::model::MAX_PROJECT_IMAGES;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub backend: BackendConfig,
  /// Custom title for header (defaults to the backend host if not set)
  pub title: Option<String>,
  /// Pre-filled on the login screen
  pub email: Option<String>,
  #[serde(default)]
  pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
  /// Project URL, e.g. https://abc.supabase.co
  pub url: String,
  /// Object-store bucket holding every attachment
  #[serde(default = "default_bucket")]
  pub bucket: String,
}

fn default_bucket() -> String {
  "images".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes: u64,
  #[serde(default = "default_max_gallery_images")]
  pub max_gallery_images: usize,
}

impl Default for LimitsConfig {
  fn default() -> Self {
    Self {
      max_upload_bytes: default_max_upload_bytes(),
      max_gallery_images: default_max_gallery_images(),
    }
  }
}

fn default_max_upload_bytes() -> u64 {
  DEFAULT_MAX_UPLOAD_BYTES
}

fn default_max_gallery_images() -> usize {
  MAX_PROJECT_IMAGES
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./siteadmin.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/siteadmin/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/siteadmin/config.yaml\n\
                 See the README for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("siteadmin.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("siteadmin").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    if config.backend.url.trim().is_empty() {
      return Err(eyre!("backend.url is empty in {}", path.display()));
    }
    Ok(config)
  }

  /// Header title: the configured one, else the backend host.
  pub fn display_title(&self) -> String {
    self.title.clone().unwrap_or_else(|| {
      url::Url::parse(&self.backend.url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
        .unwrap_or_else(|| self.backend.url.clone())
    })
  }

  /// Get the backend's public API key from environment variables.
  ///
  /// Checks SITEADMIN_API_KEY first, then SUPABASE_ANON_KEY as fallback.
  pub fn get_api_key() -> Result<String> {
    std::env::var("SITEADMIN_API_KEY")
      .or_else(|_| std::env::var("SUPABASE_ANON_KEY"))
      .map_err(|_| {
        eyre!("API key not found. Set SITEADMIN_API_KEY or SUPABASE_ANON_KEY environment variable.")
      })
  }

  /// Password for signing in without the login form, if set.
  pub fn get_password() -> Option<String> {
    std::env::var("SITEADMIN_PASSWORD")
      .ok()
      .filter(|p| !p.is_empty())
  }
}
