//! Configuration management for sitegen.
//!
//! Parses `sitegen.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! Path values support shell-style expansion:
//!
//! - `~` - the home directory
//! - `$VAR` / `${VAR}` - the value of VAR, errors if unset
//! - `${VAR:-default}` - VAR if set, otherwise the default
//!
//! Expanded fields:
//! - `structure.path`
//! - `build.templates_dir`
//! - `build.pages_dir`
//! - `build.partials_dir`
//! - `uploads.dir`
//! - `export.json_path`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override structure document path.
    pub structure_path: Option<PathBuf>,
    /// Override menu link mode.
    pub link_mode: Option<LinkMode>,
    /// Override parallel scaffolding flag.
    pub parallel: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "sitegen.toml";

/// Default upload extension allow-list.
const DEFAULT_ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Structure document location (paths are relative strings from TOML).
    structure: StructureConfigRaw,
    /// Build settings (paths are relative strings from TOML).
    build: BuildConfigRaw,
    /// Upload settings.
    uploads: UploadsConfigRaw,
    /// Export settings.
    export: ExportConfigRaw,

    /// Resolved structure configuration (set after loading).
    #[serde(skip)]
    pub structure_resolved: StructureConfig,
    /// Resolved build configuration (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildConfig,
    /// Resolved upload configuration (set after loading).
    #[serde(skip)]
    pub uploads_resolved: UploadsConfig,
    /// Resolved export configuration (set after loading).
    #[serde(skip)]
    pub export_resolved: ExportConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// How menu entries link to their targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Links point at `#slug` anchors on a single page.
    #[default]
    Anchor,
    /// Links point at the resolved route path of each node.
    Navigable,
}

impl std::str::FromStr for LinkMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anchor" => Ok(Self::Anchor),
            "navigable" => Ok(Self::Navigable),
            other => Err(ConfigError::Validation(format!(
                "unknown link mode '{other}' (expected 'anchor' or 'navigable')"
            ))),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct StructureConfigRaw {
    path: Option<String>,
}

/// Resolved structure document configuration.
#[derive(Debug, Default)]
pub struct StructureConfig {
    /// Path to the persisted structure document.
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BuildConfigRaw {
    templates_dir: Option<String>,
    pages_dir: Option<String>,
    partials_dir: Option<String>,
    base_layout: Option<String>,
    link_mode: Option<LinkMode>,
    image_dir: Option<String>,
    image_extension: Option<String>,
    parallel: Option<bool>,
}

/// Resolved build configuration with absolute paths.
#[derive(Debug, Default)]
pub struct BuildConfig {
    /// Template root directory (home page lives here).
    pub templates_dir: PathBuf,
    /// Root directory for scaffolded page files.
    pub pages_dir: PathBuf,
    /// Directory receiving generated menu and offerings partials.
    pub partials_dir: PathBuf,
    /// Base layout reference written into scaffolded pages.
    pub base_layout: String,
    /// Menu link mode.
    pub link_mode: LinkMode,
    /// Public directory prefix for offering images.
    pub image_dir: String,
    /// Extension appended to logical image names.
    pub image_extension: String,
    /// Scaffold pages on a worker pool.
    pub parallel: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct UploadsConfigRaw {
    dir: Option<String>,
    allowed_extensions: Option<Vec<String>>,
}

/// Resolved upload configuration.
#[derive(Debug, Default)]
pub struct UploadsConfig {
    /// Directory receiving uploaded images.
    pub dir: PathBuf,
    /// Lowercase file extensions accepted for upload.
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ExportConfigRaw {
    json_path: Option<String>,
}

/// Resolved export configuration.
#[derive(Debug, Default)]
pub struct ExportConfig {
    /// Destination of the JSON structure export.
    pub json_path: PathBuf,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`structure.path`").
        field: String,
        /// Error message (e.g., "${`SITE_ROOT`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `sitegen.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(path) = &settings.structure_path {
            self.structure_resolved.path.clone_from(path);
        }
        if let Some(link_mode) = settings.link_mode {
            self.build_resolved.link_mode = link_mode;
        }
        if let Some(parallel) = settings.parallel {
            self.build_resolved.parallel = parallel;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        let mut config = Self {
            structure: StructureConfigRaw::default(),
            build: BuildConfigRaw::default(),
            uploads: UploadsConfigRaw::default(),
            export: ExportConfigRaw::default(),
            structure_resolved: StructureConfig::default(),
            build_resolved: BuildConfig::default(),
            uploads_resolved: UploadsConfig::default(),
            export_resolved: ExportConfig::default(),
            config_path: None,
        };
        config.resolve_paths(base);
        config
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_build()?;
        self.validate_uploads()?;
        Ok(())
    }

    fn validate_build(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.build_resolved.base_layout, "build.base_layout")?;
        require_non_empty(&self.build_resolved.image_extension, "build.image_extension")?;
        if self.build_resolved.image_extension.starts_with('.') {
            return Err(ConfigError::Validation(
                "build.image_extension must not start with '.'".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_uploads(&self) -> Result<(), ConfigError> {
        let allowed = &self.uploads_resolved.allowed_extensions;
        if allowed.is_empty() {
            return Err(ConfigError::Validation(
                "uploads.allowed_extensions cannot be empty".to_owned(),
            ));
        }
        if let Some(bad) = allowed.iter().find(|ext| ext.is_empty() || ext.contains('.')) {
            return Err(ConfigError::Validation(format!(
                "uploads.allowed_extensions entry '{bad}' must be a bare extension like 'png'"
            )));
        }
        Ok(())
    }

    /// Expand `~` and environment references in path strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        expand::expand_path(&mut self.structure.path, "structure.path")?;
        expand::expand_path(&mut self.build.templates_dir, "build.templates_dir")?;
        expand::expand_path(&mut self.build.pages_dir, "build.pages_dir")?;
        expand::expand_path(&mut self.build.partials_dir, "build.partials_dir")?;
        expand::expand_path(&mut self.uploads.dir, "uploads.dir")?;
        expand::expand_path(&mut self.export.json_path, "export.json_path")?;
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.structure_resolved = StructureConfig {
            path: resolve(self.structure.path.as_deref(), "site_structure.toml"),
        };

        let templates_dir = resolve(self.build.templates_dir.as_deref(), "templates");
        let pages_dir = match self.build.pages_dir.as_deref() {
            Some(dir) => config_dir.join(dir),
            None => templates_dir.clone(),
        };
        let partials_dir = match self.build.partials_dir.as_deref() {
            Some(dir) => config_dir.join(dir),
            None => templates_dir.join("_partials").join("_generated"),
        };
        self.build_resolved = BuildConfig {
            templates_dir,
            pages_dir,
            partials_dir,
            base_layout: self
                .build
                .base_layout
                .clone()
                .unwrap_or_else(|| "_partials/_base.html".to_owned()),
            link_mode: self.build.link_mode.unwrap_or_default(),
            image_dir: self
                .build
                .image_dir
                .clone()
                .unwrap_or_else(|| "images".to_owned()),
            image_extension: self
                .build
                .image_extension
                .clone()
                .unwrap_or_else(|| "png".to_owned()),
            parallel: self.build.parallel.unwrap_or(false),
        };

        self.uploads_resolved = UploadsConfig {
            dir: resolve(self.uploads.dir.as_deref(), "static/images"),
            allowed_extensions: self.uploads.allowed_extensions.as_ref().map_or_else(
                || {
                    DEFAULT_ALLOWED_EXTENSIONS
                        .iter()
                        .map(|&ext| ext.to_owned())
                        .collect()
                },
                |exts| exts.iter().map(|ext| ext.to_ascii_lowercase()).collect(),
            ),
        };

        self.export_resolved = ExportConfig {
            json_path: resolve(
                self.export.json_path.as_deref(),
                "static/data/structure.json",
            ),
        };
    }
}
