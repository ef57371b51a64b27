use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::SettersError;
use crate::SettersResult;

/// Default maximum file size in bytes (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["setters.toml", ".setters.toml", ".config/setters.toml"];

/// Configuration loaded from a `setters.toml` file.
///
/// ```toml
/// include_meta_resources = true
/// max_file_size = 10485760
/// disable_gitignore = false
///
/// [exclude]
/// patterns = ["upstream/", "*.generated.yaml"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SettersConfig {
	/// Whether the Kptfile and other package metadata resources are loaded.
	/// Without them setters can only be found through field comments.
	#[serde(default = "default_include_meta_resources")]
	pub include_meta_resources: bool,
	/// Exclusion configuration using gitignore-style patterns.
	#[serde(default)]
	pub exclude: ExcludeConfig,
	/// Maximum file size in bytes to load. Larger files are an error.
	#[serde(default = "default_max_file_size")]
	pub max_file_size: u64,
	/// When true, `.gitignore` files are not used for filtering.
	#[serde(default)]
	pub disable_gitignore: bool,
}

impl Default for SettersConfig {
	fn default() -> Self {
		Self {
			include_meta_resources: default_include_meta_resources(),
			exclude: ExcludeConfig::default(),
			max_file_size: default_max_file_size(),
			disable_gitignore: false,
		}
	}
}

/// Files and directories to skip while loading a package.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeConfig {
	/// Gitignore-style patterns relative to the package root.
	///
	/// Examples: `"upstream/"`, `"*.generated.yaml"`, `"!keep.yaml"`.
	#[serde(default)]
	pub patterns: Vec<String>,
}

fn default_include_meta_resources() -> bool {
	true
}

fn default_max_file_size() -> u64 {
	DEFAULT_MAX_FILE_SIZE
}

impl SettersConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> SettersResult<Option<SettersConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: SettersConfig =
			toml::from_str(&content).map_err(|e| SettersError::ConfigParse(e.to_string()))?;

		tracing::debug!(path = %config_path.display(), "loaded config");
		Ok(Some(config))
	}
}
