use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;

use crate::SettersError;
use crate::SettersResult;
use crate::config::DEFAULT_MAX_FILE_SIZE;
use crate::config::SettersConfig;
use crate::document::Document;
use crate::loader::parse_documents;
use crate::manifest::KPTFILE_NAME;

/// Options for controlling how a package directory is loaded.
///
/// Use [`ScanOptions::default()`] for sensible defaults or
/// [`ScanOptions::from_config`] to construct from a [`SettersConfig`].
#[derive(Debug, Clone)]
pub struct ScanOptions {
	/// Gitignore-style patterns to exclude from loading.
	pub exclude_patterns: Vec<String>,
	/// Maximum file size to load in bytes.
	pub max_file_size: u64,
	/// Whether to disable `.gitignore` integration.
	pub disable_gitignore: bool,
	/// Whether `Kptfile` manifests are loaded.
	pub include_meta_resources: bool,
}

impl Default for ScanOptions {
	fn default() -> Self {
		Self {
			exclude_patterns: Vec::new(),
			max_file_size: DEFAULT_MAX_FILE_SIZE,
			disable_gitignore: false,
			include_meta_resources: true,
		}
	}
}

impl ScanOptions {
	/// Construct [`ScanOptions`] from a [`SettersConfig`].
	pub fn from_config(config: Option<&SettersConfig>) -> Self {
		let Some(config) = config else {
			return Self::default();
		};

		Self {
			exclude_patterns: config.exclude.patterns.clone(),
			max_file_size: config.max_file_size,
			disable_gitignore: config.disable_gitignore,
			include_meta_resources: config.include_meta_resources,
		}
	}
}

/// Load a package with the config discovered at `root`.
pub fn scan_package_with_config(root: &Path) -> SettersResult<Vec<Document>> {
	let config = SettersConfig::load(root)?;
	let options = ScanOptions::from_config(config.as_ref());
	load_package(root, &options)
}

/// Read every resource file under `root` and parse its documents.
///
/// Files are visited in sorted path order and each document is tagged with
/// its path relative to `root`, using `/` separators.
pub fn load_package(root: &Path, options: &ScanOptions) -> SettersResult<Vec<Document>> {
	let files = collect_files(root, options)?;
	let mut documents = Vec::new();

	for file in files {
		let metadata = std::fs::metadata(&file)?;
		if metadata.len() > options.max_file_size {
			return Err(SettersError::FileTooLarge {
				path: file.display().to_string(),
				size: metadata.len(),
				limit: options.max_file_size,
			});
		}

		let relative = relative_path(root, &file);
		let content = std::fs::read_to_string(&file)?;
		let parsed = parse_documents(&content, Some(&relative))?;
		tracing::trace!(path = relative.as_str(), documents = parsed.len(), "loaded file");
		documents.extend(parsed);
	}

	Ok(documents)
}

/// Path of `file` relative to `root` with `/` separators.
fn relative_path(root: &Path, file: &Path) -> String {
	file.strip_prefix(root)
		.unwrap_or(file)
		.to_string_lossy()
		.replace('\\', "/")
}

/// Build a `Gitignore` matcher from exclude patterns specified in
/// `setters.toml` `[exclude]`. These are applied on top of any `.gitignore`
/// rules.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> SettersResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			SettersError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}
	builder
		.build()
		.map_err(|e| SettersError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

/// Build a `Gitignore` matcher from the package's `.gitignore` file (if any).
fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		let _ = builder.add(gitignore_path);
	}
	builder.build().unwrap_or_else(|_| Gitignore::empty())
}

fn collect_files(root: &Path, options: &ScanOptions) -> SettersResult<Vec<PathBuf>> {
	let mut files = Vec::new();
	let mut visited_dirs = HashSet::new();

	let gitignore = if options.disable_gitignore {
		Gitignore::empty()
	} else {
		build_gitignore(root)
	};
	let custom_exclude = build_exclude_matcher(root, &options.exclude_patterns)?;

	let mut walker = PackageWalker {
		files: &mut files,
		gitignore: &gitignore,
		custom_exclude: &custom_exclude,
		visited_dirs: &mut visited_dirs,
		include_meta_resources: options.include_meta_resources,
	};
	walker.walk_dir(root)?;

	files.sort();
	Ok(files)
}

struct PackageWalker<'a> {
	files: &'a mut Vec<PathBuf>,
	gitignore: &'a Gitignore,
	custom_exclude: &'a Gitignore,
	visited_dirs: &'a mut HashSet<PathBuf>,
	include_meta_resources: bool,
}

impl PackageWalker<'_> {
	fn walk_dir(&mut self, dir: &Path) -> SettersResult<()> {
		if !dir.is_dir() {
			return Ok(());
		}

		// Symlink cycles show up as a canonical path seen twice.
		let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
		if !self.visited_dirs.insert(canonical) {
			return Err(SettersError::SymlinkCycle {
				path: dir.display().to_string(),
			});
		}

		for entry in std::fs::read_dir(dir)? {
			let path = entry?.path();

			if path
				.file_name()
				.and_then(|name| name.to_str())
				.is_some_and(is_ignored_directory_name)
				&& path.is_dir()
			{
				continue;
			}

			let is_dir = path.is_dir();
			if self.gitignore.matched(&path, is_dir).is_ignore()
				|| self.custom_exclude.matched(&path, is_dir).is_ignore()
			{
				continue;
			}

			if is_dir {
				self.walk_dir(&path)?;
			} else if is_resource_file(&path, self.include_meta_resources) {
				self.files.push(path);
			}
		}

		Ok(())
	}
}

fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || name == "node_modules" || name == "target"
}

/// Whether `path` holds package resources: `*.yaml`, `*.yml` and, when meta
/// resources are included, `Kptfile`.
pub fn is_resource_file(path: &Path, include_meta_resources: bool) -> bool {
	let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
		return false;
	};

	if name == KPTFILE_NAME {
		return include_meta_resources;
	}

	path.extension()
		.and_then(|extension| extension.to_str())
		.is_some_and(|extension| matches!(extension, "yaml" | "yml"))
}
