use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum SettersError {
	#[error(transparent)]
	#[diagnostic(code(setters::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse `{path}` at line {line}: {reason}")]
	#[diagnostic(
		code(setters::parse),
		help("check the YAML syntax at the reported line")
	)]
	Parse {
		path: String,
		line: usize,
		reason: String,
	},

	#[error("unable to read Kptfile: {0}")]
	#[diagnostic(code(setters::manifest_read))]
	ManifestRead(String),

	#[error(
		"file {path} doesn't exist, please ensure the file specified in \"configPath\" exists and \
		 retry"
	)]
	#[diagnostic(
		code(setters::setter_config_not_found),
		help("`configPath` is resolved against the package root, e.g. `setters.yaml`")
	)]
	SetterConfigNotFound { path: String },

	#[error("failed to read setter config `{path}`: {reason}")]
	#[diagnostic(code(setters::setter_config_read))]
	SetterConfigRead { path: String, reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(setters::config_parse),
		help("check that setters.toml is valid TOML with an optional [exclude] section")
	)]
	ConfigParse(String),

	#[error("file too large: `{path}` is {size} bytes (limit: {limit} bytes)")]
	#[diagnostic(
		code(setters::file_too_large),
		help("increase `max_file_size` in setters.toml or exclude this file")
	)]
	FileTooLarge { path: String, size: u64, limit: u64 },

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(setters::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },
}

/// A recoverable problem found while looking for setters declared in the
/// Kptfile. Discovery carries on with the setters found through field
/// comments.
#[derive(Debug, Clone, Diagnostic, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DiscoveryWarning {
	#[error("unable to find Kptfile")]
	#[diagnostic(
		code(setters::kptfile_not_found),
		severity(Warning),
		help("set `include_meta_resources = true` in setters.toml if the package has a Kptfile")
	)]
	KptfileNotFound,

	#[error("unable to find Pipeline declaration in Kptfile")]
	#[diagnostic(code(setters::pipeline_not_found), severity(Warning))]
	PipelineNotFound,

	#[error("unable to find apply-setters fn in Kptfile Pipeline.Mutators")]
	#[diagnostic(code(setters::apply_setters_not_found), severity(Warning))]
	ApplySettersNotFound,

	#[error("unable to find ConfigMap or ConfigPath fnConfig for apply-setters")]
	#[diagnostic(
		code(setters::apply_setters_config_not_found),
		severity(Warning),
		help("declare `configMap` or `configPath` on the apply-setters mutator")
	)]
	ApplySettersConfigNotFound,
}

pub type SettersResult<T> = Result<T, SettersError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
