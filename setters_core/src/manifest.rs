use std::collections::BTreeMap;

use serde::Deserialize;
use serde_yaml_ng::Value as YamlValue;

use crate::DiscoveryWarning;
use crate::SettersError;
use crate::SettersResult;
use crate::document::Document;
use crate::registry::SeedValue;

/// Path identity of the package manifest.
pub const KPTFILE_NAME: &str = "Kptfile";

/// Substring of the image reference that identifies the apply-setters
/// function.
pub const APPLY_SETTERS_IMAGE: &str = "apply-setters";

/// The subset of the Kptfile that setter discovery reads.
///
/// ```yaml
/// apiVersion: kpt.dev/v1
/// kind: Kptfile
/// pipeline:
///   mutators:
///     - image: gcr.io/kpt-fn/apply-setters:v0.2
///       configPath: setters.yaml
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Kptfile {
	#[serde(default)]
	pub pipeline: Option<Pipeline>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pipeline {
	#[serde(default)]
	pub mutators: Option<Vec<Function>>,
}

/// A function declared in the Kptfile pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
	#[serde(default)]
	pub image: Option<String>,
	/// Inline setter values.
	#[serde(default)]
	pub config_map: Option<BTreeMap<String, ConfigValue>>,
	/// Path of a ConfigMap resource holding the setter values in `data`.
	#[serde(default)]
	pub config_path: Option<String>,
}

impl Function {
	pub fn is_apply_setters(&self) -> bool {
		self.image
			.as_deref()
			.is_some_and(|image| image.contains(APPLY_SETTERS_IMAGE))
	}
}

/// A declared setter value. Strings may still hold a sequence literal such
/// as `"[dev, prod]"`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ConfigValue {
	Text(String),
	List(Vec<String>),
	Null,
}

/// The ConfigMap referenced through `configPath`.
#[derive(Debug, Clone, Default, Deserialize)]
struct SetterConfig {
	#[serde(default)]
	data: Option<BTreeMap<String, ConfigValue>>,
}

/// The outcome of looking for setters declared in the Kptfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSeed {
	/// Setters declared by the apply-setters function, classified as scalar
	/// or list values.
	Setters(BTreeMap<String, SeedValue>),
	/// Nothing to seed; discovery continues with field comments only.
	Skipped(DiscoveryWarning),
}

/// Find the Kptfile among `documents` and read it.
pub fn find_kptfile(documents: &[Document]) -> SettersResult<Option<Kptfile>> {
	let Some(document) = documents
		.iter()
		.find(|document| document.path() == Some(KPTFILE_NAME))
	else {
		return Ok(None);
	};

	serde_yaml_ng::from_value(document.root.to_yaml_value())
		.map(Some)
		.map_err(|e| SettersError::ManifestRead(e.to_string()))
}

/// Collect the setters declared by the apply-setters mutator of the Kptfile.
///
/// Missing pieces (no Kptfile, no pipeline, no apply-setters mutator, no
/// config on it) are reported as [`ManifestSeed::Skipped`]. A Kptfile that
/// can't be read, or a `configPath` that names no document in the set, is an
/// error.
pub fn find_setters_from_kptfile(documents: &[Document]) -> SettersResult<ManifestSeed> {
	let Some(kptfile) = find_kptfile(documents)? else {
		return Ok(ManifestSeed::Skipped(DiscoveryWarning::KptfileNotFound));
	};
	let Some(pipeline) = kptfile.pipeline else {
		return Ok(ManifestSeed::Skipped(DiscoveryWarning::PipelineNotFound));
	};

	let mutators = pipeline.mutators.unwrap_or_default();
	let Some(function) = mutators.iter().find(|function| function.is_apply_setters()) else {
		return Ok(ManifestSeed::Skipped(DiscoveryWarning::ApplySettersNotFound));
	};

	let declared = if let Some(config_map) = &function.config_map {
		config_map.clone()
	} else if let Some(config_path) = function.config_path.as_deref().filter(|p| !p.is_empty()) {
		read_setter_config(documents, config_path)?
	} else {
		return Ok(ManifestSeed::Skipped(
			DiscoveryWarning::ApplySettersConfigNotFound,
		));
	};

	let setters = declared
		.into_iter()
		.map(|(name, value)| {
			let value = classify_seed_value(value);
			(name, value)
		})
		.collect();

	Ok(ManifestSeed::Setters(setters))
}

/// Read the `data` section of the document whose path is `config_path`.
fn read_setter_config(
	documents: &[Document],
	config_path: &str,
) -> SettersResult<BTreeMap<String, ConfigValue>> {
	let Some(document) = documents
		.iter()
		.find(|document| document.path() == Some(config_path))
	else {
		return Err(SettersError::SetterConfigNotFound {
			path: config_path.to_string(),
		});
	};

	let config: SetterConfig =
		serde_yaml_ng::from_value(document.root.to_yaml_value()).map_err(|e| {
			SettersError::SetterConfigRead {
				path: config_path.to_string(),
				reason: e.to_string(),
			}
		})?;

	Ok(config.data.unwrap_or_default())
}

/// Decide whether a declared value is a list or a scalar. Strings that parse
/// as a YAML sequence become lists.
pub fn classify_seed_value(value: ConfigValue) -> SeedValue {
	match value {
		ConfigValue::List(values) => SeedValue::List(values),
		ConfigValue::Null => SeedValue::Scalar(String::new()),
		ConfigValue::Text(text) => {
			match parse_sequence_literal(&text) {
				Some(values) => SeedValue::List(values),
				None => SeedValue::Scalar(text),
			}
		}
	}
}

/// Parse `text` as a YAML sequence and render each element as a string.
/// Returns `None` when `text` is not a sequence.
pub fn parse_sequence_literal(text: &str) -> Option<Vec<String>> {
	let elements: Vec<YamlValue> = serde_yaml_ng::from_str(text).ok()?;
	elements
		.into_iter()
		.map(|element| {
			match element {
				YamlValue::String(value) => Some(value),
				other => {
					serde_yaml_ng::to_string(&other)
						.ok()
						.map(|rendered| rendered.replace('\n', ""))
				}
			}
		})
		.collect()
}
