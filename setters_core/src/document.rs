use serde_yaml_ng::Mapping as YamlMapping;
use serde_yaml_ng::Value as YamlValue;

/// Annotation kpt uses to record where a resource was read from.
pub const PATH_ANNOTATION: &str = "internal.config.kubernetes.io/path";

/// Legacy spelling of [`PATH_ANNOTATION`].
pub const LEGACY_PATH_ANNOTATION: &str = "config.kubernetes.io/path";

/// One parsed YAML document together with the path it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
	/// Path tag assigned by the loader, relative to the package root and
	/// using `/` separators.
	pub path: Option<String>,
	/// The top level node of the document.
	pub root: Node,
}

impl Document {
	pub fn new(root: Node, path: Option<String>) -> Self {
		Self { path, root }
	}

	/// The path identity of this document. The loader's tag wins, otherwise
	/// the kpt path annotation in `metadata.annotations` is used.
	pub fn path(&self) -> Option<&str> {
		if let Some(path) = self.path.as_deref() {
			return Some(path);
		}

		let annotations = self.root.get("metadata")?.get("annotations")?;
		annotations
			.get(PATH_ANNOTATION)
			.or_else(|| annotations.get(LEGACY_PATH_ANNOTATION))
			.and_then(Node::as_str)
	}
}

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
	Scalar(Scalar),
	Sequence(Sequence),
	Mapping(Mapping),
}

/// How a scalar was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalarStyle {
	#[default]
	Plain,
	SingleQuoted,
	DoubleQuoted,
	/// `|` block scalar.
	Literal,
	/// `>` block scalar.
	Folded,
}

/// How a collection was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionStyle {
	#[default]
	Block,
	/// `[a, b]` or `{a: b}`.
	Flow,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scalar {
	/// The literal text of the scalar after unquoting.
	pub value: String,
	pub style: ScalarStyle,
	/// Trailing line comment including the leading `#`.
	pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sequence {
	pub items: Vec<Node>,
	pub style: CollectionStyle,
	/// Trailing line comment of a flow sequence.
	pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mapping {
	pub fields: Vec<Field>,
	pub style: CollectionStyle,
	/// Trailing line comment of a flow mapping.
	pub comment: Option<String>,
}

/// A `key: value` entry of a mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
	pub key: String,
	/// Comment written after the key when the value starts on a later line,
	/// e.g. `args: # comment` followed by a block sequence.
	pub key_comment: Option<String>,
	pub value: Node,
}

impl Field {
	/// The line comment that describes this field as a whole. Values written
	/// inline in flow style carry their own comment, block values leave it
	/// on the key.
	pub fn line_comment(&self) -> Option<&str> {
		match &self.value {
			Node::Sequence(Sequence {
				style: CollectionStyle::Flow,
				comment,
				..
			})
			| Node::Mapping(Mapping {
				style: CollectionStyle::Flow,
				comment,
				..
			}) => comment.as_deref(),
			_ => self.key_comment.as_deref(),
		}
	}
}

impl Scalar {
	pub fn plain(value: impl Into<String>) -> Self {
		Self {
			value: value.into(),
			..Self::default()
		}
	}

	/// Plain `~`, `null` and empty scalars are YAML nulls.
	pub fn is_null(&self) -> bool {
		self.style == ScalarStyle::Plain
			&& matches!(self.value.as_str(), "" | "~" | "null" | "Null" | "NULL")
	}
}

impl Node {
	pub fn null() -> Self {
		Self::Scalar(Scalar::default())
	}

	/// Look up a field of a mapping node by key.
	pub fn get(&self, key: &str) -> Option<&Node> {
		match self {
			Self::Mapping(mapping) => mapping
				.fields
				.iter()
				.find(|field| field.key == key)
				.map(|field| &field.value),
			_ => None,
		}
	}

	/// The text of a non-null scalar node.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Scalar(scalar) if !scalar.is_null() => Some(scalar.value.as_str()),
			_ => None,
		}
	}

	/// Convert this subtree into a `serde_yaml_ng::Value` so typed views can
	/// be deserialized from it. Every non-null scalar becomes a string.
	pub fn to_yaml_value(&self) -> YamlValue {
		match self {
			Self::Scalar(scalar) if scalar.is_null() => YamlValue::Null,
			Self::Scalar(scalar) => YamlValue::String(scalar.value.clone()),
			Self::Sequence(sequence) => {
				YamlValue::Sequence(sequence.items.iter().map(Node::to_yaml_value).collect())
			}
			Self::Mapping(mapping) => {
				let mut map = YamlMapping::new();
				for field in &mapping.fields {
					map.insert(YamlValue::String(field.key.clone()), field.value.to_yaml_value());
				}
				YamlValue::Mapping(map)
			}
		}
	}
}
