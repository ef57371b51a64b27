use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Display;

use serde::Serialize;

/// Type tag reported for an array setter.
pub const ARRAY_SETTER_TYPE: &str = "list";

/// Type tag reported for a scalar setter.
pub const SCALAR_SETTER_TYPE: &str = "string";

/// A setter whose fields hold a single value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarSetter {
	/// Name of the setter.
	pub name: String,
	/// Value of the first field bound to the setter.
	pub value: String,
	/// Number of fields set by the setter.
	pub count: usize,
}

/// A setter whose fields hold a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArraySetter {
	/// Name of the setter.
	pub name: String,
	/// Sorted elements of the first field bound to the setter.
	pub values: Vec<String>,
	/// Number of fields set by the setter.
	pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SetterType {
	List,
	String,
}

impl Display for SetterType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::List => ARRAY_SETTER_TYPE,
			Self::String => SCALAR_SETTER_TYPE,
		})
	}
}

/// A discovered setter as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryResult {
	pub name: String,
	pub value: String,
	#[serde(rename = "type")]
	pub r#type: SetterType,
	pub count: usize,
}

impl Display for DiscoveryResult {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Name: {}, Value: {}, Type {}, Count {}",
			self.name, self.value, self.r#type, self.count
		)
	}
}

/// A setter value declared up front, before any field is visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedValue {
	Scalar(String),
	List(Vec<String>),
}

/// The setters discovered during one pass over a set of documents.
///
/// Entries are only ever created or have their count incremented; the value
/// stored is the one seen first. A name lives under exactly one kind: once
/// recorded as a scalar it stays a scalar, and a later array match for the
/// same name only bumps the existing count (and vice versa).
#[derive(Debug, Clone, Default)]
pub struct SetterRegistry {
	scalar_setters: BTreeMap<String, ScalarSetter>,
	array_setters: BTreeMap<String, ArraySetter>,
}

impl SetterRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn scalar_setters(&self) -> &BTreeMap<String, ScalarSetter> {
		&self.scalar_setters
	}

	pub fn array_setters(&self) -> &BTreeMap<String, ArraySetter> {
		&self.array_setters
	}

	/// Declare a setter with a count of zero. Seeding a name that already
	/// exists leaves the registry unchanged. List values keep their declared
	/// order.
	pub fn seed(&mut self, name: &str, value: SeedValue) {
		if self.contains(name) {
			return;
		}

		match value {
			SeedValue::Scalar(value) => {
				self.scalar_setters.insert(
					name.to_string(),
					ScalarSetter {
						name: name.to_string(),
						value,
						count: 0,
					},
				);
			}
			SeedValue::List(values) => {
				self.array_setters.insert(
					name.to_string(),
					ArraySetter {
						name: name.to_string(),
						values,
						count: 0,
					},
				);
			}
		}
	}

	/// Record a field whose value bound `name` to `value`.
	pub fn record_scalar(&mut self, name: &str, value: &str) {
		if self.increment(name) {
			return;
		}

		tracing::debug!(setter = name, value, "discovered scalar setter");
		self.scalar_setters.insert(
			name.to_string(),
			ScalarSetter {
				name: name.to_string(),
				value: value.to_string(),
				count: 1,
			},
		);
	}

	/// Record a sequence field controlled by `name`. `values` are sorted
	/// before they are stored.
	pub fn record_array(&mut self, name: &str, mut values: Vec<String>) {
		if self.increment(name) {
			return;
		}

		values.sort();
		tracing::debug!(setter = name, ?values, "discovered array setter");
		self.array_setters.insert(
			name.to_string(),
			ArraySetter {
				name: name.to_string(),
				values,
				count: 1,
			},
		);
	}

	fn contains(&self, name: &str) -> bool {
		self.scalar_setters.contains_key(name) || self.array_setters.contains_key(name)
	}

	/// Bump the count of an existing entry of either kind.
	fn increment(&mut self, name: &str) -> bool {
		let count = if let Some(setter) = self.scalar_setters.get_mut(name) {
			&mut setter.count
		} else if let Some(setter) = self.array_setters.get_mut(name) {
			&mut setter.count
		} else {
			return false;
		};

		*count += 1;
		tracing::debug!(setter = name, count = *count, "setter matched again");
		true
	}

	/// All setters sorted by name.
	pub fn results(&self) -> Vec<DiscoveryResult> {
		let arrays = self.array_setters.values().map(|setter| {
			DiscoveryResult {
				name: setter.name.clone(),
				value: format!("[{}]", setter.values.join(" ")),
				r#type: SetterType::List,
				count: setter.count,
			}
		});
		let scalars = self.scalar_setters.values().map(|setter| {
			DiscoveryResult {
				name: setter.name.clone(),
				value: setter.value.clone(),
				r#type: SetterType::String,
				count: setter.count,
			}
		});

		let mut results: Vec<DiscoveryResult> = arrays.chain(scalars).collect();
		results.sort_by(|a, b| a.name.cmp(&b.name));
		results
	}
}
