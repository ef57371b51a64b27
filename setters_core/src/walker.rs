use crate::document::Document;
use crate::document::Field;
use crate::document::Mapping;
use crate::document::Node;
use crate::document::Scalar;
use crate::marker::clean;
use crate::marker::extract_setter_pattern;
use crate::pattern::Pattern;
use crate::registry::SetterRegistry;

/// Visits every field of a document and records the setters their comments
/// declare into a borrowed [`SetterRegistry`].
pub struct SetterWalker<'r> {
	registry: &'r mut SetterRegistry,
	file_path: Option<String>,
}

impl<'r> SetterWalker<'r> {
	pub fn new(registry: &'r mut SetterRegistry) -> Self {
		Self {
			registry,
			file_path: None,
		}
	}

	/// Walk one document depth-first in field order.
	pub fn walk(&mut self, document: &Document) {
		self.file_path = document.path().map(ToString::to_string);
		tracing::trace!(path = self.file_path.as_deref(), "walking document");
		self.visit_node(&document.root);
	}

	fn visit_node(&mut self, node: &Node) {
		match node {
			Node::Mapping(mapping) => {
				self.visit_mapping(mapping);
				for field in &mapping.fields {
					self.visit_node(&field.value);
				}
			}
			Node::Sequence(sequence) => {
				for item in &sequence.items {
					self.visit_node(item);
				}
			}
			Node::Scalar(scalar) => self.visit_scalar(scalar),
		}
	}

	/// Record an array setter for every sequence-valued field whose comment
	/// carries a setter marker.
	fn visit_mapping(&mut self, mapping: &Mapping) {
		for field in &mapping.fields {
			self.visit_field(field);
		}
	}

	fn visit_field(&mut self, field: &Field) {
		let Node::Sequence(sequence) = &field.value else {
			return;
		};
		let Some(setter_pattern) = field.line_comment().and_then(extract_setter_pattern) else {
			return;
		};

		let pattern = Pattern::parse(setter_pattern);
		if pattern.is_parameterized() && !pattern.is_single_placeholder() {
			tracing::debug!(
				path = self.file_path.as_deref(),
				field = field.key.as_str(),
				pattern = setter_pattern,
				"array setters take a bare setter name, skipping"
			);
			return;
		}

		let setter_name = clean(setter_pattern);
		if setter_name.is_empty() {
			return;
		}

		let values: Vec<String> = sequence
			.items
			.iter()
			.filter_map(|item| {
				match item {
					Node::Scalar(scalar) => Some(scalar.value.clone()),
					_ => None,
				}
			})
			.collect();

		self.registry.record_array(setter_name, values);
	}

	/// Record the scalar setters a marked scalar binds.
	fn visit_scalar(&mut self, scalar: &Scalar) {
		let Some(setter_pattern) = scalar.comment.as_deref().and_then(extract_setter_pattern) else {
			return;
		};

		let pattern = Pattern::parse(setter_pattern);
		if !pattern.is_parameterized() {
			// A bare name binds the whole field value.
			let setter_name = clean(setter_pattern);
			if !setter_name.is_empty() {
				self.registry.record_scalar(setter_name, &scalar.value);
			}
			return;
		}

		let bindings = pattern.resolve(&scalar.value);
		if bindings.is_empty() {
			tracing::debug!(
				path = self.file_path.as_deref(),
				pattern = setter_pattern,
				value = scalar.value.as_str(),
				"field value doesn't match its setter pattern"
			);
		}

		for (setter_name, setter_value) in &bindings {
			if setter_name.trim().is_empty() {
				continue;
			}
			self.registry.record_scalar(setter_name, setter_value);
		}
	}
}
