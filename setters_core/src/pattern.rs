use std::collections::BTreeMap;

use logos::Logos;
use regex::Regex;

/// Raw tokens of a setter pattern. Placeholder names are read by
/// [`Pattern::parse`] from the text that follows an opening `${`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum PatternToken {
	#[token("${")]
	PlaceholderOpen,
	#[token("$")]
	Dollar,
	#[regex(r"[^$]+")]
	Text,
}

/// One piece of a tokenized setter pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
	/// Text that must appear verbatim in the field value.
	Literal(String),
	/// A `${name}` placeholder, holding the name between the braces.
	Placeholder(String),
}

/// A setter pattern such as `my-app-layer.${stage}.${domain}.${tld}`, split
/// into literal and placeholder segments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pattern {
	segments: Vec<Segment>,
}

impl Pattern {
	/// Tokenize `pattern`. A `${` without a closing brace, or a lone `$`, is
	/// literal text.
	pub fn parse(pattern: &str) -> Self {
		let mut segments: Vec<Segment> = Vec::new();
		let mut lexer = PatternToken::lexer(pattern).spanned().peekable();

		while let Some((token, span)) = lexer.next() {
			let text = &pattern[span];
			match token {
				Ok(PatternToken::PlaceholderOpen) => {
					let closed = lexer.next_if(|(next, next_span)| {
						*next == Ok(PatternToken::Text) && pattern[next_span.clone()].contains('}')
					});

					let Some((_, body_span)) = closed else {
						push_literal(&mut segments, text);
						continue;
					};

					let body = &pattern[body_span];
					let (name, remainder) = body.split_once('}').unwrap_or((body, ""));
					segments.push(Segment::Placeholder(name.to_string()));
					push_literal(&mut segments, remainder);
				}
				Ok(PatternToken::Dollar | PatternToken::Text) | Err(()) => {
					push_literal(&mut segments, text);
				}
			}
		}

		Self { segments }
	}

	pub fn segments(&self) -> &[Segment] {
		&self.segments
	}

	/// Placeholder names in order of appearance, repeats included.
	pub fn placeholders(&self) -> impl Iterator<Item = &str> {
		self.segments.iter().filter_map(|segment| {
			match segment {
				Segment::Placeholder(name) => Some(name.as_str()),
				Segment::Literal(_) => None,
			}
		})
	}

	/// Whether the pattern contains at least one placeholder.
	pub fn is_parameterized(&self) -> bool {
		self.placeholders().next().is_some()
	}

	/// Whether the pattern is a single placeholder with no literal text,
	/// e.g. `${replicas}`.
	pub fn is_single_placeholder(&self) -> bool {
		matches!(self.segments.as_slice(), [Segment::Placeholder(_)])
	}

	/// Build the matcher for this pattern: literal segments are escaped,
	/// each placeholder becomes a greedy capture group and the whole
	/// expression is anchored to both ends of the value.
	pub fn to_regex(&self) -> Result<Regex, regex::Error> {
		let mut expression = String::from(r"(?s)\A");
		for segment in &self.segments {
			match segment {
				Segment::Literal(text) => expression.push_str(&regex::escape(text)),
				Segment::Placeholder(_) => expression.push_str("(.*)"),
			}
		}
		expression.push_str(r"\z");
		Regex::new(&expression)
	}

	/// Recover the placeholder bindings that produced `value`.
	///
	/// Returns an empty map when the pattern has no placeholders, when the
	/// value doesn't match, or when any placeholder would bind to an empty
	/// string. A placeholder that appears twice keeps its last capture.
	pub fn resolve(&self, value: &str) -> BTreeMap<String, String> {
		let mut bindings = BTreeMap::new();
		let names: Vec<&str> = self.placeholders().collect();
		if names.is_empty() {
			return bindings;
		}

		let matcher = match self.to_regex() {
			Ok(matcher) => matcher,
			Err(error) => {
				tracing::debug!(%error, "setter pattern can't be compiled");
				return bindings;
			}
		};

		let Some(captures) = matcher.captures(value) else {
			return bindings;
		};

		let captured: Vec<&str> = captures
			.iter()
			.skip(1)
			.map(|group| group.map_or("", |group| group.as_str()))
			.collect();
		if captured.len() != names.len() || captured.iter().any(|text| text.is_empty()) {
			return bindings;
		}

		for (name, text) in names.into_iter().zip(captured) {
			bindings.insert(name.to_string(), text.to_string());
		}
		bindings
	}

	/// Substitute `bindings` into the pattern. Placeholders without a binding
	/// are written back as `${name}`.
	pub fn substitute(&self, bindings: &BTreeMap<String, String>) -> String {
		let mut output = String::new();
		for segment in &self.segments {
			match segment {
				Segment::Literal(text) => output.push_str(text),
				Segment::Placeholder(name) => {
					match bindings.get(name) {
						Some(value) => output.push_str(value),
						None => {
							output.push_str("${");
							output.push_str(name);
							output.push('}');
						}
					}
				}
			}
		}
		output
	}
}

fn push_literal(segments: &mut Vec<Segment>, text: &str) {
	if text.is_empty() {
		return;
	}

	if let Some(Segment::Literal(previous)) = segments.last_mut() {
		previous.push_str(text);
	} else {
		segments.push(Segment::Literal(text.to_string()));
	}
}

/// Take a setter pattern and the current field value and return the setter
/// names mapped to the values they were substituted with.
///
/// ```
/// use setters_core::current_setter_values;
///
/// let values = current_setter_values(
/// 	"my-app-layer.${stage}.${domain}.${tld}",
/// 	"my-app-layer.dev.example.com",
/// );
/// assert_eq!(values["stage"], "dev");
/// assert_eq!(values["domain"], "example");
/// assert_eq!(values["tld"], "com");
/// ```
pub fn current_setter_values(pattern: &str, value: &str) -> BTreeMap<String, String> {
	Pattern::parse(pattern).resolve(value)
}
