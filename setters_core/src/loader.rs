use crate::SettersError;
use crate::SettersResult;
use crate::document::CollectionStyle;
use crate::document::Document;
use crate::document::Field;
use crate::document::Mapping;
use crate::document::Node;
use crate::document::Scalar;
use crate::document::ScalarStyle;
use crate::document::Sequence;
use crate::lexer::Anchors;
use crate::lexer::is_unclosed;
use crate::lexer::parse_flow;
use crate::lexer::scan_quoted;
use crate::lexer::set_comment;
use crate::lexer::split_properties;

/// Parse a YAML stream into its documents, keeping trailing line comments
/// attached to the nodes they follow.
///
/// `path` becomes the path tag of every document in the stream and is used
/// in error messages.
pub fn parse_documents(content: &str, path: Option<&str>) -> SettersResult<Vec<Document>> {
	let content = normalize_line_endings(content);
	let mut documents = Vec::new();

	for lines in split_documents(&content) {
		let mut parser = BlockParser {
			lines,
			cursor: 0,
			path,
			anchors: Anchors::new(),
		};

		if let Some(root) = parser.parse_document()? {
			documents.push(Document::new(root, path.map(ToString::to_string)));
		}
	}

	Ok(documents)
}

/// Parse a stream that is expected to contain exactly one document. An empty
/// stream yields a null root.
pub fn parse_document(content: &str, path: Option<&str>) -> SettersResult<Document> {
	let mut documents = parse_documents(content, path)?;
	if documents.len() > 1 {
		return Err(SettersError::Parse {
			path: path.unwrap_or("<input>").to_string(),
			line: 1,
			reason: format!("expected a single document, found {}", documents.len()),
		});
	}

	Ok(documents
		.pop()
		.unwrap_or_else(|| Document::new(Node::null(), path.map(ToString::to_string))))
}

/// Normalize CRLF line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}

#[derive(Debug, Clone, Copy)]
struct RawLine<'a> {
	/// 1-indexed line number in the source.
	number: usize,
	/// Count of leading spaces.
	indent: usize,
	/// The line after its indentation, trailing whitespace removed.
	text: &'a str,
}

impl RawLine<'_> {
	fn is_significant(&self) -> bool {
		!self.text.is_empty() && !self.text.starts_with('#')
	}
}

fn split_documents(content: &str) -> Vec<Vec<RawLine<'_>>> {
	let mut documents = vec![Vec::new()];

	for (index, line) in content.lines().enumerate() {
		if is_marker(line, "---") {
			documents.push(Vec::new());
			continue;
		}
		if is_marker(line, "...") {
			continue;
		}

		let text = line.trim_start_matches(' ');
		let raw = RawLine {
			number: index + 1,
			indent: line.len() - text.len(),
			text: text.trim_end(),
		};

		if let Some(current) = documents.last_mut() {
			current.push(raw);
		}
	}

	documents
}

fn is_marker(line: &str, marker: &str) -> bool {
	line.strip_prefix(marker)
		.is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
}

struct BlockParser<'a> {
	lines: Vec<RawLine<'a>>,
	cursor: usize,
	path: Option<&'a str>,
	anchors: Anchors,
}

impl<'a> BlockParser<'a> {
	fn error(&self, line: usize, reason: impl Into<String>) -> SettersError {
		SettersError::Parse {
			path: self.path.unwrap_or("<input>").to_string(),
			line,
			reason: reason.into(),
		}
	}

	/// The next significant line, skipping blank and comment-only lines.
	fn peek(&mut self) -> Option<RawLine<'a>> {
		while let Some(line) = self.lines.get(self.cursor) {
			if line.is_significant() {
				return Some(*line);
			}
			self.cursor += 1;
		}
		None
	}

	fn parse_document(&mut self) -> SettersResult<Option<Node>> {
		let Some(first) = self.peek() else {
			return Ok(None);
		};

		let root = self.parse_block(first.indent)?;
		if let Some(extra) = self.peek() {
			return Err(self.error(extra.number, "unexpected content after the document root"));
		}

		Ok(Some(root))
	}

	/// Parse the node whose first line is the next significant line.
	fn parse_block(&mut self, indent: usize) -> SettersResult<Node> {
		let Some(line) = self.peek() else {
			return Ok(Node::null());
		};
		self.check_tabs(line)?;

		if is_sequence_entry(line.text) {
			return self.parse_sequence(indent);
		}
		if split_key(line.text).is_some() {
			return self.parse_mapping(indent);
		}

		self.cursor += 1;
		let (anchor, rest) = self.split_node_properties(line.text, line.number)?;
		if rest.starts_with('*') {
			return Ok(self.parse_alias(rest, line.number)?.1);
		}

		let value = if rest.is_empty() || rest.starts_with('#') {
			// Properties on a line of their own apply to the node below.
			match self.peek() {
				Some(next) if next.indent >= indent => self.parse_block(next.indent)?,
				_ => Node::null(),
			}
		} else if is_block_scalar_header(rest) {
			self.parse_block_scalar(indent.saturating_sub(1), rest)?
		} else {
			self.parse_inline(rest, line.number)?
		};

		Ok(self.anchor(anchor, value))
	}

	fn parse_mapping(&mut self, indent: usize) -> SettersResult<Node> {
		let mut fields: Vec<Field> = Vec::new();

		while let Some(line) = self.peek() {
			if line.indent < indent {
				break;
			}
			if line.indent > indent {
				return Err(self.error(line.number, "unexpected indentation"));
			}
			self.check_tabs(line)?;

			let Some((key, rest)) = split_key(line.text) else {
				return Err(self.error(line.number, "expected a `key: value` mapping entry"));
			};
			if fields.iter().any(|field| field.key == key) {
				return Err(self.error(line.number, format!("duplicate key `{key}`")));
			}

			self.cursor += 1;
			let (key_comment, value) = self.parse_field_value(indent, rest, line.number)?;
			fields.push(Field {
				key,
				key_comment,
				value,
			});
		}

		Ok(Node::Mapping(Mapping {
			fields,
			style: CollectionStyle::Block,
			comment: None,
		}))
	}

	/// Parse whatever follows `key:`. When the value starts on a later line,
	/// a comment written after the colon belongs to the key.
	fn parse_field_value(
		&mut self,
		indent: usize,
		rest: &'a str,
		number: usize,
	) -> SettersResult<(Option<String>, Node)> {
		let (anchor, rest) = self.split_node_properties(rest.trim_start(), number)?;
		if rest.starts_with('*') {
			return self.parse_alias(rest, number);
		}

		if rest.is_empty() || rest.starts_with('#') {
			let key_comment = (!rest.is_empty()).then(|| rest.to_string());
			let value = match self.peek() {
				Some(next) if next.indent > indent => self.parse_block(next.indent)?,
				// A block sequence may sit at the same indentation as its key.
				Some(next) if next.indent == indent && is_sequence_entry(next.text) => {
					self.parse_sequence(indent)?
				}
				_ => Node::null(),
			};
			return Ok((key_comment, self.anchor(anchor, value)));
		}

		if is_block_scalar_header(rest) {
			let value = self.parse_block_scalar(indent, rest)?;
			return Ok((None, self.anchor(anchor, value)));
		}

		let mut value = self.parse_inline(rest, number)?;
		self.fold_plain_continuation(indent, &mut value);
		Ok((None, self.anchor(anchor, value)))
	}

	fn parse_sequence(&mut self, indent: usize) -> SettersResult<Node> {
		let mut items = Vec::new();

		while let Some(line) = self.peek() {
			if line.indent < indent || !is_sequence_entry(line.text) {
				break;
			}
			if line.indent > indent {
				return Err(self.error(line.number, "unexpected indentation"));
			}

			let after_dash = line.text[1..].trim_start_matches([' ', '\t']);
			let (anchor, rest) = self.split_node_properties(after_dash, line.number)?;
			let column = line.indent + (line.text.len() - rest.len());

			let item = if rest.starts_with('*') {
				self.cursor += 1;
				self.parse_alias(rest, line.number)?.1
			} else if rest.is_empty() || rest.starts_with('#') {
				self.cursor += 1;
				match self.peek() {
					Some(next) if next.indent > indent => self.parse_block(next.indent)?,
					_ => Node::null(),
				}
			} else if is_sequence_entry(rest) || split_key(rest).is_some() {
				// `- name: app` starts a compact mapping (or nested sequence) whose
				// first line is the remainder of this one.
				self.lines[self.cursor] = RawLine {
					number: line.number,
					indent: column,
					text: rest,
				};
				self.parse_block(column)?
			} else if is_block_scalar_header(rest) {
				self.cursor += 1;
				self.parse_block_scalar(indent, rest)?
			} else {
				self.cursor += 1;
				self.parse_inline(rest, line.number)?
			};
			items.push(self.anchor(anchor, item));
		}

		Ok(Node::Sequence(Sequence {
			items,
			style: CollectionStyle::Block,
			comment: None,
		}))
	}

	/// A scalar or flow collection starting on line `number`. The cursor sits
	/// on the following line. Flow collections and quoted scalars take as
	/// many further lines as they need to close.
	fn parse_inline(&mut self, text: &str, number: usize) -> SettersResult<Node> {
		if text.starts_with('[') || text.starts_with('{') {
			let source = self.take_continuation(text);
			return parse_flow(&source, &mut self.anchors)
				.map_err(|reason| self.error(number, reason));
		}

		if text.starts_with('"') || text.starts_with('\'') {
			let source = self.take_continuation(text);
			let (value, consumed) =
				scan_quoted(&source).map_err(|reason| self.error(number, reason))?;
			let remainder = source[consumed..].trim();
			let comment = if remainder.is_empty() {
				None
			} else if remainder.starts_with('#') {
				Some(remainder.to_string())
			} else {
				return Err(self.error(number, "unexpected text after quoted scalar"));
			};
			let style = if text.starts_with('"') {
				ScalarStyle::DoubleQuoted
			} else {
				ScalarStyle::SingleQuoted
			};

			return Ok(Node::Scalar(Scalar {
				value,
				style,
				comment,
			}));
		}

		let (value, comment) = split_comment(text);
		Ok(Node::Scalar(Scalar {
			value: value.trim_end().to_string(),
			style: ScalarStyle::Plain,
			comment: comment.map(ToString::to_string),
		}))
	}

	fn take_continuation(&mut self, text: &str) -> String {
		let mut source = text.to_string();
		while is_unclosed(&source) {
			let Some(line) = self.lines.get(self.cursor) else {
				break;
			};
			source.push('\n');
			source.push_str(line.text);
			self.cursor += 1;
		}
		source
	}

	fn split_node_properties<'t>(
		&self,
		text: &'t str,
		number: usize,
	) -> SettersResult<(Option<String>, &'t str)> {
		let (anchor, rest) = split_properties(text).map_err(|reason| self.error(number, reason))?;
		Ok((anchor.map(ToString::to_string), rest))
	}

	fn anchor(&mut self, anchor: Option<String>, node: Node) -> Node {
		if let Some(name) = anchor {
			self.anchors.insert(name, node.clone());
		}
		node
	}

	/// Resolve `*name` to a copy of the anchored node. The alias line's
	/// comment replaces the copy's own. For block collections it is returned
	/// as the key comment instead.
	fn parse_alias(&self, text: &str, number: usize) -> SettersResult<(Option<String>, Node)> {
		let (alias, comment) = split_comment(text);
		let name = alias.trim_end().trim_start_matches('*');
		if name.contains([' ', '\t']) {
			return Err(self.error(number, "unexpected text after alias"));
		}
		let Some(node) = self.anchors.get(name) else {
			return Err(self.error(number, format!("unknown alias `*{name}`")));
		};

		let mut node = node.clone();
		let comment = comment.map(ToString::to_string);
		let is_block_collection = matches!(
			&node,
			Node::Sequence(Sequence {
				style: CollectionStyle::Block,
				..
			}) | Node::Mapping(Mapping {
				style: CollectionStyle::Block,
				..
			})
		);
		if is_block_collection {
			return Ok((comment, node));
		}

		set_comment(&mut node, comment);
		Ok((None, node))
	}

	/// Join more-indented lines following an uncommented plain scalar, the
	/// way YAML folds multi-line plain scalars.
	fn fold_plain_continuation(&mut self, indent: usize, value: &mut Node) {
		let Node::Scalar(scalar) = value else {
			return;
		};
		if scalar.style != ScalarStyle::Plain || scalar.comment.is_some() {
			return;
		}

		while let Some(next) = self.peek() {
			if next.indent <= indent {
				break;
			}
			let (text, comment) = split_comment(next.text);
			scalar.value.push(' ');
			scalar.value.push_str(text.trim_end());
			self.cursor += 1;
			if comment.is_some() {
				scalar.comment = comment.map(ToString::to_string);
				break;
			}
		}
	}

	/// Parse a `|` or `>` block scalar. The cursor sits on the first content
	/// line; content must be indented deeper than `parent_indent`.
	fn parse_block_scalar(&mut self, parent_indent: usize, header: &str) -> SettersResult<Node> {
		let (indicators, comment) = split_comment(header);
		let indicators = indicators.trim_end();
		let style = if indicators.starts_with('|') {
			ScalarStyle::Literal
		} else {
			ScalarStyle::Folded
		};
		let chomping = if indicators.contains('-') {
			Chomping::Strip
		} else if indicators.contains('+') {
			Chomping::Keep
		} else {
			Chomping::Clip
		};

		// An explicit indentation indicator fixes the content indentation
		// relative to the parent node.
		let mut content_indent: Option<usize> = indicators
			.chars()
			.find_map(|ch| ch.to_digit(10))
			.filter(|digit| *digit > 0)
			.map(|digit| parent_indent + digit as usize);
		let mut body: Vec<String> = Vec::new();

		while let Some(line) = self.lines.get(self.cursor) {
			if line.text.is_empty() {
				body.push(String::new());
				self.cursor += 1;
				continue;
			}
			if line.indent <= parent_indent {
				break;
			}

			let base = *content_indent.get_or_insert(line.indent);
			if line.indent < base {
				break;
			}

			body.push(format!("{}{}", " ".repeat(line.indent - base), line.text));
			self.cursor += 1;
		}

		let trailing_blank = body.iter().rev().take_while(|line| line.is_empty()).count();
		body.truncate(body.len() - trailing_blank);

		let mut value = match style {
			ScalarStyle::Literal => body.join("\n"),
			_ => fold_lines(&body),
		};

		if !body.is_empty() {
			match chomping {
				Chomping::Strip => {}
				Chomping::Clip => value.push('\n'),
				Chomping::Keep => value.push_str(&"\n".repeat(trailing_blank + 1)),
			}
		}

		Ok(Node::Scalar(Scalar {
			value,
			style,
			comment: comment.map(ToString::to_string),
		}))
	}

	fn check_tabs(&self, line: RawLine<'_>) -> SettersResult<()> {
		if line.text.starts_with('\t') {
			return Err(self.error(line.number, "tabs are not allowed in indentation"));
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Copy)]
enum Chomping {
	Strip,
	Clip,
	Keep,
}

fn fold_lines(lines: &[String]) -> String {
	let mut folded = String::new();
	for line in lines {
		if line.is_empty() {
			folded.push('\n');
		} else {
			if !folded.is_empty() && !folded.ends_with('\n') {
				folded.push(' ');
			}
			folded.push_str(line);
		}
	}
	folded
}

fn is_sequence_entry(text: &str) -> bool {
	text == "-" || text.starts_with("- ") || text.starts_with("-\t")
}

fn is_block_scalar_header(text: &str) -> bool {
	let (indicators, _) = split_comment(text);
	let mut chars = indicators.trim_end().chars();
	matches!(chars.next(), Some('|' | '>'))
		&& chars.all(|ch| ch == '-' || ch == '+' || ch.is_ascii_digit())
}

/// Split `text` at its trailing comment. A `#` only starts a comment at the
/// beginning of the text or after whitespace.
fn split_comment(text: &str) -> (&str, Option<&str>) {
	let mut previous: Option<char> = None;
	for (index, ch) in text.char_indices() {
		if ch == '#' && previous.is_none_or(char::is_whitespace) {
			return (&text[..index], Some(text[index..].trim_end()));
		}
		previous = Some(ch);
	}
	(text, None)
}

/// Split a `key: value` line into the unquoted key and everything after the
/// colon. Returns `None` when the line is not a mapping entry.
fn split_key(text: &str) -> Option<(String, &str)> {
	// Properties written before a key belong to the key scalar.
	let text = match split_properties(text) {
		Ok((_, rest)) if !rest.is_empty() => rest,
		_ => text,
	};
	if text.starts_with('[') || text.starts_with('{') {
		return None;
	}

	if text.starts_with('"') || text.starts_with('\'') {
		let (key, consumed) = scan_quoted(text).ok()?;
		let after = text[consumed..].trim_start();
		let rest = after.strip_prefix(':')?;
		return (rest.is_empty() || rest.starts_with([' ', '\t'])).then_some((key, rest));
	}

	let mut previous: Option<char> = None;
	let mut chars = text.char_indices().peekable();
	while let Some((index, ch)) = chars.next() {
		if ch == '#' && previous.is_some_and(char::is_whitespace) {
			return None;
		}

		let at_separator = ch == ':'
			&& chars
				.peek()
				.is_none_or(|(_, next)| next.is_whitespace());
		if at_separator {
			let key = text[..index].trim_end();
			return (!key.is_empty()).then(|| (key.to_string(), &text[index + 1..]));
		}

		previous = Some(ch);
	}

	None
}
