use std::collections::HashMap;
use std::iter::Peekable;
use std::ops::Range;
use std::str::CharIndices;

use logos::Logos;

use crate::document::CollectionStyle;
use crate::document::Field;
use crate::document::Mapping;
use crate::document::Node;
use crate::document::Scalar;
use crate::document::ScalarStyle;
use crate::document::Sequence;

/// Nodes registered under `&anchor` names, looked up again by `*alias`.
pub(crate) type Anchors = HashMap<String, Node>;

/// Raw tokens produced by logos for a flow collection such as
/// `[dev, "prod"]` or `{name: app, tier: web}`. Line breaks are whitespace.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum FlowToken {
	#[token("[")]
	SequenceStart,
	#[token("]")]
	SequenceEnd,
	#[token("{")]
	MappingStart,
	#[token("}")]
	MappingEnd,
	#[token(",")]
	Separator,
	#[token(":")]
	Colon,
	#[token("#")]
	Hash,
	#[regex(r"[ \t\n]+")]
	Whitespace,
	#[regex(r"&[^ \t\n\[\]{},]+")]
	Anchor,
	#[regex(r"\*[^ \t\n\[\]{},]+")]
	Alias,
	#[regex(r"![^ \t\n\[\]{},]*")]
	Tag,
	#[regex(r#""([^"\\]|\\(.|\n))*""#)]
	DoubleQuoted,
	#[regex(r"'([^']|'')*'")]
	SingleQuoted,
	#[regex(r#"[^ \t\n\[\]{},:#"'&*!][^ \t\n\[\]{},:]*"#)]
	Text,
}

/// Parse a flow collection, possibly spread over several lines, together
/// with an optional comment after its last line into a [`Node`].
///
/// Errors are returned as plain messages; the caller knows the file and line
/// and turns them into a [`crate::SettersError::Parse`].
pub(crate) fn parse_flow(source: &str, anchors: &mut Anchors) -> Result<Node, String> {
	let (tokens, comment) = tokenize_flow(source)?;
	let mut parser = FlowParser {
		source,
		tokens,
		cursor: 0,
		anchors,
	};

	let mut node = parser.parse_node()?;
	parser.skip_whitespace();
	if parser.cursor < parser.tokens.len() {
		return Err("unexpected content after flow collection".to_string());
	}

	set_comment(&mut node, comment);
	Ok(node)
}

type Spanned = (FlowToken, Range<usize>);

/// Lex `source`, dropping comments. A `#` only opens a comment at the start
/// of the input or after whitespace. The comment on the final line is
/// returned separately.
fn tokenize_flow(source: &str) -> Result<(Vec<Spanned>, Option<String>), String> {
	let mut tokens: Vec<Spanned> = Vec::new();
	let mut lexer = FlowToken::lexer(source);

	while let Some(token) = lexer.next() {
		let span = lexer.span();
		let Ok(token) = token else {
			let rest = &source[span.start..];
			return Err(if rest.starts_with('"') || rest.starts_with('\'') {
				"unterminated quoted scalar".to_string()
			} else {
				format!("unexpected character `{}`", &source[span])
			});
		};

		let opens_comment = token == FlowToken::Hash
			&& tokens
				.last()
				.is_none_or(|(previous, _)| *previous == FlowToken::Whitespace);
		if opens_comment {
			let rest = &source[span.start..];
			match rest.find('\n') {
				Some(end) => lexer.bump(end - span.len()),
				None => return Ok((tokens, Some(rest.trim_end().to_string()))),
			}
			continue;
		}

		tokens.push((token, span));
	}

	Ok((tokens, None))
}

struct FlowParser<'a, 'b> {
	source: &'a str,
	tokens: Vec<Spanned>,
	cursor: usize,
	anchors: &'b mut Anchors,
}

impl FlowParser<'_, '_> {
	fn peek(&self) -> Option<FlowToken> {
		self.peek_at(0)
	}

	fn peek_at(&self, offset: usize) -> Option<FlowToken> {
		self.tokens.get(self.cursor + offset).map(|(token, _)| *token)
	}

	fn skip_whitespace(&mut self) {
		while self.peek() == Some(FlowToken::Whitespace) {
			self.cursor += 1;
		}
	}

	fn parse_node(&mut self) -> Result<Node, String> {
		self.skip_whitespace();
		let start = self.cursor;
		let anchor = self.parse_properties();

		let node = match self.peek() {
			Some(FlowToken::Separator | FlowToken::SequenceEnd | FlowToken::MappingEnd)
				if self.cursor > start =>
			{
				Node::null()
			}
			Some(FlowToken::SequenceStart) => self.parse_sequence()?,
			Some(FlowToken::MappingStart) => self.parse_mapping()?,
			Some(FlowToken::Alias) => self.parse_alias()?,
			Some(
				FlowToken::DoubleQuoted
				| FlowToken::SingleQuoted
				| FlowToken::Text
				| FlowToken::Hash
				| FlowToken::Colon,
			) => Node::Scalar(self.parse_scalar()?),
			Some(FlowToken::SequenceEnd) => return Err("unexpected `]`".to_string()),
			Some(FlowToken::MappingEnd) => return Err("unexpected `}`".to_string()),
			Some(FlowToken::Separator) => return Err("unexpected `,`".to_string()),
			Some(FlowToken::Anchor | FlowToken::Tag | FlowToken::Whitespace) | None => {
				return Err("unterminated flow collection".to_string());
			}
		};

		if let Some(name) = anchor {
			self.anchors.insert(name, node.clone());
		}

		Ok(node)
	}

	/// Consume `!tag` and `&anchor` properties. Tags are dropped, the anchor
	/// name is returned.
	fn parse_properties(&mut self) -> Option<String> {
		let mut anchor = None;

		while let Some((token, span)) = self.tokens.get(self.cursor).cloned() {
			match token {
				FlowToken::Anchor => anchor = Some(self.source[span.start + 1..span.end].to_string()),
				FlowToken::Tag => {}
				_ => break,
			}
			self.cursor += 1;
			self.skip_whitespace();
		}

		anchor
	}

	fn parse_alias(&mut self) -> Result<Node, String> {
		let Some((_, span)) = self.tokens.get(self.cursor).cloned() else {
			return Err("expected an alias".to_string());
		};
		self.cursor += 1;

		let name = &self.source[span.start + 1..span.end];
		let mut node = self
			.anchors
			.get(name)
			.cloned()
			.ok_or_else(|| format!("unknown alias `*{name}`"))?;
		set_comment(&mut node, None);

		Ok(node)
	}

	fn parse_sequence(&mut self) -> Result<Node, String> {
		self.cursor += 1;
		let mut items = Vec::new();

		loop {
			self.skip_whitespace();
			if self.peek() == Some(FlowToken::SequenceEnd) {
				self.cursor += 1;
				break;
			}

			let mut item = self.parse_node()?;
			self.skip_whitespace();
			if self.peek() == Some(FlowToken::Colon) {
				item = self.parse_single_pair(item)?;
				self.skip_whitespace();
			}
			items.push(item);

			match self.peek() {
				Some(FlowToken::Separator) => self.cursor += 1,
				Some(FlowToken::SequenceEnd) => {
					self.cursor += 1;
					break;
				}
				Some(_) => return Err("expected `,` or `]`".to_string()),
				None => return Err("unterminated flow sequence".to_string()),
			}
		}

		Ok(Node::Sequence(Sequence {
			items,
			style: CollectionStyle::Flow,
			comment: None,
		}))
	}

	/// `[a: b]` is a sequence holding the one-entry mapping `{a: b}`.
	fn parse_single_pair(&mut self, key: Node) -> Result<Node, String> {
		let Node::Scalar(key) = key else {
			return Err("only scalar keys are supported inside flow sequences".to_string());
		};
		self.cursor += 1;
		let value = self.parse_value()?;

		Ok(Node::Mapping(Mapping {
			fields: vec![Field {
				key: key.value,
				key_comment: None,
				value,
			}],
			style: CollectionStyle::Flow,
			comment: None,
		}))
	}

	fn parse_mapping(&mut self) -> Result<Node, String> {
		self.cursor += 1;
		let mut fields: Vec<Field> = Vec::new();

		loop {
			self.skip_whitespace();
			match self.peek() {
				Some(FlowToken::MappingEnd) => {
					self.cursor += 1;
					break;
				}
				None => return Err("unterminated flow mapping".to_string()),
				Some(_) => {}
			}

			self.parse_properties();
			let key = self.parse_scalar()?.value;
			if fields.iter().any(|field| field.key == key) {
				return Err(format!("duplicate key `{key}`"));
			}

			self.skip_whitespace();
			let value = if self.peek() == Some(FlowToken::Colon) {
				self.cursor += 1;
				self.parse_value()?
			} else {
				Node::null()
			};

			fields.push(Field {
				key,
				key_comment: None,
				value,
			});

			self.skip_whitespace();
			match self.peek() {
				Some(FlowToken::Separator) => self.cursor += 1,
				Some(FlowToken::MappingEnd) => {}
				Some(_) => return Err("expected `,` or `}`".to_string()),
				None => return Err("unterminated flow mapping".to_string()),
			}
		}

		Ok(Node::Mapping(Mapping {
			fields,
			style: CollectionStyle::Flow,
			comment: None,
		}))
	}

	/// The value after a `:`. A missing value is null.
	fn parse_value(&mut self) -> Result<Node, String> {
		self.skip_whitespace();
		match self.peek() {
			Some(FlowToken::Separator | FlowToken::MappingEnd | FlowToken::SequenceEnd) => {
				Ok(Node::null())
			}
			_ => self.parse_node(),
		}
	}

	/// A quoted scalar, or a plain scalar assembled from adjacent text tokens.
	/// Colons and inner whitespace stay part of a plain scalar as long as more
	/// text follows them, so `nginx:1.14` and `hello world` are single values.
	fn parse_scalar(&mut self) -> Result<Scalar, String> {
		self.skip_whitespace();
		let Some((token, span)) = self.tokens.get(self.cursor).cloned() else {
			return Err("expected a scalar".to_string());
		};

		match token {
			FlowToken::DoubleQuoted | FlowToken::SingleQuoted => {
				self.cursor += 1;
				let (value, _) = scan_quoted(&self.source[span])?;
				let style = if token == FlowToken::DoubleQuoted {
					ScalarStyle::DoubleQuoted
				} else {
					ScalarStyle::SingleQuoted
				};
				Ok(Scalar {
					value,
					style,
					comment: None,
				})
			}
			FlowToken::Text | FlowToken::Hash | FlowToken::Colon => {
				if token == FlowToken::Colon && !self.continues_plain(1) {
					return Err("unexpected `:`".to_string());
				}

				let start = span.start;
				let mut end = span.end;
				self.cursor += 1;

				loop {
					match self.peek() {
						Some(
							FlowToken::Text
							| FlowToken::Hash
							| FlowToken::Anchor
							| FlowToken::Alias
							| FlowToken::Tag,
						) => {}
						Some(FlowToken::Colon | FlowToken::Whitespace) if self.continues_plain(1) => {}
						_ => break,
					}
					end = self.tokens[self.cursor].1.end;
					self.cursor += 1;
				}

				Ok(Scalar::plain(fold_plain(&self.source[start..end])))
			}
			_ => Err("expected a scalar".to_string()),
		}
	}

	fn continues_plain(&self, offset: usize) -> bool {
		matches!(
			self.peek_at(offset),
			Some(
				FlowToken::Text
					| FlowToken::Hash
					| FlowToken::Anchor
					| FlowToken::Alias
					| FlowToken::Tag
			)
		)
	}
}

/// Replace the trailing line comment of `node`.
pub(crate) fn set_comment(node: &mut Node, comment: Option<String>) {
	match node {
		Node::Sequence(Sequence { comment: slot, .. })
		| Node::Mapping(Mapping { comment: slot, .. })
		| Node::Scalar(Scalar { comment: slot, .. }) => *slot = comment,
	}
}

/// Fold a plain scalar that spans lines: each line break becomes a space,
/// and each blank line a newline.
fn fold_plain(text: &str) -> String {
	if !text.contains('\n') {
		return text.to_string();
	}

	let mut folded = String::new();
	let mut blank_lines = 0;
	for line in text.split('\n').map(str::trim) {
		if line.is_empty() {
			blank_lines += 1;
			continue;
		}
		if !folded.is_empty() {
			if blank_lines == 0 {
				folded.push(' ');
			} else {
				folded.push_str(&"\n".repeat(blank_lines));
			}
		}
		blank_lines = 0;
		folded.push_str(line);
	}
	folded
}

/// Strip leading `!tag` and `&anchor` properties from `text`. Returns the
/// anchor name, if any, and the text that follows the properties.
pub(crate) fn split_properties(text: &str) -> Result<(Option<&str>, &str), String> {
	let mut anchor = None;
	let mut tagged = false;
	let mut rest = text;

	loop {
		let end = rest.find([' ', '\t']).unwrap_or(rest.len());
		if let Some(name) = rest[..end].strip_prefix('&') {
			if name.is_empty() {
				return Err("expected an anchor name after `&`".to_string());
			}
			if anchor.replace(name).is_some() {
				return Err("a node can only have one anchor".to_string());
			}
		} else if rest.starts_with('!') {
			if tagged {
				return Err("a node can only have one tag".to_string());
			}
			tagged = true;
		} else {
			break;
		}
		rest = rest[end..].trim_start_matches([' ', '\t']);
	}

	Ok((anchor, rest))
}

/// Whether `source` opens a flow collection or quoted scalar that it never
/// closes, meaning the node continues on the next line.
pub(crate) fn is_unclosed(source: &str) -> bool {
	let mut depth = 0usize;
	let mut quote: Option<char> = None;
	let mut previous: Option<char> = None;
	let mut chars = source.chars().peekable();

	while let Some(ch) = chars.next() {
		match quote {
			Some('"') => match ch {
				'\\' => {
					chars.next();
				}
				'"' => quote = None,
				_ => {}
			},
			Some(_) => {
				if ch == '\'' {
					if chars.peek() == Some(&'\'') {
						chars.next();
					} else {
						quote = None;
					}
				}
			}
			None => {
				match ch {
					'"' | '\''
						if previous.is_none_or(|p| p.is_whitespace() || "[{,:".contains(p)) =>
					{
						quote = Some(ch);
					}
					'[' | '{' => depth += 1,
					']' | '}' => depth = depth.saturating_sub(1),
					'#' if previous.is_none_or(char::is_whitespace) => {
						while chars.next_if(|next| *next != '\n').is_some() {}
					}
					_ => {}
				}
			}
		}
		previous = Some(ch);
	}

	depth > 0 || quote.is_some()
}

/// Scan a quoted scalar at the start of `text`, which may span lines.
/// Returns the unescaped, line-folded value and the number of bytes
/// consumed.
pub(crate) fn scan_quoted(text: &str) -> Result<(String, usize), String> {
	let mut chars = text.char_indices().peekable();
	let Some((_, quote)) = chars.next() else {
		return Err("expected a quoted scalar".to_string());
	};
	let mut value = String::new();
	// Escaped characters are never trimmed by line folding.
	let mut escaped_end = 0;

	while let Some((index, ch)) = chars.next() {
		match ch {
			'\'' if quote == '\'' => {
				// `''` is an escaped single quote.
				if chars.next_if(|(_, next)| *next == '\'').is_some() {
					value.push('\'');
				} else {
					return Ok((value, index + 1));
				}
			}
			'"' if quote == '"' => return Ok((value, index + 1)),
			'\\' if quote == '"' => {
				let Some((_, escaped)) = chars.next() else {
					break;
				};
				if escaped == '\n' {
					skip_blanks(&mut chars);
				} else {
					value.push(unescape(escaped, &mut chars)?);
				}
				escaped_end = value.len();
			}
			'\n' => fold_line_break(&mut value, escaped_end, &mut chars),
			other => value.push(other),
		}
	}

	Err("unterminated quoted scalar".to_string())
}

fn skip_blanks(chars: &mut Peekable<CharIndices<'_>>) {
	while chars.next_if(|(_, ch)| *ch == ' ' || *ch == '\t').is_some() {}
}

/// A line break inside a quoted scalar folds to a space, or to one newline
/// per blank line that follows it.
fn fold_line_break(value: &mut String, keep: usize, chars: &mut Peekable<CharIndices<'_>>) {
	let keep = keep.min(value.len());
	let trimmed = keep + value[keep..].trim_end_matches([' ', '\t']).len();
	value.truncate(trimmed);

	let mut blank_lines = 0;
	loop {
		skip_blanks(chars);
		if chars.next_if(|(_, ch)| *ch == '\n').is_none() {
			break;
		}
		blank_lines += 1;
	}

	if blank_lines == 0 {
		value.push(' ');
	} else {
		value.push_str(&"\n".repeat(blank_lines));
	}
}

fn unescape(escaped: char, chars: &mut Peekable<CharIndices<'_>>) -> Result<char, String> {
	let ch = match escaped {
		'0' => '\0',
		'a' => '\u{07}',
		'b' => '\u{08}',
		't' | '\t' => '\t',
		'n' => '\n',
		'v' => '\u{0B}',
		'f' => '\u{0C}',
		'r' => '\r',
		'e' => '\u{1B}',
		' ' => ' ',
		'"' => '"',
		'/' => '/',
		'\\' => '\\',
		'N' => '\u{85}',
		'_' => '\u{A0}',
		'L' => '\u{2028}',
		'P' => '\u{2029}',
		'x' => return unescape_hex(chars, 2),
		'u' => return unescape_hex(chars, 4),
		'U' => return unescape_hex(chars, 8),
		other => return Err(format!("invalid escape `\\{other}`")),
	};
	Ok(ch)
}

fn unescape_hex(chars: &mut Peekable<CharIndices<'_>>, digits: usize) -> Result<char, String> {
	let mut code = 0u32;
	for _ in 0..digits {
		let digit = chars
			.next()
			.and_then(|(_, ch)| ch.to_digit(16))
			.ok_or_else(|| format!("expected {digits} hex digits in escape"))?;
		code = code * 16 + digit;
	}
	char::from_u32(code).ok_or_else(|| format!("invalid unicode escape `{code:X}`"))
}
