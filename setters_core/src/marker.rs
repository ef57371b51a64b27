/// Prefix of a line comment that marks a field as controlled by a setter.
pub const SETTER_COMMENT_IDENTIFIER: &str = "# kpt-set: ";

/// Extract the setter pattern from a line comment.
///
/// Returns `None` when the comment doesn't start with
/// [`SETTER_COMMENT_IDENTIFIER`] or when nothing follows it.
///
/// ```
/// use setters_core::extract_setter_pattern;
///
/// assert_eq!(
/// 	extract_setter_pattern("# kpt-set: ${image}:${tag}"),
/// 	Some("${image}:${tag}")
/// );
/// assert_eq!(extract_setter_pattern("# just a comment"), None);
/// ```
pub fn extract_setter_pattern(comment: &str) -> Option<&str> {
	let pattern = comment.strip_prefix(SETTER_COMMENT_IDENTIFIER)?.trim();
	(!pattern.is_empty()).then_some(pattern)
}

/// Strip surrounding whitespace and one `${` ... `}` wrapper, turning
/// `${replicas}` into `replicas`.
pub fn clean(input: &str) -> &str {
	let input = input.trim();
	let input = input.strip_prefix("${").unwrap_or(input);
	input.strip_suffix('}').unwrap_or(input)
}
