//! Requirement manifests, `requirements.txt` style files.
//!
//! One specifier per logical line. Blank lines and lines starting with `#` are ignored
//! and a trailing `\` joins a line with the next one.

use std::path::Path;

/// Turns raw manifest lines into trimmed specifier lines.
///
/// Comments and blank lines are dropped before continuations are joined, so a comment
/// in the middle of a continued line is skipped over. Never fails, a dangling `\`
/// on the last line simply ends the logical line.
pub fn logical_lines<I, S>(lines: I) -> Vec<String>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut result = Vec::<String>::new();
	let mut pending: Option<String> = None;

	for line in lines {
		let line = line.as_ref().trim_end_matches(['\r', '\n']);
		let stripped = line.trim_start();
		if stripped.is_empty() || stripped.starts_with('#') {
			continue;
		}

		let (content, continues) = match line.trim_end().strip_suffix('\\') {
			Some(content) => (content, true),
			None => (line, false),
		};

		let mut logical = pending.take().unwrap_or_default();
		logical.push_str(content);

		if continues {
			pending = Some(logical);
		} else {
			push_logical(&mut result, logical);
		}
	}

	if let Some(logical) = pending {
		push_logical(&mut result, logical);
	}

	result
}

fn push_logical(result: &mut Vec<String>, logical: String) {
	let trimmed = logical.trim();
	if !trimmed.is_empty() {
		result.push(trimmed.to_owned());
	}
}

/// Reads a manifest file into raw lines.
pub fn read_lines(path: impl AsRef<Path>) -> std::io::Result<Vec<String>> {
	let content = std::fs::read_to_string(path)?;
	Ok(content.lines().map(str::to_owned).collect())
}

#[cfg(test)]
mod test {
	use super::*;

	#[test] fn drops_comments_and_blanks() { assert_eq!(logical_lines(["# header", "", "   ", "numpy==1.7.2", "  # indented"]), vec!["numpy==1.7.2"]) }
	#[test] fn trims_lines() { assert_eq!(logical_lines(["  scipy  \n"]), vec!["scipy"]) }
	#[test] fn crlf_endings() { assert_eq!(logical_lines(["numpy\r\n", "scipy\r\n"]), vec!["numpy", "scipy"]) }
	#[test] fn joins_continuations() { assert_eq!(logical_lines(["numpy==\\", "1.7.2", "scipy"]), vec!["numpy==1.7.2", "scipy"]) }
	#[test] fn joins_many_continuations() { assert_eq!(logical_lines(["-e \\", "git+https://host/pkg\\", "@dev#egg=pkg"]), vec!["-e git+https://host/pkg@dev#egg=pkg"]) }
	#[test] fn continued_line_starting_with_hash_is_a_comment() { assert_eq!(logical_lines(["-e \\", "git+https://host/pkg\\", "#egg=pkg"]), vec!["-e git+https://host/pkg"]) }
	#[test] fn comment_inside_continuation_is_skipped() { assert_eq!(logical_lines(["numpy==\\", "# note", "1.7.2"]), vec!["numpy==1.7.2"]) }
	#[test] fn dangling_continuation() { assert_eq!(logical_lines(["numpy \\"]), vec!["numpy"]) }
	#[test] fn lone_backslash() { assert!(logical_lines(["\\"]).is_empty()) }
}
