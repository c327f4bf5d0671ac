//! Docstring and doc-comment cleaning.

use std::iter::Peekable;
use std::str::Chars;

/// Value of a Python string literal used as a docstring, with its
/// indentation normalised.
///
/// Returns `None` for f-strings and byte strings, which are never docstrings.
pub fn clean_docstring(literal: &str) -> Option<String> {
    string_value(literal).map(|value| dedent(&value))
}

/// Join implicitly concatenated literals (`"a" "b"`) and clean the result.
///
/// Any f-string or byte-string part makes the whole expression a
/// non-docstring.
pub fn clean_concatenated_docstring<'a>(parts: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut value = String::new();
    for part in parts {
        value.push_str(&string_value(part)?);
    }
    Some(dedent(&value))
}

/// Strip prefix and quotes, evaluating escapes unless the literal is raw.
fn string_value(literal: &str) -> Option<String> {
    let body_start = literal.find(|c: char| c == '"' || c == '\'')?;
    let prefix = &literal[..body_start];
    if prefix.chars().any(|c| matches!(c, 'f' | 'F' | 'b' | 'B')) {
        return None;
    }
    let raw = prefix.chars().any(|c| matches!(c, 'r' | 'R'));

    let quoted = &literal[body_start..];
    let quote = ["\"\"\"", "'''", "\"", "'"]
        .into_iter()
        .find(|q| quoted.starts_with(q) && quoted.len() >= 2 * q.len() && quoted.ends_with(q))?;
    let inner = &quoted[quote.len()..quoted.len() - quote.len()];

    Some(if raw { inner.to_string() } else { unescape(inner) })
}

/// Evaluate backslash escapes. Unrecognised escapes and `\N{...}` are kept
/// verbatim.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escape) = chars.next() else {
            out.push('\\');
            break;
        };
        match escape {
            // line continuation
            '\n' => {}
            '\r' => {
                chars.next_if_eq(&'\n');
            }
            '\\' | '\'' | '"' => out.push(escape),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut digits = String::from(escape);
                digits.push_str(&take_digits(&mut chars, 2, 8));
                match u32::from_str_radix(&digits, 8).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push_str(&digits);
                    }
                }
            }
            'x' | 'u' | 'U' => {
                let width = match escape {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits = take_digits(&mut chars, width, 16);
                let decoded = if digits.len() == width {
                    u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32)
                } else {
                    None
                };
                match decoded {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push(escape);
                        out.push_str(&digits);
                    }
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

fn take_digits(chars: &mut Peekable<Chars<'_>>, max: usize, radix: u32) -> String {
    let mut digits = String::new();
    while digits.len() < max {
        match chars.next_if(|c| c.is_digit(radix)) {
            Some(digit) => digits.push(digit),
            None => break,
        }
    }
    digits
}

/// Left-trim the first line, remove the common indentation of the rest, and
/// drop leading and trailing blank lines.
///
/// Indentation is measured in characters after expanding leading tabs to
/// eight-column stops. Tabs inside the text are kept.
fn dedent(text: &str) -> String {
    let lines: Vec<String> = text.split('\n').map(expand_indent).collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| indent_width(line))
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.trim_start()
            } else {
                skip_chars(line, margin)
            }
        })
        .collect();

    while cleaned.first().is_some_and(|l| l.trim().is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.trim().is_empty()) {
        cleaned.pop();
    }

    cleaned.join("\n")
}

fn expand_indent(line: &str) -> String {
    let body = line.trim_start();
    let lead = &line[..line.len() - body.len()];

    let mut expanded = String::with_capacity(line.len());
    let mut column = 0;
    for c in lead.chars() {
        if c == '\t' {
            let stop = 8 - column % 8;
            expanded.extend(std::iter::repeat(' ').take(stop));
            column += stop;
        } else {
            expanded.push(c);
            column += 1;
        }
    }
    expanded.push_str(body);
    expanded
}

fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// `line` without its first `count` characters.
fn skip_chars(line: &str, count: usize) -> &str {
    match line.char_indices().nth(count) {
        Some((offset, _)) => &line[offset..],
        None => "",
    }
}

/// Clean a `/** ... */` doc comment: drop the delimiters and any leading
/// `"* "` or bare `"*"` on each line. Internal blank lines are kept.
pub fn clean_doc_comment(raw: &str) -> String {
    let mut text = raw.trim();
    text = text.strip_prefix("/**").unwrap_or(text);
    text = text.strip_suffix("*/").unwrap_or(text);

    let cleaned: Vec<&str> = text
        .split('\n')
        .map(|line| {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("* ") {
                rest
            } else if line == "*" {
                ""
            } else {
                line
            }
        })
        .collect();

    cleaned.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docstring_quotes() {
        assert_eq!(clean_docstring(r#""""Hello.""""#).as_deref(), Some("Hello."));
        assert_eq!(clean_docstring("'single'").as_deref(), Some("single"));
        assert_eq!(clean_docstring(r#"r"""raw \d""""#).as_deref(), Some(r"raw \d"));
    }

    #[test]
    fn test_docstring_rejects_fstring_and_bytes() {
        assert_eq!(clean_docstring(r#"f"""x {y}""""#), None);
        assert_eq!(clean_docstring(r#"b"data""#), None);
    }

    #[test]
    fn test_docstring_dedent() {
        let literal = "\"\"\"Summary line.\n\n    Args:\n        x: value.\n    \"\"\"";
        assert_eq!(
            clean_docstring(literal).as_deref(),
            Some("Summary line.\n\nArgs:\n    x: value.")
        );
    }

    #[test]
    fn test_docstring_escapes() {
        assert_eq!(
            clean_docstring(r#""""Say \"hi\"\tnow.""""#).as_deref(),
            Some("Say \"hi\"\tnow.")
        );
        assert_eq!(
            clean_docstring(r"'caf\xe9 \u2603 \101 back\\slash'").as_deref(),
            Some("caf\u{e9} \u{2603} A back\\slash")
        );
        assert_eq!(
            clean_docstring("\"\"\"joined \\\nline\"\"\"").as_deref(),
            Some("joined line")
        );
        assert_eq!(
            clean_docstring(r"'keep \d and \N{DASH}'").as_deref(),
            Some(r"keep \d and \N{DASH}")
        );
        assert_eq!(clean_docstring(r#"u"two\nlines""#).as_deref(), Some("two\nlines"));
    }

    #[test]
    fn test_concatenated_docstring() {
        assert_eq!(
            clean_concatenated_docstring([r#""Hello ""#, r#""world""#]).as_deref(),
            Some("Hello world")
        );
        assert_eq!(
            clean_concatenated_docstring([r#""a""#, r#"r'\d'"#]).as_deref(),
            Some(r"a\d")
        );
        assert_eq!(clean_concatenated_docstring([r#""a""#, r#"f"{b}""#]), None);
    }

    #[test]
    fn test_dedent_non_ascii_indentation() {
        // U+3000 counts as one character of indentation, not three bytes.
        let literal = "\"\"\"Title.\n\u{3000}\u{3000}body\n\u{3000}\u{3000}more\"\"\"";
        assert_eq!(clean_docstring(literal).as_deref(), Some("Title.\nbody\nmore"));

        let mixed = "\"\"\"Title.\n    wide\n\u{a0}  narrow\"\"\"";
        assert_eq!(clean_docstring(mixed).as_deref(), Some("Title.\n wide\nnarrow"));
    }

    #[test]
    fn test_dedent_expands_leading_tabs_only() {
        let literal = "\"\"\"Title.\n\tcol\tumn\n        next\"\"\"";
        assert_eq!(clean_docstring(literal).as_deref(), Some("Title.\ncol\tumn\nnext"));
    }

    #[test]
    fn test_doc_comment_cleaning() {
        let raw = "/**\n * Adds numbers.\n *\n * @param a first\n */";
        assert_eq!(clean_doc_comment(raw), "Adds numbers.\n\n@param a first");
    }

    #[test]
    fn test_doc_comment_single_line() {
        assert_eq!(clean_doc_comment("/** Short. */"), "Short.");
    }
}
