// Shared text matcher
//
// Locator criteria and wait/assert patterns all go through one matcher.
// Patterns may carry an explicit mode prefix:
//
//   regexp:<re>    case-sensitive regular expression
//   regexpi:<re>   case-insensitive regular expression
//   glob:<pat>     glob with `*` and `?` wildcards
//   exact:<text>   literal comparison
//
// Without a prefix, glob matching applies. `strict` selects whole-text
// matching; otherwise the pattern may match anywhere in the text
// (page-text containment checks). Matching is case-sensitive unless
// `regexpi:` says otherwise.

use regex::Regex;
use tracing::warn;

/// Tests `text` against `pattern`.
///
/// `strict` requires the whole text to match; `normalize` collapses
/// whitespace runs before comparison, which is what rendered-text
/// checks want (attribute and value checks pass `false`).
pub fn is_match(text: &str, pattern: &str, strict: bool, normalize: bool) -> bool {
    let text = if normalize {
        normalize_whitespace(text)
    } else {
        text.to_string()
    };

    if let Some(re) = pattern.strip_prefix("regexp:") {
        return regex_match(&text, re, false, strict);
    }
    if let Some(re) = pattern.strip_prefix("regexpi:") {
        return regex_match(&text, re, true, strict);
    }
    if let Some(literal) = pattern.strip_prefix("exact:") {
        let literal = if normalize {
            normalize_whitespace(literal)
        } else {
            literal.to_string()
        };
        return if strict {
            text == literal
        } else {
            text.contains(&literal)
        };
    }

    let glob = pattern.strip_prefix("glob:").unwrap_or(pattern);
    let glob = if normalize {
        normalize_whitespace(glob)
    } else {
        glob.to_string()
    };
    regex_match(&text, &glob_to_regex(&glob), false, strict)
}

/// Collapses whitespace runs (including non-breaking spaces) to single
/// spaces and trims, approximating how text is rendered.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() || c == '\u{a0}' {
            if !in_space && !out.is_empty() {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

fn regex_match(text: &str, pattern: &str, case_insensitive: bool, strict: bool) -> bool {
    let mut full = String::with_capacity(pattern.len() + 16);
    if case_insensitive {
        full.push_str("(?i)");
    }
    // (?s) so that `.` crosses line breaks in multi-line page text
    full.push_str("(?s)");
    if strict {
        full.push_str("\\A(?:");
        full.push_str(pattern);
        full.push_str(")\\z");
    } else {
        full.push_str(pattern);
    }

    match Regex::new(&full) {
        Ok(re) => re.is_match(text),
        Err(err) => {
            warn!(pattern, %err, "invalid text pattern; treating as no match");
            false
        }
    }
}

/// Translates a glob into an equivalent regular expression. `*` matches
/// any run of characters, `?` a single character; everything else is
/// literal.
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2);
    for c in glob.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out
}
