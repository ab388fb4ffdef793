//! Glob filtering for directory listings.
//!
//! A pattern without a `/` is matched against each path's basename, at any
//! depth. A pattern with a `/` is matched against the whole path relative to
//! the listed folder, where `**` spans any number of folders. Matching is
//! always case-insensitive.

use regex::{Regex, RegexBuilder};

use ghostfs_types::error::GhostError;

/// Options applied to every listing after the pattern filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingOptions {
    /// Full-path globs relative to the listed folder. Matching paths are dropped.
    pub excludes: Vec<String>,
    /// Keep paths with a segment starting with `.`.
    pub include_dot_files: bool,
}

impl ListingOptions {
    pub fn excluding<I, S>(excludes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excludes: excludes.into_iter().map(Into::into).collect(),
            include_dot_files: false,
        }
    }

    pub fn with_dot_files(mut self) -> Self {
        self.include_dot_files = true;
        self
    }
}

/// A compiled glob.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    pattern: String,
    regex: Regex,
    basename_only: bool,
}

impl PathMatcher {
    /// Compile `pattern`, choosing basename or full-path mode by the presence
    /// of a separator.
    pub fn new(pattern: &str) -> Result<Self, GhostError> {
        let trimmed = pattern.trim_start_matches("./").trim_start_matches('/');
        let basename_only = !trimmed.contains('/');
        Self::compile(pattern, trimmed, basename_only)
    }

    /// Compile `pattern` in full-path mode regardless of separators.
    pub fn full_path(pattern: &str) -> Result<Self, GhostError> {
        let trimmed = pattern.trim_start_matches("./").trim_start_matches('/');
        Self::compile(pattern, trimmed, false)
    }

    fn compile(original: &str, glob: &str, basename_only: bool) -> Result<Self, GhostError> {
        let regex = RegexBuilder::new(&glob_to_regex(glob))
            .case_insensitive(true)
            .build()
            .map_err(|e| GhostError::InvalidPath(format!("bad pattern '{original}': {e}")))?;
        Ok(Self {
            pattern: original.to_string(),
            regex,
            basename_only,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_basename_only(&self) -> bool {
        self.basename_only
    }

    /// Test a path relative to the listed folder.
    pub fn is_match(&self, relative: &str) -> bool {
        if self.basename_only {
            let basename = relative.rsplit('/').next().unwrap_or(relative);
            self.regex.is_match(basename)
        } else {
            self.regex.is_match(relative)
        }
    }
}

/// Translate a glob into an anchored regex.
///
/// `**/` matches zero or more folders, `**` anything, `*` a run within one
/// segment, `?` one character within a segment. `{a,b}` alternates and
/// `[...]` is a character class (`[!...]` negated). Everything else is literal.
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2 + 2);
    out.push('^');

    let chars: Vec<char> = glob.chars().collect();
    let mut i = 0;
    let mut brace_depth = 0usize;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
                continue;
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '{' => {
                brace_depth += 1;
                out.push_str("(?:");
            }
            ',' if brace_depth > 0 => out.push('|'),
            '}' if brace_depth > 0 => {
                brace_depth -= 1;
                out.push(')');
            }
            '[' => match chars[i + 1..].iter().position(|&ch| ch == ']') {
                Some(len) if len > 0 => {
                    let class: String = chars[i + 1..i + 1 + len].iter().collect();
                    out.push('[');
                    match class.strip_prefix('!') {
                        Some(rest) => {
                            out.push('^');
                            out.push_str(&escape_class(rest));
                        }
                        None => out.push_str(&escape_class(&class)),
                    }
                    out.push(']');
                    i += len + 2;
                    continue;
                }
                _ => out.push_str(r"\["),
            },
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
        i += 1;
    }

    out.push('$');
    out
}

fn escape_class(class: &str) -> String {
    class
        .chars()
        .map(|c| match c {
            '\\' | '[' | ']' | '^' | '&' | '~' => format!("\\{c}"),
            other => other.to_string(),
        })
        .collect()
}

fn is_dot_path(relative: &str) -> bool {
    relative.split('/').any(|segment| segment.starts_with('.'))
}

/// Filter paths (relative to the listed folder) by `pattern` and `options`.
///
/// No pattern keeps everything. Input order is preserved.
pub fn filter_listing(
    files: Vec<String>,
    pattern: Option<&str>,
    options: &ListingOptions,
) -> Result<Vec<String>, GhostError> {
    let matcher = pattern
        .filter(|p| !p.is_empty())
        .map(PathMatcher::new)
        .transpose()?;
    let excludes = options
        .excludes
        .iter()
        .map(|p| PathMatcher::full_path(p))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(files
        .into_iter()
        .filter(|f| options.include_dot_files || !is_dot_path(f))
        .filter(|f| matcher.as_ref().is_none_or(|m| m.is_match(f)))
        .filter(|f| !excludes.iter().any(|m| m.is_match(f)))
        .collect())
}
