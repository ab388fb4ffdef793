//! Scopes and canonical ghost paths.
//!
//! Every resource lives under one of two roots: `data/global` for
//! platform-wide content, or `data/bots/<botId>` for a bot's private area.
//! Paths are forward-slash separated and stored verbatim; matching is the
//! only place they are compared case-insensitively.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::error::GhostError;

/// Root folder for platform-global content.
pub const GLOBAL_ROOT: &str = "data/global";

/// Root folder containing every bot's private area.
pub const BOTS_ROOT: &str = "data/bots";

/// Maximum length of a bot identifier.
pub const MAX_BOT_ID_LEN: usize = 64;

/// Validated bot identifier.
///
/// 1-64 ASCII characters: alphanumerics, `_` and `-`, starting with an
/// alphanumeric. This keeps a bot id usable as a single path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BotId(String);

impl BotId {
    pub fn parse(raw: &str) -> Result<Self, GhostError> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_BOT_ID_LEN
            && raw.starts_with(|c: char| c.is_ascii_alphanumeric())
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(GhostError::InvalidBotId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BotId {
    type Err = GhostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BotId {
    type Error = GhostError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BotId> for String {
    fn from(value: BotId) -> Self {
        value.0
    }
}

/// Namespace a ghost handle is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "bot_id")]
pub enum Scope {
    /// `data/global`
    Global,
    /// `data/bots` -- every bot at once. Used for bulk sync and export.
    Bots,
    /// `data/bots/<botId>`
    Bot(BotId),
}

impl Scope {
    /// Root folder of this scope, without a trailing slash.
    pub fn root(&self) -> String {
        match self {
            Scope::Global => GLOBAL_ROOT.to_string(),
            Scope::Bots => BOTS_ROOT.to_string(),
            Scope::Bot(id) => format!("{BOTS_ROOT}/{id}"),
        }
    }

    pub fn bot_id(&self) -> Option<&BotId> {
        match self {
            Scope::Bot(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Bots => write!(f, "bots"),
            Scope::Bot(id) => write!(f, "bot:{id}"),
        }
    }
}

/// Which storage backend a ghost service reads and writes through.
///
/// Fixed when the service is built; only sync ever touches both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverMode {
    Disk,
    Database,
}

impl DriverMode {
    pub fn from_flag(use_database_driver: bool) -> Self {
        if use_database_driver {
            DriverMode::Database
        } else {
            DriverMode::Disk
        }
    }

    pub fn is_database(self) -> bool {
        self == DriverMode::Database
    }
}

impl fmt::Display for DriverMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverMode::Disk => write!(f, "disk"),
            DriverMode::Database => write!(f, "database"),
        }
    }
}

impl FromStr for DriverMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disk" => Ok(DriverMode::Disk),
            "database" | "db" => Ok(DriverMode::Database),
            other => Err(format!("unknown driver mode '{other}'")),
        }
    }
}

/// Normalize a relative path fragment.
///
/// Backslashes become forward slashes, empty and `.` segments are dropped and
/// a leading `./` or `/` is ignored. `..` is rejected so no path can escape
/// its scope root.
pub fn normalize_path(raw: &str) -> Result<String, GhostError> {
    let mut segments = Vec::new();
    for segment in raw.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(GhostError::InvalidPath(format!(
                    "'{raw}' must not contain '..'"
                )));
            }
            s => segments.push(s),
        }
    }
    Ok(segments.join("/"))
}

/// Join path fragments with forward slashes, skipping empty ones.
pub fn join_path(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
}

/// Strip `root/` from `path`, returning the remainder.
///
/// Both sides are normalized first, so `./data/global/a.json` is relative to
/// `data/global` as `a.json`. Returns `None` when `path` is not under `root`.
pub fn relative_to(root: &str, path: &str) -> Option<String> {
    let root = normalize_path(root).ok()?;
    let path = normalize_path(path).ok()?;
    if root.is_empty() {
        return Some(path);
    }
    path.strip_prefix(&root)
        .and_then(|rest| rest.strip_prefix('/'))
        .map(str::to_string)
}

/// A canonical, scope-rooted path such as `data/bots/luna/flows/main.flow.json`.
///
/// Constructed per call from `(scope, folder, file)` and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopedPath {
    scope: Scope,
    relative: String,
    full: String,
}

impl ScopedPath {
    /// Path of a file: `<root>/<folder>/<file>`.
    pub fn file(scope: &Scope, folder: &str, file: &str) -> Result<Self, GhostError> {
        let relative = join_path(&[&normalize_path(folder)?, &normalize_path(file)?]);
        if relative.is_empty() {
            return Err(GhostError::InvalidPath("file name must not be empty".to_string()));
        }
        Ok(Self::from_relative(scope, relative))
    }

    /// Path of a folder: `<root>/<folder>`. An empty folder is the root itself.
    pub fn folder(scope: &Scope, folder: &str) -> Result<Self, GhostError> {
        let relative = normalize_path(folder)?;
        Ok(Self::from_relative(scope, relative))
    }

    fn from_relative(scope: &Scope, relative: String) -> Self {
        let full = join_path(&[&scope.root(), &relative]);
        Self {
            scope: scope.clone(),
            relative,
            full,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Full canonical path, including the scope root.
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// Path below the scope root.
    pub fn relative(&self) -> &str {
        &self.relative
    }

    /// Last segment of the path.
    pub fn file_name(&self) -> &str {
        self.full.rsplit('/').next().unwrap_or(&self.full)
    }
}

impl fmt::Display for ScopedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_id_validation() {
        assert!(BotId::parse("bot123").is_ok());
        assert!(BotId::parse("welcome-bot_2").is_ok());
        assert!(BotId::parse("").is_err());
        assert!(BotId::parse("-leading").is_err());
        assert!(BotId::parse("has/slash").is_err());
        assert!(BotId::parse("dots.not.allowed").is_err());
        assert!(BotId::parse(&"a".repeat(MAX_BOT_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_scope_roots() {
        assert_eq!(Scope::Global.root(), "data/global");
        assert_eq!(Scope::Bots.root(), "data/bots");
        let bot = Scope::Bot(BotId::parse("luna").unwrap());
        assert_eq!(bot.root(), "data/bots/luna");
        assert_eq!(bot.to_string(), "bot:luna");
    }

    #[test]
    fn test_scope_serde() {
        let bot = Scope::Bot(BotId::parse("luna").unwrap());
        let json = serde_json::to_string(&bot).unwrap();
        assert_eq!(json, r#"{"kind":"bot","bot_id":"luna"}"#);
        let back: Scope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bot);

        let bad: Result<Scope, _> = serde_json::from_str(r#"{"kind":"bot","bot_id":"../x"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./a//b/./c.json").unwrap(), "a/b/c.json");
        assert_eq!(normalize_path("\\win\\style.txt").unwrap(), "win/style.txt");
        assert_eq!(normalize_path("/").unwrap(), "");
        assert!(normalize_path("a/../../etc/passwd").is_err());
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(
            relative_to("data/global", "./data/global/a/1.txt").as_deref(),
            Some("a/1.txt")
        );
        assert_eq!(relative_to("data/global", "data/globalx/a.txt"), None);
        assert_eq!(relative_to("data/bots/luna", "data/global/a.txt"), None);
    }

    #[test]
    fn test_scoped_file_path() {
        let path = ScopedPath::file(&Scope::Global, "test", "my/test.json").unwrap();
        assert_eq!(path.as_str(), "data/global/test/my/test.json");
        assert_eq!(path.relative(), "test/my/test.json");
        assert_eq!(path.file_name(), "test.json");

        let root_file = ScopedPath::file(&Scope::Global, "/", "bot.config.json").unwrap();
        assert_eq!(root_file.as_str(), "data/global/bot.config.json");
    }

    #[test]
    fn test_scoped_path_keeps_case() {
        let path = ScopedPath::file(&Scope::Global, "Flows", "Main.JSON").unwrap();
        assert_eq!(path.as_str(), "data/global/Flows/Main.JSON");
    }

    #[test]
    fn test_scoped_path_rejects_empty_and_traversal() {
        assert!(ScopedPath::file(&Scope::Global, "", "").is_err());
        assert!(ScopedPath::file(&Scope::Global, "..", "x").is_err());
        let root = ScopedPath::folder(&Scope::Global, "./").unwrap();
        assert_eq!(root.as_str(), "data/global");
    }

    #[test]
    fn test_driver_mode_parse() {
        assert_eq!("db".parse::<DriverMode>().unwrap(), DriverMode::Database);
        assert_eq!("Disk".parse::<DriverMode>().unwrap(), DriverMode::Disk);
        assert!("s3".parse::<DriverMode>().is_err());
        assert_eq!(DriverMode::from_flag(true), DriverMode::Database);
    }
}
