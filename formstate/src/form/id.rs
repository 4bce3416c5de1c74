use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_ID_PREFIX: &str = "root";
pub const DEFAULT_ID_SEPARATOR: &str = ".";
pub const DEFAULT_PSEUDO_ID_SEPARATOR: &str = "::";

/// One step of an instance path: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{i}"),
            PathSegment::Key(k) => f.write_str(k),
        }
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        PathSegment::Index(value)
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        PathSegment::Key(value.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        PathSegment::Key(value)
    }
}

/// Build an instance ID: `prefix` followed by every segment, each preceded
/// by `separator`.
pub fn path_to_id(prefix: &str, separator: &str, path: &[PathSegment]) -> String {
    let mut id = prefix.to_string();
    for segment in path {
        id.push_str(separator);
        id.push_str(&segment.to_string());
    }
    id
}

/// ID of a synthetic sub-element of `id`, such as the key input of an
/// additional property.
pub fn pseudo_id(id: &str, pseudo_separator: &str, element: &str) -> String {
    format!("{id}{pseudo_separator}{element}")
}

/// Convert a JSON pointer (`/a/0/b`) into an instance path.
///
/// All-digit tokens become indices. An empty pointer is the root.
pub fn json_pointer_to_path(pointer: &str) -> Vec<PathSegment> {
    let pointer = pointer.strip_prefix('#').unwrap_or(pointer);
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer
        .trim_start_matches('/')
        .split('/')
        .map(|token| {
            let token = token.replace("~1", "/").replace("~0", "~");
            if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
                match token.parse() {
                    Ok(index) => PathSegment::Index(index),
                    Err(_) => PathSegment::Key(token),
                }
            } else {
                PathSegment::Key(token)
            }
        })
        .collect()
}

/// How instance IDs are spelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct IdConfig {
    pub prefix: String,
    pub separator: String,
    pub pseudo_separator: String,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_ID_PREFIX.to_string(),
            separator: DEFAULT_ID_SEPARATOR.to_string(),
            pseudo_separator: DEFAULT_PSEUDO_ID_SEPARATOR.to_string(),
        }
    }
}

impl IdConfig {
    pub fn id(&self, path: &[PathSegment]) -> String {
        path_to_id(&self.prefix, &self.separator, path)
    }

    pub fn pseudo_id(&self, id: &str, element: &str) -> String {
        pseudo_id(id, &self.pseudo_separator, element)
    }

    /// Separators a user supplied key must not contain.
    pub fn separators(&self) -> [&str; 2] {
        [self.separator.as_str(), self.pseudo_separator.as_str()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_to_id() {
        let path: [PathSegment; 3] = ["a".into(), 0usize.into(), "b".into()];
        assert_eq!(path_to_id("root", "_", &path), "root_a_0_b");
        assert_eq!(path_to_id("root", "_", &[]), "root");
        assert_eq!(IdConfig::default().id(&path), "root.a.0.b");
    }

    #[test]
    fn test_pseudo_id() {
        let config = IdConfig::default();
        let id = config.id(&["extra".into()]);
        assert_eq!(config.pseudo_id(&id, "key-input"), "root.extra::key-input");
    }

    #[test]
    fn test_json_pointer_to_path() {
        assert!(json_pointer_to_path("").is_empty());
        let expected: Vec<PathSegment> = vec!["tags".into(), 1usize.into(), "a/b".into()];
        assert_eq!(json_pointer_to_path("/tags/1/a~1b"), expected);
    }

    #[test]
    fn test_id_config_from_toml() {
        let config: IdConfig = toml::from_str("separator = \"_\"").unwrap();
        assert_eq!(config.prefix, "root");
        assert_eq!(config.separator, "_");
        assert_eq!(config.pseudo_separator, "::");
    }
}
