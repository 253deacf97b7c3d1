//! List kinds

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of list an item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    /// Bullet list (`itemize`)
    Unordered,
    /// Numbered list (`enumerate`)
    Ordered,
}

impl ListKind {
    /// Name of the LaTeX environment that holds items of this kind
    pub fn environment(self) -> &'static str {
        match self {
            ListKind::Unordered => "itemize",
            ListKind::Ordered => "enumerate",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.environment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_names() {
        assert_eq!(ListKind::Unordered.environment(), "itemize");
        assert_eq!(ListKind::Ordered.environment(), "enumerate");
        assert_eq!(ListKind::Ordered.to_string(), "enumerate");
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&ListKind::Unordered).unwrap();
        assert_eq!(json, "\"unordered\"");
    }
}
