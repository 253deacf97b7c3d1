//! Compiler settings
//!
//! Settings are read from a TOML file (conventionally `untex.toml`):
//!
//! ```toml
//! [template]
//! name = "templates/report.xml"
//!
//! [metadata]
//! author = "Jane Doe"
//! institute = "ACME"
//! ```
//!
//! `metadata` seeds the compilation unit before any source is parsed, and
//! `template.name` seeds the `template` key. Documents override both.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::metadata::{Metadata, TEMPLATE_KEY};

/// Top-level settings structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Template selection
    pub template: TemplateSettings,
    /// Metadata every compilation starts with
    pub metadata: BTreeMap<String, String>,
}

/// Template selection settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Template used when the document names none
    pub name: Option<String>,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Metadata a compilation unit starts with
    pub fn seed_metadata(&self) -> Metadata {
        let mut metadata: Metadata = self.metadata.clone().into_iter().collect();
        if let Some(name) = &self.template.name {
            metadata.set(TEMPLATE_KEY, name.clone());
        }
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_from_toml() {
        let toml = r#"
[template]
name = "report.xml"

[metadata]
author = "Jane Doe"
"#;
        let settings = Settings::from_toml_str(toml).unwrap();
        assert_eq!(settings.template.name.as_deref(), Some("report.xml"));
        assert_eq!(
            settings.metadata.get("author").map(String::as_str),
            Some("Jane Doe")
        );
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.seed_metadata().is_empty());
    }

    #[test]
    fn test_seed_metadata_includes_template() {
        let settings = Settings::from_toml_str(
            "[template]\nname = \"t.xml\"\n[metadata]\ntitle = \"T\"\n",
        )
        .unwrap();
        let seed = settings.seed_metadata();
        assert_eq!(seed.template_name(), "t.xml");
        assert_eq!(seed.get("title"), Some("T"));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Settings::from_toml_str("[template\nname=").is_err());
    }
}
