//! Brand and competitor configuration, plus alias normalization.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Canonical entity name plus every alternate form that counts as a mention.
///
/// All forms are trimmed and lowercased, deduplicated in insertion order, and
/// the lowercased canonical name is always the first form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasSet {
    name: String,
    forms: Vec<String>,
}

impl AliasSet {
    /// Build an alias set from a display name and its aliases.
    ///
    /// Blank aliases are dropped.
    #[must_use]
    pub fn new<I, S>(name: &str, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.trim().to_string();
        let mut set = Self {
            forms: Vec::new(),
            name: name.clone(),
        };
        set.push_form(&name);
        for alias in aliases {
            set.push_form(alias.as_ref());
        }
        set
    }

    /// Return a copy of this set extended with externally supplied product names.
    ///
    /// Product names are untrusted: they get the same normalization as aliases
    /// and never replace the canonical name.
    #[must_use]
    pub fn with_products<I, S>(&self, products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = self.clone();
        for product in products {
            set.push_form(product.as_ref());
        }
        set
    }

    /// Display name as configured (original casing).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized forms, canonical first.
    #[must_use]
    pub fn forms(&self) -> &[String] {
        &self.forms
    }

    /// Forms other than the canonical name.
    #[must_use]
    pub fn aliases(&self) -> &[String] {
        self.forms.get(1..).unwrap_or_default()
    }

    /// Case-insensitive membership test.
    #[must_use]
    pub fn contains(&self, form: &str) -> bool {
        let needle = normalize_form(form);
        self.forms.iter().any(|f| *f == needle)
    }

    fn push_form(&mut self, raw: &str) {
        let form = normalize_form(raw);
        if form.is_empty() || self.forms.contains(&form) {
            return;
        }
        self.forms.push(form);
    }
}

/// Collapse internal whitespace and lowercase; the comparison form for names.
#[must_use]
pub fn normalize_form(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityConfig {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Known product names that count as mentions of this entity.
    #[serde(default)]
    pub products: Vec<String>,
}

impl EntityConfig {
    #[must_use]
    pub fn alias_set(&self) -> AliasSet {
        AliasSet::new(&self.name, self.aliases.iter().chain(&self.products))
    }
}

/// Contents of the entities YAML file: one tracked brand and its competitors.
#[derive(Debug, Clone, Deserialize)]
pub struct EntitiesFile {
    pub brand: EntityConfig,
    #[serde(default)]
    pub competitors: Vec<EntityConfig>,
}

impl EntitiesFile {
    #[must_use]
    pub fn brand_aliases(&self) -> AliasSet {
        self.brand.alias_set()
    }

    #[must_use]
    pub fn competitor_aliases(&self) -> Vec<AliasSet> {
        self.competitors.iter().map(EntityConfig::alias_set).collect()
    }
}

/// Load and validate the entities configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_entities(path: &Path) -> Result<EntitiesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::EntitiesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_entities(&content)
}

/// Parse and validate entities YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_entities(content: &str) -> Result<EntitiesFile, ConfigError> {
    let entities: EntitiesFile =
        serde_yaml::from_str(content).map_err(ConfigError::EntitiesFileParse)?;

    validate_entities(&entities)?;

    Ok(entities)
}

fn validate_entities(entities: &EntitiesFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for entity in std::iter::once(&entities.brand).chain(&entities.competitors) {
        if entity.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "entity name must be non-empty".to_string(),
            ));
        }

        if !seen_names.insert(normalize_form(&entity.name)) {
            return Err(ConfigError::Validation(format!(
                "duplicate entity name: '{}'",
                entity.name
            )));
        }
    }

    let brand = entities.brand.alias_set();
    for competitor in &entities.competitors {
        if let Some(shared) = competitor
            .alias_set()
            .forms()
            .iter()
            .find(|form| brand.contains(form))
        {
            return Err(ConfigError::Validation(format!(
                "competitor '{}' shares alias '{shared}' with brand '{}'",
                competitor.name, entities.brand.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "entities_test.rs"]
mod tests;
