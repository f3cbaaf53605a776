//! Catalog of privacy setting definitions, loaded from JSON.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

use super::option::OptionFlag;
use super::setting::PrivacySetting;
use crate::error::Result;

/// A setting definition as written in the catalog file.
///
/// Options are kept as labels until validated, so an unknown label is
/// reported as such instead of as a generic parse failure.
#[derive(Debug, Deserialize)]
struct SettingDefinition {
    id: String,
    name: String,
    setting_function_name: String,
    value_function_name_stub: String,
    title: String,
    group: String,
    group_title: String,
    options: Vec<String>,
    #[serde(default)]
    trusted_option: Option<String>,
    #[serde(default)]
    sort: i32,
}

impl SettingDefinition {
    fn into_setting(self) -> Result<PrivacySetting> {
        let options = self
            .options
            .iter()
            .map(|label| label.parse::<OptionFlag>())
            .collect::<Result<Vec<_>>>()?;
        let trusted_option = self
            .trusted_option
            .as_deref()
            .map(str::parse::<OptionFlag>)
            .transpose()?;

        Ok(PrivacySetting {
            id: self.id,
            name: self.name,
            setting_function_name: self.setting_function_name,
            value_function_name_stub: self.value_function_name_stub,
            title: self.title,
            group: self.group,
            group_title: self.group_title,
            options,
            trusted_option,
            sort: self.sort,
        })
    }
}

/// All known privacy settings, ordered by sort key.
#[derive(Debug, Clone, Default)]
pub struct SettingsCatalog {
    settings: Vec<PrivacySetting>,
}

impl SettingsCatalog {
    pub fn new(mut settings: Vec<PrivacySetting>) -> Self {
        settings.sort_by(|a, b| a.sort.cmp(&b.sort).then_with(|| a.id.cmp(&b.id)));
        Self { settings }
    }

    /// Parse a JSON array of setting definitions.
    pub fn from_json(json: &str) -> Result<Self> {
        let definitions: Vec<SettingDefinition> = serde_json::from_str(json)?;
        let settings = definitions
            .into_iter()
            .map(SettingDefinition::into_setting)
            .collect::<Result<Vec<_>>>()?;
        debug!(count = settings.len(), "loaded setting definitions");
        Ok(Self::new(settings))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn get(&self, id: &str) -> Option<&PrivacySetting> {
        self.settings.iter().find(|setting| setting.id == id)
    }

    pub fn settings(&self) -> &[PrivacySetting] {
        &self.settings
    }

    /// Settings belonging to `group`, in sort order.
    pub fn group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a PrivacySetting> + 'a {
        self.settings.iter().filter(move |setting| setting.group == group)
    }

    pub fn groups(&self) -> BTreeSet<&str> {
        self.settings.iter().map(|setting| setting.group.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }
}
