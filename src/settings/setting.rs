//! Privacy setting definitions and the per-application selection built on them.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use super::option::{CoreOutcome, OptionFlag, OptionFlags};
use crate::error::Result;

/// One configurable privacy setting, as declared in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct PrivacySetting {
    pub id: String,
    pub name: String,
    /// Subsystem function that stores the selected outcome.
    pub setting_function_name: String,
    /// Stub of the subsystem function(s) that store override values.
    pub value_function_name_stub: String,
    pub title: String,
    pub group: String,
    pub group_title: String,
    /// Options offered for this setting, in display order.
    pub options: Vec<OptionFlag>,
    pub trusted_option: Option<OptionFlag>,
    pub sort: i32,
}

impl PrivacySetting {
    /// Mask of the options this setting supports.
    pub fn options_bits(&self) -> OptionFlags {
        self.options
            .iter()
            .fold(OptionFlags::empty(), |mask, flag| mask | flag.flags())
    }

    pub fn supports(&self, flag: OptionFlag) -> bool {
        self.options_bits().contains(flag.flags())
    }
}

/// A named override value, e.g. `("Lat", "-33.86")` for a fake location.
///
/// Single-valued settings use an empty name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: String,
}

impl NamedValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Override payload for a setting: nothing, a single value, or named values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum CustomValue {
    #[default]
    None,
    Scalar(String),
    List(Vec<NamedValue>),
}

impl CustomValue {
    /// The payload as name/value pairs regardless of how it is stored.
    ///
    /// A scalar comes back as a single pair with an empty name.
    pub fn as_pairs(&self) -> Option<Cow<'_, [NamedValue]>> {
        match self {
            CustomValue::None => None,
            CustomValue::Scalar(value) => Some(Cow::Owned(vec![NamedValue::new("", value.clone())])),
            CustomValue::List(values) => Some(Cow::Borrowed(values.as_slice())),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, CustomValue::None)
    }
}

/// A privacy setting together with one application's selection.
#[derive(Debug, Clone, PartialEq)]
pub struct AppPrivacySetting {
    setting: PrivacySetting,
    selected: Option<OptionFlag>,
    custom: CustomValue,
}

impl AppPrivacySetting {
    /// Anything not explicitly set is assumed to be allowed.
    pub fn new(setting: PrivacySetting) -> Self {
        Self {
            setting,
            selected: Some(OptionFlag::Allow),
            custom: CustomValue::None,
        }
    }

    /// Build from a persisted raw selection.
    pub fn with_selected_bits(setting: PrivacySetting, bits: u32) -> Result<Self> {
        let selected = OptionFlag::from_bits(bits)?;
        Ok(Self {
            setting,
            selected,
            custom: CustomValue::None,
        })
    }

    pub fn setting(&self) -> &PrivacySetting {
        &self.setting
    }

    pub fn selected_option(&self) -> Option<OptionFlag> {
        self.selected
    }

    pub fn set_selected_option(&mut self, selected: Option<OptionFlag>) {
        self.selected = selected;
    }

    /// Raw selection bits, `0` when unset.
    pub fn selected_option_bits(&self) -> u32 {
        self.selected.map_or(0, OptionFlag::bit)
    }

    /// Store a raw selection. Nothing changes if it nominates more than one option.
    ///
    /// The selection is not checked against the setting's supported options.
    pub fn set_selected_option_bits(&mut self, bits: u32) -> Result<()> {
        self.selected = OptionFlag::from_bits(bits)?;
        Ok(())
    }

    /// Label of the selected option, `None` when unset.
    pub fn selected_option_label(&self) -> Option<&'static str> {
        self.selected.map(OptionFlag::label)
    }

    /// Select whichever supported option represents the given core outcome.
    pub fn set_selected_core_outcome(&mut self, core: u8) -> Result<()> {
        let flag = CoreOutcome::try_from(core)?.option_for(self.setting.options_bits())?;
        self.selected = Some(flag);
        Ok(())
    }

    /// Core outcome to push to the subsystem for the current selection.
    pub fn selected_core_outcome(&self) -> Option<CoreOutcome> {
        self.selected.map(OptionFlag::core_outcome)
    }

    pub fn custom_value(&self) -> &CustomValue {
        &self.custom
    }

    /// Replace the override with a single value.
    pub fn set_custom_value(&mut self, value: impl Into<String>) {
        self.custom = CustomValue::Scalar(value.into());
    }

    /// Replace the override with a list of named values.
    pub fn set_custom_values(&mut self, values: Vec<NamedValue>) {
        self.custom = CustomValue::List(values);
    }

    pub fn set_custom(&mut self, custom: CustomValue) {
        self.custom = custom;
    }

    pub fn custom_values(&self) -> Option<Cow<'_, [NamedValue]>> {
        self.custom.as_pairs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn location_setting() -> PrivacySetting {
        PrivacySetting {
            id: "location".to_string(),
            name: "Location".to_string(),
            setting_function_name: "setLocationGpsSetting".to_string(),
            value_function_name_stub: "LocationGps".to_string(),
            title: "GPS location".to_string(),
            group: "location".to_string(),
            group_title: "Location".to_string(),
            options: vec![
                OptionFlag::Yes,
                OptionFlag::CustomLocation,
                OptionFlag::Random,
                OptionFlag::No,
            ],
            trusted_option: Some(OptionFlag::Yes),
            sort: 10,
        }
    }

    #[test]
    fn test_defaults_to_allow() {
        let setting = AppPrivacySetting::new(location_setting());
        assert_eq!(setting.selected_option(), Some(OptionFlag::Allow));
        assert_eq!(setting.selected_option_label(), Some("allow"));
        assert!(setting.custom_values().is_none());
    }

    #[test]
    fn test_options_bits_follow_declared_options() {
        let setting = location_setting();
        assert_eq!(
            setting.options_bits(),
            OptionFlags::YES | OptionFlags::CUSTOMLOCATION | OptionFlags::RANDOM | OptionFlags::NO
        );
        assert!(setting.supports(OptionFlag::Random));
        assert!(!setting.supports(OptionFlag::Allow));
    }

    #[test]
    fn test_invalid_selection_leaves_previous_value() {
        let mut setting = AppPrivacySetting::new(location_setting());
        setting.set_selected_option_bits(OptionFlag::Random.bit()).unwrap();

        let bits = OptionFlag::Allow.bit() | OptionFlag::Deny.bit();
        let err = setting.set_selected_option_bits(bits).unwrap_err();
        assert!(matches!(err, Error::InvalidSelection { bits: b } if b == bits));
        assert_eq!(setting.selected_option(), Some(OptionFlag::Random));
    }

    #[test]
    fn test_unset_selection_has_no_label() {
        let mut setting = AppPrivacySetting::new(location_setting());
        setting.set_selected_option_bits(0).unwrap();
        assert_eq!(setting.selected_option_label(), None);
        assert_eq!(setting.selected_option_bits(), 0);
        assert_eq!(setting.selected_core_outcome(), None);
    }

    #[test]
    fn test_with_selected_bits_validates() {
        assert!(AppPrivacySetting::with_selected_bits(location_setting(), 0b11).is_err());
        let setting =
            AppPrivacySetting::with_selected_bits(location_setting(), OptionFlag::No.bit()).unwrap();
        assert_eq!(setting.selected_option_label(), Some("no"));
    }

    #[test]
    fn test_core_outcome_uses_setting_mask() {
        let mut setting = AppPrivacySetting::new(location_setting());

        setting.set_selected_core_outcome(CoreOutcome::Real as u8).unwrap();
        assert_eq!(setting.selected_option(), Some(OptionFlag::Yes));

        setting.set_selected_core_outcome(CoreOutcome::Custom as u8).unwrap();
        assert_eq!(setting.selected_option(), Some(OptionFlag::CustomLocation));
        assert_eq!(setting.selected_core_outcome(), Some(CoreOutcome::Custom));

        assert!(matches!(
            setting.set_selected_core_outcome(9),
            Err(Error::UnrecognizedOutcome(9))
        ));
        assert_eq!(setting.selected_option(), Some(OptionFlag::CustomLocation));
    }

    #[test]
    fn test_unsupported_core_outcome_keeps_selection() {
        let mut base = location_setting();
        base.options = vec![OptionFlag::Allow, OptionFlag::Deny];
        let mut setting = AppPrivacySetting::new(base);

        assert!(matches!(
            setting.set_selected_core_outcome(CoreOutcome::Random as u8),
            Err(Error::UnsupportedOutcome { outcome: 2, .. })
        ));
        assert_eq!(setting.selected_option(), Some(OptionFlag::Allow));
    }

    #[test]
    fn test_scalar_then_list_override() {
        let mut setting = AppPrivacySetting::new(location_setting());

        setting.set_custom_value("0123456789");
        let pairs = setting.custom_values().unwrap();
        assert_eq!(&pairs[..], &[NamedValue::new("", "0123456789")]);

        let list = vec![NamedValue::new("Lat", "-33.86"), NamedValue::new("Lon", "151.21")];
        setting.set_custom_values(list.clone());
        assert_eq!(&setting.custom_values().unwrap()[..], list.as_slice());
        assert_eq!(setting.custom_value(), &CustomValue::List(list));
    }

    #[test]
    fn test_list_then_scalar_override() {
        let mut setting = AppPrivacySetting::new(location_setting());
        setting.set_custom_values(vec![NamedValue::new("Lat", "1.0")]);
        setting.set_custom_value("x");
        assert_eq!(setting.custom_value(), &CustomValue::Scalar("x".to_string()));
        assert_eq!(setting.custom_values().unwrap().len(), 1);
    }

    #[test]
    fn test_custom_value_json_shape() {
        let custom = CustomValue::List(vec![NamedValue::new("Lat", "1.0")]);
        let json = serde_json::to_string(&custom).unwrap();
        let restored: CustomValue = serde_json::from_str(&json).unwrap();
        assert_eq!(custom, restored);

        let none: CustomValue = serde_json::from_str(r#"{"kind":"none"}"#).unwrap();
        assert!(none.is_none());
    }
}
