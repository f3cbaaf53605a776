//! Setting options and their mapping onto the privacy subsystem's core outcomes.
//!
//! The subsystem only knows four outcomes, while each setting presents a
//! richer menu (a location setting offers "custom location", a yes/no
//! setting offers "yes" rather than "allow"). `CoreOutcome::option_for`
//! picks the finer option a given setting actually supports.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

bitflags::bitflags! {
    /// Mask of options a setting supports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OptionFlags: u32 {
        const ALLOW = 1 << 0;
        const CUSTOM = 1 << 1;
        const CUSTOMLOCATION = 1 << 2;
        const DENY = 1 << 3;
        const NO = 1 << 4;
        const RANDOM = 1 << 5;
        const YES = 1 << 6;
    }
}

/// A single selectable option.
///
/// Holding one of these instead of a raw integer makes the
/// "exactly one option selected" rule impossible to break; raw bits only
/// appear at the storage boundary via `bit` and `from_bits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionFlag {
    Allow,
    Custom,
    CustomLocation,
    Deny,
    No,
    Random,
    Yes,
}

impl OptionFlag {
    pub const ALL: [OptionFlag; 7] = [
        OptionFlag::Allow,
        OptionFlag::Custom,
        OptionFlag::CustomLocation,
        OptionFlag::Deny,
        OptionFlag::No,
        OptionFlag::Random,
        OptionFlag::Yes,
    ];

    /// The mask containing only this option.
    pub fn flags(self) -> OptionFlags {
        match self {
            OptionFlag::Allow => OptionFlags::ALLOW,
            OptionFlag::Custom => OptionFlags::CUSTOM,
            OptionFlag::CustomLocation => OptionFlags::CUSTOMLOCATION,
            OptionFlag::Deny => OptionFlags::DENY,
            OptionFlag::No => OptionFlags::NO,
            OptionFlag::Random => OptionFlags::RANDOM,
            OptionFlag::Yes => OptionFlags::YES,
        }
    }

    /// Raw bit value as persisted.
    pub fn bit(self) -> u32 {
        self.flags().bits()
    }

    /// Parse a persisted selection.
    ///
    /// `0` means "unset" and yields `None`. More than one bit, or a bit that
    /// names no option, is rejected with `InvalidSelection`.
    pub fn from_bits(bits: u32) -> Result<Option<OptionFlag>> {
        if bits == 0 {
            return Ok(None);
        }
        if bits.count_ones() > 1 {
            return Err(Error::InvalidSelection { bits });
        }
        Self::ALL
            .into_iter()
            .find(|flag| flag.bit() == bits)
            .map(Some)
            .ok_or(Error::InvalidSelection { bits })
    }

    /// Canonical label, also used in setting definitions.
    pub fn label(self) -> &'static str {
        match self {
            OptionFlag::Allow => "allow",
            OptionFlag::Custom => "custom",
            OptionFlag::CustomLocation => "customlocation",
            OptionFlag::Deny => "deny",
            OptionFlag::No => "no",
            OptionFlag::Random => "random",
            OptionFlag::Yes => "yes",
        }
    }

    /// The core outcome this option is pushed to the subsystem as.
    pub fn core_outcome(self) -> CoreOutcome {
        match self {
            OptionFlag::Allow | OptionFlag::Yes => CoreOutcome::Real,
            OptionFlag::Custom | OptionFlag::CustomLocation => CoreOutcome::Custom,
            OptionFlag::Random => CoreOutcome::Random,
            OptionFlag::Deny | OptionFlag::No => CoreOutcome::Empty,
        }
    }
}

impl From<OptionFlag> for OptionFlags {
    fn from(flag: OptionFlag) -> Self {
        flag.flags()
    }
}

impl fmt::Display for OptionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OptionFlag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|flag| flag.label() == s)
            .ok_or_else(|| Error::UnknownOption(s.to_string()))
    }
}

/// The four outcomes the privacy subsystem reports and enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CoreOutcome {
    /// Hand out the real data.
    Real = 0,
    /// Hand out a user supplied value.
    Custom = 1,
    /// Hand out random data.
    Random = 2,
    /// Hand out nothing.
    Empty = 3,
}

impl CoreOutcome {
    /// Options that can represent this outcome, most preferred first.
    pub fn candidates(self) -> &'static [OptionFlag] {
        match self {
            CoreOutcome::Real => &[OptionFlag::Allow, OptionFlag::Yes],
            CoreOutcome::Custom => &[OptionFlag::Custom, OptionFlag::CustomLocation],
            CoreOutcome::Random => &[OptionFlag::Random],
            CoreOutcome::Empty => &[OptionFlag::Deny, OptionFlag::No],
        }
    }

    /// Pick the first candidate present in `supported`.
    pub fn option_for(self, supported: OptionFlags) -> Result<OptionFlag> {
        self.candidates()
            .iter()
            .copied()
            .find(|flag| supported.contains(flag.flags()))
            .ok_or(Error::UnsupportedOutcome {
                outcome: self as u8,
                supported,
            })
    }
}

impl TryFrom<u8> for CoreOutcome {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(CoreOutcome::Real),
            1 => Ok(CoreOutcome::Custom),
            2 => Ok(CoreOutcome::Random),
            3 => Ok(CoreOutcome::Empty),
            other => Err(Error::UnrecognizedOutcome(other)),
        }
    }
}

/// Convert a raw core outcome reported by the subsystem into the option a
/// setting with the given supported mask should display.
pub fn core_outcome_to_option(core: u8, supported: OptionFlags) -> Result<OptionFlag> {
    CoreOutcome::try_from(core)?.option_for(supported)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTCOMES: [CoreOutcome; 4] = [
        CoreOutcome::Real,
        CoreOutcome::Custom,
        CoreOutcome::Random,
        CoreOutcome::Empty,
    ];

    #[test]
    fn test_from_bits_accepts_single_bits_only() {
        assert_eq!(OptionFlag::from_bits(0).unwrap(), None);
        for flag in OptionFlag::ALL {
            assert_eq!(OptionFlag::from_bits(flag.bit()).unwrap(), Some(flag));
        }

        let both = OptionFlag::Allow.bit() | OptionFlag::Deny.bit();
        assert!(matches!(
            OptionFlag::from_bits(both),
            Err(Error::InvalidSelection { bits }) if bits == both
        ));
        assert!(matches!(
            OptionFlag::from_bits(1 << 7),
            Err(Error::InvalidSelection { .. })
        ));
    }

    #[test]
    fn test_from_bits_rejects_every_multi_bit_pattern() {
        for bits in 0u32..(1 << 7) {
            let result = OptionFlag::from_bits(bits);
            assert_eq!(result.is_ok(), bits.count_ones() <= 1, "bits {bits:#b}");
        }
    }

    #[test]
    fn test_bits_are_distinct_powers_of_two() {
        let mut seen = OptionFlags::empty();
        for flag in OptionFlag::ALL {
            assert_eq!(flag.bit().count_ones(), 1);
            assert!(!seen.contains(flag.flags()));
            seen |= flag.flags();
        }
        assert_eq!(seen, OptionFlags::all());
    }

    #[test]
    fn test_labels_parse_back() {
        for flag in OptionFlag::ALL {
            assert_eq!(flag.label().parse::<OptionFlag>().unwrap(), flag);
        }
        assert!(matches!(
            "maybe".parse::<OptionFlag>(),
            Err(Error::UnknownOption(label)) if label == "maybe"
        ));
    }

    #[test]
    fn test_real_prefers_allow() {
        let mask = OptionFlags::ALLOW | OptionFlags::CUSTOM | OptionFlags::RANDOM | OptionFlags::DENY;
        assert_eq!(core_outcome_to_option(0, mask).unwrap(), OptionFlag::Allow);

        let both = OptionFlags::ALLOW | OptionFlags::YES;
        assert_eq!(core_outcome_to_option(0, both).unwrap(), OptionFlag::Allow);
    }

    #[test]
    fn test_real_falls_back_to_yes() {
        let mask = OptionFlags::YES | OptionFlags::CUSTOMLOCATION | OptionFlags::RANDOM | OptionFlags::NO;
        assert_eq!(core_outcome_to_option(0, mask).unwrap(), OptionFlag::Yes);
        assert_eq!(core_outcome_to_option(1, mask).unwrap(), OptionFlag::CustomLocation);
        assert_eq!(core_outcome_to_option(2, mask).unwrap(), OptionFlag::Random);
        assert_eq!(core_outcome_to_option(3, mask).unwrap(), OptionFlag::No);
    }

    #[test]
    fn test_unsupported_outcome() {
        let mask = OptionFlags::ALLOW | OptionFlags::DENY;
        assert!(matches!(
            core_outcome_to_option(2, mask),
            Err(Error::UnsupportedOutcome { outcome: 2, supported }) if supported == mask
        ));
        assert!(matches!(
            core_outcome_to_option(1, mask),
            Err(Error::UnsupportedOutcome { outcome: 1, .. })
        ));
    }

    #[test]
    fn test_unrecognized_outcome() {
        assert!(matches!(
            core_outcome_to_option(4, OptionFlags::all()),
            Err(Error::UnrecognizedOutcome(4))
        ));
        assert!(matches!(
            core_outcome_to_option(255, OptionFlags::all()),
            Err(Error::UnrecognizedOutcome(255))
        ));
    }

    #[test]
    fn test_option_for_respects_mask_for_every_mask() {
        for outcome in OUTCOMES {
            for raw in 0u32..(1 << 7) {
                let mask = OptionFlags::from_bits_truncate(raw);
                match outcome.option_for(mask) {
                    Ok(flag) => {
                        assert!(outcome.candidates().contains(&flag));
                        assert!(mask.contains(flag.flags()));
                        // Every higher-priority candidate must be unsupported
                        for earlier in outcome.candidates().iter().take_while(|c| **c != flag) {
                            assert!(!mask.contains(earlier.flags()));
                        }
                    }
                    Err(Error::UnsupportedOutcome { .. }) => {
                        assert!(outcome
                            .candidates()
                            .iter()
                            .all(|c| !mask.contains(c.flags())));
                    }
                    Err(other) => panic!("unexpected error {other}"),
                }
            }
        }
    }

    #[test]
    fn test_option_round_trips_through_core_outcome() {
        for flag in OptionFlag::ALL {
            let outcome = flag.core_outcome();
            assert!(outcome.candidates().contains(&flag));
            assert_eq!(outcome.option_for(flag.flags()).unwrap(), flag);
        }

        // ALLOW outranks YES when both are supported
        let mask = OptionFlags::ALLOW | OptionFlags::YES;
        let outcome = OptionFlag::Yes.core_outcome();
        assert_eq!(outcome.option_for(mask).unwrap(), OptionFlag::Allow);
    }

    #[test]
    fn test_inverse_mapping() {
        assert_eq!(OptionFlag::Allow.core_outcome(), CoreOutcome::Real);
        assert_eq!(OptionFlag::Yes.core_outcome(), CoreOutcome::Real);
        assert_eq!(OptionFlag::Custom.core_outcome(), CoreOutcome::Custom);
        assert_eq!(OptionFlag::CustomLocation.core_outcome(), CoreOutcome::Custom);
        assert_eq!(OptionFlag::Random.core_outcome(), CoreOutcome::Random);
        assert_eq!(OptionFlag::Deny.core_outcome(), CoreOutcome::Empty);
        assert_eq!(OptionFlag::No.core_outcome(), CoreOutcome::Empty);
    }
}
