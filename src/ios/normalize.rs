//! Small text normalisers shared by the IOS commands.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Interface type names and abbreviations with their canonical short form.
///
/// The canonical forms need not be what IOS shows in any particular place;
/// they only have to be consistent so interfaces can be matched up.
const INTERFACE_CANONICALS: &[(&str, &str)] = &[
    ("ethernet", "Eth"),
    ("fastethernet", "Fa"),
    ("gigabitethernet", "Gi"),
    ("tengigabitethernet", "Te"),
    ("fortygigabitethernet", "Fo"),
    ("port-channel", "Po"),
    ("vl", "Vlan"),
];

/// Splits a lower-cased interface name into type and number.
static INTERFACE_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([-a-z]+) ?([0-9/.]*)$").expect("Invalid interface name regex")
});

/// Tags IOS accepts for a VLAN.
pub const VLAN_TAGS: RangeInclusive<u32> = 1..=4094;

/// Parse a single VLAN tag, rejecting anything outside [`VLAN_TAGS`].
pub fn vlan_tag(tag: &str) -> Result<u32> {
    tag.trim()
        .parse::<u32>()
        .ok()
        .filter(|tag| VLAN_TAGS.contains(tag))
        .ok_or_else(|| Error::InvalidTagList(tag.to_string()))
}

/// Expand a tag list such as `"1,3-5"` into `{1, 3, 4, 5}`.
///
/// Only the first two bounds of an item count, so `1-2-3` is `1-2`. An
/// empty item or bound, or a tag outside [`VLAN_TAGS`], makes the whole
/// list invalid.
pub fn expand_set(list: &str) -> Result<BTreeSet<u32>> {
    let mut tags = BTreeSet::new();

    let parse = |tag: &str| vlan_tag(tag).map_err(|_| Error::InvalidTagList(list.to_string()));

    for item in list.split(',') {
        let mut bounds = item.split('-');
        let low = parse(bounds.next().unwrap_or_default())?;
        match bounds.next() {
            None => {
                tags.insert(low);
            }
            Some(high) => {
                tags.extend(low..=parse(high)?);
            }
        }
    }

    Ok(tags)
}

/// Canonicalise an interface name so shorthand and case variants agree.
///
/// The type is replaced by its canonical abbreviation (or left as typed if
/// it has none) and given an initial capital; e.g. `GigabitEthernet0/1`,
/// `gi0/1` and `Gi 0/1` all become `Gi0/1`. Names that do not look like
/// `<type><number>` are returned unchanged.
pub fn interface_name(name: &str) -> String {
    let lower = name.to_lowercase();

    let Some(caps) = INTERFACE_NAME_REGEX.captures(&lower) else {
        return name.to_string();
    };

    let kind = &caps[1];
    let number = &caps[2];
    let kind = INTERFACE_CANONICALS
        .iter()
        .find(|(alias, _)| *alias == kind)
        .map_or(kind, |(_, canonical)| *canonical);

    format!("{}{}", capitalize(kind), number)
}

/// Upper-case the first character and lower-case the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_set() {
        let tags = expand_set("1,3-5,10").unwrap();
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec![1, 3, 4, 5, 10]);
    }

    #[test]
    fn test_expand_set_rejects_garbage() {
        assert!(expand_set("1,x").is_err());
        assert!(expand_set("10-").is_err());
        assert!(expand_set("1,,2").is_err());
    }

    #[test]
    fn test_expand_set_extra_bounds_ignored() {
        let tags = expand_set("1-2-3").unwrap();
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_tags_outside_vlan_range() {
        assert!(expand_set("1-4294967295").is_err());
        assert!(expand_set("0,5").is_err());
        assert!(vlan_tag("99999999999").is_err());
        assert_eq!(vlan_tag("4094").unwrap(), 4094);
        assert_eq!(vlan_tag("010").unwrap(), 10);
    }

    #[test]
    fn test_interface_aliases() {
        assert_eq!(interface_name("GigabitEthernet0/1"), "Gi0/1");
        assert_eq!(interface_name("gi0/1"), "Gi0/1");
        assert_eq!(interface_name("Gi 0/1"), "Gi0/1");
        assert_eq!(interface_name("TenGigabitEthernet1/0/1.100"), "Te1/0/1.100");
        assert_eq!(interface_name("Port-channel10"), "Po10");
        assert_eq!(interface_name("vl100"), "Vlan100");
        assert_eq!(interface_name("Vlan100"), "Vlan100");
        assert_eq!(interface_name("LOOPBACK0"), "Loopback0");
    }

    #[test]
    fn test_unrecognised_names_kept() {
        assert_eq!(interface_name("Serial0/0:1"), "Serial0/0:1");
    }
}
