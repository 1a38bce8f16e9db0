//! The configuration tree built by a parse.
//!
//! A [`ConfigTree`] maps top-level section keys (`interfaces`, `acl4-std`,
//! `route4`, ...) to [`Value`]s. Object sections hold a [`Map`] keyed by the
//! object identifier whose values are themselves attribute maps.
//!
//! Nothing is created up front: sections, objects and attributes come into
//! existence on first reference, so a missing key means "not configured",
//! never "empty".

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;

/// Ordered string-keyed mapping used at every level of the tree.
pub type Map = IndexMap<String, Value>;

/// A node in the configuration tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// A single scalar setting
    Str(String),
    /// A fixed group of related scalars, e.g. address and netmask
    Tuple(Vec<String>),
    /// Unordered collection of strings
    Set(BTreeSet<String>),
    /// Unordered collection of numbers (VLAN tags)
    NumSet(BTreeSet<u32>),
    /// Collection where entry order is significant (ACLs, prefix-lists)
    List(Vec<String>),
    /// Nested mapping
    Map(Map),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::NumSet(_) => "number set",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[String]> {
        match self {
            Value::Tuple(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_num_set(&self) -> Option<&BTreeSet<u32>> {
        match self {
            Value::NumSet(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<String>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Number of members for collections, 1 for scalars and tuples.
    pub fn len(&self) -> usize {
        match self {
            Value::Str(_) | Value::Tuple(_) => 1,
            Value::Set(s) => s.len(),
            Value::NumSet(s) => s.len(),
            Value::List(l) => l.len(),
            Value::Map(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn conflict(key: &str, expected: &'static str, found: &Value) -> Error {
    Error::TypeConflict {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}

/// Get the map stored under `key`, creating it if absent.
pub fn map_entry<'a>(map: &'a mut Map, key: &str) -> Result<&'a mut Map> {
    match map
        .entry(key.to_string())
        .or_insert_with(|| Value::Map(Map::new()))
    {
        Value::Map(m) => Ok(m),
        other => Err(conflict(key, "map", other)),
    }
}

/// Get the string set stored under `key`, creating it if absent.
pub fn set_entry<'a>(map: &'a mut Map, key: &str) -> Result<&'a mut BTreeSet<String>> {
    match map
        .entry(key.to_string())
        .or_insert_with(|| Value::Set(BTreeSet::new()))
    {
        Value::Set(s) => Ok(s),
        other => Err(conflict(key, "set", other)),
    }
}

/// Get the number set stored under `key`, creating it if absent.
pub fn num_set_entry<'a>(map: &'a mut Map, key: &str) -> Result<&'a mut BTreeSet<u32>> {
    match map
        .entry(key.to_string())
        .or_insert_with(|| Value::NumSet(BTreeSet::new()))
    {
        Value::NumSet(s) => Ok(s),
        other => Err(conflict(key, "number set", other)),
    }
}

/// Get the ordered list stored under `key`, creating it if absent.
pub fn list_entry<'a>(map: &'a mut Map, key: &str) -> Result<&'a mut Vec<String>> {
    match map
        .entry(key.to_string())
        .or_insert_with(|| Value::List(Vec::new()))
    {
        Value::List(l) => Ok(l),
        other => Err(conflict(key, "list", other)),
    }
}

/// Walk (creating as needed) a chain of nested maps.
pub fn path_entry<'a>(mut map: &'a mut Map, path: &[&str]) -> Result<&'a mut Map> {
    for key in path {
        map = map_entry(map, key)?;
    }
    Ok(map)
}

/// The structured result of parsing one configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfigTree {
    root: Map,
}

impl ConfigTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level mapping.
    pub fn root(&self) -> &Map {
        &self.root
    }

    /// Mutable top-level mapping, for action callbacks.
    pub fn root_mut(&mut self) -> &mut Map {
        &mut self.root
    }

    /// Look up a top-level section.
    pub fn get(&self, section: &str) -> Option<&Value> {
        self.root.get(section)
    }

    /// Look up one object (interface, VLAN, ACL, ...) within a section.
    pub fn object(&self, section: &str, id: &str) -> Option<&Value> {
        self.get(section)?.as_map()?.get(id)
    }

    /// Look up one attribute of an object.
    pub fn attribute(&self, section: &str, id: &str, attr: &str) -> Option<&Value> {
        self.object(section, id)?.as_map()?.get(attr)
    }

    /// Names of the top-level sections present, in creation order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    /// Copy of this tree holding only the named top-level sections.
    pub fn select<S: AsRef<str>>(&self, sections: &[S]) -> ConfigTree {
        let root = self
            .root
            .iter()
            .filter(|(k, _)| sections.iter().any(|s| s.as_ref() == k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        ConfigTree { root }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_created_lazily() {
        let mut tree = ConfigTree::new();
        assert!(tree.get("interfaces").is_none());

        let intf = path_entry(tree.root_mut(), &["interfaces", "Gi0/1"]).unwrap();
        set_entry(intf, "options").unwrap().insert("shutdown".into());

        assert_eq!(tree.sections().collect::<Vec<_>>(), vec!["interfaces"]);
        let opts = tree.attribute("interfaces", "Gi0/1", "options").unwrap();
        assert!(opts.as_set().unwrap().contains("shutdown"));
        assert!(tree.object("interfaces", "Gi0/2").is_none());
    }

    #[test]
    fn test_type_conflict_is_reported() {
        let mut map = Map::new();
        map.insert("description".into(), Value::Str("uplink".into()));

        let err = set_entry(&mut map, "description").unwrap_err();
        assert!(matches!(
            err,
            Error::TypeConflict { expected: "set", found: "string", .. }
        ));
    }

    #[test]
    fn test_select_sections() {
        let mut tree = ConfigTree::new();
        num_set_entry(tree.root_mut(), "no-stp").unwrap().insert(10);
        list_entry(path_entry(tree.root_mut(), &["acl6"]).unwrap(), "V6")
            .unwrap()
            .push("permit ipv6 any any".into());

        let only = tree.select(&["acl6"]);
        assert_eq!(only.sections().collect::<Vec<_>>(), vec!["acl6"]);
        assert_eq!(tree.get("no-stp").unwrap().len(), 1);
    }

    #[test]
    fn test_serialises_untagged() {
        let mut tree = ConfigTree::new();
        let intf = path_entry(tree.root_mut(), &["interfaces", "Gi0/1"]).unwrap();
        intf.insert(
            "ip-address".into(),
            Value::Tuple(vec!["10.0.0.1".into(), "255.255.255.0".into()]),
        );

        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "interfaces": { "Gi0/1": { "ip-address": ["10.0.0.1", "255.255.255.0"] } }
            })
        );
    }
}
