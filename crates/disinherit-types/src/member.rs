//! Members and ordered member tables.
//!
//! A member table maps a name to its definition and keeps declaration
//! order, the way a class body lists its attributes. Filtering a table
//! never touches the source; it yields a new table.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// What a member is. Purely descriptive, the engine never looks at it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    #[default]
    Method,
    Property,
    Attribute,
    /// A lookup or lifecycle hook such as a catch-all attribute resolver.
    Hook,
}

/// A member definition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub kind: MemberKind,

    /// Opaque definition data supplied by the host.
    #[serde(default)]
    pub value: serde_json::Value,
}

impl Member {
    pub fn new(kind: MemberKind, value: serde_json::Value) -> Self {
        Member { kind, value }
    }

    pub fn method() -> Self {
        Member::new(MemberKind::Method, serde_json::Value::Null)
    }

    pub fn property() -> Self {
        Member::new(MemberKind::Property, serde_json::Value::Null)
    }

    pub fn attribute(value: impl Into<serde_json::Value>) -> Self {
        Member::new(MemberKind::Attribute, value.into())
    }

    pub fn hook() -> Self {
        Member::new(MemberKind::Hook, serde_json::Value::Null)
    }
}

/// Insertion-ordered mapping from member name to definition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberTable {
    entries: IndexMap<String, Member>,
}

impl MemberTable {
    /// Create an empty table.
    pub fn new() -> Self {
        MemberTable {
            entries: IndexMap::new(),
        }
    }

    /// Insert a member, returning the previous definition under that name.
    /// A redefinition keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, member: Member) -> Option<Member> {
        self.entries.insert(name.into(), member)
    }

    pub fn get(&self, name: &str) -> Option<&Member> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Member names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Member)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Check whether any of `names` is declared in this table.
    pub fn declares_any<'a, I>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        names.into_iter().any(|name| self.contains(name))
    }

    /// Copy of this table with `names` removed. Remaining members keep
    /// their relative order.
    pub fn without<'a, I>(&self, names: I) -> MemberTable
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut entries = self.entries.clone();
        for name in names {
            entries.shift_remove(name);
        }
        MemberTable { entries }
    }
}

impl<S: Into<String>> FromIterator<(S, Member)> for MemberTable {
    fn from_iter<T: IntoIterator<Item = (S, Member)>>(iter: T) -> Self {
        MemberTable {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl From<IndexMap<String, Member>> for MemberTable {
    fn from(entries: IndexMap<String, Member>) -> Self {
        MemberTable { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemberTable {
        [
            ("__init__", Member::method()),
            ("__getattr__", Member::hook()),
            ("shape", Member::property()),
            ("columns", Member::attribute(serde_json::json!(["a", "b"]))),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_insertion_order_preserved() {
        let table = sample();
        let names: Vec<_> = table.names().collect();
        assert_eq!(names, vec!["__init__", "__getattr__", "shape", "columns"]);
    }

    #[test]
    fn test_without_removes_and_keeps_order() {
        let table = sample();
        let filtered = table.without(["__getattr__", "missing"]);

        assert_eq!(filtered.len(), 3);
        assert!(!filtered.contains("__getattr__"));
        let names: Vec<_> = filtered.names().collect();
        assert_eq!(names, vec!["__init__", "shape", "columns"]);

        // Source untouched
        assert!(table.contains("__getattr__"));
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_declares_any() {
        let table = sample();
        assert!(table.declares_any(["nope", "shape"]));
        assert!(!table.declares_any(["nope", "other"]));
        assert!(!table.declares_any(std::iter::empty()));
    }

    #[test]
    fn test_redefinition_keeps_position() {
        let mut table = sample();
        let old = table.insert("__getattr__", Member::method());
        assert_eq!(old, Some(Member::hook()));
        assert_eq!(table.names().nth(1), Some("__getattr__"));
        assert_eq!(table.get("__getattr__").map(|m| m.kind), Some(MemberKind::Method));
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{"m1": {}, "__getattr__": {"kind": "hook"}, "x": {"kind": "attribute", "value": 3}}"#;
        let table: MemberTable = serde_json::from_str(json).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.get("m1"), Some(&Member::method()));
        assert_eq!(table.get("__getattr__").unwrap().kind, MemberKind::Hook);
        assert_eq!(table.get("x").unwrap().value, serde_json::json!(3));
    }
}
