//! String id → dense index lookup.
//!
//! Ids are always compared as strings so `"7"` from one file and `7` from
//! another resolve to the same node. The table is built once per network;
//! resolving a pipe endpoint is a single hash lookup.

use std::collections::HashMap;

use wn_core::Id;

#[derive(Debug, Clone, Default)]
pub struct IdLookup {
    map: HashMap<String, Id>,
}

impl IdLookup {
    /// Build from ids in dense order; returns the first repeated id on collision.
    pub fn from_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Result<Self, String> {
        let mut map = HashMap::new();
        for (i, id) in ids.into_iter().enumerate() {
            if map.insert(id.to_string(), Id::from_usize(i)).is_some() {
                return Err(id.to_string());
            }
        }
        Ok(Self { map })
    }

    pub fn get(&self, id: &str) -> Option<Id> {
        self.map.get(id.trim()).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_positional() {
        let lookup = IdLookup::from_ids(["A", "B", "7"]).unwrap();
        assert_eq!(lookup.get("B"), Some(Id::from_index(1)));
        assert_eq!(lookup.get(" 7 "), Some(Id::from_index(2)));
        assert!(!lookup.contains("C"));
        assert_eq!(lookup.len(), 3);
    }

    #[test]
    fn duplicate_id_is_returned() {
        assert_eq!(IdLookup::from_ids(["A", "B", "A"]).unwrap_err(), "A");
    }
}
