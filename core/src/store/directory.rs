//! Directory store: typed site records on top of a `Backend`.
//!
//! The store validates field names and coerces raw tokens against the
//! schema, canonicalises primary keys, and expresses every mutation as one
//! atomic backend primitive. Value normalization (uppercasing) is the
//! caller's job; see `Dispatcher`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::Value;

use crate::errors::StoreError;
use crate::schema::{FieldValue, SchemaRegistry, ValueKind, KEY_FIELD};

use super::backend::{Backend, Document};


/// Outcome of a mutation aimed at a record that may not exist.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<T> {
    /// The record existed and the operation ran.
    Applied(T),
    /// No record with that name; nothing was touched.
    Skipped,
}

impl<T> Mutation<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Mutation::Skipped)
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Mutation::Applied(v) => Some(v),
            Mutation::Skipped => None,
        }
    }
}


/// A site as read back from the backend, decoded against the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteRecord {
    pub name: String,
    pub values: BTreeMap<String, FieldValue>,
}

impl SiteRecord {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    /// Decode a document. Unknown columns and values that do not match
    /// their declared kind are dropped.
    pub fn from_document(doc: &Document, schema: &SchemaRegistry) -> Option<SiteRecord> {
        let name = doc.get(KEY_FIELD)?.as_str()?.to_string();
        let values = schema
            .fields()
            .iter()
            .filter(|f| f.name != KEY_FIELD)
            .filter_map(|f| {
                let raw = doc.get(&f.name)?;
                FieldValue::from_json(f.kind, raw).map(|v| (f.name.clone(), v))
            })
            .collect();
        Some(SiteRecord { name, values })
    }
}


pub struct DirectoryStore {
    schema: Arc<SchemaRegistry>,
    backend: Box<dyn Backend>,
}

impl DirectoryStore {
    pub fn new(schema: Arc<SchemaRegistry>, backend: Box<dyn Backend>) -> Self {
        DirectoryStore { schema, backend }
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// Swap in a new schema over the same backend. Documents are decoded
    /// against whichever schema is current.
    pub fn set_schema(&mut self, schema: Arc<SchemaRegistry>) {
        self.schema = schema;
    }

    /// Create a record holding only its primary key. Returns the canonical
    /// name that was stored.
    pub fn add_site(&self, name: &str) -> Result<String, StoreError> {
        let key = self.schema.normalize_key(name);
        let mut doc = Document::new();
        doc.insert(KEY_FIELD.to_string(), Value::String(key.clone()));
        if !self.backend.insert_new(&key, doc)? {
            return Err(StoreError::AlreadyExists { name: key });
        }
        tracing::debug!(site = %key, "site added");
        Ok(key)
    }

    pub fn get_site(&self, name: &str) -> Result<Option<SiteRecord>, StoreError> {
        let key = self.schema.normalize_key(name);
        Ok(self
            .backend
            .get(&key)?
            .and_then(|doc| SiteRecord::from_document(&doc, &self.schema)))
    }

    /// All site names, ascending.
    pub fn list_sites(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.backend.keys()?)
    }

    /// Overwrite one attribute with the coerced value of `raw`.
    pub fn set_value(
        &self,
        name: &str,
        field: &str,
        raw: &[String],
    ) -> Result<Mutation<FieldValue>, StoreError> {
        let kind = self.kind_of(field)?;
        if field == KEY_FIELD {
            return Err(StoreError::ReadOnlyField { field: field.to_string() });
        }
        let value = coerce(field, kind, raw)?;
        let encoded = value.to_json();

        let key = self.schema.normalize_key(name);
        let updated = self.backend.update(&key, &|doc: &mut Document| {
            doc.insert(field.to_string(), encoded.clone());
        })?;
        Ok(self.finish("set", &key, field, updated.map(|_| value)))
    }

    /// Union `values` into a set attribute, creating it if unset. Returns
    /// the full resulting set.
    pub fn add_value(
        &self,
        name: &str,
        field: &str,
        values: &[String],
    ) -> Result<Mutation<BTreeSet<String>>, StoreError> {
        if !self.kind_of(field)?.is_set() {
            return Err(StoreError::NotASet { field: field.to_string() });
        }
        let key = self.schema.normalize_key(name);
        let updated = self.backend.update(&key, &|doc: &mut Document| {
            let mut members = members_of(doc, field);
            members.extend(values.iter().cloned());
            doc.insert(field.to_string(), set_to_json(&members));
        })?;
        let result = updated.map(|doc| members_of(&doc, field));
        Ok(self.finish("add", &key, field, result))
    }

    /// Remove `values` from a set attribute. Members that are not present
    /// are ignored. On scalar fields this leaves the value untouched.
    /// Returns the attribute as it stands afterwards.
    pub fn remove_value(
        &self,
        name: &str,
        field: &str,
        values: &[String],
    ) -> Result<Mutation<Option<FieldValue>>, StoreError> {
        let kind = self.kind_of(field)?;
        let key = self.schema.normalize_key(name);

        let doc = if kind.is_set() {
            self.backend.update(&key, &|doc: &mut Document| {
                let mut members = members_of(doc, field);
                for v in values {
                    members.remove(v);
                }
                doc.insert(field.to_string(), set_to_json(&members));
            })?
        } else {
            self.backend.get(&key)?
        };
        let result = doc.map(|doc| doc.get(field).and_then(|v| FieldValue::from_json(kind, v)));
        Ok(self.finish("remove", &key, field, result))
    }

    /// Delete a record. Returns 1 if it existed, 0 otherwise.
    pub fn delete_site(&self, name: &str) -> Result<usize, StoreError> {
        let key = self.schema.normalize_key(name);
        let deleted = self.backend.delete(&key)?;
        tracing::debug!(site = %key, deleted, "site delete");
        Ok(deleted)
    }

    /// Records whose `field` matches `raw`, sorted by name. Set fields match
    /// on membership of the joined value, scalars on equality after
    /// coercion.
    pub fn search(&self, field: &str, raw: &[String]) -> Result<Vec<SiteRecord>, StoreError> {
        let kind = self.kind_of(field)?;
        let wanted = if kind.is_set() {
            FieldValue::Text(raw.join(" "))
        } else {
            coerce(field, kind, raw)?
        };

        let mut matches: Vec<SiteRecord> = self
            .backend
            .scan()?
            .iter()
            .filter_map(|doc| SiteRecord::from_document(doc, &self.schema))
            .filter(|record| matches_value(record, field, &wanted))
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matches)
    }

    fn kind_of(&self, field: &str) -> Result<ValueKind, StoreError> {
        self.schema
            .field_kind(field)
            .ok_or_else(|| StoreError::InvalidField { field: field.to_string() })
    }

    fn finish<T>(&self, op: &str, key: &str, field: &str, result: Option<T>) -> Mutation<T> {
        match result {
            Some(v) => {
                tracing::debug!(site = %key, field, op, "attribute updated");
                Mutation::Applied(v)
            }
            None => {
                tracing::warn!(site = %key, field, op, "site absent, skipped");
                Mutation::Skipped
            }
        }
    }
}


fn coerce(field: &str, kind: ValueKind, raw: &[String]) -> Result<FieldValue, StoreError> {
    kind.coerce(raw).map_err(|expected| StoreError::InvalidType {
        field: field.to_string(),
        expected,
    })
}

fn members_of(doc: &Document, field: &str) -> BTreeSet<String> {
    doc.get(field)
        .and_then(|v| FieldValue::from_json(ValueKind::StringSet, v))
        .and_then(|v| match v {
            FieldValue::Set(members) => Some(members),
            _ => None,
        })
        .unwrap_or_default()
}

fn set_to_json(members: &BTreeSet<String>) -> Value {
    Value::Array(members.iter().cloned().map(Value::String).collect())
}

fn matches_value(record: &SiteRecord, field: &str, wanted: &FieldValue) -> bool {
    if field == KEY_FIELD {
        return matches!(wanted, FieldValue::Text(w) if *w == record.name);
    }
    match (record.get(field), wanted) {
        (Some(FieldValue::Set(members)), FieldValue::Text(w)) => members.contains(w),
        (Some(value), wanted) => value == wanted,
        (None, _) => false,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::default_settings;
    use crate::store::memory::MemoryBackend;
    use crate::store::sqlite::SqliteBackend;

    fn store() -> DirectoryStore {
        let schema = SchemaRegistry::from_settings(&default_settings()).unwrap();
        DirectoryStore::new(Arc::new(schema), Box::new(MemoryBackend::new()))
    }

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn add_then_get() {
        let s = store();
        assert_eq!(s.add_site("foo").unwrap(), "FOO");
        let rec = s.get_site("Foo").unwrap().unwrap();
        assert_eq!(rec.name, "FOO");
        assert!(rec.values.is_empty());
    }

    #[test]
    fn re_adding_fails_with_already_exists() {
        let s = store();
        s.add_site("foo").unwrap();
        let err = s.add_site("foo").unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { name } if name == "FOO"));
    }

    #[test]
    fn get_missing_is_none() {
        assert!(store().get_site("nope").unwrap().is_none());
    }

    #[test]
    fn list_is_sorted_for_any_insertion_order() {
        let s = store();
        for n in ["delta", "alpha", "charlie", "bravo"] {
            s.add_site(n).unwrap();
        }
        assert_eq!(s.list_sites().unwrap(), vec!["ALPHA", "BRAVO", "CHARLIE", "DELTA"]);
    }

    #[test]
    fn set_value_round_trip_and_idempotent() {
        let s = store();
        s.add_site("foo").unwrap();
        let first = s.set_value("foo", "speed", &toks(&["100"])).unwrap();
        assert_eq!(first, Mutation::Applied(FieldValue::Integer(100)));
        let again = s.set_value("foo", "speed", &toks(&["100"])).unwrap();
        assert_eq!(again, first);
        let rec = s.get_site("foo").unwrap().unwrap();
        assert_eq!(rec.get("speed"), Some(&FieldValue::Integer(100)));
    }

    #[test]
    fn set_value_replaces_whole_set() {
        let s = store();
        s.add_site("foo").unwrap();
        s.add_value("foo", "users", &toks(&["a", "b"])).unwrap();
        s.set_value("foo", "users", &toks(&["c"])).unwrap();
        let rec = s.get_site("foo").unwrap().unwrap();
        assert_eq!(rec.get("users").unwrap().members(), Some(&set(&["c"])));
    }

    #[test]
    fn set_value_bad_integer_is_invalid_type() {
        let s = store();
        s.add_site("foo").unwrap();
        let err = s.set_value("foo", "speed", &toks(&["abc"])).unwrap_err();
        assert!(matches!(err, StoreError::InvalidType { expected: "integer", .. }));
    }

    #[test]
    fn unknown_field_is_invalid_before_coercion() {
        let s = store();
        let err = s.set_value("missing", "bogus", &toks(&["x"])).unwrap_err();
        assert!(matches!(err, StoreError::InvalidField { field } if field == "bogus"));
        assert!(matches!(
            s.search("bogus", &toks(&["x"])),
            Err(StoreError::InvalidField { .. })
        ));
    }

    #[test]
    fn set_value_on_missing_site_is_skipped() {
        let s = store();
        let out = s.set_value("ghost", "comment", &toks(&["hi", "there"])).unwrap();
        assert!(out.is_skipped());
        assert!(s.list_sites().unwrap().is_empty());
    }

    #[test]
    fn primary_key_is_read_only() {
        let s = store();
        s.add_site("foo").unwrap();
        let err = s.set_value("foo", "name", &toks(&["bar"])).unwrap_err();
        assert!(matches!(err, StoreError::ReadOnlyField { .. }));
    }

    #[test]
    fn add_value_is_set_union() {
        let s = store();
        s.add_site("foo").unwrap();
        s.add_value("foo", "users", &toks(&["user1", "user2"])).unwrap();
        let out = s.add_value("foo", "users", &toks(&["user1", "user3"])).unwrap();
        assert_eq!(out, Mutation::Applied(set(&["user1", "user2", "user3"])));
    }

    #[test]
    fn add_value_order_does_not_matter() {
        let a = store();
        let b = store();
        for s in [&a, &b] {
            s.add_site("foo").unwrap();
            s.add_value("foo", "users", &toks(&["x"])).unwrap();
        }
        let left = a.add_value("foo", "users", &toks(&["p", "q", "r"])).unwrap();
        let right = b.add_value("foo", "users", &toks(&["r", "q", "p", "p"])).unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn add_value_on_scalar_is_rejected() {
        let s = store();
        s.add_site("foo").unwrap();
        let err = s.add_value("foo", "speed", &toks(&["1"])).unwrap_err();
        assert!(matches!(err, StoreError::NotASet { .. }));
    }

    #[test]
    fn add_value_on_missing_site_is_skipped() {
        let s = store();
        assert!(s.add_value("ghost", "users", &toks(&["a"])).unwrap().is_skipped());
    }

    #[test]
    fn remove_value_absent_member_is_noop() {
        let s = store();
        s.add_site("foo").unwrap();
        s.add_value("foo", "users", &toks(&["a", "b"])).unwrap();
        let out = s.remove_value("foo", "users", &toks(&["zzz"])).unwrap();
        assert_eq!(out, Mutation::Applied(Some(FieldValue::Set(set(&["a", "b"])))));
    }

    #[test]
    fn remove_all_members_leaves_empty_set() {
        let s = store();
        s.add_site("foo").unwrap();
        s.add_value("foo", "users", &toks(&["a", "b"])).unwrap();
        let out = s.remove_value("foo", "users", &toks(&["a", "b"])).unwrap();
        assert_eq!(out, Mutation::Applied(Some(FieldValue::Set(BTreeSet::new()))));
    }

    #[test]
    fn remove_on_scalar_leaves_value() {
        let s = store();
        s.add_site("foo").unwrap();
        s.set_value("foo", "speed", &toks(&["10"])).unwrap();
        let out = s.remove_value("foo", "speed", &toks(&["10"])).unwrap();
        assert_eq!(out, Mutation::Applied(Some(FieldValue::Integer(10))));
    }

    #[test]
    fn remove_on_missing_site_is_skipped() {
        let s = store();
        let out = s.remove_value("missing", "users", &toks(&["user1"])).unwrap();
        assert!(out.is_skipped());
        let scalar = s.remove_value("missing", "speed", &toks(&["1"])).unwrap();
        assert!(scalar.is_skipped());
    }

    #[test]
    fn delete_reports_existence() {
        let s = store();
        s.add_site("foo").unwrap();
        assert_eq!(s.delete_site("FOO").unwrap(), 1);
        assert_eq!(s.delete_site("foo").unwrap(), 0);
    }

    #[test]
    fn search_on_empty_store_is_empty() {
        assert!(store().search("country", &toks(&["SE"])).unwrap().is_empty());
    }

    #[test]
    fn search_matches_set_membership_and_scalars() {
        let s = store();
        for n in ["zulu", "alpha", "mike"] {
            s.add_site(n).unwrap();
        }
        s.add_value("zulu", "affils", &toks(&["GRP"])).unwrap();
        s.add_value("alpha", "affils", &toks(&["GRP", "OTHER"])).unwrap();
        s.set_value("mike", "speed", &toks(&["100"])).unwrap();
        s.set_value("alpha", "speed", &toks(&["100"])).unwrap();

        let names = |recs: Vec<SiteRecord>| recs.into_iter().map(|r| r.name).collect::<Vec<_>>();
        assert_eq!(names(s.search("affils", &toks(&["GRP"])).unwrap()), vec!["ALPHA", "ZULU"]);
        assert_eq!(names(s.search("speed", &toks(&["100"])).unwrap()), vec!["ALPHA", "MIKE"]);
        assert!(s.search("affils", &toks(&["grp"])).unwrap().is_empty());
        assert_eq!(names(s.search("name", &toks(&["MIKE"])).unwrap()), vec!["MIKE"]);
    }

    #[test]
    fn search_bad_number_is_invalid_type() {
        let s = store();
        assert!(matches!(
            s.search("size", &toks(&["big"])),
            Err(StoreError::InvalidType { expected: "float", .. })
        ));
    }

    #[test]
    fn concurrent_unions_keep_every_member() {
        let s = Arc::new(store());
        s.add_site("foo").unwrap();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let s = Arc::clone(&s);
                std::thread::spawn(move || {
                    for j in 0..25 {
                        s.add_value("foo", "users", &[format!("u{}-{}", i, j)]).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let rec = s.get_site("foo").unwrap().unwrap();
        assert_eq!(rec.get("users").unwrap().members().unwrap().len(), 200);
    }

    #[test]
    fn set_operations_and_search_over_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let backend = SqliteBackend::open(&dir.path().join("sites.db")).unwrap();
        let schema = SchemaRegistry::from_settings(&default_settings()).unwrap();
        let s = DirectoryStore::new(Arc::new(schema), Box::new(backend));

        for n in ["foo", "bar"] {
            s.add_site(n).unwrap();
        }
        assert!(matches!(s.add_site("foo"), Err(StoreError::AlreadyExists { .. })));

        s.add_value("foo", "users", &toks(&["user1", "user2"])).unwrap();
        let users = s.add_value("foo", "users", &toks(&["user1", "user3"])).unwrap().applied();
        assert_eq!(users, Some(set(&["user1", "user2", "user3"])));

        let left = s.remove_value("foo", "users", &toks(&["user2", "nobody"])).unwrap();
        assert_eq!(left.applied(), Some(Some(FieldValue::Set(set(&["user1", "user3"])))));
        assert!(s.remove_value("ghost", "users", &toks(&["user1"])).unwrap().is_skipped());

        s.add_value("bar", "users", &toks(&["user3"])).unwrap();
        s.set_value("bar", "speed", &toks(&["100"])).unwrap();
        let names = |recs: Vec<SiteRecord>| recs.into_iter().map(|r| r.name).collect::<Vec<_>>();
        assert_eq!(names(s.search("users", &toks(&["user3"])).unwrap()), vec!["BAR", "FOO"]);
        assert_eq!(names(s.search("speed", &toks(&["100"])).unwrap()), vec!["BAR"]);
        assert_eq!(s.list_sites().unwrap(), vec!["BAR", "FOO"]);

        assert_eq!(s.delete_site("bar").unwrap(), 1);
        assert_eq!(s.list_sites().unwrap(), vec!["FOO"]);
    }
}
