//! Path-based local edits to cached documents.
//!
//! Paths are dot-separated; purely numeric segments index into lists, e.g.
//! `days.0.activities.2.title`. Missing intermediate containers are created
//! (a list when the following segment is numeric, a map otherwise); existing
//! non-container values, `null` included, are never replaced along the way. A
//! list index may address an existing slot or append at the end, but not skip
//! ahead.

use serde_json::map::Entry;
use serde_json::{Map, Value};

use super::store::{CacheStore, PutOptions};
use crate::Error;

impl CacheStore {
    /// Set the value at `path` in a cached document and persist it.
    ///
    /// The edit is recorded in `partial_updates`. Returns `false` without
    /// touching the cache if the document is missing or the path does not fit
    /// its shape.
    pub async fn update_part(&self, id: &str, path: &str, value: Value) -> bool {
        match self.try_update_part(id, path, value).await {
            Ok(version) => {
                tracing::debug!(id, path, version, "applied partial update");
                true
            }
            Err(e) => {
                tracing::warn!(id, path, error = %e, "partial update rejected");
                false
            }
        }
    }

    async fn try_update_part(&self, id: &str, path: &str, value: Value) -> Result<u64, Error> {
        let mut document = self.try_get(id).await?.ok_or_else(|| Error::CacheMiss(id.to_string()))?;
        set_at_path(&mut document, path, value)?;
        let meta = self.write(id, &document, PutOptions::default(), Some(path)).await?;
        Ok(meta.version)
    }
}

/// Write `value` into `document` at a dotted `path`.
///
/// On error `document` may hold freshly created empty containers along the
/// path; callers edit a copy.
pub fn set_at_path(document: &mut Value, path: &str, value: Value) -> Result<(), Error> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(Error::InvalidPath(format!("empty segment in '{path}'")));
    }
    let Some((leaf, parents)) = segments.split_last() else {
        return Err(Error::InvalidPath("empty path".into()));
    };

    let mut current = document;
    for (i, segment) in parents.iter().enumerate() {
        let next_is_index = is_index(segments[i + 1]);
        let (slot, created) = slot_mut(current, segment, path)?;
        if created {
            *slot = if next_is_index { Value::Array(Vec::new()) } else { Value::Object(Map::new()) };
        }
        if !(slot.is_object() || slot.is_array()) {
            return Err(Error::InvalidPath(format!("'{segment}' in '{path}' is not a container")));
        }
        current = slot;
    }

    *slot_mut(current, leaf, path)?.0 = value;
    Ok(())
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Child slot for `segment`, and whether it was just inserted as `null`.
fn slot_mut<'a>(container: &'a mut Value, segment: &str, path: &str) -> Result<(&'a mut Value, bool), Error> {
    match container {
        Value::Object(map) => match map.entry(segment.to_string()) {
            Entry::Occupied(slot) => Ok((slot.into_mut(), false)),
            Entry::Vacant(slot) => Ok((slot.insert(Value::Null), true)),
        },
        Value::Array(items) => {
            let index: usize = segment
                .parse()
                .map_err(|_| Error::InvalidPath(format!("'{segment}' in '{path}' is not a list index")))?;
            if index > items.len() {
                return Err(Error::InvalidPath(format!(
                    "index {index} in '{path}' is past the end of a list of {}",
                    items.len()
                )));
            }
            let created = index == items.len();
            if created {
                items.push(Value::Null);
            }
            Ok((&mut items[index], created))
        }
        _ => Err(Error::InvalidPath(format!("cannot descend into '{segment}' of '{path}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn itinerary() -> Value {
        json!({"days": [{"activities": [{"title": "Old Title", "time": "09:00"}]}]})
    }

    #[tokio::test]
    async fn test_update_part_sets_leaf_and_records_path() {
        let clock = ManualClock::default();
        let cache = CacheStore::new(Arc::new(MemoryStore::new())).with_clock(Arc::new(clock.clone()));
        cache.put("trip-1", &itinerary(), PutOptions::default()).await;
        clock.advance(Duration::from_secs(10));

        assert!(cache.update_part("trip-1", "days.0.activities.0.title", json!("New Title")).await);

        let doc = cache.get("trip-1").await.unwrap();
        assert_eq!(doc["days"][0]["activities"][0]["title"], "New Title");
        assert_eq!(doc["days"][0]["activities"][0]["time"], "09:00");

        let meta = cache.get_metadata("trip-1").await.unwrap();
        assert_eq!(meta.partial_updates.get("days.0.activities.0.title"), Some(&clock.now_millis()));
        assert_eq!(meta.version, 2);
    }

    #[tokio::test]
    async fn test_update_part_missing_document() {
        let cache = CacheStore::new(Arc::new(MemoryStore::new()));
        assert!(!cache.update_part("nope", "title", json!("x")).await);
    }

    #[tokio::test]
    async fn test_update_part_bad_path_leaves_cache_untouched() {
        let cache = CacheStore::new(Arc::new(MemoryStore::new()));
        cache.put("trip-1", &itinerary(), PutOptions::default()).await;

        assert!(!cache.update_part("trip-1", "days.0.activities.0.title.text", json!("x")).await);

        assert_eq!(cache.get("trip-1").await, Some(itinerary()));
        let meta = cache.get_metadata("trip-1").await.unwrap();
        assert_eq!(meta.version, 1);
        assert!(meta.partial_updates.is_empty());
    }

    #[test]
    fn test_creates_intermediate_containers() {
        let mut doc = json!({});
        set_at_path(&mut doc, "days.0.activities.0.title", json!("Hike")).unwrap();
        assert_eq!(doc, json!({"days": [{"activities": [{"title": "Hike"}]}]}));

        set_at_path(&mut doc, "meta.tags.0", json!("outdoor")).unwrap();
        assert_eq!(doc["meta"], json!({"tags": ["outdoor"]}));
    }

    #[test]
    fn test_existing_null_is_not_a_container() {
        let mut doc = json!({"hotel": null, "days": [null]});

        let err = set_at_path(&mut doc, "hotel.name", json!("Ritz"));
        assert!(matches!(err, Err(Error::InvalidPath(_))));
        assert!(set_at_path(&mut doc, "days.0.title", json!("Arrive")).is_err());
        assert_eq!(doc, json!({"hotel": null, "days": [null]}));

        set_at_path(&mut doc, "hotel", json!({"name": "Ritz"})).unwrap();
        assert_eq!(doc["hotel"]["name"], "Ritz");
    }

    #[tokio::test]
    async fn test_update_part_through_null_leaves_cache_untouched() {
        let cache = CacheStore::new(Arc::new(MemoryStore::new()));
        let doc = json!({"hotel": null});
        cache.put("trip-1", &doc, PutOptions::default()).await;

        assert!(!cache.update_part("trip-1", "hotel.name", json!("Ritz")).await);

        assert_eq!(cache.get("trip-1").await, Some(doc));
        assert_eq!(cache.get_metadata("trip-1").await.unwrap().version, 1);
    }

    #[test]
    fn test_append_but_not_skip_ahead() {
        let mut doc = json!({"days": [1]});
        set_at_path(&mut doc, "days.1", json!(2)).unwrap();
        assert_eq!(doc["days"], json!([1, 2]));

        let err = set_at_path(&mut doc, "days.5", json!(6));
        assert!(matches!(err, Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_rejects_malformed_paths() {
        let mut doc = json!({"days": []});
        assert!(set_at_path(&mut doc, "", json!(1)).is_err());
        assert!(set_at_path(&mut doc, "days..title", json!(1)).is_err());
        assert!(set_at_path(&mut doc, "days.first", json!(1)).is_err());
    }
}
