use std::collections::HashMap;

use runq_model::Item;

use crate::QueueError;

/// In-memory UID lookup mirroring the persisted queue plus the running slot.
///
/// Derived state only: rebuilt from the store at startup and never
/// persisted. Covers exactly the union of queue and running-slot contents,
/// never the history log. Every mutation fails loudly when it would break
/// that mirror, which is how UID uniqueness violations surface.
#[derive(Debug, Default)]
pub(crate) struct IdentityIndex {
    items: HashMap<String, Item>,
}

impl IdentityIndex {
    pub fn contains(&self, uid: &str) -> bool {
        self.items.contains_key(uid)
    }

    pub fn get(&self, uid: &str) -> Option<&Item> {
        self.items.get(uid)
    }

    /// Register an item; the item must carry a UID not yet present.
    pub fn add(&mut self, item: Item) -> Result<(), QueueError> {
        let Some(uid) = item.uid() else {
            return Err(QueueError::InvalidArgument(
                "can not index an item without a uid".to_string(),
            ));
        };
        if self.contains(uid) {
            return Err(QueueError::Duplicate(uid.to_string()));
        }
        self.items.insert(uid.to_string(), item);
        Ok(())
    }

    /// Drop an entry, returning the removed item.
    pub fn remove(&mut self, uid: &str) -> Result<Item, QueueError> {
        self.items
            .remove(uid)
            .ok_or_else(|| QueueError::NotFound(format!("uid '{uid}' is not in the index")))
    }

    /// Replace the entry for an already-indexed UID.
    pub fn update(&mut self, item: Item) -> Result<(), QueueError> {
        let Some(uid) = item.uid() else {
            return Err(QueueError::InvalidArgument(
                "can not index an item without a uid".to_string(),
            ));
        };
        if !self.contains(uid) {
            return Err(QueueError::NotFound(format!("uid '{uid}' is not in the index")));
        }
        self.items.insert(uid.to_string(), item);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(uid: &str) -> Item {
        let mut item = Item::new();
        item.set_uid(uid);
        item
    }

    #[test]
    fn add_and_get() {
        let mut index = IdentityIndex::default();
        index.add(item("a")).unwrap();

        assert!(index.contains("a"));
        assert_eq!(index.get("a").unwrap().uid(), Some("a"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn add_rejects_duplicates() {
        let mut index = IdentityIndex::default();
        index.add(item("a")).unwrap();

        assert!(matches!(index.add(item("a")), Err(QueueError::Duplicate(_))));
    }

    #[test]
    fn add_rejects_items_without_uid() {
        let mut index = IdentityIndex::default();
        assert!(matches!(
            index.add(Item::new()),
            Err(QueueError::InvalidArgument(_))
        ));
    }

    #[test]
    fn remove_unknown_uid_fails() {
        let mut index = IdentityIndex::default();
        assert!(matches!(index.remove("a"), Err(QueueError::NotFound(_))));
    }

    #[test]
    fn update_replaces_existing_entry() {
        let mut index = IdentityIndex::default();
        index.add(item("a")).unwrap();

        let updated = item("a").with_field("name", "scan");
        index.update(updated).unwrap();
        assert_eq!(index.get("a").unwrap().get("name").unwrap(), "scan");
    }

    #[test]
    fn update_unknown_uid_fails() {
        let mut index = IdentityIndex::default();
        assert!(matches!(index.update(item("a")), Err(QueueError::NotFound(_))));
    }
}
