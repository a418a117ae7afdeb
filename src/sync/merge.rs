//! Last-write-wins reconciliation of the local and remote collections.

use std::collections::HashMap;

use crate::schema::LibraryItem;

/// Keep, per id, the version with the greatest `updatedAt`.
///
/// Local items are visited first, then remote; on equal `updatedAt` the item
/// visited later wins, so ties go to the remote copy. Output order follows the
/// first appearance of each id.
pub fn merge(local: Vec<LibraryItem>, remote: Vec<LibraryItem>) -> Vec<LibraryItem> {
    let mut order: Vec<String> = Vec::new();
    let mut by_id: HashMap<String, LibraryItem> = HashMap::new();

    for item in local.into_iter().chain(remote) {
        match by_id.get(&item.id) {
            Some(existing) if item.updated_at < existing.updated_at => {}
            Some(_) => {
                by_id.insert(item.id.clone(), item);
            }
            None => {
                order.push(item.id.clone());
                by_id.insert(item.id.clone(), item);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|id| by_id.remove(&id))
        .collect()
}
