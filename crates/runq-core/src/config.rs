/// Names of the three store collections owned by a queue manager.
#[derive(Debug, Clone)]
pub struct StoreKeys {
    /// List holding the pending queue.
    pub queue: String,
    /// Scalar holding the currently running item.
    pub running: String,
    /// List holding the completion history.
    pub history: String,
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            queue: "item_queue".to_string(),
            running: "running_item".to_string(),
            history: "item_history".to_string(),
        }
    }
}

impl StoreKeys {
    /// Key names derived from a shared prefix, for running several managers
    /// against one store instance (each with its own collections).
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            queue: format!("{prefix}:item_queue"),
            running: format!("{prefix}:running_item"),
            history: format!("{prefix}:item_history"),
        }
    }
}
