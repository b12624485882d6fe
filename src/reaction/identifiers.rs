use serde::{Deserialize, Serialize};

/// String identification information for a reaction, used for log
/// attribution and statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionIdentifiers {
    /// User-supplied label, defaults to the dsl description if none given.
    pub label: String,
    /// Name of the owning reactor instance.
    pub reactor_name: String,
    /// Human-readable rendering of the word list, e.g. `"Trigger<Foo>, Single"`.
    pub dsl_description: String,
    /// Human-readable rendering of the callback site, e.g. a `file:line`.
    pub callback_description: String,
}

impl ReactionIdentifiers {
    pub fn new(
        reactor_name: impl Into<String>,
        dsl_description: impl Into<String>,
        callback_description: impl Into<String>,
    ) -> Self {
        let dsl_description = dsl_description.into();
        Self {
            label: dsl_description.clone(),
            reactor_name: reactor_name.into(),
            dsl_description,
            callback_description: callback_description.into(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}
