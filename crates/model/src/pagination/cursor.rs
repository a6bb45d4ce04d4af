use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Opaque continuation returned by a paged scan. `None` signals that the
/// previous page was the last one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub enum Cursor {
    #[default]
    None,

    /// Positional cursor for sources that page by record offset.
    Offset { offset: usize },

    /// Source-defined continuation key, passed back verbatim.
    Key(JsonValue),
}

impl Cursor {
    pub fn is_none(&self) -> bool {
        matches!(self, Cursor::None)
    }
}
