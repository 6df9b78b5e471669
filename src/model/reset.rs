use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// An ordered reset rule attached to a variable.
///
/// Only serialization is supported so far; no document construct is parsed
/// into a reset yet.
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Reset {
    pub order: Option<i32>,
    pub id: String,
}

impl Reset {
    #[must_use]
    pub fn new(order: i32) -> Self {
        Reset {
            order: Some(order),
            ..Default::default()
        }
    }
}
