use serde::{Deserialize, Serialize};

/// A reference to another model document from which components or units are
/// to be drawn.
///
/// The model owns its imports as an ordered sequence; imported components
/// and units point back at their import through an [`ImportSource`]. An
/// import is a record only, nothing is fetched or instantiated.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Import {
    /// Source URI of the imported document.
    pub href: String,
    pub id: String,
}

impl Import {
    #[must_use]
    pub fn new(href: &str) -> Self {
        Import {
            href: href.to_string(),
            ..Default::default()
        }
    }
}

/// Non-owning binding of an imported [`crate::Component`] or
/// [`crate::Units`] to the [`Import`] it is drawn from.
///
/// `index` points into [`crate::Model::imports`]; imports are append-only
/// within a model, so the index stays valid across updates. `reference`
/// names the entity inside the imported document.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSource {
    pub index: usize,
    pub reference: String,
}

impl ImportSource {
    #[must_use]
    pub fn new(index: usize, reference: &str) -> Self {
        ImportSource {
            index,
            reference: reference.to_string(),
        }
    }
}
