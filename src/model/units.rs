use crate::model::import::ImportSource;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// One row inside a [`Units`] definition: a scaled reference to another
/// units definition.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Unit {
    /// Name of the referenced units definition.
    pub reference: String,
    pub prefix: String,
    pub exponent: f64,
    pub multiplier: f64,
    pub offset: f64,
}

impl Default for Unit {
    fn default() -> Self {
        Unit {
            reference: String::new(),
            prefix: String::new(),
            exponent: 1.0,
            multiplier: 1.0,
            offset: 0.0,
        }
    }
}

/// A named units definition with its ordered [`Unit`] rows.
///
/// `base_unit` is tri-valued: `None` when never declared, `Some(true)` or
/// `Some(false)` once a valid `yes`/`no` value has been read.
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Units {
    pub name: String,
    pub id: String,
    pub base_unit: Option<bool>,
    pub units: Vec<Unit>,
    pub import_source: Option<ImportSource>,
}

impl Units {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Units {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Append one unit row. Rows are an ordered sequence, not a set; the
    /// same reference may appear any number of times.
    pub fn add_unit(
        &mut self,
        reference: &str,
        prefix: &str,
        exponent: f64,
        multiplier: f64,
        offset: f64,
    ) {
        self.units.push(Unit {
            reference: reference.to_string(),
            prefix: prefix.to_string(),
            exponent,
            multiplier,
            offset,
        });
    }

    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn unit(&self, index: usize) -> Option<&Unit> {
        self.units.get(index)
    }

    /// Bind this definition to an import, making it an imported units.
    pub fn set_import_source(&mut self, index: usize, reference: &str) {
        self.import_source = Some(ImportSource::new(index, reference));
    }

    #[must_use]
    pub fn is_import(&self) -> bool {
        self.import_source.is_some()
    }

    /// A units definition with nothing set at all. Blank definitions
    /// serialize to nothing.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.name.is_empty()
            && self.id.is_empty()
            && self.base_unit.is_none()
            && self.units.is_empty()
            && self.import_source.is_none()
    }
}
