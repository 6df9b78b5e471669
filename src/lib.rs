//! Rust library for working with models in the CellML format.
//!
//! A [`Parser`] reads a CellML document string into a typed [`Model`]
//! graph, collecting every structural fault in an [`ErrorLog`] instead of
//! failing, and a [`Printer`] serializes a graph back into canonical
//! CellML. Nothing here performs I/O or resolves imported documents.
#![warn(clippy::pedantic)]
// On top of the pedantic configuration, we do turn off these checks.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::float_cmp)]

/// Entity graph: the model and everything it owns.
pub(crate) mod model;

/// Categorized issue records and the append-only error log.
mod error_log;
/// Semantic parser from CellML XML into the entity graph.
mod parser;
/// Structural printer from the entity graph back to CellML XML.
mod printer;
/// Invariant checks for hand-built entity graphs.
mod validation;

pub(crate) mod utils;

pub use crate::error_log::{EntityRef, ErrorLog, Issue, IssueKind};
pub use crate::model::cellml_model::Model;
pub use crate::model::component::Component;
pub use crate::model::import::{Import, ImportSource};
pub use crate::model::reset::Reset;
pub use crate::model::units::{Unit, Units};
pub use crate::model::variable::{Variable, VariableRef};
pub use crate::parser::{Format, Parser};
pub use crate::printer::Printer;
pub use crate::validation::Validation;

/// Namespace written on emitted model documents. Parsing does not require
/// any namespace declaration.
pub(crate) const CELLML_NAMESPACE: &str = "http://www.cellml.org/cellml/2.0#";
/// Namespace of the `xlink` attributes used on import elements.
pub(crate) const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";
