use serde::{Deserialize, Serialize};

/// Stable identifier of a [`Variable`] within a [`crate::Model`]: the name
/// of the owning component paired with the variable name.
///
/// Variable equivalences store these pairs instead of references, so the
/// symmetric relation never creates an ownership cycle. Resolving a pair
/// back to the peer variable is a lookup through
/// [`crate::Model::find_variable`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariableRef {
    pub component: String,
    pub variable: String,
}

impl VariableRef {
    #[must_use]
    pub fn new(component: &str, variable: &str) -> Self {
        VariableRef {
            component: component.to_string(),
            variable: variable.to_string(),
        }
    }
}

/// A named variable declared inside a [`crate::Component`].
///
/// Attribute fields default to the empty string, which means "not set"; the
/// printer omits empty attributes. `units` names a units definition, it is
/// not checked for dimensional validity here.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub id: String,
    pub units: String,
    pub interface: String,
    pub initial_value: String,
    /// Undirected equivalence relation, stored as back-references on both
    /// endpoints. Kept as a set: adding an existing edge is a no-op.
    pub equivalences: Vec<VariableRef>,
}

impl Variable {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Variable {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn equivalence_count(&self) -> usize {
        self.equivalences.len()
    }

    #[must_use]
    pub fn equivalence(&self, index: usize) -> Option<&VariableRef> {
        self.equivalences.get(index)
    }

    #[must_use]
    pub fn is_equivalent_to(&self, other: &VariableRef) -> bool {
        self.equivalences.contains(other)
    }

    /// Field-wise comparison that treats the equivalence list as a set.
    pub(crate) fn structurally_equals(&self, other: &Variable) -> bool {
        self.name == other.name
            && self.id == other.id
            && self.units == other.units
            && self.interface == other.interface
            && self.initial_value == other.initial_value
            && self.equivalences.len() == other.equivalences.len()
            && self
                .equivalences
                .iter()
                .all(|peer| other.equivalences.contains(peer))
    }
}
