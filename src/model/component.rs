use crate::model::import::ImportSource;
use crate::model::units::Units;
use crate::model::variable::Variable;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// A named container of variables, units, and mathematics.
///
/// A component lives either in the top-level sequence of its
/// [`crate::Model`] or, once encapsulation has been applied, in the child
/// sequence of exactly one parent component, never both. `math` holds the
/// serialized MathML fragment verbatim, including its `<math>` wrapper; the
/// content is opaque here.
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Component {
    pub name: String,
    pub id: String,
    pub math: String,
    pub import_source: Option<ImportSource>,
    pub variables: Vec<Variable>,
    pub units: Vec<Units>,
    /// Encapsulated child components.
    pub components: Vec<Component>,
}

impl Component {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Component {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Bind this component to an import, making it an imported component.
    /// `reference` names the component inside the imported document.
    pub fn set_import_source(&mut self, index: usize, reference: &str) {
        self.import_source = Some(ImportSource::new(index, reference));
    }

    #[must_use]
    pub fn is_import(&self) -> bool {
        self.import_source.is_some()
    }

    #[must_use]
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    #[must_use]
    pub fn variable(&self, index: usize) -> Option<&Variable> {
        self.variables.get(index)
    }

    #[must_use]
    pub fn find_variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn find_variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.iter_mut().find(|v| v.name == name)
    }

    #[must_use]
    pub fn contains_variable(&self, name: &str) -> bool {
        self.find_variable(name).is_some()
    }

    /// Add a variable, overwriting any existing variable of the same name
    /// in place. The slot of the overwritten variable is preserved.
    pub fn add_variable(&mut self, variable: Variable) {
        match self.variables.iter().position(|v| v.name == variable.name) {
            Some(index) => self.variables[index] = variable,
            None => self.variables.push(variable),
        }
    }

    #[must_use]
    pub fn find_units(&self, name: &str) -> Option<&Units> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Add a units definition, overwriting by name in place.
    pub fn add_units(&mut self, units: Units) {
        match self.units.iter().position(|u| u.name == units.name) {
            Some(index) => self.units[index] = units,
            None => self.units.push(units),
        }
    }

    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn component(&self, index: usize) -> Option<&Component> {
        self.components.get(index)
    }

    #[must_use]
    pub fn find_component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn contains_component(&self, name: &str) -> bool {
        self.find_component(name).is_some()
    }

    /// Add an encapsulated child, overwriting by name in place.
    pub fn add_component(&mut self, component: Component) {
        match self
            .components
            .iter()
            .position(|c| c.name == component.name)
        {
            Some(index) => self.components[index] = component,
            None => self.components.push(component),
        }
    }

    /// Field-wise comparison that treats variable equivalence lists as
    /// sets; child components are compared recursively in order.
    pub(crate) fn structurally_equals(&self, other: &Component) -> bool {
        self.name == other.name
            && self.id == other.id
            && self.math == other.math
            && self.import_source == other.import_source
            && self.units == other.units
            && self.variables.len() == other.variables.len()
            && self
                .variables
                .iter()
                .zip(&other.variables)
                .all(|(a, b)| a.structurally_equals(b))
            && self.components.len() == other.components.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(a, b)| a.structurally_equals(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_variable_overwrites_by_name_in_place() {
        let mut component = Component::new("membrane");
        component.add_variable(Variable::new("V"));
        component.add_variable(Variable::new("time"));

        let mut replacement = Variable::new("V");
        replacement.initial_value = "-84.624".to_string();
        component.add_variable(replacement);

        assert_eq!(component.variable_count(), 2);
        assert_eq!(component.variable(0).unwrap().initial_value, "-84.624");
        assert_eq!(component.variable(1).unwrap().name, "time");
    }

    #[test]
    fn find_variable_by_name() {
        let mut component = Component::new("membrane");
        component.add_variable(Variable::new("V"));
        assert!(component.contains_variable("V"));
        assert!(component.find_variable("i_stim").is_none());
    }

    #[test]
    fn import_binding() {
        let mut component = Component::new("local");
        assert!(!component.is_import());
        component.set_import_source(0, "remote");
        assert!(component.is_import());
        assert_eq!(component.import_source.as_ref().unwrap().reference, "remote");
    }

    #[test]
    fn encapsulated_children_overwrite_by_name() {
        let mut parent = Component::new("parent");
        parent.add_component(Component::new("child"));
        let mut replacement = Component::new("child");
        replacement.id = "c1".to_string();
        parent.add_component(replacement);

        assert_eq!(parent.component_count(), 1);
        assert_eq!(parent.component(0).unwrap().id, "c1");
    }
}
