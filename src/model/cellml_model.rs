use crate::model::component::Component;
use crate::model::import::Import;
use crate::model::units::Units;
use crate::model::variable::{Variable, VariableRef};
use serde::{Deserialize, Serialize};

/// The root entity of a parsed document.
///
/// A model owns its top-level components, its units definitions, and its
/// import records. Component and units names are unique within their owned
/// sequences; [`Model::add_component`] and [`Model::add_units`] maintain
/// this by overwriting a colliding name in place, so the last writer wins
/// while the original slot keeps its position.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub name: String,
    pub id: String,
    pub components: Vec<Component>,
    pub units: Vec<Units>,
    pub imports: Vec<Import>,
}

impl Model {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Model {
            name: name.to_string(),
            ..Default::default()
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

    /// Find a top-level component by name. Encapsulated children are not
    /// searched; they are reachable through their parent.
    #[must_use]
    pub fn find_component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn find_component_mut(&mut self, name: &str) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.name == name)
    }

    #[must_use]
    pub fn contains_component(&self, name: &str) -> bool {
        self.find_component(name).is_some()
    }

    pub(crate) fn component_position(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|c| c.name == name)
    }

    /// Add a top-level component, overwriting any component of the same
    /// name in place.
    pub fn add_component(&mut self, component: Component) {
        match self.component_position(&component.name) {
            Some(index) => self.components[index] = component,
            None => self.components.push(component),
        }
    }

    pub(crate) fn insert_component(&mut self, index: usize, component: Component) {
        let index = index.min(self.components.len());
        self.components.insert(index, component);
    }

    /// Remove a top-level component by name and hand it to the caller.
    /// Used while applying encapsulation: the component is taken, children
    /// are attached to it, and it is re-inserted.
    pub fn take_component(&mut self, name: &str) -> Option<Component> {
        self.component_position(name)
            .map(|index| self.components.remove(index))
    }

    #[must_use]
    pub fn units_count(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn find_units(&self, name: &str) -> Option<&Units> {
        self.units.iter().find(|u| u.name == name)
    }

    #[must_use]
    pub fn contains_units(&self, name: &str) -> bool {
        self.find_units(name).is_some()
    }

    /// Add a units definition, overwriting by name in place.
    pub fn add_units(&mut self, units: Units) {
        match self.units.iter().position(|u| u.name == units.name) {
            Some(index) => self.units[index] = units,
            None => self.units.push(units),
        }
    }

    /// Append an import record and return its index, the handle that
    /// imported components and units are bound through.
    pub fn add_import(&mut self, import: Import) -> usize {
        self.imports.push(import);
        self.imports.len() - 1
    }

    #[must_use]
    pub fn import_count(&self) -> usize {
        self.imports.len()
    }

    #[must_use]
    pub fn import(&self, index: usize) -> Option<&Import> {
        self.imports.get(index)
    }

    /// Resolve a [`VariableRef`] to the variable it names. Unlike
    /// [`Model::find_component`], this searches encapsulated children too,
    /// since equivalent variables may live below the top level.
    #[must_use]
    pub fn find_variable(&self, reference: &VariableRef) -> Option<&Variable> {
        find_in_components(&self.components, reference)
    }

    pub fn find_variable_mut(&mut self, reference: &VariableRef) -> Option<&mut Variable> {
        find_in_components_mut(&mut self.components, reference)
    }

    /// Mark two variables as equivalent. The relation is symmetric and
    /// kept as a set, so repeating an edge changes nothing; an edge from a
    /// variable to itself is refused. Returns whether the edge is present
    /// afterwards.
    pub fn add_equivalence(&mut self, first: &VariableRef, second: &VariableRef) -> bool {
        if first == second {
            return false;
        }
        if self.find_variable(first).is_none() || self.find_variable(second).is_none() {
            return false;
        }
        if let Some(variable) = self.find_variable_mut(first)
            && !variable.equivalences.contains(second)
        {
            variable.equivalences.push(second.clone());
        }
        if let Some(variable) = self.find_variable_mut(second)
            && !variable.equivalences.contains(first)
        {
            variable.equivalences.push(first.clone());
        }
        true
    }

    /// Structural comparison: fields and owned sequences in order, with
    /// variable equivalence lists treated as sets.
    #[must_use]
    pub fn structurally_equals(&self, other: &Model) -> bool {
        self.name == other.name
            && self.id == other.id
            && self.units == other.units
            && self.imports == other.imports
            && self.components.len() == other.components.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(a, b)| a.structurally_equals(b))
    }
}

fn find_in_components<'a>(
    components: &'a [Component],
    reference: &VariableRef,
) -> Option<&'a Variable> {
    for component in components {
        if component.name == reference.component {
            return component.find_variable(&reference.variable);
        }
        if let Some(found) = find_in_components(&component.components, reference) {
            return Some(found);
        }
    }
    None
}

fn find_in_components_mut<'a>(
    components: &'a mut [Component],
    reference: &VariableRef,
) -> Option<&'a mut Variable> {
    for component in components {
        if component.name == reference.component {
            return component.find_variable_mut(&reference.variable);
        }
        if let Some(found) = find_in_components_mut(&mut component.components, reference) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::simple_model;

    #[test]
    fn add_component_overwrites_by_name_in_place() {
        let mut model = Model::new("m");
        model.add_component(Component::new("a"));
        model.add_component(Component::new("b"));

        let mut replacement = Component::new("a");
        replacement.id = "second".to_string();
        model.add_component(replacement);

        assert_eq!(model.component_count(), 2);
        assert_eq!(model.component(0).unwrap().id, "second");
        assert_eq!(model.component(1).unwrap().name, "b");
    }

    #[test]
    fn take_component_removes_from_top_level() {
        let mut model = Model::new("m");
        model.add_component(Component::new("a"));
        model.add_component(Component::new("b"));

        let taken = model.take_component("a").unwrap();
        assert_eq!(taken.name, "a");
        assert_eq!(model.component_count(), 1);
        assert!(!model.contains_component("a"));
        assert!(model.take_component("a").is_none());
    }

    #[test]
    fn add_units_overwrites_by_name_in_place() {
        let mut model = Model::new("m");
        model.add_units(Units::new("ampere"));
        let mut replacement = Units::new("ampere");
        replacement.base_unit = Some(true);
        model.add_units(replacement);

        assert_eq!(model.units_count(), 1);
        assert_eq!(model.find_units("ampere").unwrap().base_unit, Some(true));
    }

    #[test]
    fn find_variable_searches_encapsulated_children() {
        let mut child = Component::new("child");
        child.add_variable(Variable::new("x"));
        let mut parent = Component::new("parent");
        parent.add_component(child);
        let mut model = Model::new("m");
        model.add_component(parent);

        let reference = VariableRef::new("child", "x");
        assert!(model.find_variable(&reference).is_some());
        assert!(model.find_component("child").is_none());
    }

    #[test]
    fn equivalence_is_symmetric_and_idempotent() {
        let mut model = simple_model();
        let membrane_time = VariableRef::new("membrane", "time");
        let environment_time = VariableRef::new("environment", "time");

        // The builder already connected the pair once; adding again in
        // either direction must not grow the sets.
        assert!(model.add_equivalence(&environment_time, &membrane_time));
        let first = model.find_variable(&membrane_time).unwrap();
        let second = model.find_variable(&environment_time).unwrap();
        assert_eq!(first.equivalence_count(), 1);
        assert_eq!(second.equivalence_count(), 1);
        assert!(first.is_equivalent_to(&environment_time));
        assert!(second.is_equivalent_to(&membrane_time));
    }

    #[test]
    fn equivalence_is_irreflexive() {
        let mut model = simple_model();
        let reference = VariableRef::new("membrane", "V");
        assert!(!model.add_equivalence(&reference, &reference));
        assert_eq!(model.find_variable(&reference).unwrap().equivalence_count(), 0);
    }

    #[test]
    fn equivalence_requires_both_endpoints() {
        let mut model = simple_model();
        let known = VariableRef::new("membrane", "V");
        let unknown = VariableRef::new("membrane", "missing");
        assert!(!model.add_equivalence(&known, &unknown));
        assert_eq!(model.find_variable(&known).unwrap().equivalence_count(), 0);
    }

    #[test]
    fn structural_equality_ignores_equivalence_order() {
        let mut first = simple_model();
        let mut second = simple_model();
        let voltage = VariableRef::new("membrane", "V");
        let time = VariableRef::new("environment", "time");
        first.add_equivalence(&voltage, &time);
        second.add_equivalence(&voltage, &time);
        second
            .find_variable_mut(&time)
            .unwrap()
            .equivalences
            .reverse();

        assert!(first != second);
        assert!(first.structurally_equals(&second));
        assert!(second.structurally_equals(&first));
    }
}
