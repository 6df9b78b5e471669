/// Definition of the root [`Model`] entity.
pub(crate) mod cellml_model;
/// Components and their encapsulation children.
pub(crate) mod component;
/// Import records and the bindings of imported entities.
pub(crate) mod import;
/// Reset rules (serialization only).
pub(crate) mod reset;
/// Units definitions and their unit rows.
pub(crate) mod units;
/// Variables and the equivalence relation between them.
pub(crate) mod variable;

pub use cellml_model::Model;
pub use component::Component;
pub use import::{Import, ImportSource};
pub use reset::Reset;
pub use units::{Unit, Units};
pub use variable::{Variable, VariableRef};

#[cfg(test)]
pub(crate) mod tests {
    use super::{Component, Model, Units, Variable, VariableRef};

    /// A small membrane model with one units definition, two components,
    /// and one variable equivalence. Shared by tests across the crate.
    pub(crate) fn simple_model() -> Model {
        let mut model = Model::new("membrane_model");

        let mut millivolt = Units::new("millivolt");
        millivolt.add_unit("volt", "milli", 1.0, 1.0, 0.0);
        model.add_units(millivolt);

        let mut membrane = Component::new("membrane");
        let mut voltage = Variable::new("V");
        voltage.units = "millivolt".to_string();
        voltage.initial_value = "-84.624".to_string();
        membrane.add_variable(voltage);
        let mut membrane_time = Variable::new("time");
        membrane_time.units = "millisecond".to_string();
        membrane.add_variable(membrane_time);
        model.add_component(membrane);

        let mut environment = Component::new("environment");
        let mut environment_time = Variable::new("time");
        environment_time.units = "millisecond".to_string();
        environment.add_variable(environment_time);
        model.add_component(environment);

        model.add_equivalence(
            &VariableRef::new("membrane", "time"),
            &VariableRef::new("environment", "time"),
        );
        model
    }

    /// A model with an applied encapsulation: `parent` owns `child`, and
    /// only `parent` stays top-level.
    pub(crate) fn encapsulated_model() -> Model {
        let mut model = Model::new("nested");
        let mut parent = Component::new("parent_component");
        parent.add_component(Component::new("child_component"));
        model.add_component(parent);
        model
    }
}
