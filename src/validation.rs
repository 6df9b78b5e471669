use crate::error_log::{EntityRef, ErrorLog, Issue, IssueKind};
use crate::utils::is_unique_name;
use crate::{Component, Model, VariableRef};

/// Validation of the invariants that hand-built graphs can violate.
///
/// Parsing maintains these invariants by construction, but a graph
/// assembled or mutated directly through the public fields can break them.
/// Like parsing, validation collects every finding instead of stopping at
/// the first one.
pub trait Validation {
    /// Append one issue per violated invariant to `log`.
    fn validate_all(&self, log: &mut ErrorLog);

    /// Validate and collect the findings, `Ok` when there are none.
    fn validate(&self) -> Result<(), ErrorLog> {
        let mut log = ErrorLog::new();
        self.validate_all(&mut log);
        if log.is_empty() { Ok(()) } else { Err(log) }
    }
}

impl Validation for Model {
    fn validate_all(&self, log: &mut ErrorLog) {
        let component_names: Vec<&str> = self.components.iter().map(|c| c.name.as_str()).collect();
        for component in &self.components {
            if !is_unique_name(component_names.iter().copied(), &component.name) {
                log.append(
                    Issue::new(
                        IssueKind::Component,
                        format!(
                            "Model '{}' contains more than one component with the name '{}'.",
                            self.name, component.name
                        ),
                    )
                    .with_source(EntityRef::Component(component.name.clone())),
                );
            }
        }

        let units_names: Vec<&str> = self.units.iter().map(|u| u.name.as_str()).collect();
        for units in &self.units {
            if !is_unique_name(units_names.iter().copied(), &units.name) {
                log.append(
                    Issue::new(
                        IssueKind::Units,
                        format!(
                            "Model '{}' contains more than one units with the name '{}'.",
                            self.name, units.name
                        ),
                    )
                    .with_source(EntityRef::Units(units.name.clone())),
                );
            }
            if let Some(source) = &units.import_source
                && source.index >= self.import_count()
            {
                log.append(
                    Issue::new(
                        IssueKind::Import,
                        format!(
                            "Units '{}' references an import that does not exist in model '{}'.",
                            units.name, self.name
                        ),
                    )
                    .with_source(EntityRef::Units(units.name.clone())),
                );
            }
        }

        for component in &self.components {
            validate_component(self, component, log);
        }
    }
}

fn validate_component(model: &Model, component: &Component, log: &mut ErrorLog) {
    let variable_names: Vec<&str> = component.variables.iter().map(|v| v.name.as_str()).collect();
    for variable in &component.variables {
        if !is_unique_name(variable_names.iter().copied(), &variable.name) {
            log.append(
                Issue::new(
                    IssueKind::Variable,
                    format!(
                        "Component '{}' contains more than one variable with the name '{}'.",
                        component.name, variable.name
                    ),
                )
                .with_source(EntityRef::Variable(variable.name.clone())),
            );
        }

        let own = VariableRef::new(&component.name, &variable.name);
        for peer in &variable.equivalences {
            if *peer == own {
                log.append(
                    Issue::new(
                        IssueKind::Variable,
                        format!(
                            "Variable '{}' in component '{}' is marked equivalent to itself.",
                            variable.name, component.name
                        ),
                    )
                    .with_source(EntityRef::Variable(variable.name.clone())),
                );
                continue;
            }
            match model.find_variable(peer) {
                None => {
                    log.append(
                        Issue::new(
                            IssueKind::Variable,
                            format!(
                                "Variable '{}' in component '{}' is marked equivalent to variable '{}' in component '{}' but that variable does not exist in the model.",
                                variable.name, component.name, peer.variable, peer.component
                            ),
                        )
                        .with_source(EntityRef::Variable(variable.name.clone())),
                    );
                }
                Some(peer_variable) => {
                    if !peer_variable.is_equivalent_to(&own) {
                        log.append(
                            Issue::new(
                                IssueKind::Variable,
                                format!(
                                    "Variable '{}' in component '{}' is marked equivalent to variable '{}' in component '{}' but the equivalence is not symmetric.",
                                    variable.name, component.name, peer.variable, peer.component
                                ),
                            )
                            .with_source(EntityRef::Variable(variable.name.clone())),
                        );
                    }
                }
            }
        }
    }

    if let Some(source) = &component.import_source
        && source.index >= model.import_count()
    {
        log.append(
            Issue::new(
                IssueKind::Import,
                format!(
                    "Component '{}' references an import that does not exist in model '{}'.",
                    component.name, model.name
                ),
            )
            .with_source(EntityRef::Component(component.name.clone())),
        );
    }

    let child_names: Vec<&str> = component.components.iter().map(|c| c.name.as_str()).collect();
    for child in &component.components {
        if !is_unique_name(child_names.iter().copied(), &child.name) {
            log.append(
                Issue::new(
                    IssueKind::Component,
                    format!(
                        "Component '{}' contains more than one child component with the name '{}'.",
                        component.name, child.name
                    ),
                )
                .with_source(EntityRef::Component(child.name.clone())),
            );
        }
        validate_component(model, child, log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::simple_model;
    use crate::{Component, Import, Units, Variable};

    #[test]
    fn default_model_is_valid() {
        assert!(Model::default().validate().is_ok());
    }

    #[test]
    fn simple_model_is_valid() {
        assert!(simple_model().validate().is_ok());
    }

    #[test]
    fn parsed_models_are_valid() {
        let mut parser = crate::Parser::new(crate::Format::Xml);
        let model = parser.parse_model(
            r#"<model name="m">
                <component name="a"><variable name="x"/></component>
                <component name="b"><variable name="x"/></component>
                <connection>
                    <map_components component_1="a" component_2="b"/>
                    <map_variables variable_1="x" variable_2="x"/>
                </connection>
            </model>"#,
        );
        assert_eq!(parser.error_count(), 0);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn duplicate_names_are_reported_per_entity() {
        let mut model = Model::new("m");
        model.components.push(Component::new("dup"));
        model.components.push(Component::new("dup"));
        model.units.push(Units::new("u"));
        model.units.push(Units::new("u"));

        let log = model.validate().unwrap_err();
        assert_eq!(log.count(), 4);
        assert_eq!(log.get(0).unwrap().kind, IssueKind::Component);
        assert_eq!(
            log.get(0).unwrap().description,
            "Model 'm' contains more than one component with the name 'dup'."
        );
        assert_eq!(log.get(1).unwrap().description, log.get(0).unwrap().description);
        assert_eq!(log.get(2).unwrap().kind, IssueKind::Units);
        assert_eq!(log.get(3).unwrap().kind, IssueKind::Units);
    }

    #[test]
    fn asymmetric_equivalence_is_reported() {
        let mut model = simple_model();
        model
            .find_component_mut("membrane")
            .unwrap()
            .find_variable_mut("V")
            .unwrap()
            .equivalences
            .push(crate::VariableRef::new("environment", "time"));

        let log = model.validate().unwrap_err();
        assert_eq!(log.count(), 1);
        assert_eq!(
            log.get(0).unwrap().description,
            "Variable 'V' in component 'membrane' is marked equivalent to variable 'time' in component 'environment' but the equivalence is not symmetric."
        );
    }

    #[test]
    fn dangling_and_reflexive_equivalences_are_reported() {
        let mut model = Model::new("m");
        let mut component = Component::new("a");
        let mut variable = Variable::new("x");
        variable
            .equivalences
            .push(crate::VariableRef::new("a", "x"));
        variable
            .equivalences
            .push(crate::VariableRef::new("ghost", "y"));
        component.add_variable(variable);
        model.add_component(component);

        let log = model.validate().unwrap_err();
        assert_eq!(log.count(), 2);
        assert_eq!(
            log.get(0).unwrap().description,
            "Variable 'x' in component 'a' is marked equivalent to itself."
        );
        assert_eq!(
            log.get(1).unwrap().description,
            "Variable 'x' in component 'a' is marked equivalent to variable 'y' in component 'ghost' but that variable does not exist in the model."
        );
    }

    #[test]
    fn out_of_range_import_binding_is_reported() {
        let mut model = Model::new("m");
        let mut component = Component::new("a");
        component.set_import_source(2, "remote");
        model.add_component(component);
        model.add_import(Import::new("other.xml"));

        let log = model.validate().unwrap_err();
        assert_eq!(log.count(), 1);
        assert_eq!(log.get(0).unwrap().kind, IssueKind::Import);
        assert_eq!(
            log.get(0).unwrap().description,
            "Component 'a' references an import that does not exist in model 'm'."
        );
    }

    #[test]
    fn duplicate_encapsulated_child_names_are_reported() {
        let mut model = Model::new("m");
        let mut parent = Component::new("p");
        parent.components.push(Component::new("c"));
        parent.components.push(Component::new("c"));
        model.add_component(parent);

        let log = model.validate().unwrap_err();
        assert_eq!(log.count(), 2);
        assert_eq!(
            log.get(0).unwrap().description,
            "Component 'p' contains more than one child component with the name 'c'."
        );
    }
}
