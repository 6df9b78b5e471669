use crate::error_log::{EntityRef, Issue, IssueKind};
use crate::parser::{Parser, node_name};
use crate::utils::is_not_whitespace;
use crate::{Model, Variable, VariableRef};
use roxmltree::Node;

impl Parser {
    /// Load one `<connection>` element: collect the component pair and the
    /// variable pairs, resolve them against the model, and register the
    /// resulting variable equivalences.
    ///
    /// Faults are contained: a malformed connection never modifies the
    /// components it names, and a side that already produced an error does
    /// not produce follow-up errors for the entities that depend on it.
    pub(crate) fn load_connection(&mut self, model: &mut Model, node: Node) {
        // A connection should not have attributes.
        for attribute in node.attributes() {
            self.add_error(
                Issue::new(
                    IssueKind::Connection,
                    format!(
                        "Connection in model '{}' has an invalid attribute '{}'.",
                        model.name,
                        attribute.name()
                    ),
                )
                .with_source(EntityRef::Model(model.name.clone())),
            );
        }
        if node.first_child().is_none() {
            self.add_error(
                Issue::new(
                    IssueKind::Connection,
                    format!(
                        "Connection in model '{}' does not contain any child elements.",
                        model.name
                    ),
                )
                .with_source(EntityRef::Model(model.name.clone())),
            );
            return;
        }

        let mut component_names = (String::new(), String::new());
        let mut variable_pairs: Vec<(String, String)> = Vec::new();
        let mut map_components_found = false;
        let mut map_variables_found = false;
        let mut component_1_missing = false;
        let mut component_2_missing = false;
        let mut variable_1_missing = false;
        let mut variable_2_missing = false;

        for child in node.children() {
            // Connection map elements should not have further children.
            if let Some(grandchild) = child.first_child() {
                if grandchild.is_text() {
                    let text = grandchild.text().unwrap_or_default();
                    if is_not_whitespace(text) {
                        self.add_error(
                            Issue::new(
                                IssueKind::Connection,
                                format!(
                                    "Connection in model '{}' has an invalid non-whitespace child text element '{}'.",
                                    model.name, text
                                ),
                            )
                            .with_source(EntityRef::Model(model.name.clone())),
                        );
                    }
                } else {
                    self.add_error(
                        Issue::new(
                            IssueKind::Connection,
                            format!(
                                "Connection in model '{}' has an invalid child element '{}' of element '{}'.",
                                model.name,
                                node_name(grandchild),
                                node_name(child)
                            ),
                        )
                        .with_source(EntityRef::Model(model.name.clone())),
                    );
                }
            }

            if child.is_element() && child.tag_name().name() == "map_components" {
                let mut component_1 = String::new();
                let mut component_2 = String::new();
                for attribute in child.attributes() {
                    match attribute.name() {
                        "component_1" => component_1 = attribute.value().to_string(),
                        "component_2" => component_2 = attribute.value().to_string(),
                        other => {
                            self.add_error(
                                Issue::new(
                                    IssueKind::Connection,
                                    format!(
                                        "Connection in model '{}' has an invalid map_components attribute '{}'.",
                                        model.name, other
                                    ),
                                )
                                .with_source(EntityRef::Model(model.name.clone())),
                            );
                        }
                    }
                }
                if component_1.is_empty() {
                    self.add_error(
                        Issue::new(
                            IssueKind::Connection,
                            format!(
                                "Connection in model '{}' does not have a valid component_1 in a map_components element.",
                                model.name
                            ),
                        )
                        .with_source(EntityRef::Model(model.name.clone())),
                    );
                    component_1_missing = true;
                }
                if component_2.is_empty() {
                    self.add_error(
                        Issue::new(
                            IssueKind::Connection,
                            format!(
                                "Connection in model '{}' does not have a valid component_2 in a map_components element.",
                                model.name
                            ),
                        )
                        .with_source(EntityRef::Model(model.name.clone())),
                    );
                    component_2_missing = true;
                }
                // Only one map_components is allowed; a later one still
                // overwrites the collected pair.
                if map_components_found {
                    self.add_error(
                        Issue::new(
                            IssueKind::Connection,
                            format!(
                                "Connection in model '{}' has more than one map_components element.",
                                model.name
                            ),
                        )
                        .with_source(EntityRef::Model(model.name.clone())),
                    );
                }
                component_names = (component_1, component_2);
                map_components_found = true;
            } else if child.is_element() && child.tag_name().name() == "map_variables" {
                let mut variable_1 = String::new();
                let mut variable_2 = String::new();
                for attribute in child.attributes() {
                    match attribute.name() {
                        "variable_1" => variable_1 = attribute.value().to_string(),
                        "variable_2" => variable_2 = attribute.value().to_string(),
                        other => {
                            self.add_error(
                                Issue::new(
                                    IssueKind::Connection,
                                    format!(
                                        "Connection in model '{}' has an invalid map_variables attribute '{}'.",
                                        model.name, other
                                    ),
                                )
                                .with_source(EntityRef::Model(model.name.clone())),
                            );
                        }
                    }
                }
                if variable_1.is_empty() {
                    self.add_error(
                        Issue::new(
                            IssueKind::Connection,
                            format!(
                                "Connection in model '{}' does not have a valid variable_1 in a map_variables element.",
                                model.name
                            ),
                        )
                        .with_source(EntityRef::Model(model.name.clone())),
                    );
                    variable_1_missing = true;
                }
                if variable_2.is_empty() {
                    self.add_error(
                        Issue::new(
                            IssueKind::Connection,
                            format!(
                                "Connection in model '{}' does not have a valid variable_2 in a map_variables element.",
                                model.name
                            ),
                        )
                        .with_source(EntityRef::Model(model.name.clone())),
                    );
                    variable_2_missing = true;
                }
                variable_pairs.push((variable_1, variable_2));
                map_variables_found = true;
            } else if child.is_text() {
                let text = child.text().unwrap_or_default();
                // Ignore whitespace when parsing.
                if is_not_whitespace(text) {
                    self.add_error(
                        Issue::new(
                            IssueKind::Connection,
                            format!(
                                "Connection in model '{}' has an invalid non-whitespace child text element '{}'.",
                                model.name, text
                            ),
                        )
                        .with_source(EntityRef::Model(model.name.clone())),
                    );
                }
            } else {
                self.add_error(
                    Issue::new(
                        IssueKind::Connection,
                        format!(
                            "Connection in model '{}' has an invalid child element '{}'.",
                            model.name,
                            node_name(child)
                        ),
                    )
                    .with_source(EntityRef::Model(model.name.clone())),
                );
            }
        }

        // Check that the named components exist. A side whose name was
        // already reported missing is not reported again.
        let mut component_1_found = false;
        let mut component_2_found = false;
        if map_components_found {
            if model.contains_component(&component_names.0) {
                component_1_found = true;
            } else if !component_1_missing {
                self.add_error(
                    Issue::new(
                        IssueKind::Connection,
                        format!(
                            "Connection in model '{}' specifies '{}' as component_1 but it does not exist in the model.",
                            model.name, component_names.0
                        ),
                    )
                    .with_source(EntityRef::Model(model.name.clone())),
                );
            }
            if model.contains_component(&component_names.1) {
                component_2_found = true;
            } else if !component_2_missing {
                self.add_error(
                    Issue::new(
                        IssueKind::Connection,
                        format!(
                            "Connection in model '{}' specifies '{}' as component_2 but it does not exist in the model.",
                            model.name, component_names.1
                        ),
                    )
                    .with_source(EntityRef::Model(model.name.clone())),
                );
            }
        } else {
            self.add_error(
                Issue::new(
                    IssueKind::Connection,
                    format!(
                        "Connection in model '{}' does not have a map_components element.",
                        model.name
                    ),
                )
                .with_source(EntityRef::Model(model.name.clone())),
            );
        }

        if map_variables_found {
            for (variable_1, variable_2) in &variable_pairs {
                // A pair is skipped silently when its component side failed
                // to resolve; that fault has already been reported above.
                // Not-found faults on either side have always been
                // attributed to component_1, or to nothing when
                // component_1 itself did not resolve.
                let blame = component_1_found
                    .then(|| EntityRef::Component(component_names.0.clone()));
                let first = if component_1_found {
                    self.resolve_connection_variable(
                        model,
                        &component_names.0,
                        variable_1,
                        variable_1_missing,
                        "variable_1",
                        "component_1",
                        blame.clone(),
                    )
                } else {
                    None
                };
                let second = if component_2_found {
                    self.resolve_connection_variable(
                        model,
                        &component_names.1,
                        variable_2,
                        variable_2_missing,
                        "variable_2",
                        "component_2",
                        blame,
                    )
                } else {
                    None
                };
                if let (Some(first), Some(second)) = (first, second) {
                    model.add_equivalence(&first, &second);
                }
            }
        } else {
            self.add_error(
                Issue::new(
                    IssueKind::Connection,
                    format!(
                        "Connection in model '{}' does not have a map_variables element.",
                        model.name
                    ),
                )
                .with_source(EntityRef::Model(model.name.clone())),
            );
        }
    }

    /// Resolve one side of a variable pair against its component. An
    /// existing variable is reused; an imported component gets a fresh
    /// variable of the declared name, which is assumed to exist remotely.
    /// `blame` is the entity the not-found issue is attributed to, if any.
    #[allow(clippy::too_many_arguments)]
    fn resolve_connection_variable(
        &mut self,
        model: &mut Model,
        component_name: &str,
        variable_name: &str,
        variable_missing: bool,
        variable_label: &str,
        component_label: &str,
        blame: Option<EntityRef>,
    ) -> Option<VariableRef> {
        let model_name = model.name.clone();
        let component = model.find_component_mut(component_name)?;
        if component.contains_variable(variable_name) {
            return Some(VariableRef::new(component_name, variable_name));
        }
        if component.is_import() {
            component.add_variable(Variable::new(variable_name));
            return Some(VariableRef::new(component_name, variable_name));
        }
        if !variable_missing {
            let mut issue = Issue::new(
                IssueKind::Connection,
                format!(
                    "Variable '{}' is specified as {} in a connection but it does not exist in {} component '{}' of model '{}'.",
                    variable_name, variable_label, component_label, component_name, model_name
                ),
            );
            if let Some(blame) = blame {
                issue = issue.with_source(blame);
            }
            self.add_error(issue);
        }
        None
    }
}
