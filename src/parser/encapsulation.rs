use crate::error_log::{EntityRef, Issue, IssueKind};
use crate::parser::{Parser, node_name};
use crate::utils::is_not_whitespace;
use crate::{Component, Model};
use roxmltree::Node;

impl Parser {
    /// Load the forest of `component_ref` elements under an
    /// `<encapsulation>` element, starting at its first child node.
    ///
    /// Multiple encapsulation blocks in one document are additive; each one
    /// is applied on top of whatever tree already exists.
    pub(crate) fn load_encapsulation(&mut self, model: &mut Model, first: Node) {
        let mut next = Some(first);
        while let Some(node) = next {
            if node.is_element() && node.tag_name().name() == "component_ref" {
                self.load_component_ref(model, node);
            } else if node.is_text() {
                let text = node.text().unwrap_or_default();
                // Ignore whitespace when parsing.
                if is_not_whitespace(text) {
                    self.add_error(
                        Issue::new(
                            IssueKind::Encapsulation,
                            format!(
                                "Encapsulation in model '{}' has an invalid non-whitespace child text element '{}'.",
                                model.name, text
                            ),
                        )
                        .with_source(EntityRef::Model(model.name.clone())),
                    );
                }
            } else {
                self.add_error(
                    Issue::new(
                        IssueKind::Encapsulation,
                        format!(
                            "Encapsulation in model '{}' has an invalid child element '{}'.",
                            model.name,
                            node_name(node)
                        ),
                    )
                    .with_source(EntityRef::Model(model.name.clone())),
                );
            }
            next = node.next_sibling();
        }
    }

    /// Process a single `component_ref` element as an encapsulation parent:
    /// take the named component out of the model, attach each resolved
    /// child to it, and put it back at its original slot.
    fn load_component_ref(&mut self, model: &mut Model, node: Node) {
        let mut parent: Option<Component> = None;
        let mut parent_position = 0;
        let mut parent_name = String::new();
        for attribute in node.attributes() {
            if attribute.name() == "component" {
                parent_name = attribute.value().to_string();
                if model.contains_component(&parent_name) {
                    // Held locally while the children are attached, then
                    // re-inserted below.
                    parent_position = model.component_position(&parent_name).unwrap_or_default();
                    parent = model.take_component(&parent_name);
                } else {
                    self.add_error(
                        Issue::new(
                            IssueKind::Encapsulation,
                            format!(
                                "Encapsulation in model '{}' specifies '{}' as a component in a component_ref but it does not exist in the model.",
                                model.name, parent_name
                            ),
                        )
                        .with_source(EntityRef::Model(model.name.clone())),
                    );
                }
            } else {
                self.add_error(
                    Issue::new(
                        IssueKind::Encapsulation,
                        format!(
                            "Encapsulation in model '{}' has an invalid component_ref attribute '{}'.",
                            model.name,
                            attribute.name()
                        ),
                    )
                    .with_source(EntityRef::Model(model.name.clone())),
                );
            }
        }
        if parent.is_none() && parent_name.is_empty() {
            self.add_error(
                Issue::new(
                    IssueKind::Encapsulation,
                    format!(
                        "Encapsulation in model '{}' does not have a valid component attribute in a component_ref element.",
                        model.name
                    ),
                )
                .with_source(EntityRef::Model(model.name.clone())),
            );
        }

        if node.first_child().is_none() {
            let description = if let Some(parent) = &parent {
                format!(
                    "Encapsulation in model '{}' specifies '{}' as a parent component_ref but it does not have any children.",
                    model.name, parent.name
                )
            } else {
                format!(
                    "Encapsulation in model '{}' specifies an invalid parent component_ref that also does not have any children.",
                    model.name
                )
            };
            self.add_error(
                Issue::new(IssueKind::Encapsulation, description)
                    .with_source(EntityRef::Model(model.name.clone())),
            );
        }

        for child_node in node.children() {
            let mut child_name: Option<String> = None;
            if child_node.is_element() && child_node.tag_name().name() == "component_ref" {
                let mut child_missing = false;
                let mut child_found = false;
                for attribute in child_node.attributes() {
                    if attribute.name() == "component" {
                        let name = attribute.value();
                        if model.contains_component(name) {
                            child_found = true;
                            child_name = Some(name.to_string());
                        } else {
                            self.add_error(
                                Issue::new(
                                    IssueKind::Encapsulation,
                                    format!(
                                        "Encapsulation in model '{}' specifies '{}' as a component in a component_ref but it does not exist in the model.",
                                        model.name, name
                                    ),
                                )
                                .with_source(EntityRef::Model(model.name.clone())),
                            );
                            child_missing = true;
                        }
                    } else {
                        self.add_error(
                            Issue::new(
                                IssueKind::Encapsulation,
                                format!(
                                    "Encapsulation in model '{}' has an invalid component_ref attribute '{}'.",
                                    model.name,
                                    attribute.name()
                                ),
                            )
                            .with_source(EntityRef::Model(model.name.clone())),
                        );
                    }
                }
                if !child_found && !child_missing {
                    let description = if let Some(parent) = &parent {
                        format!(
                            "Encapsulation in model '{}' does not have a valid component attribute in a component_ref that is a child of '{}'.",
                            model.name, parent.name
                        )
                    } else if parent_name.is_empty() {
                        format!(
                            "Encapsulation in model '{}' does not have a valid component attribute in a component_ref that is a child of an invalid parent component.",
                            model.name
                        )
                    } else {
                        format!(
                            "Encapsulation in model '{}' does not have a valid component attribute in a component_ref that is a child of invalid parent component '{}'.",
                            model.name, parent_name
                        )
                    };
                    self.add_error(
                        Issue::new(IssueKind::Encapsulation, description)
                            .with_source(EntityRef::Model(model.name.clone())),
                    );
                }
                // Encapsulate the child's own descendants first, while the
                // child is still a top-level component.
                if child_node.first_child().is_some() {
                    self.load_component_ref(model, child_node);
                }
                if let Some(parent) = parent.as_mut()
                    && let Some(name) = &child_name
                    && let Some(child_component) = model.take_component(name)
                {
                    parent.add_component(child_component);
                }
            } else if child_node.is_text() {
                let text = child_node.text().unwrap_or_default();
                if is_not_whitespace(text) {
                    self.add_error(
                        Issue::new(
                            IssueKind::Encapsulation,
                            format!(
                                "Encapsulation in model '{}' has an invalid non-whitespace child text element '{}'.",
                                model.name, text
                            ),
                        )
                        .with_source(EntityRef::Model(model.name.clone())),
                    );
                }
            } else {
                self.add_error(
                    Issue::new(
                        IssueKind::Encapsulation,
                        format!(
                            "Encapsulation in model '{}' has an invalid child element '{}'.",
                            model.name,
                            node_name(child_node)
                        ),
                    )
                    .with_source(EntityRef::Model(model.name.clone())),
                );
            }
        }

        // Put the parent back where it was taken from, children attached.
        if let Some(parent) = parent {
            model.insert_component(parent_position, parent);
        }
    }
}
