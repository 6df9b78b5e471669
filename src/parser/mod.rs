mod connection;
mod encapsulation;

use crate::error_log::{EntityRef, ErrorLog, Issue, IssueKind};
use crate::utils::is_not_whitespace;
use crate::{Component, Import, Model, Units, Variable};
use roxmltree::{Document, Node, NodeType};

/// Serialization formats understood by [`Parser`] and [`crate::Printer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Xml,
}

/// Semantic parser that turns a CellML document string into a [`Model`].
///
/// Parsing never fails: every structural or referential fault is recorded
/// in the embedded [`ErrorLog`] and traversal continues, so a single pass
/// over an input produces a complete report. The returned model reflects
/// every part that parsed successfully; callers should check
/// [`Parser::error_count`] before relying on it.
///
/// Successive parses append to the same log unless
/// [`Parser::clear_errors`] is called in between.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    format: Format,
    log: ErrorLog,
}

impl Parser {
    #[must_use]
    pub fn new(format: Format) -> Self {
        Parser {
            format,
            log: ErrorLog::new(),
        }
    }

    /// Parse `input` into a fresh [`Model`]. A model is always returned;
    /// diagnostics end up in the error log.
    pub fn parse_model(&mut self, input: &str) -> Model {
        let mut model = Model::default();
        self.update_model(&mut model, input);
        model
    }

    /// Parse `input` into an existing `model`. Attributes and entities
    /// whose names collide are overwritten; entities not present in the
    /// input are left alone.
    pub fn update_model(&mut self, model: &mut Model, input: &str) {
        match self.format {
            Format::Xml => self.load_model(model, input),
        }
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.log.count()
    }

    #[must_use]
    pub fn error(&self, index: usize) -> Option<&Issue> {
        self.log.get(index)
    }

    #[must_use]
    pub fn error_log(&self) -> &ErrorLog {
        &self.log
    }

    pub fn clear_errors(&mut self) {
        self.log.clear();
    }

    pub(crate) fn add_error(&mut self, issue: Issue) {
        self.log.append(issue);
    }

    fn load_model(&mut self, model: &mut Model, input: &str) {
        let document = match Document::parse(input) {
            Ok(document) => document,
            Err(error) => {
                // Reader faults are copied into the log; without a document
                // there is nothing further to analyse.
                self.add_error(Issue::new(IssueKind::Xml, error.to_string()));
                return;
            }
        };
        let root = document.root_element();
        if root.tag_name().name() != "model" {
            self.add_error(
                Issue::new(
                    IssueKind::Model,
                    format!(
                        "Model root node is of invalid type '{}'. A valid CellML root node should be of type 'model'.",
                        root.tag_name().name()
                    ),
                )
                .with_source(EntityRef::Model(model.name.clone())),
            );
            return;
        }
        for attribute in root.attributes() {
            match attribute.name() {
                "name" => model.name = attribute.value().to_string(),
                "id" => model.id = attribute.value().to_string(),
                other => {
                    self.add_error(
                        Issue::new(
                            IssueKind::Model,
                            format!(
                                "Model '{}' has an invalid attribute '{}'.",
                                attribute_value(root, "name"),
                                other
                            ),
                        )
                        .with_source(EntityRef::Model(attribute_value(root, "name").to_string())),
                    );
                }
            }
        }
        for child in root.children() {
            if child.is_element() {
                match child.tag_name().name() {
                    "component" => {
                        let mut component = Component::default();
                        self.load_component(&mut component, child);
                        model.add_component(component);
                    }
                    "units" => {
                        let mut units = Units::default();
                        self.load_units(&mut units, child);
                        model.add_units(units);
                    }
                    "import" => self.load_import(model, child),
                    "encapsulation" => {
                        // An encapsulation should not have attributes.
                        for attribute in child.attributes() {
                            self.add_error(
                                Issue::new(
                                    IssueKind::Encapsulation,
                                    format!(
                                        "Encapsulation in model '{}' has an invalid attribute '{}'.",
                                        model.name,
                                        attribute.name()
                                    ),
                                )
                                .with_source(EntityRef::Model(model.name.clone())),
                            );
                        }
                        if let Some(first) = child.first_child() {
                            self.load_encapsulation(model, first);
                        } else {
                            self.add_error(
                                Issue::new(
                                    IssueKind::Encapsulation,
                                    format!(
                                        "Encapsulation in model '{}' does not contain any child elements.",
                                        model.name
                                    ),
                                )
                                .with_source(EntityRef::Model(model.name.clone())),
                            );
                        }
                    }
                    "connection" => self.load_connection(model, child),
                    other => {
                        self.add_error(
                            Issue::new(
                                IssueKind::Model,
                                format!(
                                    "Model '{}' has an invalid child element '{}'.",
                                    model.name, other
                                ),
                            )
                            .with_source(EntityRef::Model(model.name.clone())),
                        );
                    }
                }
            } else if child.is_text() {
                let text = child.text().unwrap_or_default();
                // Ignore whitespace when parsing.
                if is_not_whitespace(text) {
                    self.add_error(
                        Issue::new(
                            IssueKind::Model,
                            format!(
                                "Model '{}' has an invalid non-whitespace child text element '{}'.",
                                model.name, text
                            ),
                        )
                        .with_source(EntityRef::Model(model.name.clone())),
                    );
                }
            } else {
                self.add_error(
                    Issue::new(
                        IssueKind::Model,
                        format!(
                            "Model '{}' has an invalid child element '{}'.",
                            model.name,
                            node_name(child)
                        ),
                    )
                    .with_source(EntityRef::Model(model.name.clone())),
                );
            }
        }
    }

    fn load_component(&mut self, component: &mut Component, node: Node) {
        for attribute in node.attributes() {
            match attribute.name() {
                "name" => component.name = attribute.value().to_string(),
                "id" => component.id = attribute.value().to_string(),
                other => {
                    self.add_error(
                        Issue::new(
                            IssueKind::Component,
                            format!(
                                "Component '{}' has an invalid attribute '{}'.",
                                attribute_value(node, "name"),
                                other
                            ),
                        )
                        .with_source(EntityRef::Component(
                            attribute_value(node, "name").to_string(),
                        )),
                    );
                }
            }
        }
        for child in node.children() {
            if child.is_element() {
                match child.tag_name().name() {
                    "variable" => {
                        let mut variable = Variable::default();
                        self.load_variable(&mut variable, child);
                        component.add_variable(variable);
                    }
                    "units" => {
                        let mut units = Units::default();
                        self.load_units(&mut units, child);
                        component.add_units(units);
                    }
                    "math" => {
                        // The full serialized fragment, wrapper included.
                        // A later math child overwrites an earlier one.
                        component.math = raw_xml(child).to_string();
                    }
                    other => {
                        self.add_error(
                            Issue::new(
                                IssueKind::Component,
                                format!(
                                    "Component '{}' has an invalid child element '{}'.",
                                    component.name, other
                                ),
                            )
                            .with_source(EntityRef::Component(component.name.clone())),
                        );
                    }
                }
            } else if child.is_text() {
                let text = child.text().unwrap_or_default();
                if is_not_whitespace(text) {
                    self.add_error(
                        Issue::new(
                            IssueKind::Component,
                            format!(
                                "Component '{}' has an invalid non-whitespace child text element '{}'.",
                                component.name, text
                            ),
                        )
                        .with_source(EntityRef::Component(component.name.clone())),
                    );
                }
            } else {
                self.add_error(
                    Issue::new(
                        IssueKind::Component,
                        format!(
                            "Component '{}' has an invalid child element '{}'.",
                            component.name,
                            node_name(child)
                        ),
                    )
                    .with_source(EntityRef::Component(component.name.clone())),
                );
            }
        }
    }

    fn load_units(&mut self, units: &mut Units, node: Node) {
        for attribute in node.attributes() {
            match attribute.name() {
                "name" => units.name = attribute.value().to_string(),
                "id" => units.id = attribute.value().to_string(),
                "base_unit" => match attribute.value() {
                    "yes" => units.base_unit = Some(true),
                    "no" => units.base_unit = Some(false),
                    other => {
                        // The flag stays as it was.
                        self.add_error(
                            Issue::new(
                                IssueKind::Units,
                                format!(
                                    "Units '{}' has an invalid base_unit attribute value '{}'. Valid options are 'yes' or 'no'.",
                                    units.name, other
                                ),
                            )
                            .with_source(EntityRef::Units(units.name.clone())),
                        );
                    }
                },
                other => {
                    self.add_error(
                        Issue::new(
                            IssueKind::Units,
                            format!(
                                "Units '{}' has an invalid attribute '{}'.",
                                units.name, other
                            ),
                        )
                        .with_source(EntityRef::Units(units.name.clone())),
                    );
                }
            }
        }
        for child in node.children() {
            if child.is_element() {
                if child.tag_name().name() == "unit" {
                    self.load_unit(units, child);
                } else {
                    self.add_error(
                        Issue::new(
                            IssueKind::Units,
                            format!(
                                "Units '{}' has an invalid child element '{}'.",
                                units.name,
                                child.tag_name().name()
                            ),
                        )
                        .with_source(EntityRef::Units(units.name.clone())),
                    );
                }
            } else if child.is_text() {
                let text = child.text().unwrap_or_default();
                if is_not_whitespace(text) {
                    self.add_error(
                        Issue::new(
                            IssueKind::Units,
                            format!(
                                "Units '{}' has an invalid non-whitespace child text element '{}'.",
                                units.name, text
                            ),
                        )
                        .with_source(EntityRef::Units(units.name.clone())),
                    );
                }
            } else {
                self.add_error(
                    Issue::new(
                        IssueKind::Units,
                        format!(
                            "Units '{}' has an invalid child element '{}'.",
                            units.name,
                            node_name(child)
                        ),
                    )
                    .with_source(EntityRef::Units(units.name.clone())),
                );
            }
        }
    }

    fn load_unit(&mut self, units: &mut Units, node: Node) {
        let mut reference = String::new();
        let mut prefix = String::new();
        let mut exponent = 1.0;
        let mut multiplier = 1.0;
        let mut offset = 0.0;
        // A unit should not have any children.
        for child in node.children() {
            if child.is_text() {
                let text = child.text().unwrap_or_default();
                if is_not_whitespace(text) {
                    self.add_error(
                        Issue::new(
                            IssueKind::Units,
                            format!(
                                "Unit '{}' in units '{}' has an invalid non-whitespace child text element '{}'.",
                                attribute_value(node, "units"),
                                units.name,
                                text
                            ),
                        )
                        .with_source(EntityRef::Units(units.name.clone())),
                    );
                }
            } else {
                self.add_error(
                    Issue::new(
                        IssueKind::Units,
                        format!(
                            "Unit '{}' in units '{}' has an invalid child element '{}'.",
                            attribute_value(node, "units"),
                            units.name,
                            node_name(child)
                        ),
                    )
                    .with_source(EntityRef::Units(units.name.clone())),
                );
            }
        }
        for attribute in node.attributes() {
            match attribute.name() {
                "units" => reference = attribute.value().to_string(),
                "prefix" => prefix = attribute.value().to_string(),
                "exponent" => exponent = self.convert_unit_attribute(exponent, attribute, node, units),
                "multiplier" => {
                    multiplier = self.convert_unit_attribute(multiplier, attribute, node, units);
                }
                "offset" => offset = self.convert_unit_attribute(offset, attribute, node, units),
                other => {
                    self.add_error(
                        Issue::new(
                            IssueKind::Units,
                            format!(
                                "Unit '{}' in units '{}' has an invalid attribute '{}'.",
                                attribute_value(node, "units"),
                                units.name,
                                other
                            ),
                        )
                        .with_source(EntityRef::Units(units.name.clone())),
                    );
                }
            }
        }
        units.add_unit(&reference, &prefix, exponent, multiplier, offset);
    }

    /// Convert a numeric unit attribute, falling back to `default` when the
    /// value is not a decimal number.
    fn convert_unit_attribute(
        &mut self,
        default: f64,
        attribute: roxmltree::Attribute,
        node: Node,
        units: &Units,
    ) -> f64 {
        match attribute.value().parse::<f64>() {
            Ok(value) => value,
            Err(_) => {
                self.add_error(
                    Issue::new(
                        IssueKind::Units,
                        format!(
                            "Unit '{}' in units '{}' has an attribute '{}' with a value '{}' that cannot be converted to a decimal number.",
                            attribute_value(node, "units"),
                            units.name,
                            attribute.name(),
                            attribute.value()
                        ),
                    )
                    .with_source(EntityRef::Units(units.name.clone())),
                );
                default
            }
        }
    }

    fn load_variable(&mut self, variable: &mut Variable, node: Node) {
        // A variable should not have any children.
        for child in node.children() {
            if child.is_text() {
                let text = child.text().unwrap_or_default();
                if is_not_whitespace(text) {
                    self.add_error(
                        Issue::new(
                            IssueKind::Variable,
                            format!(
                                "Variable '{}' has an invalid non-whitespace child text element '{}'.",
                                attribute_value(node, "name"),
                                text
                            ),
                        )
                        .with_source(EntityRef::Variable(
                            attribute_value(node, "name").to_string(),
                        )),
                    );
                }
            } else {
                self.add_error(
                    Issue::new(
                        IssueKind::Variable,
                        format!(
                            "Variable '{}' has an invalid child element '{}'.",
                            attribute_value(node, "name"),
                            node_name(child)
                        ),
                    )
                    .with_source(EntityRef::Variable(
                        attribute_value(node, "name").to_string(),
                    )),
                );
            }
        }
        for attribute in node.attributes() {
            match attribute.name() {
                "name" => variable.name = attribute.value().to_string(),
                "id" => variable.id = attribute.value().to_string(),
                "units" => variable.units = attribute.value().to_string(),
                "interface" => variable.interface = attribute.value().to_string(),
                "initial_value" => variable.initial_value = attribute.value().to_string(),
                other => {
                    self.add_error(
                        Issue::new(
                            IssueKind::Variable,
                            format!(
                                "Variable '{}' has an invalid attribute '{}'.",
                                attribute_value(node, "name"),
                                other
                            ),
                        )
                        .with_source(EntityRef::Variable(
                            attribute_value(node, "name").to_string(),
                        )),
                    );
                }
            }
        }
    }

    fn load_import(&mut self, model: &mut Model, node: Node) {
        let mut import = Import::default();
        for attribute in node.attributes() {
            match attribute.name() {
                "href" => import.href = attribute.value().to_string(),
                "id" => import.id = attribute.value().to_string(),
                _ if attribute.namespace() == Some(crate::XLINK_NAMESPACE) => {
                    // xlink attributes are permitted and carry no meaning
                    // for the model itself.
                }
                other => {
                    self.add_error(
                        Issue::new(
                            IssueKind::Import,
                            format!(
                                "Import from '{}' has an invalid attribute '{}'.",
                                attribute_value(node, "href"),
                                other
                            ),
                        )
                        .with_source(EntityRef::Import(
                            attribute_value(node, "href").to_string(),
                        )),
                    );
                }
            }
        }
        let index = model.add_import(import);
        for child in node.children() {
            if child.is_element() {
                match child.tag_name().name() {
                    "component" => {
                        let mut component = Component::default();
                        let mut error_occurred = false;
                        for attribute in child.attributes() {
                            match attribute.name() {
                                "name" => component.name = attribute.value().to_string(),
                                "id" => component.id = attribute.value().to_string(),
                                "component_ref" => {
                                    component.set_import_source(index, attribute.value());
                                }
                                other => {
                                    self.add_error(
                                        Issue::new(
                                            IssueKind::Import,
                                            format!(
                                                "Import of component '{}' from '{}' has an invalid attribute '{}'.",
                                                attribute_value(child, "name"),
                                                attribute_value(node, "href"),
                                                other
                                            ),
                                        )
                                        .with_source(EntityRef::Import(
                                            attribute_value(node, "href").to_string(),
                                        )),
                                    );
                                    error_occurred = true;
                                }
                            }
                        }
                        // A faulty row is discarded as a whole.
                        if !error_occurred {
                            model.add_component(component);
                        }
                    }
                    "units" => {
                        let mut units = Units::default();
                        let mut error_occurred = false;
                        for attribute in child.attributes() {
                            match attribute.name() {
                                "name" => units.name = attribute.value().to_string(),
                                "id" => units.id = attribute.value().to_string(),
                                "units_ref" => {
                                    units.set_import_source(index, attribute.value());
                                }
                                other => {
                                    self.add_error(
                                        Issue::new(
                                            IssueKind::Import,
                                            format!(
                                                "Import of units '{}' from '{}' has an invalid attribute '{}'.",
                                                attribute_value(child, "name"),
                                                attribute_value(node, "href"),
                                                other
                                            ),
                                        )
                                        .with_source(EntityRef::Import(
                                            attribute_value(node, "href").to_string(),
                                        )),
                                    );
                                    error_occurred = true;
                                }
                            }
                        }
                        if !error_occurred {
                            model.add_units(units);
                        }
                    }
                    other => {
                        self.add_error(
                            Issue::new(
                                IssueKind::Import,
                                format!(
                                    "Import from '{}' has an invalid child element '{}'.",
                                    attribute_value(node, "href"),
                                    other
                                ),
                            )
                            .with_source(EntityRef::Import(
                                attribute_value(node, "href").to_string(),
                            )),
                        );
                    }
                }
            } else if child.is_text() {
                let text = child.text().unwrap_or_default();
                if is_not_whitespace(text) {
                    self.add_error(
                        Issue::new(
                            IssueKind::Import,
                            format!(
                                "Import from '{}' has an invalid non-whitespace child text element '{}'.",
                                attribute_value(node, "href"),
                                text
                            ),
                        )
                        .with_source(EntityRef::Import(
                            attribute_value(node, "href").to_string(),
                        )),
                    );
                }
            } else {
                self.add_error(
                    Issue::new(
                        IssueKind::Import,
                        format!(
                            "Import from '{}' has an invalid child element '{}'.",
                            attribute_value(node, "href"),
                            node_name(child)
                        ),
                    )
                    .with_source(EntityRef::Import(
                        attribute_value(node, "href").to_string(),
                    )),
                );
            }
        }
    }
}

/// Value of the named attribute on `node`, or the empty string. Matches by
/// local name, so a namespaced attribute such as `xlink:href` is found
/// under `href`.
pub(crate) fn attribute_value<'a>(node: Node<'a, '_>, name: &str) -> &'a str {
    node.attributes()
        .find(|a| a.name() == name)
        .map_or("", |a| a.value())
}

/// Display name of a node for diagnostics: the tag name for elements, a
/// sentinel for the other node types.
pub(crate) fn node_name(node: Node) -> String {
    match node.node_type() {
        NodeType::Element => node.tag_name().name().to_string(),
        NodeType::Text => "text".to_string(),
        NodeType::Comment => "comment".to_string(),
        NodeType::PI => node
            .pi()
            .map_or_else(|| "pi".to_string(), |pi| pi.target.to_string()),
        NodeType::Root => "document".to_string(),
    }
}

/// The raw serialized form of `node`, recovered from the source text.
pub(crate) fn raw_xml<'a, 'input>(node: Node<'a, 'input>) -> &'input str {
    &node.document().input_text()[node.range()]
}
