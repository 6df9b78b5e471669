use crate::parser::Format;
use crate::{CELLML_NAMESPACE, Component, Model, Reset, Units, Variable, XLINK_NAMESPACE};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::collections::{BTreeMap, HashMap};

/// Structural printer: the deterministic inverse of [`crate::Parser`].
///
/// `print_model` emits a complete document in a canonical shape: the XML
/// declaration, one namespaced `model` element, and inside it imports,
/// units, components (flattened in pre-order), the encapsulation tree, and
/// connections. The remaining printers emit element-only fragments without
/// declaration or namespace.
#[derive(Debug, Clone, Default)]
pub struct Printer {
    format: Format,
}

impl Printer {
    #[must_use]
    pub fn new(format: Format) -> Self {
        Printer { format }
    }

    #[must_use]
    pub fn print_model(&self, model: &Model) -> String {
        match self.format {
            Format::Xml => {
                let mut writer = Writer::new(Vec::new());
                write_model(model, &mut writer).expect("writing to a buffer cannot fail");
                into_string(writer)
            }
        }
    }

    #[must_use]
    pub fn print_component(&self, component: &Component) -> String {
        match self.format {
            Format::Xml => {
                let mut writer = Writer::new(Vec::new());
                write_component(component, &mut writer).expect("writing to a buffer cannot fail");
                into_string(writer)
            }
        }
    }

    /// Print one units definition. A blank definition prints as nothing.
    #[must_use]
    pub fn print_units(&self, units: &Units) -> String {
        match self.format {
            Format::Xml => {
                if units.is_blank() {
                    return String::new();
                }
                let mut writer = Writer::new(Vec::new());
                write_units(units, &mut writer).expect("writing to a buffer cannot fail");
                into_string(writer)
            }
        }
    }

    #[must_use]
    pub fn print_variable(&self, variable: &Variable) -> String {
        match self.format {
            Format::Xml => {
                let mut writer = Writer::new(Vec::new());
                write_variable(variable, &mut writer).expect("writing to a buffer cannot fail");
                into_string(writer)
            }
        }
    }

    #[must_use]
    pub fn print_reset(&self, reset: &Reset) -> String {
        match self.format {
            Format::Xml => {
                let mut writer = Writer::new(Vec::new());
                write_reset(reset, &mut writer).expect("writing to a buffer cannot fail");
                into_string(writer)
            }
        }
    }
}

fn into_string(writer: Writer<Vec<u8>>) -> String {
    String::from_utf8_lossy(&writer.into_inner()).into_owned()
}

fn write_model(model: &Model, writer: &mut Writer<Vec<u8>>) -> quick_xml::Result<()> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;

    let mut start = BytesStart::new("model");
    start.push_attribute(("xmlns", CELLML_NAMESPACE));
    if !model.name.is_empty() {
        start.push_attribute(("name", model.name.as_str()));
    }
    if !model.id.is_empty() {
        start.push_attribute(("id", model.id.as_str()));
    }

    let connections = collect_connections(model);
    let has_children = !model.imports.is_empty()
        || model.units.iter().any(|u| !u.is_import() && !u.is_blank())
        || model.components.iter().any(|c| !c.is_import())
        || !connections.is_empty();
    if !has_children {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;

    for (index, _) in model.imports.iter().enumerate() {
        write_import(model, index, writer)?;
    }
    for units in model.units.iter().filter(|u| !u.is_import() && !u.is_blank()) {
        write_units(units, writer)?;
    }
    for component in model.components.iter().filter(|c| !c.is_import()) {
        write_component_tree(component, writer)?;
    }
    write_encapsulation(model, writer)?;
    for connection in &connections {
        write_connection(connection, writer)?;
    }

    writer.write_event(Event::End(BytesEnd::new("model")))?;
    Ok(())
}

fn write_import(
    model: &Model,
    index: usize,
    writer: &mut Writer<Vec<u8>>,
) -> quick_xml::Result<()> {
    let import = &model.imports[index];
    let mut start = BytesStart::new("import");
    if !import.href.is_empty() {
        start.push_attribute(("xlink:href", import.href.as_str()));
    }
    start.push_attribute(("xmlns:xlink", XLINK_NAMESPACE));
    if !import.id.is_empty() {
        start.push_attribute(("id", import.id.as_str()));
    }

    let components: Vec<&Component> = model
        .components
        .iter()
        .filter(|c| c.import_source.as_ref().is_some_and(|s| s.index == index))
        .collect();
    let units: Vec<&Units> = model
        .units
        .iter()
        .filter(|u| u.import_source.as_ref().is_some_and(|s| s.index == index))
        .collect();
    if components.is_empty() && units.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for component in components {
        let mut element = BytesStart::new("component");
        if let Some(source) = &component.import_source
            && !source.reference.is_empty()
        {
            element.push_attribute(("component_ref", source.reference.as_str()));
        }
        if !component.name.is_empty() {
            element.push_attribute(("name", component.name.as_str()));
        }
        if !component.id.is_empty() {
            element.push_attribute(("id", component.id.as_str()));
        }
        writer.write_event(Event::Empty(element))?;
    }
    for units in units {
        let mut element = BytesStart::new("units");
        if let Some(source) = &units.import_source
            && !source.reference.is_empty()
        {
            element.push_attribute(("units_ref", source.reference.as_str()));
        }
        if !units.name.is_empty() {
            element.push_attribute(("name", units.name.as_str()));
        }
        if !units.id.is_empty() {
            element.push_attribute(("id", units.id.as_str()));
        }
        writer.write_event(Event::Empty(element))?;
    }
    writer.write_event(Event::End(BytesEnd::new("import")))?;
    Ok(())
}

fn write_units(units: &Units, writer: &mut Writer<Vec<u8>>) -> quick_xml::Result<()> {
    let mut start = BytesStart::new("units");
    if !units.name.is_empty() {
        start.push_attribute(("name", units.name.as_str()));
    }
    if let Some(base_unit) = units.base_unit {
        start.push_attribute(("base_unit", if base_unit { "yes" } else { "no" }));
    }
    if !units.id.is_empty() {
        start.push_attribute(("id", units.id.as_str()));
    }
    if units.units.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for unit in &units.units {
        let exponent = unit.exponent.to_string();
        let multiplier = unit.multiplier.to_string();
        let offset = unit.offset.to_string();
        let mut element = BytesStart::new("unit");
        if !unit.reference.is_empty() {
            element.push_attribute(("units", unit.reference.as_str()));
        }
        if !unit.prefix.is_empty() {
            element.push_attribute(("prefix", unit.prefix.as_str()));
        }
        // Attributes still at their default are left out.
        if unit.exponent != 1.0 {
            element.push_attribute(("exponent", exponent.as_str()));
        }
        if unit.multiplier != 1.0 {
            element.push_attribute(("multiplier", multiplier.as_str()));
        }
        if unit.offset != 0.0 {
            element.push_attribute(("offset", offset.as_str()));
        }
        writer.write_event(Event::Empty(element))?;
    }
    writer.write_event(Event::End(BytesEnd::new("units")))?;
    Ok(())
}

/// Write one component element: attributes, units, variables, and math.
/// Encapsulated children are not written here; the model printer emits
/// them as their own elements and re-creates the nesting in the
/// encapsulation block.
fn write_component(component: &Component, writer: &mut Writer<Vec<u8>>) -> quick_xml::Result<()> {
    let mut start = BytesStart::new("component");
    if !component.name.is_empty() {
        start.push_attribute(("name", component.name.as_str()));
    }
    if !component.id.is_empty() {
        start.push_attribute(("id", component.id.as_str()));
    }
    let has_units = component.units.iter().any(|u| !u.is_blank());
    if !has_units && component.variables.is_empty() && component.math.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for units in component.units.iter().filter(|u| !u.is_blank()) {
        write_units(units, writer)?;
    }
    for variable in &component.variables {
        write_variable(variable, writer)?;
    }
    if !component.math.is_empty() {
        // Math is an opaque, already-serialized fragment.
        writer.write_event(Event::Text(BytesText::from_escaped(component.math.as_str())))?;
    }
    writer.write_event(Event::End(BytesEnd::new("component")))?;
    Ok(())
}

fn write_component_tree(
    component: &Component,
    writer: &mut Writer<Vec<u8>>,
) -> quick_xml::Result<()> {
    write_component(component, writer)?;
    for child in &component.components {
        write_component_tree(child, writer)?;
    }
    Ok(())
}

fn write_variable(variable: &Variable, writer: &mut Writer<Vec<u8>>) -> quick_xml::Result<()> {
    let mut start = BytesStart::new("variable");
    if !variable.name.is_empty() {
        start.push_attribute(("name", variable.name.as_str()));
    }
    if !variable.units.is_empty() {
        start.push_attribute(("units", variable.units.as_str()));
    }
    if !variable.interface.is_empty() {
        start.push_attribute(("interface", variable.interface.as_str()));
    }
    if !variable.initial_value.is_empty() {
        start.push_attribute(("initial_value", variable.initial_value.as_str()));
    }
    if !variable.id.is_empty() {
        start.push_attribute(("id", variable.id.as_str()));
    }
    writer.write_event(Event::Empty(start))?;
    Ok(())
}

fn write_reset(reset: &Reset, writer: &mut Writer<Vec<u8>>) -> quick_xml::Result<()> {
    let order = reset.order.map(|order| order.to_string());
    let mut start = BytesStart::new("reset");
    if let Some(order) = &order {
        start.push_attribute(("order", order.as_str()));
    }
    if !reset.id.is_empty() {
        start.push_attribute(("id", reset.id.as_str()));
    }
    writer.write_event(Event::Empty(start))?;
    Ok(())
}

fn write_encapsulation(model: &Model, writer: &mut Writer<Vec<u8>>) -> quick_xml::Result<()> {
    let parents: Vec<&Component> = model
        .components
        .iter()
        .filter(|c| !c.is_import() && !c.components.is_empty())
        .collect();
    if parents.is_empty() {
        return Ok(());
    }
    writer.write_event(Event::Start(BytesStart::new("encapsulation")))?;
    for parent in parents {
        write_component_ref(parent, writer)?;
    }
    writer.write_event(Event::End(BytesEnd::new("encapsulation")))?;
    Ok(())
}

fn write_component_ref(
    component: &Component,
    writer: &mut Writer<Vec<u8>>,
) -> quick_xml::Result<()> {
    let mut start = BytesStart::new("component_ref");
    if !component.name.is_empty() {
        start.push_attribute(("component", component.name.as_str()));
    }
    if component.components.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for child in &component.components {
        write_component_ref(child, writer)?;
    }
    writer.write_event(Event::End(BytesEnd::new("component_ref")))?;
    Ok(())
}

/// One `<connection>` element to be emitted: a component pair and its
/// variable pairs.
struct Connection {
    component_1: String,
    component_2: String,
    variables: Vec<(String, String)>,
}

/// Enumerate the variable equivalences of a model as a canonical list of
/// connections: components are numbered by flattened pre-order insertion,
/// every undirected edge is claimed by its lesser endpoint, and pairs are
/// sorted by variable insertion index. The enumeration is stable, so
/// printing is idempotent across a parse/print round trip.
fn collect_connections(model: &Model) -> Vec<Connection> {
    fn flatten<'a>(component: &'a Component, order: &mut Vec<&'a Component>) {
        order.push(component);
        for child in &component.components {
            flatten(child, order);
        }
    }
    let mut order: Vec<&Component> = Vec::new();
    for component in &model.components {
        flatten(component, &mut order);
    }
    let mut index_of: HashMap<&str, usize> = HashMap::new();
    for (index, component) in order.iter().enumerate() {
        index_of.entry(component.name.as_str()).or_insert(index);
    }

    let mut groups: BTreeMap<(usize, usize), Vec<(usize, usize)>> = BTreeMap::new();
    for (first_component, component) in order.iter().enumerate() {
        for (first_variable, variable) in component.variables.iter().enumerate() {
            for peer in &variable.equivalences {
                let Some(&second_component) = index_of.get(peer.component.as_str()) else {
                    continue;
                };
                let Some(second_variable) = order[second_component]
                    .variables
                    .iter()
                    .position(|v| v.name == peer.variable)
                else {
                    continue;
                };
                if (first_component, first_variable) < (second_component, second_variable) {
                    groups
                        .entry((first_component, second_component))
                        .or_default()
                        .push((first_variable, second_variable));
                }
            }
        }
    }

    groups
        .into_iter()
        .map(|((first, second), mut pairs)| {
            pairs.sort_unstable();
            pairs.dedup();
            Connection {
                component_1: order[first].name.clone(),
                component_2: order[second].name.clone(),
                variables: pairs
                    .into_iter()
                    .map(|(a, b)| {
                        (
                            order[first].variables[a].name.clone(),
                            order[second].variables[b].name.clone(),
                        )
                    })
                    .collect(),
            }
        })
        .collect()
}

fn write_connection(
    connection: &Connection,
    writer: &mut Writer<Vec<u8>>,
) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("connection")))?;
    let mut map_components = BytesStart::new("map_components");
    if !connection.component_1.is_empty() {
        map_components.push_attribute(("component_1", connection.component_1.as_str()));
    }
    if !connection.component_2.is_empty() {
        map_components.push_attribute(("component_2", connection.component_2.as_str()));
    }
    writer.write_event(Event::Empty(map_components))?;
    for (variable_1, variable_2) in &connection.variables {
        let mut map_variables = BytesStart::new("map_variables");
        map_variables.push_attribute(("variable_1", variable_1.as_str()));
        map_variables.push_attribute(("variable_2", variable_2.as_str()));
        writer.write_event(Event::Empty(map_variables))?;
    }
    writer.write_event(Event::End(BytesEnd::new("connection")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::{encapsulated_model, simple_model};
    use crate::{Format, Import, Parser, VariableRef};

    fn printer() -> Printer {
        Printer::new(Format::Xml)
    }

    #[test]
    fn empty_model() {
        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                        <model xmlns=\"http://www.cellml.org/cellml/2.0#\"/>";
        assert_eq!(printer().print_model(&Model::default()), expected);
    }

    #[test]
    fn named_model_with_id() {
        let mut model = Model::new("m");
        model.id = "mid".to_string();
        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                        <model xmlns=\"http://www.cellml.org/cellml/2.0#\" name=\"m\" id=\"mid\"/>";
        assert_eq!(printer().print_model(&model), expected);
    }

    #[test]
    fn empty_fragments() {
        assert_eq!(printer().print_component(&Component::default()), "<component/>");
        assert_eq!(printer().print_variable(&Variable::default()), "<variable/>");
        assert_eq!(printer().print_reset(&Reset::default()), "<reset/>");
        assert_eq!(printer().print_units(&Units::default()), "");
    }

    #[test]
    fn variable_fragment_attribute_order() {
        let mut variable = Variable::new("V");
        variable.units = "millivolt".to_string();
        variable.interface = "public".to_string();
        variable.initial_value = "-84.624".to_string();
        variable.id = "v1".to_string();
        assert_eq!(
            printer().print_variable(&variable),
            "<variable name=\"V\" units=\"millivolt\" interface=\"public\" initial_value=\"-84.624\" id=\"v1\"/>"
        );
    }

    #[test]
    fn units_fragment_omits_default_unit_attributes() {
        let mut units = Units::new("millivolt_per_hour");
        units.base_unit = Some(false);
        units.add_unit("volt", "milli", 1.0, 1.0, 0.0);
        units.add_unit("hour", "", -1.0, 2.5, 0.0);
        assert_eq!(
            printer().print_units(&units),
            "<units name=\"millivolt_per_hour\" base_unit=\"no\">\
             <unit units=\"volt\" prefix=\"milli\"/>\
             <unit units=\"hour\" exponent=\"-1\" multiplier=\"2.5\"/>\
             </units>"
        );
    }

    #[test]
    fn reset_with_order() {
        assert_eq!(printer().print_reset(&Reset::new(3)), "<reset order=\"3\"/>");
    }

    #[test]
    fn component_fragment_with_math() {
        let mut component = Component::new("membrane");
        component.add_variable(Variable::new("V"));
        component.math = "<math><ci>V</ci></math>".to_string();
        assert_eq!(
            printer().print_component(&component),
            "<component name=\"membrane\"><variable name=\"V\"/><math><ci>V</ci></math></component>"
        );
    }

    #[test]
    fn encapsulation_without_names() {
        let mut model = Model::default();
        let mut parent = Component::default();
        parent.add_component(Component::default());
        model.add_component(parent);
        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                        <model xmlns=\"http://www.cellml.org/cellml/2.0#\">\
                        <component/>\
                        <component/>\
                        <encapsulation>\
                        <component_ref>\
                        <component_ref/>\
                        </component_ref>\
                        </encapsulation>\
                        </model>";
        assert_eq!(printer().print_model(&model), expected);
    }

    #[test]
    fn encapsulation_with_names() {
        let model = encapsulated_model();
        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                        <model xmlns=\"http://www.cellml.org/cellml/2.0#\" name=\"nested\">\
                        <component name=\"parent_component\"/>\
                        <component name=\"child_component\"/>\
                        <encapsulation>\
                        <component_ref component=\"parent_component\">\
                        <component_ref component=\"child_component\"/>\
                        </component_ref>\
                        </encapsulation>\
                        </model>";
        assert_eq!(printer().print_model(&model), expected);
        // A child component printed on its own is an ordinary fragment.
        let child = model.component(0).unwrap().component(0).unwrap();
        assert_eq!(printer().print_component(child), "<component name=\"child_component\"/>");
    }

    #[test]
    fn imported_component_is_printed_inside_its_import() {
        let mut model = Model::default();
        let index = model.add_import(Import::new("some-other-model.xml"));
        let mut component = Component::new("component_in_this_model");
        component.set_import_source(index, "a_component_in_that_model");
        model.add_component(component);
        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                        <model xmlns=\"http://www.cellml.org/cellml/2.0#\">\
                        <import xlink:href=\"some-other-model.xml\" xmlns:xlink=\"http://www.w3.org/1999/xlink\">\
                        <component component_ref=\"a_component_in_that_model\" name=\"component_in_this_model\"/>\
                        </import>\
                        </model>";
        assert_eq!(printer().print_model(&model), expected);
    }

    #[test]
    fn multiple_imports_keep_their_own_entities() {
        let mut model = Model::default();
        let first = model.add_import(Import::new("some-other-model.xml"));
        let second = model.add_import(Import::new("some-other-model.xml"));
        let mut c1 = Component::new("c1");
        c1.set_import_source(first, "cc1");
        model.add_component(c1);
        let mut c2 = Component::new("c2");
        c2.set_import_source(first, "cc2");
        model.add_component(c2);
        let mut c3 = Component::new("c3");
        c3.set_import_source(second, "cc1");
        model.add_component(c3);

        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                        <model xmlns=\"http://www.cellml.org/cellml/2.0#\">\
                        <import xlink:href=\"some-other-model.xml\" xmlns:xlink=\"http://www.w3.org/1999/xlink\">\
                        <component component_ref=\"cc1\" name=\"c1\"/>\
                        <component component_ref=\"cc2\" name=\"c2\"/>\
                        </import>\
                        <import xlink:href=\"some-other-model.xml\" xmlns:xlink=\"http://www.w3.org/1999/xlink\">\
                        <component component_ref=\"cc1\" name=\"c3\"/>\
                        </import>\
                        </model>";
        assert_eq!(printer().print_model(&model), expected);
    }

    #[test]
    fn connections_are_printed_in_canonical_order() {
        let model = simple_model();
        let output = printer().print_model(&model);
        let expected_tail = "<connection>\
                             <map_components component_1=\"membrane\" component_2=\"environment\"/>\
                             <map_variables variable_1=\"time\" variable_2=\"time\"/>\
                             </connection>\
                             </model>";
        assert!(output.ends_with(expected_tail));
    }

    #[test]
    fn full_model_output() {
        let model = simple_model();
        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                        <model xmlns=\"http://www.cellml.org/cellml/2.0#\" name=\"membrane_model\">\
                        <units name=\"millivolt\"><unit units=\"volt\" prefix=\"milli\"/></units>\
                        <component name=\"membrane\">\
                        <variable name=\"V\" units=\"millivolt\" initial_value=\"-84.624\"/>\
                        <variable name=\"time\" units=\"millisecond\"/>\
                        </component>\
                        <component name=\"environment\">\
                        <variable name=\"time\" units=\"millisecond\"/>\
                        </component>\
                        <connection>\
                        <map_components component_1=\"membrane\" component_2=\"environment\"/>\
                        <map_variables variable_1=\"time\" variable_2=\"time\"/>\
                        </connection>\
                        </model>";
        assert_eq!(printer().print_model(&model), expected);
    }

    #[test]
    fn attribute_values_are_escaped() {
        let mut model = Model::new("a\"b<c>&d");
        model.add_component(Component::new("x"));
        let output = printer().print_model(&model);
        assert!(output.contains("name=\"a&quot;b&lt;c&gt;&amp;d\""));
    }

    #[test]
    fn round_trip_preserves_structure() {
        let model = simple_model();
        let output = printer().print_model(&model);
        let mut parser = Parser::new(Format::Xml);
        let reparsed = parser.parse_model(&output);
        assert_eq!(parser.error_count(), 0);
        assert!(reparsed.structurally_equals(&model));
    }

    #[test]
    fn round_trip_preserves_encapsulation() {
        let model = encapsulated_model();
        let output = printer().print_model(&model);
        let mut parser = Parser::new(Format::Xml);
        let reparsed = parser.parse_model(&output);
        assert_eq!(parser.error_count(), 0);
        assert!(reparsed.structurally_equals(&model));
    }

    #[test]
    fn printing_is_idempotent_across_round_trips() {
        let mut model = simple_model();
        // A second equivalence added in "reverse" order still has to come
        // out in canonical order every time.
        model.add_equivalence(
            &VariableRef::new("environment", "time"),
            &VariableRef::new("membrane", "V"),
        );
        let first = printer().print_model(&model);
        let mut parser = Parser::new(Format::Xml);
        let reparsed = parser.parse_model(&first);
        assert_eq!(parser.error_count(), 0);
        let second = printer().print_model(&reparsed);
        assert_eq!(first, second);
    }
}
