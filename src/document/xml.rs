use std::io;

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{Document, Element, NodeId};
use crate::error::AlignmentError;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

pub fn parse_document(markup: &str) -> Result<Document, AlignmentError> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let parsed = roxmltree::Document::parse_with_options(markup, options)?;
    let root_node = parsed.root_element();

    let mut doc = Document::new(element_from_node(root_node));
    let root_id = doc.root();
    append_children(&mut doc, root_id, root_node);
    Ok(doc)
}

fn element_from_node(node: roxmltree::Node<'_, '_>) -> Element {
    let tag = node.tag_name();
    let mut element = Element::new(qualified_name(node, tag.namespace(), tag.name()));
    element.attributes = declarations(node);
    for attr in node.attributes() {
        let name = match attr.namespace() {
            Some(XML_NAMESPACE) => format!("xml:{}", attr.name()),
            Some(uri) => qualified_name(node, Some(uri), attr.name()),
            None => attr.name().to_string(),
        };
        element.attributes.push((name, attr.value().to_string()));
    }
    element
}

fn qualified_name(node: roxmltree::Node<'_, '_>, uri: Option<&str>, local: &str) -> String {
    match uri.and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
        _ => local.to_string(),
    }
}

/// Namespace bindings that are new on `node` compared with its parent
/// element, as `xmlns` attributes.
fn declarations(node: roxmltree::Node<'_, '_>) -> Vec<(String, String)> {
    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|parent| parent.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();
    node.namespaces()
        .filter(|ns| ns.uri() != XML_NAMESPACE)
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| {
            let name = match ns.name() {
                Some(prefix) => format!("xmlns:{prefix}"),
                None => "xmlns".to_string(),
            };
            (name, ns.uri().to_string())
        })
        .collect()
}

// Comments and processing instructions are dropped; the text around them is
// kept in place.
fn append_children(doc: &mut Document, parent: NodeId, node: roxmltree::Node<'_, '_>) {
    for child in node.children() {
        if child.is_element() {
            let id = doc.append_child(parent, element_from_node(child));
            append_children(doc, id, child);
        } else if child.is_text() {
            let text = child.text().unwrap_or_default();
            match doc.last_child(parent) {
                Some(last) => doc.node_mut(last).tail.push_str(text),
                None => doc.node_mut(parent).text.push_str(text),
            }
        }
    }
}

pub(super) fn write_document(doc: &Document, declaration: bool) -> Result<String, AlignmentError> {
    let mut writer = Writer::new(Vec::new());
    if declaration {
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| AlignmentError::io("serialize markup", e))?;
        writer.get_mut().push(b'\n');
    }
    write_element(&mut writer, doc, doc.root())
        .map_err(|e| AlignmentError::io("serialize markup", e))?;
    String::from_utf8(writer.into_inner())
        .map_err(|e| AlignmentError::invalid_input(format!("serialized markup is not UTF-8: {e}")))
}

fn write_element(writer: &mut Writer<Vec<u8>>, doc: &Document, id: NodeId) -> io::Result<()> {
    let node = doc.node(id);
    let mut start = BytesStart::new(node.tag.as_str());
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if node.text.is_empty() && node.children().is_empty() {
        return writer.write_event(Event::Empty(start));
    }

    writer.write_event(Event::Start(start))?;
    write_text(writer, &node.text)?;
    for &child in node.children() {
        write_element(writer, doc, child)?;
        write_text(writer, &doc.node(child).tail)?;
    }
    writer.write_event(Event::End(BytesEnd::new(node.tag.as_str())))
}

fn write_text(writer: &mut Writer<Vec<u8>>, text: &str) -> io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))
}
