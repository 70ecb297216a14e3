// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

//! Evaluates an [`Action`] against a single document.
//!
//! Every mutating operation stops at the first qualifying element and reports whether
//! it changed anything. Finding nothing is not an error.


use std::ops::ControlFlow;

use crate::{
    action::{Action, FixedKey, Matcher, Position, PropertyQuery},
    document::{Document, Mapping, Node, Scalar},
    error::Result,
    literal::replace_literal,
    locator::SectionLocator,
};

/// Applies `action` to `doc`, returning true if the document changed.
pub fn apply(doc: &mut Document, action: &Action) -> Result<bool> {
    doc.check_usable()?;

    let applied = match action {
        Action::ResetFixedKey(key) => reset_fixed_key(doc.root_mut(), *key),
        Action::ReplaceLiteral { find, replace, global } => replace_literal(doc, find, replace, *global)?,
        Action::OverrideElement { scope, .. } => SectionLocator::new(scope)
            .visit_entries_mut(doc.root_mut(), |key, node| override_element(action, key, node)),
        Action::Insert { scope, .. }
        | Action::Update { scope, .. }
        | Action::Delete { scope, .. }
        | Action::SetProperty { scope, .. }
        | Action::PrependLine { scope, .. } => {
            SectionLocator::new(scope).visit_mut(doc.root_mut(), |node| match node {
                Node::Sequence(seq) => edit_sequence(action, seq),
                Node::Mapping(_) | Node::Scalar(_) => ControlFlow::Continue(()),
            })
        }
    };
    Ok(applied)
}

/// Collects the values of `query.property` across every element carrying
/// `query.section_type`. Never stops early.
pub fn read_property(root: &Mapping, query: &PropertyQuery) -> Vec<String> {
    let mut values = Vec::new();
    SectionLocator::new(&query.scope).visit(root, |node| {
        let Node::Sequence(seq) = node else {
            return ControlFlow::Continue(());
        };

        for element in seq {
            let Some(map) = element.as_mapping() else {
                continue;
            };
            if !map.contains_key(query.section_type.as_str()) {
                continue;
            }
            if let Some(value) = map.get(query.property.as_str()).and_then(Node::as_str) {
                values.push(value.to_string());
            }
        }
        ControlFlow::Continue(())
    });
    values
}

/// Evaluates `matcher` against one sequence element.
pub fn matches(matcher: &Matcher, element: &Node) -> bool {
    let Some(map) = element.as_mapping() else {
        return false;
    };

    match matcher {
        Matcher::Identifier {
            section_type,
            identifier,
        } => map
            .get(section_type.as_str())
            .map_or(false, |value| value.is_scalar(identifier)),
        Matcher::TypeAndProperty {
            section_type,
            property,
            value,
        } => {
            // Both flags are scoped to this element.
            let mut type_matched = false;
            let mut property_matched = false;
            for (key, entry_value) in map {
                if key == section_type {
                    type_matched = true;
                }
                if key == property && entry_value.is_scalar(value) {
                    property_matched = true;
                }
            }
            type_matched && property_matched
        }
        Matcher::Property { property, value } => map
            .get(property.as_str())
            .map_or(false, |entry_value| entry_value.is_scalar(value)),
    }
}

fn edit_sequence(action: &Action, seq: &mut Vec<Node>) -> ControlFlow<()> {
    match action {
        Action::Insert {
            matcher,
            position,
            payload,
            ..
        } => {
            let Some(index) = find(matcher, seq) else {
                return ControlFlow::Continue(());
            };
            let index = match position {
                Position::Before => index,
                Position::After => index + 1,
            };
            seq.insert(index, payload.clone());
        }
        Action::Update { matcher, payload, .. } => {
            let Some(index) = find(matcher, seq) else {
                return ControlFlow::Continue(());
            };
            seq[index] = payload.clone();
        }
        Action::Delete { matcher, .. } => {
            let Some(index) = find(matcher, seq) else {
                return ControlFlow::Continue(());
            };
            seq.remove(index);
        }
        Action::SetProperty {
            matcher,
            property,
            value,
            ..
        } => {
            let Some(index) = find(matcher, seq) else {
                return ControlFlow::Continue(());
            };
            let Some(map) = seq[index].as_mapping_mut() else {
                return ControlFlow::Continue(());
            };
            set_entry(map, property, value.clone());
        }
        Action::PrependLine {
            matcher,
            inner,
            target_key,
            line,
            ..
        } => {
            let prepended = seq
                .iter_mut()
                .filter(|element| matches(matcher, element))
                .any(|element| prepend_line(element, inner.as_deref(), target_key, line));
            if !prepended {
                return ControlFlow::Continue(());
            }
        }
        Action::OverrideElement { .. } | Action::ResetFixedKey(_) | Action::ReplaceLiteral { .. } => {
            return ControlFlow::Continue(());
        }
    }
    ControlFlow::Break(())
}

fn find(matcher: &Matcher, seq: &[Node]) -> Option<usize> {
    seq.iter().position(|element| matches(matcher, element))
}

// Overwrites in place so the key keeps its position.
fn set_entry(map: &mut Mapping, key: &str, value: Node) {
    match map.get_mut(key) {
        Some(slot) => *slot = value,
        None => {
            map.insert(key.to_string(), value);
        }
    }
}

fn prepend_line(element: &mut Node, inner: Option<&str>, target_key: &str, line: &str) -> bool {
    let Some(map) = element.as_mapping_mut() else {
        return false;
    };
    let container = match inner {
        Some(inner) => match map.get_mut(inner).and_then(Node::as_mapping_mut) {
            Some(container) => container,
            None => return false,
        },
        None => map,
    };
    let Some(Node::Scalar(scalar)) = container.get_mut(target_key) else {
        return false;
    };

    scalar.text = if scalar.text.is_empty() {
        line.to_string()
    } else {
        format!("{}\n{}", line, scalar.text)
    };
    true
}

fn override_element(action: &Action, entry_key: &str, node: &mut Node) -> ControlFlow<()> {
    let Action::OverrideElement {
        scope,
        key_identifier,
        value_identifier,
        element_name,
        value,
        ..
    } = action
    else {
        return ControlFlow::Continue(());
    };

    match node {
        Node::Sequence(seq) => {
            for element in seq.iter_mut() {
                let Some(map) = element.as_mapping_mut() else {
                    continue;
                };
                let named = map
                    .get(key_identifier.as_str())
                    .map_or(false, |name| name.is_scalar(element_name));
                if !named {
                    continue;
                }
                if let Some(slot) = map.get_mut(value_identifier.as_str()) {
                    *slot = value.clone();
                    return ControlFlow::Break(());
                }
            }
            ControlFlow::Continue(())
        }
        // `variables: {myVar: old}` form, only directly under the scope's own label.
        Node::Mapping(_) if entry_key != scope.label => ControlFlow::Continue(()),
        Node::Mapping(map) => match map.get_mut(element_name.as_str()) {
            Some(slot @ Node::Scalar(_)) => {
                *slot = value.clone();
                ControlFlow::Break(())
            }
            _ => ControlFlow::Continue(()),
        },
        Node::Scalar(_) => ControlFlow::Continue(()),
    }
}

fn reset_fixed_key(root: &mut Mapping, key: FixedKey) -> bool {
    match root.get_mut(key.key()) {
        Some(slot) => {
            *slot = Node::Scalar(Scalar::plain(key.disabled_value()));
            true
        }
        None => false,
    }
}
