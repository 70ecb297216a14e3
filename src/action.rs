// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

//! The closed catalogue of edits that can be applied to a pipeline.
//!
//! An [`Action`] is immutable and can be applied to any number of documents; payloads
//! are cloned into each document that receives them.

use std::fmt;

use crate::{
    document::Node,
    error::{Error, Result},
};

/// Names the place a search starts from: every entry keyed `label` (and, if given,
/// whose scalar value is `value`) opens a scope in which sequences are searched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionScope {
    pub label: String,
    pub value: Option<String>,
}

impl SectionScope {
    pub fn new(label: impl Into<String>) -> SectionScope {
        SectionScope {
            label: label.into(),
            value: None,
        }
    }

    pub fn with_value(label: impl Into<String>, value: impl Into<String>) -> SectionScope {
        SectionScope {
            label: label.into(),
            value: Some(value.into()),
        }
    }

    /// True if the mapping entry `key: value` opens this scope.
    pub fn opens(&self, key: &str, value: &Node) -> bool {
        if key != self.label {
            return false;
        }
        match &self.value {
            Some(expected) => value.is_scalar(expected),
            None => true,
        }
    }
}

/// Selects one element of a sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Matcher {
    /// `section_type: identifier`, e.g. `stage: deploy`.
    Identifier { section_type: String, identifier: String },
    /// An element carrying `section_type` and `property: value`.
    TypeAndProperty {
        section_type: String,
        property: String,
        value: String,
    },
    /// Any element carrying `property: value`.
    Property { property: String, value: String },
}

impl Matcher {
    pub fn identifier(section_type: impl Into<String>, identifier: impl Into<String>) -> Matcher {
        Matcher::Identifier {
            section_type: section_type.into(),
            identifier: identifier.into(),
        }
    }

    pub fn type_and_property(
        section_type: impl Into<String>,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> Matcher {
        Matcher::TypeAndProperty {
            section_type: section_type.into(),
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn property(property: impl Into<String>, value: impl Into<String>) -> Matcher {
        Matcher::Property {
            property: property.into(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    Before,
    After,
}

/// Top-level keys that can be switched off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FixedKey {
    #[default]
    Trigger,
    PullRequest,
}

impl FixedKey {
    pub fn key(self) -> &'static str {
        match self {
            FixedKey::Trigger => "trigger",
            FixedKey::PullRequest => "pr",
        }
    }

    /// The value written in place of the key's original content.
    pub fn disabled_value(self) -> &'static str {
        "none"
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Insert {
        scope: SectionScope,
        matcher: Matcher,
        position: Position,
        payload: Node,
    },
    Update {
        scope: SectionScope,
        matcher: Matcher,
        payload: Node,
    },
    Delete {
        scope: SectionScope,
        matcher: Matcher,
    },
    SetProperty {
        scope: SectionScope,
        matcher: Matcher,
        property: String,
        value: Node,
    },
    /// Prepends `line` to the scalar under `target_key`, looked up in the matched
    /// element or, if `inner` is set, in the mapping under that key.
    PrependLine {
        scope: SectionScope,
        matcher: Matcher,
        inner: Option<String>,
        target_key: String,
        line: String,
    },
    /// Models a name/value pair split across two keys of one element, e.g.
    /// `- name: myVar` / `value: old`.
    OverrideElement {
        scope: SectionScope,
        key_identifier: String,
        value_identifier: String,
        element_name: String,
        value: Node,
    },
    ResetFixedKey(FixedKey),
    ReplaceLiteral {
        find: String,
        replace: String,
        global: bool,
    },
}

impl Action {
    pub fn insert_before(scope: SectionScope, matcher: Matcher, payload: Node) -> Action {
        Action::Insert {
            scope,
            matcher,
            position: Position::Before,
            payload,
        }
    }

    pub fn insert_after(scope: SectionScope, matcher: Matcher, payload: Node) -> Action {
        Action::Insert {
            scope,
            matcher,
            position: Position::After,
            payload,
        }
    }

    pub fn update(scope: SectionScope, matcher: Matcher, payload: Node) -> Action {
        Action::Update { scope, matcher, payload }
    }

    pub fn delete(scope: SectionScope, matcher: Matcher) -> Action {
        Action::Delete { scope, matcher }
    }

    pub fn set_property(
        scope: SectionScope,
        matcher: Matcher,
        property: impl Into<String>,
        value: impl Into<Node>,
    ) -> Action {
        Action::SetProperty {
            scope,
            matcher,
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn prepend_line(
        scope: SectionScope,
        matcher: Matcher,
        inner: Option<String>,
        target_key: impl Into<String>,
        line: impl Into<String>,
    ) -> Action {
        Action::PrependLine {
            scope,
            matcher,
            inner,
            target_key: target_key.into(),
            line: line.into(),
        }
    }

    pub fn override_element(
        scope: SectionScope,
        key_identifier: impl Into<String>,
        value_identifier: impl Into<String>,
        element_name: impl Into<String>,
        value: impl Into<Node>,
    ) -> Action {
        Action::OverrideElement {
            scope,
            key_identifier: key_identifier.into(),
            value_identifier: value_identifier.into(),
            element_name: element_name.into(),
            value: value.into(),
        }
    }

    pub fn reset(key: FixedKey) -> Action {
        Action::ResetFixedKey(key)
    }

    pub fn replace_literal(find: impl Into<String>, replace: impl Into<String>, global: bool) -> Action {
        Action::ReplaceLiteral {
            find: find.into(),
            replace: replace.into(),
            global,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Insert {
                position: Position::Before,
                ..
            } => "insert-before",
            Action::Insert {
                position: Position::After,
                ..
            } => "insert-after",
            Action::Update { .. } => "update",
            Action::Delete { .. } => "delete",
            Action::SetProperty { .. } => "set-property",
            Action::PrependLine { .. } => "prepend-line",
            Action::OverrideElement { .. } => "override-element",
            Action::ResetFixedKey(_) => "reset",
            Action::ReplaceLiteral { .. } => "replace-literal",
        }
    }

    /// Checks the parts of an action that do not depend on any document.
    pub fn validate(&self) -> Result<()> {
        match self {
            Action::Insert { payload, .. } | Action::Update { payload, .. } => match payload {
                Node::Mapping(_) => Ok(()),
                Node::Scalar(_) | Node::Sequence(_) => Err(Error::MalformedPayload {
                    action: self.to_string(),
                    message: "payload must be a mapping".to_string(),
                }),
            },
            Action::ReplaceLiteral { find, .. } if find.is_empty() => Err(Error::MalformedPayload {
                action: self.to_string(),
                message: "text to find must not be empty".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// Read-only query collecting every scalar under `property` in elements that carry
/// `section_type`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyQuery {
    pub scope: SectionScope,
    pub section_type: String,
    pub property: String,
}

impl PropertyQuery {
    pub fn new(scope: SectionScope, section_type: impl Into<String>, property: impl Into<String>) -> PropertyQuery {
        PropertyQuery {
            scope,
            section_type: section_type.into(),
            property: property.into(),
        }
    }
}

impl fmt::Display for SectionScope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&quote(&self.label))?;
        if let Some(value) = &self.value {
            write!(f, "={}", quote(value))?;
        }
        Ok(())
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Matcher::Identifier {
                section_type,
                identifier,
            } => write!(f, "{}={}", quote(section_type), quote(identifier)),
            Matcher::TypeAndProperty {
                section_type,
                property,
                value,
            } => write!(f, "{}[{}={}]", quote(section_type), quote(property), quote(value)),
            Matcher::Property { property, value } => write!(f, "[{}={}]", quote(property), quote(value)),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())?;
        match self {
            Action::Insert { scope, matcher, .. }
            | Action::Update { scope, matcher, .. }
            | Action::Delete { scope, matcher }
            | Action::SetProperty { scope, matcher, .. }
            | Action::PrependLine { scope, matcher, .. } => write!(f, " {}/{}", scope, matcher),
            Action::OverrideElement {
                scope, element_name, ..
            } => write!(f, " {} {}", scope, quote(element_name)),
            Action::ResetFixedKey(key) => write!(f, " {}", key.key()),
            Action::ReplaceLiteral { find, .. } => write!(f, " {:?}", find),
        }
    }
}

/// Quotes `value` if it can't be written as a bare selector word.
pub(crate) fn quote(value: &str) -> String {
    if !value.is_empty() && value.chars().all(is_bare_char) {
        value.to_string()
    } else {
        format!("{:?}", value)
    }
}

pub(crate) fn is_bare_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '@' | '$' | '(' | ')')
}
