// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

//! Finds the sequences an action operates on.
//!
//! The walk is depth-first and pre-order over mapping entries in document order. An
//! entry keyed with the scope's label raises the *found* flag:
//!
//! - `label` alone scopes the entry's own value, e.g. `stages:`.
//! - `label=value` scopes the mapping that holds the entry, e.g. `stage: deploy` scopes
//!   its sibling `jobs:`.
//!
//! The flag is inherited by everything below. While it is raised, every sequence or
//! mapping value is handed to the visitor, which may stop the walk. Scopes nested
//! inside a raised scope re-trigger, so the first match in document order wins.


use std::ops::ControlFlow;

use crate::{
    action::SectionScope,
    document::{Mapping, Node},
};

pub struct SectionLocator<'a> {
    scope: &'a SectionScope,
}

impl<'a> SectionLocator<'a> {
    pub fn new(scope: &'a SectionScope) -> SectionLocator<'a> {
        SectionLocator { scope }
    }

    /// Hands every scoped container under `root` to `visit` until it breaks.
    ///
    /// Returns true if `visit` stopped the walk.
    pub fn visit_mut<F>(&self, root: &mut Mapping, mut visit: F) -> bool
    where
        F: FnMut(&mut Node) -> ControlFlow<()>,
    {
        self.visit_entries_mut(root, |_, node| visit(node))
    }

    /// Like [`SectionLocator::visit_mut`], also passing the key of the entry each
    /// container is the value of.
    pub fn visit_entries_mut<F>(&self, root: &mut Mapping, mut visit: F) -> bool
    where
        F: FnMut(&str, &mut Node) -> ControlFlow<()>,
    {
        self.walk_mapping_mut(root, false, &mut visit).is_break()
    }

    /// Read-only counterpart of [`SectionLocator::visit_mut`].
    pub fn visit<F>(&self, root: &Mapping, mut visit: F) -> bool
    where
        F: FnMut(&Node) -> ControlFlow<()>,
    {
        self.walk_mapping(root, false, &mut visit).is_break()
    }

    fn walk_mapping_mut<F>(&self, map: &mut Mapping, inherited: bool, visit: &mut F) -> ControlFlow<()>
    where
        F: FnMut(&str, &mut Node) -> ControlFlow<()>,
    {
        let mut sibling_found = inherited;
        for (key, value) in map.iter_mut() {
            let mut found = sibling_found;
            if self.scope.opens(key, value) {
                tracing::trace!(key = key.as_str(), "section scope opened");
                found = true;
                if self.scope.value.is_some() {
                    sibling_found = true;
                }
            }

            if found && is_container(value) {
                visit(key.as_str(), value)?;
            }
            self.walk_node_mut(value, found, visit)?;
        }
        ControlFlow::Continue(())
    }

    fn walk_node_mut<F>(&self, node: &mut Node, found: bool, visit: &mut F) -> ControlFlow<()>
    where
        F: FnMut(&str, &mut Node) -> ControlFlow<()>,
    {
        match node {
            Node::Mapping(map) => self.walk_mapping_mut(map, found, visit),
            Node::Sequence(seq) => {
                for item in seq.iter_mut() {
                    self.walk_node_mut(item, found, visit)?;
                }
                ControlFlow::Continue(())
            }
            Node::Scalar(_) => ControlFlow::Continue(()),
        }
    }

    fn walk_mapping<F>(&self, map: &Mapping, inherited: bool, visit: &mut F) -> ControlFlow<()>
    where
        F: FnMut(&Node) -> ControlFlow<()>,
    {
        let mut sibling_found = inherited;
        for (key, value) in map.iter() {
            let mut found = sibling_found;
            if self.scope.opens(key, value) {
                found = true;
                if self.scope.value.is_some() {
                    sibling_found = true;
                }
            }

            if found && is_container(value) {
                visit(value)?;
            }
            self.walk_node(value, found, visit)?;
        }
        ControlFlow::Continue(())
    }

    fn walk_node<F>(&self, node: &Node, found: bool, visit: &mut F) -> ControlFlow<()>
    where
        F: FnMut(&Node) -> ControlFlow<()>,
    {
        match node {
            Node::Mapping(map) => self.walk_mapping(map, found, visit),
            Node::Sequence(seq) => {
                for item in seq {
                    self.walk_node(item, found, visit)?;
                }
                ControlFlow::Continue(())
            }
            Node::Scalar(_) => ControlFlow::Continue(()),
        }
    }
}

fn is_container(node: &Node) -> bool {
    match node {
        Node::Mapping(_) | Node::Sequence(_) => true,
        Node::Scalar(_) => false,
    }
}
