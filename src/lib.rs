// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

//! Structural edits to CI pipeline YAML and the templates it pulls in.
//!
//! Load a pipeline with [`DocumentSet::load`], build [`Action`]s (directly, through
//! [`commands`] or from an action script) and run them with [`DocumentSet::execute`].

pub mod action;
pub mod commands;
pub mod document;
pub mod document_set;
pub mod error;
pub mod files;
pub mod literal;
pub mod locator;
pub mod operations;
pub mod resolver;
pub mod script;
pub mod selector;

pub use action::{Action, FixedKey, Matcher, Position, PropertyQuery, SectionScope};
pub use document::{Document, Mapping, Node, Scalar, ScalarStyle};
pub use document_set::{DocumentSet, Scenarios};
pub use error::{Error, ErrorKind, Result};
pub use files::{DirectoryFiles, FileSink, FileSource, MemoryFiles};
pub use resolver::{AliasTable, TemplateResolver, UnresolvedReason, UnresolvedReference};
pub use script::{load_script, parse_script};
pub use selector::{Selector, SelectorParser};
