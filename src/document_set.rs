// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

//! The main pipeline plus every template it pulls in, edited as one unit.
//!
//! Each action is broadcast to every document in discovery order. A match in one
//! document never suppresses the search in another, so a command succeeds no matter
//! which file actually holds its target.
//!
//! A set is the state of one scenario. Load it (or clone a pristine one), apply actions,
//! save, then throw it away.


use std::path::{Path, PathBuf};

use crate::{
    action::{Action, PropertyQuery},
    document::Document,
    error::{Error, Result},
    files::{FileSink, FileSource},
    operations,
    resolver::{AliasTable, TemplateResolver, UnresolvedReference},
};

#[derive(Clone, Debug)]
pub struct DocumentSet {
    main: Document,
    templates: Vec<Document>,
    warnings: Vec<UnresolvedReference>,
}

impl DocumentSet {
    /// Loads `main_path` from `source` and resolves every template it references.
    pub fn load(main_path: impl AsRef<Path>, source: &dyn FileSource, aliases: &AliasTable) -> Result<DocumentSet> {
        TemplateResolver::new(source, aliases).load(main_path.as_ref())
    }

    /// A set with no templates.
    pub fn new(main: Document) -> DocumentSet {
        DocumentSet::from_parts(main, Vec::new(), Vec::new())
    }

    pub fn with_templates(main: Document, templates: Vec<Document>) -> DocumentSet {
        DocumentSet::from_parts(main, templates, Vec::new())
    }

    pub(crate) fn from_parts(
        main: Document,
        templates: Vec<Document>,
        warnings: Vec<UnresolvedReference>,
    ) -> DocumentSet {
        DocumentSet {
            main,
            templates,
            warnings,
        }
    }

    pub fn main(&self) -> &Document {
        &self.main
    }

    pub fn templates(&self) -> &[Document] {
        &self.templates
    }

    /// Main document first, then templates in discovery order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        std::iter::once(&self.main).chain(self.templates.iter())
    }

    pub fn document(&self, path: impl AsRef<Path>) -> Option<&Document> {
        let path = path.as_ref();
        self.documents().find(|doc| doc.path() == path)
    }

    /// References that could not be located while resolving.
    pub fn warnings(&self) -> &[UnresolvedReference] {
        &self.warnings
    }

    /// Applies `action` to every document. Returns true if any document changed.
    pub fn execute(&mut self, action: &Action) -> Result<bool> {
        action.validate()?;

        let span = tracing::debug_span!("execute", action = %action);
        let _enter = span.enter();

        let mut applied = false;
        let documents = std::iter::once(&mut self.main).chain(self.templates.iter_mut());
        for doc in documents {
            let doc_applied = operations::apply(doc, action)?;
            if doc_applied {
                tracing::debug!(document = %doc.path().display(), "applied");
            }
            applied |= doc_applied;
        }

        if !applied {
            tracing::debug!("no document matched");
        }
        Ok(applied)
    }

    /// Applies each action in turn, stopping at the first error.
    pub fn execute_all<'a>(&mut self, actions: impl IntoIterator<Item = &'a Action>) -> Result<Vec<bool>> {
        actions.into_iter().map(|action| self.execute(action)).collect()
    }

    /// Collects property values from every document, main first.
    pub fn read_property(&self, query: &PropertyQuery) -> Vec<String> {
        self.documents()
            .flat_map(|doc| operations::read_property(doc.root(), query))
            .collect()
    }

    /// Serializes every document, main first.
    ///
    /// Nothing is returned unless every document serializes.
    pub fn dump_all(&self) -> Result<Vec<(PathBuf, String)>> {
        self.documents()
            .map(|doc| Ok((doc.path().to_path_buf(), doc.dump()?)))
            .collect()
    }

    /// Writes every document to `sink` under its logical path.
    pub fn save(&self, sink: &mut dyn FileSink) -> Result<()> {
        for (path, text) in self.dump_all()? {
            sink.write(&path, &text).map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Re-reads the pristine pipeline for every scenario, so no edit leaks between them.
pub struct Scenarios<'a> {
    main_path: PathBuf,
    source: &'a dyn FileSource,
    aliases: &'a AliasTable,
}

impl<'a> Scenarios<'a> {
    pub fn new(main_path: impl Into<PathBuf>, source: &'a dyn FileSource, aliases: &'a AliasTable) -> Scenarios<'a> {
        Scenarios {
            main_path: main_path.into(),
            source,
            aliases,
        }
    }

    /// Loads a fresh set, applies `actions` and writes the result to `sink`.
    pub fn run(&self, actions: &[Action], sink: &mut dyn FileSink) -> Result<Vec<bool>> {
        let mut set = DocumentSet::load(&self.main_path, self.source, self.aliases)?;
        let applied = set.execute_all(actions)?;
        set.save(sink)?;
        Ok(applied)
    }
}
