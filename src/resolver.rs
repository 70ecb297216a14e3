// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

//! Discovers the templates a pipeline references and loads them transitively.
//!
//! A reference is any mapping entry keyed `template`, at any depth. Its value is a path,
//! optionally suffixed with `@alias` naming the repository the template lives in:
//!
//! - no alias: relative to the referencing document, or to the repository root when the
//!   path starts with `/`.
//! - `@self`: relative to the main pipeline's repository root.
//! - any other alias: relative to the base path the [`AliasTable`] maps it to.
//!
//! References that can't be located (unknown alias, or a name built from an expression)
//! are recorded as warnings and left out of the set.

use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    path::{Path, PathBuf},
};

use crate::{
    document::{Document, Node},
    document_set::DocumentSet,
    error::{Error, Result},
    files::{normalize_path, FileSource},
};

pub const TEMPLATE_KEY: &str = "template";

const SELF_ALIAS: &str = "self";

/// Maps repository aliases to local base paths.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AliasTable {
    aliases: BTreeMap<String, PathBuf>,
}

impl AliasTable {
    pub fn new() -> AliasTable {
        AliasTable::default()
    }

    pub fn insert(&mut self, alias: impl Into<String>, base: impl Into<PathBuf>) {
        self.aliases.insert(alias.into(), base.into());
    }

    pub fn with_alias(mut self, alias: impl Into<String>, base: impl Into<PathBuf>) -> AliasTable {
        self.insert(alias, base);
        self
    }

    pub fn get(&self, alias: &str) -> Option<&Path> {
        self.aliases.get(alias).map(PathBuf::as_path)
    }
}

/// A `template:` entry found in a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceEdge {
    pub source: PathBuf,
    pub template: String,
    pub alias: Option<String>,
}

impl ReferenceEdge {
    pub fn parse(source: &Path, value: &str) -> ReferenceEdge {
        let (template, alias) = match value.rsplit_once('@') {
            Some((template, alias)) if !alias.is_empty() && !alias.contains('/') => {
                (template.to_string(), Some(alias.to_string()))
            }
            _ => (value.to_string(), None),
        };
        ReferenceEdge {
            source: source.to_path_buf(),
            template,
            alias,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnresolvedReason {
    UnknownAlias,
    Expression,
}

/// A reference left out of the document set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub edge: ReferenceEdge,
    pub reason: UnresolvedReason,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let edge = &self.edge;
        match &edge.alias {
            Some(alias) => write!(f, "{}: template `{}@{}`", edge.source.display(), edge.template, alias)?,
            None => write!(f, "{}: template `{}`", edge.source.display(), edge.template)?,
        }
        match self.reason {
            UnresolvedReason::UnknownAlias => f.write_str(" is in an unknown repository"),
            UnresolvedReason::Expression => f.write_str(" is computed by an expression"),
        }
    }
}

/// Lists the template references in `doc`, in document order.
pub fn find_references(doc: &Document) -> Vec<ReferenceEdge> {
    let mut edges = Vec::new();
    for (key, value) in doc.root() {
        collect_references(doc.path(), key, value, &mut edges);
    }
    edges
}

fn collect_references(source: &Path, key: &str, value: &Node, edges: &mut Vec<ReferenceEdge>) {
    match value {
        Node::Scalar(scalar) => {
            if key == TEMPLATE_KEY {
                edges.push(ReferenceEdge::parse(source, &scalar.text));
            }
        }
        Node::Mapping(map) => {
            for (key, value) in map {
                collect_references(source, key, value, edges);
            }
        }
        Node::Sequence(seq) => {
            for item in seq {
                // Sequence items have no key of their own.
                collect_references(source, "", item, edges);
            }
        }
    }
}

pub struct TemplateResolver<'a> {
    source: &'a dyn FileSource,
    aliases: &'a AliasTable,
}

impl<'a> TemplateResolver<'a> {
    pub fn new(source: &'a dyn FileSource, aliases: &'a AliasTable) -> TemplateResolver<'a> {
        TemplateResolver { source, aliases }
    }

    /// Reads the main pipeline at `main_path` and resolves its templates.
    pub fn load(&self, main_path: &Path) -> Result<DocumentSet> {
        let main_path = normalize_path(main_path);
        let text = self.source.read_to_string(&main_path).map_err(|source| Error::Io {
            path: main_path.clone(),
            source,
        })?;
        let main = Document::parse(main_path, &text)?;
        self.resolve(main)
    }

    /// Builds the document set for an already loaded main pipeline.
    pub fn resolve(&self, main: Document) -> Result<DocumentSet> {
        let repo_root = parent_dir(main.path());
        let mut run = ResolverRun {
            resolver: self,
            self_root: repo_root.clone(),
            seen: HashSet::from([normalize_path(main.path())]),
            templates: Vec::new(),
            warnings: Vec::new(),
        };
        run.resolve_edges(find_references(&main), &repo_root)?;

        tracing::info!(
            main = %main.path().display(),
            templates = run.templates.len(),
            unresolved = run.warnings.len(),
            "resolved pipeline templates"
        );
        Ok(DocumentSet::from_parts(main, run.templates, run.warnings))
    }
}

struct ResolverRun<'r, 'a> {
    resolver: &'r TemplateResolver<'a>,
    self_root: PathBuf,
    seen: HashSet<PathBuf>,
    templates: Vec<Document>,
    warnings: Vec<UnresolvedReference>,
}

impl ResolverRun<'_, '_> {
    fn resolve_edges(&mut self, edges: Vec<ReferenceEdge>, repo_root: &Path) -> Result<()> {
        for edge in edges {
            let (path, template_root) = match self.locate(&edge, repo_root) {
                Ok(located) => located,
                Err(reason) => {
                    let unresolved = UnresolvedReference { edge, reason };
                    tracing::warn!("{}", unresolved);
                    self.warnings.push(unresolved);
                    continue;
                }
            };

            if !self.seen.insert(path.clone()) {
                continue;
            }

            let text = self
                .resolver
                .source
                .read_to_string(&path)
                .map_err(|source| Error::TemplateNotFound {
                    referenced_from: edge.source.clone(),
                    path: path.clone(),
                    source,
                })?;
            let template = Document::parse(path, &text)?;
            tracing::debug!(
                template = %template.path().display(),
                from = %edge.source.display(),
                "loaded template"
            );

            // Depth first, so discovery order follows document order.
            let nested = find_references(&template);
            self.templates.push(template);
            self.resolve_edges(nested, &template_root)?;
        }
        Ok(())
    }

    // Returns the template's path and the root of the repository it lives in.
    fn locate(&self, edge: &ReferenceEdge, repo_root: &Path) -> std::result::Result<(PathBuf, PathBuf), UnresolvedReason> {
        if edge.template.contains("${{") || edge.template.contains("$(") {
            return Err(UnresolvedReason::Expression);
        }

        let (base, repo_root) = match edge.alias.as_deref() {
            None if edge.template.starts_with('/') => (repo_root.to_path_buf(), repo_root.to_path_buf()),
            None => (parent_dir(&edge.source), repo_root.to_path_buf()),
            Some(SELF_ALIAS) => (self.self_root.clone(), self.self_root.clone()),
            Some(alias) => match self.resolver.aliases.get(alias) {
                Some(base) => (base.to_path_buf(), base.to_path_buf()),
                None => return Err(UnresolvedReason::UnknownAlias),
            },
        };

        let path = normalize_path(&base.join(edge.template.trim_start_matches('/')));
        Ok((path, normalize_path(&repo_root)))
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}
