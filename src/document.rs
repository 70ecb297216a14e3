// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

// Owned tree model for a pipeline YAML document.

mod emitter;
mod loader;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use hashlink::LinkedHashMap;

use crate::error::{Error, Result};

pub use emitter::emit_to_string;
pub use loader::parse_yaml_str;

/// Ordered map with unique keys. Insertion order is document order.
pub type Mapping = LinkedHashMap<String, Node>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Scalar(Scalar),
    Mapping(Mapping),
    Sequence(Vec<Node>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    // Single, double, literal or folded.
    Quoted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scalar {
    pub text: String,
    pub style: ScalarStyle,
}

impl Scalar {
    pub fn plain(text: impl Into<String>) -> Scalar {
        Scalar {
            text: text.into(),
            style: ScalarStyle::Plain,
        }
    }

    pub fn quoted(text: impl Into<String>) -> Scalar {
        Scalar {
            text: text.into(),
            style: ScalarStyle::Quoted,
        }
    }
}

impl Node {
    /// Parses a single YAML document into a node. Used for action payloads.
    pub fn parse(text: &str) -> Result<Node> {
        let path = Path::new("<payload>");
        let mut docs = parse_yaml_str(path, text)?;
        match docs.len() {
            1 => Ok(docs.remove(0)),
            0 => Err(Error::MalformedDocument {
                path: path.to_path_buf(),
                message: "payload is empty".to_string(),
            }),
            _ => Err(Error::MalformedDocument {
                path: path.to_path_buf(),
                message: "payload must only have a single document".to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(scalar) => Some(&scalar.text),
            Node::Mapping(_) | Node::Sequence(_) => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            Node::Scalar(_) | Node::Sequence(_) => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            Node::Scalar(_) | Node::Sequence(_) => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Vec<Node>> {
        match self {
            Node::Sequence(seq) => Some(seq),
            Node::Scalar(_) | Node::Mapping(_) => None,
        }
    }

    /// True if this is a scalar whose text equals `text`.
    pub fn is_scalar(&self, text: &str) -> bool {
        self.as_str() == Some(text)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Node {
        Node::Scalar(Scalar::plain(text))
    }
}

impl From<String> for Node {
    fn from(text: String) -> Node {
        Node::Scalar(Scalar::plain(text))
    }
}

impl From<Scalar> for Node {
    fn from(scalar: Scalar) -> Node {
        Node::Scalar(scalar)
    }
}

impl From<Mapping> for Node {
    fn from(map: Mapping) -> Node {
        Node::Mapping(map)
    }
}

impl From<Vec<Node>> for Node {
    fn from(seq: Vec<Node>) -> Node {
        Node::Sequence(seq)
    }
}

/// A loaded pipeline or template file.
///
/// Mutated in place by actions. A document whose literal substitution failed is
/// poisoned and refuses to be serialized again.
#[derive(Clone, Debug)]
pub struct Document {
    path: PathBuf,
    root: Mapping,
    poisoned: bool,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, root: Mapping) -> Document {
        Document {
            path: path.into(),
            root,
            poisoned: false,
        }
    }

    /// Parses `text` as a document whose root must be a mapping.
    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Result<Document> {
        let path = path.into();
        let root = parse_root(&path, text)?;
        Ok(Document::new(path, root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Mapping {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Mapping {
        &mut self.root
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Serializes the document to block-style YAML.
    pub fn dump(&self) -> Result<String> {
        self.check_usable()?;
        emit_to_string(&self.path, &self.root)
    }

    pub(crate) fn check_usable(&self) -> Result<()> {
        if self.poisoned {
            return Err(Error::Poisoned {
                path: self.path.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn replace_root(&mut self, root: Mapping) {
        self.root = root;
    }

    pub(crate) fn poison(&mut self) {
        self.poisoned = true;
    }
}

pub(crate) fn parse_root(path: &Path, text: &str) -> Result<Mapping> {
    let docs = parse_yaml_str(path, text)?;
    let mut docs = docs.into_iter();
    let root = match (docs.next(), docs.next()) {
        (Some(root), None) => root,
        (None, _) => {
            return Err(Error::MalformedDocument {
                path: path.to_path_buf(),
                message: "document is empty".to_string(),
            })
        }
        (Some(_), Some(_)) => {
            return Err(Error::MalformedDocument {
                path: path.to_path_buf(),
                message: "pipeline yaml must only have a single document".to_string(),
            })
        }
    };

    match root {
        Node::Mapping(map) => Ok(map),
        Node::Scalar(_) | Node::Sequence(_) => Err(Error::MalformedDocument {
            path: path.to_path_buf(),
            message: "document root must be a mapping".to_string(),
        }),
    }
}
