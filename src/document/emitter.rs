// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::path::Path;

use hashlink::LinkedHashMap;
use saphyr::{Yaml, YamlEmitter};

use crate::error::{Error, Result};

use super::{Mapping, Node, Scalar, ScalarStyle};

/// Writes `root` as a block-style YAML document.
///
/// Output is stable: parsing the result and emitting it again yields the same text.
pub fn emit_to_string(path: &Path, root: &Mapping) -> Result<String> {
    let doc = mapping_to_yaml(root);

    let mut out_str = String::new();
    let mut emitter = YamlEmitter::new(&mut out_str);
    // Multi-line strings are left double quoted so trailing newlines and leading spaces
    // come back exactly.
    emitter.dump(&doc).map_err(|err| Error::Emit {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    out_str.push('\n');
    Ok(out_str)
}

fn node_to_yaml(node: &Node) -> Yaml {
    match node {
        Node::Scalar(scalar) => scalar_to_yaml(scalar),
        Node::Mapping(map) => mapping_to_yaml(map),
        Node::Sequence(seq) => Yaml::Array(seq.iter().map(node_to_yaml).collect()),
    }
}

fn mapping_to_yaml(map: &Mapping) -> Yaml {
    let mut hash = LinkedHashMap::new();
    for (key, value) in map {
        hash.insert(Yaml::String(key.clone()), node_to_yaml(value));
    }
    Yaml::Hash(hash)
}

fn scalar_to_yaml(scalar: &Scalar) -> Yaml {
    match scalar.style {
        ScalarStyle::Quoted => Yaml::String(scalar.text.clone()),
        ScalarStyle::Plain if resolves_to_string(&scalar.text) => Yaml::String(scalar.text.clone()),
        // Non-string plain scalars (numbers, booleans, nulls) are written back verbatim.
        ScalarStyle::Plain => Yaml::Real(scalar.text.clone()),
    }
}

// YAML core schema resolution for plain scalars.
fn resolves_to_string(text: &str) -> bool {
    match text {
        "~" | "null" | "Null" | "NULL" => return false,
        "true" | "True" | "TRUE" | "false" | "False" | "FALSE" => return false,
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" | "-.inf" | "-.Inf" | "-.INF" => return false,
        ".nan" | ".NaN" | ".NAN" => return false,
        _ => {}
    }

    if let Some(hex) = text.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).is_err();
    }
    if let Some(oct) = text.strip_prefix("0o") {
        return i64::from_str_radix(oct, 8).is_err();
    }

    text.parse::<i64>().is_err() && text.parse::<f64>().is_err()
}
