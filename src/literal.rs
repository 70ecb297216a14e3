// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

// Text-level find/replace for edits that don't line up with a single key/value pair,
// such as a fragment of a condition expression.

use crate::{
    document::{emit_to_string, parse_root, Document},
    error::{Error, Result},
};

/// Replaces the first (or, if `global`, every) occurrence of `find` in the serialized
/// document and reparses the result.
///
/// If the new text no longer parses the document is poisoned, so it can never be
/// written out half-rewritten.
pub fn replace_literal(doc: &mut Document, find: &str, replace: &str, global: bool) -> Result<bool> {
    doc.check_usable()?;

    let text = emit_to_string(doc.path(), doc.root())?;
    if !text.contains(find) {
        return Ok(false);
    }

    let text = if global {
        text.replace(find, replace)
    } else {
        text.replacen(find, replace, 1)
    };

    match parse_root(doc.path(), &text) {
        Ok(root) => {
            doc.replace_root(root);
            Ok(true)
        }
        Err(err) => {
            doc.poison();
            Err(Error::ReparseFailure {
                path: doc.path().to_path_buf(),
                find: find.to_string(),
                message: err.to_string(),
            })
        }
    }
}
