// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

//! Action scripts: a YAML list of edits to run against a pipeline.
//!
//! ```yaml
//! - skip-stage: deploy
//! - set-property: steps/task=Maven@3
//!   property: condition
//!   value: false
//! - insert-after: steps/[displayName=Build]
//!   payload:
//!     script: echo done
//! ```
//!
//! The first key of each entry names the operation; its value is a selector (see
//! [`crate::selector`]) or, for shorthands, a name. The remaining keys are the
//! operation's fields.

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use crate::{
    action::{Action, FixedKey, Matcher, SectionScope},
    commands,
    document::{parse_yaml_str, Mapping, Node},
    error::{Error, Result},
    files::FileSource,
    selector::{Selector, SelectorParser},
};

/// Reads and parses the script at `path`.
pub fn load_script(source: &dyn FileSource, path: &Path) -> Result<Vec<Action>> {
    let text = source.read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_script(path, &text)
}

pub fn parse_script(path: &Path, text: &str) -> Result<Vec<Action>> {
    let docs = parse_yaml_str(path, text)?;
    let entries = match &docs[..] {
        [] => return Ok(Vec::new()),
        [Node::Sequence(entries)] => entries,
        [_] => return Err(invalid(path, "script must be a list of actions".to_string())),
        _ => return Err(invalid(path, "script must only have a single document".to_string())),
    };

    let parser = SelectorParser::new();
    let mut actions = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let Node::Mapping(map) = entry else {
            return Err(invalid(path, format!("entry {}: expected a mapping", index + 1)));
        };
        let mut entry = Entry::new(path, index, map)?;
        parse_entry(&parser, &mut entry, &mut actions)?;
        entry.finish()?;
    }

    tracing::debug!(script = %path.display(), actions = actions.len(), "loaded script");
    Ok(actions)
}

// Parse an entry.
fn parse_entry(parser: &SelectorParser, entry: &mut Entry, actions: &mut Vec<Action>) -> Result<()> {
    let operation = entry.operation;
    let action = match operation {
        "insert-before" => {
            let (scope, matcher) = entry.selector_with_matcher(parser)?;
            Action::insert_before(scope, matcher, entry.node("payload")?)
        }
        "insert-after" => {
            let (scope, matcher) = entry.selector_with_matcher(parser)?;
            Action::insert_after(scope, matcher, entry.node("payload")?)
        }
        "update" => {
            let (scope, matcher) = entry.selector_with_matcher(parser)?;
            Action::update(scope, matcher, entry.node("payload")?)
        }
        "delete" => {
            let (scope, matcher) = entry.selector_with_matcher(parser)?;
            Action::delete(scope, matcher)
        }
        "set-property" => {
            let (scope, matcher) = entry.selector_with_matcher(parser)?;
            let property = entry.string("property")?;
            Action::set_property(scope, matcher, property, entry.node("value")?)
        }
        "prepend-line" => {
            let (scope, matcher) = entry.selector_with_matcher(parser)?;
            let inner = entry.optional_string("inner")?;
            let target_key = entry.string("target")?;
            Action::prepend_line(scope, matcher, inner, target_key, entry.string("line")?)
        }
        "override-element" => {
            let scope = entry.selector(parser)?.scope;
            let key_identifier = entry.optional_string("key")?.unwrap_or_else(|| "name".to_string());
            let value_identifier = entry
                .optional_string("value-key")?
                .unwrap_or_else(|| "value".to_string());
            let element_name = entry.string("name")?;
            Action::override_element(
                scope,
                key_identifier,
                value_identifier,
                element_name,
                entry.node("value")?,
            )
        }
        "reset" => match entry.argument()? {
            "trigger" => Action::reset(FixedKey::Trigger),
            "pr" => Action::reset(FixedKey::PullRequest),
            other => return Err(entry.error(format!("cannot reset `{}`, expected `trigger` or `pr`", other))),
        },
        "replace-literal" => {
            let find = entry.argument()?.to_string();
            let replace = entry.string("replace")?;
            let global = entry.optional_bool("global")?.unwrap_or(false);
            Action::replace_literal(find, replace, global)
        }
        "skip-stage" => commands::skip_stage(entry.argument()?),
        "skip-job" => commands::skip_job(entry.argument()?),
        "skip-step" => commands::skip_step(entry.argument()?),
        "mock-step" => {
            let script = entry.string("script")?;
            commands::mock_step(entry.argument()?, &script)
        }
        "mock-bash-command" => {
            let command = entry.string("command")?;
            let output = entry.string("output")?;
            actions.extend(commands::mock_bash_command(entry.argument()?, &command, &output));
            return Ok(());
        }
        "set-variable" => {
            let value = entry.string("value")?;
            commands::set_variable(entry.argument()?, &value)
        }
        "set-parameter-default" => {
            let value = entry.string("value")?;
            commands::set_parameter_default(entry.argument()?, &value)
        }
        other => return Err(entry.error(format!("unknown operation `{}`", other))),
    };

    actions.push(action);
    Ok(())
}

// One script entry. Tracks which fields were read so leftovers can be reported.
struct Entry<'a> {
    path: &'a Path,
    index: usize,
    operation: &'a str,
    map: &'a Mapping,
    used: Vec<&'a str>,
}

impl<'a> Entry<'a> {
    fn new(path: &'a Path, index: usize, map: &'a Mapping) -> Result<Entry<'a>> {
        let Some((operation, _)) = map.iter().next() else {
            return Err(invalid(path, format!("entry {}: empty action", index + 1)));
        };
        Ok(Entry {
            path,
            index,
            operation: operation.as_str(),
            map,
            used: vec![operation.as_str()],
        })
    }

    fn error(&self, message: String) -> Error {
        Error::InvalidScript {
            path: self.path.to_path_buf(),
            message: format!("entry {} (`{}`): {}", self.index + 1, self.operation, message),
        }
    }

    // The scalar under the operation key.
    fn argument(&self) -> Result<&'a str> {
        self.map
            .get(self.operation)
            .and_then(Node::as_str)
            .ok_or_else(|| self.error("expected a scalar".to_string()))
    }

    fn selector(&self, parser: &SelectorParser) -> Result<Selector> {
        let text = self.argument()?;
        parser.parse(text).map_err(|err| self.error(err.to_string()))
    }

    fn selector_with_matcher(&self, parser: &SelectorParser) -> Result<(SectionScope, Matcher)> {
        let selector = self.selector(parser)?;
        match selector.matcher {
            Some(matcher) => Ok((selector.scope, matcher)),
            None => Err(self.error(format!(
                "selector `{}` does not name an element",
                self.argument()?
            ))),
        }
    }

    fn lookup(&mut self, key: &'static str) -> Option<&'a Node> {
        let map: &'a Mapping = self.map;
        let node = map.get(key)?;
        self.used.push(key);
        Some(node)
    }

    fn node(&mut self, key: &'static str) -> Result<Node> {
        match self.lookup(key) {
            Some(node) => Ok(node.clone()),
            None => Err(self.error(format!("missing `{}`", key))),
        }
    }

    fn optional_string(&mut self, key: &'static str) -> Result<Option<String>> {
        match self.lookup(key) {
            None => Ok(None),
            Some(Node::Scalar(scalar)) => Ok(Some(scalar.text.clone())),
            Some(Node::Mapping(_) | Node::Sequence(_)) => Err(self.error(format!("`{}` must be a scalar", key))),
        }
    }

    fn string(&mut self, key: &'static str) -> Result<String> {
        self.optional_string(key)?
            .ok_or_else(|| self.error(format!("missing `{}`", key)))
    }

    fn optional_bool(&mut self, key: &'static str) -> Result<Option<bool>> {
        match self.optional_string(key)?.as_deref() {
            None => Ok(None),
            Some("true") => Ok(Some(true)),
            Some("false") => Ok(Some(false)),
            Some(other) => Err(self.error(format!("`{}` must be true or false, found `{}`", key, other))),
        }
    }

    fn finish(&self) -> Result<()> {
        match self.map.keys().find(|key| !self.used.contains(&key.as_str())) {
            Some(key) => Err(self.error(format!("unexpected field `{}`", key))),
            None => Ok(()),
        }
    }
}

fn invalid(path: &Path, message: String) -> Error {
    Error::InvalidScript {
        path: PathBuf::from(path),
        message,
    }
}
