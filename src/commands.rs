// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

//! Shorthands for the edits a pipeline test usually needs.
//!
//! Each function only builds [`Action`]s; run them through a
//! [`DocumentSet`](crate::DocumentSet) so the edit lands in whichever file holds
//! the target.

#[cfg(test)]
mod tests;

use crate::{
    action::{Action, FixedKey, Matcher, SectionScope},
    document::{Mapping, Node, Scalar},
};

const DISPLAY_NAME: &str = "displayName";

pub fn skip_stage(stage: &str) -> Action {
    Action::delete(SectionScope::new("stages"), Matcher::identifier("stage", stage))
}

pub fn skip_job(job: &str) -> Action {
    Action::delete(SectionScope::new("jobs"), Matcher::identifier("job", job))
}

pub fn skip_step(display_name: &str) -> Action {
    Action::delete(SectionScope::new("steps"), Matcher::property(DISPLAY_NAME, display_name))
}

/// Replaces the step named `display_name` with an inline script step of the same name.
pub fn mock_step(display_name: &str, script: &str) -> Action {
    let mut payload = Mapping::new();
    payload.insert("script".to_string(), Node::Scalar(Scalar::quoted(script)));
    payload.insert(DISPLAY_NAME.to_string(), Node::Scalar(Scalar::quoted(display_name)));
    Action::update(
        SectionScope::new("steps"),
        Matcher::property(DISPLAY_NAME, display_name),
        Node::Mapping(payload),
    )
}

/// Sets a variable in either the `- name: x / value: y` or the `x: y` form.
pub fn set_variable(name: &str, value: &str) -> Action {
    Action::override_element(SectionScope::new("variables"), "name", "value", name, value)
}

pub fn set_parameter_default(name: &str, value: &str) -> Action {
    Action::override_element(SectionScope::new("parameters"), "name", "default", name, value)
}

pub fn reset_trigger() -> Action {
    Action::reset(FixedKey::Trigger)
}

pub fn reset_pull_request() -> Action {
    Action::reset(FixedKey::PullRequest)
}

/// Shadows `command` in the inline script of the step named `display_name` with a
/// shell function that prints `output`.
///
/// Covers `Bash@3` tasks (`inputs.script`), `bash:` steps and `script:` steps; each
/// returned action matches at most one of them.
pub fn mock_bash_command(display_name: &str, command: &str, output: &str) -> Vec<Action> {
    let line = bash_function(command, output);
    let steps = || SectionScope::new("steps");
    vec![
        Action::prepend_line(
            steps(),
            Matcher::type_and_property("task", DISPLAY_NAME, display_name),
            Some("inputs".to_string()),
            "script",
            line.clone(),
        ),
        Action::prepend_line(
            steps(),
            Matcher::type_and_property("bash", DISPLAY_NAME, display_name),
            None,
            "bash",
            line.clone(),
        ),
        Action::prepend_line(
            steps(),
            Matcher::type_and_property("script", DISPLAY_NAME, display_name),
            None,
            "script",
            line,
        ),
    ]
}

fn bash_function(command: &str, output: &str) -> String {
    format!("function {} {{ echo '{}'; }}", command, output.replace('\'', r"'\''"))
}
