use std::{fs, path::Path};

use super::*;
use crate::{
    document::{Document, Scalar},
    DocumentSet,
};

macro_rules! testlist {
    ($($name:ident,)*) => {
    $(
        #[test]
        fn $name() {
            run_test(stringify!($name))
        }
    )*
    }
}

testlist! {
    delete_stage,
    insert_steps,
    malformed_payload,
    missing_field,
    missing_matcher,
    mock_bash_command,
    override_variable,
    replace_literal,
    reset_triggers,
    scoped_delete,
    set_property,
    shorthands,
    unexpected_field,
    unknown_operation,
    update_by_property,
}

fn run_test(name: &str) {
    let rootdir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let test_data_dir = rootdir.join("src/script/tests/testdata");

    let test_file = test_data_dir.join(format!("tests/{}.yml", name));
    let test_actions_file = test_data_dir.join(format!("tests/{}-actions.yml", name));
    let actual_dir = test_data_dir.join("actual");

    let test = fs::read_to_string(test_file).unwrap();
    let test_actions = fs::read_to_string(test_actions_file).unwrap();

    let result = run_script(name, &test, &test_actions);

    fs::create_dir_all(&actual_dir).unwrap();
    match result {
        Ok(doc) => {
            fs::write(actual_dir.join(format!("{}.yml", name)), doc.dump().unwrap()).unwrap();

            // Compared as trees; scalar styles are not part of the expectation.
            let expected_file = test_data_dir.join(format!("expected/{}.yml", name));
            let expected = Document::parse(&expected_file, &fs::read_to_string(&expected_file).unwrap()).unwrap();
            assert_eq!(strip_styles(expected.root()), strip_styles(doc.root()));
        }
        Err(err) => {
            let actual = format!("ERROR: {}", err);
            fs::write(actual_dir.join(format!("{}.txt", name)), &actual).unwrap();

            let expected = fs::read_to_string(test_data_dir.join(format!("expected/{}.txt", name))).unwrap();
            assert_eq!(expected, actual);
        }
    }
}

fn run_script(name: &str, pipeline: &str, script: &str) -> Result<Document> {
    let actions = parse_script(Path::new(&format!("{}-actions.yml", name)), script)?;
    let main = Document::parse(format!("{}.yml", name), pipeline)?;
    let mut set = DocumentSet::new(main);
    set.execute_all(&actions)?;
    Ok(set.main().clone())
}

fn strip_styles(map: &Mapping) -> Mapping {
    map.iter().map(|(key, value)| (key.clone(), strip_node(value))).collect()
}

fn strip_node(node: &Node) -> Node {
    match node {
        Node::Scalar(scalar) => Node::Scalar(Scalar::plain(scalar.text.clone())),
        Node::Mapping(map) => Node::Mapping(strip_styles(map)),
        Node::Sequence(seq) => Node::Sequence(seq.iter().map(strip_node).collect()),
    }
}

#[test]
fn empty_script_has_no_actions() {
    assert!(parse_script(Path::new("empty.yml"), "").unwrap().is_empty());
}

#[test]
fn script_root_must_be_a_list() {
    let err = parse_script(Path::new("actions.yml"), "skip-stage: deploy\n").unwrap_err();
    assert_eq!(err.to_string(), "actions.yml: script must be a list of actions");
}

#[test]
fn mock_bash_command_expands_to_every_step_form() {
    let actions = parse_script(
        Path::new("actions.yml"),
        "- mock-bash-command: Build\n  command: make\n  output: ok\n",
    )
    .unwrap();
    assert_eq!(actions, commands::mock_bash_command("Build", "make", "ok"));
}

#[test]
fn override_element_keys_default_to_name_and_value() {
    let actions = parse_script(
        Path::new("actions.yml"),
        "- override-element: parameters\n  key: name\n  value-key: default\n  name: environment\n  value: prod\n\
         - override-element: variables\n  name: configuration\n  value: Debug\n",
    )
    .unwrap();
    assert_eq!(
        actions,
        [
            Action::override_element(SectionScope::new("parameters"), "name", "default", "environment", "prod"),
            Action::override_element(SectionScope::new("variables"), "name", "value", "configuration", "Debug"),
        ]
    );
}

#[test]
fn reset_rejects_other_keys() {
    let err = parse_script(Path::new("actions.yml"), "- reset: schedules\n").unwrap_err();
    assert_eq!(
        err.to_string(),
        "actions.yml: entry 1 (`reset`): cannot reset `schedules`, expected `trigger` or `pr`"
    );
}

#[test]
fn global_must_be_boolean() {
    let err = parse_script(
        Path::new("actions.yml"),
        "- replace-literal: old\n  replace: new\n  global: sometimes\n",
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "actions.yml: entry 1 (`replace-literal`): `global` must be true or false, found `sometimes`"
    );
}

#[test]
fn invalid_selector_names_the_entry() {
    let err = parse_script(Path::new("actions.yml"), "- delete: steps/[displayName=Maven Package]\n").unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::InvalidScript);
    assert!(
        err.to_string()
            .starts_with("actions.yml: entry 1 (`delete`): invalid selector `steps/[displayName=Maven Package]`"),
        "{}",
        err
    );
}

#[test]
fn load_script_reports_missing_file() {
    let files = crate::files::MemoryFiles::new();
    let err = load_script(&files, Path::new("missing.yml")).unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::Io);
}
