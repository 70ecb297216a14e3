use super::*;
use crate::error::ErrorKind;

const PIPELINE: &str = "\
trigger:
  branches:
    include:
      - main
variables:
  - name: buildConfiguration
    value: Release
stages:
  - stage: build
    jobs:
      - job: compile
        steps:
          - task: Maven@3
            displayName: Maven Package
            inputs:
              goals: package
          - script: |
              echo one
              echo two
            displayName: \"Run: script\"
  - stage: deploy
    condition: false
    jobs: []
";

fn load(text: &str) -> Document {
    Document::parse("azure-pipelines.yml", text).unwrap()
}

#[test]
fn parse_keeps_document_order() {
    let doc = load(PIPELINE);
    let keys: Vec<&str> = doc.root().keys().map(|key| key.as_str()).collect();
    assert_eq!(keys, ["trigger", "variables", "stages"]);

    let stages = doc.root()["stages"].as_sequence().unwrap();
    assert_eq!(stages.len(), 2);
    assert!(stages[0].as_mapping().unwrap()["stage"].is_scalar("build"));
    assert!(stages[1].as_mapping().unwrap()["stage"].is_scalar("deploy"));
}

#[test]
fn parse_records_scalar_style() {
    let doc = load(PIPELINE);
    let stages = doc.root()["stages"].as_sequence().unwrap();
    let deploy = stages[1].as_mapping().unwrap();
    assert_eq!(deploy["condition"], Node::Scalar(Scalar::plain("false")));

    let build = stages[0].as_mapping().unwrap();
    let jobs = build["jobs"].as_sequence().unwrap();
    let steps = jobs[0].as_mapping().unwrap()["steps"].as_sequence().unwrap();
    let script = steps[1].as_mapping().unwrap();
    assert_eq!(script["script"], Node::Scalar(Scalar::quoted("echo one\necho two\n")));
    assert_eq!(script["displayName"], Node::Scalar(Scalar::quoted("Run: script")));
}

#[test]
fn duplicate_key_is_rejected() {
    let text = "steps:\n  - task: Bash@3\n    task: PowerShell@2\n";
    let err = Document::parse("dup.yml", text).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    assert!(err.to_string().contains("duplicate key `task`"), "{}", err);
    assert!(err.to_string().starts_with("dup.yml:"), "{}", err);
}

#[test]
fn same_key_at_different_levels_is_fine() {
    let text = "name: outer\nnested:\n  name: inner\n";
    let doc = load(text);
    assert!(doc.root()["name"].is_scalar("outer"));
}

#[test]
fn root_must_be_a_mapping() {
    let err = Document::parse("list.yml", "- a\n- b\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDocument);

    let err = Document::parse("empty.yml", "").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDocument);
}

#[test]
fn multiple_documents_are_rejected() {
    let err = Document::parse("multi.yml", "a: 1\n---\nb: 2\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDocument);
}

#[test]
fn aliases_are_rejected() {
    let text = "base: &base\n  pool: ubuntu\nother: *base\n";
    let err = Document::parse("alias.yml", text).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDocument);
    assert!(err.to_string().contains("aliases"), "{}", err);
}

#[test]
fn invalid_yaml_is_a_syntax_error() {
    let err = Document::parse("bad.yml", "stages: [\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
}

#[test]
fn dump_round_trip_is_stable() {
    let doc = load(PIPELINE);
    let first = doc.dump().unwrap();

    let reparsed = Document::parse("azure-pipelines.yml", &first).unwrap();
    // Quoted scalars that need no quotes come back plain after the first dump.
    assert_eq!(strip_styles(doc.root()), strip_styles(reparsed.root()));

    let second = reparsed.dump().unwrap();
    assert_eq!(first, second);
}

#[test]
fn dump_round_trip_keeps_block_and_quoted_values() {
    let text = "\
strip: |-
  echo one
  echo two
clip: |
  line
keep: |+
  line

folded: >
  one
  two
indented: \"  leading\\nspaces\"
number: \"123\"
flag: \"true\"
nothing: ~
";
    let doc = load(text);
    let first = doc.dump().unwrap();
    let reparsed = load(&first);
    assert_eq!(reparsed.root(), doc.root());
    assert_eq!(reparsed.dump().unwrap(), first);

    let root = reparsed.root();
    assert!(root["strip"].is_scalar("echo one\necho two"));
    assert!(root["clip"].is_scalar("line\n"));
    assert!(root["keep"].is_scalar("line\n\n"));
    assert!(root["folded"].is_scalar("one two\n"));
    assert!(root["indented"].is_scalar("  leading\nspaces"));
    assert_eq!(root["number"], Node::Scalar(Scalar::quoted("123")));
    assert_eq!(root["flag"], Node::Scalar(Scalar::quoted("true")));
    assert_eq!(root["nothing"], Node::Scalar(Scalar::plain("~")));
}

#[test]
fn tags_are_rejected() {
    for text in ["version: !!str 123\n", "steps: !custom\n  - a\n", "pool: !!map\n  name: x\n"] {
        let err = Document::parse("tagged.yml", text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDocument, "{}", text);
        assert!(err.to_string().contains("tags are not supported"), "{}", err);
    }
}

#[test]
fn dump_keeps_values() {
    let doc = load(PIPELINE);
    let text = doc.dump().unwrap();
    let reparsed = load(&text);

    let stages = reparsed.root()["stages"].as_sequence().unwrap();
    let deploy = stages[1].as_mapping().unwrap();
    assert!(deploy["condition"].is_scalar("false"));
    assert_eq!(deploy["jobs"], Node::Sequence(Vec::new()));

    let build = stages[0].as_mapping().unwrap();
    let jobs = build["jobs"].as_sequence().unwrap();
    let steps = jobs[0].as_mapping().unwrap()["steps"].as_sequence().unwrap();
    assert!(steps[1].as_mapping().unwrap()["script"].is_scalar("echo one\necho two\n"));
    assert!(steps[1].as_mapping().unwrap()["displayName"].is_scalar("Run: script"));
}

#[test]
fn plain_numbers_and_booleans_survive_dump() {
    let doc = load("retries: 3\nratio: 1.50\nenabled: true\nempty:\nhex: 0x1F\n");
    let text = doc.dump().unwrap();
    let reparsed = load(&text);
    assert_eq!(reparsed.root()["retries"], Node::Scalar(Scalar::plain("3")));
    assert_eq!(reparsed.root()["ratio"], Node::Scalar(Scalar::plain("1.50")));
    assert_eq!(reparsed.root()["enabled"], Node::Scalar(Scalar::plain("true")));
    assert_eq!(reparsed.root()["hex"], Node::Scalar(Scalar::plain("0x1F")));
    assert_eq!(reparsed.root()["empty"], doc.root()["empty"]);
}

#[test]
fn quoted_number_stays_a_string() {
    let doc = load("version: \"3\"\n");
    let reparsed = load(&doc.dump().unwrap());
    assert_eq!(reparsed.root()["version"], Node::Scalar(Scalar::quoted("3")));
}

#[test]
fn payload_parse_accepts_any_root() {
    let node = Node::parse("script: echo hi\ndisplayName: Mocked\n").unwrap();
    let map = node.as_mapping().unwrap();
    assert!(map["script"].is_scalar("echo hi"));

    let node = Node::parse("- a\n- b\n").unwrap();
    assert_eq!(node.as_sequence().unwrap().len(), 2);
}

#[test]
fn poisoned_document_refuses_dump() {
    let mut doc = load("a: b\n");
    doc.poison();
    let err = doc.dump().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Poisoned);
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
