use super::*;
use crate::{document::Document, DocumentSet};

const PIPELINE: &str = "\
trigger:
  - main
pr:
  branches:
    include:
      - main
parameters:
  - name: environment
    default: dev
variables:
  - name: configuration
    value: Release
stages:
  - stage: build
    jobs:
      - job: compile
        steps:
          - task: Bash@3
            displayName: Version
            inputs:
              targetType: inline
              script: git describe --tags
          - bash: git rev-parse HEAD
            displayName: Commit
          - script: make
            displayName: Build
  - stage: deploy
    jobs:
      - job: release
        steps:
          - task: AWSShellScript@1
            displayName: Deploy
";

fn load() -> DocumentSet {
    DocumentSet::new(Document::parse("azure-pipelines.yml", PIPELINE).unwrap())
}

fn stages(set: &DocumentSet) -> &Vec<Node> {
    set.main().root()["stages"].as_sequence().unwrap()
}

fn build_steps(set: &DocumentSet) -> &Vec<Node> {
    let build = stages(set)[0].as_mapping().unwrap();
    let compile = build["jobs"].as_sequence().unwrap()[0].as_mapping().unwrap();
    compile["steps"].as_sequence().unwrap()
}

#[test]
fn skip_stage_removes_stage() {
    let mut set = load();
    assert!(set.execute(&skip_stage("deploy")).unwrap());
    assert_eq!(stages(&set).len(), 1);
    assert!(!set.execute(&skip_stage("deploy")).unwrap());
}

#[test]
fn skip_job_removes_job() {
    let mut set = load();
    assert!(set.execute(&skip_job("release")).unwrap());
    let deploy = stages(&set)[1].as_mapping().unwrap();
    assert!(deploy["jobs"].as_sequence().unwrap().is_empty());
}

#[test]
fn skip_step_by_display_name() {
    let mut set = load();
    assert!(set.execute(&skip_step("Commit")).unwrap());
    let names: Vec<&str> = build_steps(&set)
        .iter()
        .map(|step| step.as_mapping().unwrap()["displayName"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Version", "Build"]);
}

#[test]
fn mock_step_replaces_with_script() {
    let mut set = load();
    assert!(set.execute(&mock_step("Build", "echo mocked")).unwrap());
    let step = build_steps(&set)[2].as_mapping().unwrap();
    assert!(step["script"].is_scalar("echo mocked"));
    assert!(step["displayName"].is_scalar("Build"));
    assert!(!step.contains_key("task"));
}

#[test]
fn set_variable_in_list_form() {
    let mut set = load();
    assert!(set.execute(&set_variable("configuration", "Debug")).unwrap());
    let variable = set.main().root()["variables"].as_sequence().unwrap()[0].as_mapping().unwrap();
    assert!(variable["value"].is_scalar("Debug"));
}

#[test]
fn set_variable_in_mapping_form() {
    let doc = Document::parse("vars.yml", "variables:\n  configuration: Release\n").unwrap();
    let mut set = DocumentSet::new(doc);
    assert!(set.execute(&set_variable("configuration", "Debug")).unwrap());
    assert!(set.main().root()["variables"].as_mapping().unwrap()["configuration"].is_scalar("Debug"));
}

#[test]
fn set_parameter_default_overrides_default() {
    let mut set = load();
    assert!(set.execute(&set_parameter_default("environment", "prod")).unwrap());
    let parameter = set.main().root()["parameters"].as_sequence().unwrap()[0].as_mapping().unwrap();
    assert!(parameter["default"].is_scalar("prod"));
    assert!(!set.execute(&set_parameter_default("missing", "x")).unwrap());
}

#[test]
fn reset_trigger_and_pr() {
    let mut set = load();
    assert_eq!(set.execute_all([&reset_trigger(), &reset_pull_request()]).unwrap(), [true, true]);
    assert!(set.main().root()["trigger"].is_scalar("none"));
    assert!(set.main().root()["pr"].is_scalar("none"));
}

#[test]
fn mock_bash_command_in_task_inputs() {
    let mut set = load();
    let applied = set.execute_all(&mock_bash_command("Version", "git", "v1.2.3")).unwrap();
    assert_eq!(applied, [true, false, false]);

    let inputs = build_steps(&set)[0].as_mapping().unwrap()["inputs"].as_mapping().unwrap();
    assert!(inputs["script"].is_scalar("function git { echo 'v1.2.3'; }\ngit describe --tags"));
}

#[test]
fn mock_bash_command_in_bash_and_script_steps() {
    let mut set = load();
    assert_eq!(
        set.execute_all(&mock_bash_command("Commit", "git", "abc")).unwrap(),
        [false, true, false]
    );
    assert_eq!(
        set.execute_all(&mock_bash_command("Build", "make", "it's done")).unwrap(),
        [false, false, true]
    );

    let steps = build_steps(&set);
    assert!(steps[1].as_mapping().unwrap()["bash"].is_scalar("function git { echo 'abc'; }\ngit rev-parse HEAD"));
    assert!(steps[2].as_mapping().unwrap()["script"].is_scalar("function make { echo 'it'\\''s done'; }\nmake"));
}

#[test]
fn mock_bash_command_survives_dump() {
    let mut set = load();
    set.execute_all(&mock_bash_command("Build", "make", "ok")).unwrap();
    let text = set.main().dump().unwrap();
    let reparsed = DocumentSet::new(Document::parse("azure-pipelines.yml", &text).unwrap());
    let script = &build_steps(&reparsed)[2].as_mapping().unwrap()["script"];
    assert!(script.is_scalar("function make { echo 'ok'; }\nmake"));
}
