mod common;

use maplit::{btreemap, convert_args};

use barbican::actions::{run_action, Action};
use barbican::error::CharmError;
use barbican::hsm::{generate_key, key_generation_args, HsmParams, KeyKind, BARBICAN_MANAGE};
use barbican::options::CharmOptions;
use barbican::relation::Relation;

use common::{hsm, required_relations, FakeHookTools, FakeRunner};

fn params() -> HsmParams {
    HsmParams {
        library_path: "path1".into(),
        login: "1234".into(),
        slot_id: "slot1".into(),
    }
}

fn options() -> CharmOptions {
    CharmOptions {
        mkek_key_length: 5,
        label_mkek: "the-label".into(),
        hmac_key_length: 32,
        label_hmac: "hmac-label".into(),
        ..Default::default()
    }
}

#[test]
fn mkek_command_line() {
    let runner = FakeRunner::default();

    generate_key(KeyKind::Mkek, &params(), &options(), &runner).unwrap();

    assert_eq!(
        runner.command_lines(),
        vec![
            "barbican-manage hsm gen_mkek --library-path path1 --passphrase 1234 \
             --slot-id slot1 --length 5 --label the-label"
        ]
    );
}

#[test]
fn hmac_command_line() {
    assert_eq!(
        key_generation_args(KeyKind::Hmac, &params(), &options()),
        vec![
            "hsm",
            "gen_hmac",
            "--library-path",
            "path1",
            "--passphrase",
            "1234",
            "--slot-id",
            "slot1",
            "--length",
            "32",
            "--label",
            "hmac-label",
        ]
    );
}

#[test]
fn failed_generation() {
    let runner = FakeRunner::failing(BARBICAN_MANAGE);

    match generate_key(KeyKind::Mkek, &params(), &options(), &runner) {
        Err(CharmError::KeyGeneration(message)) => {
            assert_eq!(message, "barbican-manage hsm gen_mkek failed.")
        }
        other => panic!("Expected key generation error, got {:?}", other),
    }
    assert_eq!(runner.calls.borrow().len(), 1);
}

#[test]
fn params_from_relation() {
    assert_eq!(HsmParams::from_relation(&hsm()), Some(params()));

    let numeric_slot = Relation::new(
        "hsm",
        "hsm:7",
        convert_args!(btreemap!(
            "plugin_data" => r#"{"library_path": "path1", "login": "1234", "slot_id": 0}"#,
        )),
    );
    assert_eq!(
        HsmParams::from_relation(&numeric_slot).map(|p| p.slot_id),
        Some("0".into())
    );

    let incomplete = Relation::new(
        "hsm",
        "hsm:7",
        convert_args!(btreemap!("plugin_data" => r#"{"library_path": "path1"}"#)),
    );
    assert_eq!(HsmParams::from_relation(&incomplete), None);
}

#[test]
fn action_names() {
    assert_eq!("generate-mkek".parse::<Action>().unwrap(), Action::GenerateMkek);
    assert_eq!("generate-hmac".parse::<Action>().unwrap(), Action::GenerateHmac);
    assert!("rotate-keys".parse::<Action>().is_err());
}

#[test]
fn action_runs_against_hsm() {
    let runner = FakeRunner::default();
    let mut relations = required_relations();
    relations.push(hsm());
    let tools = FakeHookTools::new(options(), relations.clone());

    run_action(Action::GenerateMkek, &options(), &relations, &runner, &tools).unwrap();

    assert_eq!(runner.calls_to(BARBICAN_MANAGE).len(), 1);
    assert!(tools.action_failures.borrow().is_empty());
}

#[test]
fn action_fails_without_hsm() {
    let runner = FakeRunner::default();
    let tools = FakeHookTools::new(options(), required_relations());

    assert!(run_action(
        Action::GenerateMkek,
        &options(),
        &required_relations(),
        &runner,
        &tools
    )
    .is_err());

    assert!(runner.calls.borrow().is_empty());
    assert_eq!(
        *tools.action_failures.borrow(),
        vec!["Can't generate an MKEK in associated HSM because HSM is not available."]
    );
}

#[test]
fn action_fails_when_command_fails() {
    let runner = FakeRunner::failing(BARBICAN_MANAGE);
    let relations = vec![hsm()];
    let tools = FakeHookTools::new(options(), relations.clone());

    assert!(run_action(Action::GenerateHmac, &options(), &relations, &runner, &tools).is_err());
    assert_eq!(
        *tools.action_failures.borrow(),
        vec!["barbican-manage hsm gen_hmac failed."]
    );
}
