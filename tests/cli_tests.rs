use scriptgen::cli::{collect_scripts, run};
use scriptgen::Error;
use std::fs;
use test_log::test;
mod utils;
use utils::{args, copy_tree, run_and_assert, Workspace};

#[test]
fn generates_plain_canonical_and_merged_outputs() {
    run_and_assert("tests/fixtures/shop", "tests/expected/shop", "shop.yaml", &["gen"]);
}

#[test]
fn regeneration_is_byte_identical() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    copy_tree("tests/fixtures/shop".as_ref(), first.path());
    copy_tree("tests/fixtures/shop".as_ref(), second.path());

    assert!(run(args(first.path(), "shop.yaml", &["gen"])).unwrap());
    assert!(run(args(second.path(), "shop.yaml", &["gen/outputs.gen"])).unwrap());
    assert!(!dir_diff::is_different(first.path(), second.path()).unwrap());

    // A second run over already generated files changes nothing.
    assert!(run(args(first.path(), "shop.yaml", &["gen"])).unwrap());
    assert!(!dir_diff::is_different(first.path(), second.path()).unwrap());
}

#[test]
fn one_failing_script_fails_the_run_but_not_its_siblings() {
    let ws = Workspace::new();
    ws.write("gen/good.gen", "{{ output.write('good.rs', 'ok') }}");
    ws.write("gen/bad.gen", "{{ output.write('bad.rs', 'x') }}{{ raise('stop') }}");

    let succeeded = run(args(ws.root(), "shop.yaml", &["gen"])).unwrap();

    assert!(!succeeded);
    assert_eq!(ws.body("gen/good.rs"), "ok");
    assert!(!ws.path("gen/bad.rs").exists());
}

#[test]
fn explicit_config_file_changes_the_default_output_name() {
    let ws = Workspace::new();
    ws.write("gen/models.gen", "class Model {}");
    let config = ws.write("custom.json", r#"{"schemaVersion": "v1", "output_extension": "cs"}"#);

    let mut cli_args = args(ws.root(), "shop.yaml", &["gen"]);
    cli_args.config = Some(config);
    assert!(run(cli_args).unwrap());

    assert_eq!(ws.body("gen/models.cs"), "class Model {}");
    assert!(!ws.path("gen/models.rs").exists());
}

#[test]
fn configured_script_extension_selects_scripts() {
    let ws = Workspace::new();
    ws.write("scriptgen.yaml", "schemaVersion: v1\nscript_extension: tpl\n");
    ws.write("gen/a.tpl", "a");
    ws.write("gen/b.gen", "b");

    assert!(run(args(ws.root(), "shop.yaml", &["gen"])).unwrap());

    assert!(ws.path("gen/a.rs").exists());
    assert!(!ws.path("gen/b.rs").exists());
}

#[test]
fn missing_project_is_an_error() {
    let ws = Workspace::new();
    ws.write("gen/a.gen", "a");
    let err = run(args(ws.root(), "nope.yaml", &["gen"])).unwrap_err();
    assert!(matches!(err, Error::MissingFile { what: "project", .. }));
}

#[test]
fn scripts_are_deduplicated_and_sorted() {
    let ws = Workspace::new();
    ws.write("gen/z.gen", "");
    ws.write("gen/a.gen", "");
    fs::create_dir_all(ws.path("empty")).unwrap();

    let scripts = collect_scripts(
        &[ws.path("gen/z.gen"), ws.path("gen"), ws.path("empty")],
        "gen",
    )
    .unwrap();

    assert_eq!(scripts, vec![ws.path("gen/a.gen"), ws.path("gen/z.gen")]);
}
