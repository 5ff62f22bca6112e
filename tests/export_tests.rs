mod common;

use common::{Storage, composer, composer_data, md_files, message};
use cursor_composer_export::prompt::Prompter;
use cursor_composer_export::sequential::{ExportOutcome, execute};
use cursor_composer_export::utils::ExportConfig;
use std::fs;
use std::io::Cursor;
use tempfile::TempDir;

/// Two projects: `alpha` (older) and `beta` (newer, with two conversations).
fn storage() -> Storage {
    let storage = Storage::new();
    storage.add_workspace(
        "ws-alpha",
        Some("file:///home/dev/alpha"),
        Some(&composer_data(vec![composer(
            "alpha-1",
            "Alpha chat",
            Some(1_700_000_000_000),
            Some(vec![message(1, "alpha question")]),
        )])),
    );
    storage.add_workspace(
        "ws-beta",
        Some("C:\\work\\beta"),
        Some(&composer_data(vec![
            composer("beta-old", "Beta older", Some(1_710_000_000_000), None),
            composer(
                "beta-new",
                "Beta newer",
                Some(1_720_000_000_000),
                Some(vec![message(1, "stale")]),
            ),
        ])),
    );
    let detail = composer(
        "beta-new",
        "Beta newer",
        Some(1_720_000_000_000),
        Some(vec![message(1, "Hi"), message(2, "Hello")]),
    )
    .to_string();
    storage.add_global(&[("composerData:beta-new", &detail)]);
    storage
}

fn config(storage: &Storage, out: &TempDir, use_defaults: bool) -> ExportConfig {
    ExportConfig {
        output_dir: out.path().join("logs"),
        workspace_root: storage.root(),
        use_defaults,
        current_dir_name: None,
    }
}

fn run(config: &ExportConfig, input: &str) -> (ExportOutcome, String) {
    let mut prompter = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
    let outcome = execute(config, &mut prompter).unwrap();
    let printed = String::from_utf8(prompter.output().clone()).unwrap();
    (outcome, printed)
}

#[test]
fn default_mode_exports_latest_conversation_silently() {
    let storage = storage();
    let out = TempDir::new().unwrap();
    let config = config(&storage, &out, true);

    let (outcome, printed) = run(&config, "");

    let ExportOutcome::Written(path) = outcome else {
        panic!("expected a written transcript, got {outcome:?}");
    };
    assert_eq!(printed, format!("{}\n", path.display()));
    assert_eq!(path.parent().unwrap(), config.output_dir);
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("beta_"), "{name}");
    assert!(name.ends_with(".md"));

    let md = fs::read_to_string(&path).unwrap();
    assert!(md.starts_with("# Beta newer\n"));
    let user = md.find("### User\n\nHi\n").unwrap();
    let ai = md.find("### AI (composer)\n\nHello\n").unwrap();
    assert!(user < ai);
    assert!(!md.contains("stale"));
}

#[test]
fn default_mode_prefers_current_directory_project() {
    let storage = storage();
    let out = TempDir::new().unwrap();
    let mut config = config(&storage, &out, true);
    config.current_dir_name = Some("alpha".into());

    let (outcome, _) = run(&config, "");
    let ExportOutcome::Written(path) = outcome else {
        panic!("expected a written transcript, got {outcome:?}");
    };
    let md = fs::read_to_string(path).unwrap();
    assert!(md.starts_with("# Alpha chat\n"));
    assert!(md.contains("alpha question"));
}

#[test]
fn interactive_run_with_explicit_choices() {
    let storage = storage();
    let out = TempDir::new().unwrap();
    let config = config(&storage, &out, false);

    // directory: default, project: 1 (beta), log: 2 (older), filename: custom
    let (outcome, printed) = run(&config, "\n1\n2\nmy report\nbeta-notes\n");

    let expected = config.output_dir.join("beta-notes.md");
    assert_eq!(outcome, ExportOutcome::Written(expected.clone()));
    assert!(printed.contains("Available Projects:\n1. beta (last updated: "));
    assert!(printed.contains("2. alpha (last updated: "));
    assert!(printed.contains("] [beta] Beta newer\n"));
    assert!(printed.contains("Invalid filename."));
    assert!(printed.contains(&format!("Exported to: {}", expected.display())));

    // No detail record for the older conversation and no summary messages.
    let md = fs::read_to_string(&expected).unwrap();
    assert!(md.starts_with("# Beta older\n"));
    assert!(!md.contains("###"));
}

#[test]
fn interactive_defaults_use_composer_timestamp_in_filename() {
    let storage = storage();
    let out = TempDir::new().unwrap();
    let config = config(&storage, &out, false);

    let (outcome, printed) = run(&config, "\n\n\n\n");
    let ExportOutcome::Written(path) = outcome else {
        panic!("expected a written transcript, got {outcome:?}");
    };
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("beta_2024"), "{name}");
    assert!(printed.contains(&format!("(default: {name})")));
}

#[test]
fn conversation_list_is_capped_at_ten() {
    let storage = Storage::new();
    let composers = (1..=12)
        .map(|i| {
            composer(
                &format!("c{i}"),
                &format!("Chat {i:02}"),
                Some(1_700_000_000_000 + i * 1_000),
                Some(vec![message(1, &format!("question {i}"))]),
            )
        })
        .collect();
    storage.add_workspace("ws", Some("file:///home/dev/gamma"), Some(&composer_data(composers)));
    let out = TempDir::new().unwrap();
    let config = config(&storage, &out, false);

    // directory: default, project: default, log: 11 (rejected) then 10, filename: default
    let (outcome, printed) = run(&config, "\n\n11\n10\n\n");

    let ExportOutcome::Written(path) = outcome else {
        panic!("expected a written transcript, got {outcome:?}");
    };
    assert!(printed.contains("10. ["));
    assert!(!printed.contains("11. ["));
    assert!(printed.contains("] [gamma] Chat 12\n"));
    assert!(!printed.contains("Chat 02"));
    assert!(printed.contains("Invalid selection. Please enter a number between 1 and 10"));

    // Tenth most recent of twelve.
    let md = fs::read_to_string(path).unwrap();
    assert!(md.starts_with("# Chat 03\n"));
    assert!(md.contains("question 3"));
}

#[test]
fn quitting_writes_nothing() {
    for input in ["q\n", "\nq\n", "\n\nQ\n", "\n\n\nq\n", "\n1\n"] {
        let storage = storage();
        let out = TempDir::new().unwrap();
        let config = config(&storage, &out, false);

        let (outcome, _) = run(&config, input);
        assert_eq!(outcome, ExportOutcome::Cancelled, "input {input:?}");
        assert!(md_files(&config.output_dir).is_empty(), "input {input:?}");
    }
}

#[test]
fn empty_storage_exports_nothing() {
    let storage = common::Storage::new();
    let out = TempDir::new().unwrap();
    let config = config(&storage, &out, true);

    let (outcome, printed) = run(&config, "");
    assert_eq!(outcome, ExportOutcome::NothingToExport);
    assert!(printed.is_empty());
    assert!(md_files(&config.output_dir).is_empty());
}

#[test]
fn missing_workspace_root_is_an_error() {
    let out = TempDir::new().unwrap();
    let config = ExportConfig {
        output_dir: out.path().join("logs"),
        workspace_root: out.path().join("absent"),
        use_defaults: true,
        current_dir_name: None,
    };
    let mut prompter = Prompter::new(Cursor::new(Vec::new()), Vec::new());
    assert!(execute(&config, &mut prompter).is_err());
}
