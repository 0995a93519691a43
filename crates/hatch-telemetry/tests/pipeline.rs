//! End-to-end tests of classification, filtering and publishing

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use hatch_core::{classify, CommandCatalog, CommandError};
use hatch_telemetry::event::{
    ARGUMENT_PROPERTY, DETAIL_PROPERTY, EXCEPTION_EVENT, EXCEPTION_TYPE_PROPERTY, EXE_NAME_PROPERTY,
    INSTALL_SUCCESS_EVENT, SUB_LEVEL_COMMAND_EVENT, TOP_LEVEL_COMMAND_EVENT, VERB_PROPERTY,
};
use hatch_telemetry::failure::PANIC_KIND;
use hatch_telemetry::{
    capture_failures, report_install_success, EventBus, HashingFilter, RecordingSubscriber, Redactor,
    Sha256Hasher, TelemetryEvent,
};

struct Harness {
    bus: EventBus,
    catalog: Arc<CommandCatalog>,
    recorder: RecordingSubscriber,
}

impl Harness {
    fn new() -> Self {
        let catalog = Arc::new(CommandCatalog::builtin());
        let bus = EventBus::new();
        let recorder = RecordingSubscriber::new();
        bus.subscribe(Arc::new(recorder.clone()));
        bus.configure_filter(Arc::new(HashingFilter::sha256(Arc::clone(&catalog))));
        Self { bus, catalog, recorder }
    }

    fn process(&self, argv: &[&str]) -> Vec<TelemetryEvent> {
        let record = classify(&self.catalog, argv);
        self.bus.publish_invocation(&record);
        self.recorder.events()
    }
}

fn h(value: &str) -> String {
    Sha256Hasher::hash(value)
}

fn contains(events: &[TelemetryEvent], name: &str, expected: &[(&str, String)]) -> bool {
    events.iter().any(|e| {
        e.name() == name && expected.iter().all(|(k, v)| e.property(k) == Some(v.as_str()))
    })
}

#[test]
fn test_top_level_command_name_is_sent() {
    let events = Harness::new().process(&["help"]);
    assert!(contains(&events, TOP_LEVEL_COMMAND_EVENT, &[(VERB_PROPERTY, h("HELP"))]));
}

#[test]
fn test_new_console_scenario() {
    let events = Harness::new().process(&["new", "console"]);
    assert_eq!(events.len(), 2);
    assert!(contains(&events, TOP_LEVEL_COMMAND_EVENT, &[(VERB_PROPERTY, h("NEW"))]));
    assert!(contains(
        &events,
        SUB_LEVEL_COMMAND_EVENT,
        &[(VERB_PROPERTY, h("NEW")), (ARGUMENT_PROPERTY, h("CONSOLE"))]
    ));
}

#[test]
fn test_first_argument_is_sent_for_shaped_verbs() {
    let cases: &[(&[&str], &str, &str)] = &[
        (&["help", "something"], "HELP", "SOMETHING"),
        (&["add", "package", "aPackageName"], "ADD", "PACKAGE"),
        (&["add", "reference", "aPackageName"], "ADD", "REFERENCE"),
        (&["remove", "package", "aPackageName"], "REMOVE", "PACKAGE"),
        (&["list", "reference", "aPackageName"], "LIST", "REFERENCE"),
        (&["sln", "aSolution", "list"], "SLN", "LIST"),
        (&["nuget", "push", "path"], "NUGET", "PUSH"),
    ];

    for (argv, verb, argument) in cases {
        let events = Harness::new().process(argv);
        let with_argument: Vec<_> = events
            .iter()
            .filter(|e| e.property(ARGUMENT_PROPERTY).is_some())
            .collect();
        assert_eq!(with_argument.len(), 1, "argv {:?}", argv);
        assert_eq!(with_argument[0].name(), SUB_LEVEL_COMMAND_EVENT);
        assert_eq!(with_argument[0].property(VERB_PROPERTY), Some(h(verb).as_str()));
        assert_eq!(with_argument[0].property(ARGUMENT_PROPERTY), Some(h(argument).as_str()));
    }
}

#[test]
fn test_language_option_of_new() {
    let events = Harness::new().process(&["new", "console", "--language", "c#"]);
    assert!(contains(
        &events,
        SUB_LEVEL_COMMAND_EVENT,
        &[(VERB_PROPERTY, h("NEW")), ("language", h("C#"))]
    ));
}

#[test]
fn test_verbosity_option_of_any_command() {
    let events = Harness::new().process(&["restore", "--verbosity", "minimal"]);
    assert!(contains(
        &events,
        SUB_LEVEL_COMMAND_EVENT,
        &[(VERB_PROPERTY, h("RESTORE")), ("verbosity", h("MINIMAL"))]
    ));
}

#[test]
fn test_build_with_multiple_options_scenario() {
    let events = Harness::new().process(&["build", "--configuration", "Debug", "--runtime", "osx.10.11-x64"]);
    assert_eq!(events.len(), 3);
    assert!(contains(&events, TOP_LEVEL_COMMAND_EVENT, &[(VERB_PROPERTY, h("BUILD"))]));
    assert!(contains(
        &events,
        SUB_LEVEL_COMMAND_EVENT,
        &[(VERB_PROPERTY, h("BUILD")), ("configuration", h("DEBUG"))]
    ));
    assert!(contains(
        &events,
        SUB_LEVEL_COMMAND_EVENT,
        &[(VERB_PROPERTY, h("BUILD")), ("runtime", h("OSX.10.11-X64"))]
    ));
}

#[test]
fn test_clean_with_multiple_options() {
    let events = Harness::new().process(&["clean", "--configuration", "Debug", "--framework", "netcoreapp1.0"]);
    assert!(contains(
        &events,
        SUB_LEVEL_COMMAND_EVENT,
        &[(VERB_PROPERTY, h("CLEAN")), ("framework", h("NETCOREAPP1.0"))]
    ));
}

#[test]
fn test_k_options_give_k_events_with_the_same_verb() {
    let argv = [
        "publish",
        "--configuration",
        "Release",
        "--runtime",
        "linux-x64",
        "--framework",
        "net8.0",
        "--verbosity",
        "quiet",
    ];
    let events = Harness::new().process(&argv);
    let option_events: Vec<_> = events
        .iter()
        .filter(|e| e.name() == SUB_LEVEL_COMMAND_EVENT && e.property(ARGUMENT_PROPERTY).is_none())
        .collect();

    assert_eq!(option_events.len(), 4);
    let verb = h("PUBLISH");
    assert!(option_events.iter().all(|e| e.property(VERB_PROPERTY) == Some(verb.as_str())));
}

#[test]
fn test_empty_argv_reports_empty_verb() {
    let events = Harness::new().process(&[]);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].property(VERB_PROPERTY), Some(h("").as_str()));
}

#[test]
fn test_invalid_commands_do_not_panic() {
    Harness::new().process(&["publish", "-r"]);
    Harness::new().process(&["restore", "-v"]);
}

#[test]
fn test_no_property_value_equals_a_raw_token() {
    let argv = [
        "new",
        "console",
        "--language",
        "F#",
        "--configuration",
        "Debug",
        "--output",
        "/home/alice/secret-project",
    ];
    let events = Harness::new().process(&argv);
    for event in &events {
        for value in event.properties().values() {
            assert!(!argv.contains(&value.as_str()), "raw token leaked: {}", value);
        }
    }
}

#[test]
fn test_failing_first_subscriber_does_not_starve_second() {
    let catalog = Arc::new(CommandCatalog::builtin());
    let bus = EventBus::new();
    let recorder = RecordingSubscriber::new();
    bus.subscribe(Arc::new(|_: &TelemetryEvent| -> anyhow::Result<()> {
        anyhow::bail!("always fails")
    }));
    bus.subscribe(Arc::new(recorder.clone()));
    bus.configure_filter(Arc::new(HashingFilter::sha256(Arc::clone(&catalog))));

    bus.publish_invocation(&classify(&catalog, &["build", "--configuration", "Debug"]));
    assert_eq!(recorder.len(), 2);
}

#[test]
fn test_install_success_reports_hashed_file_name() {
    let bus = EventBus::new();
    let recorder = RecordingSubscriber::new();
    bus.subscribe(Arc::new(recorder.clone()));

    report_install_success(&bus, "c:\\mypath\\dotnet-sdk-latest-win-x64.exe");

    let events = recorder.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name(), INSTALL_SUCCESS_EVENT);
    assert_eq!(
        events[0].property(EXE_NAME_PROPERTY),
        Some("5b1fb3099472bd0bea99dd8dddade45bf26b230ec7599c07b8a6c884ab4bccaf")
    );
}

#[test]
fn test_failure_is_reported_once_and_returned() {
    let harness = Harness::new();
    let argv = ["frobnicate", "--target", "Contoso.Internal"];
    harness.process(&argv);
    harness.recorder.clear();

    let redactor = Redactor::for_invocation(&argv);
    let outcome: Result<i32, CommandError> = capture_failures(&harness.bus, &redactor, || {
        Err(CommandError::Spawn {
            program: "hatch-frobnicate".to_string(),
            source: io::Error::new(io::ErrorKind::Other, "cannot open Contoso.Internal"),
        })
    });

    assert!(matches!(outcome, Err(CommandError::Spawn { .. })));
    let events = harness.recorder.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name(), EXCEPTION_EVENT);
    assert_eq!(
        events[0].property(EXCEPTION_TYPE_PROPERTY),
        Some("hatch_core::error::CommandError::Spawn")
    );
    let detail = events[0].property(DETAIL_PROPERTY).unwrap();
    assert!(!detail.contains("Contoso.Internal"));
    assert!(!detail.contains("frobnicate"));
}

#[test]
fn test_success_publishes_nothing() {
    let harness = Harness::new();
    let redactor = Redactor::for_invocation::<&str>(&[]);
    let outcome: Result<i32, CommandError> = capture_failures(&harness.bus, &redactor, || Ok(0));
    assert_eq!(outcome.unwrap(), 0);
    assert!(harness.recorder.is_empty());
}

#[test]
fn test_panic_is_reported_then_resumed() {
    let harness = Harness::new();
    let redactor = Redactor::for_invocation(&["build"]);

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let _: Result<(), CommandError> =
            capture_failures(&harness.bus, &redactor, || panic!("dispatch bug"));
    }));

    assert!(result.is_err());
    let events = harness.recorder.events_named(EXCEPTION_EVENT);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].property(EXCEPTION_TYPE_PROPERTY), Some(PANIC_KIND));
    assert_eq!(events[0].property(DETAIL_PROPERTY), Some("dispatch bug"));
}
