use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use interact::{
    CompileError, Event, FieldEvent, FieldSpec, FnLoader, GroupEvent, INTERRUPT_LINE, Interact,
    InteractError, InteractOptions, LoaderError, PatternCompiler, Predicate, PredicateCompiler,
    RunOptions, ScriptedReader, SelectOption, Transcript, Validator,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::mpsc;

async fn run_scripted(
    header: &str,
    fields: Vec<FieldSpec>,
    options: InteractOptions,
    lines: &[&str],
) -> (Vec<Event>, Option<InteractError>, Transcript) {
    let reader = ScriptedReader::new(lines.iter().copied()).masked(options.masked);
    let transcript = reader.transcript();
    let (events, err) = Interact::with_reader(header, fields, options, reader)
        .run(RunOptions::interactive())
        .collect_events()
        .await;
    (events, err, transcript)
}

fn trail(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|segment| segment.to_string()).collect()
}

fn input(segments: &[&str], answer: Value) -> Event {
    Event::Input(FieldEvent {
        trail: trail(segments),
        name: segments.last().expect("non-empty trail").to_string(),
        answer,
        shave: None,
        params: None,
    })
}

fn group(tag: &str, segments: &[&str], token: &str) -> Event {
    let name = segments.last().expect("non-empty trail");
    group_named(tag, segments, name, token)
}

fn group_named(tag: &str, segments: &[&str], name: &str, token: &str) -> Event {
    let data = GroupEvent {
        trail: trail(segments),
        name: name.to_string(),
        answer: json!(token),
    };
    match tag {
        "enter" => Event::Enter(data),
        _ => Event::Exit(data),
    }
}

fn tags(events: &[Event]) -> Vec<&'static str> {
    events.iter().map(Event::tag).collect()
}

#[tokio::test]
async fn confirm_accepts_yes_spellings_only() {
    for (line, expected) in [
        ("y", true),
        ("yes", true),
        ("Y", true),
        ("YES", true),
        ("nope", false),
        ("true", false),
        ("", false),
    ] {
        let field = FieldSpec::new("proceed").prompt("Proceed").boolean();
        let (events, err, _) =
            run_scripted("", vec![field], InteractOptions::new(), &[line]).await;
        assert!(err.is_none(), "unexpected error for {line:?}: {err:?}");
        let Event::Confirm(data) = &events[0] else {
            panic!("expected confirm for {line:?}, got {:?}", events[0]);
        };
        assert_eq!(data.answer, json!(expected), "line {line:?}");
        assert_eq!(data.trail, trail(&["proceed"]));
        assert!(events[1].is_final());
    }
}

#[tokio::test]
async fn empty_confirm_uses_default_truthiness() {
    let field = FieldSpec::new("proceed").boolean().default_value(true);
    let (events, _, transcript) =
        run_scripted("", vec![field], InteractOptions::new(), &[""]).await;
    assert_eq!(events[0].field().expect("field").answer, json!(true));
    assert!(transcript.output().contains("proceed (Yes/No): (true)"));
}

#[tokio::test]
async fn empty_input_resolves_to_default_placeholder() {
    let field = FieldSpec::new("name")
        .prompt("Project name")
        .description("Used in URLs")
        .default_value("my-app");
    let (events, err, transcript) =
        run_scripted("Create app", vec![field], InteractOptions::new(), &[""]).await;
    assert!(err.is_none());
    assert_eq!(events[0], input(&["name"], json!("my-app")));
    assert_eq!(
        transcript.output(),
        "Create app\n  - Used in URLs\nProject name: (my-app)\n"
    );
}

#[tokio::test]
async fn configured_default_beats_field_default() {
    let field = FieldSpec::new("port").default_value("8080");
    let options = InteractOptions::new().with_default("port", "3000");
    let (events, _, _) = run_scripted("", vec![field], options, &[""]).await;
    assert_eq!(events[0], input(&["port"], json!("3000")));
}

#[tokio::test]
async fn null_configured_default_falls_back_to_field_default() {
    let field = FieldSpec::new("port").default_value("8080");
    let options = InteractOptions::new().with_default("port", Value::Null);
    let (events, err, transcript) = run_scripted("", vec![field], options, &[""]).await;
    assert!(err.is_none());
    assert_eq!(events[0], input(&["port"], json!("8080")));
    assert_eq!(transcript.output(), "port: (8080)\n");
}

#[tokio::test]
async fn empty_string_default_shows_no_placeholder() {
    let field = FieldSpec::new("password")
        .prompt("Password")
        .default_value("");
    let (events, err, transcript) =
        run_scripted("", vec![field], InteractOptions::new(), &[""]).await;
    assert!(err.is_none());
    assert_eq!(events[0], input(&["password"], json!("")));
    assert_eq!(transcript.output(), "Password: \n");
}

#[tokio::test]
async fn empty_input_without_default_is_empty_string() {
    let (events, err, _) =
        run_scripted("", vec![FieldSpec::new("note")], InteractOptions::new(), &[""]).await;
    assert!(err.is_none());
    assert_eq!(events[0], input(&["note"], json!("")));
}

fn template_field() -> FieldSpec {
    FieldSpec::new("template").prompt("Template").select(vec![
        SelectOption::new("Web")
            .with_description("static site")
            .with_params(json!({ "kind": "web" })),
        SelectOption::new("Desktop").with_params(json!({ "kind": "desktop" })),
    ])
}

#[tokio::test]
async fn select_resolves_numeric_choice() {
    let (events, err, transcript) =
        run_scripted("", vec![template_field()], InteractOptions::new(), &["1"]).await;
    assert!(err.is_none());
    assert_eq!(
        events[0],
        Event::Select(FieldEvent {
            trail: trail(&["template", "Desktop"]),
            name: "Desktop".into(),
            answer: json!({ "kind": "desktop" }),
            shave: None,
            params: None,
        })
    );
    assert_eq!(
        transcript.output(),
        "Template\n  0) Web - static site\n  1) Desktop\n[0-1]: 1\n"
    );
}

#[tokio::test]
async fn select_falls_back_to_first_option() {
    for line in ["", "7", "web", "-1"] {
        let (events, err, _) =
            run_scripted("", vec![template_field()], InteractOptions::new(), &[line]).await;
        assert!(err.is_none());
        let data = events[0].field().expect("select");
        assert_eq!(data.name, "Web", "line {line:?}");
        assert_eq!(data.answer, json!({ "kind": "web" }));
    }
}

#[tokio::test]
async fn select_option_without_params_fails_the_run() {
    let field = FieldSpec::new("template").select(vec![SelectOption::new("Web")]);
    let (events, err, _) = run_scripted("", vec![field], InteractOptions::new(), &["0"]).await;
    let err = err.expect("missing params error");
    assert!(err.to_string().contains("missing params"));
    assert!(events.iter().all(|event| !event.is_final()));
}

#[tokio::test]
async fn empty_select_fails_the_run() {
    let field = FieldSpec::new("template").select(Vec::new());
    let (events, err, _) = run_scripted("", vec![field], InteractOptions::new(), &[]).await;
    assert!(matches!(err, Some(InteractError::EmptySelect { .. })));
    assert!(events.is_empty());
}

fn db_groups() -> BTreeMap<String, Vec<FieldSpec>> {
    let mut groups = BTreeMap::new();
    groups.insert(
        "db-fields".to_string(),
        vec![
            FieldSpec::new("host").default_value("localhost"),
            FieldSpec::new("port"),
        ],
    );
    groups
}

#[tokio::test]
async fn group_brackets_children_with_extended_trail() {
    let fields = vec![
        FieldSpec::new("db").group("db-fields"),
        FieldSpec::new("proceed").boolean(),
    ];
    let options = InteractOptions::new().with_loader(db_groups());
    let (events, err, _) = run_scripted("Setup", fields, options, &["", "5432", "y"]).await;
    assert!(err.is_none(), "{err:?}");
    assert_eq!(
        events[..4],
        [
            group("enter", &["db"], "db-fields"),
            input(&["db", "host"], json!("localhost")),
            input(&["db", "port"], json!("5432")),
            group("exit", &["db"], "db-fields"),
        ]
    );
    assert_eq!(tags(&events[4..]), vec!["confirm", "final"]);
}

#[tokio::test]
async fn header_is_written_once() {
    let fields = vec![FieldSpec::new("db").group("db-fields")];
    let options = InteractOptions::new().with_loader(db_groups());
    let (_, _, transcript) = run_scripted("Setup", fields, options, &["", ""]).await;
    assert_eq!(transcript.output().matches("Setup").count(), 1);
}

#[tokio::test]
async fn child_named_after_its_group_does_not_nest_again() {
    let mut groups = BTreeMap::new();
    groups.insert(
        "db-fields".to_string(),
        vec![FieldSpec::new("db").prompt("Database name"), FieldSpec::new("user")],
    );
    let fields = vec![FieldSpec::new("db").group("db-fields")];
    let options = InteractOptions::new().with_loader(groups);
    let (events, err, _) = run_scripted("", fields, options, &["main", "admin"]).await;
    assert!(err.is_none());
    assert_eq!(events[1], input(&["db"], json!("main")));
    assert_eq!(events[2], input(&["db", "user"], json!("admin")));
}

#[tokio::test]
async fn selected_group_option_enters_under_the_field_name() {
    let mut groups = BTreeMap::new();
    groups.insert("web".to_string(), vec![FieldSpec::new("port")]);
    let field = FieldSpec::new("template").select(vec![
        SelectOption::new("Web").with_params(json!("web")),
        SelectOption::new("Desktop").with_params(json!({ "kind": "desktop" })),
    ]);
    let options = InteractOptions::new().with_loader(groups);
    let (events, err, _) = run_scripted("", vec![field], options, &["0", "8080"]).await;
    assert!(err.is_none(), "{err:?}");
    assert_eq!(
        events,
        vec![
            Event::Select(FieldEvent {
                trail: trail(&["template", "Web"]),
                name: "Web".into(),
                answer: json!("web"),
                shave: None,
                params: None,
            }),
            group_named("enter", &["template", "Web"], "template", "web"),
            input(&["template", "Web", "port"], json!("8080")),
            group_named("exit", &["template", "Web"], "template", "web"),
            Event::Final(interact::FinalEvent { success: true }),
        ]
    );
}

#[tokio::test]
async fn child_named_after_the_chosen_label_stays_at_that_level() {
    let mut groups = BTreeMap::new();
    groups.insert(
        "web".to_string(),
        vec![FieldSpec::new("Web").prompt("Site title"), FieldSpec::new("port")],
    );
    let field = FieldSpec::new("template")
        .select(vec![SelectOption::new("Web").with_params(json!("web"))]);
    let options = InteractOptions::new().with_loader(groups);
    let (events, err, _) = run_scripted("", vec![field], options, &["0", "blog", "80"]).await;
    assert!(err.is_none(), "{err:?}");
    assert_eq!(events[2], input(&["template", "Web"], json!("blog")));
    assert_eq!(events[3], input(&["template", "Web", "port"], json!("80")));
    assert_eq!(
        events[4],
        group_named("exit", &["template", "Web"], "template", "web")
    );
}

#[tokio::test]
async fn group_without_loader_fails_loudly() {
    let fields = vec![FieldSpec::new("db").group("db-fields")];
    let (events, err, _) = run_scripted("", fields, InteractOptions::new(), &[]).await;
    match err {
        Some(InteractError::MissingGroupLoader { token }) => assert_eq!(token, "db-fields"),
        other => panic!("expected missing loader, got {other:?}"),
    }
    assert_eq!(tags(&events), vec!["enter"]);
}

#[tokio::test]
async fn loader_failure_aborts_the_run() {
    let loader = FnLoader(|token: &str| -> Result<Vec<FieldSpec>, LoaderError> {
        Err(format!("registry offline for {token}").into())
    });
    let fields = vec![FieldSpec::new("db").group("db-fields")];
    let options = InteractOptions::new().with_loader(loader);
    let (events, err, _) = run_scripted("", fields, options, &[]).await;
    let err = err.expect("loader error");
    assert!(matches!(err, InteractError::Loader { .. }));
    assert!(err.to_string().contains("db-fields"));
    assert!(events.iter().all(|event| !event.is_final()));
}

#[tokio::test]
async fn rejected_answer_reprompts_the_same_field() {
    let field = FieldSpec::new("name")
        .validation(Predicate::native(|answer| {
            answer.as_str().is_some_and(|text| text.len() >= 3)
        }))
        .msg("too short");
    let (events, err, transcript) =
        run_scripted("", vec![field], InteractOptions::new(), &["ab", "abc"]).await;
    assert!(err.is_none());
    assert_eq!(events, vec![
        input(&["name"], json!("abc")),
        Event::Final(interact::FinalEvent { success: true }),
    ]);
    assert_eq!(transcript.reads(), 2);
    assert!(transcript.output().contains("too short\n"));
}

#[tokio::test]
async fn rejected_select_starts_over() {
    let field = template_field()
        .validation(Predicate::native(|answer| answer["kind"] == "desktop"))
        .msg("pick desktop");
    let (events, _, transcript) =
        run_scripted("", vec![field], InteractOptions::new(), &["0", "1"]).await;
    assert_eq!(events[0].field().expect("select").name, "Desktop");
    assert_eq!(events[0].trail(), Some(&trail(&["template", "Desktop"])[..]));
    assert_eq!(transcript.output().matches("  0) Web").count(), 2);
}

struct CountingCompiler(Arc<AtomicUsize>);

impl PredicateCompiler for CountingCompiler {
    fn compile(&self, source: &str) -> Result<Arc<dyn Validator>, CompileError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        PatternCompiler.compile(source)
    }
}

#[tokio::test]
async fn source_predicate_compiles_once() {
    let compiled = Arc::new(AtomicUsize::new(0));
    let field = FieldSpec::new("answer")
        .validation(Predicate::source("^ok$"))
        .msg("say ok");
    let options = InteractOptions::new().with_compiler(CountingCompiler(compiled.clone()));
    let (events, err, _) = run_scripted("", vec![field], options, &["x", "y", "ok"]).await;
    assert!(err.is_none());
    assert_eq!(events[0], input(&["answer"], json!("ok")));
    assert_eq!(compiled.load(Ordering::SeqCst), 1);
}

/// Holds every verdict until the test releases it.
struct GatedValidator {
    verdicts: tokio::sync::Mutex<mpsc::UnboundedReceiver<bool>>,
    seen: Arc<std::sync::Mutex<Vec<Value>>>,
}

#[async_trait]
impl Validator for GatedValidator {
    async fn validate(&self, answer: &Value) -> bool {
        self.seen.lock().unwrap().push(answer.clone());
        self.verdicts.lock().await.recv().await.unwrap_or(false)
    }
}

#[tokio::test]
async fn async_validator_suspends_the_traversal() {
    let (release, verdicts) = mpsc::unbounded_channel();
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let field = FieldSpec::new("name")
        .prompt("Name")
        .validation(Predicate::from_validator(GatedValidator {
            verdicts: tokio::sync::Mutex::new(verdicts),
            seen: seen.clone(),
        }))
        .msg("not yet");
    let reader = ScriptedReader::new(["first", "second"]);
    let transcript = reader.transcript();
    let mut sink = Interact::with_reader("", field, InteractOptions::new(), reader)
        .run(RunOptions::interactive());

    let pending = tokio::time::timeout(Duration::from_millis(50), sink.next_event()).await;
    assert!(pending.is_err(), "event emitted before the validator resolved");
    assert_eq!(transcript.reads(), 1);

    release.send(false).unwrap();
    let pending = tokio::time::timeout(Duration::from_millis(50), sink.next_event()).await;
    assert!(pending.is_err(), "rejected answer produced an event");
    assert_eq!(transcript.reads(), 2);

    release.send(true).unwrap();
    let event = sink.next_event().await.expect("event").expect("ok");
    assert_eq!(event, input(&["name"], json!("second")));
    assert!(sink.next_event().await.expect("final").expect("ok").is_final());

    assert_eq!(*seen.lock().unwrap(), vec![json!("first"), json!("second")]);
    assert_eq!(transcript.output(), "Name: first\nnot yet\nName: second\n");
}

#[tokio::test]
async fn source_predicate_without_compiler_fails() {
    let field = FieldSpec::new("answer").validation(Predicate::source("^ok$"));
    let (_, err, _) = run_scripted("", vec![field], InteractOptions::new(), &["ok"]).await;
    assert!(matches!(
        err,
        Some(InteractError::MissingPredicateCompiler { .. })
    ));
}

#[tokio::test]
async fn interrupt_aborts_without_final() {
    let fields = vec![FieldSpec::new("first"), FieldSpec::new("second")];
    let (events, err, _) =
        run_scripted("", fields, InteractOptions::new(), &["one", INTERRUPT_LINE]).await;
    let err = err.expect("interrupt");
    assert!(err.is_interrupt());
    assert_eq!(err.exit_code(), 130);
    assert_eq!(tags(&events), vec!["input"]);
}

#[tokio::test]
async fn exhausted_input_reports_closed() {
    let (events, err, _) =
        run_scripted("", vec![FieldSpec::new("name")], InteractOptions::new(), &[]).await;
    assert!(matches!(err, Some(InteractError::InputClosed)));
    assert!(events.is_empty());
}

#[tokio::test]
async fn input_events_carry_shave_and_static_params() {
    let mut malformed = FieldSpec::new("token");
    malformed.shave = Some(json!([-1]));
    let fields = vec![
        FieldSpec::new("user")
            .params(json!({ "scope": "admin" }))
            .shave(vec![0, 2]),
        malformed,
    ];
    let (events, _, _) =
        run_scripted("", fields, InteractOptions::new(), &["root", "secret"]).await;
    let user = events[0].field().expect("user");
    assert_eq!(user.shave, Some(vec![0, 2]));
    assert_eq!(user.params, Some(json!({ "scope": "admin" })));
    assert_eq!(events[1].field().expect("token").shave, None);
}

#[tokio::test]
async fn control_sequences_are_stripped() {
    let (events, _, _) = run_scripted(
        "",
        vec![FieldSpec::new("color")],
        InteractOptions::new(),
        &["\u{1b}[31mred\u{1b}[0m"],
    )
    .await;
    assert_eq!(events[0], input(&["color"], json!("red")));
}

#[tokio::test]
async fn masked_session_echoes_stars() {
    let field = FieldSpec::new("password").prompt("Password");
    let options = InteractOptions::new().masked(true);
    let (events, _, transcript) = run_scripted("", vec![field], options, &["hunter2"]).await;
    assert_eq!(events[0], input(&["password"], json!("hunter2")));
    assert_eq!(transcript.output(), "Password: *******\n");
}

#[tokio::test]
async fn autosubmit_never_reads() {
    let reader = ScriptedReader::new(Vec::<String>::new());
    let transcript = reader.transcript();
    let fields = vec![
        FieldSpec::new("a").default_value(1),
        FieldSpec::new("b").default_value(2),
        FieldSpec::new("db").group("db-fields"),
    ];
    let options = InteractOptions::new().with_default("db", "sqlite");
    let mut seen = Vec::new();
    let completion = Interact::with_reader("Header", fields, options, reader)
        .run(RunOptions::autosubmit())
        .drain(|event| seen.push(event.tag()))
        .await
        .expect("autosubmit run");
    assert_eq!(seen, vec!["autosubmit", "final"]);

    let result = completion.autosubmit.expect("autosubmit result");
    assert_eq!(
        Value::Object(result.fields),
        json!({ "a": 1, "b": 2, "db": "sqlite" })
    );
    assert!(completion.last.success);
    assert_eq!(transcript.reads(), 0);
    assert_eq!(transcript.output(), "");
}

#[tokio::test]
async fn slow_consumer_throttles_the_traversal() {
    let fields: Vec<FieldSpec> = (0..5)
        .map(|index| FieldSpec::new(format!("f{index}")))
        .collect();
    let reader = ScriptedReader::new(["a", "b", "c", "d", "e"]);
    let transcript = reader.transcript();
    let mut sink = Interact::with_reader("", fields, InteractOptions::new(), reader)
        .run(RunOptions::interactive());

    let first = sink.next_event().await.expect("event").expect("ok");
    assert_eq!(first, input(&["f0"], json!("a")));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(transcript.reads() <= 3, "read ahead: {}", transcript.reads());

    let mut rest = Vec::new();
    while let Some(item) = sink.next_event().await {
        rest.push(item.expect("ok"));
    }
    assert_eq!(rest.len(), 5);
    assert!(rest[4].is_final());
    assert_eq!(transcript.reads(), 5);
}
