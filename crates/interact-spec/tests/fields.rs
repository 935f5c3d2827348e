use interact_spec::{Event, FieldSpec, Params, Predicate, Validator, event_schema};
use serde_json::json;

#[test]
fn field_list_deserializes_every_shape() {
    let fields: Vec<FieldSpec> = serde_json::from_value(json!([
        { "name": "name", "prompt": "Project name", "default": "my-app", "hint": "lowercase" },
        { "name": "proceed", "boolean": true, "default": false },
        {
            "name": "template",
            "select": [
                { "prompt": "Web", "desc": "static site", "params": "web" },
                { "params": { "kind": "cli" } },
                { "name": "desktop", "params": { "kind": "desktop" } }
            ]
        },
        { "name": "db", "params": "db-fields" },
        { "name": "password", "validation": "^.{8,}$", "msg": "too short", "shave": [0] }
    ]))
    .expect("fields");

    assert_eq!(fields[0].hint.as_deref(), Some("lowercase"));
    assert!(fields[1].boolean);

    let options = fields[2].select.as_ref().expect("select");
    assert!(fields[2].is_select());
    assert_eq!(options[0].params, Some(Params::Group("web".into())));
    assert_eq!(options[1].label(1), "1");
    assert_eq!(options[2].label(2), "desktop");

    assert_eq!(fields[3].group_token(), Some("db-fields"));

    let validation = fields[4].validation.as_ref().expect("validation");
    assert_eq!(validation.as_source(), Some("^.{8,}$"));
    assert_eq!(fields[4].shave_indices(), Some(vec![0]));
}

#[tokio::test]
async fn native_predicates_run_async() {
    let Predicate::Native(check) = Predicate::native(|answer| answer == &json!("ok")) else {
        panic!("native predicate expected");
    };
    assert!(check.validate(&json!("ok")).await);
    assert!(!check.validate(&json!("no")).await);
}

#[test]
fn schema_lists_every_tag() {
    let schema = serde_json::to_string(&event_schema()).expect("schema");
    for tag in ["input", "confirm", "select", "enter", "exit", "autosubmit", "final"] {
        assert!(schema.contains(&format!("\"{tag}\"")), "missing {tag}");
    }
}

#[test]
fn select_events_round_trip_through_json() {
    let raw = json!({
        "tag": "select",
        "data": { "trail": ["template", "Web"], "name": "Web", "answer": "web" }
    });
    let event: Event = serde_json::from_value(raw.clone()).expect("event");
    assert_eq!(event.trail().map(<[String]>::len), Some(2));
    assert_eq!(serde_json::to_value(&event).expect("encode"), raw);
}
