use super::*;

use forge::{PatchEvent, PushEvent};
use serde_json::{json, Value};

const RID: &str = "rad:z3gqcJUoA1n9HaHKufZs5FCSGazv5";
const HEAD: &str = "f2de534b5e81d7c6e2dcaf58c3dd91573c0a0354";

fn repository() -> Value {
    json!({
        "id": RID,
        "name": "heartwood",
        "description": "Radicle heartwood protocol",
        "default_branch": "master",
        "private": false,
        "url": "https://seed.example.com/nodes/seed.example.com/rad:z3gqcJUoA1n9HaHKufZs5FCSGazv5",
        "clone_url": "https://seed.example.com/z3gqcJUoA1n9HaHKufZs5FCSGazv5.git",
        "delegates": ["did:key:z6MkalIce"]
    })
}

fn push_body() -> Value {
    json!({
        "repository": repository(),
        "pusher": { "id": "did:key:z6MkalIce", "alias": "alice" },
        "branch": "refs/heads/master",
        "before": "0000000000000000000000000000000000000000",
        "after": HEAD,
        "commits": [
            { "id": "1111111111111111111111111111111111111111", "message": "older", "url": "" },
            { "id": HEAD, "message": "Fix the build", "url": "https://seed.example.com/commits/f2de" }
        ]
    })
}

fn patch_body() -> Value {
    json!({
        "action": "updated",
        "repository": repository(),
        "patch": {
            "id": "8c4b1b7a9d1c3e0f",
            "title": "Add CI",
            "author": { "id": "did:key:z6MkBob", "alias": "bob" },
            "url": "https://seed.example.com/patches/8c4b1b7a9d1c3e0f",
            "revisions": [
                { "id": "rev-1", "oid": "1111111111111111111111111111111111111111" },
                { "id": "rev-2", "oid": HEAD }
            ]
        }
    })
}

fn delivery(label: Option<&str>, body: &Value) -> HookDelivery {
    HookDelivery::new(
        label.map(str::to_string),
        None,
        serde_json::to_vec(body).unwrap(),
    )
}

fn push(outcome: DispatchOutcome) -> PushEvent {
    match outcome {
        DispatchOutcome::Event(CanonicalEvent::Push(event)) => event,
        other => panic!("expected push event, got {other:?}"),
    }
}

fn patch(outcome: DispatchOutcome) -> PatchEvent {
    match outcome {
        DispatchOutcome::Event(CanonicalEvent::Patch(event)) => event,
        other => panic!("expected patch event, got {other:?}"),
    }
}

#[test]
fn test_push_delivery_is_parsed() {
    let event = push(
        EventDispatcher::new()
            .dispatch(&delivery(Some("push"), &push_body()))
            .unwrap(),
    );

    assert_eq!(event.repository.id.as_str(), RID);
    assert_eq!(event.branch.as_str(), "master");
    assert_eq!(event.head_commit.as_str(), HEAD);
    assert_eq!(event.message, "Fix the build");
    assert_eq!(event.pusher, "alice");
    assert_eq!(event.repository.delegates.len(), 1);
}

#[test]
fn test_push_without_branch_uses_default_branch() {
    let mut body = push_body();
    body.as_object_mut().unwrap().remove("branch");

    let event = push(EventDispatcher::new().dispatch(&delivery(Some("push"), &body)).unwrap());
    assert_eq!(event.branch.as_str(), "master");
}

#[test]
fn test_push_head_not_listed_leaves_message_empty() {
    let mut body = push_body();
    body["commits"] = json!([]);
    body["pusher"] = json!({ "id": "did:key:z6MkalIce" });

    let event = push(EventDispatcher::new().dispatch(&delivery(Some("push"), &body)).unwrap());
    assert!(event.message.is_empty());
    assert_eq!(event.pusher, "did:key:z6MkalIce");
}

#[test]
fn test_patch_delivery_uses_latest_revision() {
    let event = patch(
        EventDispatcher::new()
            .dispatch(&delivery(Some("patch"), &patch_body()))
            .unwrap(),
    );

    assert_eq!(event.patch_id.as_str(), "8c4b1b7a9d1c3e0f");
    assert_eq!(event.revision_id.as_str(), "rev-2");
    assert_eq!(event.head_commit.as_str(), HEAD);
    assert_eq!(event.branch.as_str(), "master");
    assert_eq!(event.action, "updated");
    assert_eq!(event.author, "bob");
}

#[test]
fn test_patch_without_revisions_is_a_parse_error() {
    let mut body = patch_body();
    body["patch"]["revisions"] = json!([]);

    let err = EventDispatcher::new()
        .dispatch(&delivery(Some("patch"), &body))
        .unwrap_err();
    assert!(matches!(err, HookError::Parse { ref event, .. } if event == "patch"));
}

#[test]
fn test_empty_repository_id_is_a_parse_error() {
    let mut body = push_body();
    body["repository"]["id"] = json!("");

    let err = EventDispatcher::new()
        .dispatch(&delivery(Some("push"), &body))
        .unwrap_err();
    match err {
        HookError::Parse { event, message } => {
            assert_eq!(event, "push");
            assert!(message.contains("repository.id"), "{message}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_malformed_json_is_a_parse_error() {
    let delivery = HookDelivery::new(Some("push".into()), None, b"{not json".to_vec());
    let err = EventDispatcher::new().dispatch(&delivery).unwrap_err();
    assert!(matches!(err, HookError::Parse { .. }));
    assert!(!err.is_authentication());
}

#[test]
fn test_push_body_under_patch_label_is_a_parse_error() {
    let err = EventDispatcher::new()
        .dispatch(&delivery(Some("patch"), &push_body()))
        .unwrap_err();
    assert!(matches!(err, HookError::Parse { ref event, .. } if event == "patch"));
}

#[test]
fn test_unknown_label_is_ignored_without_reading_body() {
    let delivery = HookDelivery::new(Some("issue".into()), None, b"not json at all".to_vec());
    let outcome = EventDispatcher::new().dispatch(&delivery).unwrap();
    assert_eq!(
        outcome,
        DispatchOutcome::Ignored {
            event: "issue".into()
        }
    );
}

#[test]
fn test_missing_label_is_ignored() {
    let outcome = EventDispatcher::new()
        .dispatch(&delivery(None, &push_body()))
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Ignored { event: String::new() });
}
