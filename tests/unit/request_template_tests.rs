use std::collections::HashMap;

use adapter_probe::proto::{ContextFile, SessionConfig};
use adapter_probe::session::request::{new_request_id, new_session_id};
use adapter_probe::session::RequestTemplate;
use bytes::Bytes;

fn template() -> RequestTemplate {
    RequestTemplate {
        session_config: Some(SessionConfig {
            model: "qwen-plus".into(),
            ..SessionConfig::default()
        }),
        env_vars: HashMap::from([("DASH_API_KEY".to_owned(), "sk-test".to_owned())]),
        base_dir: "/srv/work".into(),
        context_files: vec![ContextFile {
            path: "notes.md".into(),
            content: "remember".into(),
        }],
    }
}

#[test]
fn run_request_forwards_payload_untouched() {
    let template = template();
    let request = template.run_request("req-1", "hello");

    assert_eq!(request.request_id, "req-1");
    assert_eq!(request.prompt, "hello");
    assert_eq!(request.session_config, template.session_config);
    assert_eq!(request.env_vars, template.env_vars);
    assert_eq!(request.base_dir, "/srv/work");
    assert_eq!(request.context_files, template.context_files);
}

#[test]
fn task_request_carries_session_and_rollout() {
    let template = template();
    let rollout = Bytes::from_static(b"\x01\x02");
    let request = template.task_request("req-2", "sess-1", "again", Some(rollout.clone()));

    assert_eq!(request.session_id, "sess-1");
    assert_eq!(request.prompt, "again");
    assert_eq!(request.history_rollout, Some(rollout));
    assert_eq!(request.session_config, template.session_config);
}

#[test]
fn task_request_without_rollout_has_no_history() {
    let request = template().task_request("req-3", "sess-1", "first", None);
    assert!(request.history_rollout.is_none());
}

#[test]
fn generated_ids_are_unique() {
    assert_ne!(new_request_id(), new_request_id());
    assert_ne!(new_session_id(), new_session_id());
    assert!(new_request_id().starts_with("probe-"));
}
