use adapter_probe::config::{validate_context_path, ProbeConfig};
use adapter_probe::proto::{ApprovalPolicy, SandboxPolicy, WireApi};
use adapter_probe::session::ErrorFramePolicy;
use adapter_probe::stream::demux::ViolationPolicy;
use adapter_probe::AppError;

fn sample_toml() -> String {
    r#"
endpoint = "http://adapter.internal:50051"

[render]
suppress_log_patterns = ["sse_event"]

[policy]
on_protocol_violation = "abort"
on_error_frame = "continue"

[session]
model = "qwen-plus"
sandbox_policy = "workspace_write"
approval_policy = "never"
cwd = "/tmp/codex_test_wd"
base_instructions = "You are a careful assistant."

[session.provider]
name = "aliyun"
base_url = "https://dashscope.aliyuncs.com/compatible-mode/v1"
env_key = "DASH_API_KEY"
wire_api = "chat"
requires_openai_auth = false

[session.mcp_servers.bing-cn-mcp-server]
server_type = "streamable_http"
url = "https://mcp.example.net/mcp"

[[context_files]]
path = "notes/readme.md"
content = "remember number 888"

[env.DASH_API_KEY]
value = "sk-literal"
"#
    .to_owned()
}

#[test]
fn parses_valid_config() {
    let config = ProbeConfig::from_toml_str(&sample_toml()).expect("config parses");

    assert_eq!(config.endpoint, "http://adapter.internal:50051");
    assert_eq!(config.policy.on_protocol_violation, ViolationPolicy::Abort);
    assert_eq!(config.policy.on_error_frame, ErrorFramePolicy::Continue);
    assert_eq!(config.session.sandbox_policy, SandboxPolicy::WorkspaceWrite);
    assert_eq!(config.session.approval_policy, ApprovalPolicy::Never);
    assert_eq!(config.context_files.len(), 1);
    assert!(config.env.contains_key("DASH_API_KEY"));
}

#[test]
fn minimal_config_uses_defaults() {
    let config = ProbeConfig::from_toml_str("").expect("empty config is valid");

    assert_eq!(config.endpoint, "http://localhost:50051");
    assert_eq!(
        config.render.suppress_log_patterns,
        vec!["sse_event".to_owned(), "otel_manager".to_owned()]
    );
    assert_eq!(config.policy.on_protocol_violation, ViolationPolicy::Skip);
    assert_eq!(config.policy.on_error_frame, ErrorFramePolicy::FailClosed);
    assert_eq!(config.session.sandbox_policy, SandboxPolicy::Unspecified);
    assert!(config.context_files.is_empty());
}

#[test]
fn session_settings_become_wire_config() {
    let config = ProbeConfig::from_toml_str(&sample_toml()).unwrap();
    let wire = config.session.to_session_config();

    assert_eq!(wire.model, "qwen-plus");
    assert_eq!(wire.sandbox_policy, SandboxPolicy::WorkspaceWrite as i32);
    assert_eq!(wire.approval_policy, ApprovalPolicy::Never as i32);
    let provider = wire.provider.expect("provider forwarded");
    assert_eq!(provider.name, "aliyun");
    assert_eq!(provider.wire_api, WireApi::Chat as i32);
    assert_eq!(provider.env_key.as_deref(), Some("DASH_API_KEY"));
    assert!(provider.experimental_bearer_token.is_none());
    assert_eq!(
        wire.mcp_servers["bing-cn-mcp-server"].url,
        "https://mcp.example.net/mcp"
    );
    assert_eq!(
        wire.base_instructions.as_deref(),
        Some("You are a careful assistant.")
    );
}

#[test]
fn demux_options_follow_render_and_policy_sections() {
    let config = ProbeConfig::from_toml_str(&sample_toml()).unwrap();
    let options = config.demux_options();

    assert_eq!(options.on_violation, ViolationPolicy::Abort);
    assert!(options.filter.suppresses("sse_event ping"));
    assert!(!options.filter.suppresses("otel_manager flush"));
}

#[test]
fn request_template_reads_source_files() {
    let temp = tempfile::tempdir().expect("tempdir");
    let source = temp.path().join("plan.md");
    std::fs::write(&source, "step one").expect("write source");

    let toml = format!(
        r#"
[[context_files]]
path = "plan.md"
source = '{}'
"#,
        source.display()
    );
    let config = ProbeConfig::from_toml_str(&toml).expect("config parses");
    let template = config
        .request_template(std::collections::HashMap::new())
        .expect("template builds");

    assert_eq!(template.context_files.len(), 1);
    assert_eq!(template.context_files[0].path, "plan.md");
    assert_eq!(template.context_files[0].content, "step one");
}

#[test]
fn request_template_reports_missing_source() {
    let toml = r#"
[[context_files]]
path = "plan.md"
source = "/definitely/not/here/plan.md"
"#;
    let config = ProbeConfig::from_toml_str(toml).expect("config parses");
    let err = config
        .request_template(std::collections::HashMap::new())
        .expect_err("missing source must fail");
    assert!(matches!(err, AppError::Io(_)), "got: {err:?}");
}

#[test]
fn rejects_context_file_with_both_content_and_source() {
    let toml = r#"
[[context_files]]
path = "a.txt"
content = "x"
source = "/tmp/a.txt"
"#;
    let err = ProbeConfig::from_toml_str(toml).expect_err("must reject");
    assert!(err.to_string().contains("exactly one of content or source"));
}

#[test]
fn rejects_context_file_escaping_workspace() {
    let toml = r#"
[[context_files]]
path = "../outside.txt"
content = "x"
"#;
    let err = ProbeConfig::from_toml_str(toml).expect_err("must reject");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn context_path_validation() {
    assert!(validate_context_path("src/main.rs").is_ok());
    assert!(validate_context_path("./notes.md").is_ok());
    assert!(validate_context_path("").is_err());
    assert!(validate_context_path("/etc/passwd").is_err());
    assert!(validate_context_path("a/../../b").is_err());
    assert!(
        validate_context_path("notes..md").is_err(),
        "'..' inside a file name is skipped by the adapter"
    );
    assert!(validate_context_path("docs/v1..v2/readme.md").is_err());
}

#[test]
fn rejects_env_entry_without_any_source() {
    let toml = r"
[env.DASH_API_KEY]
";
    let err = ProbeConfig::from_toml_str(toml).expect_err("must reject");
    assert!(err.to_string().contains("DASH_API_KEY"));
}

#[test]
fn rejects_empty_endpoint() {
    let err = ProbeConfig::from_toml_str("endpoint = \"\"").expect_err("must reject");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn rejects_unknown_policy_value() {
    let toml = r#"
[policy]
on_protocol_violation = "explode"
"#;
    assert!(ProbeConfig::from_toml_str(toml).is_err());
}

#[test]
fn load_from_missing_path_is_config_error() {
    let err = ProbeConfig::load_from_path("/definitely/not/here.toml").expect_err("must fail");
    assert!(err.to_string().starts_with("config: failed to read config"));
}
