//! Probe configuration parsing, validation, and secret resolution.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::proto::{
    ApprovalPolicy, ContextFile, McpServerDef, ModelProviderInfo, SandboxPolicy, SessionConfig,
    WireApi,
};
use crate::session::{ErrorFramePolicy, RequestTemplate};
use crate::stream::demux::{DemuxOptions, ViolationPolicy};
use crate::stream::filter::{LogFilter, DEFAULT_SUPPRESSED_PATTERNS};
use crate::{AppError, Result};

/// Keychain service name under which provider secrets are looked up.
pub const KEYRING_SERVICE: &str = "adapter-probe";

fn default_endpoint() -> String {
    "http://localhost:50051".into()
}

fn default_suppressed_patterns() -> Vec<String> {
    DEFAULT_SUPPRESSED_PATTERNS
        .iter()
        .map(|p| (*p).to_owned())
        .collect()
}

/// Output settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RenderConfig {
    /// Adapter log lines containing any of these substrings are hidden.
    #[serde(default = "default_suppressed_patterns")]
    pub suppress_log_patterns: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            suppress_log_patterns: default_suppressed_patterns(),
        }
    }
}

/// Stream and session failure policies.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PolicyConfig {
    /// Handling of frames with zero or several populated variants.
    #[serde(default)]
    pub on_protocol_violation: ViolationPolicy,
    /// Whether a turn with error frames may feed the next turn.
    #[serde(default)]
    pub on_error_frame: ErrorFramePolicy,
}

/// Model provider settings forwarded inside the session configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ProviderSettings {
    /// Provider identifier.
    pub name: String,
    /// Provider API base URL.
    pub base_url: Option<String>,
    /// Name of the `[env]` entry holding the API key.
    pub env_key: Option<String>,
    /// Provider wire protocol.
    #[serde(default = "default_wire_api")]
    pub wire_api: WireApi,
    /// Whether the provider expects OpenAI account auth.
    #[serde(default)]
    pub requires_openai_auth: bool,
}

fn default_wire_api() -> WireApi {
    WireApi::Chat
}

/// MCP server entry forwarded inside the session configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct McpServerSettings {
    /// Transport kind, e.g. `stdio` or `streamable_http`.
    #[serde(default)]
    pub server_type: String,
    /// Command line for stdio servers.
    #[serde(default)]
    pub command: String,
    /// Endpoint for HTTP servers.
    #[serde(default)]
    pub url: String,
}

/// Session configuration sent with every request.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SessionSettings {
    /// Model name.
    #[serde(default)]
    pub model: String,
    /// Provider settings.
    pub provider: Option<ProviderSettings>,
    /// Sandbox policy.
    #[serde(default = "default_sandbox_policy")]
    pub sandbox_policy: SandboxPolicy,
    /// Approval policy.
    #[serde(default = "default_approval_policy")]
    pub approval_policy: ApprovalPolicy,
    /// Agent working directory on the adapter host.
    #[serde(default)]
    pub cwd: String,
    /// Adapter-side base directory; empty for a scratch workspace.
    #[serde(default)]
    pub base_dir: String,
    /// System-level instructions.
    pub base_instructions: Option<String>,
    /// Developer instructions.
    pub developer_instructions: Option<String>,
    /// User instructions.
    pub user_instructions: Option<String>,
    /// Named MCP servers.
    #[serde(default)]
    pub mcp_servers: HashMap<String, McpServerSettings>,
}

fn default_sandbox_policy() -> SandboxPolicy {
    SandboxPolicy::Unspecified
}

fn default_approval_policy() -> ApprovalPolicy {
    ApprovalPolicy::Unspecified
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            model: String::new(),
            provider: None,
            sandbox_policy: default_sandbox_policy(),
            approval_policy: default_approval_policy(),
            cwd: String::new(),
            base_dir: String::new(),
            base_instructions: None,
            developer_instructions: None,
            user_instructions: None,
            mcp_servers: HashMap::new(),
        }
    }
}

impl SessionSettings {
    /// Build the wire-level session configuration.
    #[must_use]
    pub fn to_session_config(&self) -> SessionConfig {
        let provider = self.provider.as_ref().map(|p| ModelProviderInfo {
            name: p.name.clone(),
            base_url: p.base_url.clone(),
            env_key: p.env_key.clone(),
            wire_api: p.wire_api as i32,
            requires_openai_auth: p.requires_openai_auth,
            experimental_bearer_token: None,
        });

        SessionConfig {
            model: self.model.clone(),
            provider,
            sandbox_policy: self.sandbox_policy as i32,
            approval_policy: self.approval_policy as i32,
            cwd: self.cwd.clone(),
            mcp_servers: self
                .mcp_servers
                .iter()
                .map(|(name, def)| {
                    (
                        name.clone(),
                        McpServerDef {
                            server_type: def.server_type.clone(),
                            command: def.command.clone(),
                            url: def.url.clone(),
                        },
                    )
                })
                .collect(),
            base_instructions: self.base_instructions.clone(),
            developer_instructions: self.developer_instructions.clone(),
            user_instructions: self.user_instructions.clone(),
        }
    }
}

/// File injected into the agent workspace.
///
/// Exactly one of `content` (inline) or `source` (local file read at startup)
/// must be set.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ContextFileSettings {
    /// Workspace-relative destination path.
    pub path: String,
    /// Inline file contents.
    pub content: Option<String>,
    /// Local file whose contents are sent.
    pub source: Option<PathBuf>,
}

/// Where the value of one forwarded environment variable comes from.
///
/// Resolution order: literal `value`, then OS keychain entry `keyring`
/// (service [`KEYRING_SERVICE`]), then process environment variable `env`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct EnvSource {
    /// Literal value.
    pub value: Option<String>,
    /// Keychain account name.
    pub keyring: Option<String>,
    /// Process environment variable name.
    pub env: Option<String>,
}

/// Probe configuration parsed from a TOML file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ProbeConfig {
    /// Adapter gRPC endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Output settings.
    #[serde(default)]
    pub render: RenderConfig,
    /// Failure policies.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Session configuration forwarded with each request.
    #[serde(default)]
    pub session: SessionSettings,
    /// Files injected into the agent workspace.
    #[serde(default)]
    pub context_files: Vec<ContextFileSettings>,
    /// Environment forwarded to the agent, keyed by variable name.
    #[serde(default)]
    pub env: HashMap<String, EnvSource>,
}

impl ProbeConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Demultiplexer settings derived from `[render]` and `[policy]`.
    #[must_use]
    pub fn demux_options(&self) -> DemuxOptions {
        DemuxOptions {
            filter: LogFilter::new(self.render.suppress_log_patterns.iter().cloned()),
            on_violation: self.policy.on_protocol_violation,
        }
    }

    /// Resolve every `[env]` entry to its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the first variable that no source
    /// could provide.
    pub async fn resolve_env_vars(&self) -> Result<HashMap<String, String>> {
        let mut resolved = HashMap::with_capacity(self.env.len());
        for (name, source) in &self.env {
            let value = resolve_env_source(name, source).await?;
            resolved.insert(name.clone(), value);
        }
        Ok(resolved)
    }

    /// Build the pass-through request template.
    ///
    /// Reads `source` context files from disk.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if a context file source cannot be read.
    pub fn request_template(&self, env_vars: HashMap<String, String>) -> Result<RequestTemplate> {
        let context_files = self
            .context_files
            .iter()
            .map(load_context_file)
            .collect::<Result<Vec<_>>>()?;

        Ok(RequestTemplate {
            session_config: Some(self.session.to_session_config()),
            env_vars,
            base_dir: self.session.base_dir.clone(),
            context_files,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(AppError::Config("endpoint must not be empty".into()));
        }

        for file in &self.context_files {
            validate_context_path(&file.path)?;
            if file.content.is_some() == file.source.is_some() {
                return Err(AppError::Config(format!(
                    "context file {} must set exactly one of content or source",
                    file.path
                )));
            }
        }

        for (name, source) in &self.env {
            if source.value.is_none() && source.keyring.is_none() && source.env.is_none() {
                return Err(AppError::Config(format!(
                    "env entry {name} has no value, keyring, or env source"
                )));
            }
        }

        if let Some(key) = self
            .session
            .provider
            .as_ref()
            .and_then(|p| p.env_key.as_ref())
        {
            if !self.env.contains_key(key) {
                warn!(
                    env_key = key.as_str(),
                    "provider env_key has no matching [env] entry; the adapter will not receive an API key"
                );
            }
        }

        Ok(())
    }
}

/// Check that a context file destination stays inside the agent workspace.
///
/// # Errors
///
/// Returns `AppError::Config` if `path` is empty, absolute, or contains
/// `..` anywhere.
pub fn validate_context_path(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(AppError::Config("context file path must not be empty".into()));
    }

    // The adapter skips any path containing `..`, not only `..` segments.
    if path.contains("..") {
        return Err(AppError::Config(format!(
            "context file path {path} must not contain '..'"
        )));
    }

    for component in Path::new(path).components() {
        match component {
            Component::RootDir | Component::Prefix(_) | Component::ParentDir => {
                return Err(AppError::Config(format!(
                    "context file path {path} must be relative"
                )));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }

    // `components()` treats a leading `/` as RootDir on every platform, but a
    // Windows-style drive path only parses as a prefix on Windows.
    if path.starts_with('/') || path.starts_with('\\') {
        return Err(AppError::Config(format!(
            "context file path {path} must be relative"
        )));
    }

    Ok(())
}

fn load_context_file(settings: &ContextFileSettings) -> Result<ContextFile> {
    let content = match (&settings.content, &settings.source) {
        (Some(inline), _) => inline.clone(),
        (None, Some(source)) => fs::read_to_string(source).map_err(|err| {
            AppError::Io(format!(
                "cannot read context file source {}: {err}",
                source.display()
            ))
        })?,
        (None, None) => String::new(),
    };

    Ok(ContextFile {
        path: settings.path.clone(),
        content,
    })
}

/// Resolve one environment source: literal, then keychain, then env var.
async fn resolve_env_source(name: &str, source: &EnvSource) -> Result<String> {
    if let Some(value) = &source.value {
        return Ok(value.clone());
    }

    if let Some(account) = &source.keyring {
        let key = account.clone();

        // keyring is synchronous I/O.
        let keychain_result = tokio::task::spawn_blocking(move || {
            keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
        })
        .await
        .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

        match keychain_result {
            Ok(value) if !value.is_empty() => return Ok(value),
            Ok(_) => {
                warn!(
                    name,
                    key = account.as_str(),
                    "keychain entry is empty, trying env var"
                );
            }
            Err(err) => {
                warn!(
                    name,
                    key = account.as_str(),
                    ?err,
                    "keychain lookup failed, trying env var"
                );
            }
        }
    }

    if let Some(var) = &source.env {
        match env::var(var) {
            Ok(value) if !value.is_empty() => return Ok(value),
            Ok(_) => warn!(name, var = var.as_str(), "env var is empty"),
            Err(_) => {}
        }
    }

    Err(AppError::Config(format!(
        "env entry {name} not found in keychain or environment"
    )))
}
