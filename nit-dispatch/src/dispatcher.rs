//! Script block dispatch against the live tool registry.

use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nit_config::NitSettings;
use nit_primitives::{NitId, final_path_component, normalize_key};
use nit_prompts::{CategoryFilter, describe_plugins};
use nit_script::{
    RuntimeError, RuntimeResult, ScopeLimits, ToolExecutor, execute_script, find_blocks,
};
use nit_security::{
    BlockVerdict, SecurityManager, SecurityResult, TagPolicy, ToolGate, verdict,
};
use nit_telemetry::InvocationRecord;
use nit_tools::{
    ExtraTools, Params, PluginCatalog, RegistrySnapshot, ToolError, ToolHandle, ToolRegistry,
    ToolResult, snapshot_from_catalog,
};
use serde_json::Value;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::observer::{DispatchObserver, TracingDispatchObserver};
use crate::record::{DispatchRecord, DispatchStatus, render_value};

/// Parameter names that may carry a command for a plugin-level call.
const ROUTING_KEYS: [&str; 4] = ["command", "commandidentifier", "action", "tool"];

/// Category assumed for tools whose plugin declares none.
const DEFAULT_CATEGORY: &str = "core";

/// Finds script blocks in model output and runs them against the registry.
///
/// The dispatcher owns the registry. [`Dispatcher::reload`] rebuilds it from
/// the catalog and swaps it in; a dispatch already running keeps the snapshot
/// it started with.
pub struct Dispatcher {
    registry: ToolRegistry,
    catalog: Arc<dyn PluginCatalog>,
    gate: Arc<ToolGate>,
    observer: Arc<dyn DispatchObserver>,
    limits: ScopeLimits,
    tag_policy: TagPolicy,
    security: SecurityManager,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry_entries", &self.registry.snapshot().len())
            .field("gate", &self.gate)
            .field("limits", &self.limits)
            .field("tag_policy", &self.tag_policy)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher and builds the first registry snapshot.
    #[must_use]
    pub fn new(catalog: Arc<dyn PluginCatalog>) -> Self {
        let registry = ToolRegistry::with_snapshot(snapshot_from_catalog(catalog.as_ref()));
        Self {
            registry,
            catalog,
            gate: Arc::new(ToolGate::new()),
            observer: Arc::new(TracingDispatchObserver),
            limits: ScopeLimits::default(),
            tag_policy: TagPolicy::default(),
            security: SecurityManager::default(),
        }
    }

    /// Creates a dispatcher configured from `settings`.
    #[must_use]
    pub fn from_settings(catalog: Arc<dyn PluginCatalog>, settings: &NitSettings) -> Self {
        Self::new(catalog)
            .with_gate(Arc::new(settings.tool_gate()))
            .with_limits(settings.scope_limits())
            .with_tag_policy(settings.security.tag_policy)
            .with_security(settings.security.manager())
    }

    /// Shares `gate` with this dispatcher.
    #[must_use]
    pub fn with_gate(mut self, gate: Arc<ToolGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Replaces the observer notified of invocations and block results.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Sets the scope bounds applied to each block.
    #[must_use]
    pub fn with_limits(mut self, limits: ScopeLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets how untagged blocks are treated while an id is expected.
    #[must_use]
    pub fn with_tag_policy(mut self, policy: TagPolicy) -> Self {
        self.tag_policy = policy;
        self
    }

    /// Replaces the handshake manager used by [`Dispatcher::turn_id`].
    #[must_use]
    pub fn with_security(mut self, security: SecurityManager) -> Self {
        self.security = security;
        self
    }

    /// Handshake manager for this deployment.
    #[must_use]
    pub fn security(&self) -> &SecurityManager {
        &self.security
    }

    /// Derives the NIT-ID the model must use for `turn_index` of `session_id`.
    ///
    /// # Errors
    ///
    /// Returns [`nit_security::SecurityError`] when the HMAC derivation fails.
    pub fn turn_id(&self, session_id: &str, turn_index: u64) -> SecurityResult<NitId> {
        self.security.generate_id(session_id, turn_index)
    }

    /// Gate consulted before each tool runs.
    #[must_use]
    pub fn gate(&self) -> &Arc<ToolGate> {
        &self.gate
    }

    /// Registry currently in use.
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Reloads the catalog and swaps in a fresh registry snapshot, returning
    /// the number of entries.
    ///
    /// # Errors
    ///
    /// Returns the catalog's error; the previous snapshot stays in place.
    pub fn reload(&self) -> ToolResult<usize> {
        self.catalog.reload()?;
        let snapshot = snapshot_from_catalog(self.catalog.as_ref());
        let entries = snapshot.len();
        let previous = self.registry.replace(snapshot);
        info!(entries, previous = previous.len(), "tool registry reloaded");
        Ok(entries)
    }

    /// Sorted registry keys.
    #[must_use]
    pub fn list_plugins(&self) -> Vec<String> {
        self.registry.snapshot().keys()
    }

    /// Markdown catalog of plugins matching `filter` that the gate permits.
    #[must_use]
    pub fn tools_description(&self, filter: CategoryFilter) -> String {
        let manifests = self.catalog.list_manifests();
        describe_plugins(manifests.iter().filter(|manifest| {
            filter.matches(manifest.category())
                && self.gate.permits(manifest.name(), manifest.category())
        }))
    }

    /// Runs every script block in `text`, in document order.
    ///
    /// Each block is checked against `expected_id` first. A refused block
    /// yields a [`DispatchStatus::Blocked`] record and runs nothing; a failing
    /// block yields [`DispatchStatus::Error`] and dispatch moves on to the
    /// next one. `extra` tools take precedence over the registry.
    pub async fn dispatch(
        &self,
        text: &str,
        extra: Option<&ExtraTools>,
        expected_id: Option<&NitId>,
    ) -> Vec<DispatchRecord> {
        let blocks = find_blocks(text);
        if blocks.is_empty() {
            return Vec::new();
        }

        let dispatch_id = Uuid::new_v4();
        let span = info_span!("nit_dispatch", %dispatch_id, blocks = blocks.len());
        async {
            info!("script blocks detected");
            let snapshot = self.registry.snapshot();
            let mut records = Vec::with_capacity(blocks.len());

            for block in &blocks {
                let record = match verdict(block.nit_id.as_deref(), expected_id, self.tag_policy) {
                    BlockVerdict::Block { reason } => DispatchRecord::new(
                        DispatchStatus::Blocked,
                        Value::String(reason),
                        &block.raw,
                    ),
                    BlockVerdict::Allow | BlockVerdict::Fallback => {
                        self.run_block(&snapshot, &block.body, &block.raw, extra).await
                    }
                };
                self.observer.on_block(&record);
                records.push(record);
            }
            records
        }
        .instrument(span)
        .await
    }

    async fn run_block(
        &self,
        snapshot: &RegistrySnapshot,
        body: &str,
        raw: &str,
        extra: Option<&ExtraTools>,
    ) -> DispatchRecord {
        let executor = BlockExecutor {
            dispatcher: self,
            snapshot,
            extra,
            executed: Mutex::new(Vec::new()),
        };
        let outcome = execute_script(body, &executor, self.limits).await;
        let executed = executor.into_executed();

        let record = match outcome {
            Ok(output) => DispatchRecord::new(DispatchStatus::Success, output, raw),
            Err(err) => {
                error!(error = %err, tools = ?executed, "script block failed");
                DispatchRecord::new(
                    DispatchStatus::Error,
                    Value::String(format!("script error: {err}")),
                    raw,
                )
            }
        };
        record.with_executed_tools(executed)
    }

    /// Resolves `name` and invokes it against the current registry.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] or [`ToolError::Category`] when the
    /// name does not resolve, [`ToolError::Disabled`] when the gate refuses
    /// the tool, or the tool's own error.
    pub async fn resolve_and_call(
        &self,
        name: &str,
        params: Params,
        extra: Option<&ExtraTools>,
    ) -> ToolResult<Value> {
        let snapshot = self.registry.snapshot();
        self.call_in(&snapshot, name, params, extra).await
    }

    async fn call_in(
        &self,
        snapshot: &RegistrySnapshot,
        name: &str,
        mut params: Params,
        extra: Option<&ExtraTools>,
    ) -> ToolResult<Value> {
        let name = match final_path_component(name) {
            Some(component) => {
                warn!(original = name, repaired = component, "path stripped from tool name");
                component
            }
            None => name,
        };

        let pending = InvocationRecord::begin(name, &Value::Object(params.clone()).to_string());
        info!(tool = name, params = pending.params_preview(), "tool call started");

        let result = match self.resolve(snapshot, name, &mut params, extra) {
            Ok(handle) => handle.invoke(params).await,
            Err(err) => Err(err),
        };

        let record = match &result {
            Ok(value) => {
                let record = pending.succeed(&render_value(value));
                info!(
                    tool = name,
                    duration_ms = record.duration_ms,
                    result = %record.result_preview,
                    "tool call finished"
                );
                record
            }
            Err(err) => {
                let record = pending.fail(err.to_string());
                error!(
                    tool = name,
                    duration_ms = record.duration_ms,
                    error = %err,
                    "tool call failed"
                );
                record
            }
        };
        self.observer.on_invocation(&record);
        result
    }

    fn resolve(
        &self,
        snapshot: &RegistrySnapshot,
        name: &str,
        params: &mut Params,
        extra: Option<&ExtraTools>,
    ) -> ToolResult<ToolHandle> {
        let normalized = normalize_key(name);

        let handle = extra
            .and_then(|tools| lookup_extra(tools, &normalized))
            .or_else(|| snapshot.get(&normalized).cloned())
            .or_else(|| auto_route(snapshot, name, params));

        let Some(handle) = handle else {
            if let Some(tools) = snapshot.category(&normalized) {
                return Err(ToolError::Category {
                    name: name.to_owned(),
                    tools: tools.to_vec(),
                });
            }
            return Err(ToolError::UnknownTool {
                name: name.to_owned(),
                normalized,
            });
        };

        if let Some(plugin) = handle.metadata().plugin() {
            let category = handle.metadata().category().unwrap_or(DEFAULT_CATEGORY);
            self.gate
                .check(plugin, category)
                .map_err(|denial| ToolError::Disabled {
                    reason: denial.to_string(),
                })?;
        }
        Ok(handle)
    }
}

fn lookup_extra(tools: &ExtraTools, normalized: &str) -> Option<ToolHandle> {
    tools
        .get(normalized)
        .or_else(|| {
            tools
                .iter()
                .find(|(key, _)| normalize_key(key) == normalized)
                .map(|(_, handle)| handle)
        })
        .cloned()
}

/// Treats `name` as a plugin and looks for a command among the routing
/// parameters, removing the parameter that matched.
fn auto_route(snapshot: &RegistrySnapshot, name: &str, params: &mut Params) -> Option<ToolHandle> {
    for routing_key in ROUTING_KEYS {
        let Some((param, command)) = params
            .iter()
            .find(|(key, _)| normalize_key(key) == routing_key)
            .and_then(|(key, value)| routing_command(value).map(|command| (key.clone(), command)))
        else {
            continue;
        };

        let candidates = [normalize_key(&format!("{name}.{command}")), normalize_key(&command)];
        for candidate in candidates {
            if let Some(handle) = snapshot.get(&candidate) {
                debug!(tool = name, %command, target = %candidate, "auto-routed call");
                params.remove(&param);
                return Some(handle.clone());
            }
        }
    }
    None
}

fn routing_command(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Runs one block's calls through the dispatcher, recording tool names.
struct BlockExecutor<'a> {
    dispatcher: &'a Dispatcher,
    snapshot: &'a RegistrySnapshot,
    extra: Option<&'a ExtraTools>,
    executed: Mutex<Vec<String>>,
}

impl BlockExecutor<'_> {
    fn into_executed(self) -> Vec<String> {
        self.executed
            .into_inner()
            .expect("executed tools poisoned")
    }
}

#[async_trait]
impl ToolExecutor for BlockExecutor<'_> {
    async fn execute(&self, name: &str, params: Params) -> RuntimeResult<Value> {
        self.executed
            .lock()
            .expect("executed tools poisoned")
            .push(name.to_owned());
        self.dispatcher
            .call_in(self.snapshot, name, params, self.extra)
            .await
            .map_err(|err| RuntimeError::tool(name, err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use nit_primitives::{CommandDefinition, PluginManifest};
    use nit_tools::{StaticCatalog, ToolMetadata, bridge_aliases};
    use serde_json::json;

    use super::*;
    use crate::observer::CollectingObserver;

    fn meta(name: &str) -> ToolMetadata {
        ToolMetadata::new(name).unwrap()
    }

    fn catalog(calls: Arc<AtomicUsize>) -> StaticCatalog {
        StaticCatalog::new()
            .with_tool(meta("echo"), move |params: Params| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(params.get("text").cloned().unwrap_or(Value::Null))
                }
            })
            .with_tool(meta("Files.list"), |params: Params| async move {
                Ok(json!({ "listed": true, "params": params }))
            })
            .with_tool(meta("explode"), |_params: Params| async move {
                Err(ToolError::execution("boom"))
            })
            .with_blocking_tool(meta("read_file"), |params| {
                let path = params.get("path").and_then(Value::as_str).unwrap_or("?");
                Ok(json!(format!("read {path}")))
            })
            .with_manifest(
                PluginManifest::builder("FileOps")
                    .category("work")
                    .description("File access")
                    .command(
                        CommandDefinition::new("read_file", "Read a file")
                            .unwrap()
                            .with_input_schema(json!({
                                "properties": { "path": { "type": "string" } }
                            })),
                    )
                    .build()
                    .unwrap(),
            )
    }

    fn dispatcher() -> (Dispatcher, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Dispatcher::new(Arc::new(catalog(Arc::clone(&calls)))), calls)
    }

    fn id(value: &str) -> NitId {
        NitId::new(value).unwrap()
    }

    #[tokio::test]
    async fn matching_id_runs_the_block() {
        let (dispatcher, calls) = dispatcher();
        let records = dispatcher
            .dispatch("ok <nit-A9B2>echo(text=\"hi\")</nit-A9B2>", None, Some(&id("A9B2")))
            .await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, DispatchStatus::Success);
        assert_eq!(records[0].output, json!("hi"));
        assert_eq!(records[0].executed_tools, vec!["echo"]);
        assert_eq!(records[0].raw_block, "<nit-A9B2>echo(text=\"hi\")</nit-A9B2>");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mismatched_id_is_blocked_without_running() {
        let (dispatcher, calls) = dispatcher();
        let records = dispatcher
            .dispatch("<nit-9999>echo(text=\"hi\")</nit-9999>", None, Some(&id("A9B2")))
            .await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, DispatchStatus::Blocked);
        assert!(records[0].output_text().contains("expected A9B2, got 9999"));
        assert!(records[0].executed_tools.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn configured_salt_keys_the_turn_id() {
        let mut settings = NitSettings::default();
        settings.security.system_salt = Some("deployment-7".into());
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::from_settings(Arc::new(catalog(calls)), &settings);

        let turn = dispatcher.turn_id("session-1", 4).unwrap();
        let salted = SecurityManager::new("deployment-7");
        assert_eq!(turn, salted.generate_id("session-1", 4).unwrap());
        assert_eq!(
            dispatcher.security().derive_session_secret("session-1").unwrap(),
            salted.derive_session_secret("session-1").unwrap(),
        );

        let text = format!("{}echo(text=\"hi\"){}", turn.open_tag(), turn.close_tag());
        let records = dispatcher.dispatch(&text, None, Some(&turn)).await;
        assert_eq!(records[0].status, DispatchStatus::Success);
    }

    #[tokio::test]
    async fn untagged_block_follows_the_tag_policy() {
        let (dispatcher, _) = dispatcher();
        let text = "<nit>echo(text=\"x\")</nit>";

        let fallback = dispatcher.dispatch(text, None, Some(&id("A9B2"))).await;
        assert!(fallback[0].is_success());

        let strict = dispatcher.with_tag_policy(TagPolicy::Strict);
        let refused = strict.dispatch(text, None, Some(&id("A9B2"))).await;
        assert_eq!(refused[0].status, DispatchStatus::Blocked);
    }

    #[tokio::test]
    async fn failures_keep_partial_tools_and_later_blocks_still_run() {
        let (dispatcher, _) = dispatcher();
        let text = "<nit>$a = echo(text=\"1\")\nexplode()\necho(text=\"never\")</nit> then <nit>echo(text=\"2\")</nit>";
        let records = dispatcher.dispatch(text, None, None).await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, DispatchStatus::Error);
        assert_eq!(records[0].executed_tools, vec!["echo", "explode"]);
        assert!(records[0].output_text().contains("boom"));
        assert_eq!(records[1].output, json!("2"));
    }

    #[tokio::test]
    async fn syntax_errors_become_error_records() {
        let (dispatcher, _) = dispatcher();
        let records = dispatcher.dispatch("<nit>echo(text=</nit>", None, None).await;
        assert_eq!(records[0].status, DispatchStatus::Error);
        assert!(records[0].executed_tools.is_empty());
    }

    #[tokio::test]
    async fn auto_routes_plugin_calls_through_command_parameter() {
        let (dispatcher, _) = dispatcher();
        let mut params = Params::new();
        params.insert("Command".into(), json!("list"));
        params.insert("path".into(), json!("/tmp"));

        let output = dispatcher.resolve_and_call("Files", params, None).await.unwrap();
        assert_eq!(output, json!({ "listed": true, "params": { "path": "/tmp" } }));
    }

    #[tokio::test]
    async fn path_like_names_are_repaired() {
        let (dispatcher, calls) = dispatcher();
        let mut params = Params::new();
        params.insert("text".into(), json!("ok"));
        let output = dispatcher
            .resolve_and_call(r"backend\nit_core\tools\echo", params, None)
            .await
            .unwrap();
        assert_eq!(output, json!("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn plugin_names_get_a_category_hint() {
        let (dispatcher, _) = dispatcher();
        let err = dispatcher
            .resolve_and_call("FileOps", Params::new(), None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::Category {
                name: "FileOps".into(),
                tools: vec!["read_file".into()],
            }
        );

        let missing = dispatcher.resolve_and_call("nope", Params::new(), None).await;
        assert!(matches!(missing, Err(ToolError::UnknownTool { .. })));
    }

    #[tokio::test]
    async fn gate_disables_plugin_tools_only() {
        let (dispatcher, _) = dispatcher();
        dispatcher.gate().set_category("work", false);

        let err = dispatcher
            .resolve_and_call("FileOps.read_file", Params::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Disabled { .. }));

        let mut params = Params::new();
        params.insert("text".into(), json!("free"));
        assert!(dispatcher.resolve_and_call("echo", params, None).await.is_ok());
    }

    #[tokio::test]
    async fn extra_tools_take_precedence() {
        let (dispatcher, calls) = dispatcher();
        let bridged = ToolHandle::new(meta("echo"), |_params: Params| async move {
            Ok(json!("bridged"))
        });
        let extra = bridge_aliases("echo", &bridged);

        let records = dispatcher
            .dispatch("<nit>$a = echo()\nmcp_echo()</nit>", Some(&extra), None)
            .await;
        assert_eq!(records[0].output, json!("bridged"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn observer_sees_invocations_and_blocks() {
        let (dispatcher, _) = dispatcher();
        let observer = Arc::new(CollectingObserver::new());
        let dispatcher = dispatcher.with_observer(observer.clone());

        dispatcher
            .dispatch("<nit>read_file(path=\"a.txt\")\nghost()</nit>", None, None)
            .await;

        let invocations = observer.invocations();
        assert_eq!(invocations.len(), 2);
        assert!(invocations[0].is_success());
        assert_eq!(invocations[0].result_preview, "read a.txt");
        assert!(!invocations[1].is_success());
        assert_eq!(observer.blocks().len(), 1);
    }

    #[tokio::test]
    async fn reload_publishes_catalog_changes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let catalog = Arc::new(catalog(calls));
        let dispatcher = Dispatcher::new(catalog.clone());
        assert!(dispatcher.list_plugins().contains(&"explode".to_owned()));

        assert!(catalog.remove("explode"));
        assert!(dispatcher.list_plugins().contains(&"explode".to_owned()));
        dispatcher.reload().unwrap();
        assert!(!dispatcher.list_plugins().contains(&"explode".to_owned()));
    }

    #[test]
    fn description_respects_filter_and_gate() {
        let (dispatcher, _) = dispatcher();
        assert!(dispatcher.tools_description(CategoryFilter::Core).is_empty());

        let work = dispatcher.tools_description(CategoryFilter::Work);
        assert!(work.contains("### FileOps"));
        assert!(work.contains("`read_file`: Read a file (Args: path)"));

        dispatcher.gate().set_lightweight(true);
        assert!(dispatcher.tools_description(CategoryFilter::All).is_empty());
    }
}
