use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::{StreamExt, stream};
use nit_engine::config::NitSettings;
use nit_engine::dispatch::{CollectingObserver, DispatchStatus, Dispatcher};
use nit_engine::primitives::{CommandDefinition, NitId, PluginManifest};
use nit_engine::prompts::{CategoryFilter, NitPromptBuilder};
use nit_engine::security::{SecurityManager, TagPolicy, handshake_prompt};
use nit_engine::stream::{NitStreamFilter, StreamFilter, XmlStreamFilter, strip_blocks};
use nit_engine::tools::{Params, StaticCatalog, ToolError, ToolMetadata};
use serde_json::{Value, json};

fn meta(name: &str) -> ToolMetadata {
    ToolMetadata::new(name).unwrap()
}

fn catalog(echo_calls: Arc<AtomicUsize>) -> StaticCatalog {
    StaticCatalog::new()
        .with_tool(meta("echo"), move |params: Params| {
            let calls = Arc::clone(&echo_calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(params.get("text").cloned().unwrap_or(Value::Null))
            }
        })
        .with_tool(meta("search"), |params: Params| async move {
            Ok(json!({ "query": params.get("query"), "limit": params.get("limit") }))
        })
        .with_blocking_tool(meta("Files.list"), |_params| Ok(json!(["a.txt", "b.txt"])))
        .with_blocking_tool(meta("take_screenshot"), |_params| Ok(json!("captured")))
        .with_manifest(
            PluginManifest::builder("WebSearch")
                .category("plugins")
                .description("Search the web")
                .command(
                    CommandDefinition::new("search", "Search for pages")
                        .unwrap()
                        .with_input_schema(json!({
                            "type": "object",
                            "properties": {
                                "query": { "type": "string" },
                                "limit": { "type": "integer" }
                            }
                        })),
                )
                .build()
                .unwrap(),
        )
        .with_manifest(
            PluginManifest::builder("ScreenVision")
                .category("core")
                .command(CommandDefinition::new("take_screenshot", "Capture the screen").unwrap())
                .build()
                .unwrap(),
        )
}

fn dispatcher() -> (Dispatcher, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let dispatcher = Dispatcher::new(Arc::new(catalog(Arc::clone(&calls))));
    (dispatcher, calls)
}

#[tokio::test]
async fn handshake_id_authorizes_the_turn() {
    let (dispatcher, calls) = dispatcher();
    let id = SecurityManager::default().generate_id("session-42", 7).unwrap();
    let text = format!("Sure. {}echo(text=\"hi\"){}", id.open_tag(), id.close_tag());

    let records = dispatcher.dispatch(&text, None, Some(&id)).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, DispatchStatus::Success);
    assert!(records[0].output_text().contains("hi"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn foreign_id_is_blocked_and_nothing_runs() {
    let (dispatcher, calls) = dispatcher();
    let expected = NitId::new("A9B2").unwrap();

    let records = dispatcher
        .dispatch("<nit-9999>echo(text=\"hi\")</nit-9999>", None, Some(&expected))
        .await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, DispatchStatus::Blocked);
    assert!(records[0].executed_tools.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn plugin_call_routes_through_command() {
    let (dispatcher, _) = dispatcher();
    let records = dispatcher
        .dispatch("<nit>$files = Files(command=\"list\")</nit>", None, None)
        .await;

    assert_eq!(records[0].status, DispatchStatus::Success);
    assert_eq!(records[0].output, json!(["a.txt", "b.txt"]));
    assert_eq!(records[0].executed_tools, vec!["Files"]);
}

#[tokio::test]
async fn string_arguments_are_coerced_to_the_schema() {
    let (dispatcher, _) = dispatcher();
    let records = dispatcher
        .dispatch("<nit>search(Query=\"cats\", limit=\"3.0\")</nit>", None, None)
        .await;

    assert_eq!(records[0].output, json!({ "query": "cats", "limit": 3 }));
}

#[tokio::test]
async fn variables_flow_between_statements() {
    let (dispatcher, _) = dispatcher();
    let script = "<nit>\n# fetch then echo\n$r = search(query=\"dogs\", limit=2)\necho(text=$r)\n</nit>";
    let records = dispatcher.dispatch(script, None, None).await;

    assert_eq!(records[0].output, json!({ "query": "dogs", "limit": 2 }));
    assert_eq!(records[0].executed_tools, vec!["search", "echo"]);
}

#[tokio::test]
async fn plugin_name_as_tool_lists_its_commands() {
    let (dispatcher, _) = dispatcher();
    let err = dispatcher
        .resolve_and_call("WebSearch", Params::new(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::Category { .. }));
    assert!(err.to_string().contains("try one of: search"));
}

#[tokio::test]
async fn settings_configure_gate_and_policy() {
    let mut settings = NitSettings::default();
    settings.lightweight_mode = true;
    settings.security.tag_policy = TagPolicy::Strict;
    let dispatcher = Dispatcher::from_settings(
        Arc::new(catalog(Arc::new(AtomicUsize::new(0)))),
        &settings,
    );
    let observer = Arc::new(CollectingObserver::new());
    let dispatcher = dispatcher.with_observer(observer.clone());

    let records = dispatcher
        .dispatch(
            "<nit>take_screenshot()</nit><nit>search(query=\"x\")</nit>",
            None,
            None,
        )
        .await;
    assert_eq!(records[0].status, DispatchStatus::Success);
    assert_eq!(records[1].status, DispatchStatus::Error);
    assert!(records[1].output_text().contains("lightweight"));
    assert_eq!(observer.blocks().len(), 2);

    let expected = NitId::new("BEEF").unwrap();
    let refused = dispatcher
        .dispatch("<nit>take_screenshot()</nit>", None, Some(&expected))
        .await;
    assert_eq!(refused[0].status, DispatchStatus::Blocked);
}

#[tokio::test]
async fn settings_salt_drives_the_turn_handshake() {
    let settings =
        NitSettings::from_json(r#"{ "security": { "system_salt": "site-salt" } }"#).unwrap();
    let dispatcher = Dispatcher::from_settings(
        Arc::new(catalog(Arc::new(AtomicUsize::new(0)))),
        &settings,
    );

    let id = dispatcher.turn_id("session-9", 2).unwrap();
    assert_eq!(id, SecurityManager::new("site-salt").generate_id("session-9", 2).unwrap());

    let text = format!("{}echo(text=\"salted\"){}", id.open_tag(), id.close_tag());
    let records = dispatcher.dispatch(&text, None, Some(&id)).await;
    assert_eq!(records[0].output, json!("salted"));
}

#[tokio::test]
async fn reload_picks_up_new_tools() {
    let catalog = Arc::new(catalog(Arc::new(AtomicUsize::new(0))));
    let dispatcher = Dispatcher::new(catalog.clone());

    let before = dispatcher.dispatch("<nit>late()</nit>", None, None).await;
    assert_eq!(before[0].status, DispatchStatus::Error);

    catalog.insert(nit_engine::tools::ToolHandle::new(
        meta("late"),
        |_params: Params| async move { Ok(json!("arrived")) },
    ));
    dispatcher.reload().unwrap();

    let after = dispatcher.dispatch("<nit>late()</nit>", None, None).await;
    assert_eq!(after[0].output, json!("arrived"));
}

#[test]
fn system_prompt_carries_tag_and_visible_catalog() {
    let (dispatcher, _) = dispatcher();
    let id = NitId::new("C0DE").unwrap();

    let prompt = NitPromptBuilder::new(dispatcher.tools_description(CategoryFilter::All))
        .with_handshake(id.clone(), handshake_prompt(&id, TagPolicy::AllowFallback))
        .build()
        .unwrap();

    assert!(prompt.contains("<nit-C0DE>"));
    assert!(prompt.contains("### WebSearch"));
    assert!(prompt.contains("`search`: Search for pages (Args: limit, query)"));
    assert!(prompt.contains("[NIT SECURITY PROTOCOL]"));
}

#[tokio::test]
async fn streamed_reply_hides_script_and_dispatches_it() {
    let (dispatcher, _) = dispatcher();
    let id = NitId::new("1A2B").unwrap();
    let reply = format!(
        "Let me check. {}$r = search(query=\"cats\", limit=\"3\")\necho(text=$r){}<PEROCUE>{{\"mood\":\"happy\"}}</PEROCUE> Done!",
        id.open_tag(),
        id.close_tag(),
    );
    let chunks: Vec<String> = reply
        .chars()
        .collect::<Vec<_>>()
        .chunks(5)
        .map(|chunk| chunk.iter().collect())
        .collect();

    let mut nit = NitStreamFilter::new();
    let mut xml = XmlStreamFilter::default();
    let mut visible: String = stream::iter(chunks)
        .map(|chunk| xml.filter(&nit.filter(&chunk)))
        .collect::<Vec<_>>()
        .await
        .concat();
    visible.push_str(&xml.filter(&nit.flush()));
    visible.push_str(&xml.flush());

    assert_eq!(visible, "Let me check.  Done!");
    assert!(!visible.contains("search"));

    let records = dispatcher.dispatch(&reply, None, Some(&id)).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].output, json!({ "query": "cats", "limit": 3 }));
    assert!(!strip_blocks(&reply).contains("search("));
}
