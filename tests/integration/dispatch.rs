use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use subagent_dispatch::executor::{ExecutionRequest, ParallelExecutor};
use subagent_dispatch::routing::CapabilityRouter;
use subagent_dispatch::sandbox::ExecutionLimits;
use subagent_dispatch::concurrency::ExecutionTracker;
use subagent_dispatch::invocation::CommandSet;
use subagent_dispatch::{
    ExecutionContext, ExecutionStatus, Invocation, InvocationDetector, Orchestrator,
    OrchestratorConfig, RequestScope,
};

use crate::integration::support::{markdown_agent, write_descriptor, Dirs, FakeClient, Reply};

fn detector() -> InvocationDetector {
    InvocationDetector::new(&CommandSet::default()).unwrap()
}

fn user(text: &str) -> serde_json::Value {
    json!({"model": "m", "messages": [{"role": "user", "content": text}]})
}

#[test]
fn explicit_command_is_detected() {
    assert_eq!(
        detector().detect(&user("/agent code-reviewer Review this function")),
        Some(Invocation::Explicit {
            agent_id: "code-reviewer".to_string(),
            task: "Review this function".to_string(),
        })
    );
}

#[test]
fn multi_command_keeps_listed_order() {
    assert_eq!(
        detector().detect(&user("/agents run b,a,b Do X")),
        Some(Invocation::MultiAgent {
            agent_ids: vec!["b".to_string(), "a".to_string()],
            task: "Do X".to_string(),
        })
    );
    assert_eq!(
        detector().detect(&user("/AGENTS RUN a, b Do X")),
        Some(Invocation::MultiAgent {
            agent_ids: vec!["a".to_string(), "b".to_string()],
            task: "Do X".to_string(),
        })
    );
}

#[test]
fn detection_reads_structured_content_and_is_repeatable() {
    let detector = detector();
    let payload = json!({
        "messages": [{
            "role": "user",
            "content": [
                {"type": "image", "source": {}},
                {"type": "text", "text": "/agents auto review the parser"}
            ]
        }]
    });
    let first = detector.detect(&payload);
    assert_eq!(
        first,
        Some(Invocation::AutoDelegate {
            task: "review the parser".to_string()
        })
    );
    for _ in 0..5 {
        assert_eq!(detector.detect(&payload), first);
    }
}

#[test]
fn debugger_is_routed_for_debug_wording() {
    let dirs = Dirs::new();
    write_descriptor(
        &dirs.primary,
        "debugger.md",
        &markdown_agent("debugger", "Debugs", "capabilities: [debugging]\n"),
    );
    let registry = dirs.registry();
    let selected = CapabilityRouter::new().select_for_task(
        "Debug this error and trace the root cause",
        None,
        &registry.snapshot(),
    );
    assert_eq!(selected, vec!["debugger"]);
}

#[tokio::test]
async fn no_descriptors_means_no_modification() {
    let dirs = Dirs::new();
    let client = Arc::new(FakeClient::new());
    let orchestrator = Orchestrator::new(
        dirs.registry(),
        Arc::clone(&client) as Arc<dyn subagent_dispatch::CompletionClient>,
        OrchestratorConfig::default(),
    )
    .unwrap();

    let payload = user("/agents auto Debug this error");
    let scope = RequestScope::new().with_working_dir(dirs.root());
    assert!(orchestrator
        .process_request_with(&payload, "/v1/messages", &scope)
        .await
        .is_none());
    assert!(client.seen().is_empty());
}

#[tokio::test]
async fn structured_payload_gets_results_prefixed_to_user_text() {
    let dirs = Dirs::new();
    write_descriptor(
        &dirs.primary,
        "reviewer.md",
        &markdown_agent("Reviewer", "Reviews", "capabilities: [code_review]\n"),
    );
    let client = FakeClient::new().reply("reviewer", Reply::Text("looks fine")).shared();
    let orchestrator =
        Orchestrator::new(dirs.registry(), client, OrchestratorConfig::default()).unwrap();

    let payload = json!({
        "system": "be brief",
        "messages": [{
            "role": "user",
            "content": [{"type": "text", "text": "/agent reviewer check the diff"}]
        }]
    });
    let scope = RequestScope::new().with_working_dir(dirs.root());
    let modified = orchestrator
        .process_request_with(&payload, "/v1/messages", &scope)
        .await
        .unwrap();

    let text = modified["messages"][0]["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("## Subagent Results"));
    assert!(text.contains("looks fine"));
    assert!(text.ends_with("/agent reviewer check the diff"));
    assert_eq!(modified["system"], "be brief");
    assert_eq!(
        payload["messages"][0]["content"][0]["text"],
        "/agent reviewer check the diff"
    );
}

fn batch_requests(dirs: &Dirs, ids: &[&str], timeout: Duration) -> Vec<ExecutionRequest> {
    for id in ids {
        write_descriptor(&dirs.primary, &format!("{}.md", id), &markdown_agent(id, "worker", ""));
    }
    let registry = dirs.registry();
    let scope = RequestScope::new().with_working_dir(dirs.root());
    let limits = ExecutionLimits {
        timeout,
        ..ExecutionLimits::default()
    };
    ids.iter()
        .map(|id| {
            let descriptor = registry.get(id).unwrap();
            let context = ExecutionContext::for_agent(&descriptor, &scope, limits);
            ExecutionRequest {
                descriptor,
                task: "summarise the module".to_string(),
                context,
            }
        })
        .collect()
}

#[tokio::test]
async fn one_failing_agent_never_affects_siblings() {
    let ids = ["a0", "a1", "a2", "a3"];
    for k in 0..ids.len() {
        let dirs = Dirs::new();
        let requests = batch_requests(&dirs, &ids, Duration::from_secs(5));
        let client = FakeClient::new().reply(ids[k], Reply::Fail("boom")).shared();
        let executor = ParallelExecutor::new(client, ids.len(), ExecutionTracker::new());

        let outcome = executor.execute_all(requests).await;
        assert_eq!(outcome.results.len(), ids.len());
        for (i, result) in outcome.results.iter().enumerate() {
            assert_eq!(result.agent_id, ids[i]);
            if i == k {
                assert_eq!(result.status, ExecutionStatus::Failed);
                assert!(result.error.as_deref().unwrap().contains("boom"));
            } else {
                assert_eq!(result.status, ExecutionStatus::Completed);
            }
        }
    }
}

#[tokio::test]
async fn hung_agent_times_out_without_holding_the_batch() {
    let dirs = Dirs::new();
    let timeout = Duration::from_millis(200);
    let requests = batch_requests(&dirs, &["slow", "fast"], timeout);
    let client = FakeClient::new().reply("slow", Reply::Hang).shared();
    let tracker = ExecutionTracker::new();
    let executor = ParallelExecutor::new(client, 2, tracker.clone());

    let started = Instant::now();
    let outcome = executor.execute_all(requests).await;
    assert!(started.elapsed() < timeout + Duration::from_secs(2));

    assert_eq!(outcome.results[0].status, ExecutionStatus::Timeout);
    assert_eq!(outcome.results[1].status, ExecutionStatus::Completed);
    assert_eq!(outcome.succeeded(), 1);
    assert_eq!(tracker.active(), 0);
}

#[tokio::test]
async fn batch_beyond_the_limit_reports_skipped_agents() {
    let dirs = Dirs::new();
    let requests = batch_requests(&dirs, &["x", "y", "z"], Duration::from_secs(5));
    let executor = ParallelExecutor::new(FakeClient::new().shared(), 2, ExecutionTracker::new());

    let outcome = executor.execute_all(requests).await;
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.skipped, vec!["z"]);
}
