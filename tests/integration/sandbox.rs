use std::fs;
use std::time::Duration;

use subagent_dispatch::concurrency::ExecutionTracker;
use subagent_dispatch::executor::{ExecutionRequest, ParallelExecutor};
use subagent_dispatch::sandbox::ExecutionLimits;
use subagent_dispatch::{ExecutionContext, ExecutionStatus, RequestScope};

use crate::integration::support::{markdown_agent, write_descriptor, Dirs, FakeClient};

#[tokio::test]
async fn forbidden_prefix_beats_covering_allowed_path() {
    let dirs = Dirs::new();
    let root = dirs.root();
    let secret = root.join("secret");
    let inside = secret.join("keys");
    fs::create_dir_all(&inside).unwrap();

    write_descriptor(
        &dirs.primary,
        "auditor.md",
        &markdown_agent(
            "Auditor",
            "Audits",
            &format!(
                "allowed_paths: [\"{}\"]\nforbidden_paths: [\"{}\"]\n",
                root.display(),
                secret.display()
            ),
        ),
    );
    let registry = dirs.registry();
    let descriptor = registry.get("auditor").unwrap();
    assert!(descriptor.issues.is_empty());

    let client = FakeClient::new();
    let executor = ParallelExecutor::new(client.shared(), 2, ExecutionTracker::new());
    let request = |dir: &std::path::Path| {
        let scope = RequestScope::new().with_working_dir(dir);
        ExecutionRequest {
            descriptor: descriptor.clone(),
            task: "list what is here".to_string(),
            context: ExecutionContext::for_agent(&descriptor, &scope, ExecutionLimits::default()),
        }
    };

    let denied = executor.execute_one(request(&inside)).await;
    assert_eq!(denied.status, ExecutionStatus::Failed);
    assert!(denied.error.as_deref().unwrap().contains("Path access denied"));

    let allowed = executor.execute_one(request(&root)).await;
    assert_eq!(allowed.status, ExecutionStatus::Completed);
}

#[tokio::test]
async fn write_wording_needs_write_capability() {
    let dirs = Dirs::new();
    write_descriptor(&dirs.primary, "reader.md", &markdown_agent("Reader", "Reads", ""));
    write_descriptor(
        &dirs.primary,
        "editor.md",
        &markdown_agent("Editor", "Edits", "capabilities: [write_files]\n"),
    );
    let registry = dirs.registry();
    let scope = RequestScope::new().with_working_dir(dirs.root());
    let executor = ParallelExecutor::new(FakeClient::new().shared(), 2, ExecutionTracker::new());

    let requests = ["reader", "editor"]
        .iter()
        .map(|id| {
            let descriptor = registry.get(id).unwrap();
            let context = ExecutionContext::for_agent(
                &descriptor,
                &scope,
                ExecutionLimits {
                    timeout: Duration::from_secs(5),
                    ..ExecutionLimits::default()
                },
            );
            ExecutionRequest {
                descriptor,
                task: "Delete the stale cache files".to_string(),
                context,
            }
        })
        .collect();

    let outcome = executor.execute_all(requests).await;
    assert_eq!(outcome.results[0].status, ExecutionStatus::Failed);
    assert!(outcome.results[0]
        .error
        .as_deref()
        .unwrap()
        .contains("write_files"));
    assert_eq!(outcome.results[1].status, ExecutionStatus::Completed);
}
