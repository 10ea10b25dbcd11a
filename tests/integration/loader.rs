use crate::integration::support::{markdown_agent, write_descriptor, Dirs};
use subagent_dispatch::agent::Capability;

#[test]
fn malformed_and_incomplete_files_do_not_reduce_valid_count() {
    let dirs = Dirs::new();
    write_descriptor(&dirs.primary, "reviewer.md", &markdown_agent("Reviewer", "Reviews", ""));
    write_descriptor(
        &dirs.primary,
        "tester.yaml",
        "name: Tester\ndescription: Runs tests\ncapabilities: [testing]\n",
    );
    write_descriptor(&dirs.primary, "nameless.md", "---\ndescription: no name\n---\n");
    write_descriptor(&dirs.primary, "garbage.json", "{ not json");
    write_descriptor(&dirs.primary, "unterminated.md", "---\nname: x\ndescription: y\n");

    let registry = dirs.registry();
    let snapshot = registry.snapshot();
    let ids: Vec<&str> = snapshot.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["reviewer", "tester"]);
    assert!(snapshot["tester"].has_capability(Capability::Testing));

    let stats = registry.last_stats();
    assert_eq!(stats.loaded, 2);
    assert_eq!(stats.skipped, 3);
}

#[test]
fn primary_directory_wins_on_id_collision() {
    let dirs = Dirs::new();
    write_descriptor(&dirs.primary, "helper.md", &markdown_agent("Primary", "from primary", ""));
    write_descriptor(
        &dirs.fallback,
        "helper.md",
        &markdown_agent("Fallback", "from fallback", "capabilities: [testing]\n"),
    );
    write_descriptor(&dirs.fallback, "extra.md", &markdown_agent("Extra", "only in fallback", ""));

    let registry = dirs.registry();
    let helper = registry.get("helper").unwrap();
    assert_eq!(helper.name, "Primary");
    assert_eq!(helper.description, "from primary");
    assert!(helper.capabilities.is_empty());
    assert!(registry.get("extra").is_some());
    assert_eq!(registry.last_stats().shadowed, 1);
}

#[test]
fn semantic_problems_are_issues_not_rejections() {
    let dirs = Dirs::new();
    write_descriptor(
        &dirs.primary,
        "odd.md",
        &markdown_agent(
            "Odd",
            "odd values",
            "model: not-a-model\ntemperature: 9.5\nmax_tokens: 0\ntools: [Read, Teleport]\n",
        ),
    );

    let registry = dirs.registry();
    let odd = registry.get("odd").unwrap();
    assert_eq!(odd.temperature, 2.0);
    assert_eq!(odd.max_tokens, 4096);
    assert_eq!(odd.tools, vec!["Read"]);
    assert!(odd.issues.len() >= 4);
    assert_eq!(registry.last_stats().with_issues, 1);
}

#[test]
fn reload_swaps_in_a_new_snapshot() {
    let dirs = Dirs::new();
    write_descriptor(&dirs.primary, "a.md", &markdown_agent("A", "first", ""));
    let registry = dirs.registry();
    let before = registry.snapshot();

    write_descriptor(&dirs.primary, "b.md", &markdown_agent("B", "second", ""));
    registry.reload();

    assert_eq!(before.len(), 1);
    assert_eq!(registry.snapshot().len(), 2);
}
