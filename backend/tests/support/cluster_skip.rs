//! Policy for integration tests when no embedded cluster can start.
//!
//! Setup failures panic so CI breakage is not masked. Environments that
//! cannot run a cluster opt out with `SKIP_TEST_CLUSTER`.

/// Truthy values: "1", "true", "yes" (case-insensitive).
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Apply [`should_skip_test_cluster`] to a setup failure.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    resolve_cluster_setup_failure(should_skip_test_cluster(), reason)
}

/// Print the skip marker and return `None` when `skip` is set, otherwise
/// panic with the setup failure.
pub fn resolve_cluster_setup_failure<T>(skip: bool, reason: impl std::fmt::Display) -> Option<T> {
    if !skip {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
    eprintln!("SKIP-TEST-CLUSTER: {reason}");
    None
}
