//! Real API integration test.
//!
//! This test makes real calls to the GitHub API and validates the
//! credential and existence checks end-to-end. It is ignored by default;
//! run it with:
//!
//!     cargo test -- --ignored
//!
//! Requires: HOIST_LIVE_TOKEN environment variable set to a valid GitHub
//! personal access token. Only read endpoints are called; no repository is
//! created.

use hoist::core::validate;
use hoist::providers::RemoteHost;
use hoist::providers::github::GithubHost;

/// Live checks against the real API.
///
/// Validates that:
/// 1. The token passes the offline format check
/// 2. GitHub accepts the token
/// 3. The existence probe answers "free" for a name that cannot exist
#[tokio::test]
#[ignore] // Requires HOIST_LIVE_TOKEN
async fn test_live_token_and_existence_checks() {
    let token = match std::env::var("HOIST_LIVE_TOKEN") {
        Ok(token) => token,
        Err(_) => {
            eprintln!("Skipping: HOIST_LIVE_TOKEN not set");
            return;
        }
    };

    validate::check_token(&token).expect("live token should pass the format check");

    let host = GithubHost::new(token);
    assert!(
        host.validate_credential().await,
        "GitHub should accept the live token"
    );

    let unlikely = "hoist-live-check-this-name-should-not-exist-4297";
    assert!(
        !host.repository_exists(unlikely).await,
        "existence probe should report '{unlikely}' as free"
    );
}
