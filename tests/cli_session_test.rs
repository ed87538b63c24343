//! Integration tests for the stored session: `whoami`, `access`, `logout`
//! and route gating of registry commands.
//!
//! Sessions are planted as unsigned tokens in the isolated data directory, so
//! no test needs the API.

mod common;

use chrono::{Duration, Utc};
use common::{TestEnv, parse_json};
use predicates::prelude::*;
use serde_json::json;

#[test]
fn test_whoami_without_session() {
    let env = TestEnv::new();

    let output = env.studbook().arg("whoami").output().unwrap();
    assert!(output.status.success());
    let json = parse_json(&output.stdout);
    assert_eq!(json["authenticated"], false);
    assert!(json.get("session").is_none());

    env.studbook()
        .args(["-H", "whoami"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in."));
}

#[test]
fn test_whoami_trial_session() {
    let env = TestEnv::new();
    env.login_organization(Utc::now() + Duration::days(10) - Duration::hours(1));

    let output = env.studbook().arg("whoami").output().unwrap();
    assert!(output.status.success());
    let json = parse_json(&output.stdout);
    assert_eq!(json["authenticated"], true);
    assert_eq!(json["session"]["role"], "organization");
    assert_eq!(json["session"]["organization_id"], "4");
    assert_eq!(json["session"]["trial_active"], true);
    assert_eq!(json["session"]["trial_days_remaining"], 10);

    env.studbook()
        .args(["-H", "whoami"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Haras Boa Vista <haras@example.com> (organization)"))
        .stdout(predicate::str::contains("Trial: active, 10 days remaining"));
}

#[test]
fn test_whoami_at_after_trial() {
    let env = TestEnv::new();
    env.login_organization(Utc::now() + Duration::days(2));
    let at = (Utc::now() + Duration::days(3)).to_rfc3339();

    // The token itself expires within hours, so a later evaluation sees no session
    let output = env.studbook().args(["whoami", "--at", &at]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(parse_json(&output.stdout)["authenticated"], false);
}

#[test]
fn test_whoami_rejects_bad_time() {
    let env = TestEnv::new();

    env.studbook()
        .args(["-H", "whoami", "--at", "next tuesday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid time 'next tuesday'"));
}

#[test]
fn test_expired_token_discarded() {
    let env = TestEnv::new();
    env.store_token(&json!({
        "sub": "17",
        "role": "organization",
        "exp": (Utc::now() - Duration::minutes(5)).timestamp(),
    }));

    let output = env.studbook().arg("whoami").output().unwrap();
    assert!(output.status.success());
    assert_eq!(parse_json(&output.stdout)["authenticated"], false);
    assert!(!env.token_path().exists());
}

#[test]
fn test_malformed_token_discarded() {
    let env = TestEnv::new();
    std::fs::write(env.token_path(), "not-a-token").unwrap();

    let output = env.studbook().arg("whoami").output().unwrap();
    assert!(output.status.success());
    assert_eq!(parse_json(&output.stdout)["authenticated"], false);
    assert!(!env.token_path().exists());
}

#[test]
fn test_access_public_route_without_session() {
    let env = TestEnv::new();

    let output = env.studbook().args(["access", "/plans"]).output().unwrap();
    assert!(output.status.success());
    let json = parse_json(&output.stdout);
    assert_eq!(json["allowed"], true);
    assert_eq!(json["route_class"], "public");
    assert_eq!(json["decision"], "allow");
}

#[test]
fn test_access_protected_route_redirects_to_login() {
    let env = TestEnv::new();

    let output = env.studbook().args(["access", "/dashboard/animals"]).output().unwrap();
    assert!(output.status.success());
    let json = parse_json(&output.stdout);
    assert_eq!(json["authenticated"], false);
    assert_eq!(json["allowed"], false);
    assert_eq!(json["decision"], "redirect_login");
    assert_eq!(json["target"], "/login");
}

#[test]
fn test_access_trial_organization() {
    let env = TestEnv::new();
    env.login_organization(Utc::now() + Duration::days(5));

    let output = env.studbook().args(["access", "/dashboard"]).output().unwrap();
    assert_eq!(parse_json(&output.stdout)["decision"], "allow");

    let output = env.studbook().args(["access", "/admin"]).output().unwrap();
    let json = parse_json(&output.stdout);
    assert_eq!(json["route_class"], "admin_only");
    assert_eq!(json["decision"], "redirect_dashboard");
    assert_eq!(json["target"], "/dashboard");
}

#[test]
fn test_access_lapsed_trial_redirects_to_plans() {
    let env = TestEnv::new();
    env.login_organization(Utc::now() - Duration::days(1));

    let output = env.studbook().args(["access", "/dashboard/animals"]).output().unwrap();
    let json = parse_json(&output.stdout);
    assert_eq!(json["authenticated"], true);
    assert_eq!(json["decision"], "redirect_plans");
    assert_eq!(json["target"], "/plans");

    env.studbook()
        .args(["-H", "access", "/dashboard/animals"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "/dashboard/animals: redirect_plans (organization_protected) -> /plans",
        ));
}

#[test]
fn test_access_admin() {
    let env = TestEnv::new();
    env.login_admin();

    env.studbook()
        .args(["-H", "access", "/admin/organizations"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/admin/organizations: allowed (admin_only)"));
}

#[test]
fn test_access_unknown_route() {
    let env = TestEnv::new();

    let output = env.studbook().args(["access", "/stables"]).output().unwrap();
    assert!(output.status.success());
    let json = parse_json(&output.stdout);
    assert_eq!(json["allowed"], false);
    assert!(json["route_class"].is_null());
    assert_eq!(json["target"], "/");
}

#[test]
fn test_logout() {
    let env = TestEnv::new();
    env.login_admin();

    let output = env.studbook().arg("logout").output().unwrap();
    assert!(output.status.success());
    assert_eq!(parse_json(&output.stdout)["was_logged_in"], true);
    assert!(!env.token_path().exists());

    env.studbook()
        .args(["-H", "logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in."));
}

#[test]
fn test_animals_require_login() {
    let env = TestEnv::new();

    env.studbook()
        .args(["animals", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            r#"{"error":"Access to /dashboard/animals denied: redirected to /login"}"#,
        ));
}

#[test]
fn test_orgs_refused_for_organizations() {
    let env = TestEnv::new();
    env.login_organization(Utc::now() + Duration::days(5));

    env.studbook()
        .args(["-H", "orgs", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Error: Access to /admin/organizations denied: redirected to /dashboard",
        ));
}

#[test]
fn test_gated_command_reaches_api_when_allowed() {
    let env = TestEnv::new();
    env.login_admin();

    // Passes the gate, then fails on the unreachable API
    env.studbook()
        .args(["orgs", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(r#""error""#))
        .stderr(predicate::str::contains("redirected").not());
}

#[test]
fn test_login_failure_stores_nothing() {
    let env = TestEnv::new();

    env.studbook()
        .args(["login", "--email", "haras@example.com"])
        .env("STUDBOOK_PASSWORD", "secret")
        .assert()
        .failure()
        .stderr(predicate::str::contains(r#""error""#));
    assert!(!env.token_path().exists());
}
