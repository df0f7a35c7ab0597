mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use rolegate::auth;
use rolegate::roles::{ALL_ACCESS_ROLE, BASELINE_ROLE, ID_USER, SD_ADMIN};

#[tokio::test]
async fn role_request_lifecycle_end_to_end() -> Result<()> {
    let server = common::spawn_app().await?;
    let client = reqwest::Client::new();

    // alice registers and starts with the baseline role only
    let res = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&json!({ "name": "Alice", "email": "alice@example.com" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["roles"], json!([BASELINE_ROLE]));
    let alice_id: uuid::Uuid = serde_json::from_value(body["data"]["user"]["id"].clone())?;
    let alice_token = auth::generate_token(alice_id, "Alice")?;

    // alice asks for the Service Dashboard admin role
    let res = client
        .post(format!("{}/api/roles/requests", server.base_url))
        .bearer_auth(&alice_token)
        .json(&json!({ "role": SD_ADMIN, "notes": "need admin access" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let request = res.json::<Value>().await?["data"].clone();
    assert_eq!(request["status"], "pending");
    let request_id = request["id"].as_str().unwrap().to_string();

    // a second ask for the same role is refused while the first is open
    let res = client
        .post(format!("{}/api/roles/requests", server.base_url))
        .bearer_auth(&alice_token)
        .json(&json!({ "role": SD_ADMIN }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = res.json::<Value>().await?;
    assert!(body["message"].as_str().unwrap().contains("pending"));

    // bob, the all-access admin, approves
    let (bob, bob_token) = common::seed_user(
        &server.store,
        "Bob",
        "bob@example.com",
        &[BASELINE_ROLE, ALL_ACCESS_ROLE],
        true,
    )
    .await?;
    let res = client
        .post(format!(
            "{}/api/roles/requests/{}/resolve",
            server.base_url, request_id
        ))
        .bearer_auth(&bob_token)
        .json(&json!({ "decision": "approved", "notes": "granted, onboarding" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let resolved = res.json::<Value>().await?["data"].clone();
    assert_eq!(resolved["status"], "approved");
    assert_eq!(resolved["resolved_by"], json!(bob.id));
    assert_eq!(resolved["resolution_notes"], "granted, onboarding");

    // alice now holds exactly {SDadmin, user}
    let res = client
        .get(format!("{}/api/auth/whoami", server.base_url))
        .bearer_auth(&alice_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["roles"], json!([SD_ADMIN, BASELINE_ROLE]));
    let requestable: Vec<String> = serde_json::from_value(body["data"]["requestable_roles"].clone())?;
    assert!(!requestable.contains(&SD_ADMIN.to_string()));

    // asking again for a role already granted is a conflict
    let res = client
        .post(format!("{}/api/roles/requests", server.base_url))
        .bearer_auth(&alice_token)
        .json(&json!({ "role": SD_ADMIN }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = res.json::<Value>().await?;
    assert!(body["message"].as_str().unwrap().contains("already granted"));

    // resolving the same request twice reports it as settled
    let res = client
        .post(format!(
            "{}/api/roles/requests/{}/resolve",
            server.base_url, request_id
        ))
        .bearer_auth(&bob_token)
        .json(&json!({ "decision": "rejected" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    Ok(())
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected() -> Result<()> {
    let server = common::spawn_app().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/auth/whoami", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{}/api/roles/requests", server.base_url))
        .bearer_auth("not-a-real-token")
        .json(&json!({ "role": SD_ADMIN }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn unknown_roles_cannot_be_requested() -> Result<()> {
    let server = common::spawn_app().await?;
    let client = reqwest::Client::new();
    let (_, token) = common::seed_user(
        &server.store,
        "Alice",
        "alice@example.com",
        &[BASELINE_ROLE],
        true,
    )
    .await?;

    let res = client
        .post(format!("{}/api/roles/requests", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "role": "superuser" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert!(body["message"].as_str().unwrap().contains("superuser"));

    Ok(())
}

#[tokio::test]
async fn non_admins_cannot_resolve_requests() -> Result<()> {
    let server = common::spawn_app().await?;
    let client = reqwest::Client::new();
    let (_alice, alice_token) = common::seed_user(
        &server.store,
        "Alice",
        "alice@example.com",
        &[BASELINE_ROLE],
        true,
    )
    .await?;

    let res = client
        .post(format!("{}/api/roles/requests", server.base_url))
        .bearer_auth(&alice_token)
        .json(&json!({ "role": ID_USER }))
        .send()
        .await?;
    let request_id = res.json::<Value>().await?["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // another plain user fails the route guard outright
    let (_, carol_token) = common::seed_user(
        &server.store,
        "Carol",
        "carol@example.com",
        &[BASELINE_ROLE],
        true,
    )
    .await?;
    let res = client
        .post(format!(
            "{}/api/roles/requests/{}/resolve",
            server.base_url, request_id
        ))
        .bearer_auth(&carol_token)
        .json(&json!({ "decision": "approved" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // an admin of the wrong domain passes the route guard but not the
    // per-domain authority check
    let (_, sd_token) = common::seed_user(
        &server.store,
        "Sam",
        "sam@example.com",
        &[BASELINE_ROLE, SD_ADMIN],
        true,
    )
    .await?;
    let res = client
        .post(format!(
            "{}/api/roles/requests/{}/resolve",
            server.base_url, request_id
        ))
        .bearer_auth(&sd_token)
        .json(&json!({ "decision": "approved" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn admins_cannot_resolve_their_own_requests() -> Result<()> {
    let server = common::spawn_app().await?;
    let client = reqwest::Client::new();
    let (_, dave_token) = common::seed_user(
        &server.store,
        "Dave",
        "dave@example.com",
        &[BASELINE_ROLE, SD_ADMIN, rolegate::roles::ID_ADMIN],
        true,
    )
    .await?;

    let res = client
        .post(format!("{}/api/roles/requests", server.base_url))
        .bearer_auth(&dave_token)
        .json(&json!({ "role": ID_USER }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let request_id = res.json::<Value>().await?["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = client
        .post(format!(
            "{}/api/roles/requests/{}/resolve",
            server.base_url, request_id
        ))
        .bearer_auth(&dave_token)
        .json(&json!({ "decision": "approved" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = res.json::<Value>().await?;
    assert!(body["message"].as_str().unwrap().contains("your own"));

    Ok(())
}
