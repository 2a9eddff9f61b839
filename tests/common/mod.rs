//! Shared fixtures: a mockito server standing in for the auth and data APIs.

#![allow(dead_code)]

use mockito::{Matcher, Mock, ServerGuard};
use rls_smoke::Config;
use rls_smoke::config::{SUPABASE_ANON_KEY, SUPABASE_SERVICE_ROLE_KEY, SUPABASE_URL};
use serde_json::{Value, json};

pub const ANON_KEY: &str = "anon-key";
pub const SERVICE_KEY: &str = "service-key";

pub const USER_A_ID: &str = "user-a";
pub const USER_B_ID: &str = "user-b";
pub const TOKEN_A: &str = "token-a";
pub const TOKEN_B: &str = "token-b";
pub const ITEM_ID: &str = "item-1";

pub fn test_config(server: &ServerGuard) -> Config {
    let url = server.url();
    Config::from_lookup(|key| match key {
        SUPABASE_URL => Some(url.clone()),
        SUPABASE_ANON_KEY => Some(ANON_KEY.to_string()),
        SUPABASE_SERVICE_ROLE_KEY => Some(SERVICE_KEY.to_string()),
        _ => None,
    })
    .unwrap()
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

fn email_for(label: &str) -> Matcher {
    Matcher::Regex(format!(r#""email":"{}-"#, label))
}

pub async fn mock_create_user(
    server: &mut ServerGuard,
    label: &str,
    status: usize,
    body: Value,
) -> Mock {
    server
        .mock("POST", "/auth/v1/admin/users")
        .match_header("apikey", SERVICE_KEY)
        .match_header("authorization", bearer(SERVICE_KEY).as_str())
        .match_body(email_for(label))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .expect(1)
        .create_async()
        .await
}

pub async fn mock_sign_in(
    server: &mut ServerGuard,
    label: &str,
    status: usize,
    body: Value,
) -> Mock {
    server
        .mock("POST", "/auth/v1/token?grant_type=password")
        .match_header("apikey", ANON_KEY)
        .match_header("authorization", bearer(ANON_KEY).as_str())
        .match_body(email_for(label))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .expect(1)
        .create_async()
        .await
}

pub fn session_body(user_id: &str, token: &str) -> Value {
    json!({
        "access_token": token,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": format!("refresh-{}", user_id),
        "user": { "id": user_id }
    })
}

pub async fn mock_delete_user(server: &mut ServerGuard, user_id: &str, expect: usize) -> Mock {
    server
        .mock("DELETE", format!("/auth/v1/admin/users/{}", user_id).as_str())
        .match_header("authorization", bearer(SERVICE_KEY).as_str())
        .with_status(200)
        .with_body("{}")
        .expect(expect)
        .create_async()
        .await
}

pub async fn mock_lookup_user(server: &mut ServerGuard, user_id: &str, status: usize) -> Mock {
    server
        .mock("GET", format!("/auth/v1/admin/users/{}", user_id).as_str())
        .match_header("authorization", bearer(SERVICE_KEY).as_str())
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": user_id }).to_string())
        .expect(1)
        .create_async()
        .await
}

/// Both identities provisioned and signed in successfully, then deleted.
pub async fn mock_identities(server: &mut ServerGuard) -> Vec<Mock> {
    vec![
        mock_create_user(server, "qa-user-a", 200, json!({ "id": USER_A_ID })).await,
        mock_create_user(server, "qa-user-b", 200, json!({ "id": USER_B_ID })).await,
        mock_sign_in(server, "qa-user-a", 200, session_body(USER_A_ID, TOKEN_A)).await,
        mock_sign_in(server, "qa-user-b", 200, session_body(USER_B_ID, TOKEN_B)).await,
        mock_delete_user(server, USER_A_ID, 1).await,
        mock_delete_user(server, USER_B_ID, 1).await,
    ]
}

/// Status and body for each checked data API call.
pub struct DataApi {
    pub insert_item: (usize, Value),
    pub own_items: (usize, Value),
    pub cross_items: (usize, Value),
    pub insert_event: (usize, Value),
    pub own_events: (usize, Value),
    pub cross_events: (usize, Value),
    /// When set, the event insert only matches a body containing these fields
    pub event_body: Option<Value>,
}

impl Default for DataApi {
    /// A backend whose policies isolate the two users correctly.
    fn default() -> Self {
        Self {
            insert_item: (201, json!([{ "id": ITEM_ID, "user_id": USER_A_ID, "label": "QA Item A" }])),
            own_items: (200, json!([{ "id": ITEM_ID, "user_id": USER_A_ID, "label": "QA Item A" }])),
            cross_items: (200, json!([])),
            insert_event: (201, json!([{ "item_id": ITEM_ID, "user_id": USER_A_ID }])),
            own_events: (
                200,
                json!([{ "item_id": ITEM_ID, "user_id": USER_A_ID, "event_type": "qa_insert_test" }]),
            ),
            cross_events: (200, json!([])),
            event_body: None,
        }
    }
}

async fn data_mock(
    server: &mut ServerGuard,
    method: &str,
    path: &str,
    token: &str,
    (status, body): (usize, Value),
) -> Mock {
    data_mock_matching(server, method, path, token, Matcher::Any, (status, body)).await
}

async fn data_mock_matching(
    server: &mut ServerGuard,
    method: &str,
    path: &str,
    token: &str,
    request_body: Matcher,
    (status, body): (usize, Value),
) -> Mock {
    server
        .mock(method, path)
        .match_header("apikey", ANON_KEY)
        .match_header("authorization", bearer(token).as_str())
        .match_body(request_body)
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .expect(1)
        .create_async()
        .await
}

pub async fn mock_data_api(server: &mut ServerGuard, api: DataApi) -> Vec<Mock> {
    let cross_items = format!("/rest/v1/items?select=id,user_id,label&user_id=eq.{}", USER_A_ID);
    let cross_events = format!(
        "/rest/v1/inventory_events?select=item_id,user_id,event_type&user_id=eq.{}",
        USER_A_ID
    );

    vec![
        data_mock(server, "POST", "/rest/v1/items", TOKEN_A, api.insert_item).await,
        data_mock(server, "GET", "/rest/v1/items?select=id,user_id,label", TOKEN_A, api.own_items).await,
        data_mock(server, "GET", &cross_items, TOKEN_B, api.cross_items).await,
        data_mock_matching(
            server,
            "POST",
            "/rest/v1/inventory_events",
            TOKEN_A,
            api.event_body.map(Matcher::PartialJson).unwrap_or(Matcher::Any),
            api.insert_event,
        )
        .await,
        data_mock(
            server,
            "GET",
            "/rest/v1/inventory_events?select=item_id,user_id,event_type",
            TOKEN_A,
            api.own_events,
        )
        .await,
        data_mock(server, "GET", &cross_events, TOKEN_B, api.cross_events).await,
    ]
}

pub async fn mock_delete_item(server: &mut ServerGuard, expect: usize) -> Mock {
    server
        .mock("DELETE", format!("/rest/v1/items?id=eq.{}", ITEM_ID).as_str())
        .match_header("authorization", bearer(TOKEN_A).as_str())
        .with_status(204)
        .expect(expect)
        .create_async()
        .await
}

pub async fn assert_all(mocks: Vec<Mock>) {
    for mock in mocks {
        mock.assert_async().await;
    }
}
