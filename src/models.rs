use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, EnumString};

/// Protected tables exercised by the smoke test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Resource {
    Items,
    InventoryEvents,
}

impl Resource {
    /// Columns requested when listing rows of this resource.
    pub fn select_columns(&self) -> &'static str {
        match self {
            Resource::Items => "id,user_id,label",
            Resource::InventoryEvents => "item_id,user_id,event_type",
        }
    }
}

/// A test user as provisioned by the admin API.
#[derive(Debug, Clone)]
pub struct TestIdentity {
    pub label: String,
    pub email: String,
    pub password: String,
    pub user_id: String,
}

/// Access credentials returned by a password sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    pub identity: TestIdentity,
    pub session: Session,
}

impl AuthenticatedIdentity {
    pub fn user_id(&self) -> &str {
        &self.identity.user_id
    }
}

/// User record as returned by the auth API.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateAuthUser<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub email_confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct PasswordCredentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SignInResponse {
    #[serde(flatten)]
    pub session: Session,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewItem {
    pub user_id: String,
    pub label: String,
    pub description: String,
    pub status: String,
    pub estimated_value_cents: i64,
    pub weight_lbs: i32,
    pub length_inches: i32,
    pub width_inches: i32,
    pub height_inches: i32,
    pub tags: Vec<String>,
    pub photo_paths: Vec<String>,
}

impl NewItem {
    pub fn qa_fixture(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            label: "QA Item A".to_string(),
            description: "RLS smoke test item".to_string(),
            status: "home".to_string(),
            estimated_value_cents: 12345,
            weight_lbs: 10,
            length_inches: 10,
            width_inches: 10,
            height_inches: 10,
            tags: vec!["qa".to_string()],
            photo_paths: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewInventoryEvent {
    /// Omitted when the item insert did not return a row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<Value>,
    pub user_id: String,
    pub event_type: String,
    pub event_data: Value,
}

impl NewInventoryEvent {
    pub fn qa_fixture(item_id: Option<Value>, user_id: &str) -> Self {
        Self {
            item_id,
            user_id: user_id.to_string(),
            event_type: "qa_insert_test".to_string(),
            event_data: serde_json::json!({ "note": "RLS check" }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_table_names() {
        assert_eq!(Resource::Items.as_ref(), "items");
        assert_eq!(Resource::InventoryEvents.as_ref(), "inventory_events");
        assert_eq!(
            "inventory_events".parse::<Resource>().unwrap(),
            Resource::InventoryEvents
        );
    }

    #[test]
    fn sign_in_response_flattens_session() {
        let body = serde_json::json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r",
            "user": { "id": "u-1", "email": "a@b.test" }
        });

        let parsed: SignInResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.session.access_token, "jwt");
        assert_eq!(parsed.session.expires_in, Some(3600));
        assert_eq!(parsed.user.id, "u-1");
    }

    #[test]
    fn event_without_item_omits_item_id() {
        let event = NewInventoryEvent::qa_fixture(None, "u-1");
        let json = serde_json::to_value(&event).unwrap();

        assert!(json.get("item_id").is_none());
        assert_eq!(json["user_id"], "u-1");
        assert_eq!(json["event_data"]["note"], "RLS check");
    }

    #[test]
    fn event_with_item_keeps_item_id() {
        let event = NewInventoryEvent::qa_fixture(Some(serde_json::json!("item-1")), "u-1");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["item_id"], "item-1");
    }
}
