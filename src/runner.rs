//! The smoke test sequence.
//!
//! Two identities are provisioned and signed in, identity A writes and reads
//! its own rows, identity B tries to read A's rows, then everything the run
//! created is torn down. Steps run strictly one after another.

use reqwest::Client;
use serde_json::Value;

use crate::auth::AuthClient;
use crate::config::Config;
use crate::error::Result;
use crate::models::{AuthenticatedIdentity, NewInventoryEvent, NewItem, Resource};
use crate::report::{RunReport, StepOutcome};
use crate::rest::{ApiResponse, RequestOptions, RestClient};
use crate::util::{filter_value, first_row_id, is_denied, is_success, rows};

pub const USER_A_LABEL: &str = "qa-user-a";
pub const USER_B_LABEL: &str = "qa-user-b";

pub mod steps {
    pub const INSERT_ITEM: &str = "User A inserts own item";
    pub const LIST_OWN_ITEMS: &str = "User A lists own items";
    pub const CROSS_READ_ITEMS: &str = "User B tries to read User A items";
    pub const INSERT_EVENT: &str = "User A inserts inventory event";
    pub const LIST_OWN_EVENTS: &str = "User A lists own inventory events";
    pub const CROSS_READ_EVENTS: &str = "User B tries to read User A events";
    pub const ITEM_DELETED: &str = "Deleted item no longer visible to User A";
    pub const USER_A_DELETED: &str = "User A no longer exists";
    pub const USER_B_DELETED: &str = "User B no longer exists";
}

/// How listing steps decide pass/fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckMode {
    /// Own listings must contain the inserted row; cross-identity reads must
    /// be denied or come back empty.
    #[default]
    Strict,
    /// Any 2xx passes.
    StatusOnly,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub check_mode: CheckMode,
    pub verify_cleanup: bool,
}

pub struct SmokeTest {
    auth: AuthClient,
    rest: RestClient,
    options: RunOptions,
}

impl SmokeTest {
    pub fn new(config: &Config, options: RunOptions) -> Self {
        let client = Client::new();
        Self {
            auth: AuthClient::new(client.clone(), config),
            rest: RestClient::new(client, config),
            options,
        }
    }

    /// Run the full sequence.
    ///
    /// Failed checks are recorded in the report, not returned as errors.
    /// An error means setup failed or a request could not be sent at all.
    pub async fn run(&self) -> Result<RunReport> {
        println!("▶️ Starting RLS smoke test…");

        let (user_a, user_b) = self.setup().await?;

        println!("   User A: {}", user_a.user_id());
        println!("   User B: {}", user_b.user_id());

        let mut report = RunReport::new();
        let mut item_id = None;

        let exercised = self
            .exercise(&user_a, &user_b, &mut item_id, &mut report)
            .await;

        self.delete_item(&user_a, item_id.as_ref(), &mut report).await;
        self.delete_identities(&[&user_a, &user_b], &mut report).await;

        exercised?;

        println!("✅ RLS smoke test complete");
        println!("{}", report.summary());

        Ok(report)
    }

    /// Provision and sign in both identities, deleting any already created
    /// identity if a later setup call fails.
    async fn setup(&self) -> Result<(AuthenticatedIdentity, AuthenticatedIdentity)> {
        let mut provisioned = Vec::new();

        match self.provision(&mut provisioned).await {
            Ok(pair) => Ok(pair),
            Err(err) => {
                for user_id in &provisioned {
                    self.delete_identity(user_id).await;
                }
                Err(err)
            }
        }
    }

    async fn provision(
        &self,
        provisioned: &mut Vec<String>,
    ) -> Result<(AuthenticatedIdentity, AuthenticatedIdentity)> {
        let user_a = self.auth.create_user(USER_A_LABEL).await?;
        provisioned.push(user_a.user_id.clone());

        let user_b = self.auth.create_user(USER_B_LABEL).await?;
        provisioned.push(user_b.user_id.clone());

        let authed_a = self.auth.sign_in(&user_a).await?;
        let authed_b = self.auth.sign_in(&user_b).await?;

        Ok((authed_a, authed_b))
    }

    async fn exercise(
        &self,
        user_a: &AuthenticatedIdentity,
        user_b: &AuthenticatedIdentity,
        item_id: &mut Option<Value>,
        report: &mut RunReport,
    ) -> Result<()> {
        let owner_id = user_a.user_id();

        let item = serde_json::to_value(NewItem::qa_fixture(owner_id))?;
        let insert_item = self
            .rest
            .request(&user_a.session, Resource::Items.as_ref(), RequestOptions::insert(item))
            .await?;
        report.record(StepOutcome::from_status(steps::INSERT_ITEM, &insert_item));
        *item_id = first_row_id(&insert_item.json);

        let own_items = self.rest.get(&user_a.session, &list_path(Resource::Items, None)).await?;
        report.record(self.check_own_listing(steps::LIST_OWN_ITEMS, &own_items, item_id.as_ref()));

        let cross_items = self
            .rest
            .get(&user_b.session, &list_path(Resource::Items, Some(owner_id)))
            .await?;
        report.record(self.check_isolation(steps::CROSS_READ_ITEMS, &cross_items));

        let event = serde_json::to_value(NewInventoryEvent::qa_fixture(item_id.clone(), owner_id))?;
        let insert_event = self
            .rest
            .request(
                &user_a.session,
                Resource::InventoryEvents.as_ref(),
                RequestOptions::insert(event),
            )
            .await?;
        report.record(StepOutcome::from_status(steps::INSERT_EVENT, &insert_event));

        let own_events = self
            .rest
            .get(&user_a.session, &list_path(Resource::InventoryEvents, None))
            .await?;
        report.record(self.check_own_events(
            steps::LIST_OWN_EVENTS,
            &own_events,
            owner_id,
            insert_event.is_success(),
        ));

        let cross_events = self
            .rest
            .get(&user_b.session, &list_path(Resource::InventoryEvents, Some(owner_id)))
            .await?;
        report.record(self.check_isolation(steps::CROSS_READ_EVENTS, &cross_events));

        Ok(())
    }

    fn check_own_listing(
        &self,
        label: &str,
        response: &ApiResponse,
        item_id: Option<&Value>,
    ) -> StepOutcome {
        if self.options.check_mode == CheckMode::StatusOnly || !response.is_success() {
            return StepOutcome::from_status(label, response);
        }

        // Nothing to look for when the insert returned no row; that step already failed.
        let Some(item_id) = item_id else {
            return StepOutcome::pass(label, response.status);
        };

        if rows(&response.json).iter().any(|row| row.get("id") == Some(item_id)) {
            StepOutcome::pass(label, response.status)
        } else {
            StepOutcome::fail(
                label,
                response,
                Some(format!("inserted item {} not visible to its owner", item_id)),
            )
        }
    }

    fn check_isolation(&self, label: &str, response: &ApiResponse) -> StepOutcome {
        if self.options.check_mode == CheckMode::StatusOnly {
            return StepOutcome::from_status(label, response);
        }

        if is_denied(response.status) {
            return StepOutcome::pass(label, response.status);
        }
        if !response.is_success() {
            return StepOutcome::fail(label, response, None);
        }

        // A 2xx only proves isolation when it is an empty row set.
        match response.json.as_array().map(Vec::len) {
            Some(0) => StepOutcome::pass(label, response.status),
            Some(n) => StepOutcome::fail(
                label,
                response,
                Some(format!("isolation violated: {} row(s) visible", n)),
            ),
            None => StepOutcome::fail(
                label,
                response,
                Some("unexpected body, expected an empty row set".to_string()),
            ),
        }
    }

    /// Own events must include a row owned by `owner_id` once the insert succeeded.
    fn check_own_events(
        &self,
        label: &str,
        response: &ApiResponse,
        owner_id: &str,
        event_inserted: bool,
    ) -> StepOutcome {
        if self.options.check_mode == CheckMode::StatusOnly
            || !response.is_success()
            || !event_inserted
        {
            return StepOutcome::from_status(label, response);
        }

        let owned = rows(&response.json)
            .iter()
            .any(|row| row.get("user_id").and_then(Value::as_str) == Some(owner_id));
        if owned {
            StepOutcome::pass(label, response.status)
        } else {
            StepOutcome::fail(
                label,
                response,
                Some("inserted event not visible to its owner".to_string()),
            )
        }
    }

    async fn delete_item(
        &self,
        owner: &AuthenticatedIdentity,
        item_id: Option<&Value>,
        report: &mut RunReport,
    ) {
        let Some(item_id) = item_id else {
            tracing::warn!("No item id returned by insert, skipping item cleanup");
            return;
        };

        let path = format!("{}?id=eq.{}", Resource::Items.as_ref(), filter_value(item_id));
        match self.rest.request(&owner.session, &path, RequestOptions::delete()).await {
            Ok(response) if !response.is_success() => {
                tracing::warn!(status = response.status, %item_id, "Item cleanup failed");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, %item_id, "Item cleanup failed"),
        }

        if !self.options.verify_cleanup {
            return;
        }

        let lookup = format!(
            "{}?select=id&id=eq.{}",
            Resource::Items.as_ref(),
            filter_value(item_id)
        );
        let outcome = match self.rest.get(&owner.session, &lookup).await {
            Ok(response) if response.is_success() && rows(&response.json).is_empty() => {
                StepOutcome::pass(steps::ITEM_DELETED, response.status)
            }
            Ok(response) if response.is_success() => StepOutcome::fail(
                steps::ITEM_DELETED,
                &response,
                Some("item still present".to_string()),
            ),
            Ok(response) => StepOutcome::fail(steps::ITEM_DELETED, &response, None),
            Err(e) => lookup_failed(steps::ITEM_DELETED, e),
        };
        report.record(outcome);
    }

    async fn delete_identities(&self, identities: &[&AuthenticatedIdentity], report: &mut RunReport) {
        for identity in identities {
            self.delete_identity(identity.user_id()).await;
        }

        if !self.options.verify_cleanup {
            return;
        }

        let labels = [steps::USER_A_DELETED, steps::USER_B_DELETED];
        for (identity, label) in identities.iter().zip(labels) {
            let outcome = match self.auth.get_user(identity.user_id()).await {
                Ok(None) => StepOutcome::pass(label, 404),
                Ok(Some(_)) => StepOutcome {
                    label: label.to_string(),
                    status: 200,
                    passed: false,
                    reason: Some("identity still exists".to_string()),
                    body: None,
                },
                Err(e) => lookup_failed(label, e),
            };
            report.record(outcome);
        }
    }

    async fn delete_identity(&self, user_id: &str) {
        match self.auth.delete_user(user_id).await {
            Ok(status) if !is_success(status) => {
                tracing::warn!(status, user_id, "Identity cleanup failed");
            }
            Ok(_) => tracing::debug!(user_id, "Deleted test identity"),
            Err(e) => tracing::warn!(error = %e, user_id, "Identity cleanup failed"),
        }
    }
}

fn lookup_failed(label: &str, error: impl std::fmt::Display) -> StepOutcome {
    StepOutcome {
        label: label.to_string(),
        status: 0,
        passed: false,
        reason: Some(format!("lookup failed: {}", error)),
        body: None,
    }
}

/// Process exit status for a finished run.
///
/// 0 once the sequence completes, whatever the checks said, unless
/// `fail_on_error` is set and a check failed (2). Configuration and setup
/// errors are 1.
pub fn exit_code(result: &Result<RunReport>, fail_on_error: bool) -> u8 {
    match result {
        Ok(report) if fail_on_error && !report.all_passed() => 2,
        Ok(_) => 0,
        Err(_) => 1,
    }
}

/// Listing path for `resource`, optionally filtered to one owner.
pub fn list_path(resource: Resource, owner_id: Option<&str>) -> String {
    let mut path = format!("{}?select={}", resource.as_ref(), resource.select_columns());
    if let Some(owner_id) = owner_id {
        path.push_str(&format!("&user_id=eq.{}", urlencoding::encode(owner_id)));
    }
    path
}
