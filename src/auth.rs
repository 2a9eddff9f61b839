//! Client for the auth API.
//!
//! Admin calls (create, delete, lookup) authenticate with the service-role
//! key. Password sign-in uses the anon key, like any end-user client.

use reqwest::{Client, RequestBuilder, StatusCode};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    AuthUser, AuthenticatedIdentity, CreateAuthUser, PasswordCredentials, SignInResponse,
    TestIdentity,
};
use crate::util::{extract_error_message, generate_credentials};

#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
    email_domain: String,
}

impl AuthClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.auth_url(""),
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
            email_domain: config.email_domain.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_key(builder: RequestBuilder, key: &str) -> RequestBuilder {
        builder
            .header("apikey", key)
            .header("Authorization", format!("Bearer {}", key))
    }

    fn admin(&self, builder: RequestBuilder) -> RequestBuilder {
        Self::with_key(builder, &self.service_role_key)
    }

    /// Provision a pre-confirmed user with random credentials.
    pub async fn create_user(&self, label: &str) -> Result<TestIdentity> {
        let (email, password) = generate_credentials(label, &self.email_domain);

        let response = self
            .admin(self.client.post(self.url("admin/users")))
            .json(&CreateAuthUser {
                email: &email,
                password: &password,
                email_confirm: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::setup(format!(
                "Failed to create user {}: {}",
                label,
                extract_error_message(&body)
            )));
        }

        let user: AuthUser = response.json().await.map_err(|e| {
            AppError::setup(format!("Failed to create user {}: {}", label, e))
        })?;

        tracing::info!(label, user_id = %user.id, "Provisioned test user");

        Ok(TestIdentity {
            label: label.to_string(),
            email,
            password,
            user_id: user.id,
        })
    }

    /// Sign in with email and password, returning the identity with its session.
    pub async fn sign_in(&self, identity: &TestIdentity) -> Result<AuthenticatedIdentity> {
        let response = Self::with_key(
            self.client.post(self.url("token?grant_type=password")),
            &self.anon_key,
        )
        .json(&PasswordCredentials {
            email: &identity.email,
            password: &identity.password,
        })
        .send()
        .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::setup(format!(
                "Sign-in failed for {}: {}",
                identity.email,
                extract_error_message(&body)
            )));
        }

        let signed_in: SignInResponse = response.json().await.map_err(|e| {
            AppError::setup(format!("Sign-in failed for {}: {}", identity.email, e))
        })?;

        if signed_in.session.access_token.is_empty() {
            return Err(AppError::setup(format!(
                "Sign-in failed for {}: empty access token",
                identity.email
            )));
        }

        let mut identity = identity.clone();
        identity.user_id = signed_in.user.id;

        Ok(AuthenticatedIdentity {
            identity,
            session: signed_in.session,
        })
    }

    /// Delete a user. Returns the HTTP status; callers treat this as best effort.
    pub async fn delete_user(&self, user_id: &str) -> Result<u16> {
        let response = self
            .admin(self.client.delete(self.url(&format!("admin/users/{}", user_id))))
            .send()
            .await?;

        Ok(response.status().as_u16())
    }

    /// Look a user up by id. `None` when the auth API no longer knows it.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<AuthUser>> {
        let response = self
            .admin(self.client.get(self.url(&format!("admin/users/{}", user_id))))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AppError::Api {
                    context: format!("User lookup for {}", user_id),
                    status: status.as_u16(),
                    message: extract_error_message(&body),
                })
            }
        }
    }
}
