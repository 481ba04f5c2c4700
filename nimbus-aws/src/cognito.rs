//! Cognito user pool facade.
//!
//! Self-service calls (sign in/up, password reset) go through the app client;
//! `admin_*` calls and listing go through the user pool. Passwords, codes and
//! tokens are passed through untouched and never logged.

use aws_sdk_cognito_idp::Client;
use aws_sdk_cognito_idp::operation::admin_create_user::AdminCreateUserOutput;
use aws_sdk_cognito_idp::operation::admin_delete_user::AdminDeleteUserOutput;
use aws_sdk_cognito_idp::operation::admin_set_user_password::AdminSetUserPasswordOutput;
use aws_sdk_cognito_idp::operation::confirm_forgot_password::ConfirmForgotPasswordOutput;
use aws_sdk_cognito_idp::operation::confirm_sign_up::ConfirmSignUpOutput;
use aws_sdk_cognito_idp::operation::forgot_password::ForgotPasswordOutput;
use aws_sdk_cognito_idp::operation::get_user::GetUserOutput;
use aws_sdk_cognito_idp::operation::initiate_auth::InitiateAuthOutput;
use aws_sdk_cognito_idp::operation::list_users::ListUsersOutput;
use aws_sdk_cognito_idp::operation::sign_up::SignUpOutput;
use aws_sdk_cognito_idp::types::{AttributeType, AuthFlowType};
use nimbus_config::ConfigService;
use tracing::{debug, info};

use crate::{AwsConfig, AwsError, Result};

const SERVICE: &str = "cognito";

/// Configuration key holding the user pool id.
pub const USER_POOL_ID_KEY: &str = "AWS_COGNITO_USER_POOL_ID";
/// Configuration key holding the app client id.
pub const CLIENT_ID_KEY: &str = "AWS_COGNITO_CLIENT_ID";

/// Default page size for [`CognitoService::list_users`].
pub const DEFAULT_LIST_LIMIT: i32 = 10;

/// Cognito facade.
#[derive(Debug, Clone)]
pub struct CognitoService {
    client: Client,
    user_pool_id: String,
    client_id: String,
}

impl CognitoService {
    /// Build the client from configuration.
    pub fn new(config: &ConfigService) -> Result<Self> {
        let user_pool_id = config.require(USER_POOL_ID_KEY)?;
        let client_id = config.require(CLIENT_ID_KEY)?;
        let sdk_config = AwsConfig::from_config(config)?.sdk_config()?;
        let client = Client::new(&sdk_config);

        info!(user_pool_id = %user_pool_id, "Cognito client initialized");

        Ok(Self {
            client,
            user_pool_id,
            client_id,
        })
    }

    /// Create from an existing AWS SDK client.
    pub fn from_client(
        client: Client,
        user_pool_id: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            user_pool_id: user_pool_id.into(),
            client_id: client_id.into(),
        }
    }

    /// Underlying SDK client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn user_pool_id(&self) -> &str {
        &self.user_pool_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Authenticate with username and password (`USER_PASSWORD_AUTH`).
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<InitiateAuthOutput> {
        debug!(username, "Cognito InitiateAuth");

        self.client
            .initiate_auth()
            .auth_flow(AuthFlowType::UserPasswordAuth)
            .client_id(&self.client_id)
            .auth_parameters("USERNAME", username)
            .auth_parameters("PASSWORD", password)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "InitiateAuth"))
    }

    /// Register a user with an email and, optionally, a phone number.
    pub async fn sign_up(
        &self,
        username: &str,
        password: &str,
        email: &str,
        phone_number: Option<&str>,
    ) -> Result<SignUpOutput> {
        debug!(username, "Cognito SignUp");

        self.client
            .sign_up()
            .client_id(&self.client_id)
            .username(username)
            .password(password)
            .set_user_attributes(Some(sign_up_attributes(email, phone_number)?))
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "SignUp"))
    }

    pub async fn confirm_sign_up(&self, username: &str, code: &str) -> Result<ConfirmSignUpOutput> {
        debug!(username, "Cognito ConfirmSignUp");

        self.client
            .confirm_sign_up()
            .client_id(&self.client_id)
            .username(username)
            .confirmation_code(code)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "ConfirmSignUp"))
    }

    /// Ask the service to send a password reset code.
    pub async fn forgot_password(&self, username: &str) -> Result<ForgotPasswordOutput> {
        debug!(username, "Cognito ForgotPassword");

        self.client
            .forgot_password()
            .client_id(&self.client_id)
            .username(username)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "ForgotPassword"))
    }

    pub async fn confirm_forgot_password(
        &self,
        username: &str,
        code: &str,
        new_password: &str,
    ) -> Result<ConfirmForgotPasswordOutput> {
        debug!(username, "Cognito ConfirmForgotPassword");

        self.client
            .confirm_forgot_password()
            .client_id(&self.client_id)
            .username(username)
            .confirmation_code(code)
            .password(new_password)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "ConfirmForgotPassword"))
    }

    /// Profile of the user owning `access_token`.
    pub async fn get_user(&self, access_token: &str) -> Result<GetUserOutput> {
        debug!("Cognito GetUser");

        self.client
            .get_user()
            .access_token(access_token)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "GetUser"))
    }

    /// Create a user with a temporary password and a verified email.
    pub async fn admin_create_user(
        &self,
        username: &str,
        email: &str,
        temporary_password: &str,
    ) -> Result<AdminCreateUserOutput> {
        debug!(username, user_pool_id = %self.user_pool_id, "Cognito AdminCreateUser");

        self.client
            .admin_create_user()
            .user_pool_id(&self.user_pool_id)
            .username(username)
            .temporary_password(temporary_password)
            .set_user_attributes(Some(admin_create_attributes(email)?))
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "AdminCreateUser"))
    }

    /// Set a user's password; `permanent = false` forces a change at next sign in.
    pub async fn admin_set_user_password(
        &self,
        username: &str,
        password: &str,
        permanent: bool,
    ) -> Result<AdminSetUserPasswordOutput> {
        debug!(username, permanent, "Cognito AdminSetUserPassword");

        self.client
            .admin_set_user_password()
            .user_pool_id(&self.user_pool_id)
            .username(username)
            .password(password)
            .permanent(permanent)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "AdminSetUserPassword"))
    }

    pub async fn admin_delete_user(&self, username: &str) -> Result<AdminDeleteUserOutput> {
        debug!(username, user_pool_id = %self.user_pool_id, "Cognito AdminDeleteUser");

        self.client
            .admin_delete_user()
            .user_pool_id(&self.user_pool_id)
            .username(username)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "AdminDeleteUser"))
    }

    /// One page of the pool's users; `limit` defaults to [`DEFAULT_LIST_LIMIT`].
    pub async fn list_users(
        &self,
        limit: Option<i32>,
        pagination_token: Option<String>,
    ) -> Result<ListUsersOutput> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
        debug!(limit, user_pool_id = %self.user_pool_id, "Cognito ListUsers");

        self.client
            .list_users()
            .user_pool_id(&self.user_pool_id)
            .limit(limit)
            .set_pagination_token(pagination_token)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "ListUsers"))
    }
}

fn attribute(name: &str, value: &str) -> Result<AttributeType> {
    AttributeType::builder()
        .name(name)
        .value(value)
        .build()
        .map_err(AwsError::invalid_request)
}

fn sign_up_attributes(email: &str, phone_number: Option<&str>) -> Result<Vec<AttributeType>> {
    let mut attributes = vec![attribute("email", email)?];
    if let Some(phone) = phone_number {
        attributes.push(attribute("phone_number", phone)?);
    }
    Ok(attributes)
}

fn admin_create_attributes(email: &str) -> Result<Vec<AttributeType>> {
    Ok(vec![attribute("email", email)?, attribute("email_verified", "true")?])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(attributes: &[AttributeType]) -> Vec<(&str, Option<&str>)> {
        attributes.iter().map(|a| (a.name(), a.value())).collect()
    }

    #[test]
    fn test_sign_up_attributes() {
        let attributes = sign_up_attributes("ana@example.com", None).unwrap();
        assert_eq!(pairs(&attributes), vec![("email", Some("ana@example.com"))]);

        let attributes = sign_up_attributes("ana@example.com", Some("+59899000000")).unwrap();
        assert_eq!(
            pairs(&attributes),
            vec![
                ("email", Some("ana@example.com")),
                ("phone_number", Some("+59899000000")),
            ]
        );
    }

    #[test]
    fn test_admin_create_attributes_mark_email_verified() {
        let attributes = admin_create_attributes("bo@example.com").unwrap();
        assert_eq!(
            pairs(&attributes),
            vec![
                ("email", Some("bo@example.com")),
                ("email_verified", Some("true")),
            ]
        );
    }

    #[test]
    fn test_missing_client_id_fails_construction() {
        let config = ConfigService::builder()
            .set("AWS_REGION", "us-east-1")
            .set("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE")
            .set("AWS_SECRET_ACCESS_KEY", "secret")
            .set(USER_POOL_ID_KEY, "us-east-1_abc")
            .build()
            .unwrap();

        let err = CognitoService::new(&config).unwrap_err();
        assert!(err.to_string().contains(CLIENT_ID_KEY));
    }
}
