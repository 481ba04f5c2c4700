//! AppSync GraphQL API provisioning facade.

use std::collections::HashMap;
use std::time::Duration;

use aws_sdk_appsync::Client;
use aws_sdk_appsync::operation::create_api_key::CreateApiKeyOutput;
use aws_sdk_appsync::operation::create_graphql_api::CreateGraphqlApiOutput;
use aws_sdk_appsync::operation::delete_api_key::DeleteApiKeyOutput;
use aws_sdk_appsync::operation::delete_graphql_api::DeleteGraphqlApiOutput;
use aws_sdk_appsync::operation::get_graphql_api::GetGraphqlApiOutput;
use aws_sdk_appsync::operation::get_schema_creation_status::GetSchemaCreationStatusOutput;
use aws_sdk_appsync::operation::list_graphql_apis::ListGraphqlApisOutput;
use aws_sdk_appsync::operation::start_schema_creation::StartSchemaCreationOutput;
use aws_sdk_appsync::operation::update_graphql_api::UpdateGraphqlApiOutput;
use aws_sdk_appsync::primitives::Blob;
use aws_sdk_appsync::types::{
    AdditionalAuthenticationProvider, AuthenticationType, EnhancedMetricsConfig,
    GraphQlApiIntrospectionConfig, GraphQlApiType, GraphQlApiVisibility, LambdaAuthorizerConfig,
    LogConfig, OpenIdConnectConfig, SchemaStatus, UserPoolConfig,
};
use nimbus_config::ConfigService;
use tracing::{debug, info};

use crate::{AwsConfig, AwsError, Result};

const SERVICE: &str = "appsync";

/// Optional settings of a GraphQL API. Unset fields are left out of the
/// request.
#[derive(Debug, Clone, Default)]
pub struct GraphqlApiOptions {
    /// Only used by updates; creation takes it as an argument.
    pub authentication_type: Option<AuthenticationType>,
    pub additional_authentication_providers: Option<Vec<AdditionalAuthenticationProvider>>,
    pub user_pool_config: Option<UserPoolConfig>,
    pub open_id_connect_config: Option<OpenIdConnectConfig>,
    pub lambda_authorizer_config: Option<LambdaAuthorizerConfig>,
    pub log_config: Option<LogConfig>,
    pub xray_enabled: Option<bool>,
    pub introspection_config: Option<GraphQlApiIntrospectionConfig>,
    /// Maximum depth of a query, 1 to 75.
    pub query_depth_limit: Option<i32>,
    /// Maximum resolvers per request, 1 to 10000.
    pub resolver_count_limit: Option<i32>,
    pub owner_contact: Option<String>,
    pub merged_api_execution_role_arn: Option<String>,
    pub enhanced_metrics_config: Option<EnhancedMetricsConfig>,
    /// Only used by creation.
    pub api_type: Option<GraphQlApiType>,
    /// Only used by creation.
    pub visibility: Option<GraphQlApiVisibility>,
    /// Only used by creation.
    pub tags: Option<HashMap<String, String>>,
}

/// AppSync facade.
#[derive(Debug, Clone)]
pub struct AppSyncService {
    client: Client,
}

impl AppSyncService {
    /// Build the client from configuration.
    pub fn new(config: &ConfigService) -> Result<Self> {
        let sdk_config = AwsConfig::from_config(config)?.sdk_config()?;
        let client = Client::new(&sdk_config);

        info!(region = ?sdk_config.region(), "AppSync client initialized");
        Ok(Self { client })
    }

    /// Create from an existing AWS SDK client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Underlying SDK client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn create_graphql_api(
        &self,
        name: &str,
        authentication_type: AuthenticationType,
        options: GraphqlApiOptions,
    ) -> Result<CreateGraphqlApiOutput> {
        debug!(name, ?authentication_type, "AppSync CreateGraphqlApi");

        self.client
            .create_graphql_api()
            .name(name)
            .authentication_type(authentication_type)
            .set_additional_authentication_providers(options.additional_authentication_providers)
            .set_user_pool_config(options.user_pool_config)
            .set_open_id_connect_config(options.open_id_connect_config)
            .set_lambda_authorizer_config(options.lambda_authorizer_config)
            .set_log_config(options.log_config)
            .set_xray_enabled(options.xray_enabled)
            .set_introspection_config(options.introspection_config)
            .set_query_depth_limit(options.query_depth_limit)
            .set_resolver_count_limit(options.resolver_count_limit)
            .set_owner_contact(options.owner_contact)
            .set_merged_api_execution_role_arn(options.merged_api_execution_role_arn)
            .set_enhanced_metrics_config(options.enhanced_metrics_config)
            .set_api_type(options.api_type)
            .set_visibility(options.visibility)
            .set_tags(options.tags)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "CreateGraphqlApi"))
    }

    pub async fn get_graphql_api(&self, api_id: &str) -> Result<GetGraphqlApiOutput> {
        debug!(api_id, "AppSync GetGraphqlApi");

        self.client
            .get_graphql_api()
            .api_id(api_id)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "GetGraphqlApi"))
    }

    /// Rename an API and change the settings given in `options`.
    pub async fn update_graphql_api(
        &self,
        api_id: &str,
        name: &str,
        options: GraphqlApiOptions,
    ) -> Result<UpdateGraphqlApiOutput> {
        debug!(api_id, name, "AppSync UpdateGraphqlApi");

        self.client
            .update_graphql_api()
            .api_id(api_id)
            .name(name)
            .set_authentication_type(options.authentication_type)
            .set_additional_authentication_providers(options.additional_authentication_providers)
            .set_user_pool_config(options.user_pool_config)
            .set_open_id_connect_config(options.open_id_connect_config)
            .set_lambda_authorizer_config(options.lambda_authorizer_config)
            .set_log_config(options.log_config)
            .set_xray_enabled(options.xray_enabled)
            .set_introspection_config(options.introspection_config)
            .set_query_depth_limit(options.query_depth_limit)
            .set_resolver_count_limit(options.resolver_count_limit)
            .set_owner_contact(options.owner_contact)
            .set_merged_api_execution_role_arn(options.merged_api_execution_role_arn)
            .set_enhanced_metrics_config(options.enhanced_metrics_config)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "UpdateGraphqlApi"))
    }

    pub async fn delete_graphql_api(&self, api_id: &str) -> Result<DeleteGraphqlApiOutput> {
        debug!(api_id, "AppSync DeleteGraphqlApi");

        self.client
            .delete_graphql_api()
            .api_id(api_id)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "DeleteGraphqlApi"))
    }

    /// One page of the account's GraphQL APIs.
    pub async fn list_graphql_apis(
        &self,
        next_token: Option<String>,
        max_results: Option<i32>,
    ) -> Result<ListGraphqlApisOutput> {
        debug!(?max_results, "AppSync ListGraphqlApis");

        self.client
            .list_graphql_apis()
            .set_next_token(next_token)
            .set_max_results(max_results)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "ListGraphqlApis"))
    }

    /// Upload a schema definition (SDL). Creation runs asynchronously on the
    /// service; see [`AppSyncService::wait_for_schema_creation`].
    pub async fn start_schema_creation(
        &self,
        api_id: &str,
        definition: impl Into<Vec<u8>>,
    ) -> Result<StartSchemaCreationOutput> {
        let definition = definition.into();
        debug!(api_id, size = definition.len(), "AppSync StartSchemaCreation");

        self.client
            .start_schema_creation()
            .api_id(api_id)
            .definition(Blob::new(definition))
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "StartSchemaCreation"))
    }

    pub async fn get_schema_creation_status(
        &self,
        api_id: &str,
    ) -> Result<GetSchemaCreationStatusOutput> {
        debug!(api_id, "AppSync GetSchemaCreationStatus");

        self.client
            .get_schema_creation_status()
            .api_id(api_id)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "GetSchemaCreationStatus"))
    }

    /// Poll the schema creation status until it settles.
    ///
    /// Returns the first status that is neither `PROCESSING` nor `DELETING`,
    /// or the last one seen after `max_attempts` polls. Faults are returned
    /// on first occurrence.
    pub async fn wait_for_schema_creation(
        &self,
        api_id: &str,
        poll_interval: Duration,
        max_attempts: u32,
    ) -> Result<GetSchemaCreationStatusOutput> {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let output = self.get_schema_creation_status(api_id).await?;
            if !is_pending(output.status()) || attempt >= max_attempts {
                return Ok(output);
            }

            debug!(api_id, attempt, status = ?output.status(), "Schema creation pending");
            attempt += 1;
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Create an API key. `expires` is a Unix timestamp in seconds.
    pub async fn create_api_key(
        &self,
        api_id: &str,
        description: Option<&str>,
        expires: Option<i64>,
    ) -> Result<CreateApiKeyOutput> {
        debug!(api_id, ?expires, "AppSync CreateApiKey");

        self.client
            .create_api_key()
            .api_id(api_id)
            .set_description(description.map(str::to_string))
            .set_expires(expires)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "CreateApiKey"))
    }

    pub async fn delete_api_key(&self, api_id: &str, id: &str) -> Result<DeleteApiKeyOutput> {
        debug!(api_id, "AppSync DeleteApiKey");

        self.client
            .delete_api_key()
            .api_id(api_id)
            .id(id)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "DeleteApiKey"))
    }
}

fn is_pending(status: Option<&SchemaStatus>) -> bool {
    matches!(
        status,
        Some(SchemaStatus::Processing) | Some(SchemaStatus::Deleting)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pending() {
        assert!(is_pending(Some(&SchemaStatus::Processing)));
        assert!(is_pending(Some(&SchemaStatus::Deleting)));
        assert!(!is_pending(Some(&SchemaStatus::Success)));
        assert!(!is_pending(Some(&SchemaStatus::Active)));
        assert!(!is_pending(Some(&SchemaStatus::Failed)));
        assert!(!is_pending(None));
    }
}
