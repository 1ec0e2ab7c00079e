use crate::error::LockError;
use crate::lock::{LockProvider, DEFAULT_LEASE_TABLE};

use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{
  AttributeDefinition, AttributeValue, KeySchemaElement, KeyType, ProvisionedThroughput,
  ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

/// Connection surface for the DynamoDB-backed lease table.
///
/// Leave the credential fields empty to use the shared AWS profile
/// (`~/.aws/credentials`, environment, instance role); set them together
/// with `endpoint` to talk to a local or non-AWS deployment.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DynamoLockConfig {
  pub region: Option<String>,
  pub endpoint: Option<String>,
  pub access_key_id: Option<String>,
  pub secret_access_key: Option<String>,
  pub session_token: Option<String>,
  /// Coordination table, provisioned on first use if missing.
  pub table: String,
}

impl Default for DynamoLockConfig {
  fn default() -> Self {
    Self {
      region: None,
      endpoint: None,
      access_key_id: None,
      secret_access_key: None,
      session_token: None,
      table: DEFAULT_LEASE_TABLE.to_string(),
    }
  }
}

/// Lease backend against DynamoDB.
///
/// `acquire` is a conditional `PutItem` guarded by
/// `attribute_not_exists(id)`, the store's native insert-if-absent, so two
/// replicas can never both observe "absent" and both insert. A failed
/// condition check means another holder is active and maps to a denied
/// lease, not an error.
///
/// Leases here have no native expiry: a holder that crashes before releasing
/// strands its item until another process or an operator clears it. The
/// `created_at` and advisory `ttl_seconds` attributes are written so such
/// cleanup can tell stale items apart.
pub struct DynamoLock {
  config: DynamoLockConfig,
  holder: Uuid,
  client: Option<Client>,
}

impl DynamoLock {
  pub fn new(config: DynamoLockConfig) -> Self {
    Self {
      config,
      holder: Uuid::new_v4(),
      client: None,
    }
  }

  fn client(&self) -> Result<&Client, LockError> {
    self
      .client
      .as_ref()
      .ok_or_else(|| LockError::Connection("dynamodb client not prepared".to_string()))
  }

  /// Creates the coordination table if it does not exist yet. `ResourceInUse`
  /// from a concurrent or previous creation counts as success.
  async fn ensure_table(&self, client: &Client) -> Result<(), LockError> {
    let key_attribute = AttributeDefinition::builder()
      .attribute_name("id")
      .attribute_type(ScalarAttributeType::S)
      .build()
      .map_err(LockError::connection)?;
    let key_schema = KeySchemaElement::builder()
      .attribute_name("id")
      .key_type(KeyType::Hash)
      .build()
      .map_err(LockError::connection)?;
    let throughput = ProvisionedThroughput::builder()
      .read_capacity_units(10)
      .write_capacity_units(10)
      .build()
      .map_err(LockError::connection)?;

    let created = client
      .create_table()
      .table_name(&self.config.table)
      .attribute_definitions(key_attribute)
      .key_schema(key_schema)
      .provisioned_throughput(throughput)
      .send()
      .await;

    match created {
      Ok(_) => {
        info!(table = %self.config.table, "created dynamodb lease table");
        Ok(())
      }
      Err(err)
        if err
          .as_service_error()
          .is_some_and(|e| e.is_resource_in_use_exception()) =>
      {
        debug!(table = %self.config.table, "dynamodb lease table already exists");
        Ok(())
      }
      Err(err) => Err(LockError::connection(DisplayErrorContext(err))),
    }
  }
}

#[async_trait]
impl LockProvider for DynamoLock {
  async fn prepare(&mut self) -> Result<(), LockError> {
    if self.client.is_some() {
      return Ok(());
    }

    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &self.config.region {
      loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = &self.config.endpoint {
      loader = loader.endpoint_url(endpoint);
    }
    if let (Some(id), Some(secret)) = (&self.config.access_key_id, &self.config.secret_access_key)
    {
      loader = loader.credentials_provider(Credentials::new(
        id.clone(),
        secret.clone(),
        self.config.session_token.clone(),
        None,
        "tickfence-static",
      ));
    }
    let shared = loader.load().await;
    let client = Client::new(&shared);

    self.ensure_table(&client).await?;
    info!(holder = %self.holder, table = %self.config.table, "dynamodb lease table ready");
    self.client = Some(client);
    Ok(())
  }

  async fn acquire(&mut self, key: &str, ttl: Duration) -> Result<bool, LockError> {
    let client = self.client()?;
    let put = client
      .put_item()
      .table_name(&self.config.table)
      .item("id", AttributeValue::S(key.to_string()))
      .item("holder", AttributeValue::S(self.holder.to_string()))
      .item("created_at", AttributeValue::S(Utc::now().to_rfc3339()))
      .item("ttl_seconds", AttributeValue::N(ttl.as_secs().to_string()))
      .condition_expression("attribute_not_exists(id)")
      .send()
      .await;

    match put {
      Ok(_) => Ok(true),
      Err(err)
        if err
          .as_service_error()
          .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
      {
        Ok(false)
      }
      Err(err) => Err(LockError::backend(DisplayErrorContext(err))),
    }
  }

  async fn release(&mut self, key: &str) -> Result<(), LockError> {
    let client = self.client()?;
    client
      .delete_item()
      .table_name(&self.config.table)
      .key("id", AttributeValue::S(key.to_string()))
      .send()
      .await
      .map_err(|err| LockError::backend(DisplayErrorContext(err)))?;
    Ok(())
  }
}
