use crate::backend::Backend;
use crate::error::BackendError;
use aws_sdk_dynamodb::model::{AttributeDefinition, AttributeValue, KeySchemaElement, KeyType, ScalarAttributeType};
use aws_sdk_dynamodb::{Client, Endpoint};
use bucket::Bucket;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct DynamoBackendConfig {
    pub table_name: String,
    pub region: String,
    pub endpoint_url: Option<String>,
    /// When true, points the client at a local DynamoDB instance (`endpoint_url`)
    /// and creates the table on first use instead of assuming it already exists.
    pub local: bool,
}

impl Default for DynamoBackendConfig {
    fn default() -> Self {
        DynamoBackendConfig {
            table_name: "data_table".to_string(),
            region: "us-east-1".to_string(),
            endpoint_url: Some("http://localhost:8000".to_string()),
            local: true,
        }
    }
}

const ATTR_KEY: &str = "key";
const ATTR_RANGE_KEY: &str = "range_key";
const ATTR_DATA: &str = "data";

/// Table `stss_<name>`: hash key `key` (S), range key `range_key` (N),
/// attribute `data` = raw bucket bytes (binary, not hex - unlike the
/// file/Redis JSON records).
///
/// The DynamoDB SDK is async; this is the one place in the workspace that
/// owns a `tokio` runtime, so the rest of the crate can stay synchronous
/// like the other two backends.
pub struct DynamoBackend {
    config: DynamoBackendConfig,
    rt: tokio::runtime::Runtime,
    client: Client,
    table_name: String,
}

impl DynamoBackend {
    pub fn new(config: DynamoBackendConfig) -> Result<Self, BackendError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| BackendError::Dynamo(e.to_string()))?;
        let table_name = format!("stss_{}", config.table_name);
        let client = rt.block_on(Self::build_client(&config))?;
        let backend = DynamoBackend { config, rt, client, table_name };
        if backend.config.local {
            backend.ensure_table()?;
        }
        Ok(backend)
    }

    async fn build_client(config: &DynamoBackendConfig) -> Result<Client, BackendError> {
        let mut loader = aws_config::from_env().region(aws_config::meta::region::RegionProviderChain::first_try(
            aws_sdk_dynamodb::Region::new(config.region.clone()),
        ));
        if let Some(url) = &config.endpoint_url {
            let mut dynamo_config = aws_sdk_dynamodb::config::Builder::from(&loader.load().await);
            let uri = url
                .parse()
                .map_err(|e| BackendError::Dynamo(format!("invalid endpoint url {}: {}", url, e)))?;
            dynamo_config = dynamo_config.endpoint_resolver(Endpoint::immutable(uri));
            return Ok(Client::from_conf(dynamo_config.build()));
        }
        Ok(Client::new(&loader.load().await))
    }

    /// Creates the table if it's missing. Mirrors `DynamoStorage._createTable`,
    /// which only runs against a local/dev endpoint.
    fn ensure_table(&self) -> Result<(), BackendError> {
        self.rt.block_on(async {
            let existing = self.client.list_tables().send().await.map_err(|e| BackendError::Dynamo(e.to_string()))?;
            if existing.table_names().unwrap_or_default().iter().any(|n| n == &self.table_name) {
                return Ok(());
            }
            tracing::warn!(table = %self.table_name, "creating dynamo table");
            self.client
                .create_table()
                .table_name(&self.table_name)
                .key_schema(
                    KeySchemaElement::builder()
                        .attribute_name(ATTR_KEY)
                        .key_type(KeyType::Hash)
                        .build(),
                )
                .key_schema(
                    KeySchemaElement::builder()
                        .attribute_name(ATTR_RANGE_KEY)
                        .key_type(KeyType::Range)
                        .build(),
                )
                .attribute_definitions(
                    AttributeDefinition::builder()
                        .attribute_name(ATTR_KEY)
                        .attribute_type(ScalarAttributeType::S)
                        .build(),
                )
                .attribute_definitions(
                    AttributeDefinition::builder()
                        .attribute_name(ATTR_RANGE_KEY)
                        .attribute_type(ScalarAttributeType::N)
                        .build(),
                )
                .billing_mode(aws_sdk_dynamodb::model::BillingMode::PayPerRequest)
                .send()
                .await
                .map_err(|e| BackendError::Dynamo(e.to_string()))?;
            Ok(())
        })
    }

    fn item_to_bucket(key: &str, item: &HashMap<String, AttributeValue>) -> Result<Bucket, BackendError> {
        let data = item
            .get(ATTR_DATA)
            .and_then(|v| v.as_b().ok())
            .ok_or_else(|| BackendError::Encoding("missing data attribute".to_string()))?;
        Ok(Bucket::from_bytes(key, data.as_ref())?)
    }

    fn bucket_item(bucket: &Bucket) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert(ATTR_KEY.to_string(), AttributeValue::S(bucket.key().to_string()));
        item.insert(ATTR_RANGE_KEY.to_string(), AttributeValue::N(bucket.range_key().to_string()));
        item.insert(
            ATTR_DATA.to_string(),
            AttributeValue::B(aws_sdk_dynamodb::types::Blob::new(bucket.to_bytes())),
        );
        item
    }

    fn put(&self, bucket: &Bucket, conditional: bool) -> Result<(), BackendError> {
        self.rt.block_on(async {
            let mut request = self
                .client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(Self::bucket_item(bucket)));
            if conditional {
                request = request
                    .condition_expression("attribute_not_exists(#k)")
                    .expression_attribute_names("#k", ATTR_KEY);
            }
            match request.send().await {
                Ok(_) => Ok(()),
                Err(err) => {
                    if conditional && err.to_string().contains("ConditionalCheckFailed") {
                        Err(BackendError::Conflict {
                            key: bucket.key().to_string(),
                            range_key: bucket.range_key(),
                        })
                    } else {
                        Err(BackendError::Dynamo(err.to_string()))
                    }
                }
            }
        })
    }

    fn query_items(
        &self,
        key: &str,
        condition: &str,
        values: Vec<(&str, AttributeValue)>,
        scan_forward: bool,
        limit: Option<i32>,
    ) -> Result<Vec<Bucket>, BackendError> {
        self.rt.block_on(async {
            let mut request = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression(condition)
                .expression_attribute_names("#k", ATTR_KEY)
                .expression_attribute_values(":key", AttributeValue::S(key.to_string()))
                .scan_index_forward(scan_forward);
            for (name, value) in values {
                request = request.expression_attribute_values(name, value);
            }
            if let Some(limit) = limit {
                request = request.limit(limit);
            }
            let response = request.send().await.map_err(|e| BackendError::Dynamo(e.to_string()))?;
            response
                .items()
                .unwrap_or_default()
                .iter()
                .map(|item| Self::item_to_bucket(key, item))
                .collect()
        })
    }
}

impl Backend for DynamoBackend {
    fn get(&self, key: &str, range_key: u32) -> Result<Bucket, BackendError> {
        let buckets = self.query_items(
            key,
            "#k = :key AND range_key = :rk",
            vec![(":rk", AttributeValue::N(range_key.to_string()))],
            true,
            Some(1),
        )?;
        buckets
            .into_iter()
            .next()
            .ok_or(BackendError::NotFound { key: key.to_string(), range_key: Some(range_key) })
    }

    fn insert(&self, bucket: &Bucket) -> Result<(), BackendError> {
        self.put(bucket, true)
    }

    /// Reuses the conditionless `put_item` path - matching this spec's
    /// unification of the source's mismatched `_update` arity with `_insert`.
    fn update(&self, bucket: &Bucket) -> Result<(), BackendError> {
        self.put(bucket, false)
    }

    fn query(&self, key: &str, range_min: u32, range_max: u32) -> Result<Vec<Bucket>, BackendError> {
        let mut in_range = self.query_items(
            key,
            "#k = :key AND range_key BETWEEN :rmin AND :rmax",
            vec![
                (":rmin", AttributeValue::N(range_min.to_string())),
                (":rmax", AttributeValue::N(range_max.to_string())),
            ],
            true,
            None,
        )?;
        let left = self.query_items(
            key,
            "#k = :key AND range_key < :rmin",
            vec![(":rmin", AttributeValue::N(range_min.to_string()))],
            false,
            Some(1),
        )?;
        let mut result = left;
        result.append(&mut in_range);
        Ok(result)
    }

    fn first(&self, key: &str, n: usize) -> Result<Vec<Bucket>, BackendError> {
        let buckets = self.query_items(key, "#k = :key", vec![], true, Some(n as i32))?;
        if buckets.is_empty() {
            return Err(BackendError::NotFound { key: key.to_string(), range_key: None });
        }
        Ok(buckets)
    }

    fn last(&self, key: &str, n: usize) -> Result<Vec<Bucket>, BackendError> {
        let buckets = self.query_items(key, "#k = :key", vec![], false, Some(n as i32))?;
        if buckets.is_empty() {
            return Err(BackendError::NotFound { key: key.to_string(), range_key: None });
        }
        Ok(buckets)
    }

    fn left(&self, key: &str, range_key: u32, n: usize) -> Result<Vec<Bucket>, BackendError> {
        let buckets = self.query_items(
            key,
            "#k = :key AND range_key <= :rk",
            vec![(":rk", AttributeValue::N(range_key.to_string()))],
            false,
            Some(n as i32),
        )?;
        if buckets.is_empty() {
            return Err(BackendError::NotFound { key: key.to_string(), range_key: Some(range_key) });
        }
        Ok(buckets)
    }

    fn range(&self, key: &str) -> Result<Option<(u32, u32)>, BackendError> {
        match (self.first(key, 1), self.last(key, 1)) {
            (Ok(first), Ok(last)) => match (first[0].ts_min(), last[0].ts_max()) {
                (Some(a), Some(b)) => Ok(Some((a, b))),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    fn count(&self, key: &str) -> Result<usize, BackendError> {
        let buckets = self.query_items(key, "#k = :key", vec![], true, None)?;
        Ok(buckets.iter().map(Bucket::len).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bucket::BucketType;
    use columns::{Value, ValueType};

    #[test]
    fn test_bucket_item_round_trip() {
        let mut bucket = Bucket::new("cpu", ValueType::RawFloat, BucketType::Dynamic, 0).unwrap();
        bucket.insert_point(1, Value::Float(1.5), false).unwrap();
        let item = DynamoBackend::bucket_item(&bucket);
        let decoded = DynamoBackend::item_to_bucket("cpu", &item).unwrap();
        assert_eq!(decoded, bucket);
    }

    #[test]
    fn test_table_name_prefixed_with_stss() {
        let config = DynamoBackendConfig { table_name: "metrics".to_string(), ..Default::default() };
        assert_eq!(format!("stss_{}", config.table_name), "stss_metrics");
    }

    #[test]
    fn test_default_config_matches_source_defaults() {
        let config = DynamoBackendConfig::default();
        assert_eq!(config.table_name, "data_table");
        assert!(config.local);
    }
}
