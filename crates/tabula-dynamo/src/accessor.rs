use crate::{
    expr::compile_filter,
    transport::DynamoTransport,
    wire::{
        AttrValue, Item, ItemOp, ItemRequest, KeyCondition, QueryRequest, item_from_row,
        row_from_item,
    },
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tabula_core::{
    accessor::{Accessor, ListOptions, ListPage},
    cursor::Cursor,
    error::{AccessorError, Operation},
    record::{Record, Row},
    schema::Schema,
    sort::{SortError, single_sort_key},
};
use tracing::{debug, trace};

/// Placeholder prefix for the one filter expression a list call compiles.
const FILTER_PREFIX: &str = "v";

///
/// TableConfig
/// The table and its two key attributes. Key attributes live outside
/// the schema: rows never carry them, the accessor does.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableConfig {
    pub name: String,
    pub partition_key: String,
    pub range_key: String,
}

impl TableConfig {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        partition_key: impl Into<String>,
        range_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            partition_key: partition_key.into(),
            range_key: range_key.into(),
        }
    }
}

///
/// DynamoAccessor
/// Record access over one partition of one table. The record key is the
/// range key attribute; every operation stays inside the configured
/// partition.
///
/// `add` is refused: this backend cannot create a record without a
/// caller-chosen key.
///

pub struct DynamoAccessor<T> {
    table: TableConfig,
    partition: String,
    schema: Schema,
    transport: T,
}

impl<T> DynamoAccessor<T> {
    pub const fn new(table: TableConfig, partition: String, schema: Schema, transport: T) -> Self {
        Self {
            table,
            partition,
            schema,
            transport,
        }
    }

    #[must_use]
    pub const fn table(&self) -> &TableConfig {
        &self.table
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Composite key item addressing `key` inside the partition.
    fn key_item(&self, key: &str) -> Item {
        Item::from([
            (
                self.table.partition_key.clone(),
                AttrValue::S(self.partition.clone()),
            ),
            (self.table.range_key.clone(), AttrValue::S(key.to_owned())),
        ])
    }

    fn record_from_item(&self, item: &Item) -> Record<()> {
        Record::new(row_from_item(&self.schema, item), ())
    }
}

impl<T: DynamoTransport> DynamoAccessor<T> {
    async fn send_item(
        &self,
        operation: Operation,
        request: ItemRequest,
    ) -> Result<Option<Item>, AccessorError> {
        let response = self
            .transport
            .item(request)
            .await
            .map_err(|source| AccessorError::Transport { operation, source })?;

        AccessorError::check_status(operation, response.status)?;

        Ok(response.item)
    }
}

#[async_trait]
impl<T: DynamoTransport> Accessor for DynamoAccessor<T> {
    type Meta = ();

    async fn get(&self, key: &str) -> Result<Option<Record<()>>, AccessorError> {
        debug!(table = %self.table.name, key, "get");

        let request = ItemRequest {
            table: self.table.name.clone(),
            key: self.key_item(key),
            op: ItemOp::Get,
        };

        let item = self.send_item(Operation::Get, request).await?;
        Ok(item.map(|item| self.record_from_item(&item)))
    }

    async fn set(&self, key: &str, row: Row) -> Result<(), AccessorError> {
        debug!(table = %self.table.name, key, "set");
        self.schema.check_row(&row)?;

        let request = ItemRequest {
            table: self.table.name.clone(),
            key: self.key_item(key),
            op: ItemOp::Put(item_from_row(&row)),
        };

        self.send_item(Operation::Set, request).await?;
        Ok(())
    }

    async fn add(&self, _row: Row) -> Result<(), AccessorError> {
        Err(AccessorError::Unsupported {
            operation: Operation::Add,
            reason: "a record cannot be created without a key",
        })
    }

    async fn update(&self, key: &str, patch: Row) -> Result<(), AccessorError> {
        debug!(table = %self.table.name, key, "update");
        self.schema.check_row(&patch)?;

        // Merging into nothing would silently create a record, so the
        // target is read first and a miss is reported as such.
        let probe = ItemRequest {
            table: self.table.name.clone(),
            key: self.key_item(key),
            op: ItemOp::Get,
        };
        if self.send_item(Operation::Update, probe).await?.is_none() {
            return Err(AccessorError::NotFound {
                key: key.to_owned(),
            });
        }

        let request = ItemRequest {
            table: self.table.name.clone(),
            key: self.key_item(key),
            op: ItemOp::Merge(item_from_row(&patch)),
        };

        self.send_item(Operation::Update, request).await?;
        Ok(())
    }

    async fn list(&self, options: ListOptions) -> Result<ListPage<()>, AccessorError> {
        debug!(table = %self.table.name, "list");

        let sort = single_sort_key(&options.sort)?;
        if let Some(key) = sort {
            // Items in a partition are ordered by the range key and by
            // nothing else.
            if key.property != self.table.range_key {
                return Err(SortError::Unsortable {
                    property: key.property.clone(),
                }
                .into());
            }
        }

        let compiled = match &options.filter {
            Some(filter) => Some(compile_filter(&self.schema, filter, FILTER_PREFIX)?),
            None => None,
        };
        if let Some(compiled) = &compiled {
            trace!(expression = %compiled.expression, "compiled filter");
        }

        let exclusive_start_key = match options.cursor.map(Cursor::into_payload) {
            None | Some(None) => None,
            Some(Some(payload)) => Some(serde_json::from_value::<Item>(payload).map_err(
                |err| AccessorError::InvalidCursor {
                    reason: err.to_string(),
                },
            )?),
        };

        let request = QueryRequest {
            table: self.table.name.clone(),
            partition: KeyCondition {
                name: self.table.partition_key.clone(),
                value: AttrValue::S(self.partition.clone()),
            },
            filter_expression: compiled.as_ref().map(|c| c.expression.clone()),
            expression_names: compiled
                .as_ref()
                .map(|c| c.names.clone())
                .unwrap_or_default(),
            expression_values: compiled.map(|c| c.values).unwrap_or_default(),
            exclusive_start_key,
            scan_index_forward: sort.map(|key| key.direction.is_ascending()),
            limit: options.limit,
        };

        let response = self
            .transport
            .query(request)
            .await
            .map_err(|source| AccessorError::Transport {
                operation: Operation::List,
                source,
            })?;

        AccessorError::check_status(Operation::List, response.status)?;

        let items = response
            .items
            .iter()
            .map(|item| self.record_from_item(item))
            .collect();

        let payload = response
            .last_evaluated_key
            .map(serde_json::to_value)
            .transpose()
            .map_err(|err| AccessorError::InvalidCursor {
                reason: err.to_string(),
            })?;

        Ok(ListPage {
            items,
            cursor: Cursor::from_payload(payload),
        })
    }
}

///
/// TESTS
///
