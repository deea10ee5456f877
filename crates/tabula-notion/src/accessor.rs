use crate::{
    filter::compile_filter,
    schema::PropertySchema,
    transport::{
        CreatePageRequest, NotionTransport, Page, QueryDatabaseRequest, SortPayload,
        UpdatePageRequest,
    },
};
use async_trait::async_trait;
use serde_json::json;
use tabula_core::{
    accessor::{Accessor, ListOptions, ListPage},
    cursor::Cursor,
    error::{AccessorError, Operation},
    record::{Record, Row},
    schema::SchemaError,
    sort::{SortError, single_sort_key},
};
use tracing::{debug, trace};

///
/// PageMeta
/// Metadata attached to every record read back: the page's UUID, the
/// identity the backend actually addresses pages by.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageMeta {
    pub page_id: String,
}

///
/// NotionAccessor
/// Record access over one database. Records are keyed by the database's
/// `unique_id` property; the backend assigns it on creation, so `add` is
/// the only way in and `set` is refused.
///

pub struct NotionAccessor<T> {
    database_id: String,
    properties: PropertySchema,
    transport: T,
}

impl<T> NotionAccessor<T> {
    pub const fn new(database_id: String, properties: PropertySchema, transport: T) -> Self {
        Self {
            database_id,
            properties,
            transport,
        }
    }

    #[must_use]
    pub const fn properties(&self) -> &PropertySchema {
        &self.properties
    }

    fn key_property(&self, operation: Operation) -> Result<&str, AccessorError> {
        self.properties
            .key_property()
            .ok_or(AccessorError::Unsupported {
                operation,
                reason: "the database declares no unique_id property",
            })
    }

    fn page_to_record(&self, page: &Page) -> Record<PageMeta> {
        let row = self
            .properties
            .entries()
            .iter()
            .filter_map(|(name, kind)| {
                let property = page.properties.get(name)?;
                let value = kind.extract(property)?;
                Some((name.clone(), value))
            })
            .collect();

        Record::new(
            row,
            PageMeta {
                page_id: page.id.clone(),
            },
        )
    }

    fn write_payloads(
        &self,
        row: &Row,
    ) -> Result<serde_json::Map<String, serde_json::Value>, AccessorError> {
        let mut properties = serde_json::Map::new();
        for (name, value) in row.iter() {
            let kind = self.properties.kind(name).ok_or_else(|| {
                AccessorError::Schema(SchemaError::UnknownField { name: name.clone() })
            })?;

            let payload =
                kind.write_payload(value)
                    .map_err(|err| AccessorError::InvalidValue {
                        field: name.clone(),
                        reason: err.to_string(),
                    })?;

            properties.insert(
                name.clone(),
                json!({ "type": kind.as_str(), (kind.as_str()): payload }),
            );
        }

        Ok(properties)
    }
}

impl<T: NotionTransport> NotionAccessor<T> {
    /// Resolve a record key to its page via a `unique_id equals` query.
    async fn find_page(
        &self,
        operation: Operation,
        key: &str,
    ) -> Result<Option<Page>, AccessorError> {
        let property = self.key_property(operation)?;
        let id = parse_key(key)?;

        let request = QueryDatabaseRequest {
            database_id: self.database_id.clone(),
            filter: Some(unique_id_filter(property, id)),
            sorts: Vec::new(),
            start_cursor: None,
            page_size: Some(1),
        };

        let response = self
            .transport
            .query_database(request)
            .await
            .map_err(|source| AccessorError::Transport { operation, source })?;
        AccessorError::check_status(operation, response.status)?;

        Ok(response.results.into_iter().next())
    }
}

#[async_trait]
impl<T: NotionTransport> Accessor for NotionAccessor<T> {
    type Meta = PageMeta;

    async fn get(&self, key: &str) -> Result<Option<Record<PageMeta>>, AccessorError> {
        debug!(database = %self.database_id, key, "get");

        let page = self.find_page(Operation::Get, key).await?;
        Ok(page.map(|page| self.page_to_record(&page)))
    }

    async fn set(&self, _key: &str, _row: Row) -> Result<(), AccessorError> {
        Err(AccessorError::Unsupported {
            operation: Operation::Set,
            reason: "records are keyed by a backend-assigned unique id",
        })
    }

    async fn add(&self, row: Row) -> Result<PageMeta, AccessorError> {
        debug!(database = %self.database_id, "add");

        self.properties.schema().check_row(&row)?;
        let properties = self.write_payloads(&row)?;

        let request = CreatePageRequest {
            database_id: self.database_id.clone(),
            properties,
        };
        let response =
            self.transport
                .create_page(request)
                .await
                .map_err(|source| AccessorError::Transport {
                    operation: Operation::Add,
                    source,
                })?;
        AccessorError::check_status(Operation::Add, response.status)?;

        let page_id = response.page_id.ok_or_else(|| AccessorError::Transport {
            operation: Operation::Add,
            source: "create response carried no page id".into(),
        })?;

        Ok(PageMeta { page_id })
    }

    async fn update(&self, key: &str, patch: Row) -> Result<(), AccessorError> {
        debug!(database = %self.database_id, key, "update");

        self.properties.schema().check_row(&patch)?;
        let properties = self.write_payloads(&patch)?;

        let page = self
            .find_page(Operation::Update, key)
            .await?
            .ok_or_else(|| AccessorError::NotFound {
                key: key.to_owned(),
            })?;

        let request = UpdatePageRequest {
            page_id: page.id,
            properties,
        };
        let response =
            self.transport
                .update_page(request)
                .await
                .map_err(|source| AccessorError::Transport {
                    operation: Operation::Update,
                    source,
                })?;
        AccessorError::check_status(Operation::Update, response.status)?;

        Ok(())
    }

    async fn list(&self, options: ListOptions) -> Result<ListPage<PageMeta>, AccessorError> {
        debug!(database = %self.database_id, "list");

        let sorts = match single_sort_key(&options.sort)? {
            Some(key) => {
                // Any declared property sorts natively here.
                if !self.properties.schema().contains(&key.property) {
                    return Err(SortError::Unsortable {
                        property: key.property.clone(),
                    }
                    .into());
                }
                vec![SortPayload {
                    property: key.property.clone(),
                    direction: key.direction,
                }]
            }
            None => Vec::new(),
        };

        let filter = match &options.filter {
            Some(filter) => Some(compile_filter(&self.properties, filter)?),
            None => None,
        };
        if let Some(filter) = &filter {
            trace!(%filter, "compiled filter");
        }

        let start_cursor = match options.cursor.map(Cursor::into_payload) {
            None | Some(None) => None,
            Some(Some(serde_json::Value::String(cursor))) => Some(cursor),
            Some(Some(other)) => {
                return Err(AccessorError::InvalidCursor {
                    reason: format!("expected a string payload, got {other}"),
                });
            }
        };

        let request = QueryDatabaseRequest {
            database_id: self.database_id.clone(),
            filter,
            sorts,
            start_cursor,
            page_size: options.limit,
        };
        let response = self
            .transport
            .query_database(request)
            .await
            .map_err(|source| AccessorError::Transport {
                operation: Operation::List,
                source,
            })?;
        AccessorError::check_status(Operation::List, response.status)?;

        let items = response
            .results
            .iter()
            .map(|page| self.page_to_record(page))
            .collect();
        let cursor = Cursor::from_payload(response.next_cursor.map(serde_json::Value::String));

        Ok(ListPage { items, cursor })
    }
}

/// Record keys are the decimal rendering of the unique id number.
fn parse_key(key: &str) -> Result<i64, AccessorError> {
    key.parse().map_err(|_| AccessorError::InvalidKey {
        key: key.to_owned(),
        reason: "expected a numeric unique id",
    })
}

fn unique_id_filter(property: &str, id: i64) -> serde_json::Value {
    json!({
        "property": property,
        "type": "unique_id",
        "unique_id": { "equals": id },
    })
}

///
/// TESTS
///
