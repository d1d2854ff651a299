use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use ormgraph_model::{Catalog, Column, Direction, Model, Relationship};
use ormgraph_storage::{
    Filter, Instance, ModelStore, Query, QueryResult, Row, RowKey, StorageError, StorageResult,
};
use papaya::HashMap as PapayaHashMap;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::value::{coerce, compare, order};

/// Rows of one model, keyed by rendered primary key.
type Table = PapayaHashMap<String, Row>;

/// Writes made by one cascading operation, undone in reverse on failure.
#[derive(Debug, Default)]
struct Journal {
    inserted: Vec<(String, String)>,
    updated: Vec<(String, String, Row)>,
}

impl Journal {
    fn len(&self) -> usize {
        self.inserted.len() + self.updated.len()
    }
}

/// In-memory row store using papaya lock-free hash maps.
///
/// Reads are lock-free. Writes are serialized so that cascading inserts and
/// reference checks observe a consistent state; a failed cascade removes the
/// rows it already wrote.
///
/// The store enforces:
/// - primary key uniqueness and autoincrement sequences
/// - NOT NULL columns
/// - foreign keys on write and restrict-on-delete
#[derive(Debug)]
pub struct InMemoryStore {
    catalog: Arc<Catalog>,
    tables: HashMap<String, Table>,
    sequences: PapayaHashMap<String, AtomicI64>,
    write_lock: Mutex<()>,
}

impl InMemoryStore {
    /// Creates an empty store with one table per catalog model.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let tables = catalog
            .names()
            .map(|name| (name.to_string(), Table::new()))
            .collect();

        Self {
            catalog,
            tables,
            sequences: PapayaHashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the catalog this store was created for.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Returns the number of rows stored for `model`.
    pub fn count(&self, model: &str) -> usize {
        self.tables.get(model).map_or(0, |table| table.pin().len())
    }

    /// Returns the total number of rows in the store.
    pub fn total_count(&self) -> usize {
        self.tables.values().map(|table| table.pin().len()).sum()
    }

    fn model(&self, name: &str) -> StorageResult<&Model> {
        self.catalog
            .get(name)
            .ok_or_else(|| StorageError::invalid_row(format!("Unknown model: {name}")))
    }

    fn table(&self, name: &str) -> StorageResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| StorageError::invalid_row(format!("Unknown model: {name}")))
    }

    fn rows(&self, model: &str) -> StorageResult<Vec<Row>> {
        let table = self.table(model)?;
        let guard = table.pin();
        Ok(guard.iter().map(|(_, row)| row.clone()).collect())
    }

    /// Extracts the normalized primary key of `row`.
    fn key_of(&self, model: &Model, row: &Row) -> StorageResult<RowKey> {
        let mut values = Vec::new();
        for column in model.primary_key() {
            let value = row.get(&column.name).cloned().unwrap_or(Value::Null);
            if value.is_null() {
                return Err(StorageError::invalid_row(format!(
                    "Missing primary key column {}.{}",
                    model.name, column.name
                )));
            }
            values.push(coerce(column, value)?);
        }
        Ok(RowKey::new(model.name.clone(), values))
    }

    fn normalize_key(&self, key: &RowKey) -> StorageResult<(String, &Model)> {
        let model = self.model(&key.model)?;
        let columns: Vec<&Column> = model.primary_key().collect();
        if columns.len() != key.values.len() {
            return Err(StorageError::invalid_row(format!(
                "{} has {} primary key columns, got {} values",
                model.name,
                columns.len(),
                key.values.len()
            )));
        }

        let values = columns
            .into_iter()
            .zip(key.values.iter().cloned())
            .map(|(column, value)| coerce(column, value))
            .collect::<StorageResult<Vec<_>>>()?;
        Ok((RowKey::new(model.name.clone(), values).id(), model))
    }

    fn next_sequence(&self, model: &str) -> i64 {
        let guard = self.sequences.pin();
        guard
            .get_or_insert_with(model.to_string(), || AtomicI64::new(1))
            .fetch_add(1, Ordering::SeqCst)
    }

    fn bump_sequence(&self, model: &str, used: i64) {
        let guard = self.sequences.pin();
        guard
            .get_or_insert_with(model.to_string(), || AtomicI64::new(1))
            .fetch_max(used + 1, Ordering::SeqCst);
    }

    /// Coerces known columns and rejects unknown ones.
    fn coerce_row(&self, model: &Model, values: Row) -> StorageResult<Row> {
        let mut row = Row::new();
        for (name, value) in values {
            let column = model.get_column(&name).ok_or_else(|| {
                StorageError::invalid_row(format!("Unknown column {}.{}", model.name, name))
            })?;
            row.insert(name, coerce(column, value)?);
        }
        Ok(row)
    }

    /// Fills generated keys and defaults for columns absent from `row`.
    fn apply_defaults(&self, model: &Model, row: &mut Row) -> StorageResult<()> {
        for column in &model.columns {
            if row.get(&column.name).is_some_and(|v| !v.is_null()) {
                if column.is_autoincrement_pk()
                    && let Some(used) = row.get(&column.name).and_then(Value::as_i64)
                {
                    self.bump_sequence(&model.name, used);
                }
                continue;
            }

            let value = if column.is_autoincrement_pk() {
                Value::from(self.next_sequence(&model.name))
            } else if row.contains_key(&column.name) {
                Value::Null
            } else if let Some(default) = &column.default {
                coerce(column, default.clone())?
            } else if let Some(expr) = &column.server_default {
                coerce(column, server_default(expr)?)?
            } else {
                Value::Null
            };
            row.insert(column.name.clone(), value);
        }
        Ok(())
    }

    /// Checks NOT NULL columns and foreign keys of a complete row.
    fn check_row(&self, model: &Model, row: &Row) -> StorageResult<()> {
        for column in &model.columns {
            let value = row.get(&column.name).unwrap_or(&Value::Null);
            if value.is_null() {
                if !column.is_nullable() {
                    return Err(StorageError::constraint(format!(
                        "NOT NULL constraint failed: {}.{}",
                        model.table, column.name
                    )));
                }
                continue;
            }

            for fk in &column.foreign_keys {
                let found = self
                    .rows(&fk.model)?
                    .iter()
                    .any(|target| target.get(&fk.column) == Some(value));
                if !found {
                    return Err(StorageError::reference_not_found(
                        &model.name,
                        &column.name,
                        format!("{}/{}", fk.model, ormgraph_storage::render_value(value)),
                    ));
                }
            }
        }
        Ok(())
    }

    fn insert_row(&self, model: &Model, values: Row, journal: &mut Journal) -> StorageResult<Row> {
        let mut row = self.coerce_row(model, values)?;
        self.apply_defaults(model, &mut row)?;
        self.check_row(model, &row)?;

        let key = self.key_of(model, &row)?;
        let id = key.id();
        let table = self.table(&model.name)?;
        let guard = table.pin();
        if guard.get(&id).is_some() {
            return Err(StorageError::already_exists(&model.name, id));
        }
        guard.insert(id.clone(), row.clone());
        journal.inserted.push((model.name.clone(), id));

        trace!(model = %model.name, key = %key, "Inserted row");
        Ok(row)
    }

    fn insert_tree(&self, instance: Instance, journal: &mut Journal) -> StorageResult<Row> {
        let model = self.model(&instance.model)?;
        let (values, deferred) = self.attach_parents(model, instance, journal)?;
        let row = self.insert_row(model, values, journal)?;
        self.attach_children(model, &row, deferred, journal)?;
        Ok(row)
    }

    /// Inserts the many-to-one children of `instance` and copies their keys
    /// into its foreign key columns. To-many children are returned for
    /// insertion once the owning row exists.
    fn attach_parents<'m>(
        &self,
        model: &'m Model,
        instance: Instance,
        journal: &mut Journal,
    ) -> StorageResult<(Row, Vec<(&'m Relationship, Instance)>)> {
        let mut values = instance.values;
        let mut deferred = Vec::new();

        for attached in instance.children {
            let rel = relationship(model, &attached.relationship)?;
            match rel.direction {
                Direction::ManyToOne => {
                    let parent = self.insert_tree(attached.instance, journal)?;
                    for (local, remote) in rel.local_columns.iter().zip(&rel.remote_columns) {
                        let value = parent.get(remote).cloned().unwrap_or(Value::Null);
                        values.insert(local.clone(), value);
                    }
                }
                Direction::OneToMany | Direction::ManyToMany => {
                    deferred.push((rel, attached.instance));
                }
            }
        }

        Ok((values, deferred))
    }

    fn attach_children(
        &self,
        model: &Model,
        row: &Row,
        deferred: Vec<(&Relationship, Instance)>,
        journal: &mut Journal,
    ) -> StorageResult<()> {
        for (rel, mut child) in deferred {
            if rel.direction == Direction::OneToMany {
                for (local, remote) in rel.local_columns.iter().zip(&rel.remote_columns) {
                    let value = row.get(local).cloned().unwrap_or(Value::Null);
                    child.values.insert(remote.clone(), value);
                }
                self.insert_tree(child, journal)?;
            } else {
                let target = self.insert_tree(child, journal)?;
                self.link(model, rel, row, &target, journal)?;
            }
        }
        Ok(())
    }

    /// Merges `instance` into the row sharing its primary key, or inserts it.
    fn merge_tree(&self, instance: Instance, journal: &mut Journal) -> StorageResult<Row> {
        let model = self.model(&instance.model)?;
        let (values, deferred) = self.attach_parents(model, instance, journal)?;
        let values = self.coerce_row(model, values)?;
        let key = self.key_of(model, &values)?;
        let id = key.id();
        let table = self.table(&model.name)?;

        let existing = table.pin().get(&id).cloned();
        let row = match existing {
            Some(previous) => {
                let mut row = previous.clone();
                row.extend(values);
                self.check_row(model, &row)?;
                table.pin().insert(id.clone(), row.clone());
                journal.updated.push((model.name.clone(), id, previous));
                trace!(key = %key, "Merged row");
                row
            }
            None => {
                let row = self.insert_row(model, values, journal)?;
                trace!(key = %key, "Merged row as insert");
                row
            }
        };

        self.attach_children(model, &row, deferred, journal)?;
        Ok(row)
    }

    /// Inserts the association row joining `owner` and `target`.
    fn link(
        &self,
        model: &Model,
        rel: &Relationship,
        owner: &Row,
        target: &Row,
        journal: &mut Journal,
    ) -> StorageResult<()> {
        let (secondary, owner_columns, target_columns) = self.association(model, rel)?;

        let mut values = Row::new();
        for (column, referenced) in owner_columns {
            values.insert(column, owner.get(&referenced).cloned().unwrap_or(Value::Null));
        }
        for (column, referenced) in target_columns {
            values.insert(column, target.get(&referenced).cloned().unwrap_or(Value::Null));
        }
        self.insert_row(secondary, values, journal)?;
        Ok(())
    }

    /// Resolves the association model of a many-to-many relationship and
    /// its `(column, referenced column)` pairs for the owner and the target.
    fn association(
        &self,
        model: &Model,
        rel: &Relationship,
    ) -> StorageResult<(&Model, Vec<(String, String)>, Vec<(String, String)>)> {
        let name = rel.secondary.as_deref().ok_or_else(|| {
            StorageError::unsupported(format!(
                "Many-to-many relationship {}.{} has no association model",
                model.name, rel.key
            ))
        })?;
        let secondary = self.model(name)?;

        let mut owner_columns = Vec::new();
        let mut target_columns = Vec::new();
        for column in &secondary.columns {
            for fk in &column.foreign_keys {
                let pair = (column.name.clone(), fk.column.clone());
                if fk.model == model.name && (owner_columns.is_empty() || fk.model != rel.target) {
                    owner_columns.push(pair);
                } else if fk.model == rel.target {
                    target_columns.push(pair);
                }
            }
        }

        if owner_columns.is_empty() || target_columns.is_empty() {
            return Err(StorageError::unsupported(format!(
                "Association model {name} does not reference both {} and {}",
                model.name, rel.target
            )));
        }
        Ok((secondary, owner_columns, target_columns))
    }

    fn related_rows(
        &self,
        model: &Model,
        row: &Row,
        rel: &Relationship,
    ) -> StorageResult<Vec<Row>> {
        if rel.direction == Direction::ManyToMany {
            let (secondary, owner_columns, target_columns) = self.association(model, rel)?;
            let links: Vec<Row> = self
                .rows(&secondary.name)?
                .into_iter()
                .filter(|link| {
                    owner_columns
                        .iter()
                        .all(|(column, referenced)| joined(link.get(column), row.get(referenced)))
                })
                .collect();

            return Ok(self
                .rows(&rel.target)?
                .into_iter()
                .filter(|target| {
                    links.iter().any(|link| {
                        target_columns.iter().all(|(column, referenced)| {
                            joined(target.get(referenced), link.get(column))
                        })
                    })
                })
                .collect());
        }

        Ok(self
            .rows(&rel.target)?
            .into_iter()
            .filter(|target| {
                rel.local_columns
                    .iter()
                    .zip(&rel.remote_columns)
                    .all(|(local, remote)| joined(target.get(remote), row.get(local)))
            })
            .collect())
    }

    fn matches(&self, model: &Model, row: &Row, filter: &Filter) -> StorageResult<bool> {
        match filter {
            Filter::And(filters) => {
                for filter in filters {
                    if !self.matches(model, row, filter)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Filter::Compare { column, op, value } => {
                let col = model.get_column(column).ok_or_else(|| {
                    StorageError::invalid_row(format!("Unknown column {}.{}", model.name, column))
                })?;
                let value = coerce_operand(col, *op, value)?;
                let left = row.get(column).unwrap_or(&Value::Null);
                compare(*op, left, &value)
            }
            Filter::Related {
                relationship: key,
                filter,
            } => {
                let rel = relationship(model, key)?;
                let target = self.model(&rel.target)?;
                for related in self.related_rows(model, row, rel)? {
                    if self.matches(target, &related, filter)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Returns a constraint error if any stored row references `row`.
    fn check_unreferenced(&self, model: &Model, row: &Row) -> StorageResult<()> {
        for other in self.catalog.models() {
            for column in &other.columns {
                for fk in column.foreign_keys.iter().filter(|fk| fk.model == model.name) {
                    let Some(value) = row.get(&fk.column).filter(|v| !v.is_null()) else {
                        continue;
                    };
                    let referenced = self
                        .rows(&other.name)?
                        .iter()
                        .any(|r| r.get(&column.name) == Some(value));
                    if referenced {
                        return Err(StorageError::constraint(format!(
                            "FOREIGN KEY constraint failed: {}.{} references {}.{}",
                            other.table, column.name, model.table, fk.column
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn rollback(&self, journal: Journal) {
        for (model, id) in journal.inserted.into_iter().rev() {
            if let Some(table) = self.tables.get(&model) {
                table.pin().remove(&id);
            }
        }
        for (model, id, previous) in journal.updated.into_iter().rev() {
            if let Some(table) = self.tables.get(&model) {
                table.pin().insert(id, previous);
            }
        }
    }
}

#[async_trait]
impl ModelStore for InMemoryStore {
    async fn insert(&self, instance: Instance) -> StorageResult<Row> {
        let _lock = self.write_lock.lock().await;
        let model = instance.model.clone();
        let mut journal = Journal::default();

        match self.insert_tree(instance, &mut journal) {
            Ok(row) => {
                debug!(model = %model, rows = journal.len(), "Insert committed");
                Ok(row)
            }
            Err(err) => {
                debug!(model = %model, error = %err, rows = journal.len(), "Insert rolled back");
                self.rollback(journal);
                Err(err)
            }
        }
    }

    async fn merge(&self, instance: Instance) -> StorageResult<Row> {
        let _lock = self.write_lock.lock().await;
        let model = instance.model.clone();
        let mut journal = Journal::default();

        match self.merge_tree(instance, &mut journal) {
            Ok(row) => {
                debug!(model = %model, rows = journal.len(), "Merge committed");
                Ok(row)
            }
            Err(err) => {
                debug!(model = %model, error = %err, rows = journal.len(), "Merge rolled back");
                self.rollback(journal);
                Err(err)
            }
        }
    }

    async fn get(&self, key: &RowKey) -> StorageResult<Option<Row>> {
        let (id, model) = self.normalize_key(key)?;
        let table = self.table(&model.name)?;
        Ok(table.pin().get(&id).cloned())
    }

    async fn delete(&self, key: &RowKey) -> StorageResult<Row> {
        let _lock = self.write_lock.lock().await;
        let (id, model) = self.normalize_key(key)?;
        let table = self.table(&model.name)?;

        let row = table
            .pin()
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::not_found(&model.name, id.clone()))?;
        self.check_unreferenced(model, &row)?;
        table.pin().remove(&id);

        debug!(model = %model.name, id = %id, "Deleted row");
        Ok(row)
    }

    async fn query(&self, model_name: &str, query: &Query) -> StorageResult<QueryResult> {
        let model = self.model(model_name)?;

        let mut filter_by = Vec::with_capacity(query.filter_by.len());
        for (name, value) in &query.filter_by {
            let column = model.get_column(name).ok_or_else(|| {
                StorageError::invalid_row(format!("Unknown column {}.{}", model.name, name))
            })?;
            filter_by.push((name, coerce(column, value.clone())?));
        }

        let mut rows = Vec::new();
        for row in self.rows(model_name)? {
            let equal = filter_by
                .iter()
                .all(|(name, value)| row.get(*name).unwrap_or(&Value::Null) == value);
            if !equal {
                continue;
            }
            if let Some(filter) = &query.filter
                && !self.matches(model, &row, filter)?
            {
                continue;
            }
            rows.push(row);
        }

        for order_by in &query.order_by {
            if model.get_column(&order_by.column).is_none() {
                return Err(StorageError::invalid_row(format!(
                    "Unknown column {}.{}",
                    model.name, order_by.column
                )));
            }
        }

        let pk: Vec<&str> = model.primary_key().map(|c| c.name.as_str()).collect();
        rows.sort_by(|a, b| {
            let by_order = query.order_by.iter().fold(std::cmp::Ordering::Equal, |acc, o| {
                acc.then_with(|| {
                    let ord = order(
                        a.get(&o.column).unwrap_or(&Value::Null),
                        b.get(&o.column).unwrap_or(&Value::Null),
                    );
                    if o.descending { ord.reverse() } else { ord }
                })
            });
            pk.iter().fold(by_order, |acc, column| {
                acc.then_with(|| {
                    order(
                        a.get(*column).unwrap_or(&Value::Null),
                        b.get(*column).unwrap_or(&Value::Null),
                    )
                })
            })
        });

        let total = rows.len();
        let page: Vec<Row> = rows
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();

        trace!(model = %model_name, total, returned = page.len(), "Query evaluated");
        Ok(QueryResult::new(page, total))
    }

    async fn related(&self, model_name: &str, row: &Row, key: &str) -> StorageResult<Vec<Row>> {
        let model = self.model(model_name)?;
        let rel = relationship(model, key)?;
        let mut rows = self.related_rows(model, row, rel)?;

        let target = self.model(&rel.target)?;
        let pk: Vec<&str> = target.primary_key().map(|c| c.name.as_str()).collect();
        rows.sort_by(|a, b| {
            pk.iter().fold(std::cmp::Ordering::Equal, |acc, column| {
                acc.then_with(|| {
                    order(
                        a.get(*column).unwrap_or(&Value::Null),
                        b.get(*column).unwrap_or(&Value::Null),
                    )
                })
            })
        });
        Ok(rows)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

fn relationship<'a>(model: &'a Model, key: &str) -> StorageResult<&'a Relationship> {
    model.get_relationship(key).ok_or_else(|| {
        StorageError::invalid_row(format!("Unknown relationship {}.{}", model.name, key))
    })
}

/// Join equality: NULL never joins.
fn joined(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        (Some(l), Some(r)) => !l.is_null() && l == r,
        _ => false,
    }
}

fn coerce_operand(
    column: &Column,
    op: ormgraph_storage::Comparator,
    value: &Value,
) -> StorageResult<Value> {
    use ormgraph_storage::Comparator;

    match op {
        Comparator::IsNull | Comparator::Like => Ok(value.clone()),
        Comparator::In => match value {
            Value::Array(items) => items
                .iter()
                .map(|item| coerce(column, item.clone()))
                .collect::<StorageResult<Vec<_>>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        },
        _ => coerce(column, value.clone()),
    }
}

/// Evaluates a server default expression.
///
/// Timestamp functions produce the current UTC time; anything else is taken
/// as a literal, with surrounding single quotes removed.
fn server_default(expr: &str) -> StorageResult<Value> {
    let normalized = expr.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "now()" | "current_timestamp" | "current_timestamp()" | "func.now()" => {
            OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .map(Value::String)
                .map_err(|e| StorageError::internal(format!("Failed to format timestamp: {e}")))
        }
        _ => {
            let literal = expr.trim();
            let literal = literal
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
                .unwrap_or(literal);
            Ok(Value::String(literal.to_string()))
        }
    }
}
