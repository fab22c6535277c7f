// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Per-index SQL extraction synthesis.
//!
//! Turns one finalized [`IndexEntry`] into the [`SourceConfig`] the engine
//! indexes from. The query is assembled as typed collections (select list,
//! join list, predicate list) and joined into text only at the end, so the
//! shape of the algorithm stays testable independent of formatting:
//!
//! ```text
//! SELECT (t.pk * index_count + index_id) AS pk,      -- packed document ID
//!        <index_id> AS bridge_index_id,
//!        '<Model>' AS bridge_model,
//!        t.col AS col,                               -- classified fields
//!        assoc.col AS assoc_col,                     -- belongs-to joins
//!        GROUP_CONCAT(child.col SEPARATOR ' ') ...   -- has-many aggregates
//! FROM t LEFT JOIN ...
//! WHERE t.pk >= $start AND t.pk <= $end AND <conditions...>
//! [GROUP BY t.pk]
//! ```
//!
//! `$start`/`$end` are the engine's range-scan placeholders; the engine
//! substitutes numeric bounds during batched extraction, driven by the
//! companion MIN/MAX query. The single-record companion query unpacks the
//! engine's `$id` back to a local primary key inline.

use std::collections::BTreeSet;

use crate::config::settings::{Section, SettingValue};
use crate::error::{BridgeError, Result};
use crate::registry::{IndexEntry, ATTR_INDEX_ID, ATTR_MODEL};
use crate::schema::{classify, resolve, ColumnBucket, ResolvedAssociation, SchemaProvider};
use crate::schema::{ModelSchema, MultiAssociation, SingleAssociation};

/// The extraction artifact for one index definition.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub name: String,
    pub sql_query: String,
    pub sql_query_info: String,
    pub sql_query_range: String,
    /// Columns exposed as date attributes (epoch seconds).
    pub sql_date_columns: Vec<String>,
    /// Columns exposed as group attributes, the index-id column first.
    pub sql_group_columns: Vec<String>,
    pub strip_html: bool,
}

impl SourceConfig {
    /// Section form for the configuration renderer.
    #[must_use]
    pub fn to_section(&self) -> Section {
        Section::from([
            ("sql_query".to_string(), self.sql_query.clone().into()),
            (
                "sql_query_info".to_string(),
                self.sql_query_info.clone().into(),
            ),
            (
                "sql_query_range".to_string(),
                self.sql_query_range.clone().into(),
            ),
            (
                "sql_date_column".to_string(),
                SettingValue::List(self.sql_date_columns.clone()),
            ),
            (
                "sql_group_column".to_string(),
                SettingValue::List(self.sql_group_columns.clone()),
            ),
            (
                "strip_html".to_string(),
                i64::from(self.strip_html).into(),
            ),
        ])
    }
}

/// Build the [`SourceConfig`] for one finalized definition.
pub fn build_source(
    schemas: &dyn SchemaProvider,
    entry: &IndexEntry,
    index_count: u64,
) -> Result<SourceConfig> {
    let schema = schemas
        .model(&entry.model)
        .ok_or_else(|| BridgeError::UnknownModel(entry.model.clone()))?;
    SourceBuilder::new(schemas, schema, entry, index_count).build()
}

struct SelectField {
    expr: String,
    alias: String,
}

struct SourceBuilder<'a> {
    schemas: &'a dyn SchemaProvider,
    schema: &'a ModelSchema,
    entry: &'a IndexEntry,
    index_count: u64,
    name: String,
    fields: Vec<SelectField>,
    joins: Vec<String>,
    joined_tables: BTreeSet<String>,
    predicates: Vec<String>,
    group: bool,
    date_columns: Vec<String>,
    group_columns: Vec<String>,
}

impl<'a> SourceBuilder<'a> {
    fn new(
        schemas: &'a dyn SchemaProvider,
        schema: &'a ModelSchema,
        entry: &'a IndexEntry,
        index_count: u64,
    ) -> Self {
        let name = entry
            .definition
            .name
            .clone()
            .unwrap_or_else(|| schema.table_name().to_string());

        Self {
            schemas,
            schema,
            entry,
            index_count,
            name,
            fields: Vec::new(),
            joins: Vec::new(),
            joined_tables: BTreeSet::from([schema.table_name().to_string()]),
            predicates: Vec::new(),
            group: false,
            date_columns: Vec::new(),
            group_columns: vec![ATTR_INDEX_ID.to_string()],
        }
    }

    fn build(mut self) -> Result<SourceConfig> {
        let table = self.schema.table_name();
        let pk = self.schema.primary_key_column();
        let index_id = self.entry.index_id;

        self.push_field(
            format!(
                "({table}.{pk} * {count} + {index_id})",
                count = self.index_count
            ),
            pk.to_string(),
        )?;
        self.push_field(index_id.to_string(), ATTR_INDEX_ID.to_string())?;
        self.push_field(
            format!("'{}'", self.schema.model_name()),
            ATTR_MODEL.to_string(),
        )?;

        // Duplicate requests for the same specifier are idempotent.
        let mut seen = BTreeSet::new();
        let specifiers: Vec<String> = self
            .entry
            .definition
            .fields
            .iter()
            .filter(|s| seen.insert(s.clone()))
            .cloned()
            .collect();

        for specifier in &specifiers {
            match specifier.split_once('.') {
                Some((association, field)) => self.add_association_field(association, field)?,
                None => self.add_plain_field(specifier)?,
            }
        }

        self.predicates.push(format!("{table}.{pk} >= $start"));
        self.predicates.push(format!("{table}.{pk} <= $end"));
        self.predicates
            .extend(self.entry.definition.conditions.iter().cloned());

        let select_list = self
            .fields
            .iter()
            .map(|f| format!("{} AS {}", f.expr, f.alias))
            .collect::<Vec<_>>()
            .join(", ");
        let from = std::iter::once(table.to_string())
            .chain(self.joins.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        let mut sql_query = format!(
            "SELECT {select_list} FROM {from} WHERE {}",
            self.predicates.join(" AND ")
        );
        if self.group {
            sql_query.push_str(&format!(" GROUP BY {table}.{pk}"));
        }

        Ok(SourceConfig {
            name: self.name,
            sql_query,
            sql_query_info: format!(
                "SELECT * FROM {table} WHERE {table}.{pk} = (($id - {index_id}) / {count})",
                count = self.index_count
            ),
            sql_query_range: format!("SELECT MIN({pk}), MAX({pk}) FROM {table}"),
            sql_date_columns: self.date_columns,
            sql_group_columns: self.group_columns,
            strip_html: self.entry.definition.strip_markup,
        })
    }

    /// Add a select field, rejecting alias collisions across specifiers.
    fn push_field(&mut self, expr: String, alias: String) -> Result<()> {
        if self.fields.iter().any(|f| f.alias == alias) {
            return Err(BridgeError::DuplicateFieldAlias {
                index: self.name.clone(),
                alias,
            });
        }
        self.fields.push(SelectField { expr, alias });
        Ok(())
    }

    fn bucket_column(&mut self, bucket: Option<ColumnBucket>, column: &str) {
        match bucket {
            Some(ColumnBucket::Date) => self.date_columns.push(column.to_string()),
            Some(ColumnBucket::Group) => self.group_columns.push(column.to_string()),
            None => {}
        }
    }

    fn add_plain_field(&mut self, field: &str) -> Result<()> {
        let ty = self
            .schema
            .column_type(field)
            .ok_or_else(|| BridgeError::UnknownColumn {
                model: self.schema.model_name().to_string(),
                column: field.to_string(),
            })?
            .clone();
        let class = classify(self.schema.model_name(), field, &ty)?;

        self.bucket_column(class.bucket, field);
        self.push_field(
            class.select_expr(self.schema.table_name(), field),
            field.to_string(),
        )
    }

    fn add_association_field(&mut self, association: &str, field: &str) -> Result<()> {
        match resolve(self.schemas, self.schema, association)? {
            ResolvedAssociation::Single(single) => self.add_single_field(&single, field),
            ResolvedAssociation::Multi(multi) => self.add_multi_field(&multi, field),
        }
    }

    /// Belongs-to: classified field off the joined table, joined at most
    /// once per distinct target table.
    fn add_single_field(&mut self, single: &SingleAssociation, field: &str) -> Result<()> {
        let target = self
            .schemas
            .model(&single.target_model)
            .ok_or_else(|| BridgeError::UnknownModel(single.target_model.clone()))?;
        let ty = target
            .column_type(field)
            .ok_or_else(|| BridgeError::UnknownColumn {
                model: target.model_name().to_string(),
                column: field.to_string(),
            })?
            .clone();
        let class = classify(target.model_name(), field, &ty)?;

        let alias = format!("{}_{}", single.table, field);
        self.bucket_column(class.bucket, &alias);
        self.push_field(class.select_expr(&single.table, field), alias)?;

        self.add_join(
            &single.table,
            &format!(
                "{base}.{fk} = {table}.{pk}",
                base = self.schema.table_name(),
                fk = single.foreign_key,
                table = single.table,
                pk = single.primary_key
            ),
        );
        Ok(())
    }

    /// Has-many: aggregated into one space-separated value per owning row;
    /// forces grouping so join fan-out cannot duplicate rows.
    fn add_multi_field(&mut self, multi: &MultiAssociation, field: &str) -> Result<()> {
        let alias = format!("{}_{}", multi.table, field);
        self.push_field(
            format!(
                "GROUP_CONCAT({table}.{field} SEPARATOR ' ')",
                table = multi.table
            ),
            alias,
        )?;

        let base = self.schema.table_name();
        let pk = self.schema.primary_key_column();
        let on = match &multi.polymorphic_as {
            Some(name) => format!(
                "{base}.{pk} = {table}.{name}_id AND {table}.{name}_type = '{model}'",
                table = multi.table,
                model = self.schema.model_name()
            ),
            None => format!(
                "{base}.{pk} = {table}.{fk}",
                table = multi.table,
                fk = multi.foreign_key
            ),
        };
        self.add_join(&multi.table, &on);
        self.group = true;
        Ok(())
    }

    /// Each distinct target table is joined at most once; repeat requests
    /// are no-ops.
    fn add_join(&mut self, table: &str, on: &str) {
        if !self.joined_tables.insert(table.to_string()) {
            return;
        }
        self.joins.push(format!("LEFT JOIN {table} ON {on}"));
    }
}
