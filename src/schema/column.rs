//! Column classification.
//!
//! Maps a column's declared type to the SQL expression the indexer should
//! extract and to the attribute bucket the column belongs in:
//!
//! - date-like columns are wrapped in a to-epoch-seconds conversion and
//!   listed as date attributes,
//! - boolean/integer columns are extracted raw and listed as group
//!   (filterable) attributes,
//! - string/text columns are extracted raw and belong to no bucket.
//!
//! Any other type is a hard failure: a requested field can never be
//! silently skipped.

use crate::error::{BridgeError, Result};
use crate::schema::ColumnType;

/// Attribute bucket a classified column lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnBucket {
    /// Exposed as a date attribute (epoch seconds).
    Date,
    /// Exposed as a group attribute, filterable by value.
    /// Booleans are represented as 0/1 downstream.
    Group,
}

/// Result of classifying one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnClass {
    pub bucket: Option<ColumnBucket>,
    /// Whether extraction wraps the column in `UNIX_TIMESTAMP(...)`.
    epoch: bool,
}

impl ColumnClass {
    /// Render the extraction expression for `table.column`.
    pub fn select_expr(&self, table: &str, column: &str) -> String {
        if self.epoch {
            format!("UNIX_TIMESTAMP({table}.{column})")
        } else {
            format!("{table}.{column}")
        }
    }
}

/// Classify `column` of type `ty` on `model`.
///
/// `model` and `column` only feed the error message.
pub fn classify(model: &str, column: &str, ty: &ColumnType) -> Result<ColumnClass> {
    match ty {
        ColumnType::Date | ColumnType::DateTime | ColumnType::Time | ColumnType::Timestamp => {
            Ok(ColumnClass {
                bucket: Some(ColumnBucket::Date),
                epoch: true,
            })
        }
        ColumnType::Boolean | ColumnType::Integer => Ok(ColumnClass {
            bucket: Some(ColumnBucket::Group),
            epoch: false,
        }),
        ColumnType::String | ColumnType::Text => Ok(ColumnClass {
            bucket: None,
            epoch: false,
        }),
        ColumnType::Other(name) => Err(BridgeError::UnsupportedColumnType {
            model: model.to_string(),
            column: column.to_string(),
            column_type: name.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_like_columns_use_epoch_conversion() {
        for ty in [
            ColumnType::Date,
            ColumnType::DateTime,
            ColumnType::Time,
            ColumnType::Timestamp,
        ] {
            let class = classify("Post", "published_at", &ty).unwrap();
            assert_eq!(class.bucket, Some(ColumnBucket::Date), "{:?}", ty);
            assert_eq!(
                class.select_expr("posts", "published_at"),
                "UNIX_TIMESTAMP(posts.published_at)"
            );
        }
    }

    #[test]
    fn boolean_and_integer_are_group_attributes() {
        for ty in [ColumnType::Boolean, ColumnType::Integer] {
            let class = classify("Post", "flag", &ty).unwrap();
            assert_eq!(class.bucket, Some(ColumnBucket::Group), "{:?}", ty);
            assert_eq!(class.select_expr("posts", "flag"), "posts.flag");
        }
    }

    #[test]
    fn string_and_text_are_plain() {
        for ty in [ColumnType::String, ColumnType::Text] {
            let class = classify("Post", "title", &ty).unwrap();
            assert_eq!(class.bucket, None, "{:?}", ty);
            assert_eq!(class.select_expr("posts", "title"), "posts.title");
        }
    }

    #[test]
    fn unknown_type_is_fatal() {
        let err = classify("Post", "price", &ColumnType::Other("decimal".into())).unwrap_err();
        match err {
            BridgeError::UnsupportedColumnType {
                model,
                column,
                column_type,
            } => {
                assert_eq!(model, "Post");
                assert_eq!(column, "price");
                assert_eq!(column_type, "decimal");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
