//! Content parser.
//!
//! Flattens an on-chain document into the searchable record written to the
//! store: one ordered map from derived field names to typed values, plus the
//! fixed identity fields and, when configured, the combined search field.

pub mod single_text;

pub use single_text::SingleTextAccumulator;

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::config::{IndexerConfig, SingleTextOp};
use crate::domain::{
    self, field_name, format_timestamp, object_type_name, ChainDocument, ContentType,
};
use crate::errors::ParseError;
use crate::parser::single_text::display_value;

/// Stored field holding the document id.
pub const DOC_ID_FIELD: &str = "docId";
/// Stored field holding the owning contract.
pub const CONTRACT_FIELD: &str = "contract";
/// Stored field holding the creator account.
pub const CREATOR_FIELD: &str = "creator";
/// Stored field holding the creation timestamp.
pub const CREATED_DATE_FIELD: &str = "createdDate";
/// Stored field holding the last-update timestamp.
pub const UPDATED_DATE_FIELD: &str = "updatedDate";
/// Stored field holding the document's object type.
pub const TYPE_FIELD: &str = "type";
/// Stored field holding the denormalized adjacency map.
pub const EDGES_FIELD: &str = "edges";
/// Stored field holding the combined completion text.
pub const SINGLE_TEXT_SEARCH_FIELD: &str = "single_text_search_field";

/// Flattens chain documents according to the configured field policies.
#[derive(Debug, Clone)]
pub struct DocumentParser {
    ops: BTreeMap<ContentType, SingleTextOp>,
    add_ints_as_strings: bool,
    emit_single_text: bool,
}

impl DocumentParser {
    /// Create a parser from a combined-field policy map and the int
    /// duplication flag.
    pub fn new(ops: BTreeMap<ContentType, SingleTextOp>, add_ints_as_strings: bool) -> Self {
        let emit_single_text = ops.values().any(|op| *op != SingleTextOp::None);
        Self {
            ops,
            add_ints_as_strings,
            emit_single_text,
        }
    }

    /// Create a parser from the pipeline configuration.
    pub fn from_config(config: &IndexerConfig) -> Self {
        Self::new(
            config.single_text_search_field.clone(),
            config.add_ints_as_strings,
        )
    }

    fn op(&self, content_type: ContentType) -> SingleTextOp {
        self.ops.get(&content_type).copied().unwrap_or_default()
    }

    /// Flatten a chain document into its stored record (without edges).
    ///
    /// # Returns
    ///
    /// * `Ok(map)` - The parsed document, field by field
    /// * `Err(ParseError)` - On a group without `content_group_label` or a
    ///   value that cannot be coerced to its declared type
    pub fn parse(&self, doc: &ChainDocument) -> Result<Map<String, Value>, ParseError> {
        let mut values = Map::new();
        let mut single_text = SingleTextAccumulator::new();

        values.insert(DOC_ID_FIELD.to_string(), Value::String(doc.doc_id()));
        values.insert(CONTRACT_FIELD.to_string(), Value::String(doc.contract.clone()));

        self.process_field(
            &mut values,
            &mut single_text,
            CREATOR_FIELD,
            Value::String(doc.creator.clone()),
            self.op(ContentType::Name),
        );
        self.process_field(
            &mut values,
            &mut single_text,
            CREATED_DATE_FIELD,
            Value::String(format_timestamp(&doc.created_date)),
            self.op(ContentType::TimePoint),
        );
        self.process_field(
            &mut values,
            &mut single_text,
            UPDATED_DATE_FIELD,
            Value::String(format_timestamp(&doc.updated_date)),
            self.op(ContentType::TimePoint),
        );

        for (index, group) in doc.content_groups.iter().enumerate() {
            let group_label = group
                .iter()
                .find(|content| content.label == domain::CONTENT_GROUP_LABEL)
                .ok_or(ParseError::MissingGroupLabel { index })?
                .typed_value()?;
            let group_label = group_label.as_str().ok_or_else(|| {
                ParseError::invalid_value(domain::CONTENT_GROUP_LABEL, "group label is not a string")
            })?;
            let prefix = domain::camel_case_label(group_label);

            for content in group {
                if content.label == domain::CONTENT_GROUP_LABEL {
                    continue;
                }

                let content_type = content.content_type();
                let name = if content.label == domain::TYPE_LABEL
                    && group_label == domain::SYSTEM_GROUP
                {
                    TYPE_FIELD.to_string()
                } else {
                    field_name(&prefix, &content.label, content_type)
                };

                let value = content.typed_value()?;
                self.process_field(&mut values, &mut single_text, &name, value, self.op(content_type));

                if self.add_ints_as_strings && content_type == ContentType::Int64 {
                    if let Some(stored) = values.get(&name) {
                        let sibling = display_value(stored);
                        values.insert(format!("{}_s", name), Value::String(sibling));
                    }
                }
            }
        }

        // The raw type name survives only when its policy kept the field;
        // convert it to object-type form in place.
        let type_name = values
            .get(TYPE_FIELD)
            .and_then(Value::as_str)
            .map(str::to_owned);
        if let Some(type_name) = type_name {
            self.process_field(
                &mut values,
                &mut single_text,
                TYPE_FIELD,
                Value::String(object_type_name(&type_name)),
                self.op(ContentType::Name),
            );
        }

        if self.emit_single_text {
            values.insert(
                SINGLE_TEXT_SEARCH_FIELD.to_string(),
                Value::String(single_text.into_string()),
            );
        }

        Ok(values)
    }

    fn process_field(
        &self,
        values: &mut Map<String, Value>,
        single_text: &mut SingleTextAccumulator,
        name: &str,
        value: Value,
        op: SingleTextOp,
    ) {
        single_text.add_value(&value, op);
        if op != SingleTextOp::Replace {
            values.insert(name.to_string(), value);
        }
    }
}
