//! CSS field extraction.

use crate::page::ChromeElement;
use async_trait::async_trait;
use indexmap::IndexMap;
use pagewalk_core::{ElementHandle, ExtractionError, ExtractionSink};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Where a field's value is read from, relative to an item element.
///
/// Written as `selector`, `selector@attribute`, `@attribute` or the empty
/// string (the item's own text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelector {
    pub selector: Option<String>,
    pub attribute: Option<String>,
}

impl FromStr for FieldSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (selector, attribute) = match s.rsplit_once('@') {
            Some((selector, attribute)) if !attribute.trim().is_empty() => {
                (selector, Some(attribute.trim().to_string()))
            }
            _ => (s, None),
        };
        let selector = selector.trim();
        Ok(Self {
            selector: (!selector.is_empty()).then(|| selector.to_string()),
            attribute,
        })
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(selector) = &self.selector {
            f.write_str(selector)?;
        }
        if let Some(attribute) = &self.attribute {
            write!(f, "@{attribute}")?;
        }
        Ok(())
    }
}

impl FieldSelector {
    async fn read(&self, item: &ChromeElement) -> Result<Option<String>, ExtractionError> {
        let children;
        let target = match &self.selector {
            Some(selector) => {
                children = item
                    .find_children(selector)
                    .await
                    .map_err(|e| ExtractionError::with_source(format!("field `{self}`"), e))?;
                match children.first() {
                    Some(child) => child,
                    None => return Ok(None),
                }
            }
            None => item,
        };

        let value = match &self.attribute {
            Some(attribute) => target.attribute(attribute).await,
            None => target.text().await.map(|t| t.map(|t| t.trim().to_string())),
        };
        value.map_err(|e| ExtractionError::with_source(format!("field `{self}`"), e))
    }
}

/// Reads named fields from each item into a JSON object.
///
/// Fields keep their configured order. A selector that matches nothing
/// inside an item produces `null` rather than an error, since optional
/// columns are common in scraped tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSink {
    fields: IndexMap<String, FieldSelector>,
}

impl FieldSink {
    /// Sink reading `fields` (name -> selector expression).
    #[must_use]
    pub fn new<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let fields = fields
            .into_iter()
            .map(|(name, selector)| {
                let Ok(selector) = selector.as_ref().parse::<FieldSelector>();
                (name.into(), selector)
            })
            .collect();
        Self { fields }
    }

    /// Sink producing `{"text": ...}` for each item.
    #[must_use]
    pub fn text_only() -> Self {
        Self::new([("text", "")])
    }

    #[must_use]
    pub fn fields(&self) -> &IndexMap<String, FieldSelector> {
        &self.fields
    }

    /// Pairs values read in field order with their names.
    fn record(&self, values: Vec<Option<String>>) -> Map<String, Value> {
        self.fields
            .keys()
            .cloned()
            .zip(values.into_iter().map(|v| v.map_or(Value::Null, Value::String)))
            .collect()
    }
}

#[async_trait]
impl ExtractionSink<ChromeElement> for FieldSink {
    type Record = Map<String, Value>;

    async fn extract(
        &mut self,
        elements: &[ChromeElement],
    ) -> Result<Vec<Self::Record>, ExtractionError> {
        let mut records = Vec::with_capacity(elements.len());
        for element in elements {
            let mut values = Vec::with_capacity(self.fields.len());
            for field in self.fields.values() {
                values.push(field.read(element).await?);
            }
            records.push(self.record(values));
        }
        Ok(records)
    }
}
