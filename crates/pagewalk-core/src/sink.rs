//! Record extraction boundary.

use crate::driver::ElementHandle;
use crate::error::ExtractionError;
use async_trait::async_trait;

/// Turns page elements into records.
///
/// The controller only ever hands a sink the elements that appeared since
/// the previous pass, so a sink never sees the same element twice within an
/// append-style session. Records are opaque to the core; it only counts them.
#[async_trait]
pub trait ExtractionSink<E: ElementHandle>: Send {
    /// Record type produced by this sink.
    type Record: Send;

    /// Extracts records from `elements`, preserving their order.
    async fn extract(&mut self, elements: &[E]) -> Result<Vec<Self::Record>, ExtractionError>;
}

/// A sink producing the trimmed text of each element.
///
/// Elements without text produce an empty string so that record and element
/// counts stay aligned.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextSink;

#[async_trait]
impl<E: ElementHandle> ExtractionSink<E> for TextSink {
    type Record = String;

    async fn extract(&mut self, elements: &[E]) -> Result<Vec<String>, ExtractionError> {
        let mut records = Vec::with_capacity(elements.len());
        for element in elements {
            let text = element
                .text()
                .await
                .map_err(|e| ExtractionError::with_source("failed to read element text", e))?;
            records.push(text.map(|t| t.trim().to_string()).unwrap_or_default());
        }
        Ok(records)
    }
}
