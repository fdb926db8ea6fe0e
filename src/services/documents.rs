use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{consignment, invoice};
use crate::errors::ServiceError;

/// Location of a rendered document, as handed back to API clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    #[schema(example = "documents/invoices/INV0001.pdf")]
    pub document_path: String,
}

/// Seam for the printable-document pipeline. Implementations return the
/// storage path of the rendered artifact.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Renders the printable consignment note for a booking.
    async fn render_consignment_note(
        &self,
        consignment: &consignment::Model,
    ) -> Result<String, ServiceError>;

    /// Renders the printable invoice.
    async fn render_invoice(&self, invoice: &invoice::Model) -> Result<String, ServiceError>;
}

/// Path-only renderer: computes the canonical storage path without producing
/// a file. The PDF pipeline lives outside this service and picks paths up
/// from here.
pub struct PathOnlyRenderer {
    base_dir: String,
}

impl PathOnlyRenderer {
    pub fn new(base_dir: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl Default for PathOnlyRenderer {
    fn default() -> Self {
        Self::new("documents")
    }
}

#[async_trait]
impl DocumentRenderer for PathOnlyRenderer {
    async fn render_consignment_note(
        &self,
        consignment: &consignment::Model,
    ) -> Result<String, ServiceError> {
        Ok(format!(
            "{}/consignment-notes/{}.pdf",
            self.base_dir, consignment.gr_number
        ))
    }

    async fn render_invoice(&self, invoice: &invoice::Model) -> Result<String, ServiceError> {
        Ok(format!(
            "{}/invoices/{}.pdf",
            self.base_dir, invoice.invoice_number
        ))
    }
}
