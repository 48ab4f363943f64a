//! Invoice question answering
//!
//! Sends an invoice image and a question to a [`VisionModel`], records the
//! exchange in the `INVOICE_DATA` table and returns the answer.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use sqlfan_core::{ImageInput, Table, TableLoader, TableTarget, Value, VisionModel};

use crate::error::{ServiceError, ServiceResult};

/// Instruction sent ahead of every question
pub const INVOICE_PROMPT: &str = "You are an expert in understanding invoices.";

/// Table receiving one row per answered question
pub const INVOICE_TABLE: &str = "INVOICE_DATA";

const INVOICE_COLUMNS: [&str; 4] = ["FILENAME", "QUESTION", "RESPONSE", "TIMESTAMP"];

/// One answered question about an invoice
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceAnswer {
    pub file_name: String,
    pub question: String,
    pub response: String,
    pub asked_at: NaiveDateTime,
}

impl InvoiceAnswer {
    /// The answer as a single-row `INVOICE_DATA` table
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(INVOICE_COLUMNS.iter().map(|c| c.to_string()).collect());
        table.push_row(vec![
            Value::Text(self.file_name.clone()),
            Value::Text(self.question.clone()),
            Value::Text(self.response.clone()),
            Value::Timestamp(self.asked_at),
        ]);
        table
    }
}

pub struct DocumentAiService {
    model: Arc<dyn VisionModel>,
    loader: Arc<dyn TableLoader>,
    database: String,
    schema: String,
}

impl DocumentAiService {
    pub fn new(
        model: Arc<dyn VisionModel>,
        loader: Arc<dyn TableLoader>,
        database: impl Into<String>,
        schema: impl Into<String>,
    ) -> Self {
        Self {
            model,
            loader,
            database: database.into(),
            schema: schema.into(),
        }
    }

    /// Ask `question` about the image in `data` and record the answer.
    ///
    /// The image type comes from `file_name`'s extension (jpg, jpeg or png).
    #[tracing::instrument(skip(self, data), fields(bytes = data.len()))]
    pub async fn ask(
        &self,
        file_name: &str,
        data: Vec<u8>,
        question: &str,
    ) -> ServiceResult<InvoiceAnswer> {
        if question.trim().is_empty() {
            return Err(ServiceError::validation("question must not be empty"));
        }
        let image = ImageInput::from_file_name(file_name, data)?;

        let response = self
            .model
            .ask(INVOICE_PROMPT, &image, question)
            .await
            .map_err(|e| ServiceError::Model(e.message().to_string()))?;

        let answer = InvoiceAnswer {
            file_name: file_name.to_string(),
            question: question.to_string(),
            response,
            asked_at: Local::now().naive_local(),
        };

        let target = TableTarget::new(&self.database, &self.schema, INVOICE_TABLE)?;
        self.loader.write_table(&answer.to_table(), &target, true).await?;
        tracing::debug!(table = %target, "recorded invoice answer");

        Ok(answer)
    }
}
