//! Phone inventory: the private-chat questionnaire, the JotForm submission
//! and per-rep IMEI stock.
//!
//! A rep starts with `/inventory <company>` and answers [`QUESTIONS`] one
//! message at a time. The finished answers are posted to the company's
//! JotForm with a generated signature; on success the IMEIs become the rep's
//! stock, and each `gen`/`aw` sale for the same company takes one phone.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use lumina_models::{InventoryRecord, SaleKind, UserId};
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::format::MessageFormat;
use crate::signature::signature_base64;

/// JotForm form id for inventory submissions.
pub const JOTFORM_FORM_ID: &str = "231344559880059";

/// Submission endpoint for [`JOTFORM_FORM_ID`].
pub const JOTFORM_SUBMIT_URL: &str = "https://submit.jotform.com/submit/231344559880059";

/// Upload server the form expects in every post.
pub const JOTFORM_UPLOAD_URL: &str = "https://upload.jotform.com/upload";

/// How long the bot waits for each answer.
pub const ANSWER_TIMEOUT_SECS: i64 = 300;

/// Display format of submission dates, e.g. `June 01, 2025 01:00 PM`.
pub const SUBMISSION_DATE_FORMAT: &str = "%B %d, %Y %I:%M %p";

/// Questions asked in order during `/inventory`.
pub const QUESTIONS: [&str; 5] = [
    "Do you have inventory? (YES/NO)",
    "First Name",
    "Last Name",
    "Agent Email",
    "IMEIs for phones (one per line, all phones)",
];

/// Formats `at` in `tz` the way submission dates are shown.
pub fn submission_date<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.with_timezone(tz).format(SUBMISSION_DATE_FORMAT).to_string()
}

/// Completed answers for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySubmission {
    pub company: String,
    pub has_inventory: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// The IMEI answer as typed, one per line.
    pub imeis: String,
}

impl InventorySubmission {
    /// Non-blank IMEI lines, trimmed, in the order given.
    pub fn imei_list(&self) -> Vec<String> {
        self.imeis
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Form fields for the JotForm post.
    pub fn form_fields(&self, signature: &str, date: &str) -> Vec<(&'static str, String)> {
        vec![
            ("q12_doYou", self.has_inventory.clone()),
            ("q6_whatCompany", self.company.clone()),
            ("q5_agentName[first]", self.first_name.clone()),
            ("q5_agentName[last]", self.last_name.clone()),
            ("q26_managerEmail", self.email.clone()),
            ("q24_imeisFor", self.imeis.clone()),
            ("q11_signature", signature.to_string()),
            ("q3_todaysDate", date.to_string()),
            ("formID", JOTFORM_FORM_ID.to_string()),
            ("submitSource", "unknown".to_string()),
            ("uploadServerUrl", JOTFORM_UPLOAD_URL.to_string()),
        ]
    }

    /// The stock record kept after a successful submission.
    pub fn to_record(&self, date: &str) -> InventoryRecord {
        InventoryRecord::new(self.company.clone(), self.imei_list(), date)
    }
}

/// Result of feeding one answer to a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftStep {
    /// Send this question next.
    Ask(&'static str),
    /// Every question is answered.
    Complete(InventorySubmission),
}

/// A questionnaire in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryDraft {
    company: String,
    answers: Vec<String>,
    deadline: DateTime<Utc>,
}

impl InventoryDraft {
    /// Starts a draft for `company` (stored upper-cased).
    pub fn new(company: &str, now: DateTime<Utc>) -> Self {
        Self {
            company: company.trim().to_uppercase(),
            answers: Vec::with_capacity(QUESTIONS.len()),
            deadline: now + Duration::seconds(ANSWER_TIMEOUT_SECS),
        }
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    /// The question awaiting an answer.
    pub fn current_question(&self) -> Option<&'static str> {
        QUESTIONS.get(self.answers.len()).copied()
    }

    /// True once the current question has waited longer than the timeout.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.deadline
    }

    /// Records the answer to the current question.
    pub fn answer(&mut self, text: &str, now: DateTime<Utc>) -> DraftStep {
        let text = if self.answers.len() + 1 == QUESTIONS.len() {
            text.to_string()
        } else {
            text.trim().to_string()
        };
        self.answers.push(text);
        self.deadline = now + Duration::seconds(ANSWER_TIMEOUT_SECS);

        match self.current_question() {
            Some(question) => DraftStep::Ask(question),
            None => DraftStep::Complete(self.submission()),
        }
    }

    fn submission(&self) -> InventorySubmission {
        let answer = |i: usize| self.answers.get(i).cloned().unwrap_or_default();
        InventorySubmission {
            company: self.company.clone(),
            has_inventory: answer(0),
            first_name: answer(1),
            last_name: answer(2),
            email: answer(3),
            imeis: answer(4),
        }
    }
}

/// Destination for finished inventory forms.
#[async_trait]
pub trait InventorySink: Send + Sync {
    async fn submit(&self, fields: &[(&'static str, String)]) -> Result<()>;
}

/// Renders the signature and posts `submission` to `sink`.
pub async fn submit_inventory(
    sink: &dyn InventorySink,
    submission: &InventorySubmission,
    date: &str,
) -> Result<()> {
    let signature = signature_base64(&submission.first_name, &submission.last_name)?;
    sink.submit(&submission.form_fields(&signature, date)).await
}

/// Posts inventory forms to JotForm as `application/x-www-form-urlencoded`.
pub struct JotForm {
    client: reqwest::Client,
    url: String,
}

impl JotForm {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            url: JOTFORM_SUBMIT_URL.to_string(),
        }
    }
}

#[async_trait]
impl InventorySink for JotForm {
    async fn submit(&self, fields: &[(&'static str, String)]) -> Result<()> {
        let response = self.client.post(&self.url).form(fields).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(CoreError::SubmissionRejected(status.as_u16()));
        }
        debug!(form_id = JOTFORM_FORM_ID, "Inventory form accepted");
        Ok(())
    }
}

/// Latest submitted inventory per rep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryBook {
    records: BTreeMap<UserId, InventoryRecord>,
}

impl InventoryBook {
    pub fn from_records(records: BTreeMap<UserId, InventoryRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &BTreeMap<UserId, InventoryRecord> {
        &self.records
    }

    pub fn get(&self, user: &UserId) -> Option<&InventoryRecord> {
        self.records.get(user)
    }

    /// Replaces the rep's inventory, returning the previous one.
    pub fn record(&mut self, user: UserId, record: InventoryRecord) -> Option<InventoryRecord> {
        self.records.insert(user, record)
    }

    /// Takes one phone off the rep's stock for a `gen` or `aw` sale when the
    /// stock belongs to that company. Returns the IMEI removed.
    pub fn deduct_sale(&mut self, user: &UserId, kind: SaleKind) -> Option<String> {
        let company = match kind {
            SaleKind::Gen => "GEN",
            SaleKind::Aw => "AW",
            SaleKind::Byod => return None,
        };
        self.records
            .get_mut(user)
            .filter(|record| record.company == company)
            .and_then(InventoryRecord::take_phone)
    }

    /// One line per rep: mention, company, phones on hand, submission date.
    /// Reps with no phones left are flagged.
    pub fn render_report(&self, fmt: &dyn MessageFormat) -> String {
        if self.records.is_empty() {
            return "No inventory submitted yet.".to_string();
        }

        let mut msg = fmt.bold("Inventory Report");
        msg.push_str(&fmt.escape("\nUser | Company | Phones | Submitted"));
        for (user, record) in &self.records {
            let count = record.phone_count();
            let line = format!(
                "{} | {} | {} | {}",
                fmt.mention(user),
                fmt.escape(&record.company),
                if count == 0 {
                    fmt.bold("0")
                } else {
                    count.to_string()
                },
                fmt.escape(&record.date)
            );
            msg.push('\n');
            if count == 0 {
                msg.push_str("⚠️ ");
            }
            msg.push_str(&line);
        }
        msg
    }
}
