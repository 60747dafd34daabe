use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use tripcheck_common::PassengerSection;

use super::PageContext;
use crate::browser::Locator;
use crate::error::{E2eError, E2eResult};
use crate::poll::{poll_until_true, Escalation};

const CONTINUE_TIMEOUT: Duration = Duration::from_secs(20);
const VALIDATION_TRIGGER_TIMEOUT: Duration = Duration::from_secs(3);
const FIELD_POLL_TIMEOUT: Duration = Duration::from_secs(15);

/// Continue clicks allowed on top of the first one
const MAX_RETRIGGERS: u32 = 5;

/// Validation confirmed for one field prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCheck {
    pub section: PassengerSection,
    pub field: String,
    pub errors: usize,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub sections: Vec<PassengerSection>,
    pub trigger_attempts: u32,
    pub fields: Vec<FieldCheck>,
}

/// Passenger form at the end of the funnel
pub struct PassengerDetailsPage {
    ctx: PageContext,
}

impl PassengerDetailsPage {
    pub fn new(ctx: PageContext) -> Self {
        Self { ctx }
    }

    pub fn pax_form(&self) -> Locator {
        Locator::css("#pax-form")
    }

    pub fn continue_button(&self) -> Locator {
        Locator::css(
            "#PassengerV2ContinueButton__component .ContinueButtonV2__continue:visible button",
        )
    }

    pub fn first_name_infant_inputs(&self) -> Locator {
        Locator::css("[id^=\"FIRSTNAMEINFANT\"]")
    }

    pub fn first_name_child_inputs(&self) -> Locator {
        Locator::css("[id^=\"FIRSTNAMECHILD\"]")
    }

    fn any_error_message(&self) -> Locator {
        Locator::css("[id$=\"__errorMessage\"]:visible")
    }

    /// Visible error nodes for a field id prefix, e.g. `FIRSTNAMEADULT1__errorMessage`
    pub fn error_messages_for_field(&self, prefix: &str) -> Locator {
        Locator::css(format!(
            "[id^=\"{p}\"][id$=\"__errorMessage\"]:visible, [id^=\"{p}\"][id$=\"_error\"]:visible",
            p = prefix
        ))
    }

    /// Click continue to trigger client-side validation
    pub async fn click_continue(&self) -> E2eResult<()> {
        self.ctx
            .safe_click_within(&self.continue_button(), CONTINUE_TIMEOUT)
            .await?;
        Ok(())
    }

    /// Whether any validation error shows up within `timeout`
    pub async fn wait_for_validation_triggered(&self, timeout: Duration) -> bool {
        let ctx = &self.ctx;
        let any_error = &self.any_error_message();
        poll_until_true(timeout, move || async move {
            ctx.count(any_error).await.map(|n| n > 0).unwrap_or(false)
        })
        .await
    }

    /// Main booker always; child and infant sections when their inputs exist
    pub async fn sections_to_validate(&self) -> Vec<PassengerSection> {
        let mut sections = vec![PassengerSection::AdultMainBooker];
        if self.present(&self.first_name_infant_inputs()).await {
            sections.push(PassengerSection::InfantPassenger);
        }
        if self.present(&self.first_name_child_inputs()).await {
            sections.push(PassengerSection::ChildPassenger);
        }
        sections
    }

    async fn present(&self, locator: &Locator) -> bool {
        match self.ctx.count(locator).await {
            Ok(n) => n > 0,
            Err(e) => {
                debug!("Counting {} failed, treating as absent: {}", locator, e);
                false
            }
        }
    }

    /// Number of visible errors for a field right now, without waiting
    pub async fn error_count_for_field(&self, prefix: &str) -> E2eResult<usize> {
        self.ctx
            .count(&self.error_messages_for_field(prefix))
            .await
    }

    pub async fn has_error_for_field(&self, prefix: &str) -> E2eResult<bool> {
        Ok(self.error_count_for_field(prefix).await? > 0)
    }

    /// Submit the empty form and confirm every required field reports an error
    pub async fn validate_passenger_field_errors(&self) -> E2eResult<ValidationReport> {
        let form = self.pax_form();
        let timeout = self.ctx.config().timeouts.page_load();
        if !self.ctx.wait_visible(&form, timeout).await? {
            return Err(E2eError::VisibilityTimeout {
                target: form.to_string(),
                timeout,
            });
        }

        self.click_continue().await?;

        let ctx = &self.ctx;
        let continue_button = &self.continue_button();
        let retrigger = move || async move {
            ctx.safe_click_within(continue_button, CONTINUE_TIMEOUT)
                .await
                .map(|_| ())
        };

        let any_error = &self.any_error_message();
        let trigger = Escalation::new(MAX_RETRIGGERS + 1, VALIDATION_TRIGGER_TIMEOUT)
            .confirm(
                "passenger form validation",
                move || async move { ctx.count(any_error).await.map(|n| n > 0).unwrap_or(false) },
                retrigger,
            )
            .await?;

        let sections = self.sections_to_validate().await;
        let mut fields = Vec::new();

        for &section in &sections {
            for &field in section.field_ids() {
                let errors = &self.error_messages_for_field(field);
                let confirmation = Escalation::new(MAX_RETRIGGERS + 1, FIELD_POLL_TIMEOUT)
                    .confirm(
                        field,
                        move || async move { ctx.count(errors).await.map(|n| n > 0).unwrap_or(false) },
                        retrigger,
                    )
                    .await
                    .map_err(|e| match e {
                        E2eError::FeedbackNotTriggered {
                            attempts, elapsed, ..
                        } => E2eError::ValidationMissing {
                            section: section.to_string(),
                            field: field.to_string(),
                            attempts,
                            elapsed,
                        },
                        other => other,
                    })?;

                let count = ctx.count(errors).await?;
                self.expect_error_text(section, field, errors, count).await?;

                debug!(
                    "{}/{}: {} error(s) after {} attempt(s)",
                    section, field, count, confirmation.attempts
                );
                fields.push(FieldCheck {
                    section,
                    field: field.to_string(),
                    errors: count,
                    attempts: confirmation.attempts,
                });
            }
        }

        info!(
            "[BOOKING] Passenger validation confirmed for {} field(s) in {:?}",
            fields.len(),
            sections
        );
        Ok(ValidationReport {
            sections,
            trigger_attempts: trigger.attempts,
            fields,
        })
    }

    /// Errors were rendered; at least one of them must say something
    async fn expect_error_text(
        &self,
        section: PassengerSection,
        field: &str,
        errors: &Locator,
        count: usize,
    ) -> E2eResult<()> {
        for i in 0..count {
            if !self.ctx.text(&errors.nth(i)).await?.trim().is_empty() {
                return Ok(());
            }
        }
        Err(E2eError::AssertionFailed(format!(
            "{}/{}: {} error element(s) rendered without a message",
            section, field, count
        )))
    }
}
