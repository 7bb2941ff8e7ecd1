//! Recurring event materialization.
//!
//! Each run expands every recurring template over
//! `[today, today + EXPANSION_DAYS]` and stores one instance per occurrence
//! that does not have one yet. Runs are idempotent: a second run over the
//! same templates only counts skips.
//!
//! Templates whose rule does not parse are reported rather than failing the
//! run. A store failure on one template is recorded and the run moves on,
//! unless [`FailurePolicy::FailFast`] is configured. Instances stored before
//! a failure are kept either way.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use gathercal_core::{DateWindow, Instance, Occurrences, RuleParse, Template};
use gathercal_store::{EventStore, StoreResult};

use crate::config::{FailurePolicy, MaterializerConfig};
use crate::error::{ServerError, ServerResult};

/// A template skipped because its rule is not in the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnrecognizedRule {
    pub template_id: String,
    pub rule: String,
}

/// A template whose expansion stopped on a store error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFailure {
    pub template_id: String,
    pub error: String,
    pub retryable: bool,
}

/// The `{created, skipped}` result of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionSummary {
    pub created: usize,
    pub skipped: usize,
}

/// Everything a run observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionReport {
    /// Instances stored by this run.
    pub created: usize,
    /// Occurrences that already had an instance.
    pub skipped: usize,
    pub unrecognized: Vec<UnrecognizedRule>,
    pub failures: Vec<TemplateFailure>,
}

impl ExpansionReport {
    pub fn summary(&self) -> ExpansionSummary {
        ExpansionSummary {
            created: self.created,
            skipped: self.skipped,
        }
    }

    /// True when no template was skipped or failed.
    pub fn is_clean(&self) -> bool {
        self.unrecognized.is_empty() && self.failures.is_empty()
    }
}

/// Expands recurring templates into stored instances.
pub struct InstanceMaterializer {
    store: Arc<dyn EventStore>,
    config: MaterializerConfig,
}

impl InstanceMaterializer {
    pub fn new(store: Arc<dyn EventStore>, config: MaterializerConfig) -> Self {
        Self { store, config }
    }

    /// Runs one expansion for the run date `today`.
    ///
    /// # Errors
    ///
    /// Fails if the templates cannot be listed, or, under
    /// [`FailurePolicy::FailFast`], at the first template that fails.
    #[instrument(skip(self), fields(store = self.store.name()))]
    pub async fn run(&self, today: NaiveDate) -> ServerResult<ExpansionReport> {
        let window = DateWindow::expansion(today);
        let templates = self.store.recurring_templates().await?;
        debug!(
            templates = templates.len(),
            start = %window.start,
            end = %window.end,
            "Expanding templates"
        );

        let mut report = ExpansionReport::default();
        for template in &templates {
            let parse = template.rule();
            if let RuleParse::Unrecognized(raw) = &parse {
                warn!(template_id = %template.id, rule = %raw, "Unrecognized recurrence rule");
                report.unrecognized.push(UnrecognizedRule {
                    template_id: template.id.clone(),
                    rule: raw.clone(),
                });
                continue;
            }

            let occurrences = Occurrences::for_parse(&parse, window);
            if let Err(e) = self.expand_template(template, occurrences, &mut report).await {
                match self.config.failure_policy {
                    FailurePolicy::FailFast => {
                        return Err(ServerError::ExpansionAborted {
                            template_id: template.id.clone(),
                            created: report.created,
                            skipped: report.skipped,
                            source: e,
                        });
                    }
                    FailurePolicy::ContinueOnError => {
                        warn!(template_id = %template.id, error = %e, "Template expansion failed");
                        report.failures.push(TemplateFailure {
                            template_id: template.id.clone(),
                            error: e.to_string(),
                            retryable: e.is_retryable(),
                        });
                    }
                }
            }
        }

        info!(
            created = report.created,
            skipped = report.skipped,
            unrecognized = report.unrecognized.len(),
            failures = report.failures.len(),
            "Expansion complete"
        );
        Ok(report)
    }

    /// Stores the missing occurrences of one template in a single batch.
    async fn expand_template(
        &self,
        template: &Template,
        occurrences: Occurrences,
        report: &mut ExpansionReport,
    ) -> StoreResult<()> {
        let mut pending = Vec::new();
        for date in occurrences {
            if self.store.instance_exists(&template.id, date).await? {
                report.skipped += 1;
                continue;
            }
            pending.push(Instance::from_template(
                template,
                date,
                Uuid::new_v4().to_string(),
                Utc::now(),
            ));
        }
        if pending.is_empty() {
            return Ok(());
        }

        let outcomes = self.store.insert_instances_if_absent(pending).await?;
        let created = outcomes.iter().filter(|o| o.is_created()).count();
        let raced = outcomes.len() - created;
        if raced > 0 {
            debug!(template_id = %template.id, raced, "Instances created concurrently");
        }
        debug!(template_id = %template.id, created, "Created instances");
        report.created += created;
        report.skipped += raced;
        Ok(())
    }
}
