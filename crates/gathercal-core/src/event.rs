//! Event records.
//!
//! This module provides the record types that flow through the calendar
//! pipeline:
//! - [`Template`]: a recurring event definition carrying a rule string
//! - [`Instance`]: a concrete dated event generated from a template
//! - [`RawEventRecord`]: an event as fetched from storage
//! - [`MergedEvent`]: a raw record with "also published by" cross-references
//!
//! Field names serialize in camelCase to match the persisted record shape.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::rule::{RuleParse, parse_rule};

fn default_true() -> bool {
    true
}

/// A recurring event definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Unique identifier of the template.
    #[serde(alias = "eventId")]
    pub id: String,
    /// Recurrence rule string; empty for one-off events.
    #[serde(default)]
    pub recurrence_rule: String,
    /// Event title.
    pub title: String,
    /// Time of day, usually `HH:MM`.
    #[serde(default)]
    pub time: Option<String>,
    /// Free-text location.
    #[serde(default)]
    pub location: Option<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Owning group, if any.
    #[serde(default)]
    pub group_id: Option<String>,
    /// Associated topic, if any.
    #[serde(default)]
    pub topic_slug: Option<String>,
    /// User who created the template.
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub is_native: bool,
    #[serde(default)]
    pub rsvp_enabled: bool,
    #[serde(default = "default_true")]
    pub show_rsvp_list: bool,
}

impl Template {
    /// Creates a new template with the given id, title and rule.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        recurrence_rule: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            recurrence_rule: recurrence_rule.into(),
            title: title.into(),
            time: None,
            location: None,
            description: None,
            group_id: None,
            topic_slug: None,
            created_by: None,
            is_native: false,
            rsvp_enabled: false,
            show_rsvp_list: true,
        }
    }

    /// Returns true if the template carries a non-empty rule.
    pub fn is_recurring(&self) -> bool {
        !self.recurrence_rule.is_empty()
    }

    /// Parses the template's rule string.
    pub fn rule(&self) -> RuleParse {
        parse_rule(&self.recurrence_rule)
    }

    /// Builder method to set the time of day.
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the owning group.
    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Builder method to set the topic.
    pub fn with_topic(mut self, topic_slug: impl Into<String>) -> Self {
        self.topic_slug = Some(topic_slug.into());
        self
    }

    /// Builder method to set the creator.
    pub fn with_creator(mut self, user_id: impl Into<String>) -> Self {
        self.created_by = Some(user_id.into());
        self
    }
}

/// A concrete event generated from a [`Template`] for one date.
///
/// At most one instance exists per `(parent_id, event_date)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    /// Identity of the originating template (weak reference).
    #[serde(alias = "parentEventId")]
    pub parent_id: String,
    pub title: String,
    pub event_date: NaiveDate,
    pub time: String,
    pub location: String,
    pub description: String,
    pub group_id: Option<String>,
    pub topic_slug: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub is_native: bool,
    #[serde(default)]
    pub rsvp_enabled: bool,
    #[serde(default = "default_true")]
    pub show_rsvp_list: bool,
    #[serde(default)]
    pub upvote_count: u32,
    /// Always true for machine-generated instances.
    pub is_recurrence_instance: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Instance {
    /// Builds the instance of `template` dated on `event_date`.
    ///
    /// Display fields are copied from the template; missing text fields
    /// become empty strings.
    pub fn from_template(
        template: &Template,
        event_date: NaiveDate,
        id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id: template.id.clone(),
            title: template.title.clone(),
            event_date,
            time: template.time.clone().unwrap_or_default(),
            location: template.location.clone().unwrap_or_default(),
            description: template.description.clone().unwrap_or_default(),
            group_id: template.group_id.clone(),
            topic_slug: template.topic_slug.clone(),
            created_by: template.created_by.clone(),
            is_native: template.is_native,
            rsvp_enabled: template.rsvp_enabled,
            show_rsvp_list: template.show_rsvp_list,
            upvote_count: 0,
            is_recurrence_instance: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// The uniqueness key of this instance.
    pub fn key(&self) -> (&str, NaiveDate) {
        (&self.parent_id, self.event_date)
    }

    /// Converts the instance into the record shape served to readers.
    pub fn to_record(&self) -> RawEventRecord {
        RawEventRecord {
            id: self.id.clone(),
            title: self.title.clone(),
            event_date: self.event_date,
            time: non_empty(&self.time),
            end_date: None,
            location: non_empty(&self.location),
            description: non_empty(&self.description),
            group_id: self.group_id.clone(),
            group_name: None,
            group_website: None,
            url: None,
            parent_id: Some(self.parent_id.clone()),
            is_recurrence_instance: true,
            city: None,
            state: None,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// An event as fetched from storage.
///
/// Several records may describe the same real-world event when it is
/// cross-posted by different groups. `end_date` is kept as submitted text;
/// it is only interpreted when the calendar is bucketed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventRecord {
    #[serde(default, alias = "eventId")]
    pub id: String,
    pub title: String,
    pub event_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Display name of the publishing group.
    #[serde(default, rename = "group", skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub is_recurrence_instance: bool,
    /// City extracted from the location, filled in during normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// State extracted from the location, filled in during normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl RawEventRecord {
    /// Creates a record with the required fields.
    pub fn new(id: impl Into<String>, title: impl Into<String>, event_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            event_date,
            time: None,
            end_date: None,
            location: None,
            description: None,
            group_id: None,
            group_name: None,
            group_website: None,
            url: None,
            parent_id: None,
            is_recurrence_instance: false,
            city: None,
            state: None,
        }
    }

    /// Returns the publishing group id, treating empty strings as absent.
    pub fn source(&self) -> Option<&str> {
        self.group_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Builder method to set the time of day.
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Builder method to set the end date text.
    pub fn with_end_date(mut self, end_date: impl Into<String>) -> Self {
        self.end_date = Some(end_date.into());
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method to set the publishing group.
    pub fn with_group(mut self, group_id: impl Into<String>, name: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self.group_name = Some(name.into());
        self
    }

    /// Builder method to set the group website.
    pub fn with_group_website(mut self, website: impl Into<String>) -> Self {
        self.group_website = Some(website.into());
        self
    }

    /// Builder method to set the event URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// A pointer to another group that published the same event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReference {
    /// Group name, or group id when the name is unknown.
    #[serde(rename = "group")]
    pub source: String,
    /// Group website, or the event URL when the website is unknown.
    pub url: Option<String>,
}

impl CrossReference {
    /// Builds the cross-reference describing `record`'s publisher.
    ///
    /// Returns `None` when the record has no publishing group.
    pub fn from_record(record: &RawEventRecord) -> Option<Self> {
        let group_id = record.source()?;
        Some(Self {
            source: record
                .group_name
                .clone()
                .unwrap_or_else(|| group_id.to_string()),
            url: record.group_website.clone().or_else(|| record.url.clone()),
        })
    }
}

/// One displayable record standing for a group of duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedEvent {
    /// The primary record's fields.
    #[serde(flatten)]
    pub event: RawEventRecord,
    /// Other groups that published the same event.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub also_published_by: Vec<CrossReference>,
}

impl MergedEvent {
    /// Wraps a record with no cross-references.
    pub fn single(event: RawEventRecord) -> Self {
        Self {
            event,
            also_published_by: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn instance_copies_template_fields() {
        let template = Template::new("tpl-1", "Rust Meetup", "WEEKLY:TUE")
            .with_time("18:30")
            .with_location("Library, Arlington, VA")
            .with_group("grp-1")
            .with_topic("rust")
            .with_creator("user-1");
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap();

        let instance = Instance::from_template(&template, date(2024, 1, 2), "inst-1", now);

        assert_eq!(instance.parent_id, "tpl-1");
        assert_eq!(instance.title, "Rust Meetup");
        assert_eq!(instance.time, "18:30");
        assert_eq!(instance.description, "");
        assert_eq!(instance.group_id.as_deref(), Some("grp-1"));
        assert_eq!(instance.topic_slug.as_deref(), Some("rust"));
        assert!(instance.is_recurrence_instance);
        assert!(instance.show_rsvp_list);
        assert_eq!(instance.created_at, now);
        assert_eq!(instance.updated_at, now);
        assert_eq!(instance.key(), ("tpl-1", date(2024, 1, 2)));
    }

    #[test]
    fn instance_serializes_record_shape() {
        let template = Template::new("tpl-1", "Standup", "WEEKLY:MON");
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let instance = Instance::from_template(&template, date(2024, 1, 1), "inst-1", now);

        let json = serde_json::to_value(&instance).unwrap();
        assert_eq!(json["parentId"], "tpl-1");
        assert_eq!(json["eventDate"], "2024-01-01");
        assert_eq!(json["isRecurrenceInstance"], true);
        assert_eq!(json["groupId"], serde_json::Value::Null);
        assert_eq!(json["topicSlug"], serde_json::Value::Null);
    }

    #[test]
    fn instance_record_drops_empty_text() {
        let template = Template::new("tpl-1", "Standup", "WEEKLY:MON").with_time("09:00");
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let record = Instance::from_template(&template, date(2024, 1, 1), "i", now).to_record();

        assert_eq!(record.time.as_deref(), Some("09:00"));
        assert_eq!(record.location, None);
        assert_eq!(record.parent_id.as_deref(), Some("tpl-1"));
        assert!(record.is_recurrence_instance);
    }

    #[test]
    fn template_deserializes_with_defaults() {
        let template: Template = serde_json::from_str(
            r#"{"eventId": "t1", "title": "Hack Night", "recurrenceRule": "MONTHLY:LAST:THU"}"#,
        )
        .unwrap();
        assert_eq!(template.id, "t1");
        assert!(template.is_recurring());
        assert!(template.rule().is_recognized());
        assert!(template.show_rsvp_list);
        assert!(!template.rsvp_enabled);

        let one_off: Template =
            serde_json::from_str(r#"{"id": "t2", "title": "Launch party"}"#).unwrap();
        assert!(!one_off.is_recurring());
    }

    #[test]
    fn cross_reference_prefers_names_and_websites() {
        let record = RawEventRecord::new("e1", "Talk", date(2024, 3, 1))
            .with_group("grp-2", "Python DC")
            .with_group_website("https://pythondc.example")
            .with_url("https://events.example/e1");
        let xref = CrossReference::from_record(&record).unwrap();
        assert_eq!(xref.source, "Python DC");
        assert_eq!(xref.url.as_deref(), Some("https://pythondc.example"));

        let mut bare = RawEventRecord::new("e2", "Talk", date(2024, 3, 1)).with_url("https://x");
        bare.group_id = Some("grp-3".into());
        let xref = CrossReference::from_record(&bare).unwrap();
        assert_eq!(xref.source, "grp-3");
        assert_eq!(xref.url.as_deref(), Some("https://x"));

        bare.group_id = Some(String::new());
        assert!(CrossReference::from_record(&bare).is_none());
    }

    #[test]
    fn merged_event_omits_empty_cross_references() {
        let merged = MergedEvent::single(RawEventRecord::new("e1", "Talk", date(2024, 3, 1)));
        let json = serde_json::to_value(&merged).unwrap();
        assert_eq!(json["title"], "Talk");
        assert!(json.get("also_published_by").is_none());
    }
}
