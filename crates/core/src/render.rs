//! Placeholder substitution and per-event message variants.

use crate::constants::{
    CASE_EVENT_TOKEN, DATE_FORMAT, DATE_TOKEN, EVENT_TIME_TOKEN, OBSERVATION_TAG,
    SCHEDULED_TIME_TOKEN, TIME_FORMAT, TRIGGER_CANCELED, TRIGGER_EVENT, TRIGGER_EVENT_TOKEN,
    TRIGGER_SCHEDULED,
};
use crate::fields::FieldValues;
use crate::schedule::{CaseEventTable, EventSchedule};
use crate::segment::MessageTemplate;
use casegen_types::SequenceTag;
use chrono::NaiveDateTime;

/// A fully substituted message and the tag used to name its output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub text: String,
    pub tag: SequenceTag,
}

/// Which set of SIU messages to produce for a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    /// The S12 scheduling message only.
    Scheduled,
    /// The S12 scheduling message followed by one S14 message per clinical event.
    #[default]
    ScheduledAndCaseEvents,
    /// The S12 scheduling message followed by an S15 cancellation.
    ScheduledAndCanceled,
}

/// Which date an event variant writes into the date placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventDatePolicy {
    /// The event's own computed date, so events after midnight carry the next day.
    #[default]
    Event,
    /// The anchor date for every variant.
    Anchor,
}

/// Replace every known `{placeholder}` in `text`.
///
/// Tokens whose key is not bound in `values` are copied through unchanged. The scan is a
/// single left-to-right pass, so substituted values are never themselves re-substituted.
pub fn fill_template(text: &str, values: &FieldValues) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let candidate = &rest[open..];

        let replacement = candidate
            .find('}')
            .map(|close| &candidate[..=close])
            .and_then(|token| values.lookup_token(token).map(|value| (token.len(), value)));

        match replacement {
            Some((consumed, value)) => {
                output.push_str(value);
                rest = &candidate[consumed..];
            }
            None => {
                output.push('{');
                rest = &candidate[1..];
            }
        }
    }

    output.push_str(rest);
    output
}

/// Renders the message variants of one case against an event table.
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'a> {
    table: &'a CaseEventTable,
    date_policy: EventDatePolicy,
}

impl<'a> Renderer<'a> {
    pub fn new(table: &'a CaseEventTable) -> Self {
        Self {
            table,
            date_policy: EventDatePolicy::default(),
        }
    }

    pub fn with_date_policy(mut self, date_policy: EventDatePolicy) -> Self {
        self.date_policy = date_policy;
        self
    }

    /// Render the messages of `kind`.
    ///
    /// `schedule` is `None` when the anchor date or time could not be read; time fields then
    /// keep their placeholder tokens but every variant is still produced.
    pub fn render(
        &self,
        kind: MessageKind,
        template: &MessageTemplate,
        base_values: &FieldValues,
        schedule: Option<&EventSchedule>,
    ) -> Vec<RenderedMessage> {
        match kind {
            MessageKind::Scheduled => {
                vec![self.render_scheduling(template, base_values, schedule)]
            }
            MessageKind::ScheduledAndCaseEvents => {
                self.render_variants(template, base_values, schedule)
            }
            MessageKind::ScheduledAndCanceled => {
                let scheduling = self.render_scheduling(template, base_values, schedule);
                let mut values = anchor_bindings(base_values, schedule);
                values.bind(TRIGGER_EVENT_TOKEN, TRIGGER_CANCELED);
                let canceled = RenderedMessage {
                    text: fill_template(&template.without(OBSERVATION_TAG).to_text(), &values),
                    tag: SequenceTag::canceled(),
                };
                vec![scheduling, canceled]
            }
        }
    }

    /// The scheduling variant followed by one variant per table event, in table order.
    pub fn render_variants(
        &self,
        template: &MessageTemplate,
        base_values: &FieldValues,
        schedule: Option<&EventSchedule>,
    ) -> Vec<RenderedMessage> {
        let mut messages = Vec::with_capacity(self.table.len() + 1);
        messages.push(self.render_scheduling(template, base_values, schedule));

        let full_text = template.to_text();
        for (index, event) in self.table.event_names().enumerate() {
            let mut values = anchor_bindings(base_values, schedule);
            values.bind(TRIGGER_EVENT_TOKEN, TRIGGER_EVENT);
            values.bind(CASE_EVENT_TOKEN, event);

            match schedule.and_then(|s| s.get(event)) {
                Some(time) => {
                    values.bind(EVENT_TIME_TOKEN, time.format(TIME_FORMAT).to_string());
                    if self.date_policy == EventDatePolicy::Event {
                        values.bind(DATE_TOKEN, time.format(DATE_FORMAT).to_string());
                    }
                }
                None => {
                    // No timestamp: leave the event time visibly unfilled.
                    values.remove(EVENT_TIME_TOKEN);
                }
            }

            messages.push(RenderedMessage {
                text: fill_template(&full_text, &values),
                tag: SequenceTag::event(index + 1),
            });
        }

        tracing::debug!(
            variants = messages.len(),
            scheduled = schedule.is_some(),
            "rendered case variants"
        );
        messages
    }

    fn render_scheduling(
        &self,
        template: &MessageTemplate,
        base_values: &FieldValues,
        schedule: Option<&EventSchedule>,
    ) -> RenderedMessage {
        let mut values = anchor_bindings(base_values, schedule);
        values.bind(TRIGGER_EVENT_TOKEN, TRIGGER_SCHEDULED);

        RenderedMessage {
            text: fill_template(&template.without(OBSERVATION_TAG).to_text(), &values),
            tag: SequenceTag::scheduling(),
        }
    }
}

/// Base values with the anchor written into the date, scheduled-time and event-time slots.
///
/// Without a schedule the event time is unbound so its token stays literal.
fn anchor_bindings(base_values: &FieldValues, schedule: Option<&EventSchedule>) -> FieldValues {
    let mut values = base_values.clone();
    match schedule.map(EventSchedule::anchor) {
        Some(anchor) => bind_anchor(&mut values, anchor),
        None => {
            values.remove(EVENT_TIME_TOKEN);
        }
    }
    values
}

fn bind_anchor(values: &mut FieldValues, anchor: NaiveDateTime) {
    let time = anchor.format(TIME_FORMAT).to_string();
    values.bind(DATE_TOKEN, anchor.format(DATE_FORMAT).to_string());
    values.bind(SCHEDULED_TIME_TOKEN, time.clone());
    values.bind(EVENT_TIME_TOKEN, time);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{parse_anchor, resolve_schedule, EventProfile, NoJitter};
    use crate::templates::DEFAULT_SIU_TEMPLATE;

    fn values(pairs: &[(&str, &str)]) -> FieldValues {
        FieldValues::from_pairs(pairs.iter().copied()).unwrap()
    }

    fn schedule_for(table: &CaseEventTable) -> EventSchedule {
        let anchor = parse_anchor(Some("20240601"), Some("0800")).unwrap();
        resolve_schedule(anchor, 90, table, &mut NoJitter).unwrap()
    }

    #[test]
    fn fill_template_replaces_every_occurrence() {
        let text = "PID|{patientLastName}^{patientFirstName}|{patientLastName}";
        let filled = fill_template(
            text,
            &values(&[("patientLastName", "SMITH"), ("patientFirstName", "JO")]),
        );
        assert_eq!(filled, "PID|SMITH^JO|SMITH");
    }

    #[test]
    fn fill_template_leaves_unknown_tokens_byte_for_byte() {
        let text = "A|{known}|{unknown}|{ broken|{}|{{nested}}|}";
        let filled = fill_template(text, &values(&[("known", "K")]));
        assert_eq!(filled, "A|K|{unknown}|{ broken|{}|{{nested}}|}");
    }

    #[test]
    fn fill_template_does_not_resubstitute_values() {
        let filled = fill_template(
            "{a}|{b}",
            &values(&[("a", "{b}"), ("b", "B")]),
        );
        assert_eq!(filled, "{b}|B");
    }

    #[test]
    fn fill_template_binds_empty_values() {
        let filled = fill_template("NTE|1||{specialNeeds}|", &values(&[("specialNeeds", "")]));
        assert_eq!(filled, "NTE|1|||");
    }

    #[test]
    fn render_variants_produces_scheduling_then_one_per_event() {
        let table = EventProfile::Current.table();
        let template = MessageTemplate::parse(DEFAULT_SIU_TEMPLATE);
        let schedule = schedule_for(&table);

        let messages = Renderer::new(&table).render_variants(
            &template,
            &values(&[("patientLastName", "SMITH")]),
            Some(&schedule),
        );

        assert_eq!(messages.len(), table.len() + 1);
        assert_eq!(messages[0].tag.as_str(), "00");
        for (index, message) in messages.iter().enumerate().skip(1) {
            assert_eq!(message.tag.as_str(), format!("{index:02}"));
        }
        assert!(!messages[0].text.lines().any(|l| l.starts_with("OBX")));
        for message in &messages[1..] {
            assert_eq!(message.text.lines().filter(|l| l.starts_with("OBX")).count(), 1);
        }
    }

    #[test]
    fn scheduling_variant_drops_observation_and_fills_patient() {
        let table = CaseEventTable::parse([("setup", "0")]).unwrap();
        let template = MessageTemplate::parse("MSH|{triggerEvent}\nOBX|1|DTM|{caseEvent}\nPID|1||{patientLastName}");
        let messages = Renderer::new(&table).render_variants(
            &template,
            &values(&[("{patientLastName}", "SMITH")]),
            None,
        );
        assert_eq!(messages[0].text, "MSH|S12\nPID|1||SMITH");
    }

    #[test]
    fn event_variants_carry_event_name_time_and_trigger() {
        let table = EventProfile::Current.table();
        let template = MessageTemplate::parse(DEFAULT_SIU_TEMPLATE);
        let schedule = schedule_for(&table);
        let messages = Renderer::new(&table).render_variants(&template, &FieldValues::new(), Some(&schedule));

        let closing_index = table.event_names().position(|e| e == "closing").unwrap() + 1;
        let closing = &messages[closing_index].text;
        assert!(closing.contains("SIU^S14"));
        assert!(closing.contains("OBX|1|DTM|closing|In|20240601090000|"));
        assert!(closing.starts_with(r"MSH|^~\&|EPIC|NC||NC|20240601090000||"));
        assert!(closing.contains("^^^20240601080000"));

        assert!(messages[0].text.contains("SIU^S12"));
        assert!(messages[0].text.starts_with(r"MSH|^~\&|EPIC|NC||NC|20240601080000||"));
    }

    #[test]
    fn event_date_follows_policy_across_midnight() {
        let table = CaseEventTable::parse([("late", "120")]).unwrap();
        let template = MessageTemplate::parse("OBX|{YYYYMMDD}{eventTime}");
        let anchor = parse_anchor(Some("20240601"), Some("2300")).unwrap();
        let schedule = resolve_schedule(anchor, 60, &table, &mut NoJitter).unwrap();

        let by_event = Renderer::new(&table).render_variants(&template, &FieldValues::new(), Some(&schedule));
        assert_eq!(by_event[1].text, "OBX|202406020100");

        let by_anchor = Renderer::new(&table)
            .with_date_policy(EventDatePolicy::Anchor)
            .render_variants(&template, &FieldValues::new(), Some(&schedule));
        assert_eq!(by_anchor[1].text, "OBX|202406010100");
    }

    #[test]
    fn missing_schedule_keeps_time_placeholders_but_emits_every_variant() {
        let table = EventProfile::Legacy.table();
        let template = MessageTemplate::parse(DEFAULT_SIU_TEMPLATE);
        let base = values(&[("patientMRN", "123"), ("eventTime", "stale")]);
        let messages = Renderer::new(&table).render_variants(&template, &base, None);

        assert_eq!(messages.len(), table.len() + 1);
        for message in &messages {
            assert!(message.text.contains("{YYYYMMDD}{eventTime}00"));
            assert!(message.text.contains("123"));
        }
        assert!(messages[1].text.contains("|arrive|"));
    }

    #[test]
    fn canceled_kind_renders_s12_and_s15_without_observation() {
        let table = EventProfile::Current.table();
        let template = MessageTemplate::parse(DEFAULT_SIU_TEMPLATE);
        let schedule = schedule_for(&table);
        let messages = Renderer::new(&table).render(
            MessageKind::ScheduledAndCanceled,
            &template,
            &FieldValues::new(),
            Some(&schedule),
        );
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].tag.as_str(), "15");
        assert!(messages[1].text.contains("SIU^S15"));
        assert!(!messages[1].text.contains("OBX"));
    }

    #[test]
    fn scheduled_kind_renders_only_the_scheduling_message() {
        let table = EventProfile::Current.table();
        let template = MessageTemplate::parse(DEFAULT_SIU_TEMPLATE);
        let messages =
            Renderer::new(&table).render(MessageKind::Scheduled, &template, &FieldValues::new(), None);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].tag.as_str(), "00");
    }
}
