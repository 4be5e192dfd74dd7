//! Case generation: caller policy around the schedule deriver and the renderer.

use crate::adt::{render_adt, Allergy};
use crate::config::CoreConfig;
use crate::constants::{
    DATE_TOKEN, DURATION_TOKEN, MAX_CASE_DURATION_MINUTES, SCHEDULED_TIME_TOKEN,
};
use crate::error::{from_yaml_with_path, CaseGenResult};
use crate::expand::{expand_repeated_blocks, fill_staff_block, insert_assistant_surgeons};
use crate::fields::FieldValues;
use crate::render::{fill_template, MessageKind, RenderedMessage, Renderer};
use crate::schedule::{parse_anchor, resolve_schedule_with, EventSchedule, RandomJitter};
use crate::segment::MessageTemplate;
use rand::Rng;

/// Everything needed to generate the messages for one surgical case.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseRequest {
    /// Base values shared by every message.
    #[serde(default)]
    pub values: FieldValues,
    /// Procedures after the first, each filling its own copy of the procedure block.
    #[serde(default)]
    pub procedures: Vec<FieldValues>,
    /// Staff members beyond the five fixed rows.
    #[serde(default)]
    pub staff: Vec<FieldValues>,
    /// Per-row values for the five fixed staff rows, in row order.
    #[serde(default)]
    pub fixed_staff: Vec<FieldValues>,
    /// Assistant surgeons, listed right after the primary surgeon.
    #[serde(default)]
    pub surgeons: Vec<FieldValues>,
    #[serde(default)]
    pub allergies: Vec<Allergy>,
    #[serde(default)]
    pub kind: MessageKind,
}

impl CaseRequest {
    /// Parse a case description from YAML.
    pub fn parse_yaml(yaml_text: &str) -> CaseGenResult<Self> {
        from_yaml_with_path("case", yaml_text)
    }
}

/// Result of generating one case.
#[derive(Debug, Clone)]
pub struct CaseOutput {
    pub messages: Vec<RenderedMessage>,
    /// `None` when the scheduled date or time could not be read, or an event time fell out of
    /// range.
    pub schedule: Option<EventSchedule>,
    pub duration_minutes: i64,
}

/// Generates case messages using a startup-resolved [`CoreConfig`].
#[derive(Clone, Debug, Default)]
pub struct CaseService {
    config: CoreConfig,
}

impl CaseService {
    pub fn new(config: CoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Generate every message for `request`.
    ///
    /// Missing fields take their configured defaults. A missing, non-numeric or out-of-range
    /// duration is replaced by a random value from the fallback range. An unreadable anchor is
    /// not an error: every variant is still rendered with its time placeholders left in place.
    pub fn generate<R: Rng>(&self, request: &CaseRequest, rng: &mut R) -> CaseGenResult<CaseOutput> {
        let mut values = request.values.clone();
        values.apply_defaults(self.config.field_defaults());
        let duration_minutes = resolve_duration(&mut values, self.config.duration_fallback(), rng);

        let template = self.expanded_template(request)?;

        let anchor = parse_anchor(values.get(DATE_TOKEN), values.get(SCHEDULED_TIME_TOKEN));
        if anchor.is_none() {
            tracing::warn!(
                date = values.get(DATE_TOKEN).unwrap_or_default(),
                time = values.get(SCHEDULED_TIME_TOKEN).unwrap_or_default(),
                "scheduled date or time is missing or unreadable; event times left as placeholders"
            );
        }

        let schedule = anchor.and_then(|anchor| {
            let mut jitter = RandomJitter::new(&mut *rng, self.config.jitter_minutes());
            let schedule = resolve_schedule_with(
                anchor,
                duration_minutes,
                self.config.event_table(),
                &mut jitter,
                self.config.ordering(),
            );
            if schedule.is_none() {
                tracing::warn!(
                    %anchor,
                    duration_minutes,
                    "event times out of range; event times left as placeholders"
                );
            }
            schedule
        });

        let mut messages = Renderer::new(self.config.event_table())
            .with_date_policy(self.config.event_date_policy())
            .render(request.kind, &template, &values, schedule.as_ref());

        if self.config.include_adt() {
            messages.push(render_adt(
                self.config.adt_template(),
                &values,
                &request.allergies,
                anchor,
            ));
        }

        tracing::info!(
            messages = messages.len(),
            duration_minutes,
            procedures = 1 + request.procedures.len(),
            "generated case"
        );

        Ok(CaseOutput {
            messages,
            schedule,
            duration_minutes,
        })
    }

    /// Live-preview text: blocks expanded and base values substituted, no schedule.
    ///
    /// Fields that have not been entered yet stay visible as placeholders.
    pub fn preview(&self, request: &CaseRequest) -> CaseGenResult<String> {
        let mut values = request.values.clone();
        values.apply_defaults(self.config.field_defaults());
        let template = self.expanded_template(request)?;
        Ok(fill_template(&template.to_text(), &values))
    }

    fn expanded_template(&self, request: &CaseRequest) -> CaseGenResult<MessageTemplate> {
        // Fixed rows are filled after expansion so extra staff copy the unfilled last row.
        let expanded =
            expand_repeated_blocks(self.config.siu_template(), &request.procedures, &request.staff)?;
        let filled = fill_staff_block(&expanded, &request.fixed_staff)?;
        insert_assistant_surgeons(&filled, &request.surgeons)
    }
}

/// The case duration in minutes, written back into `{duration}` when a fallback is drawn.
fn resolve_duration<R: Rng>(values: &mut FieldValues, fallback: (i64, i64), rng: &mut R) -> i64 {
    let supplied = values
        .get_present(DURATION_TOKEN)
        .and_then(|text| text.parse::<i64>().ok())
        .filter(|minutes| (1..=MAX_CASE_DURATION_MINUTES).contains(minutes));
    if let Some(minutes) = supplied {
        return minutes;
    }

    let (min, max) = fallback;
    let minutes = rng.gen_range(min..=max);
    tracing::warn!(
        supplied = values.get(DURATION_TOKEN).unwrap_or_default(),
        fallback = minutes,
        "case duration missing or invalid; using random fallback"
    );
    values.bind(DURATION_TOKEN, minutes.to_string());
    minutes
}
