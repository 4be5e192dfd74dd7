//! ADT^A01 admission message with allergy segments.

use crate::constants::{
    ALLERGY_SEGMENTS_SLOT, ALLERGY_TAG, DATE_FORMAT, DATE_TOKEN, EVENT_TIME_TOKEN,
    SCHEDULED_TIME_TOKEN, TIME_FORMAT,
};
use crate::fields::FieldValues;
use crate::render::{fill_template, RenderedMessage};
use crate::segment::{MessageTemplate, Segment};
use casegen_types::SequenceTag;
use chrono::NaiveDateTime;

/// One patient allergy, written as an `AL1` segment.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct Allergy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub reaction: Option<String>,
}

/// `AL1` segments for `allergies`, numbered from 1. An empty list yields the NKA segment.
pub fn al1_segments(allergies: &[Allergy]) -> Vec<Segment> {
    if allergies.is_empty() {
        return vec![Segment::new(
            ALLERGY_TAG,
            vec![
                "1".to_owned(),
                String::new(),
                "NKA^No Known Allergies".to_owned(),
                String::new(),
                String::new(),
            ],
        )];
    }

    allergies
        .iter()
        .zip(1..)
        .map(|(allergy, index): (&Allergy, u32)| {
            Segment::new(
                ALLERGY_TAG,
                vec![
                    index.to_string(),
                    String::new(),
                    format!("{}^{}", allergy.id.trim(), allergy.name.trim()),
                    allergy.severity.clone().unwrap_or_default(),
                    allergy.reaction.clone().unwrap_or_default(),
                    String::new(),
                ],
            )
        })
        .collect()
}

/// Render the admission message.
///
/// The `{AL1_segments}` line is replaced by the allergy segments, or they are appended when the
/// template has no such line. The event time is the anchor time, else the base
/// `{scheduledTime}`; with neither the token stays literal.
pub fn render_adt(
    template: &MessageTemplate,
    base_values: &FieldValues,
    allergies: &[Allergy],
    anchor: Option<NaiveDateTime>,
) -> RenderedMessage {
    let mut message = template.clone();
    let segments = al1_segments(allergies);
    match message
        .segments()
        .iter()
        .position(|segment| segment.is(ALLERGY_SEGMENTS_SLOT))
    {
        Some(slot) => message.replace(slot, segments),
        None => message.insert_all(message.len(), segments),
    }

    let mut values = base_values.clone();
    match anchor {
        Some(anchor) => {
            let time = anchor.format(TIME_FORMAT).to_string();
            values.bind(DATE_TOKEN, anchor.format(DATE_FORMAT).to_string());
            values.bind(SCHEDULED_TIME_TOKEN, time.clone());
            values.bind(EVENT_TIME_TOKEN, time);
        }
        None => match base_values.get_present(SCHEDULED_TIME_TOKEN) {
            Some(time) => values.bind(EVENT_TIME_TOKEN, time),
            None => {
                values.remove(EVENT_TIME_TOKEN);
            }
        },
    }

    RenderedMessage {
        text: fill_template(&message.to_text(), &values),
        tag: SequenceTag::admission(),
    }
}
