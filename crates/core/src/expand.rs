//! Procedure and staff block duplication.
//!
//! A template carries exactly one procedure block (`AIS|1`, `NTE|1`, `NTE|2`, `AIL|1`) and one
//! staff block (`AIP|1` .. `AIP|5`). Cases with more procedures or staff get renumbered copies
//! inserted directly after the canonical block, each filled with its own values. Assistant
//! surgeons go in right after the primary surgeon row and push the rest of the staff down.

use crate::constants::{
    ASSISTANT_SURGEON_ROLE, DEFAULT_STAFF_ROLE, LOCATION_TAG, NOTES_PER_PROCEDURE, NOTE_TAG,
    PROCEDURE_TAG, STAFF_BLOCK_ROWS, STAFF_FIRST_NAME_TOKEN, STAFF_ID_TOKEN,
    STAFF_LAST_NAME_TOKEN, STAFF_ROLE_TOKEN, STAFF_TAG, SURGEON_ROLE_CODE,
};
use crate::error::{CaseGenError, CaseGenResult};
use crate::fields::FieldValues;
use crate::segment::{MessageTemplate, Segment};

const PROCEDURE_BLOCK: &str = "procedure";
const STAFF_BLOCK: &str = "staff";
const SURGEON_BLOCK: &str = "surgeon";

/// Field of an `AIP` segment holding the person (`id^last^first^…`).
const STAFF_PERSON_FIELD: usize = 3;

/// Field of an `AIP` segment holding the role (`code^name`).
const STAFF_ROLE_FIELD: usize = 4;

const PROCEDURE_BLOCK_SHAPE: [(&str, u32); 4] = [
    (PROCEDURE_TAG, 1),
    (NOTE_TAG, 1),
    (NOTE_TAG, 2),
    (LOCATION_TAG, 1),
];

/// Duplicate the procedure and staff blocks for additional procedures and staff members.
///
/// Copy `n` of the procedure block (the canonical block is copy 1) gets sequence `n` on its
/// `AIS` and `AIL` rows and notes `2(n-1)+1` and `2(n-1)+2`. Each extra staff member becomes an
/// `AIP` row numbered from 6 with its `{role}` value as the role, or `Staff` when unset.
///
/// Returns [`CaseGenError::BlockNotFound`] only when extras are requested for a block the
/// template does not contain.
pub fn expand_repeated_blocks(
    template: &MessageTemplate,
    additional_procedures: &[FieldValues],
    additional_staff: &[FieldValues],
) -> CaseGenResult<MessageTemplate> {
    let mut expanded = template.clone();

    if !additional_procedures.is_empty() {
        let start = find_procedure_block(&expanded)?;
        let canonical = expanded.segments()[start..start + PROCEDURE_BLOCK_SHAPE.len()].to_vec();

        let copies = additional_procedures
            .iter()
            .zip(2u32..)
            .flat_map(|(values, number)| procedure_copy(&canonical, number, values))
            .collect();
        expanded.insert_all(start + PROCEDURE_BLOCK_SHAPE.len(), copies);
    }

    if !additional_staff.is_empty() {
        let start = find_staff_block(&expanded)?;
        let last_row = expanded.segments()[start + STAFF_BLOCK_ROWS - 1].clone();

        let rows = additional_staff
            .iter()
            .zip(STAFF_BLOCK_ROWS as u32 + 1..)
            .map(|(values, number)| staff_row(&last_row, number, values))
            .collect();
        expanded.insert_all(start + STAFF_BLOCK_ROWS, rows);
    }

    tracing::debug!(
        procedures = 1 + additional_procedures.len(),
        extra_staff = additional_staff.len(),
        segments = expanded.len(),
        "expanded repeated blocks"
    );
    Ok(expanded)
}

/// Fill the five canonical staff rows with their own values, row `i` from `rows[i]`.
///
/// Rows beyond `rows.len()` are left as they are so base values can still fill them.
pub fn fill_staff_block(
    template: &MessageTemplate,
    rows: &[FieldValues],
) -> CaseGenResult<MessageTemplate> {
    if rows.len() > STAFF_BLOCK_ROWS {
        return Err(CaseGenError::TooManyRows {
            block: STAFF_BLOCK,
            supplied: rows.len(),
            available: STAFF_BLOCK_ROWS,
        });
    }

    let mut filled = template.clone();
    if rows.is_empty() {
        return Ok(filled);
    }

    let start = find_staff_block(&filled)?;
    for (segment, values) in filled.segments_mut()[start..].iter_mut().zip(rows) {
        segment.fill(values);
    }
    Ok(filled)
}

/// Insert one row per assistant surgeon directly after the primary surgeon (`AIP|1`).
///
/// Surgeon `i` (the primary is surgeon 1) is numbered `i` with role `1.i^Assistant Surgeon`,
/// or `1.i^{role}` when the surgeon has a `{role}` value. The row copies the primary's layout
/// with the person set to `{staffID}^{lastName}^{firstName}` before filling, and every `AIP`
/// row behind the surgeons is renumbered so the sequence stays contiguous.
///
/// Run this after [`fill_staff_block`]; it breaks the `AIP|1`..`AIP|5` shape that function
/// looks for.
pub fn insert_assistant_surgeons(
    template: &MessageTemplate,
    surgeons: &[FieldValues],
) -> CaseGenResult<MessageTemplate> {
    let mut expanded = template.clone();
    if surgeons.is_empty() {
        return Ok(expanded);
    }

    let primary = expanded
        .segments()
        .iter()
        .position(|segment| segment.has_sequence(STAFF_TAG, 1))
        .ok_or(CaseGenError::BlockNotFound {
            block: SURGEON_BLOCK,
        })?;
    let primary_row = expanded.segments()[primary].clone();

    let rows = surgeons
        .iter()
        .zip(2u32..)
        .map(|(values, number)| assistant_surgeon_row(&primary_row, number, values))
        .collect();
    expanded.insert_all(primary + 1, rows);

    for (segment, number) in expanded.segments_mut()[primary..]
        .iter_mut()
        .filter(|segment| segment.is(STAFF_TAG))
        .zip(1u32..)
    {
        segment.set_sequence(number);
    }

    tracing::debug!(surgeons = 1 + surgeons.len(), "inserted assistant surgeons");
    Ok(expanded)
}

fn find_procedure_block(template: &MessageTemplate) -> CaseGenResult<usize> {
    find_block(template, &PROCEDURE_BLOCK_SHAPE).ok_or(CaseGenError::BlockNotFound {
        block: PROCEDURE_BLOCK,
    })
}

fn find_staff_block(template: &MessageTemplate) -> CaseGenResult<usize> {
    let shape: Vec<(&str, u32)> = (1..=STAFF_BLOCK_ROWS as u32)
        .map(|sequence| (STAFF_TAG, sequence))
        .collect();
    find_block(template, &shape).ok_or(CaseGenError::BlockNotFound { block: STAFF_BLOCK })
}

/// Index of the first contiguous run of segments matching `shape` by tag and sequence.
fn find_block(template: &MessageTemplate, shape: &[(&str, u32)]) -> Option<usize> {
    template.segments().windows(shape.len()).position(|window| {
        window
            .iter()
            .zip(shape)
            .all(|(segment, (tag, sequence))| segment.has_sequence(tag, *sequence))
    })
}

fn procedure_copy(canonical: &[Segment], number: u32, values: &FieldValues) -> Vec<Segment> {
    let mut note = NOTES_PER_PROCEDURE * (number - 1);
    canonical
        .iter()
        .map(|segment| {
            let mut copy = segment.clone();
            if copy.is(NOTE_TAG) {
                note += 1;
                copy.set_sequence(note);
            } else {
                copy.set_sequence(number);
            }
            copy.fill(values);
            copy
        })
        .collect()
}

fn staff_row(template_row: &Segment, number: u32, values: &FieldValues) -> Segment {
    let role = values.get_present(STAFF_ROLE_TOKEN).unwrap_or(DEFAULT_STAFF_ROLE);
    let mut row = template_row.clone();
    row.set_sequence(number);
    row.set_field(STAFF_ROLE_FIELD, role);
    row.fill(values);
    row
}

fn assistant_surgeon_row(primary: &Segment, number: u32, values: &FieldValues) -> Segment {
    let role = values
        .get_present(STAFF_ROLE_TOKEN)
        .unwrap_or(ASSISTANT_SURGEON_ROLE);
    let mut row = primary.clone();
    row.set_sequence(number);
    row.set_component(STAFF_PERSON_FIELD, 1, STAFF_ID_TOKEN);
    row.set_component(STAFF_PERSON_FIELD, 2, STAFF_LAST_NAME_TOKEN);
    row.set_component(STAFF_PERSON_FIELD, 3, STAFF_FIRST_NAME_TOKEN);
    row.set_field(STAFF_ROLE_FIELD, format!("{SURGEON_ROLE_CODE}.{number}^{role}"));
    row.fill(values);
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::DEFAULT_SIU_TEMPLATE;

    fn values(pairs: &[(&str, &str)]) -> FieldValues {
        FieldValues::from_pairs(pairs.iter().copied()).unwrap()
    }

    fn sequences(template: &MessageTemplate, tag: &str) -> Vec<u32> {
        template
            .segments()
            .iter()
            .filter(|s| s.is(tag))
            .filter_map(Segment::sequence)
            .collect()
    }

    #[test]
    fn no_extras_returns_template_unchanged() {
        let template = MessageTemplate::parse(DEFAULT_SIU_TEMPLATE);
        let expanded = expand_repeated_blocks(&template, &[], &[]).unwrap();
        assert_eq!(expanded, template);
    }

    #[test]
    fn extra_procedures_are_numbered_and_contiguous() {
        let template = MessageTemplate::parse(DEFAULT_SIU_TEMPLATE);
        let extras = vec![
            values(&[("procedure", "Appendectomy"), ("procedureId", "111")]),
            values(&[("procedure", "Hernia Repair"), ("procedureId", "222")]),
        ];
        let expanded = expand_repeated_blocks(&template, &extras, &[]).unwrap();

        assert_eq!(sequences(&expanded, "AIS"), vec![1, 2, 3]);
        assert_eq!(sequences(&expanded, "AIL"), vec![1, 2, 3]);
        assert_eq!(sequences(&expanded, "NTE"), vec![1, 2, 3, 4, 5, 6]);

        let tags: Vec<&str> = expanded
            .segments()
            .iter()
            .map(Segment::tag)
            .filter(|t| ["AIS", "NTE", "AIL"].contains(t))
            .collect();
        assert_eq!(
            tags,
            ["AIS", "NTE", "NTE", "AIL", "AIS", "NTE", "NTE", "AIL", "AIS", "NTE", "NTE", "AIL"]
        );
    }

    #[test]
    fn duplicated_procedure_blocks_are_filled_immediately() {
        let template = MessageTemplate::parse(DEFAULT_SIU_TEMPLATE);
        let extras = vec![values(&[("procedure", "Appendectomy"), ("procedureId", "111")])];
        let expanded = expand_repeated_blocks(&template, &extras, &[]).unwrap();

        let ais: Vec<String> = expanded
            .segments()
            .iter()
            .filter(|s| s.is("AIS"))
            .map(Segment::to_line)
            .collect();
        assert!(ais[0].contains("{procedureId}^{procedure}"));
        assert!(ais[1].starts_with("AIS|2||111^Appendectomy|{YYYYMMDD}{scheduledTime}00|"));
    }

    #[test]
    fn extra_staff_rows_continue_numbering_with_roles() {
        let template = MessageTemplate::parse(DEFAULT_SIU_TEMPLATE);
        let staff = vec![
            values(&[("role", "Resident"), ("staffID", "900"), ("lastName", "DOE")]),
            values(&[("staffID", "901")]),
        ];
        let expanded = expand_repeated_blocks(&template, &[], &staff).unwrap();

        assert_eq!(sequences(&expanded, "AIP"), vec![1, 2, 3, 4, 5, 6, 7]);
        let aip: Vec<&Segment> = expanded.segments().iter().filter(|s| s.is("AIP")).collect();
        assert_eq!(aip[5].field(4), Some("Resident"));
        assert!(aip[5].field(3).unwrap().starts_with("900^DOE^{firstName}"));
        assert_eq!(aip[6].field(4), Some("Staff"));
        assert_eq!(expanded.segments().last(), Some(aip[6]));
    }

    #[test]
    fn missing_block_is_reported_only_when_extras_are_requested() {
        let template = MessageTemplate::parse("MSH|a\nPID|1");
        assert!(expand_repeated_blocks(&template, &[], &[]).is_ok());

        let err = expand_repeated_blocks(&template, &[FieldValues::new()], &[]).unwrap_err();
        assert!(matches!(err, CaseGenError::BlockNotFound { block: "procedure" }));

        let err = expand_repeated_blocks(&template, &[], &[FieldValues::new()]).unwrap_err();
        assert!(matches!(err, CaseGenError::BlockNotFound { block: "staff" }));
    }

    #[test]
    fn assistant_surgeons_follow_the_primary_and_push_staff_down() {
        let template = MessageTemplate::parse(DEFAULT_SIU_TEMPLATE);
        let staff = vec![values(&[("role", "Resident"), ("staffID", "900")])];
        let expanded = expand_repeated_blocks(&template, &[], &staff).unwrap();
        let surgeons = vec![
            values(&[("staffID", "300"), ("lastName", "WILSON"), ("firstName", "JAMES")]),
            values(&[("staffID", "301"), ("role", "Fellow")]),
        ];
        let expanded = insert_assistant_surgeons(&expanded, &surgeons).unwrap();

        assert_eq!(sequences(&expanded, "AIP"), (1..=8).collect::<Vec<_>>());
        let aip: Vec<&Segment> = expanded.segments().iter().filter(|s| s.is("AIP")).collect();

        assert_eq!(aip[0].field(4), Some("1.1^Primary"));
        assert_eq!(
            aip[1].field(3),
            Some("300^WILSON^JAMES^W^^^^^EPIC^^^^PROVID")
        );
        assert_eq!(aip[1].field(4), Some("1.2^Assistant Surgeon"));
        assert_eq!(aip[1].field(5), Some("{specialty}"));
        assert!(aip[2].field(3).unwrap().starts_with("301^{lastName}^{firstName}^W^"));
        assert_eq!(aip[2].field(4), Some("1.3^Fellow"));

        assert_eq!(aip[3].field(4), Some("4.20^Circulator"));
        assert_eq!(aip[6].field(4), Some("2.139^Anesthesiologist"));
        assert_eq!(aip[7].field(4), Some("Resident"));
        assert!(aip[7].field(3).unwrap().starts_with("900^"));
    }

    #[test]
    fn assistant_surgeons_after_filled_fixed_rows() {
        let template = MessageTemplate::parse(DEFAULT_SIU_TEMPLATE);
        let fixed = vec![values(&[("surgeonID", "100"), ("primaryLastName", "HOUSE")])];
        let filled = fill_staff_block(&template, &fixed).unwrap();
        let expanded = insert_assistant_surgeons(&filled, &[FieldValues::new()]).unwrap();

        let aip: Vec<&Segment> = expanded.segments().iter().filter(|s| s.is("AIP")).collect();
        assert!(aip[0].field(3).unwrap().starts_with("100^HOUSE^"));
        assert!(aip[1].field(3).unwrap().starts_with("{staffID}^{lastName}^{firstName}^W^"));
        assert_eq!(aip[2].sequence(), Some(3));
        assert_eq!(aip[2].field(4), Some("4.20^Circulator"));
    }

    #[test]
    fn assistant_surgeons_need_a_primary_row() {
        let template = MessageTemplate::parse("MSH|a\nPID|1");
        assert!(insert_assistant_surgeons(&template, &[]).is_ok());

        let err = insert_assistant_surgeons(&template, &[FieldValues::new()]).unwrap_err();
        assert!(matches!(err, CaseGenError::BlockNotFound { block: "surgeon" }));
    }

    #[test]
    fn fill_staff_block_fills_rows_in_order() {
        let template = MessageTemplate::parse(DEFAULT_SIU_TEMPLATE);
        let rows = vec![
            values(&[("surgeonID", "100"), ("primaryLastName", "HOUSE")]),
            values(&[("staffID", "200"), ("lastName", "NURSE")]),
        ];
        let filled = fill_staff_block(&template, &rows).unwrap();

        let aip: Vec<&Segment> = filled.segments().iter().filter(|s| s.is("AIP")).collect();
        assert!(aip[0].field(3).unwrap().starts_with("100^HOUSE^"));
        assert!(aip[1].field(3).unwrap().starts_with("200^NURSE^"));
        assert!(aip[2].field(3).unwrap().starts_with("{staffID}^{lastName}"));
    }

    #[test]
    fn fill_staff_block_rejects_more_than_five_rows() {
        let template = MessageTemplate::parse(DEFAULT_SIU_TEMPLATE);
        let rows = vec![FieldValues::new(); 6];
        let err = fill_staff_block(&template, &rows).unwrap_err();
        assert!(matches!(
            err,
            CaseGenError::TooManyRows {
                supplied: 6,
                available: 5,
                ..
            }
        ));
    }
}
