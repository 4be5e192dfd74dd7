//! Recover field values from an existing message.
//!
//! Only a handful of fields are read back: enough to name output files and to re-render a
//! case for the same patient and room.

use crate::constants::{
    CASE_EVENT_TOKEN, LOCATION_DEPARTMENT_TOKEN, LOCATION_OR_TOKEN, LOCATION_TAG,
    MESSAGE_HEADER_TAG, OBSERVATION_TAG, PATIENT_FIRST_NAME_TOKEN, PATIENT_LAST_NAME_TOKEN,
    PATIENT_MRN_TOKEN, PATIENT_TAG, TRIGGER_EVENT_TOKEN,
};
use crate::fields::FieldValues;
use crate::segment::MessageTemplate;

/// Read patient, location, event and trigger fields from message text.
///
/// Fields that are absent or empty in the message are left unbound.
pub fn inspect_message(text: &str) -> FieldValues {
    let message = MessageTemplate::parse(text);
    let mut values = FieldValues::new();

    if let Some(header) = message.first(MESSAGE_HEADER_TAG) {
        // MSH-9.2; field numbering here is shifted by one for MSH.
        bind_present(&mut values, TRIGGER_EVENT_TOKEN, header.component(8, 2));
    }

    if let Some(patient) = message.first(PATIENT_TAG) {
        bind_present(&mut values, PATIENT_MRN_TOKEN, patient.component(3, 1));
        bind_present(&mut values, PATIENT_LAST_NAME_TOKEN, patient.component(5, 1));
        bind_present(&mut values, PATIENT_FIRST_NAME_TOKEN, patient.component(5, 2));
    }

    if let Some(location) = message.first(LOCATION_TAG) {
        bind_present(&mut values, LOCATION_OR_TOKEN, location.component(3, 2));
        bind_present(&mut values, LOCATION_DEPARTMENT_TOKEN, location.component(3, 4));
    }

    if let Some(observation) = message.first(OBSERVATION_TAG) {
        bind_present(&mut values, CASE_EVENT_TOKEN, observation.field(3));
    }

    tracing::debug!(fields = values.len(), "inspected message");
    values
}

fn bind_present(values: &mut FieldValues, token: &'static str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        values.bind(token, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &str = "MSH|^~\\&|EPIC|NC||NC|20240601090000||SIU^S14|123|P|2.5\r\
PID|1||123456^^^MRN^MRN||SMITH^JANE||19800101|F\r\
OBX|1|DTM|closing|In|20240601090000|\r\
AIL|1||^OR 5^^MAIN SURGERY\r";

    #[test]
    fn recovers_patient_location_event_and_trigger() {
        let values = inspect_message(MESSAGE);
        assert_eq!(values.get("patientMRN"), Some("123456"));
        assert_eq!(values.get("patientLastName"), Some("SMITH"));
        assert_eq!(values.get("patientFirstName"), Some("JANE"));
        assert_eq!(values.get("locationOR"), Some("OR 5"));
        assert_eq!(values.get("locationDepartment"), Some("MAIN SURGERY"));
        assert_eq!(values.get("caseEvent"), Some("closing"));
        assert_eq!(values.get("triggerEvent"), Some("S14"));
    }

    #[test]
    fn scheduling_message_has_no_case_event() {
        let text = "MSH|^~\\&|EPIC|NC||NC|20240601080000||SIU^S12|1|P|2.5\nPID|1||42||DOE^";
        let values = inspect_message(text);
        assert_eq!(values.get("triggerEvent"), Some("S12"));
        assert_eq!(values.get("patientLastName"), Some("DOE"));
        assert!(!values.contains("patientFirstName"));
        assert!(!values.contains("caseEvent"));
    }

    #[test]
    fn empty_text_yields_no_values() {
        assert!(inspect_message("").is_empty());
    }
}
