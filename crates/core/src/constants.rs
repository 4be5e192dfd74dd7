//! Constants used throughout the casegen core crate.
//!
//! Placeholder tokens, segment tags and default policy values live here so templates,
//! the renderer and the case service agree on a single spelling.

/// Scheduled date of the case, `YYYYMMDD`.
pub const DATE_TOKEN: &str = "{YYYYMMDD}";

/// Setup ("anchor") time of the case.
pub const SCHEDULED_TIME_TOKEN: &str = "{scheduledTime}";

/// Time of the event a message reports.
pub const EVENT_TIME_TOKEN: &str = "{eventTime}";

/// Name of the clinical event a message reports.
pub const CASE_EVENT_TOKEN: &str = "{caseEvent}";

/// SIU/ADT trigger event code (`S12`, `S14`, `S15`).
pub const TRIGGER_EVENT_TOKEN: &str = "{triggerEvent}";

/// Case duration in minutes.
pub const DURATION_TOKEN: &str = "{duration}";

pub const PATIENT_FIRST_NAME_TOKEN: &str = "{patientFirstName}";
pub const PATIENT_LAST_NAME_TOKEN: &str = "{patientLastName}";
pub const PATIENT_MRN_TOKEN: &str = "{patientMRN}";
pub const LOCATION_OR_TOKEN: &str = "{locationOR}";
pub const LOCATION_DEPARTMENT_TOKEN: &str = "{locationDepartment}";

/// Role of an additional staff member or assistant surgeon.
pub const STAFF_ROLE_TOKEN: &str = "{role}";

pub const STAFF_ID_TOKEN: &str = "{staffID}";
pub const STAFF_LAST_NAME_TOKEN: &str = "{lastName}";
pub const STAFF_FIRST_NAME_TOKEN: &str = "{firstName}";

/// Line in the ADT template replaced by the allergy segments.
pub const ALLERGY_SEGMENTS_SLOT: &str = "{AL1_segments}";

pub const MESSAGE_HEADER_TAG: &str = "MSH";
pub const PATIENT_TAG: &str = "PID";
pub const OBSERVATION_TAG: &str = "OBX";
pub const PROCEDURE_TAG: &str = "AIS";
pub const NOTE_TAG: &str = "NTE";
pub const LOCATION_TAG: &str = "AIL";
pub const STAFF_TAG: &str = "AIP";
pub const ALLERGY_TAG: &str = "AL1";

/// Number of staff-assignment rows in the canonical staff block.
pub const STAFF_BLOCK_ROWS: usize = 5;

/// Number of note segments owned by each procedure.
pub const NOTES_PER_PROCEDURE: u32 = 2;

/// Role written for additional staff members without one.
pub const DEFAULT_STAFF_ROLE: &str = "Staff";

/// Role written for assistant surgeons without one.
pub const ASSISTANT_SURGEON_ROLE: &str = "Assistant Surgeon";

/// Role code prefix shared by every surgeon row (`1.1` primary, `1.2`… assistants).
pub const SURGEON_ROLE_CODE: &str = "1";

pub const TRIGGER_SCHEDULED: &str = "S12";
pub const TRIGGER_EVENT: &str = "S14";
pub const TRIGGER_CANCELED: &str = "S15";

/// Default jitter bound, in minutes, applied to every event.
pub const DEFAULT_JITTER_MINUTES: i64 = 2;

/// Inclusive range used when a case has no usable duration.
pub const DEFAULT_DURATION_FALLBACK_MINUTES: (i64, i64) = (60, 120);

/// Compact date format used in HL7 timestamps.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Compact time format written into time placeholders; templates append the seconds.
pub const TIME_FORMAT: &str = "%H%M";

/// Longest case duration accepted, in minutes. Longer values are treated as invalid.
pub const MAX_CASE_DURATION_MINUTES: i64 = 24 * 60;

/// Largest configurable jitter bound, in minutes.
pub const MAX_JITTER_MINUTES: i64 = 60;
