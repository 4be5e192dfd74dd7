/// Suffix of the date-stamped output directory, after the `yymmdd` date.
pub const OUTPUT_DIR_SUFFIX: &str = " - HL7 Output";

/// Date format of the output directory prefix.
pub const OUTPUT_DIR_DATE_FORMAT: &str = "%y%m%d";

pub const MESSAGE_EXTENSION: &str = "hl7";

/// Name parts used when a patient name is missing or still a placeholder.
pub const FALLBACK_FIRST_NAME: &str = "First";
pub const FALLBACK_LAST_NAME: &str = "Last";
