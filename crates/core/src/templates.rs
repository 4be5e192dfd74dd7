//! Built-in message templates.
//!
//! Time placeholders hold `HHMM`; the templates append the seconds themselves.

/// SIU template with one procedure block (AIS, 2×NTE, AIL) and the five-row staff block.
pub const DEFAULT_SIU_TEMPLATE: &str = r"MSH|^~\&|EPIC|NC||NC|{YYYYMMDD}{eventTime}00||SIU^{triggerEvent}|{patientMRN}|P|2.5
SCH||{patientMRN}|||||||{duration}|M|^^^{YYYYMMDD}{scheduledTime}00
ZCS||{addOn}|ORSCH_S14||||{cptCode}^{procedure}^CPT
PID|1||{patientMRN}^^^MRN^MRN||{patientLastName}^{patientFirstName}||{patientDOB}|{patientGender}|{patientLastName}^{patientFirstName}^^|||||||||{patientMRN}
PV1||{encounterType}|NC-PERIOP^^^NC|||||||{specialty}|||||||||{patientMRN}
RGS|
OBX|1|DTM|{caseEvent}|In|{YYYYMMDD}{eventTime}00|||||||||{YYYYMMDD}{eventTime}00||||||||||||||||||
AIS|1||{procedureId}^{procedure}|{YYYYMMDD}{scheduledTime}00|0|M|{duration}|M||||2
NTE|1||{procedureDescription}|Procedure Description|||
NTE|2||{specialNeeds}|Case Notes|||
AIL|1||^{locationOR}^^{locationDepartment}
AIP|1||{surgeonID}^{primaryLastName}^{primaryFirstName}^W^^^^^EPIC^^^^PROVID|1.1^Primary|{specialty}|{YYYYMMDD}{scheduledTime}00|0|M|{duration}|M
AIP|2||{staffID}^{lastName}^{firstName}^^^^^^EPIC^^^^PROVID|4.20^Circulator||{YYYYMMDD}{scheduledTime}00|0|M|{duration}|M
AIP|3||{staffID}^{lastName}^{firstName}^^^^^^EPIC^^^^PROVID|4.150^Scrub||{YYYYMMDD}{scheduledTime}00|0|M|{duration}|M
AIP|4||{staffID}^{lastName}^{firstName}^^^^^^EPIC^^^^PROVID|2.20^ANE CRNA||{YYYYMMDD}{scheduledTime}00|0|M|{duration}|M
AIP|5||{staffID}^{lastName}^{firstName}^^^^^^EPIC^^^^PROVID|2.139^Anesthesiologist||{YYYYMMDD}{scheduledTime}00|0|M|{duration}|M
";

/// ADT^A01 admission template. The `{AL1_segments}` line is replaced by allergy segments.
pub const DEFAULT_ADT_TEMPLATE: &str = r"MSH|^~\&|EPIC|NC||NC|{YYYYMMDD}{eventTime}00||ADT^A01||P|2.5
EVN|A01|{YYYYMMDD}{eventTime}00|
PID|1||{patientMRN}^^^MRN^MRN||{patientLastName}^{patientFirstName}||{patientDOB}|{patientGender}||||||||||{patientMRN}
PV1||{encounterType}|NC-PERIOP^^^NC||||||||||||||||{patientMRN}|||||||||||||||||||||||||{YYYYMMDD}{eventTime}00
PV2|||||||
{AL1_segments}
";
