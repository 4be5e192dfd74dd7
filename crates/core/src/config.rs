//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into [`CaseService`].
//! The core never reads environment variables; the command line decides where the YAML file
//! comes from and hands its contents here.
//!
//! [`CaseService`]: crate::CaseService

use crate::constants::{
    DEFAULT_DURATION_FALLBACK_MINUTES, DEFAULT_JITTER_MINUTES, MAX_CASE_DURATION_MINUTES,
    MAX_JITTER_MINUTES,
};
use crate::error::{from_yaml_with_path, CaseGenError, CaseGenResult};
use crate::fields::FieldValues;
use crate::render::EventDatePolicy;
use crate::schedule::{CaseEventTable, EventOffset, EventProfile, EventRow, OrderingPolicy};
use crate::segment::MessageTemplate;
use crate::templates::{DEFAULT_ADT_TEMPLATE, DEFAULT_SIU_TEMPLATE};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    event_table: CaseEventTable,
    jitter_minutes: i64,
    ordering: OrderingPolicy,
    duration_fallback: (i64, i64),
    event_date_policy: EventDatePolicy,
    field_defaults: FieldValues,
    siu_template: MessageTemplate,
    adt_template: MessageTemplate,
    include_adt: bool,
}

impl CoreConfig {
    /// Create a new `CoreConfig` with the built-in templates.
    ///
    /// `jitter_minutes` must lie in `0..=MAX_JITTER_MINUTES` and `duration_fallback` must be a
    /// non-empty range of positive minutes no longer than `MAX_CASE_DURATION_MINUTES`.
    pub fn new(
        event_table: CaseEventTable,
        jitter_minutes: i64,
        duration_fallback: (i64, i64),
    ) -> CaseGenResult<Self> {
        if !(0..=MAX_JITTER_MINUTES).contains(&jitter_minutes) {
            return Err(CaseGenError::InvalidInput(format!(
                "jitter_minutes must be between 0 and {MAX_JITTER_MINUTES} (got {jitter_minutes})"
            )));
        }

        let (min, max) = duration_fallback;
        if min <= 0 || min > max || max > MAX_CASE_DURATION_MINUTES {
            return Err(CaseGenError::InvalidInput(format!(
                "duration_fallback must satisfy 0 < min <= max <= {MAX_CASE_DURATION_MINUTES} (got {min}..={max})"
            )));
        }

        Ok(Self {
            event_table,
            jitter_minutes,
            ordering: OrderingPolicy::default(),
            duration_fallback,
            event_date_policy: EventDatePolicy::default(),
            field_defaults: FieldValues::new(),
            siu_template: MessageTemplate::parse(DEFAULT_SIU_TEMPLATE),
            adt_template: MessageTemplate::parse(DEFAULT_ADT_TEMPLATE),
            include_adt: false,
        })
    }

    /// Parse a YAML configuration document.
    ///
    /// Relative template paths are resolved against `base_dir`.
    pub fn from_yaml_str(yaml_text: &str, base_dir: &Path) -> CaseGenResult<Self> {
        let file: ConfigFile = from_yaml_with_path("config", yaml_text)?;

        let event_table = match file.event_table {
            Some(rows) => custom_table(rows)?,
            None => file.event_profile.unwrap_or_default().table(),
        };

        let duration_fallback = file
            .duration_fallback
            .map_or(DEFAULT_DURATION_FALLBACK_MINUTES, |range| (range.min, range.max));

        let mut config = Self::new(
            event_table,
            file.jitter_minutes.unwrap_or(DEFAULT_JITTER_MINUTES),
            duration_fallback,
        )?
        .with_event_date_policy(file.event_date_policy)
        .with_field_defaults(file.field_defaults)
        .with_include_adt(file.include_adt);

        if file.keep_after_reference {
            config = config.with_ordering(OrderingPolicy::KeepAfterReference);
        }

        if let Some(path) = file.siu_template {
            let path = base_dir.join(path);
            let text = std::fs::read_to_string(&path).map_err(|source| CaseGenError::FileRead {
                what: format!("SIU template {}", path.display()),
                source,
            })?;
            config = config.with_siu_template(MessageTemplate::parse(&text));
        }

        Ok(config)
    }

    /// Read and parse the YAML configuration file at `path`.
    pub fn load(path: &Path) -> CaseGenResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CaseGenError::FileRead {
            what: format!("config {}", path.display()),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let config = Self::from_yaml_str(&text, base_dir)?;
        tracing::debug!(path = %path.display(), events = config.event_table.len(), "loaded config");
        Ok(config)
    }

    pub fn with_ordering(mut self, ordering: OrderingPolicy) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_event_date_policy(mut self, policy: EventDatePolicy) -> Self {
        self.event_date_policy = policy;
        self
    }

    pub fn with_field_defaults(mut self, defaults: FieldValues) -> Self {
        self.field_defaults = defaults;
        self
    }

    pub fn with_siu_template(mut self, template: MessageTemplate) -> Self {
        self.siu_template = template;
        self
    }

    pub fn with_include_adt(mut self, include_adt: bool) -> Self {
        self.include_adt = include_adt;
        self
    }

    pub fn event_table(&self) -> &CaseEventTable {
        &self.event_table
    }

    pub fn jitter_minutes(&self) -> i64 {
        self.jitter_minutes
    }

    pub fn ordering(&self) -> OrderingPolicy {
        self.ordering
    }

    pub fn duration_fallback(&self) -> (i64, i64) {
        self.duration_fallback
    }

    pub fn event_date_policy(&self) -> EventDatePolicy {
        self.event_date_policy
    }

    pub fn field_defaults(&self) -> &FieldValues {
        &self.field_defaults
    }

    pub fn siu_template(&self) -> &MessageTemplate {
        &self.siu_template
    }

    pub fn adt_template(&self) -> &MessageTemplate {
        &self.adt_template
    }

    pub fn include_adt(&self) -> bool {
        self.include_adt
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            event_table: EventProfile::default().table(),
            jitter_minutes: DEFAULT_JITTER_MINUTES,
            ordering: OrderingPolicy::default(),
            duration_fallback: DEFAULT_DURATION_FALLBACK_MINUTES,
            event_date_policy: EventDatePolicy::default(),
            field_defaults: FieldValues::new(),
            siu_template: MessageTemplate::parse(DEFAULT_SIU_TEMPLATE),
            adt_template: MessageTemplate::parse(DEFAULT_ADT_TEMPLATE),
            include_adt: false,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    event_profile: Option<EventProfile>,
    event_table: Option<Vec<EventRowFile>>,
    jitter_minutes: Option<i64>,
    #[serde(default)]
    keep_after_reference: bool,
    duration_fallback: Option<DurationRange>,
    #[serde(default)]
    event_date_policy: EventDatePolicy,
    #[serde(default)]
    field_defaults: FieldValues,
    siu_template: Option<PathBuf>,
    #[serde(default)]
    include_adt: bool,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct EventRowFile {
    name: String,
    offset: OffsetValue,
}

/// `offset: -60` and `offset: duration-30` are both accepted.
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum OffsetValue {
    Minutes(i64),
    Expression(String),
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct DurationRange {
    min: i64,
    max: i64,
}

fn custom_table(rows: Vec<EventRowFile>) -> CaseGenResult<CaseEventTable> {
    let rows = rows
        .into_iter()
        .map(|row| {
            let offset = match row.offset {
                OffsetValue::Minutes(minutes) => EventOffset::Absolute(minutes),
                OffsetValue::Expression(text) => text.parse()?,
            };
            Ok(EventRow {
                name: row.name,
                offset,
            })
        })
        .collect::<CaseGenResult<Vec<_>>>()?;
    CaseEventTable::new(rows)
}
