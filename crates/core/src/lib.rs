//! # Casegen Core
//!
//! Core logic for generating synthetic HL7v2 surgical-case messages.
//!
//! This crate contains pure, synchronous operations:
//! - Event schedule derivation from an anchor time, a case duration and an event table
//! - Template parsing, procedure/staff block duplication and placeholder substitution
//! - Per-event SIU variants, the ADT admission message and message inspection
//!
//! **No I/O concerns** beyond reading configuration: writing messages to disk belongs in
//! `casegen_files`, argument parsing and logging setup in `casegen-cli`.

pub mod adt;
pub mod case;
pub mod config;
pub mod constants;
pub mod error;
pub mod expand;
pub mod fields;
pub mod inspect;
pub mod render;
pub mod schedule;
pub mod segment;
pub mod templates;

pub use adt::{al1_segments, render_adt, Allergy};
pub use case::{CaseOutput, CaseRequest, CaseService};
pub use config::CoreConfig;
pub use error::{CaseGenError, CaseGenResult};
pub use expand::{expand_repeated_blocks, fill_staff_block, insert_assistant_surgeons};
pub use fields::FieldValues;
pub use inspect::inspect_message;
pub use render::{fill_template, EventDatePolicy, MessageKind, RenderedMessage, Renderer};
pub use schedule::{
    parse_anchor, resolve_schedule, resolve_schedule_with, CaseEventTable, EventOffset,
    EventProfile, EventRow, EventSchedule, Jitter, NoJitter, OrderingPolicy, RandomJitter,
};
pub use segment::{MessageTemplate, Segment};

pub use casegen_types::{PlaceholderError, PlaceholderKey, SequenceTag};
