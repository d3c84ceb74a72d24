//! Listing forms: field descriptors, form sessions, the field validator, the
//! conditional-field controller and the draft/submit pipeline on top of
//! [`store::LocalStore`].

pub mod catalog;
pub mod conditional;
pub mod config;
pub mod errors;
pub mod field;
pub mod input;
pub mod notify;
pub mod pipeline;
pub mod record;
pub mod schema;
pub mod state;
pub mod submit;
pub mod validate;

pub use conditional::{ConditionalGroup, ConditionalState, Visibility};
pub use config::PipelineConfig;
pub use errors::{FormError, SubmitError};
pub use field::{FieldDescriptor, FieldKind, Rule};
pub use input::{AgentInput, FormInput};
pub use notify::{ChannelNotifier, Notification, NotificationKind, Notifier, TracingNotifier};
pub use pipeline::{Pipeline, StagingSummary, SubmitOutcome};
pub use record::{AgentEntry, DraftRecord, EntityRecord};
pub use schema::{EntityKind, FormSchema, RepeatingGroup};
pub use state::{FieldMarker, FormSession, FormSnapshot, StagedImage};
pub use submit::{SimulatedSubmitter, Submitter};
pub use validate::{ValidationReport, ValidationResult};
