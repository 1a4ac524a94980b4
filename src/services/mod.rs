pub mod archive_builder;
pub mod failure_writer;
pub mod form_filler;
pub mod modal_guard;
pub mod receipt_composer;
pub mod selectors;
pub mod submission;

pub use archive_builder::{ArchiveBuilder, ArchiveSummary};
pub use failure_writer::FailureWriter;
pub use form_filler::{FieldTarget, InputKind, OrderFormFiller, FIELD_TARGETS};
pub use modal_guard::{ModalGuard, ModalStatus};
pub use receipt_composer::{ReceiptArtifact, ReceiptComposer};
pub use submission::{SubmissionController, SubmissionOutcome, SubmissionState};
