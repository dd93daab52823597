//! Typed error kinds surfaced by the caller core.
//!
//! Cycle detection and near-repeat k-mers are deliberately NOT errors; they
//! are pipeline signals that restart graph construction at a larger k.
//! Store backpressure is likewise a non-error (the variant buffer is simply
//! retained for the next flush attempt).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CallerError {
    /// The global aligner failed for a ref/path pair. Fatal for the current
    /// window only; carries enough context to reproduce the failure.
    #[error("alignment failed in window {window}: ref={ref_seq} qry={qry_seq}")]
    AlignmentFailure {
        window: String,
        ref_seq: String,
        qry_seq: String,
    },

    /// A core data-model invariant was violated. Fatal in debug builds,
    /// logged and window-dropped in release builds.
    #[error("graph invariant violated: {0}")]
    GraphInvariant(String),

    /// The input window queue was closed; workers exit cleanly.
    #[error("window queue closed")]
    QueueClosed,
}
