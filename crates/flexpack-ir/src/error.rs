//! Error kinds (§7) and the accumulating sink the driver hands to every
//! component.

use thiserror::Error;

/// The four kinds of errors this core can produce.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlexpackError {
    /// Unrecognised pragma, malformed arguments, reference to an unknown
    /// field, conflicting alias/no-overlay annotations. Non-fatal: only the
    /// offending pragma is dropped.
    #[error("configuration warning: {0}")]
    ConfigWarning(String),

    /// Two incompatible constraints were collected on a single field (e.g.
    /// conflicting alignments from different sources). Reported through the
    /// error sink; collection continues so later errors surface in the same
    /// compile.
    #[error("conflicting constraint on field {field}: {detail}")]
    ConstraintConflict { field: String, detail: String },

    /// The solver could not satisfy the whole problem even after per-field
    /// copack pruning.
    #[error("unsatisfiable packing problem for {target}: {core}")]
    Unsat { target: String, core: String },

    /// A lookup that must succeed did not; treated as a bug in the caller or
    /// an upstream pass, not a user-facing diagnostic.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl FlexpackError {
    /// Whether this error kind should abort the whole driver invocation.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, FlexpackError::Unsat { .. } | FlexpackError::Internal(_))
    }
}

/// Severity tag attached to every sink entry, independent of whether the
/// sink as a whole later aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl FlexpackError {
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            FlexpackError::ConfigWarning(_) => Severity::Warning,
            FlexpackError::ConstraintConflict { .. } => Severity::Error,
            FlexpackError::Unsat { .. } | FlexpackError::Internal(_) => Severity::Fatal,
        }
    }
}

/// Accumulates non-fatal diagnostics across one driver invocation and
/// short-circuits on the first fatal one.
///
/// Mirrors the "error sink handed to every component" design note (§9):
/// collectors append to it rather than returning `Result` for every
/// individual fact, so a single compile can surface every conflicting
/// constraint instead of aborting at the first one.
#[derive(Debug, Default, Clone)]
pub struct ErrorSink {
    entries: Vec<FlexpackError>,
    fatal: Option<FlexpackError>,
}

impl ErrorSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `err`. If it is fatal and no fatal error has been recorded
    /// yet, it becomes the sink's terminal error; subsequent non-fatal
    /// pushes are still accepted (collection is allowed to continue so the
    /// driver can log everything before aborting), but [`Self::into_result`]
    /// will always report the first fatal error.
    pub fn push(&mut self, err: FlexpackError) {
        if err.is_fatal() && self.fatal.is_none() {
            self.fatal = Some(err.clone());
        }
        match err.severity() {
            Severity::Warning => tracing::warn!(%err, "flexpack configuration warning"),
            Severity::Error => tracing::error!(%err, "flexpack constraint conflict"),
            Severity::Fatal => tracing::error!(%err, "flexpack fatal error"),
        }
        self.entries.push(err);
    }

    #[must_use]
    pub fn has_fatal(&self) -> bool {
        self.fatal.is_some()
    }

    #[must_use]
    pub fn entries(&self) -> &[FlexpackError] {
        &self.entries
    }

    #[must_use]
    pub fn warnings(&self) -> Vec<&FlexpackError> {
        self.entries
            .iter()
            .filter(|e| e.severity() == Severity::Warning)
            .collect()
    }

    /// `Ok(())` if no fatal error was recorded, else the first fatal error.
    ///
    /// # Errors
    /// Returns the first fatal [`FlexpackError`] pushed to this sink.
    pub fn into_result(self) -> Result<Vec<FlexpackError>, FlexpackError> {
        if let Some(fatal) = self.fatal {
            Err(fatal)
        } else {
            Ok(self.entries)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_fatal_errors_accumulate_without_aborting() {
        let mut sink = ErrorSink::new();
        sink.push(FlexpackError::ConfigWarning("unknown pragma foo".into()));
        sink.push(FlexpackError::ConstraintConflict {
            field: "f1".into(),
            detail: "conflicting alignment".into(),
        });
        assert!(!sink.has_fatal());
        assert_eq!(sink.entries().len(), 2);
    }

    #[test]
    fn first_fatal_short_circuits_result() {
        let mut sink = ErrorSink::new();
        sink.push(FlexpackError::ConfigWarning("w".into()));
        sink.push(FlexpackError::Unsat {
            target: "hdr".into(),
            core: "f1,f2".into(),
        });
        sink.push(FlexpackError::Internal("should not override".into()));
        assert!(sink.has_fatal());
        let err = sink.into_result().unwrap_err();
        assert!(matches!(err, FlexpackError::Unsat { .. }));
    }
}
