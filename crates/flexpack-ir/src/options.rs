//! The single configuration options bundle (§6) and the raw pragma records
//! it carries. Parsing/validating these into concrete constraint effects is
//! `flexpack-pragma`'s job; this crate only defines the wire shape.

use serde::{Deserialize, Serialize};

/// One occurrence of a `pa_*` pragma as written in the source program,
/// before validation. `pipe` and `gress` are optional per the grammar in §6
/// ("each pragma accepts optional pipe name, then gress token").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPragma {
    pub kind: String,
    pub pipe: Option<String>,
    pub gress: Option<String>,
    /// Positional arguments, in source order: field references, integers
    /// (as decimal strings), and for `pa_container_size`/`pa_byte_pack`,
    /// interleaved field-name/size tokens.
    pub args: Vec<String>,
}

impl RawPragma {
    #[must_use]
    pub fn new(kind: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            kind: kind.into(),
            pipe: None,
            gress: None,
            args,
        }
    }

    #[must_use]
    pub fn with_pipe(mut self, pipe: impl Into<String>) -> Self {
        self.pipe = Some(pipe.into());
        self
    }

    #[must_use]
    pub fn with_gress(mut self, gress: impl Into<String>) -> Self {
        self.gress = Some(gress.into());
        self
    }
}

/// The single options bundle passed into the driver (§6).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FlexpackOptions {
    /// If non-empty, restrict analysis to these pipeline names.
    pub restrict_pipelines: Vec<String>,
    pub pragmas: Vec<RawPragma>,
    /// Whether the deparser-zero optimization is globally enabled; individual
    /// fields can still opt out via `not_parsed`/`not_deparsed` pragmas.
    pub deparse_zero_enabled: bool,
}

impl FlexpackOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pipeline_is_selected(&self, pipe: &str) -> bool {
        self.restrict_pipelines.is_empty()
            || self.restrict_pipelines.iter().any(|p| p == pipe)
    }
}
