use thiserror::Error;

/// Fatal conditions: nothing is emitted when one of these is returned.
#[derive(Error, Debug)]
pub enum Error {
    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Recoverable conditions reported alongside a successful result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    #[error("{fragment}:{line}: skipped record: {reason}")]
    MalformedRecord {
        fragment: String,
        line: usize,
        reason: String,
    },

    #[error("{fragment}: skipped fragment: {reason}")]
    SkippedFragment { fragment: String, reason: String },

    #[error("{fragment}: fragment supplied more than once, later copy ignored")]
    DuplicateFragment { fragment: String },

    #[error("no fragment produced any function; emitting an empty diagram")]
    EmptyGraph,

    #[error(
        "no entry point reaches {unreached} function(s); using '{entry}' (out-degree {out_degree}) as a synthetic entry"
    )]
    CyclicNoEntry {
        entry: String,
        out_degree: usize,
        unreached: usize,
    },
}

impl Warning {
    /// Log the warning once at the point it is raised.
    pub(crate) fn emit(self, sink: &mut Vec<Warning>) {
        tracing::warn!("{self}");
        sink.push(self);
    }
}
