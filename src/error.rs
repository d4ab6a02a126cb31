use anyhow::anyhow;

pub type Result<T> = std::result::Result<T, LibError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedGraph,
    InvalidReparent,
    CyclicGraph,
    NoRootFound,
    SourceUnavailable,
    Unknown,
}

#[derive(Debug)]
pub struct LibError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub public: &'static str,
    pub source: anyhow::Error,
}

impl LibError {
    pub fn malformed(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::MalformedGraph,
            code: "org_malformed_graph",
            public,
            source,
        }
    }

    pub fn malformed_with_code(
        code: &'static str,
        public: &'static str,
        source: anyhow::Error,
    ) -> Self {
        Self {
            kind: ErrorKind::MalformedGraph,
            code,
            public,
            source,
        }
    }

    pub fn invalid_reparent(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::InvalidReparent,
            code: "org_invalid_reparent",
            public,
            source,
        }
    }

    pub fn invalid_reparent_with_code(
        code: &'static str,
        public: &'static str,
        source: anyhow::Error,
    ) -> Self {
        Self {
            kind: ErrorKind::InvalidReparent,
            code,
            public,
            source,
        }
    }

    pub fn cyclic(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::CyclicGraph,
            code: "org_reporting_cycle",
            public,
            source,
        }
    }

    pub fn no_root(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::NoRootFound,
            code: "org_no_root",
            public,
            source,
        }
    }

    pub fn source_unavailable(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::SourceUnavailable,
            code: "org_source_unavailable",
            public,
            source,
        }
    }

    pub fn unknown(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            code: "unknown_error",
            public,
            source,
        }
    }

    pub fn message(public: &'static str) -> Self {
        Self::unknown(public, anyhow!(public))
    }
}

impl std::fmt::Display for LibError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.public, self.code)
    }
}

impl std::error::Error for LibError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}
