use std::fmt::{Display, Formatter, Result as FmtResult};

/// Best guess at the kind of file a notice was extracted from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Category {
    /// Text that was searched for a notice.
    #[default]
    Source,
    /// Binary or compressed content; never read.
    Binary,
    /// The classifier couldn't tell.
    Unknown,
    /// Classification or reading failed.
    Error,
}
impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Source => "source",
            Category::Binary => "binary",
            Category::Unknown => "unknown",
            Category::Error => "error",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
