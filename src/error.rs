use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Every one of these ends the run with a non-zero exit status.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("failed to load configuration")]
    Config,
    #[display("input path is not accessible")]
    Precheck,
    #[display("failed to open path list: {}", _0.display())]
    PathList(#[error(not(source))] PathBuf),
    #[display("failed to write output: {}", _0.display())]
    Output(#[error(not(source))] PathBuf),
    #[display("invalid store options")]
    Store,
    #[display("scan failed")]
    Scan,
    #[display("failed to write report")]
    Report,
}
