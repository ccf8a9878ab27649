mod builder;
pub mod classify;
mod consts;
mod digest;
pub mod error;
pub mod extract;
pub mod models;

pub use crate::builder::NoticeBuilder;
pub use crate::classify::{Classification, Classifier, FileKind, default_classifier};
pub use crate::digest::{BUCKET_KEY_LEN, DIGEST_LEN, Digest};
pub use crate::extract::{Extractor, RegexExtractor};
pub use crate::models::{Category, NO_NOTICE, Notice, UNSUPPORTED_PREFIX};
