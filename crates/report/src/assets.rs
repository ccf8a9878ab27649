//! Assets embedded into the binary at compile time using
//! [`rust-embed`](rust_embed).

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use rust_embed::Embed;
use std::borrow::Cow;

pub(crate) const TEMPLATE: &str = "report.html";
pub(crate) const STYLESHEET: &str = "report.css";

#[derive(Embed)]
#[folder = "../../assets/"]
pub(crate) struct Builtins;
impl Builtins {
    pub(crate) fn load(name: &str) -> Result<Cow<'static, [u8]>> {
        Self::get(name).map(|f| f.data).ok_or_raise(|| ErrorKind::AssetNotFound(name.to_string()))
    }

    pub(crate) fn load_str(name: &str) -> Result<String> {
        let bytes = Self::load(name)?;
        String::from_utf8(bytes.into_owned()).or_raise(|| ErrorKind::AssetNotFound(name.to_string()))
    }
}
