mod category;
mod notice;

pub use self::category::Category;
pub use self::notice::{NO_NOTICE, Notice, UNSUPPORTED_PREFIX};
