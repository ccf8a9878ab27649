use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Open ended on purpose, to catch things like COPYING.GPL.
regex!(
    LICENSE_REGEX,
    concat!(
        "(AUTHORS)|",
        "(Artistic)|",
        "(BSD)|",
        "(CHANGES)|",
        "(COPYING)|",
        "(COPYING-CMAKE-SCRIPTS)|",
        "(COPYING3)|",
        "(COPYRIGHT)|",
        "(Copying)|",
        "(Copyright)|",
        "(IMPORTING)|",
        "(LIBGCJ_LICENSE)|",
        "(LICENSE)|",
        "(LICENSES)|",
        "(LICENSE_BSD)|",
        "(LICENSE_LGPL)|",
        "(LICENSE_MIT)|",
        "(License)|",
        "(NOTICE)|",
        "(PATENTS)|",
        "(rcache/RELEASE)|",
        "(THANKS)|",
        "(copyright)|",
        "(copyrights)",
    )
);

