use regex::Regex;
use regex::bytes::Regex as BytesRegex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

macro_rules! bytes_regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<BytesRegex> = LazyLock::new(|| BytesRegex::new($regex).unwrap());
    };
}

/// Case-insensitive "copyright" without pulling in Unicode case folding.
const COPYRIGHT: &str = "[Cc][Oo][Pp][Yy][Rr][Ii][Gg][Hh][Tt]";
/// Everything up to (but excluding) the end of the line.
const REST: &str = r"[^\r\n]*";
const EOL: &str = r"[\r\n]";

/// Joins alternatives into one byte-oriented pattern. Unicode mode is switched
/// off so that files which aren't valid UTF-8 can still match.
fn alternation<S: AsRef<str>>(alternatives: &[S]) -> String {
    let joined = alternatives.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("|");
    format!("(?-u){joined}")
}

// Lines which are likely to represent a copyright notice. The copyright sign
// is spelled out as its UTF-8 encoding since Unicode mode is off.
bytes_regex!(
    COPYRIGHT_REGEX,
    &alternation(&[
        // 'Copyright WORDS YEAR' where WORDS may be empty
        format!(r"([ \t]*{COPYRIGHT}{REST}[0-9]+{REST}{EOL})"),
        // 'Copyright: WORDS YEAR' where WORDS may be empty
        format!(r"([ \t]*{COPYRIGHT}:{REST}[0-9]+{REST}{EOL})"),
        // '(C) WS WORDS YEAR' where WORDS may be empty
        format!(r"([ \t]*\([Cc]\)[ \t]+{REST}[0-9]{{4}}{REST}{EOL})"),
        // '(C)YEAR WORDS' where WORDS may be empty
        format!(r"([ \t]*\([Cc]\)[0-9]{{4}}{REST}{EOL})"),
        // '© WORDS YEAR' where WORDS may be empty
        format!(r"([ \t]+\xC2\xA9{REST}[0-9]{{4}}{REST}{EOL})"),
    ])
);

bytes_regex!(
    COMMENT_REGEX,
    &alternation(&[
        // C style
        r"(/\*([^*]|[\r\n]|(\*+([^*/]|[\r\n])))*\*+/)",
        // troff style
        r#"(([ \t]*\.\\"[^\r\n]*[\r\n])+)"#,
        // C++ style
        r"(([ \t]*//[^\r\n]*[\r\n])+)",
        // Shell style
        r"(([ \t]*#[^\r\n]*[\r\n])+)",
        // Autoconf style
        r"(((dnl[ \t][^\r\n]*[\r\n])|(dnl[\r\n]))+)",
    ])
);

// `file -b` descriptions which mean there's no point looking for text.
regex!(
    BINARY_DESCRIPTION_REGEX,
    concat!(
        "(^data$)|",
        "(binary)|",
        "(PDF)|",
        "((([Ll][Ii][Tt][Tt][Ll][Ee])|([Bb][Ii][Gg]))[ -]*[Ee][Nn][Dd][Ii][Aa][Nn])|",
        "(TrueType)|",
        "(TIFF image)|",
        "(GIF image)|",
        "(PostScript document)|",
        "(ELF 32-bit)|",
        "(ELF 64-bit)|",
        "(Mach-O)|",
        "(PE.*executable)|",
        "(compiled Java)|",
        "(Vim swap)|",
        "(80386 COFF executable)|",
        "(Berkeley DB)|",
        "(ACB archive data)|",
        "(Big-endian)|",
        "(CDF V2 Document)|",
        "(lif)",
    )
);
regex!(UNKNOWN_DESCRIPTION_REGEX, "(unknown)|(none)");
regex!(COMPRESSED_DESCRIPTION_REGEX, "(compressed)|(archive)");
