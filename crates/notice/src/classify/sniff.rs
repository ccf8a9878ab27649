use super::{Classification, Classifier};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Number of leading bytes inspected.
const SNIFF_LEN: u64 = 8 * 1024;

/// Magic prefixes paired with the description `file -b` would print for them.
const SIGNATURES: &[(&[u8], &str)] = &[
    (&[0x1F, 0x8B], "gzip compressed data"),
    (&[0x42, 0x5A, 0x68], "bzip2 compressed data"),
    (&[0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00], "XZ compressed data"),
    (&[0x28, 0xB5, 0x2F, 0xFD], "Zstandard compressed data"),
    (b"PK\x03\x04", "Zip archive data"),
    (b"7z\xBC\xAF\x27\x1C", "7-zip archive data"),
    (&[0x7F, b'E', b'L', b'F', 0x01], "ELF 32-bit"),
    (&[0x7F, b'E', b'L', b'F', 0x02], "ELF 64-bit"),
    (&[0xFE, 0xED, 0xFA, 0xCE], "Mach-O executable"),
    (&[0xFE, 0xED, 0xFA, 0xCF], "Mach-O 64-bit executable"),
    (&[0xCE, 0xFA, 0xED, 0xFE], "Mach-O executable"),
    (&[0xCF, 0xFA, 0xED, 0xFE], "Mach-O 64-bit executable"),
    (&[0xCA, 0xFE, 0xBA, 0xBE], "compiled Java class data"),
    (b"MZ", "PE32 executable (MS Windows)"),
    (b"%PDF-", "PDF document"),
    (b"%!PS", "PostScript document text"),
    (b"GIF87a", "GIF image data"),
    (b"GIF89a", "GIF image data"),
    (b"II*\x00", "TIFF image data, little-endian"),
    (b"MM\x00*", "TIFF image data, big-endian"),
];

/// Built-in classifier for systems without `file(1)`.
///
/// Looks at the first few KiB of a file: known magic numbers first, then a
/// NUL byte means binary data, then UTF-8 validity decides between the text
/// descriptions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SniffClassifier;
impl SniffClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Describes a file from its leading bytes.
    pub fn describe(head: &[u8]) -> &'static str {
        if head.is_empty() {
            return "empty";
        }
        if let Some((_, description)) = SIGNATURES.iter().find(|(magic, _)| head.starts_with(magic)) {
            return description;
        }
        if memchr::memchr(0, head).is_some() {
            return "data";
        }
        match std::str::from_utf8(head) {
            Ok(text) if text.is_ascii() => "ASCII text",
            Ok(_) => "UTF-8 Unicode text",
            // The window may have cut a multi-byte character in half.
            Err(e) if e.error_len().is_none() => "UTF-8 Unicode text",
            Err(_) => "ISO-8859 text",
        }
    }

    fn head(path: &Path) -> std::io::Result<Vec<u8>> {
        let mut head = Vec::with_capacity(SNIFF_LEN as usize);
        File::open(path)?.take(SNIFF_LEN).read_to_end(&mut head)?;
        Ok(head)
    }
}

impl Classifier for SniffClassifier {
    fn name(&self) -> &'static str {
        "sniff"
    }

    fn classify(&self, path: &Path) -> Result<Classification> {
        let head = Self::head(path).or_raise(|| ErrorKind::Classify(path.to_path_buf()))?;
        Ok(Classification::from_description(Self::describe(&head)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::FileKind;
    use rstest::rstest;

    #[rstest]
    #[case(b"", "empty", FileKind::Source)]
    #[case(b"int main(void);\n", "ASCII text", FileKind::Source)]
    #[case("/* \u{a9} 2020 */\n".as_bytes(), "UTF-8 Unicode text", FileKind::Source)]
    #[case(&[b'a', 0xE9, b'b'], "ISO-8859 text", FileKind::Source)]
    #[case(&[b'a', 0x00, b'b'], "data", FileKind::Binary)]
    #[case(&[0x1F, 0x8B, 0x08, 0x00], "gzip compressed data", FileKind::Compressed)]
    #[case(b"PK\x03\x04rest", "Zip archive data", FileKind::Compressed)]
    #[case(&[0x7F, b'E', b'L', b'F', 0x02, 0x01], "ELF 64-bit", FileKind::Binary)]
    #[case(b"MZ\x90\x00", "PE32 executable (MS Windows)", FileKind::Binary)]
    #[case(b"%PDF-1.4", "PDF document", FileKind::Binary)]
    fn describes_leading_bytes(#[case] head: &[u8], #[case] description: &str, #[case] kind: FileKind) {
        assert_eq!(SniffClassifier::describe(head), description);
        assert_eq!(FileKind::from_description(SniffClassifier::describe(head)), kind);
    }

    #[test]
    fn truncated_multibyte_character_is_still_text() {
        let head = [b'a', 0xC2];
        assert_eq!(SniffClassifier::describe(&head), "UTF-8 Unicode text");
    }

    #[test]
    fn classifies_files_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("a.c");
        let binary = dir.path().join("a.out");
        std::fs::write(&text, "/* Copyright 2020 X */\n").unwrap();
        std::fs::write(&binary, [0x7F, b'E', b'L', b'F', 0x02, 0x01, 0x01, 0x00]).unwrap();

        let classifier = SniffClassifier::new();
        assert!(classifier.classify(&text).unwrap().is_source());
        let classification = classifier.classify(&binary).unwrap();
        assert_eq!(classification.kind, FileKind::Binary);
        assert_eq!(classification.description, "ELF 64-bit");
    }

    #[test]
    fn unreadable_file_fails() {
        let err = SniffClassifier::new().classify(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Classify(_)));
    }
}
