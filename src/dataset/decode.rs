use serde::{Deserialize, Serialize};

/// Text encoding the dataset bytes were decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    Utf8,
    Latin1,
    /// UTF-8 overall, with some cells only readable as ISO-8859-1.
    Mixed,
}

impl TextEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Latin1 => "ISO-8859-1",
            Self::Mixed => "UTF-8 with ISO-8859-1 cells",
        }
    }
}

/// Explicit rename applied to track and artist names after decoding
/// (config file `[[name_fixes]]`).
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct NameFix {
    pub from: String,
    pub to: String,
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decode raw dataset bytes cell by cell.
///
/// A leading BOM is dropped. Each cell (bytes up to the next `,` or newline)
/// is kept as UTF-8 when valid and otherwise read as ISO-8859-1, which maps
/// every byte to the code point of the same value and cannot fail. The
/// separators are ASCII and never occur inside a multi-byte UTF-8 sequence,
/// so splitting on them preserves the CSV structure.
pub fn decode(bytes: &[u8]) -> (String, TextEncoding) {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut text = String::with_capacity(body.len());
    let mut utf8_cells = 0usize;
    let mut latin1_cells = 0usize;

    for cell in body.split_inclusive(|&b| b == b',' || b == b'\n') {
        match std::str::from_utf8(cell) {
            Ok(s) => {
                if !s.is_ascii() {
                    utf8_cells += 1;
                }
                text.push_str(s);
            }
            Err(_) => {
                latin1_cells += 1;
                text.extend(cell.iter().map(|&b| b as char));
            }
        }
    }

    if latin1_cells > 0 {
        log::debug!("{latin1_cells} cells are not valid UTF-8, decoded as ISO-8859-1");
    }
    let encoding = match (utf8_cells, latin1_cells) {
        (_, 0) => TextEncoding::Utf8,
        (0, _) => TextEncoding::Latin1,
        _ => TextEncoding::Mixed,
    };
    (text, encoding)
}

/// Apply the remapping table to a name. Exact matches only.
pub fn apply_fixes(name: &str, fixes: &[NameFix]) -> String {
    match fixes.iter().find(|f| f.from == name) {
        Some(fix) => {
            log::debug!("Renaming {:?} => {:?}", fix.from, fix.to);
            fix.to.clone()
        }
        None => name.to_string(),
    }
}
