//! `VS_VERSIONINFO` block parser.
//!
//! A version block is a tree of nodes. Every node starts on a 32-bit
//! boundary (relative to the block start) with `wLength`, `wValueLength`,
//! `wType` and a NUL-terminated UTF-16 key, followed by padding, the value
//! and padding, then child nodes up to `wLength`.
//!
//! ```text
//! VS_VERSION_INFO            value: VS_FIXEDFILEINFO
//! ├── StringFileInfo
//! │   └── 040904b0           one table per language/code page
//! │       ├── ProductName    value: UTF-16 text
//! │       └── …
//! └── VarFileInfo
//!     └── Translation        value: [(language u16, code page u16)]
//! ```
use super::FileVersion;
use super::pe::{read_u16, read_u32};
use crate::error::ResourceError;

const ROOT_KEY: &str = "VS_VERSION_INFO";
const STRING_FILE_INFO: &str = "StringFileInfo";
const VAR_FILE_INFO: &str = "VarFileInfo";
const TRANSLATION: &str = "Translation";
const FIXED_FILE_INFO_SIGNATURE: u32 = 0xFEEF_04BD;
const FIXED_FILE_INFO_SIZE: usize = 52;
const NODE_HEADER_SIZE: usize = 6;
/// Real blocks are four levels deep; anything past this is corrupt.
const MAX_DEPTH: usize = 8;

/// A language / code page pair from the translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Translation {
    /// Windows language identifier (e.g. `0x0409`).
    pub language: u16,
    /// Code page (e.g. `0x04B0` for UTF-16).
    pub code_page: u16,
}

impl Translation {
    /// Create a translation entry.
    #[must_use]
    pub const fn new(language: u16, code_page: u16) -> Self {
        Self {
            language,
            code_page,
        }
    }

    /// Key of the string table for this translation, e.g. `040904b0`.
    #[must_use]
    pub fn table_key(&self) -> String {
        format!("{:04x}{:04x}", self.language, self.code_page)
    }
}

/// A string table: one language/code-page worth of `key = value` strings.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StringTable {
    key: String,
    strings: Vec<(String, String)>,
}

/// Parsed contents of a `VS_VERSIONINFO` block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionInfo {
    file_version: Option<FileVersion>,
    product_version: Option<FileVersion>,
    translations: Vec<Translation>,
    tables: Vec<StringTable>,
}

/// One decoded node of the block.
#[derive(Debug)]
struct Node<'a> {
    key: String,
    value: &'a [u8],
    children: Vec<Node<'a>>,
}

const fn align4(offset: usize) -> usize {
    (offset + 3) & !3
}

/// Decode UTF-16LE up to the first NUL (or the end of `bytes`).
fn utf16_until_nul(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| <[u8; 2]>::try_from(pair).map_or(0, u16::from_le_bytes))
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

/// Parse the node starting at `start`, bounded by `limit`.
fn parse_node(
    block: &[u8],
    start: usize,
    limit: usize,
    depth: usize,
) -> Result<Node<'_>, ResourceError> {
    if depth > MAX_DEPTH {
        return Err(ResourceError::Malformed(
            "version block nests too deeply".to_string(),
        ));
    }

    let length = usize::from(read_u16(block, start, "version node")?);
    let value_length = usize::from(read_u16(block, start + 2, "version node")?);
    let is_text = read_u16(block, start + 4, "version node")? == 1;
    if length < NODE_HEADER_SIZE {
        return Err(ResourceError::Malformed(format!(
            "version node at {start:#x} is shorter than its header"
        )));
    }
    let end = start + length;
    if end > limit {
        return Err(ResourceError::Truncated {
            what: "version node",
            offset: start,
        });
    }

    let key_start = start + NODE_HEADER_SIZE;
    let key_bytes = block.get(key_start..end).unwrap_or_default();
    let key_units = key_bytes
        .chunks_exact(2)
        .position(|pair| pair == [0, 0])
        .ok_or(ResourceError::Truncated {
            what: "version node key",
            offset: key_start,
        })?;
    let key = utf16_until_nul(key_bytes);

    let value_start = align4(key_start + (key_units + 1) * 2);
    // Text values count UTF-16 units; some producers store bytes instead,
    // so clamp to the node.
    let value_bytes = if is_text { value_length * 2 } else { value_length };
    let value_end = (value_start + value_bytes).min(end);
    let value = block
        .get(value_start.min(value_end)..value_end)
        .unwrap_or_default();

    let mut children = Vec::new();
    let mut cursor = align4(value_end);
    while cursor + NODE_HEADER_SIZE <= end {
        let child_length = usize::from(read_u16(block, cursor, "version node")?);
        if child_length == 0 {
            // Trailing padding.
            break;
        }
        children.push(parse_node(block, cursor, end, depth + 1)?);
        cursor = align4(cursor + child_length);
    }

    Ok(Node {
        key,
        value,
        children,
    })
}

impl VersionInfo {
    /// Parse a raw version block as returned by
    /// [`pe::version_resource`](super::pe::version_resource).
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the root key is not `VS_VERSION_INFO`
    /// or a node is truncated or inconsistent.
    pub fn parse(block: &[u8]) -> Result<Self, ResourceError> {
        let root = parse_node(block, 0, block.len(), 0)?;
        if root.key != ROOT_KEY {
            return Err(ResourceError::BadSignature {
                what: "VS_VERSION_INFO",
            });
        }

        let mut info = Self::default();
        if root.value.len() >= FIXED_FILE_INFO_SIZE
            && read_u32(root.value, 0, "VS_FIXEDFILEINFO")? == FIXED_FILE_INFO_SIGNATURE
        {
            let word = |at| read_u32(root.value, at, "VS_FIXEDFILEINFO");
            info.file_version = Some(FileVersion::from_packed(word(8)?, word(12)?));
            info.product_version = Some(FileVersion::from_packed(word(16)?, word(20)?));
        }

        for child in root.children {
            match child.key.as_str() {
                STRING_FILE_INFO => {
                    info.tables.extend(child.children.into_iter().map(|table| StringTable {
                        key: table.key,
                        strings: table
                            .children
                            .into_iter()
                            .map(|s| (s.key, utf16_until_nul(s.value)))
                            .collect(),
                    }));
                }
                VAR_FILE_INFO => {
                    for var in child.children.iter().filter(|v| v.key == TRANSLATION) {
                        info.translations.extend(var.value.chunks_exact(4).filter_map(|pair| {
                            Some(Translation::new(
                                read_u16(pair, 0, "translation").ok()?,
                                read_u16(pair, 2, "translation").ok()?,
                            ))
                        }));
                    }
                }
                _ => {}
            }
        }

        Ok(info)
    }

    /// Entries of the `\VarFileInfo\Translation` table, in file order.
    #[must_use]
    pub fn translations(&self) -> &[Translation] {
        &self.translations
    }

    /// Look up `\StringFileInfo\<table>\<key>` for `translation`.
    ///
    /// Table and string keys are matched ASCII case-insensitively, as the
    /// OS version query does.
    #[must_use]
    pub fn query_string(&self, translation: Translation, key: &str) -> Option<&str> {
        let table_key = translation.table_key();
        self.tables
            .iter()
            .filter(|t| t.key.eq_ignore_ascii_case(&table_key))
            .flat_map(|t| t.strings.iter())
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    /// The `ProductName` string for `translation`.
    #[must_use]
    pub fn product_name(&self, translation: Translation) -> Option<&str> {
        self.query_string(translation, "ProductName")
    }

    /// File version from the fixed file info; [`FileVersion::UNKNOWN`] when absent.
    #[must_use]
    pub fn file_version(&self) -> FileVersion {
        self.file_version.unwrap_or(FileVersion::UNKNOWN)
    }

    /// Product version from the fixed file info, if present.
    #[must_use]
    pub const fn product_version(&self) -> Option<FileVersion> {
        self.product_version
    }

    /// Build version info directly (for testing): `translations` form the
    /// translation table and each `(translation, name)` becomes a string
    /// table holding `ProductName = name`.
    #[cfg(test)]
    pub(crate) fn with_products(
        version: FileVersion,
        translations: &[Translation],
        products: &[(Translation, &str)],
    ) -> Self {
        Self {
            file_version: Some(version),
            product_version: Some(version),
            translations: translations.to_vec(),
            tables: products
                .iter()
                .map(|(t, name)| StringTable {
                    key: t.table_key(),
                    strings: vec![("ProductName".to_string(), (*name).to_string())],
                })
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::cast_possible_truncation
)]
mod tests {
    use super::*;

    fn pad4(out: &mut Vec<u8>) {
        while out.len() % 4 != 0 {
            out.push(0);
        }
    }

    fn utf16z(text: &str) -> Vec<u8> {
        text.encode_utf16()
            .chain(std::iter::once(0))
            .flat_map(u16::to_le_bytes)
            .collect()
    }

    fn node(key: &str, value: &[u8], is_text: bool, children: &[Vec<u8>]) -> Vec<u8> {
        let mut out = vec![0u8; NODE_HEADER_SIZE];
        out.extend(utf16z(key));
        pad4(&mut out);
        out.extend_from_slice(value);
        for child in children {
            pad4(&mut out);
            out.extend_from_slice(child);
        }
        let value_length = if is_text { value.len() / 2 } else { value.len() };
        let len = out.len() as u16;
        out[0..2].copy_from_slice(&len.to_le_bytes());
        out[2..4].copy_from_slice(&(value_length as u16).to_le_bytes());
        out[4..6].copy_from_slice(&u16::from(is_text).to_le_bytes());
        out
    }

    fn fixed_info(ms: u32, ls: u32) -> Vec<u8> {
        let mut words = [0u32; 13];
        words[0] = FIXED_FILE_INFO_SIGNATURE;
        words[1] = 0x0001_0000;
        words[2] = ms;
        words[3] = ls;
        words[4] = ms;
        words[5] = ls;
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    fn block(product: &str, table: &str, translations: &[(u16, u16)]) -> Vec<u8> {
        let strings = node(
            STRING_FILE_INFO,
            &[],
            true,
            &[node(
                table,
                &[],
                true,
                &[
                    node("CompanyName", &utf16z("CD PROJEKT RED"), true, &[]),
                    node("ProductName", &utf16z(product), true, &[]),
                ],
            )],
        );
        let pairs: Vec<u8> = translations
            .iter()
            .flat_map(|(l, c)| [l.to_le_bytes(), c.to_le_bytes()].concat())
            .collect();
        let vars = node(VAR_FILE_INFO, &[], true, &[node(TRANSLATION, &pairs, false, &[])]);
        node(
            ROOT_KEY,
            &fixed_info(0x0003_0000, 0x004C_FAB3),
            false,
            &[strings, vars],
        )
    }

    #[test]
    fn parses_fixed_version() {
        let info = VersionInfo::parse(&block("Cyberpunk 2077", "040904b0", &[(0x409, 0x4b0)]))
            .expect("parse");
        assert_eq!(info.file_version(), FileVersion::new(3, 0, 76, 64179));
        assert_eq!(info.product_version(), Some(FileVersion::new(3, 0, 76, 64179)));
    }

    #[test]
    fn reads_translation_table() {
        let info = VersionInfo::parse(&block("x", "040904b0", &[(0x409, 0x4b0), (0x407, 0x4e4)]))
            .expect("parse");
        assert_eq!(
            info.translations(),
            &[Translation::new(0x409, 0x4b0), Translation::new(0x407, 0x4e4)]
        );
    }

    #[test]
    fn product_name_by_translation() {
        let info = VersionInfo::parse(&block("Cyberpunk 2077", "040904b0", &[(0x409, 0x4b0)]))
            .expect("parse");
        assert_eq!(
            info.product_name(Translation::new(0x409, 0x4b0)),
            Some("Cyberpunk 2077")
        );
        assert_eq!(info.product_name(Translation::new(0x407, 0x4b0)), None);
    }

    #[test]
    fn table_key_match_ignores_case() {
        let info = VersionInfo::parse(&block("Cyberpunk 2077", "040904B0", &[(0x409, 0x4b0)]))
            .expect("parse");
        assert_eq!(
            info.product_name(Translation::new(0x409, 0x4b0)),
            Some("Cyberpunk 2077")
        );
    }

    #[test]
    fn table_key_format() {
        assert_eq!(Translation::new(0x409, 0x4b0).table_key(), "040904b0");
    }

    #[test]
    fn rejects_wrong_root_key() {
        let data = node("NOT_VERSION_INFO", &[], false, &[]);
        assert_eq!(
            VersionInfo::parse(&data),
            Err(ResourceError::BadSignature {
                what: "VS_VERSION_INFO"
            })
        );
    }

    #[test]
    fn rejects_truncated_block() {
        let data = block("Cyberpunk 2077", "040904b0", &[(0x409, 0x4b0)]);
        assert!(VersionInfo::parse(&data[..data.len() / 2]).is_err());
    }

    #[test]
    fn empty_block_is_error() {
        assert!(VersionInfo::parse(&[]).is_err());
    }

    #[test]
    fn missing_fixed_info_is_unknown_version() {
        let data = node(ROOT_KEY, &[], false, &[]);
        let info = VersionInfo::parse(&data).expect("parse");
        assert_eq!(info.file_version(), FileVersion::UNKNOWN);
        assert!(info.translations().is_empty());
    }
}
