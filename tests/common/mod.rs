// Shared helpers for integration tests.
//
// Provides a temporary game installation and builders for synthetic host
// executables (a PE32+ image carrying a `VS_VERSIONINFO` resource), so each
// integration test can run the real file-backed introspector in isolation.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(
    dead_code,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::cast_possible_truncation
)]

use std::path::{Path, PathBuf};

use engine_tweaks::host::{FileVersion, HostProfile};
use engine_tweaks::paths::Paths;

/// File name of the supported host.
pub const HOST_EXE: &str = "Cyberpunk2077.exe";

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

/// One version-info node: header, key, value and children, 32-bit aligned.
fn node(key: &str, value: &[u8], is_text: bool, children: &[Vec<u8>]) -> Vec<u8> {
    let mut out = vec![0u8; 6];
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

fn fixed_file_info(version: FileVersion) -> Vec<u8> {
    let ms = (u32::from(version.major) << 16) | u32::from(version.minor);
    let ls = (u32::from(version.build) << 16) | u32::from(version.revision);
    let mut words = [0u32; 13];
    words[0] = 0xFEEF_04BD;
    words[1] = 0x0001_0000;
    words[2] = ms;
    words[3] = ls;
    words[4] = ms;
    words[5] = ls;
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// A `VS_VERSIONINFO` block with one `040904b0` string table naming
/// `product`, and a matching translation entry.
pub fn version_block(product: &str, version: FileVersion) -> Vec<u8> {
    let strings = node(
        "StringFileInfo",
        &[],
        true,
        &[node(
            "040904b0",
            &[],
            true,
            &[
                node("CompanyName", &utf16z("CD PROJEKT RED"), true, &[]),
                node("ProductName", &utf16z(product), true, &[]),
            ],
        )],
    );
    let translation = [0x0409u16.to_le_bytes(), 0x04B0u16.to_le_bytes()].concat();
    let vars = node(
        "VarFileInfo",
        &[],
        true,
        &[node("Translation", &translation, false, &[])],
    );
    node(
        "VS_VERSION_INFO",
        &fixed_file_info(version),
        false,
        &[strings, vars],
    )
}

/// A PE32+ image whose only resource is `block` under `RT_VERSION`.
pub fn pe_image(block: &[u8]) -> Vec<u8> {
    const SECTION_RVA: u32 = 0x1000;
    const SECTION_FILE: usize = 0x200;
    const PE: usize = 0x80;

    // root dir → name dir → language dir → data entry → payload
    let (names, languages, data, payload) = (24usize, 48usize, 72usize, 88usize);
    let mut rsrc = vec![0u8; payload];
    rsrc[14..16].copy_from_slice(&1u16.to_le_bytes());
    rsrc[16..20].copy_from_slice(&16u32.to_le_bytes());
    rsrc[20..24].copy_from_slice(&(names as u32 | 0x8000_0000).to_le_bytes());
    rsrc[names + 14..names + 16].copy_from_slice(&1u16.to_le_bytes());
    rsrc[names + 16..names + 20].copy_from_slice(&1u32.to_le_bytes());
    rsrc[names + 20..names + 24].copy_from_slice(&(languages as u32 | 0x8000_0000).to_le_bytes());
    rsrc[languages + 14..languages + 16].copy_from_slice(&1u16.to_le_bytes());
    rsrc[languages + 16..languages + 20].copy_from_slice(&0x0409u32.to_le_bytes());
    rsrc[languages + 20..languages + 24].copy_from_slice(&(data as u32).to_le_bytes());
    rsrc[data..data + 4].copy_from_slice(&(SECTION_RVA + payload as u32).to_le_bytes());
    rsrc[data + 4..data + 8].copy_from_slice(&(block.len() as u32).to_le_bytes());
    rsrc.extend_from_slice(block);

    let mut image = vec![0u8; SECTION_FILE];
    image[0..2].copy_from_slice(b"MZ");
    image[0x3C..0x40].copy_from_slice(&(PE as u32).to_le_bytes());
    image[PE..PE + 4].copy_from_slice(b"PE\0\0");
    let coff = PE + 4;
    image[coff + 2..coff + 4].copy_from_slice(&1u16.to_le_bytes());
    let optional_size = 112 + 16 * 8;
    image[coff + 16..coff + 18].copy_from_slice(&(optional_size as u16).to_le_bytes());
    let optional = coff + 20;
    image[optional..optional + 2].copy_from_slice(&0x020Bu16.to_le_bytes());
    image[optional + 108..optional + 112].copy_from_slice(&16u32.to_le_bytes());
    let resource_dir = optional + 112 + 2 * 8;
    image[resource_dir..resource_dir + 4].copy_from_slice(&SECTION_RVA.to_le_bytes());
    image[resource_dir + 4..resource_dir + 8].copy_from_slice(&(rsrc.len() as u32).to_le_bytes());
    let row = optional + optional_size;
    image[row..row + 5].copy_from_slice(b".rsrc");
    image[row + 8..row + 12].copy_from_slice(&(rsrc.len() as u32).to_le_bytes());
    image[row + 12..row + 16].copy_from_slice(&SECTION_RVA.to_le_bytes());
    image[row + 16..row + 20].copy_from_slice(&(rsrc.len() as u32).to_le_bytes());
    image[row + 20..row + 24].copy_from_slice(&(SECTION_FILE as u32).to_le_bytes());

    image.extend_from_slice(&rsrc);
    image
}

/// Image of the supported host at the supported version.
pub fn supported_host() -> Vec<u8> {
    let profile = HostProfile::default();
    pe_image(&version_block(&profile.product_name, profile.supported))
}

/// An isolated game installation backed by a [`tempfile::TempDir`].
///
/// The directory is automatically deleted when dropped.
pub struct GameInstall {
    /// Temporary game root.
    pub root: tempfile::TempDir,
}

impl GameInstall {
    /// Create an empty installation with a `bin/x64` directory.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(root.path().join("bin").join("x64")).expect("create bin/x64");
        Self { root }
    }

    /// Path to the game root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Write `image` as `bin/x64/<name>` and return its path.
    pub fn install_host(&self, name: &str, image: &[u8]) -> PathBuf {
        let exe = self.root.path().join("bin").join("x64").join(name);
        std::fs::write(&exe, image).expect("write host image");
        exe
    }

    /// Standard layout for `executable`.
    pub fn paths(&self, executable: &Path) -> Paths {
        Paths::from_executable(executable)
    }

    /// Write `contents` as the plugin's `config.json`.
    pub fn write_config(&self, paths: &Paths, contents: &str) {
        std::fs::create_dir_all(paths.own_root()).expect("create own root");
        std::fs::write(paths.config(), contents).expect("write config.json");
    }
}
