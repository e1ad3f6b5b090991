//! Minimal PE reader: finds the `RT_VERSION` resource of an executable image.
//!
//! Only the structures needed to reach the resource directory are decoded:
//! DOS header, COFF header, the optional header's data directories, and the
//! section table (to map RVAs to file offsets).
use crate::error::ResourceError;

/// `MZ`
const DOS_MAGIC: u16 = 0x5A4D;
/// Offset of `e_lfanew` in the DOS header.
const DOS_LFANEW_OFFSET: usize = 0x3C;
/// `PE\0\0`
const PE_SIGNATURE: u32 = 0x0000_4550;
const COFF_HEADER_SIZE: usize = 20;
const PE32_MAGIC: u16 = 0x10B;
const PE32_PLUS_MAGIC: u16 = 0x20B;
/// Index of the resource table in the data directory array.
const RESOURCE_DIRECTORY_INDEX: u32 = 2;
const SECTION_HEADER_SIZE: usize = 40;
const RESOURCE_DIRECTORY_SIZE: usize = 16;
const RESOURCE_ENTRY_SIZE: usize = 8;
/// High bit of a resource entry: name is a string / target is a subdirectory.
const RESOURCE_HIGH_BIT: u32 = 0x8000_0000;
/// Resource type id of version information.
pub const RT_VERSION: u32 = 16;

/// Read a little-endian `u16` at `offset`.
pub(crate) fn read_u16(
    data: &[u8],
    offset: usize,
    what: &'static str,
) -> Result<u16, ResourceError> {
    data.get(offset..offset.saturating_add(2))
        .and_then(|b| b.try_into().ok())
        .map(u16::from_le_bytes)
        .ok_or(ResourceError::Truncated { what, offset })
}

/// Read a little-endian `u32` at `offset`.
pub(crate) fn read_u32(
    data: &[u8],
    offset: usize,
    what: &'static str,
) -> Result<u32, ResourceError> {
    data.get(offset..offset.saturating_add(4))
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or(ResourceError::Truncated { what, offset })
}

/// Widen a 32-bit on-disk offset.
fn offset(value: u32) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// One row of the section table.
#[derive(Debug, Clone, Copy)]
struct Section {
    virtual_address: u32,
    virtual_size: u32,
    raw_size: u32,
    raw_pointer: u32,
}

impl Section {
    /// File offset of `rva` if it falls inside this section.
    fn file_offset(&self, rva: u32) -> Option<usize> {
        let extent = self.virtual_size.max(self.raw_size);
        let delta = rva.checked_sub(self.virtual_address)?;
        (delta < extent).then(|| offset(self.raw_pointer).saturating_add(offset(delta)))
    }
}

/// The parts of a PE image needed to walk its resources.
#[derive(Debug)]
struct Image<'a> {
    data: &'a [u8],
    resource_rva: u32,
    resource_size: u32,
    sections: Vec<Section>,
}

impl<'a> Image<'a> {
    fn parse(data: &'a [u8]) -> Result<Self, ResourceError> {
        if read_u16(data, 0, "DOS header")? != DOS_MAGIC {
            return Err(ResourceError::BadSignature { what: "DOS" });
        }
        let pe = offset(read_u32(data, DOS_LFANEW_OFFSET, "DOS header")?);
        if read_u32(data, pe, "PE signature")? != PE_SIGNATURE {
            return Err(ResourceError::BadSignature { what: "PE" });
        }

        let coff = pe + 4;
        let section_count = usize::from(read_u16(data, coff + 2, "COFF header")?);
        let optional_size = usize::from(read_u16(data, coff + 16, "COFF header")?);

        let optional = coff + COFF_HEADER_SIZE;
        let (count_offset, directories) = match read_u16(data, optional, "optional header")? {
            PE32_MAGIC => (optional + 92, optional + 96),
            PE32_PLUS_MAGIC => (optional + 108, optional + 112),
            other => {
                return Err(ResourceError::Malformed(format!(
                    "unknown optional header magic {other:#x}"
                )));
            }
        };

        let directory_count = read_u32(data, count_offset, "optional header")?;
        let (resource_rva, resource_size) = if directory_count > RESOURCE_DIRECTORY_INDEX {
            let entry = directories + offset(RESOURCE_DIRECTORY_INDEX) * 8;
            (
                read_u32(data, entry, "data directory")?,
                read_u32(data, entry + 4, "data directory")?,
            )
        } else {
            (0, 0)
        };

        let table = optional + optional_size;
        let sections = (0..section_count)
            .map(|i| {
                let row = table + i * SECTION_HEADER_SIZE;
                Ok(Section {
                    virtual_size: read_u32(data, row + 8, "section header")?,
                    virtual_address: read_u32(data, row + 12, "section header")?,
                    raw_size: read_u32(data, row + 16, "section header")?,
                    raw_pointer: read_u32(data, row + 20, "section header")?,
                })
            })
            .collect::<Result<Vec<_>, ResourceError>>()?;

        Ok(Self {
            data,
            resource_rva,
            resource_size,
            sections,
        })
    }

    fn rva_to_offset(&self, rva: u32) -> Result<usize, ResourceError> {
        self.sections
            .iter()
            .find_map(|s| s.file_offset(rva))
            .ok_or_else(|| {
                ResourceError::Malformed(format!("RVA {rva:#x} is outside every section"))
            })
    }

    /// Return the `(id, target)` pairs of the directory at `dir`, where
    /// `dir` and `target` are offsets relative to the resource root.
    fn entries(&self, root: usize, dir: usize) -> Result<Vec<(u32, u32)>, ResourceError> {
        let at = root + dir;
        let named = usize::from(read_u16(self.data, at + 12, "resource directory")?);
        let ids = usize::from(read_u16(self.data, at + 14, "resource directory")?);
        (0..named + ids)
            .map(|i| {
                let entry = at + RESOURCE_DIRECTORY_SIZE + i * RESOURCE_ENTRY_SIZE;
                Ok((
                    read_u32(self.data, entry, "resource entry")?,
                    read_u32(self.data, entry + 4, "resource entry")?,
                ))
            })
            .collect()
    }

    /// Walk type → name → language and return the first version resource.
    fn version_resource(&self) -> Result<Option<&'a [u8]>, ResourceError> {
        if self.resource_rva == 0 || self.resource_size == 0 {
            return Ok(None);
        }
        let root = self.rva_to_offset(self.resource_rva)?;

        let Some(&(_, by_type)) = self
            .entries(root, 0)?
            .iter()
            .find(|(id, _)| *id == RT_VERSION)
        else {
            return Ok(None);
        };
        let names = subdirectory(by_type)?;

        let Some(&(_, by_name)) = self.entries(root, names)?.first() else {
            return Ok(None);
        };
        let languages = subdirectory(by_name)?;

        let Some(&(_, leaf)) = self.entries(root, languages)?.first() else {
            return Ok(None);
        };
        if leaf & RESOURCE_HIGH_BIT != 0 {
            return Err(ResourceError::Malformed(
                "version resource nests deeper than three levels".to_string(),
            ));
        }

        let entry = root + offset(leaf);
        let data_rva = read_u32(self.data, entry, "resource data entry")?;
        let size = offset(read_u32(self.data, entry + 4, "resource data entry")?);
        let start = self.rva_to_offset(data_rva)?;
        self.data
            .get(start..start.saturating_add(size))
            .map(Some)
            .ok_or(ResourceError::Truncated {
                what: "version resource",
                offset: start,
            })
    }
}

/// Decode a directory entry target that must point at a subdirectory.
fn subdirectory(target: u32) -> Result<usize, ResourceError> {
    if target & RESOURCE_HIGH_BIT == 0 {
        return Err(ResourceError::Malformed(
            "resource entry points at data where a directory was expected".to_string(),
        ));
    }
    Ok(offset(target & !RESOURCE_HIGH_BIT))
}

/// Locate the raw `VS_VERSIONINFO` block inside a PE image.
///
/// Returns `Ok(None)` when the image has no resource table or no version
/// resource.
///
/// # Errors
///
/// Returns a [`ResourceError`] if the image is not a PE file or its headers
/// or resource tree are truncated or inconsistent.
pub fn version_resource(image: &[u8]) -> Result<Option<&[u8]>, ResourceError> {
    Image::parse(image)?.version_resource()
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

    /// Assemble a PE32+ image with a single `.rsrc` section whose resource
    /// tree holds `resources` as `(type id, payload)` pairs.
    fn build_image(resources: &[(u32, &[u8])]) -> Vec<u8> {
        const SECTION_RVA: u32 = 0x1000;
        const SECTION_FILE: usize = 0x200;

        // Resource tree: root → one type dir per resource → one name → one language.
        let mut rsrc = Vec::new();
        let root_len = RESOURCE_DIRECTORY_SIZE + resources.len() * RESOURCE_ENTRY_SIZE;
        let level_len = RESOURCE_DIRECTORY_SIZE + RESOURCE_ENTRY_SIZE;
        let per_resource = level_len * 2 + 16;
        rsrc.resize(root_len + per_resource * resources.len(), 0);
        rsrc[14..16].copy_from_slice(&(resources.len() as u16).to_le_bytes());

        let mut payloads = Vec::new();
        for (i, (type_id, payload)) in resources.iter().enumerate() {
            let names = root_len + per_resource * i;
            let languages = names + level_len;
            let data_entry = languages + level_len;

            let root_entry = RESOURCE_DIRECTORY_SIZE + i * RESOURCE_ENTRY_SIZE;
            rsrc[root_entry..root_entry + 4].copy_from_slice(&type_id.to_le_bytes());
            rsrc[root_entry + 4..root_entry + 8]
                .copy_from_slice(&(names as u32 | RESOURCE_HIGH_BIT).to_le_bytes());

            rsrc[names + 14..names + 16].copy_from_slice(&1u16.to_le_bytes());
            rsrc[names + 16..names + 20].copy_from_slice(&1u32.to_le_bytes());
            rsrc[names + 20..names + 24]
                .copy_from_slice(&(languages as u32 | RESOURCE_HIGH_BIT).to_le_bytes());

            rsrc[languages + 14..languages + 16].copy_from_slice(&1u16.to_le_bytes());
            rsrc[languages + 16..languages + 20].copy_from_slice(&0x409u32.to_le_bytes());
            rsrc[languages + 20..languages + 24].copy_from_slice(&(data_entry as u32).to_le_bytes());

            payloads.push((data_entry, *payload));
        }
        for (data_entry, payload) in payloads {
            let at = rsrc.len();
            rsrc.extend_from_slice(payload);
            let rva = SECTION_RVA + at as u32;
            rsrc[data_entry..data_entry + 4].copy_from_slice(&rva.to_le_bytes());
            rsrc[data_entry + 4..data_entry + 8].copy_from_slice(&(payload.len() as u32).to_le_bytes());
        }

        let mut image = vec![0u8; SECTION_FILE];
        image[0..2].copy_from_slice(&DOS_MAGIC.to_le_bytes());
        let pe = 0x80usize;
        image[DOS_LFANEW_OFFSET..DOS_LFANEW_OFFSET + 4].copy_from_slice(&(pe as u32).to_le_bytes());
        image[pe..pe + 4].copy_from_slice(&PE_SIGNATURE.to_le_bytes());
        let coff = pe + 4;
        image[coff + 2..coff + 4].copy_from_slice(&1u16.to_le_bytes());
        let optional_size = 112 + 16 * 8;
        image[coff + 16..coff + 18].copy_from_slice(&(optional_size as u16).to_le_bytes());
        let optional = coff + COFF_HEADER_SIZE;
        image[optional..optional + 2].copy_from_slice(&PE32_PLUS_MAGIC.to_le_bytes());
        image[optional + 108..optional + 112].copy_from_slice(&16u32.to_le_bytes());
        let dir = optional + 112 + 2 * 8;
        image[dir..dir + 4].copy_from_slice(&SECTION_RVA.to_le_bytes());
        image[dir + 4..dir + 8].copy_from_slice(&(rsrc.len() as u32).to_le_bytes());
        let row = optional + optional_size;
        image[row..row + 5].copy_from_slice(b".rsrc");
        image[row + 8..row + 12].copy_from_slice(&(rsrc.len() as u32).to_le_bytes());
        image[row + 12..row + 16].copy_from_slice(&SECTION_RVA.to_le_bytes());
        image[row + 16..row + 20].copy_from_slice(&(rsrc.len() as u32).to_le_bytes());
        image[row + 20..row + 24].copy_from_slice(&(SECTION_FILE as u32).to_le_bytes());

        image.extend_from_slice(&rsrc);
        image
    }

    #[test]
    fn finds_version_resource() {
        let image = build_image(&[(3, b"icon"), (RT_VERSION, b"version-block")]);
        let block = version_resource(&image).expect("parse").expect("present");
        assert_eq!(block, b"version-block");
    }

    #[test]
    fn missing_version_resource_is_none() {
        let image = build_image(&[(3, b"icon")]);
        assert_eq!(version_resource(&image).expect("parse"), None);
    }

    #[test]
    fn no_resource_table_is_none() {
        let mut image = build_image(&[(RT_VERSION, b"v")]);
        // Zero the resource data directory.
        let optional = 0x80 + 4 + COFF_HEADER_SIZE;
        let dir = optional + 112 + 16;
        image[dir..dir + 8].fill(0);
        assert_eq!(version_resource(&image).expect("parse"), None);
    }

    #[test]
    fn rejects_non_pe_data() {
        assert_eq!(
            version_resource(b"#!/bin/sh\necho hi\n"),
            Err(ResourceError::BadSignature { what: "DOS" })
        );
    }

    #[test]
    fn rejects_truncated_image() {
        let image = build_image(&[(RT_VERSION, b"v")]);
        let err = version_resource(&image[..0x90]).unwrap_err();
        assert!(matches!(err, ResourceError::Truncated { .. }));
    }

    #[test]
    fn read_helpers_report_offset() {
        assert_eq!(
            read_u32(&[1, 2, 3], 0, "probe"),
            Err(ResourceError::Truncated {
                what: "probe",
                offset: 0
            })
        );
        assert_eq!(read_u16(&[0x34, 0x12], 0, "probe"), Ok(0x1234));
    }
}
