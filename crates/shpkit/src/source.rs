//! Where the files of a bundle come from.
//!
//! A bundle is the set of files sharing a stem: `name.shp` plus optional
//! `name.shx`, `name.dbf` and `name.cpg`. Sources hand out each member's
//! bytes by extension.

use std::fs::{self, File};
use std::ops::Deref;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::Result;

/// Upper bound on the buffer reserved from an archive's declared entry size.
#[cfg(feature = "zip")]
const MAX_PREALLOCATION: u64 = 64 << 20;

/// Bytes of one bundle member.
#[derive(Debug)]
pub enum MemberData {
    /// A memory-mapped file.
    Mapped(Mmap),
    /// Bytes read into memory.
    Owned(Vec<u8>),
}

impl Deref for MemberData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Mapped(mmap) => mmap.as_ref(),
            Self::Owned(bytes) => bytes.as_slice(),
        }
    }
}

/// Provides the members of one bundle.
pub trait BundleSource {
    /// Name used in messages.
    fn name(&self) -> &str;

    /// Fetch the member with `extension` (without the dot), matched
    /// case-insensitively. Returns `None` when the bundle has no such file.
    fn member(&mut self, extension: &str) -> Result<Option<MemberData>>;
}

/// Sibling files next to a `.shp` on disk.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    stem: String,
    name: String,
}

impl DirectorySource {
    /// Source for the bundle whose main file is `shp_path`.
    pub fn new<P: AsRef<Path>>(shp_path: P) -> Self {
        let path = shp_path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            dir,
            stem,
            name: path.display().to_string(),
        }
    }

    fn find(&self, extension: &str) -> Result<Option<PathBuf>> {
        let exact = self.dir.join(format!("{}.{}", self.stem, extension));
        if exact.is_file() {
            return Ok(Some(exact));
        }
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let stem_matches = path
                .file_stem()
                .is_some_and(|s| s.to_string_lossy() == self.stem);
            let extension_matches = path
                .extension()
                .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(extension));
            if stem_matches && extension_matches && path.is_file() {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }
}

impl BundleSource for DirectorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn member(&mut self, extension: &str) -> Result<Option<MemberData>> {
        let Some(path) = self.find(extension)? else {
            return Ok(None);
        };
        let file = File::open(&path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Some(MemberData::Owned(Vec::new())));
        }
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Some(MemberData::Mapped(mmap)))
    }
}

/// A bundle stored inside a ZIP archive.
///
/// The first `.shp` entry fixes the stem; other members are looked up next
/// to it.
#[cfg(feature = "zip")]
pub struct ZipSource {
    archive: zip::ZipArchive<File>,
    stem: Option<String>,
    name: String,
}

#[cfg(feature = "zip")]
impl ZipSource {
    /// Open an archive on disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let archive = zip::ZipArchive::new(File::open(path)?)?;
        let stem = archive
            .file_names()
            .filter(|name| !name.starts_with("__MACOSX/"))
            .find_map(|name| split_extension(name).filter(|(_, ext)| ext.eq_ignore_ascii_case("shp")))
            .map(|(stem, _)| stem.to_string());
        Ok(Self {
            archive,
            stem,
            name: path.display().to_string(),
        })
    }
}

#[cfg(feature = "zip")]
fn split_extension(name: &str) -> Option<(&str, &str)> {
    let (stem, ext) = name.rsplit_once('.')?;
    (!ext.contains('/')).then_some((stem, ext))
}

#[cfg(feature = "zip")]
impl BundleSource for ZipSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn member(&mut self, extension: &str) -> Result<Option<MemberData>> {
        use std::io::Read;

        let Some(stem) = &self.stem else {
            return Ok(None);
        };
        let entry_name = self
            .archive
            .file_names()
            .find(|name| {
                split_extension(name).is_some_and(|(s, e)| s == stem && e.eq_ignore_ascii_case(extension))
            })
            .map(str::to_string);
        let Some(entry_name) = entry_name else {
            return Ok(None);
        };

        let mut entry = self.archive.by_name(&entry_name)?;
        let mut bytes = Vec::with_capacity(entry.size().min(MAX_PREALLOCATION) as usize);
        entry.read_to_end(&mut bytes)?;
        Ok(Some(MemberData::Owned(bytes)))
    }
}
