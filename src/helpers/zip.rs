//! ZIP package helpers for xlsx workbooks.
//! Loads every part of an archive into memory, gives case-insensitive access to
//! parts, and rewrites the archive with replaced parts.

use crate::error::LedgerError;
use crate::helpers::xml::XmlReader;
use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::io::Seek;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipArchive;
use zip::ZipWriter;

/// One file inside the package
struct Part {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
}

/// In-memory copy of a ZIP package, preserving part order
#[derive(Default)]
pub(crate) struct Package {
    parts: Vec<Part>,
}

impl Package {
    /// Reads every file of the archive at `path` into memory
    pub(crate) fn open(path: &Path) -> Result<Package, LedgerError> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Reads every file of an archive into memory
    pub(crate) fn read<RS: Read + Seek>(reader: RS) -> Result<Package, LedgerError> {
        let mut zip = ZipArchive::new(reader)?;
        let mut parts = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let mut file = zip.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.push(Part {
                name: file.name().to_owned(),
                data,
                compression: file.compression(),
            });
        }
        Ok(Package { parts })
    }

    /// Finds the stored name of a part (case-insensitive, path separator agnostic)
    fn position(&self, name: &str) -> Option<usize> {
        let pattern = name.replace('\\', "/");
        self.parts
            .iter()
            .position(|part| pattern.eq_ignore_ascii_case(&part.name))
    }

    /// Gets the content of a part
    pub(crate) fn file(&self, name: &str) -> Option<&[u8]> {
        self.position(name).map(|index| self.parts[index].data.as_slice())
    }

    /// Creates an XML reader over a part
    pub(crate) fn xml_reader(&self, name: &str) -> Option<XmlReader<&[u8]>> {
        self.file(name).map(XmlReader::new)
    }

    /// Replaces the content of an existing part or appends a new one
    pub(crate) fn insert(&mut self, name: &str, data: Vec<u8>) {
        match self.position(name) {
            Some(index) => self.parts[index].data = data,
            None => self.parts.push(Part {
                name: name.replace('\\', "/"),
                data,
                compression: CompressionMethod::Deflated,
            }),
        }
    }

    /// Writes the package as a ZIP archive
    pub(crate) fn write<W: Write + Seek>(&self, writer: W) -> Result<W, LedgerError> {
        let mut zip = ZipWriter::new(writer);
        for part in &self.parts {
            let options = SimpleFileOptions::default().compression_method(part.compression);
            zip.start_file(part.name.as_str(), options)?;
            zip.write_all(&part.data)?;
        }
        Ok(zip.finish()?)
    }

    /// Saves the package to `path` through a temporary sibling file,
    /// so the destination is never left half-written
    pub(crate) fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let mut temporary = path.as_os_str().to_owned();
        temporary.push(".tmp");
        let temporary = Path::new(&temporary);
        {
            let file = File::create(temporary)?;
            let mut writer = self.write(BufWriter::new(file))?;
            writer.flush()?;
        }
        if let Err(error) = std::fs::rename(temporary, path) {
            // Some platforms refuse to rename over an existing file
            std::fs::remove_file(path)?;
            std::fs::rename(temporary, path).map_err(|_| error)?;
        }
        Ok(())
    }
}
