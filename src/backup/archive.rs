//! Archive container
//!
//! A backup is a single tar stream, optionally gzip-compressed. Readers detect
//! compression from the gzip magic bytes, not from the file extension.
//! Writers stream into a `.partial` sibling and rename on success.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;

use crate::error::{FbmError, FbmResult};
use crate::storage::file_io::partial_path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Timestamp format embedded in archive filenames
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Container compression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Gzip,
    None,
}

impl Compression {
    pub fn from_flag(compress: bool) -> Self {
        if compress {
            Self::Gzip
        } else {
            Self::None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gzip => "tar.gz",
            Self::None => "tar",
        }
    }

    /// Sniff the first bytes of `file`, leaving it rewound
    fn detect(file: &mut File) -> io::Result<Self> {
        let mut magic = [0u8; 2];
        let mut read = 0;
        while read < magic.len() {
            match file.read(&mut magic[read..])? {
                0 => break,
                n => read += n,
            }
        }
        file.rewind()?;
        Ok(if read == magic.len() && magic == GZIP_MAGIC {
            Self::Gzip
        } else {
            Self::None
        })
    }
}

/// `<bench>_<YYYYmmdd_HHMMSS>.tar.gz` (or `.tar`)
pub fn archive_file_name(bench: &str, created_at: DateTime<Utc>, compression: Compression) -> String {
    format!(
        "{}_{}.{}",
        bench,
        created_at.format(TIMESTAMP_FORMAT),
        compression.extension()
    )
}

/// Split an archive filename back into bench name, timestamp and compression
pub fn parse_archive_file_name(filename: &str) -> Option<(String, DateTime<Utc>, Compression)> {
    let (stem, compression) = if let Some(stem) = filename.strip_suffix(".tar.gz") {
        (stem, Compression::Gzip)
    } else if let Some(stem) = filename.strip_suffix(".tar") {
        (stem, Compression::None)
    } else {
        return None;
    };

    // The timestamp is the last two `_`-separated parts; bench names may contain `_`
    let mut parts = stem.rsplitn(3, '_');
    let time = parts.next()?;
    let date = parts.next()?;
    let bench = parts.next()?;
    if bench.is_empty() || date.len() != 8 || time.len() != 6 {
        return None;
    }

    let naive =
        NaiveDateTime::parse_from_str(&format!("{}_{}", date, time), TIMESTAMP_FORMAT).ok()?;
    Some((
        bench.to_string(),
        DateTime::from_naive_utc_and_offset(naive, Utc),
        compression,
    ))
}

/// Metadata about an archive found on disk
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveInfo {
    /// Archive filename
    pub filename: String,
    /// Full path to the archive
    pub path: PathBuf,
    /// Bench name parsed from the filename
    pub bench_name: String,
    /// Timestamp parsed from the filename
    pub created_at: DateTime<Utc>,
    /// Size in bytes
    pub size_bytes: u64,
    pub compression: Compression,
}

/// List archives in `dir`, newest first
///
/// Files whose names do not follow the archive naming scheme are ignored.
pub fn list_archives(dir: &Path) -> FbmResult<Vec<ArchiveInfo>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut archives = Vec::new();
    for entry in fs::read_dir(dir)
        .map_err(|e| FbmError::Io(format!("Failed to read backup directory: {}", e)))?
    {
        let entry =
            entry.map_err(|e| FbmError::Io(format!("Failed to read directory entry: {}", e)))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let filename = entry.file_name().to_string_lossy().to_string();
        let Some((bench_name, created_at, compression)) = parse_archive_file_name(&filename)
        else {
            continue;
        };
        let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
        archives.push(ArchiveInfo {
            filename,
            path,
            bench_name,
            created_at,
            size_bytes,
            compression,
        });
    }

    archives.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.filename.cmp(&b.filename))
    });
    Ok(archives)
}

/// Open an archive for reading, detecting gzip compression
pub fn open_archive(path: &Path) -> FbmResult<tar::Archive<Box<dyn Read>>> {
    let mut file =
        File::open(path).map_err(|e| FbmError::corrupt_archive(path, format!("cannot open: {}", e)))?;
    let compression = Compression::detect(&mut file)
        .map_err(|e| FbmError::corrupt_archive(path, format!("cannot read: {}", e)))?;

    let reader: Box<dyn Read> = match compression {
        Compression::Gzip => Box::new(GzDecoder::new(BufReader::new(file))),
        Compression::None => Box::new(BufReader::new(file)),
    };
    Ok(tar::Archive::new(reader))
}

/// Byte sink under the tar builder
enum Sink {
    Gzip(GzEncoder<BufWriter<File>>),
    Plain(BufWriter<File>),
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Gzip(w) => w.write(buf),
            Sink::Plain(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Gzip(w) => w.flush(),
            Sink::Plain(w) => w.flush(),
        }
    }
}

impl Sink {
    fn finish(self) -> io::Result<File> {
        let buffered = match self {
            Sink::Gzip(encoder) => encoder.finish()?,
            Sink::Plain(writer) => writer,
        };
        buffered.into_inner().map_err(|e| e.into_error())
    }
}

/// Streams entries into a new archive
///
/// Nothing appears at the final path until `finish` succeeds; `abort` (or an
/// error in `finish`) removes the partial file.
pub struct ArchiveWriter {
    builder: tar::Builder<Sink>,
    final_path: PathBuf,
    temp_path: PathBuf,
}

impl ArchiveWriter {
    /// Start writing the archive that will live at `final_path`
    pub fn create(final_path: &Path, compression: Compression) -> FbmResult<Self> {
        let temp_path = partial_path(final_path);
        let file = File::create(&temp_path).map_err(|e| {
            FbmError::Io(format!(
                "Failed to create archive {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        let writer = BufWriter::new(file);
        let sink = match compression {
            Compression::Gzip => Sink::Gzip(GzEncoder::new(writer, flate2::Compression::default())),
            Compression::None => Sink::Plain(writer),
        };

        let mut builder = tar::Builder::new(sink);
        builder.follow_symlinks(false);

        Ok(Self {
            builder,
            final_path: final_path.to_path_buf(),
            temp_path,
        })
    }

    /// Add an in-memory file
    pub fn append_bytes(&mut self, name: &Path, bytes: &[u8], mtime: u64) -> io::Result<()> {
        let mut header = tar::Header::new_gnu();
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(mtime);
        header.set_entry_type(tar::EntryType::Regular);
        self.builder.append_data(&mut header, name, bytes)
    }

    /// Add a directory entry (not its contents)
    pub fn append_dir(&mut self, name: &Path, src: &Path) -> io::Result<()> {
        self.builder.append_dir(name, src)
    }

    /// Add a regular file from an already opened handle
    pub fn append_file(&mut self, name: &Path, file: &mut File) -> io::Result<()> {
        self.builder.append_file(name, file)
    }

    /// Add a symlink as a link, not its target
    pub fn append_symlink(&mut self, name: &Path, src: &Path) -> io::Result<()> {
        self.builder.append_path_with_name(src, name)
    }

    /// Write the trailer, sync, and move the archive into place
    pub fn finish(self) -> FbmResult<PathBuf> {
        let Self {
            builder,
            final_path,
            temp_path,
        } = self;

        let result = builder
            .into_inner()
            .and_then(Sink::finish)
            .and_then(|file| file.sync_all())
            .and_then(|_| fs::rename(&temp_path, &final_path));

        match result {
            Ok(()) => Ok(final_path),
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                Err(FbmError::Io(format!(
                    "Failed to write archive {}: {}",
                    final_path.display(),
                    e
                )))
            }
        }
    }

    /// Drop the partial archive
    pub fn abort(self) {
        let temp_path = self.temp_path.clone();
        drop(self.builder);
        let _ = fs::remove_file(temp_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn entry_names(path: &Path) -> Vec<String> {
        let mut archive = open_archive(path).unwrap();
        archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_archive_file_name() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            archive_file_name("frappe-bench", ts, Compression::Gzip),
            "frappe-bench_20250304_050607.tar.gz"
        );
        assert_eq!(
            archive_file_name("frappe-bench", ts, Compression::None),
            "frappe-bench_20250304_050607.tar"
        );
    }

    #[test]
    fn test_parse_archive_file_name() {
        let (bench, ts, compression) =
            parse_archive_file_name("my_bench_20250304_050607.tar.gz").unwrap();
        assert_eq!(bench, "my_bench");
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap());
        assert_eq!(compression, Compression::Gzip);

        assert!(parse_archive_file_name("notes.txt").is_none());
        assert!(parse_archive_file_name("bench_2025_0304.tar").is_none());
        assert!(parse_archive_file_name("_20250304_050607.tar").is_none());
    }

    #[test]
    fn test_write_and_read_both_compressions() {
        let temp = TempDir::new().unwrap();
        for compression in [Compression::Gzip, Compression::None] {
            let path = temp.path().join(format!("b.{}", compression.extension()));
            let mut writer = ArchiveWriter::create(&path, compression).unwrap();
            writer
                .append_bytes(Path::new("bench_info.json"), b"{}", 0)
                .unwrap();
            writer.finish().unwrap();

            assert!(path.exists());
            assert!(!partial_path(&path).exists());
            assert_eq!(entry_names(&path), vec!["bench_info.json"]);
        }
    }

    #[test]
    fn test_detects_gzip_regardless_of_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("misnamed.tar");
        let mut writer = ArchiveWriter::create(&path, Compression::Gzip).unwrap();
        writer.append_bytes(Path::new("x"), b"1", 0).unwrap();
        writer.finish().unwrap();

        let mut file = File::open(&path).unwrap();
        assert_eq!(Compression::detect(&mut file).unwrap(), Compression::Gzip);
        assert_eq!(entry_names(&path), vec!["x"]);
    }

    #[test]
    fn test_abort_leaves_nothing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("b.tar.gz");
        let mut writer = ArchiveWriter::create(&path, Compression::Gzip).unwrap();
        writer.append_bytes(Path::new("x"), b"1", 0).unwrap();
        writer.abort();

        assert!(!path.exists());
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn test_open_missing_archive() {
        let temp = TempDir::new().unwrap();
        let err = open_archive(&temp.path().join("nope.tar.gz")).err().unwrap();
        assert!(matches!(err, FbmError::CorruptArchive { .. }));
    }

    #[test]
    fn test_list_archives_newest_first() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("bench_20250101_000000.tar.gz"), b"x").unwrap();
        fs::write(temp.path().join("bench_20250201_000000.tar"), b"xy").unwrap();
        fs::write(temp.path().join("README.md"), b"hi").unwrap();

        let archives = list_archives(temp.path()).unwrap();
        assert_eq!(archives.len(), 2);
        assert_eq!(archives[0].filename, "bench_20250201_000000.tar");
        assert_eq!(archives[0].size_bytes, 2);
        assert_eq!(archives[1].compression, Compression::Gzip);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(list_archives(&temp.path().join("none")).unwrap().is_empty());
    }
}
