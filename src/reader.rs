//! Sequence source reader
//!
//! Decodes a plain or gzip-compressed byte stream into FASTQ records, one
//! record at a time. Nothing is staged on disk: the decoder reads straight
//! from the source, and dropping the stream releases both.

use crate::error::{QcError, Result};
use flate2::read::MultiGzDecoder;
use log::debug;
use needletail::FastxReader;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Phred+33 offset used by Sanger / Illumina 1.8+ quality strings
pub const PHRED_OFFSET: u8 = 33;

/// Highest printable quality character (`~`, Phred 93)
pub const PHRED_MAX_CHAR: u8 = b'~';

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];

/// Magic numbers of formats we recognise but do not decode
const UNSUPPORTED_MAGIC: &[(&[u8], &str)] = &[
    (b"BZh", "bzip2"),
    (&[0xfd, b'7', b'z', b'X', b'Z', 0x00], "xz"),
    (&[0x28, 0xb5, 0x2f, 0xfd], "zstd"),
];

/// Compression applied to an input stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    None,
    Gzip,
}

impl Compression {
    /// Parse a compression name as given on the command line
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" | "plain" => Ok(Compression::None),
            "gz" | "gzip" => Ok(Compression::Gzip),
            other => Err(QcError::UnsupportedCompression(other.to_string())),
        }
    }

    /// Infer compression from a file name (`reads.fq.gz` is gzip).
    ///
    /// The extension is only a hint; record structure is still checked
    /// when the stream is parsed.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gz") => Compression::Gzip,
            _ => Compression::None,
        }
    }
}

/// A decoded FASTQ record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqRecord {
    /// Sequence identifier (without '@' prefix)
    pub id: String,
    /// Nucleotide sequence as read from the file
    pub sequence: Vec<u8>,
    /// Phred scores, one per base (offset already removed)
    pub quality: Vec<u8>,
}

impl FastqRecord {
    pub fn new(id: String, sequence: Vec<u8>, quality: Vec<u8>) -> Self {
        Self {
            id,
            sequence,
            quality,
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

fn unsupported_format(head: &[u8]) -> Option<&'static str> {
    UNSUPPORTED_MAGIC
        .iter()
        .find(|(magic, _)| head.starts_with(magic))
        .map(|&(_, name)| name)
}

/// Wrap `reader` in a buffered, decompressing reader.
///
/// Fails with [`QcError::UnsupportedCompression`] before anything is
/// decoded when the stream starts with the magic number of a format we
/// cannot read, and with [`QcError::Format`] when a stream flagged as gzip
/// does not carry the gzip magic.
pub fn open_source<'a, R: Read + Send + 'a>(
    reader: R,
    compression: Compression,
) -> Result<Box<dyn BufRead + Send + 'a>> {
    let mut reader = BufReader::new(reader);

    let (is_empty, is_gzip, unsupported) = {
        let head = reader.fill_buf()?;
        (
            head.is_empty(),
            head.starts_with(GZIP_MAGIC),
            unsupported_format(head),
        )
    };

    if let Some(name) = unsupported {
        return Err(QcError::UnsupportedCompression(name.to_string()));
    }

    match compression {
        Compression::None => Ok(Box::new(reader)),
        // An empty upload has no gzip header but also no records
        Compression::Gzip if is_empty => Ok(Box::new(reader)),
        Compression::Gzip if !is_gzip => Err(QcError::format(
            1,
            "stream flagged as gzip does not start with the gzip magic bytes",
        )),
        Compression::Gzip => {
            debug!("decoding gzip stream");
            Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
        }
    }
}

/// Streaming FASTQ parser over needletail.
///
/// Decompression and magic-byte checks happen in [`open_source`]; the
/// decoded bytes are handed to needletail, which validates record
/// structure. Error lines point at the first line of the offending record.
/// After the first error the stream is exhausted.
pub struct FastqStream<'a> {
    reader: Option<Box<dyn FastxReader + 'a>>,
    pending: Option<QcError>,
    line_number: usize,
}

impl<'a> FastqStream<'a> {
    /// Create a FASTQ stream over a possibly compressed byte stream
    pub fn new<R: Read + Send + 'a>(reader: R, compression: Compression) -> Result<Self> {
        let mut source = open_source(reader, compression)?;

        let mut stream = Self {
            reader: None,
            pending: None,
            line_number: 0,
        };

        // needletail rejects empty input; for us it is zero records
        if source.fill_buf()?.is_empty() {
            return Ok(stream);
        }

        match needletail::parse_fastx_reader(source) {
            Ok(reader) => stream.reader = Some(reader),
            Err(e) => stream.pending = Some(QcError::format(1, e.to_string())),
        }
        Ok(stream)
    }

    /// Number of lines consumed so far
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    fn read_record(&mut self) -> Option<Result<FastqRecord>> {
        let start_line = self.line_number + 1;
        let reader = self.reader.as_mut()?;

        let record = match reader.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(QcError::format(start_line, e.to_string()))),
        };

        let Some(raw_quality) = record.qual() else {
            return Some(Err(QcError::format(
                start_line,
                "expected a FASTQ record, found FASTA",
            )));
        };

        let quality_line = start_line + 3;
        let mut quality = Vec::with_capacity(raw_quality.len());
        for &q in raw_quality {
            if !(PHRED_OFFSET..=PHRED_MAX_CHAR).contains(&q) {
                return Some(Err(QcError::format(
                    quality_line,
                    format!("quality character 0x{:02x} outside Phred+33 range", q),
                )));
            }
            quality.push(q - PHRED_OFFSET);
        }

        let id = String::from_utf8_lossy(record.id()).trim_end().to_string();
        let sequence = record.seq().into_owned();

        self.line_number = quality_line;
        Some(Ok(FastqRecord::new(id, sequence, quality)))
    }
}

impl FastqStream<'static> {
    /// Open a FASTQ file, inferring compression from its name
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let compression = Compression::from_path(&path);
        debug!(
            "opening {} ({:?})",
            path.as_ref().display(),
            compression
        );
        let file = File::open(path)?;
        Self::new(file, compression)
    }
}

impl Iterator for FastqStream<'_> {
    type Item = Result<FastqRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(e) = self.pending.take() {
            return Some(Err(e));
        }

        let item = self.read_record();
        if !matches!(item, Some(Ok(_))) {
            self.reader = None;
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use std::io::{Cursor, Write};

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_parse_valid_fastq() {
        let data = b"@SEQ_ID desc\nGATTACA\n+\n!!!!!I#\n";
        let mut stream = FastqStream::new(&data[..], Compression::None).unwrap();

        let record = stream.next().unwrap().unwrap();
        assert_eq!(record.id, "SEQ_ID desc");
        assert_eq!(record.sequence, b"GATTACA");
        assert_eq!(record.quality, vec![0, 0, 0, 0, 0, 40, 2]);
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_parse_multiple_records_with_crlf() {
        let data = b"@SEQ1\r\nGAT\r\n+SEQ1\r\nIII\r\n@SEQ2\nTACA\n+\n!!!!\n";
        let stream = FastqStream::new(&data[..], Compression::None).unwrap();

        let records: Vec<_> = stream.collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "SEQ1");
        assert_eq!(records[0].sequence, b"GAT");
        assert_eq!(records[1].id, "SEQ2");
        assert_eq!(records[1].len(), 4);
        assert_eq!(records[0].quality, vec![40, 40, 40]);
    }

    #[test]
    fn test_invalid_header() {
        let data = b"SEQ_ID\nGATTACA\n+\n!!!!!!!\n";
        let mut stream = FastqStream::new(&data[..], Compression::None).unwrap();

        let result = stream.next().unwrap();
        assert!(matches!(result, Err(QcError::Format { line: 1, .. })));
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_length_mismatch() {
        let data = b"@r1\nACGT\n+\nIIII\n@r2\nGATTACA\n+\n!!!!\n";
        let mut stream = FastqStream::new(&data[..], Compression::None).unwrap();

        assert!(stream.next().unwrap().is_ok());
        assert_eq!(stream.line_number(), 4);
        let result = stream.next().unwrap();
        assert!(matches!(result, Err(QcError::Format { line: 5, .. })));
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_truncated_record() {
        let data = b"@r1\nGATTACA\n+\n!!!!!!!\n@r2\nACGT\n";
        let stream = FastqStream::new(&data[..], Compression::None).unwrap();

        let results: Vec<_> = stream.collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(QcError::Format { .. })));
    }

    #[test]
    fn test_missing_separator() {
        let data = b"@r1\nACGT\nIIII\nIIII\n";
        let mut stream = FastqStream::new(&data[..], Compression::None).unwrap();
        assert!(matches!(
            stream.next().unwrap(),
            Err(QcError::Format { line: 1, .. })
        ));
    }

    #[test]
    fn test_quality_below_offset() {
        let data = b"@r1\nACGT\n+\nII I\n";
        let mut stream = FastqStream::new(&data[..], Compression::None).unwrap();
        assert!(matches!(stream.next().unwrap(), Err(QcError::Format { line: 4, .. })));
    }

    #[test]
    fn test_quality_above_printable_range() {
        let data = b"@r1\nACGT\n+\nIIII\n@r2\nACGT\n+\nII\x7fI\n";
        let mut stream = FastqStream::new(&data[..], Compression::None).unwrap();

        assert_eq!(stream.next().unwrap().unwrap().quality, vec![40; 4]);
        assert!(matches!(stream.next().unwrap(), Err(QcError::Format { line: 8, .. })));
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_highest_printable_quality() {
        let data = b"@r1\nAC\n+\n~!\n";
        let mut stream = FastqStream::new(&data[..], Compression::None).unwrap();
        assert_eq!(stream.next().unwrap().unwrap().quality, vec![93, 0]);
    }

    #[test]
    fn test_fasta_input_is_rejected() {
        let data = b">seq1\nACGT\n";
        let mut stream = FastqStream::new(&data[..], Compression::None).unwrap();
        assert!(matches!(stream.next().unwrap(), Err(QcError::Format { line: 1, .. })));
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_gzip_stream() {
        let compressed = gzip(b"@r1\nACGT\n+\nIIII\n@r2\nNNNN\n+\n####\n");
        let stream = FastqStream::new(Cursor::new(compressed), Compression::Gzip).unwrap();

        let records: Vec<_> = stream.collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].sequence, b"NNNN");
        assert_eq!(records[1].quality, vec![2, 2, 2, 2]);
    }

    #[test]
    fn test_multi_member_gzip() {
        let mut compressed = gzip(b"@r1\nACGT\n+\nIIII\n");
        compressed.extend(gzip(b"@r2\nTTTT\n+\nIIII\n"));
        let stream = FastqStream::new(Cursor::new(compressed), Compression::Gzip).unwrap();
        assert_eq!(stream.count(), 2);
    }

    #[test]
    fn test_gzip_flag_without_magic() {
        let result = FastqStream::new(Cursor::new(b"@r1\nA\n+\nI\n".to_vec()), Compression::Gzip);
        assert!(matches!(result, Err(QcError::Format { .. })));
    }

    #[test]
    fn test_empty_stream() {
        for compression in [Compression::None, Compression::Gzip] {
            let stream = FastqStream::new(Cursor::new(Vec::new()), compression).unwrap();
            assert_eq!(stream.count(), 0);
        }
    }

    #[test]
    fn test_unsupported_magic() {
        let bzip2 = b"BZh91AY&SY".to_vec();
        let result = FastqStream::new(Cursor::new(bzip2), Compression::Gzip);
        assert!(matches!(result, Err(QcError::UnsupportedCompression(name)) if name == "bzip2"));

        let zstd = vec![0x28, 0xb5, 0x2f, 0xfd, 0x00];
        let result = FastqStream::new(Cursor::new(zstd), Compression::None);
        assert!(matches!(result, Err(QcError::UnsupportedCompression(name)) if name == "zstd"));
    }

    #[test]
    fn test_compression_names() {
        assert_eq!(Compression::from_name("gzip").unwrap(), Compression::Gzip);
        assert_eq!(Compression::from_name("GZ").unwrap(), Compression::Gzip);
        assert_eq!(Compression::from_name("none").unwrap(), Compression::None);
        assert!(matches!(
            Compression::from_name("bz2"),
            Err(QcError::UnsupportedCompression(_))
        ));
    }

    #[test]
    fn test_compression_from_path() {
        assert_eq!(Compression::from_path("reads.fastq.gz"), Compression::Gzip);
        assert_eq!(Compression::from_path("reads.fq.GZ"), Compression::Gzip);
        assert_eq!(Compression::from_path("reads.fq"), Compression::None);
        assert_eq!(Compression::from_path("reads"), Compression::None);
    }
}
