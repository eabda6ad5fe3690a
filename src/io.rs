use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, IntoInnerError, Stdout, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use itertools::Itertools;

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn is_gz(path: &Path) -> bool {
    path.to_string_lossy().ends_with(".gz")
}

/// Open an input source for reading structures.
/// `-` reads stdin; a path ending in `.gz` is decompressed on the fly.
pub fn open_input<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead>> {
    let p = path.as_ref();
    if is_stdio(p) {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }

    let f = File::open(p)?;
    if is_gz(p) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(f))))
    } else {
        Ok(Box::new(BufReader::new(f)))
    }
}

/// Destination for distances: stdout, a plain file or a gzip file.
///
/// Call [`Output::finish`] once everything is written. For gzip output this
/// writes the trailer, and any late I/O error surfaces there instead of
/// being lost on drop.
pub enum Output {
    Stdout(BufWriter<Stdout>),
    File(BufWriter<File>),
    Gzip(BufWriter<GzEncoder<File>>),
}

impl Output {
    /// Flush everything and close the stream.
    pub fn finish(self) -> io::Result<()> {
        match self {
            Output::Stdout(mut w) => w.flush(),
            Output::File(w) => w.into_inner().map_err(IntoInnerError::into_error)?.sync_all(),
            Output::Gzip(w) => {
                let enc = w.into_inner().map_err(IntoInnerError::into_error)?;
                enc.finish()?.sync_all()
            }
        }
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout(w) => w.write(buf),
            Output::File(w) => w.write(buf),
            Output::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout(w) => w.flush(),
            Output::File(w) => w.flush(),
            Output::Gzip(w) => w.flush(),
        }
    }
}

/// Open an output sink for distances.
/// `-` writes to stdout; a path ending in `.gz` is gzip-compressed.
pub fn open_output<P: AsRef<Path>>(path: P) -> io::Result<Output> {
    let p = path.as_ref();
    if is_stdio(p) {
        return Ok(Output::Stdout(BufWriter::new(io::stdout())));
    }

    let f = File::create(p)?;
    if is_gz(p) {
        let enc = GzEncoder::new(f, Compression::default());
        Ok(Output::Gzip(BufWriter::new(enc)))
    } else {
        Ok(Output::File(BufWriter::new(f)))
    }
}

/// Read one structure per line.
///
/// Line endings (`\n`, `\r\n`) are stripped. Reading stops at the first empty
/// line or at end of input, so a blank line terminates the batch.
pub fn read_structures<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    let mut structures = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            break;
        }
        structures.push(line.to_string());
    }
    Ok(structures)
}

/// Write one row of distances, space separated.
pub fn write_row<W: Write + ?Sized>(out: &mut W, row: &[usize]) -> io::Result<()> {
    writeln!(out, "{}", row.iter().join(" "))
}

/// Write a matrix row by row.
pub fn write_matrix<W: Write + ?Sized>(out: &mut W, mat: &[Vec<usize>]) -> io::Result<()> {
    for row in mat {
        write_row(out, row)?;
    }
    Ok(())
}

/// Write one distance per line.
pub fn write_column<W: Write + ?Sized>(out: &mut W, values: &[usize]) -> io::Result<()> {
    for v in values {
        writeln!(out, "{v}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    #[test]
    fn test_read_structures_stops_at_blank_line() {
        let input = "((..))\r\n....\n\n(())\n";
        let structures = read_structures(Cursor::new(input)).unwrap();
        assert_eq!(structures, vec!["((..))", "...."]);
    }

    #[test]
    fn test_read_structures_without_trailing_newline() {
        let structures = read_structures(Cursor::new(".\n()")).unwrap();
        assert_eq!(structures, vec![".", "()"]);
        assert!(read_structures(Cursor::new("")).unwrap().is_empty());
    }

    #[test]
    fn test_writers() {
        let mut buf = Vec::new();
        write_matrix(&mut buf, &[vec![0, 3], vec![3, 0]]).unwrap();
        write_column(&mut buf, &[1, 2]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "0 3\n3 0\n1\n2\n");
    }

    #[test]
    fn test_gz_round_trip_through_files() {
        let dir = std::env::temp_dir().join(format!("rna-tree-distance-io-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("structures.txt.gz");

        let mut out = open_output(&path).unwrap();
        assert!(matches!(out, Output::Gzip(_)));
        writeln!(out, "(.)").unwrap();
        writeln!(out, "...").unwrap();
        out.finish().unwrap();

        // Compressed, with the trailer in place: the last four bytes hold
        // the uncompressed length.
        let mut raw = Vec::new();
        File::open(&path).unwrap().read_to_end(&mut raw).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);
        let size = u32::from_le_bytes(raw[raw.len() - 4..].try_into().unwrap());
        assert_eq!(size as usize, "(.)\n...\n".len());

        let structures = read_structures(open_input(&path).unwrap()).unwrap();
        assert_eq!(structures, vec!["(.)", "..."]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_plain_output_is_complete_after_finish() {
        let dir = std::env::temp_dir().join(format!("rna-tree-distance-plain-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("distances.txt");

        let mut out = open_output(&path).unwrap();
        assert!(matches!(out, Output::File(_)));
        write_matrix(&mut out, &[vec![0, 1], vec![1, 0]]).unwrap();
        out.finish().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0 1\n1 0\n");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
