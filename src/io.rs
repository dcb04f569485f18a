use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::StreamError;
use crate::points::PointSet;

/// A source of dense f32 points, consumed chunk by chunk.
pub trait PointStream {
    /// Fill `dest` with up to `num` points of `dim` coordinates each,
    /// returning how many points were read. Fewer than `num` points are
    /// returned only when the stream is exhausted; anything else is an
    /// error.
    fn read(&mut self, dest: &mut [f32], dim: usize, num: usize) -> Result<usize, StreamError>;

    /// True once the stream has been fully consumed
    fn eof(&self) -> bool;
}

/// Synthetic stream of `n` points with coordinates uniform in `[0, 1)`,
/// drawn from a dedicated deterministic RNG.
pub struct SyntheticStream {
    remaining: usize,
    rng: ChaCha8Rng,
}

impl SyntheticStream {
    pub fn new(n: usize, seed: u64) -> Self {
        Self {
            remaining: n,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl PointStream for SyntheticStream {
    fn read(&mut self, dest: &mut [f32], dim: usize, num: usize) -> Result<usize, StreamError> {
        let take = num.min(self.remaining);
        for v in dest[..take * dim].iter_mut() {
            *v = self.rng.gen::<f32>();
        }
        self.remaining -= take;
        Ok(take)
    }

    fn eof(&self) -> bool {
        self.remaining == 0
    }
}

/// Stream of raw little-endian f32 records, `dim` floats per point, no
/// header or separators. A record cut off before end of file is treated as a
/// truncated input.
#[derive(Debug)]
pub struct FileStream {
    reader: BufReader<File>,
    path: PathBuf,
    eof: bool,
}

impl FileStream {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StreamError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| StreamError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            reader: BufReader::new(file),
            path,
            eof: false,
        })
    }

    /// Read as much of one record as the file still holds.
    fn fill_record(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        let mut filled = 0;
        while filled < buf.len() {
            let got = self
                .reader
                .read(&mut buf[filled..])
                .map_err(|source| StreamError::Read {
                    path: self.path.clone(),
                    source,
                })?;
            if got == 0 {
                break;
            }
            filled += got;
        }
        Ok(filled)
    }
}

impl PointStream for FileStream {
    fn read(&mut self, dest: &mut [f32], dim: usize, num: usize) -> Result<usize, StreamError> {
        let mut record = vec![0u8; dim * std::mem::size_of::<f32>()];
        let mut points_read = 0;
        for slot in 0..num {
            let filled = self.fill_record(&mut record)?;
            if filled == 0 {
                self.eof = true;
                break;
            }
            if filled < record.len() {
                return Err(StreamError::TruncatedInput);
            }
            for (d, bytes) in record.chunks_exact(4).enumerate() {
                dest[slot * dim + d] = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            }
            points_read += 1;
        }
        Ok(points_read)
    }

    fn eof(&self) -> bool {
        self.eof
    }
}

/// Dump the final centers: for every point that appears as an assignment
/// target, its stream ID, its weight (legacy `%` marker), and its
/// coordinates, separated by a blank line.
pub(crate) fn write_centers<W: Write>(centers: &PointSet, w: &mut W) -> std::io::Result<()> {
    let n = centers.len();
    let mut is_median = vec![false; n];
    for i in 0..n {
        is_median[centers.assignment(i)] = true;
    }
    for i in 0..n {
        if !is_median[i] {
            continue;
        }
        writeln!(w, "{}", centers.id(i))?;
        writeln!(w, "%{}", centers.weight(i))?;
        for c in centers.point(i).iter() {
            write!(w, "{} ", c)?;
        }
        writeln!(w)?;
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_synthetic_stream_is_deterministic() {
        let mut a = SyntheticStream::new(10, 1);
        let mut b = SyntheticStream::new(10, 1);
        let mut buf_a = vec![0.0f32; 30];
        let mut buf_b = vec![0.0f32; 30];

        assert_eq!(a.read(&mut buf_a, 3, 10).unwrap(), 10);
        assert_eq!(b.read(&mut buf_b, 3, 10).unwrap(), 10);
        assert_eq!(buf_a, buf_b);
        assert!(a.eof());
        assert!(buf_a.iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn test_synthetic_stream_partial_last_chunk() {
        let mut stream = SyntheticStream::new(7, 1);
        let mut buf = vec![0.0f32; 10];

        assert_eq!(stream.read(&mut buf, 2, 5).unwrap(), 5);
        assert!(!stream.eof());
        assert_eq!(stream.read(&mut buf, 2, 5).unwrap(), 2);
        assert!(stream.eof());
    }

    #[test]
    fn test_file_stream_round_trip() {
        let values: Vec<f32> = vec![1.5, -2.25, 0.0, 42.0, 7.125, -0.5];
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for v in &values {
            file.write_all(&v.to_le_bytes()).unwrap();
        }
        file.flush().unwrap();

        let mut stream = FileStream::open(file.path()).unwrap();
        let mut buf = vec![0.0f32; 6];
        assert_eq!(stream.read(&mut buf, 2, 3).unwrap(), 3);
        assert_eq!(buf, values);
        assert!(!stream.eof());
        assert_eq!(stream.read(&mut buf, 2, 3).unwrap(), 0);
        assert!(stream.eof());
    }

    #[test]
    fn test_file_stream_detects_truncation() {
        // one full 2-float record plus 3 stray bytes
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&1.0f32.to_le_bytes()).unwrap();
        file.write_all(&2.0f32.to_le_bytes()).unwrap();
        file.write_all(&[0xde, 0xad, 0xbe]).unwrap();
        file.flush().unwrap();

        let mut stream = FileStream::open(file.path()).unwrap();
        let mut buf = vec![0.0f32; 8];
        let result = stream.read(&mut buf, 2, 4);
        assert!(matches!(result, Err(StreamError::TruncatedInput)));
    }

    #[test]
    fn test_open_missing_file_reports_path() {
        let err = FileStream::open("/definitely/not/here.bin").unwrap_err();
        match err {
            StreamError::Read { path, .. } => {
                assert_eq!(path, PathBuf::from("/definitely/not/here.bin"));
            }
            other => panic!("expected Read error, got {other:?}"),
        }
    }

    #[test]
    fn test_write_centers_format() {
        let coords = ndarray::array![[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let mut centers = PointSet::from_coords(coords, vec![3.0, 1.0, 2.0]);
        centers.ids = vec![40, 41, 42];
        centers.assign = vec![0, 0, 2];

        let mut out = Vec::new();
        write_centers(&centers, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "40\n%3\n1 2 \n\n42\n%2\n5 6 \n\n");
    }
}
