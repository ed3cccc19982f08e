use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use rand::{seq::index, Rng};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("file '{}' does not exist or cannot be read: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("file '{}' has {available} data lines, too short for {requested} samples", .path.display())]
    TooShort {
        path: PathBuf,
        available: usize,
        requested: usize,
    },
    #[error("i/o error while sampling: {0}")]
    Io(#[from] io::Error),
}

/// Copies the header line of `path` plus `samples` distinct data lines, picked
/// uniformly at random and kept in file order, into `out`.
///
/// The file is read twice: once to count lines, once to copy the chosen ones.
/// Returns the number of data lines written.
pub fn sample_file<W: Write, R: Rng + ?Sized>(
    path: &Path,
    samples: usize,
    rng: &mut R,
    mut out: W,
) -> Result<usize, SampleError> {
    let open = || {
        File::open(path)
            .map(BufReader::new)
            .map_err(|source| SampleError::Open {
                path: path.to_path_buf(),
                source,
            })
    };

    let total_lines = count_lines(open()?)?;
    let available = total_lines.saturating_sub(1);
    if available < samples {
        return Err(SampleError::TooShort {
            path: path.to_path_buf(),
            available,
            requested: samples,
        });
    }

    // Positions are data-line offsets; line 0 is the header.
    let mut chosen = index::sample(rng, available, samples).into_vec();
    chosen.sort_unstable();

    let mut reader = open()?;
    let mut line = Vec::new();
    let mut next = chosen.iter().copied().peekable();
    let mut line_no = 0usize;

    while reader.read_until(b'\n', &mut line)? > 0 {
        let wanted = if line_no == 0 {
            true
        } else if next.peek() == Some(&(line_no - 1)) {
            next.next();
            true
        } else {
            false
        };

        if wanted {
            out.write_all(&line)?;
            if !line.ends_with(b"\n") {
                out.write_all(b"\n")?;
            }
        }

        if line_no > 0 && next.peek().is_none() {
            break;
        }
        line.clear();
        line_no += 1;
    }
    out.flush()?;

    Ok(samples)
}

fn count_lines<R: BufRead>(mut reader: R) -> io::Result<usize> {
    let mut count = 0usize;
    let mut line = Vec::new();
    while reader.read_until(b'\n', &mut line)? > 0 {
        count += 1;
        line.clear();
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use tempfile::NamedTempFile;

    fn dataset(lines: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "product_id,reordered").expect("write header");
        for i in 0..lines {
            writeln!(file, "{i},{}", i % 2).expect("write row");
        }
        file
    }

    #[test]
    fn keeps_header_and_file_order() {
        let file = dataset(50);
        let mut rng = StdRng::seed_from_u64(7);
        let mut out = Vec::new();

        let written = sample_file(file.path(), 10, &mut rng, &mut out).expect("sample");
        assert_eq!(written, 10);

        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], "product_id,reordered");

        let ids: Vec<usize> = lines[1..]
            .iter()
            .map(|line| line.split(',').next().expect("id").parse().expect("numeric"))
            .collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(ids.iter().all(|id| *id < 50));
    }

    #[test]
    fn same_seed_same_sample() {
        let file = dataset(30);
        let mut first = Vec::new();
        let mut second = Vec::new();

        sample_file(file.path(), 5, &mut StdRng::seed_from_u64(1), &mut first).expect("first");
        sample_file(file.path(), 5, &mut StdRng::seed_from_u64(1), &mut second).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn sampling_every_line_copies_the_file() {
        let file = dataset(4);
        let mut out = Vec::new();

        sample_file(file.path(), 4, &mut StdRng::seed_from_u64(3), &mut out).expect("sample");
        let expected = std::fs::read(file.path()).expect("read dataset");
        assert_eq!(out, expected);
    }

    #[test]
    fn too_short_file_is_rejected() {
        let file = dataset(3);

        let err = sample_file(file.path(), 4, &mut StdRng::seed_from_u64(0), Vec::<u8>::new())
            .expect_err("not enough lines");
        assert!(matches!(
            err,
            SampleError::TooShort {
                available: 3,
                requested: 4,
                ..
            }
        ));
    }

    #[test]
    fn zero_samples_prints_header_only() {
        let file = dataset(10);
        let mut out = Vec::new();

        let written =
            sample_file(file.path(), 0, &mut StdRng::seed_from_u64(5), &mut out).expect("sample");
        assert_eq!(written, 0);
        assert_eq!(out, b"product_id,reordered\n".to_vec());
    }

    #[test]
    fn empty_file_yields_nothing_or_too_short() {
        let file = NamedTempFile::new().expect("temp file");

        let mut out = Vec::new();
        let written =
            sample_file(file.path(), 0, &mut StdRng::seed_from_u64(0), &mut out).expect("sample");
        assert_eq!(written, 0);
        assert!(out.is_empty());

        let err = sample_file(file.path(), 1, &mut StdRng::seed_from_u64(0), Vec::<u8>::new())
            .expect_err("no data lines");
        assert!(matches!(
            err,
            SampleError::TooShort {
                available: 0,
                requested: 1,
                ..
            }
        ));
    }

    #[test]
    fn missing_file_is_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = sample_file(
            &dir.path().join("absent.csv"),
            1,
            &mut StdRng::seed_from_u64(0),
            Vec::<u8>::new(),
        )
        .expect_err("file missing");

        assert!(matches!(err, SampleError::Open { .. }));
    }
}
