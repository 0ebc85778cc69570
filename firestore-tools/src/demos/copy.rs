//! `copy-file` command: concatenate inputs into one output, like `cat`
//!
//! `-` stands for stdin as an input and for stdout as the output.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

const CHUNK_SIZE: usize = 1024;

/// Copy `input` to `output` in fixed-size chunks, flushing after each one.
/// Returns the number of bytes copied.
pub fn copy_chunks(input: &mut impl Read, output: &mut impl Write) -> io::Result<u64> {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        output.write_all(&buf[..n])?;
        output.flush()?;
        total += n as u64;
    }

    Ok(total)
}

fn open_output(path: &str) -> Result<Box<dyn Write>> {
    if path == "-" {
        return Ok(Box::new(io::stdout().lock()));
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create output file {}", path))?;
    Ok(Box::new(BufWriter::new(file)))
}

/// Copy every input, in order, into `output`.
pub fn run(inputs: &[String], output: &str) -> Result<u64> {
    // A missing input aborts before the output is created
    for input in inputs.iter().filter(|i| i.as_str() != "-") {
        if !Path::new(input).is_file() {
            return Err(anyhow::anyhow!("Input file {} does not exist", input));
        }
    }

    let mut out = open_output(output)?;
    let mut total = 0;

    for input in inputs {
        let copied = if input == "-" {
            copy_chunks(&mut io::stdin().lock(), &mut out)
        } else {
            let mut file =
                File::open(input).with_context(|| format!("Failed to open input file {}", input))?;
            copy_chunks(&mut file, &mut out)
        };
        total += copied.with_context(|| format!("Failed to copy {}", input))?;
    }

    out.flush()?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_chunks_large_input() {
        let data: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        let mut output = Vec::new();

        let copied = copy_chunks(&mut data.as_slice(), &mut output).unwrap();
        assert_eq!(copied, 5000);
        assert_eq!(output, data);
    }

    #[test]
    fn test_run_concatenates_files() {
        let dir = tempfile::tempdir().unwrap();
        let foo = dir.path().join("foo.txt");
        let bar = dir.path().join("bar.txt");
        let out = dir.path().join("out.txt");
        std::fs::write(&foo, "foo\n").unwrap();
        std::fs::write(&bar, "bar\n").unwrap();

        let inputs = vec![
            foo.to_string_lossy().to_string(),
            bar.to_string_lossy().to_string(),
        ];
        let copied = run(&inputs, &out.to_string_lossy()).unwrap();

        assert_eq!(copied, 8);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "foo\nbar\n");
    }

    #[test]
    fn test_run_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let inputs = vec![dir.path().join("missing").to_string_lossy().to_string()];

        let err = run(&inputs, &out.to_string_lossy()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(!out.exists());
    }
}
