use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use gifcomment::{
    cli, inject_reader, scan_reader, CommentList, GifError, MetadataCollector, Version,
};

#[derive(Parser)]
#[command(name = "gifcomment")]
#[command(about = "Extract and inject comment metadata in GIF files")]
struct Cli {
    /// Print every decoded extension block, not just comments
    #[arg(short, long)]
    all: bool,

    /// Report GIF version, file size and canvas dimensions to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Comment text to inject; repeat the flag to inject several
    #[arg(short = 'c', long = "comment", value_name = "TEXT")]
    comments: Vec<String>,

    /// Output file for the injected GIF (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Input GIF file (stdin if omitted)
    input: Option<PathBuf>,
}

fn main() {
    pretty_env_logger::init();
    let args = Cli::parse();

    if let Err(err) = run(&args) {
        eprintln!("ERROR {err:#}");
        process::exit(exit_code(&err));
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<GifError>()
        .map(cli::exit_code_for)
        .unwrap_or(cli::EXIT_IO_ERROR)
}

fn open_input(path: Option<&PathBuf>) -> anyhow::Result<Box<dyn Read>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open file '{}'", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdin())),
    }
}

fn open_output(path: Option<&PathBuf>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to open file '{}' for writing", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

fn run(args: &Cli) -> anyhow::Result<()> {
    let input = open_input(args.input.as_ref())?;

    let parser = if args.comments.is_empty() && args.output.is_none() {
        let mut collector = MetadataCollector::new();
        let parser = scan_reader(input, &mut collector)?;

        if args.all {
            for block in &collector.blocks {
                println!("{}", cli::format_block(block));
            }
        } else {
            for comment in collector.comments() {
                println!("{}", comment.text());
            }
        }
        parser
    } else {
        // -o without -c is a pass-through copy: the comment list is empty,
        // so the splice writes nothing and every byte passes through
        let comments: CommentList = args.comments.iter().cloned().collect();
        let mut out = BufWriter::new(open_output(args.output.as_ref())?);
        let parser = inject_reader(input, &mut out, comments)?;
        out.flush().context("failed to flush output")?;
        parser
    };

    if parser.stream_offset() == 0 {
        anyhow::bail!("empty input file");
    }
    if parser.version() == Version::Unknown {
        anyhow::bail!("invalid GIF file (missing signature)");
    }
    if parser.finish().is_err() {
        eprintln!("WARNING Unexpected end of file");
    }

    if args.verbose {
        eprintln!("VERBOSE GIF version: {}", parser.version());
        eprintln!("VERBOSE File size: {} bytes", parser.stream_offset());
        eprintln!("VERBOSE Canvas width: {}", parser.canvas_width());
        eprintln!("VERBOSE Canvas height: {}", parser.canvas_height());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_for(input: &std::path::Path) -> Cli {
        Cli {
            all: false,
            verbose: false,
            comments: Vec::new(),
            output: None,
            input: Some(input.to_path_buf()),
        }
    }

    fn sample_gif() -> Vec<u8> {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&[10, 0, 20, 0, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(&[0x21, 0xFE, 2, b'h', b'i', 0x00]);
        bytes.push(0x3B);
        bytes
    }

    #[test]
    fn test_missing_signature_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        io::Write::write_all(&mut file, b"GIF").unwrap();

        let err = run(&args_for(file.path())).unwrap_err();
        assert!(err.to_string().contains("missing signature"));
        assert_eq!(exit_code(&err), cli::EXIT_IO_ERROR);
    }

    #[test]
    fn test_output_without_comments_copies_input() {
        let bytes = sample_gif();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        io::Write::write_all(&mut file, &bytes).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("copy.gif");
        let mut args = args_for(file.path());
        args.output = Some(out_path.clone());

        run(&args).unwrap();
        assert_eq!(std::fs::read(&out_path).unwrap(), bytes);
    }
}
