//! `blz`: command-line front end for the Blazer library.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use blazer::{compress_stream, decompress_stream, decompress_stream_encrypt_full, default_flags, FileInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    None,
    Block,
    Stream,
    StreamHigh,
}

#[derive(Debug, Parser)]
#[command(name = "blz", about = "Compress or decompress a Blazer container")]
struct Args {
    /// Decompress instead of compress.
    #[arg(short = 'd', long = "decompress")]
    decompress: bool,

    /// Overwrite the output file if it already exists.
    #[arg(short = 'f', long = "force")]
    force: bool,

    /// Read input from stdin instead of a file.
    #[arg(long = "stdin")]
    use_stdin: bool,

    /// Write output to stdout instead of a file.
    #[arg(long = "stdout")]
    use_stdout: bool,

    /// Password for encrypted containers.
    #[arg(short = 'p', long = "password")]
    password: Option<String>,

    /// Treat the input as an opaque blob: skip the file-info record.
    #[arg(long = "blobonly")]
    blob_only: bool,

    /// Do not store the original filename in the file-info record.
    #[arg(long = "nofilename")]
    no_filename: bool,

    /// Wrap the whole container in an outer stream cipher instead of
    /// encrypting blocks individually.
    #[arg(long = "encryptfull")]
    encrypt_full: bool,

    /// Compression mode. Only `block` is implemented in this build.
    #[arg(long = "mode", value_enum, default_value = "block")]
    mode: Mode,

    /// Input file. Ignored when `--stdin` is given.
    input: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("blz: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), blazer::BlazerError> {
    if args.mode != Mode::Block {
        return Err(blazer::BlazerError::Usage(format!(
            "--mode {:?} is not implemented in this build; only block mode is supported",
            args.mode
        )));
    }

    let input: Box<dyn Read> = if args.use_stdin || args.input.is_none() {
        Box::new(io::stdin())
    } else {
        Box::new(File::open(args.input.as_ref().unwrap())?)
    };

    let output: Box<dyn Write> = if args.use_stdout {
        Box::new(io::stdout())
    } else {
        let out_path = output_path(&args)?;
        if out_path.exists() && !args.force {
            return Err(blazer::BlazerError::Usage(format!(
                "{} already exists (use -f to overwrite)",
                out_path.display()
            )));
        }
        Box::new(File::create(out_path)?)
    };

    let password = args.password.as_deref().map(str::as_bytes);

    if args.decompress {
        if args.encrypt_full {
            let password = password.ok_or_else(|| {
                blazer::BlazerError::Usage(
                    "--encryptfull decompression requires -p/--password".into(),
                )
            })?;
            decompress_stream_encrypt_full(input, output, password)?;
        } else {
            decompress_stream(input, output, password)?;
        }
    } else {
        let mut flags = if args.blob_only {
            // --blobonly: no header/footer/CRC, and the container uses the
            // full 16 MiB block size rather than the default 64 KiB.
            blazer::Flags::new(15, blazer::flags::ALGORITHM_BLOCK)
                .expect("exponent 15 and algorithm 1 are valid")
        } else {
            default_flags()
        };
        if password.is_some() {
            if args.encrypt_full {
                flags.set_encrypt_full(true);
            } else {
                flags.set_encrypt_inner(true);
            }
        }

        let file_info = if args.blob_only {
            None
        } else {
            let name = if args.no_filename {
                None
            } else {
                args.input.as_ref().and_then(|p| p.file_name()).map(|n| n.to_string_lossy().into_owned())
            };
            Some(FileInfo {
                name,
                mtime: None,
                mode: None,
            })
        };
        if file_info.is_some() {
            flags.set_file_info(true);
        }

        if file_info.is_some() {
            let mut stream = blazer::CompressionStream::with_file_info(output, flags, password, file_info)?;
            copy_into(input, &mut stream)?;
            stream.close()?;
        } else {
            compress_stream(input, output, flags, password)?;
        }
    }

    Ok(())
}

fn copy_into<R: Read, W: Write>(
    mut input: R,
    stream: &mut blazer::CompressionStream<W>,
) -> io::Result<()> {
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        stream.write(&buf[..n])?;
    }
    Ok(())
}

fn output_path(args: &Args) -> Result<PathBuf, blazer::BlazerError> {
    let input = args
        .input
        .as_ref()
        .ok_or_else(|| blazer::BlazerError::Usage("an input file or --stdout is required".into()))?;
    if args.decompress {
        if input.extension().is_some_and(|ext| ext == "blz") {
            Ok(input.with_extension(""))
        } else {
            let mut name = input.clone().into_os_string();
            name.push(".unpacked");
            Ok(PathBuf::from(name))
        }
    } else {
        let mut name = input.clone().into_os_string();
        name.push(".blz");
        Ok(PathBuf::from(name))
    }
}
