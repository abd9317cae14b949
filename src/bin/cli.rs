//! Command-line front end for the `fsshttpd` binary.
//!
//! `chunk` prints the chunks a file is split into, `inspect` prints the
//! strategy and boundaries the factory would pick without signing anything,
//! and `roundtrip` pushes the file through object groups and the wire format
//! and back, verifying the rebuilt tree on the way.

use std::ffi::OsString;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use fsshttpb::{DataElementPackage, ExGuidGenerator, ParseError};
use fsshttpd::{
    ChunkingContext, ChunkingError, ChunkingFactory, ChunkingMethod, LeafNodeObject,
    ObjectGroupBuilder, RdcAnalysisChunking, RootNodeObjectBuilder, SimpleChunking,
    ZipChunkLayout,
};
use logging::{FlagParseError, VerbosityConfig};
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "fsshttpd", version, about = "Chunk files into FSSHTTPD node trees")]
struct Cli {
    /// Increase diagnostic verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Raise one diagnostic category, e.g. `zip2` or `verify`
    #[arg(long = "debug", value_name = "FLAG", global = true)]
    debug: Vec<String>,

    /// JSON file holding the chunking context
    #[arg(long, value_name = "FILE", global = true)]
    context: Option<PathBuf>,

    /// Negotiated cell storage minor version
    #[arg(long, value_name = "N", global = true)]
    minor_version: Option<u16>,

    /// Treat the peer as a 2010-era server
    #[arg(long, global = true)]
    legacy_server: bool,

    /// Skip verification of rebuilt trees
    #[arg(long, global = true)]
    no_verify: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the chunks of a file
    Chunk {
        /// File to chunk
        file: PathBuf,
        /// Chunking strategy: rdc, simple or zip
        #[arg(long)]
        method: Option<ChunkingMethod>,
    },
    /// Chunk, serialize, parse, rebuild and verify a file
    Roundtrip {
        /// File to round-trip
        file: PathBuf,
        /// Chunking strategy: rdc, simple or zip
        #[arg(long)]
        method: Option<ChunkingMethod>,
    },
    /// Print the strategy and boundaries chosen for a file
    Inspect {
        /// File to inspect
        file: PathBuf,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {path}: {source}", path = .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid chunking context {path}: {source}", path = .path.display())]
    Context {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    DebugFlag(#[from] FlagParseError),

    #[error(transparent)]
    Chunking(#[from] ChunkingError),

    #[error("failed to parse data element package: {0}")]
    Package(#[from] ParseError),

    #[error("rebuilt content differs from the input")]
    ContentMismatch,

    #[error(transparent)]
    Output(#[from] io::Error),
}

/// Parses `args`, runs the selected command, and maps the outcome onto an
/// exit status. Usage errors exit with status 2, command failures with 1.
pub fn run_with<I, Out, Err>(args: I, stdout: &mut Out, stderr: &mut Err) -> ExitCode
where
    I: IntoIterator,
    I::Item: Into<OsString> + Clone,
    Out: Write,
    Err: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let rendered = error.render().to_string();
            return if error.use_stderr() {
                let _ = stderr.write_all(rendered.as_bytes());
                ExitCode::from(2)
            } else {
                let _ = stdout.write_all(rendered.as_bytes());
                ExitCode::SUCCESS
            };
        }
    };

    match run(&cli, stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "fsshttpd: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run<Out: Write>(cli: &Cli, stdout: &mut Out) -> Result<(), CliError> {
    let mut verbosity = VerbosityConfig::from_verbose_level(cli.verbose);
    for flag in &cli.debug {
        verbosity.apply_debug_flag(flag)?;
    }
    // An embedding process may already have installed a subscriber.
    let _ = logging::init_tracing(&verbosity);

    let ctx = load_context(cli)?;
    match &cli.command {
        Command::Chunk { file, method } => chunk(&ctx, file, *method, stdout),
        Command::Roundtrip { file, method } => roundtrip(&ctx, file, *method, stdout),
        Command::Inspect { file } => inspect(&ctx, file, stdout),
    }
}

fn load_context(cli: &Cli) -> Result<ChunkingContext, CliError> {
    let mut ctx = match &cli.context {
        Some(path) => {
            let text = read_file(path)?;
            serde_json::from_slice(&text).map_err(|source| CliError::Context {
                path: path.clone(),
                source,
            })?
        }
        None => ChunkingContext::default(),
    };
    if let Some(minor_version) = cli.minor_version {
        ctx = ctx.with_minor_version(minor_version);
    }
    if cli.legacy_server {
        ctx = ctx.with_legacy_server(true);
    }
    Ok(ctx.with_verification(!cli.no_verify))
}

fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn chunk<Out: Write>(
    ctx: &ChunkingContext,
    file: &Path,
    method: Option<ChunkingMethod>,
    stdout: &mut Out,
) -> Result<(), CliError> {
    let content = read_file(file)?;
    let method = method.unwrap_or_else(|| ChunkingFactory::detect_method(&content));
    let strategy = ChunkingFactory::create_with_method(method, ctx)?;
    let leaves = strategy.chunk(&content, &mut ExGuidGenerator::new())?;

    writeln!(stdout, "method: {method}")?;
    writeln!(stdout, "size: {}", content.len())?;
    writeln!(stdout, "chunks: {}", leaves.len())?;
    let mut offset = 0u64;
    for (index, leaf) in leaves.iter().enumerate() {
        writeln!(
            stdout,
            "{index}\t{offset}\t{}\t{}",
            leaf.data_size(),
            hex(leaf.signature().as_bytes())
        )?;
        offset += leaf.data_size();
    }
    Ok(())
}

fn roundtrip<Out: Write>(
    ctx: &ChunkingContext,
    file: &Path,
    method: Option<ChunkingMethod>,
    stdout: &mut Out,
) -> Result<(), CliError> {
    let content = read_file(file)?;
    let method = method.unwrap_or_else(|| ChunkingFactory::detect_method(&content));
    let mut ids = ExGuidGenerator::new();

    // Building must not pick its own strategy for verification: the method
    // may have been forced on the command line.
    let build_ctx = ctx.clone().with_verification(false);
    let builder = RootNodeObjectBuilder::new(&build_ctx);
    let root = builder.build_from_content_with_method(method, &content, &mut ids)?;
    let package = ObjectGroupBuilder::to_package(&root, &mut ids)?;
    let wire = package.to_bytes();
    tracing::debug!(elements = package.elements.len(), bytes = wire.len(), "serialized package");

    let parsed = DataElementPackage::parse(&wire)?;
    let rebuilt = builder.build(&parsed.elements, root.ex_guid())?;
    if ctx.verify_on_build {
        rebuilt.check_sizes()?;
        ChunkingFactory::create_with_method(method, ctx)?.analyze(&rebuilt, ctx)?;
    }
    if rebuilt.content() != content {
        return Err(CliError::ContentMismatch);
    }

    writeln!(
        stdout,
        "roundtrip ok: method {method}, {} bytes, {} chunks, {} data elements, {} wire bytes{}",
        content.len(),
        count_chunks(rebuilt.children()),
        parsed.elements.len(),
        wire.len(),
        if ctx.verify_on_build { ", verified" } else { "" }
    )?;
    Ok(())
}

fn inspect<Out: Write>(
    ctx: &ChunkingContext,
    file: &Path,
    stdout: &mut Out,
) -> Result<(), CliError> {
    let content = read_file(file)?;
    let method = ChunkingFactory::detect_method(&content);
    writeln!(stdout, "method: {method}")?;
    writeln!(stdout, "size: {}", content.len())?;
    writeln!(stdout, "minor version: {}", ctx.minor_version)?;
    if ChunkingFactory::is_editors_table(&content) {
        writeln!(stdout, "editors table: yes")?;
    }

    match method {
        ChunkingMethod::ZipAlgorithm => {
            if let Some(layout) = ZipChunkLayout::plan(&content)? {
                for span in layout.spans() {
                    writeln!(
                        stdout,
                        "{}\t{}\t{}",
                        span_label(&span.kind),
                        span.range.start,
                        span.range.len()
                    )?;
                }
            }
        }
        ChunkingMethod::RdcAnalysis => {
            let rdc = RdcAnalysisChunking::new(ctx.rdc)?;
            for range in rdc.chunk_ranges(&content)? {
                writeln!(stdout, "chunk\t{}\t{}", range.start, range.len())?;
            }
        }
        ChunkingMethod::SimpleAlgorithm => {
            for range in SimpleChunking::chunk_ranges(content.len()) {
                writeln!(stdout, "chunk\t{}\t{}", range.start, range.len())?;
            }
        }
    }
    Ok(())
}

fn span_label(kind: &fsshttpd::chunking::ZipSpanKind) -> &'static str {
    use fsshttpd::chunking::ZipSpanKind;
    match kind {
        ZipSpanKind::Merged(_) => "merged",
        ZipSpanKind::Header(_) => "header",
        ZipSpanKind::Payload(_) => "payload",
        ZipSpanKind::SubChunk => "sub-chunk",
        ZipSpanKind::Final => "final",
    }
}

fn count_chunks(leaves: &[LeafNodeObject]) -> usize {
    leaves
        .iter()
        .map(|leaf| leaf.children().map_or(1, count_chunks))
        .sum()
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::run_with;
    use std::process::ExitCode;

    fn run(args: &[&str]) -> (ExitCode, String, String) {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let exit = run_with(args.iter().copied(), &mut stdout, &mut stderr);
        (
            exit,
            String::from_utf8(stdout).expect("stdout is UTF-8"),
            String::from_utf8(stderr).expect("stderr is UTF-8"),
        )
    }

    #[test]
    fn version_flag_writes_to_stdout() {
        let (exit, stdout, stderr) = run(&["fsshttpd", "--version"]);
        assert_eq!(exit, ExitCode::SUCCESS);
        assert!(stdout.contains("fsshttpd"));
        assert!(stderr.is_empty());
    }

    #[test]
    fn unknown_method_is_a_usage_error() {
        let (exit, stdout, stderr) = run(&["fsshttpd", "chunk", "x", "--method", "fastcdc"]);
        assert_eq!(exit, ExitCode::from(2));
        assert!(stdout.is_empty());
        assert!(stderr.contains("fastcdc"));
    }

    #[test]
    fn missing_file_is_reported() {
        let (exit, _, stderr) = run(&["fsshttpd", "inspect", "/definitely/not/here.bin"]);
        assert_eq!(exit, ExitCode::FAILURE);
        assert!(stderr.contains("failed to read"));
    }

    #[test]
    fn signature_hex_is_lowercase() {
        assert_eq!(super::hex(&[0x00, 0xAB, 0x10]), "00ab10");
    }
}
