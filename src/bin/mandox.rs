//! Mandox CLI - mdoc/man manual page to HTML compiler

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use mandox::{
    core::man2html::{convert_page, man_to_html_with_diagnostics, M2HOptions, Stylesheet},
    utils::{
        charset::decode_source,
        error::{CliDiagnostic, DiagnosticSeverity},
        files::{FileResolver, StdFileResolver},
        loss::LossReport,
    },
    ConversionOutput, ConversionResult,
};
#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, IsTerminal, Read, Write};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "mandox")]
#[command(version)]
#[command(about = "Mandox - mdoc/man manual page to HTML compiler", long_about = None)]
struct Cli {
    /// Input file path (reads from stdin if neither a file nor --name is given)
    input_file: Option<String>,

    /// Look the page up by name in the manual search path
    #[arg(short, long, conflicts_with = "input_file")]
    name: Option<String>,

    /// Section to look the page up in
    #[arg(short, long, requires = "name")]
    section: Option<String>,

    /// Manual search path, colon separated
    #[arg(short = 'M', long, env = "MANPATH")]
    manpath: Option<String>,

    /// Output file path (writes to stdout if not provided)
    #[arg(short, long)]
    output: Option<String>,

    /// Inline the default stylesheet into the page
    #[arg(long, conflicts_with = "css")]
    embed_css: bool,

    /// Stylesheet href to link from the page
    #[arg(long)]
    css: Option<String>,

    /// Omit x-source line attributes
    #[arg(long)]
    no_source_markers: bool,

    /// Write only the page body, without the HTML document shell
    #[arg(long)]
    body_only: bool,

    /// Write a loss report JSON to this path
    #[arg(long)]
    loss_log: Option<String>,

    /// Exit with an error when the conversion produced warnings
    #[arg(long)]
    strict: bool,

    /// Verbose logging (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[cfg(feature = "cli")]
impl Cli {
    fn options(&self) -> M2HOptions {
        let mut options = M2HOptions::default();
        if self.embed_css {
            options.stylesheet = Stylesheet::Embedded;
        } else if let Some(href) = &self.css {
            options.stylesheet = Stylesheet::Link(href.clone());
        }
        options.source_markers = !self.no_source_markers;
        options.full_page = !self.body_only;
        options
    }

    /// Search roots: `-M`/`MANPATH`, then the input file's directory and,
    /// for a file inside `manN/`, the directory above it.
    fn resolver(&self) -> StdFileResolver {
        let mut roots: Vec<PathBuf> = match &self.manpath {
            Some(path) => StdFileResolver::from_search_path(path).roots().to_vec(),
            None => Vec::new(),
        };
        if let Some(parent) = self
            .input_file
            .as_deref()
            .and_then(|input| Path::new(input).parent())
        {
            let parent = if parent.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                parent.to_path_buf()
            };
            let in_section_dir = parent
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("man"));
            if in_section_dir {
                if let Some(root) = parent.parent() {
                    roots.push(root.to_path_buf());
                }
            }
            roots.push(parent);
        }
        if roots.is_empty() {
            roots.push(PathBuf::from("."));
        }
        StdFileResolver::new(roots)
    }
}

#[cfg(feature = "cli")]
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

#[cfg(feature = "cli")]
fn convert(cli: &Cli, resolver: &dyn FileResolver) -> ConversionResult<ConversionOutput> {
    let options = cli.options();
    if let Some(name) = &cli.name {
        return convert_page(name, cli.section.as_deref(), resolver, &options);
    }
    let bytes = match &cli.input_file {
        Some(path) => fs::read(path)?,
        None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            buffer
        }
    };
    let input = decode_source(&bytes);
    man_to_html_with_diagnostics(&input, &options, resolver)
}

#[cfg(feature = "cli")]
fn print_diagnostics(result: &ConversionOutput) {
    let color = io::stderr().is_terminal();
    for warning in &result.warnings {
        let diag: CliDiagnostic = warning.clone().into();
        if diag.severity == DiagnosticSeverity::Info && !log::log_enabled!(log::Level::Debug) {
            continue;
        }
        if color {
            eprintln!("{}{}\x1b[0m", diag.color_code(), diag);
        } else {
            eprintln!("{}", diag);
        }
    }
}

#[cfg(feature = "cli")]
fn main() -> io::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let resolver = cli.resolver();
    let result = match convert(&cli, &resolver) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("mandox: {}", err);
            std::process::exit(1);
        }
    };

    print_diagnostics(&result);

    if let Some(path) = cli.loss_log.as_ref() {
        let source = cli.input_file.clone().or_else(|| cli.name.clone());
        let report = LossReport::from_warnings(source, &result.warnings);
        let serialized = serde_json::to_string_pretty(&report)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        fs::write(path, serialized)?;
    }

    match cli.output.as_ref() {
        Some(path) => {
            fs::write(path, &result.output)?;
            eprintln!("✓ Output written to: {}", path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(result.output.as_bytes())?;
            stdout.flush()?;
        }
    }

    if cli.strict && result.has_warnings() {
        eprintln!(
            "mandox: {} warning(s) in strict mode",
            result.warnings.len()
        );
        std::process::exit(2);
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install mandox --features cli");
    eprintln!("  mandox [OPTIONS] [INPUT_FILE]");
}
