use crate::{convert::PlistFormat, output_panel::OutputPanel, text_buffer::TextBuffer};
use env_logger::Env;
use log::{debug, info, LevelFilter};
use snafu::{Backtrace, ErrorCompat, ResultExt, Snafu};
use std::{
    env, io,
    path::{Path, PathBuf},
    process,
};
use structopt::StructOpt;

mod boilerplate;
mod commands;
mod convert;
mod file;
mod output_panel;
mod snippet;
mod syntax;
mod text_buffer;

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("{}", source))]
    CommandError { source: commands::Error },
    #[snafu(display("{}", source))]
    FileError { source: file::Error },
    #[snafu(display("{}", source))]
    OutputPanelError { source: output_panel::Error },
    #[snafu(display("{}", source))]
    TextBufferError { source: text_buffer::Error },
    #[snafu(display("File already exists: {}", filename.display()))]
    Exists {
        filename: PathBuf,
        backtrace: Backtrace,
    },
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, StructOpt)]
#[structopt(name = "syndef", about = env!("CARGO_PKG_DESCRIPTION"))]
struct Opt {
    /// Log more (-v: info, -vv: debug); RUST_LOG is used otherwise
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Writes the boilerplate of a new JSON syntax definition
    New {
        /// Output file (default: stdout)
        #[structopt(short, long, parse(from_os_str))]
        output: Option<PathBuf>,
        /// Keep snippet tab stops instead of their default text
        #[structopt(long)]
        raw: bool,
    },
    /// Fills an empty (or missing) file with the boilerplate of a new syntax definition
    NewFromBuffer {
        #[structopt(parse(from_os_str))]
        file: PathBuf,
        /// Keep snippet tab stops instead of their default text
        #[structopt(long)]
        raw: bool,
    },
    /// Builds a .tmLanguage property list from a .JSON-tmLanguage file
    Build {
        #[structopt(parse(from_os_str))]
        file: PathBuf,
        /// Property list format: xml or binary
        #[structopt(long, default_value = "xml")]
        format: PlistFormat,
    },
}

fn save(buffer: &mut TextBuffer) -> Result<()> {
    if !buffer.is_dirty() {
        return Ok(());
    }
    let bytes = buffer.save().context(TextBufferError)?;

    let status = buffer.status();
    info!("saved {} lines as {}", status.lines, status.syntax.filetype);
    if let Some(filename) = status.filename {
        println!("{} bytes written to {}", bytes, filename.display());
    }
    Ok(())
}

fn new(output: Option<&Path>, raw: bool) -> Result<bool> {
    let default_dir = output
        .and_then(Path::parent)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .or_else(|| env::current_dir().ok());
    let mut buffer = commands::new_syntax_def(default_dir, raw);
    debug!(
        "new {} buffer in {:?}",
        buffer.syntax().filetype,
        buffer.default_dir()
    );

    match output {
        Some(filename) => {
            if filename.exists() {
                return Exists { filename }.fail();
            }
            buffer.set_filename(Some(filename.to_path_buf()));
            save(&mut buffer)?;
        }
        None => println!("{}", buffer.contents()),
    }
    Ok(true)
}

fn new_from_buffer(filename: &Path, raw: bool) -> Result<bool> {
    let mut buffer = if filename.exists() {
        TextBuffer::from_file(filename).context(FileError)?
    } else {
        let mut buffer = TextBuffer::new();
        buffer.set_filename(Some(filename.to_path_buf()));
        buffer
    };

    let default_dir = filename.parent().map(Path::to_path_buf);
    if !commands::new_syntax_def_from_buffer(&mut buffer, default_dir, raw) {
        eprintln!("{} is not empty; nothing inserted", filename.display());
        return Ok(true);
    }
    save(&mut buffer)?;
    Ok(true)
}

fn build(filename: &Path, panel: &mut OutputPanel, format: PlistFormat) -> Result<bool> {
    let res = commands::build(filename, panel, format).context(CommandError)?;
    for loc in panel.results() {
        eprintln!("{}:{}:{}", loc.file.display(), loc.line, loc.column);
    }
    Ok(res.map_or(false, |res| res.is_success()))
}

fn run(opt: Opt) -> Result<bool> {
    let mut panel = OutputPanel::new("syndef", Box::new(io::stdout())).context(OutputPanelError)?;
    info!("created output panel {}", panel.name());

    match opt.command {
        Command::New { output, raw } => new(output.as_deref(), raw),
        Command::NewFromBuffer { file, raw } => new_from_buffer(&file, raw),
        Command::Build { file, format } => build(&file, &mut panel, format),
    }
}

fn init_logger(verbose: u8) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Info);
        }
        _ => {
            builder.filter_level(LevelFilter::Debug);
        }
    }
    builder.init();
}

fn main() {
    let opt = Opt::from_args();
    init_logger(opt.verbose);

    match run(opt) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("An error occurred: {}", e);
            if let Some(backtrace) = ErrorCompat::backtrace(&e) {
                eprintln!("{}", backtrace);
            }
            process::exit(1);
        }
    }
}
