use clap::{Parser, Subcommand};
use miette::Result;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use ur_clang::{ClangNode, ClangParser, ParseOptions};
use ur_config::UrConfig;

#[derive(Parser)]
#[command(name = "ur")]
#[command(author, version, about = "Convert C sources into Rust")]
struct Cli {
    /// More logging (-v info, -vv debug, -vvv trace); RUST_LOG also applies
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (default: ./ur.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a C file into one Rust file per output buffer
    Convert {
        /// C source file (overrides [input] path)
        file: Option<PathBuf>,

        /// Output directory (overrides [output] directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Preprocessor definition, NAME or NAME=VALUE (repeatable)
        #[arg(short = 'D', long = "define")]
        defines: Vec<String>,

        /// System include directory (repeatable)
        #[arg(short = 'I', long = "include")]
        includes: Vec<String>,

        /// Print buffers to stdout instead of writing files
        #[arg(long)]
        stdout: bool,
    },

    /// Parse a C file and report diagnostics without converting
    Check {
        /// C source files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the parsed AST of a C file
    Dump {
        /// C source file to dump
        file: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn parse_options(config: &UrConfig) -> ParseOptions {
    ParseOptions {
        defines: config.input.defines.clone(),
        include_paths: config.input.include_paths.clone(),
        extra_args: Vec::new(),
    }
}

/// The explicit config, else `./ur.toml`, else defaults.
fn load_config(path: Option<&Path>) -> Result<UrConfig> {
    match path {
        Some(path) => Ok(UrConfig::from_file(path)?),
        None => {
            let default = Path::new("ur.toml");
            if default.exists() {
                Ok(UrConfig::from_file(default)?)
            } else {
                Ok(UrConfig::default())
            }
        }
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Convert {
            file,
            output,
            defines,
            includes,
            stdout,
        } => {
            if let Some(output) = output {
                config.output.directory = output;
            }
            config.input.defines.extend(defines);
            config.input.include_paths.extend(includes);

            let params = config.to_parameters(file.as_deref())?;
            // Without any placement configured, everything goes to one buffer named after the input
            if config.placement.default_buffer.is_none() && config.placement.rules.is_empty() {
                let stem = params
                    .input_path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "out".to_string());
                info!("no [placement] configured, writing everything to {}", stem);
                config.placement.default_buffer = Some(stem);
            }
            let params = params.with_policy(config.policy());

            let buffers = ur_convert::convert(params)?;
            if buffers.is_empty() {
                eprintln!("Nothing to write: no declaration was placed");
            }

            if stdout {
                for (buffer, text) in &buffers {
                    println!("// ---- {} ----", buffer);
                    print!("{}", text);
                }
                return Ok(());
            }

            std::fs::create_dir_all(&config.output.directory).map_err(|e| {
                miette::miette!(
                    "Failed to create {}: {}",
                    config.output.directory.display(),
                    e
                )
            })?;
            for (buffer, text) in &buffers {
                let path = config.output_path(buffer);
                std::fs::write(&path, text)
                    .map_err(|e| miette::miette!("Failed to write {}: {}", path.display(), e))?;
                println!("Wrote {}", path.display());
            }
        }

        Commands::Check { files } => {
            let parser = ClangParser::new()?;
            let options = parse_options(&config);

            for file in &files {
                match parser.parse_file(file, &options) {
                    Ok(_) => println!("{}: OK", file.display()),
                    Err(e) => {
                        eprintln!("{}: Error", file.display());
                        return Err(e.into());
                    }
                }
            }
        }

        Commands::Dump { file } => {
            let parser = ClangParser::new()?;
            let options = parse_options(&config);
            let ast = parser.parse_file(&file, &options)?;
            dump(&ast.translation_unit, 0);
        }
    }

    Ok(())
}

/// Print user code (system headers elided) as an indented tree.
fn dump(node: &ClangNode, depth: usize) {
    if node.in_system_header {
        return;
    }
    let mut line = format!("{}{:?}", "  ".repeat(depth), node.kind);
    if !node.spelling.is_empty() {
        line.push_str(&format!(" {:?}", node.spelling));
    }
    if !node.ty.is_void() {
        line.push_str(&format!(" : {}", node.ty.to_rust_type_str()));
    }
    println!("{}", line);
    for child in &node.children {
        dump(child, depth + 1);
    }
}
