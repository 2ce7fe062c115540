use std::{io, path::PathBuf, process};

use anyhow::Result;
use clap::{error::ErrorKind, CommandFactory, Parser};
use log::{error, info};

use compile_modules::{
    compile_stdio, CommandCompiler, ImportMap, Invocation, Mode, OutputFormat, TreeCompilation,
};

#[derive(Debug, Parser)]
#[command(name = "compile-modules", version)]
#[command(about = "Compile ES6 modules into AMD, CJS, YUI or globals")]
#[command(after_help = "Using files:\n  \
    compile-modules INPUT --to DIR [--infer-name] [--type TYPE] [--imports PATH:GLOBAL]\n\n\
    Using stdio:\n  \
    compile-modules --stdio [--type TYPE] [--imports PATH:GLOBAL] [--module-name MOD]")]
struct Cli {
    /// Files or directories to compile
    #[arg()]
    inputs: Vec<PathBuf>,

    /// The type of output (one of "amd", "yui", "cjs", or "globals")
    #[arg(long = "type", default_value = "amd")]
    format: OutputFormat,

    /// A directory in which to write the resulting files
    #[arg(long)]
    to: Option<PathBuf>,

    /// A list of path:global pairs, comma separated (e.g. jquery:$,ember:Ember)
    #[arg(long)]
    imports: Option<ImportMap>,

    /// Generate a json file containing the dependency graph
    #[arg(long)]
    graph: bool,

    /// Automatically generate names for AMD and YUI modules
    #[arg(long)]
    infer_name: bool,

    /// The name of the outputted module
    #[arg(short, long)]
    module_name: Option<String>,

    /// Use stdin and stdout to process a file
    #[arg(short, long)]
    stdio: bool,

    /// When the type is `globals`, the name of the global to export into
    #[arg(long)]
    global: Option<String>,

    /// Number of files to compile in parallel
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Program that compiles a single module
    #[arg(long)]
    compiler: String,

    /// Extra argument passed to the compiler program, may be repeated
    #[arg(long = "compiler-arg", allow_hyphen_values = true)]
    compiler_args: Vec<String>,
}

impl Cli {
    fn invocation(&self) -> Invocation {
        Invocation {
            inputs: self.inputs.clone(),
            stdio: self.stdio,
            to: self.to.clone(),
            format: self.format,
            imports: self.imports.clone(),
            graph: self.graph,
            infer_name: self.infer_name,
            module_name: self.module_name.clone(),
            global: self.global.clone(),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mode = match cli.invocation().validate() {
        Ok(mode) => mode,
        Err(err) => Cli::command()
            .error(ErrorKind::ArgumentConflict, err)
            .exit(),
    };
    let compiler = CommandCompiler::new(cli.compiler).args(cli.compiler_args);

    match mode {
        Mode::Stdio { options } => {
            compile_stdio(&compiler, &options, io::stdin().lock(), io::stdout().lock())?;
        }
        Mode::Files {
            roots,
            destination,
            options,
        } => {
            let mut compilation = TreeCompilation::new(&compiler, options, destination);
            if let Some(jobs) = cli.jobs {
                compilation = compilation.jobs(jobs);
            }
            match compilation.run(&roots) {
                Ok(summary) => {
                    info!("compiled {} files", summary.files);
                    if let Some(graph) = summary.graph {
                        info!("dependency graph: {:?}", graph);
                    }
                }
                Err(err) if err.is_directory_read() => {
                    error!("{:#}", anyhow::Error::from(err));
                    process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(())
}
