//! Driving a whole run: a directory tree into a destination tree, or one
//! stream into another.
//!
//! In file mode, discovery produces a finite list of tasks up front. Compile
//! workers on a rayon pool consume it and report back over a channel to one
//! aggregator thread, which alone owns the completion barrier and the
//! dependency graph:
//!
//! ```text
//! discover(roots) ──► [FileTask; n] ──► rayon workers ──┐
//!                                                       │ Event::Compiled
//!                                                       │ Event::Finished
//!                                                       ▼
//!                      aggregator: CompletionBarrier(n) + GraphAccumulator
//!                                                       │ released
//!                                                       ▼
//!                                            destination/graph.json
//! ```

use std::{
    io::{Read, Write},
    path::{Path, PathBuf},
    thread,
};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, info, trace, warn};
use rayon::prelude::*;

use crate::{
    barrier::{CompletionBarrier, Release},
    compiler::{Compile, CompiledModule},
    directory::ensure_dir,
    graph::GraphAccumulator,
    io::{create_output, open_input, Endpoint},
    options::CompileOptions,
    stream::{compile_stream, Input, Output},
    walker::{discover, FileTask},
    Error,
};

/// Events a worker may have in flight before it blocks on the aggregator.
const EVENT_BACKLOG: usize = 128;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of files compiled.
    pub files: usize,
    /// Where the dependency graph was written, when enabled.
    pub graph: Option<PathBuf>,
}

#[derive(Debug)]
enum Event {
    Compiled {
        node_name: String,
        requires: Vec<String>,
    },
    Finished {
        output: PathBuf,
    },
}

#[derive(Debug)]
struct Aggregate {
    graph: Option<PathBuf>,
    remaining: usize,
}

/// Compiles every file under a set of input roots into a destination tree
/// that mirrors their layout.
#[derive(Debug)]
pub struct TreeCompilation<'c, C: ?Sized> {
    compiler: &'c C,
    options: CompileOptions,
    destination: PathBuf,
    jobs: Option<usize>,
}

impl<'c, C> TreeCompilation<'c, C>
where
    C: Compile + ?Sized,
{
    pub fn new<P: Into<PathBuf>>(compiler: &'c C, options: CompileOptions, destination: P) -> Self {
        Self {
            compiler,
            options,
            destination: destination.into(),
            jobs: None,
        }
    }

    /// Number of files compiled in parallel. Defaults to rayon's choice.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    pub fn run<I>(&self, roots: I) -> Result<RunSummary, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        let tasks = discover(roots, &self.destination, &self.options)?;
        let expected = tasks.len();
        let barrier = CompletionBarrier::new(expected);
        let accumulator = GraphAccumulator::new(self.options.graph);

        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|index| format!("compile-{}", index));
        if let Some(jobs) = self.jobs {
            builder = builder.num_threads(jobs);
        }
        let pool = builder.build()?;

        info!("compiling {} files into {:?}", expected, self.destination);
        let (sender, receiver) = bounded(EVENT_BACKLOG);
        let destination = self.destination.as_path();

        thread::scope(|scope| -> Result<RunSummary, Error> {
            let aggregator =
                scope.spawn(move || aggregate(receiver, barrier, accumulator, destination));

            let compiled = pool.install(|| {
                tasks
                    .into_par_iter()
                    .try_for_each_with(sender, |events, task| self.compile_file(task, events))
            });

            // Errors raised by the aggregator explain why a worker's send
            // failed, so they take precedence.
            let aggregate = aggregator.join().map_err(|_| Error::Aggregator)??;
            compiled?;
            if aggregate.remaining != 0 {
                return Err(Error::Incomplete {
                    remaining: aggregate.remaining,
                    expected,
                });
            }
            Ok(RunSummary {
                files: expected,
                graph: aggregate.graph,
            })
        })
    }

    fn compile_file(&self, task: FileTask, events: &mut Sender<Event>) -> Result<(), Error> {
        debug!("compiling {:?} to {:?}", task.input, task.output);
        if let Some(parent) = task.output.parent() {
            ensure_dir(parent)?;
        }
        let input = open_input(&task.input)?;
        let output = create_output(&task.output)?;

        let graph = self.options.graph;
        let node_name = &task.node_name;
        compile_stream(
            self.compiler,
            Input::new(input, Endpoint::File(task.input.clone())),
            Output::new(output, Endpoint::File(task.output.clone())),
            task.module_name.as_deref(),
            &self.options,
            |compiled| {
                if graph {
                    events
                        .send(Event::Compiled {
                            node_name: node_name.clone(),
                            requires: compiled.dependencies.clone(),
                        })
                        .map_err(|_| Error::Aggregator)?;
                }
                Ok(())
            },
        )?;

        events
            .send(Event::Finished {
                output: task.output,
            })
            .map_err(|_| Error::Aggregator)
    }
}

fn aggregate(
    receiver: Receiver<Event>,
    barrier: CompletionBarrier,
    mut accumulator: GraphAccumulator,
    destination: &Path,
) -> Result<Aggregate, Error> {
    let mut graph = None;
    if barrier.is_released() {
        debug!("nothing to compile");
        graph = accumulator.flush(destination)?;
    }

    for event in receiver {
        match event {
            Event::Compiled {
                node_name,
                requires,
            } => accumulator.append_node(&node_name, &requires)?,
            Event::Finished { output } => match barrier.decrement()? {
                Release::Pending(remaining) => {
                    trace!("wrote {:?}, {} files remaining", output, remaining)
                }
                Release::Released => {
                    debug!("wrote {:?}, last file of the run", output);
                    graph = accumulator.flush(destination)?;
                }
            },
        }
    }

    Ok(Aggregate {
        graph,
        remaining: barrier.remaining(),
    })
}

/// Compile a single module from `input` to `output` with no discovery, no
/// barrier and no dependency graph.
pub fn compile_stdio<C, R, W>(
    compiler: &C,
    options: &CompileOptions,
    input: R,
    output: W,
) -> Result<CompiledModule, Error>
where
    C: Compile + ?Sized,
    R: Read,
    W: Write,
{
    if options.graph {
        warn!("--graph has no effect when compiling from standard input");
    }
    compile_stream(
        compiler,
        Input::new(input, Endpoint::Stdin),
        Output::new(output, Endpoint::Stdout),
        options.module_name.as_deref(),
        options,
        |_| Ok(()),
    )
}
