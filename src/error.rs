use crate::{
    barrier::BarrierError, compiler::CompileError, graph::GraphError, io::Endpoint,
    io::StreamError, walker::WalkError,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("Error compiling {endpoint}")]
    Compile {
        #[source]
        source: CompileError,
        endpoint: Endpoint,
    },

    #[error("Error recording the dependency graph")]
    Graph(#[from] GraphError),

    #[error("Error tracking completed files")]
    Barrier(#[from] BarrierError),

    #[error("Error starting the compile worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("The completion aggregator stopped before the run finished")]
    Aggregator,

    #[error("Run finished with {remaining} of {expected} files never reported complete")]
    Incomplete { remaining: usize, expected: usize },
}

impl Error {
    /// Listing a directory failed. The command line reports this and exits
    /// with status 1 rather than unwinding with an error chain.
    pub fn is_directory_read(&self) -> bool {
        matches!(self, Error::Walk(err) if err.is_directory_read())
    }
}
