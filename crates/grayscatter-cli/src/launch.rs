//! Process group start-up.
//!
//! Picks a communicator backend, runs the pipeline on every rank and hands
//! back the coordinator's outcome.

use std::thread;
use std::time::Duration;

use grayscatter_core::pipeline::{self, Job, PipelineOptions, RunReport};
use grayscatter_core::{Error, LocalGroup, SingleProcess};

/// Communicator backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Ranks on threads of this process
    #[default]
    Local,
    /// Ranks are processes started by `mpiexec`
    Mpi,
}

/// How to start the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchPlan {
    pub backend: Backend,
    /// Group size for [`Backend::Local`]; ignored for MPI
    pub processes: usize,
    /// Collective timeout for [`Backend::Local`]
    pub timeout: Option<Duration>,
}

/// Group size from the command line, else the config, else the number of
/// available cores.
pub fn resolve_process_count(cli: Option<usize>, config: Option<usize>) -> usize {
    cli.or(config).unwrap_or_else(|| {
        thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    })
}

/// Run `job` on the planned group.
///
/// Returns the report on the coordinator. Under MPI every other rank gets
/// `Ok(None)`.
pub fn launch(
    plan: &LaunchPlan,
    job: &Job,
    options: &PipelineOptions,
) -> Result<Option<RunReport>, Error> {
    match plan.backend {
        Backend::Local => launch_local(plan, job, options),
        Backend::Mpi => launch_mpi(job, options),
    }
}

fn launch_local(
    plan: &LaunchPlan,
    job: &Job,
    options: &PipelineOptions,
) -> Result<Option<RunReport>, Error> {
    if plan.processes <= 1 {
        log::debug!("running as a single process");
        return pipeline::run(SingleProcess, job, options);
    }

    let group = LocalGroup::new(plan.processes)?.with_timeout(plan.timeout);
    log::debug!("starting {} in-process ranks", group.size());
    let mut results = group
        .run(|comm| pipeline::run(comm, job, options))?
        .into_iter();

    let root = results
        .next()
        .ok_or(Error::Argument("empty process group".to_string()))?;

    for (rank, result) in results.enumerate() {
        match result {
            Ok(_) | Err(Error::Aborted(_)) => {}
            Err(err) => log::warn!("rank {} failed: {}", rank + 1, err),
        }
    }
    root
}

#[cfg(feature = "mpi")]
fn launch_mpi(job: &Job, options: &PipelineOptions) -> Result<Option<RunReport>, Error> {
    let comm = grayscatter_core::MpiComm::initialize()?;
    pipeline::run(comm, job, options)
}

#[cfg(not(feature = "mpi"))]
fn launch_mpi(_job: &Job, _options: &PipelineOptions) -> Result<Option<RunReport>, Error> {
    Err(Error::Argument(
        "this build has no MPI support; rebuild with `--features mpi`".to_string(),
    ))
}
