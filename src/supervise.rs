use crate::{config::Tool, corpus::Benchmark};
use anyhow::Context;
use log::{debug, warn};
use nix::{
    sys::signal::{self, Signal},
    unistd::Pid,
};
use std::{
    io::{self, Read},
    os::unix::process::CommandExt,
    process::{Child, Command, ExitStatus, Stdio, exit},
    sync::Mutex,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Pids of all currently live children, so an operator interrupt can reap
/// every outstanding process before the harness exits.
static LIVE_PIDS: Mutex<Vec<u32>> = Mutex::new(Vec::new());

fn register(pid: u32) {
    LIVE_PIDS.lock().unwrap().push(pid);
}

fn unregister(pid: u32) {
    LIVE_PIDS.lock().unwrap().retain(|p| *p != pid);
}

// Each tool runs in its own process group (pgid == pid), so this takes the
// whole tree down, not just the immediate child.
fn kill(pid: u32) {
    let _ = signal::killpg(Pid::from_raw(pid as i32), Signal::SIGKILL);
}

/// Install a Ctrl-C handler that kills every registered child and exits
/// with the conventional interrupt status.
pub fn install_interrupt_handler() {
    let _ = ctrlc::set_handler(|| {
        let pids: Vec<u32> = LIVE_PIDS.lock().unwrap().drain(..).collect();
        for pid in pids {
            kill(pid);
        }
        exit(124);
    });
}

/// How one tool's process ended, fixed by the supervisor before any output
/// classification happens.
#[derive(Debug)]
pub enum RunStatus {
    /// Still running at the cohort deadline; forcibly terminated.
    Timeout,
    /// Exited with a non-zero status.
    Failure(ExitStatus),
    /// Exited cleanly; carries the fully captured combined output.
    Finished(String),
}

struct ToolProcess {
    child: Child,
    output: JoinHandle<String>,
}

fn spawn_tool(tool: &Tool, benchmark: &Benchmark) -> anyhow::Result<ToolProcess> {
    let argv = tool.argv(&benchmark.path);
    let Some((program, args)) = argv.split_first() else {
        anyhow::bail!("tool {} has an empty command", tool.name);
    };
    // One pipe carries both stdout and stderr, in arrival order. The
    // dedicated reader thread keeps draining it so a chatty child can
    // never wedge on a full pipe.
    let (mut reader, writer) = io::pipe()?;
    let mut cmd = Command::new(program);
    cmd.args(args)
        .process_group(0)
        .stdin(Stdio::null())
        .stdout(writer.try_clone()?)
        .stderr(writer);
    let child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn tool {}: {program:?}", tool.name))?;
    drop(cmd);
    register(child.id());
    debug!("spawned {} as pid {}: {argv:?}", tool.name, child.id());
    let output = thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    });
    Ok(ToolProcess { child, output })
}

fn still_running(child: &mut Child) -> bool {
    matches!(child.try_wait(), Ok(None))
}

fn collect(proc: ToolProcess, timed_out: bool) -> anyhow::Result<RunStatus> {
    let ToolProcess { mut child, output } = proc;
    let pid = child.id();
    let status = if timed_out {
        kill(pid);
        let _ = child.wait();
        None
    } else {
        Some(child.wait()?)
    };
    // Sweep leftovers in the tool's process group either way, so the output
    // pipe is closed by the time the reader is joined.
    kill(pid);
    unregister(pid);
    let text = output
        .join()
        .map_err(|_| anyhow::anyhow!("output reader thread panicked"))?;
    match status {
        None => Ok(RunStatus::Timeout),
        Some(status) if !status.success() => Ok(RunStatus::Failure(status)),
        Some(_) => Ok(RunStatus::Finished(text)),
    }
}

/// Launch one process per tool against `benchmark` and supervise the whole
/// cohort under a single deadline.
///
/// The deadline is measured from the moment every invocation has been
/// launched, so all competitors see the same wall-clock barrier regardless
/// of launch skew. The wait loop polls without blocking; one process's exit
/// never delays another's timer. A spawn failure is returned as the error
/// for that pair only, the rest of the cohort still runs.
pub fn run_cohort(
    tools: &[Tool],
    benchmark: &Benchmark,
    timeout: Duration,
) -> Vec<anyhow::Result<RunStatus>> {
    let mut procs: Vec<anyhow::Result<ToolProcess>> = tools
        .iter()
        .map(|tool| spawn_tool(tool, benchmark))
        .collect();
    for err in procs.iter().filter_map(|p| p.as_ref().err()) {
        warn!("{}: {err:#}", benchmark.relative);
    }

    // Termination observed before the barrier is recorded here; after the
    // barrier nothing is re-polled, so a process finishing just past the
    // deadline stays a timeout.
    let mut done: Vec<bool> = procs.iter().map(|p| p.is_err()).collect();
    let deadline = Instant::now() + timeout;
    loop {
        if Instant::now() >= deadline {
            break;
        }
        for (stopped, proc) in done.iter_mut().zip(procs.iter_mut()) {
            if let Ok(proc) = proc.as_mut()
                && !*stopped
                && !still_running(&mut proc.child)
            {
                *stopped = true;
            }
        }
        if done.iter().all(|d| *d) {
            break;
        }
        thread::sleep(POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now())));
    }

    procs
        .into_iter()
        .zip(done)
        .map(|(proc, stopped)| collect(proc?, !stopped))
        .collect()
}
