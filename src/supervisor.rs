//! Process supervisor: binds the single listening socket, preforks
//! `worker_count` children that each run [`crate::worker::run`], and then
//! spends its own life reaping and respawning them until asked to stop.
//! Mirrors `original_source/src/worker.c`'s `worker_init`/`monitor_workers`/
//! `worker_cleanup` trio, translating its `fork`+`waitpid(WNOHANG)` polling
//! into the same shape over `nix::unistd`/`nix::sys::wait`.

use crate::prelude::*;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::socket::{
    bind, listen, socket, AddressFamily, Backlog, SockFlag, SockType, SockaddrIn,
};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};
use std::net::TcpListener;
use std::os::fd::{FromRawFd, IntoRawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn on_terminate(_signum: i32) {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

/// One supervised worker. `None` once force-killed during shutdown so the
/// reap loop stops waiting on it.
struct Slot {
    pid: Option<Pid>,
}

/// Binds the listening socket and runs the fork/monitor/shutdown lifecycle
/// to completion. Returns `Ok(())` for a clean shutdown; failures here are
/// process-fatal (`origind`'s caller maps this to exit code 1).
pub fn run(config: &DaemonConfig) -> Result<()> {
    ignore_sigpipe()?;
    install_signal_handlers()?;

    let listener = bind_listener(config.listen_port)?;
    info!(
        "origind listening on 0.0.0.0:{} with {} workers",
        config.listen_port, config.worker_count
    );

    let mut slots: Vec<Slot> = Vec::with_capacity(config.worker_count as usize);
    for i in 0..config.worker_count {
        let pid = spawn_worker(i, &listener, config)?;
        slots.push(Slot { pid: Some(pid) });
    }

    reap_and_respawn(&mut slots, &listener, config);

    shutdown(&mut slots);
    info!("origind shut down cleanly");
    Ok(())
}

fn ignore_sigpipe() -> Result<()> {
    unsafe {
        signal::sigaction(
            Signal::SIGPIPE,
            &SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty()),
        )?;
    }
    Ok(())
}

fn install_signal_handlers() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_terminate),
        SaFlags::empty(),
        SigSet::empty(),
    );
    unsafe {
        signal::sigaction(Signal::SIGTERM, &action)?;
        signal::sigaction(Signal::SIGINT, &action)?;
    }
    Ok(())
}

/// `SO_REUSEADDR`, wildcard bind, kernel-default backlog — a bind/listen
/// failure here is fatal startup, never a degraded-mode fallback.
fn bind_listener(port: u16) -> Result<TcpListener> {
    let fd = socket(
        AddressFamily::Inet,
        SockType::Stream,
        SockFlag::empty(),
        None,
    )?;

    nix::sys::socket::setsockopt(&fd, nix::sys::socket::sockopt::ReuseAddr, &true)?;

    let addr = SockaddrIn::new(0, 0, 0, 0, port);
    bind(&fd, &addr)?;
    listen(&fd, Backlog::new(128).unwrap_or(Backlog::MAXCONN))?;

    let listener = unsafe { TcpListener::from_raw_fd(fd.into_raw_fd()) };
    Ok(listener)
}

/// Forks one child that runs the worker loop and never returns; the parent
/// gets the child's pid back immediately.
fn spawn_worker(index: u32, listener: &TcpListener, config: &DaemonConfig) -> Result<Pid> {
    match unsafe { fork() }? {
        ForkResult::Child => {
            if let Err(e) = crate::worker::run(listener, config) {
                error!("worker {index} exited with error: {e}");
                std::process::exit(1);
            }
            std::process::exit(0);
        }
        ForkResult::Parent { child } => {
            debug!("spawned worker {index} as pid {child}");
            Ok(child)
        }
    }
}

/// Runs until [`SHUTDOWN`] is observed, non-blockingly reaping any worker
/// that exits and respawning it into the same slot (worker.c's
/// `monitor_workers`, minus the linear pid scan since we index slots
/// directly off `waitpid`'s returned pid).
fn reap_and_respawn(slots: &mut [Slot], listener: &TcpListener, config: &DaemonConfig) {
    while !SHUTDOWN.load(Ordering::SeqCst) {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(pid, _)) | Ok(WaitStatus::Signaled(pid, _, _)) => {
                warn!("worker pid {pid} exited, respawning");
                respawn_slot(slots, pid, listener, config);
            }
            Ok(WaitStatus::StillAlive) | Err(nix::errno::Errno::ECHILD) => {
                thread::sleep(REAP_POLL_INTERVAL);
            }
            Ok(_) => thread::sleep(REAP_POLL_INTERVAL),
            Err(nix::errno::Errno::EINTR) => continue,
            Err(e) => {
                error!("waitpid failed: {e}");
                break;
            }
        }
    }
}

fn respawn_slot(slots: &mut [Slot], dead_pid: Pid, listener: &TcpListener, config: &DaemonConfig) {
    for (i, slot) in slots.iter_mut().enumerate() {
        if slot.pid == Some(dead_pid) {
            match spawn_worker(i as u32, listener, config) {
                Ok(new_pid) => slot.pid = Some(new_pid),
                Err(e) => error!("failed to respawn worker {i}: {e}"),
            }
            return;
        }
    }
}

/// SIGTERM to every live worker, a bounded non-blocking reap window, then
/// SIGKILL plus a blocking reap of any stragglers (worker.c's
/// `worker_cleanup`).
fn shutdown(slots: &mut [Slot]) {
    info!("shutting down {} workers", slots.len());
    for slot in slots.iter() {
        if let Some(pid) = slot.pid {
            let _ = signal::kill(pid, Signal::SIGTERM);
        }
    }

    let deadline = Instant::now() + SHUTDOWN_WINDOW;
    while Instant::now() < deadline {
        let mut all_gone = true;
        for slot in slots.iter_mut() {
            if let Some(pid) = slot.pid {
                match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                    Ok(WaitStatus::StillAlive) => all_gone = false,
                    _ => slot.pid = None,
                }
            }
        }
        if all_gone {
            return;
        }
        thread::sleep(REAP_POLL_INTERVAL);
    }

    for slot in slots.iter_mut() {
        if let Some(pid) = slot.pid {
            warn!("force killing worker pid {pid}");
            let _ = signal::kill(pid, Signal::SIGKILL);
            let _ = waitpid(pid, None);
            slot.pid = None;
        }
    }
}
