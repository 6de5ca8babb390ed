//! Queries against the processes running on this host.

use std::sync::Mutex;

use sysinfo::{Pid, Signal, System};

/// Host-wide process queries used by the launcher and `stop`.
pub trait HostProcesses {
    /// Is any process with exactly this name running?
    fn is_running(&self, name: &str) -> bool;
    /// The OS-reported name of a live process.
    fn process_name(&self, pid: u32) -> Option<String>;
    /// Ask a process to terminate. Returns false if no signal was delivered.
    fn terminate(&self, pid: u32) -> bool;
}

/// [`HostProcesses`] backed by the operating system's process table.
pub struct SystemHost {
    system: Mutex<System>,
}

impl Default for SystemHost {
    fn default() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl SystemHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_system<T>(&self, f: impl FnOnce(&mut System) -> T) -> T {
        let mut system = self
            .system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut system)
    }
}

impl HostProcesses for SystemHost {
    fn is_running(&self, name: &str) -> bool {
        self.with_system(|system| {
            system.refresh_processes();
            system.processes_by_exact_name(name).next().is_some()
        })
    }

    fn process_name(&self, pid: u32) -> Option<String> {
        let pid = Pid::from_u32(pid);
        self.with_system(|system| {
            if !system.refresh_process(pid) {
                return None;
            }
            system.process(pid).map(|process| process.name().to_string())
        })
    }

    fn terminate(&self, pid: u32) -> bool {
        let pid = Pid::from_u32(pid);
        self.with_system(|system| {
            if !system.refresh_process(pid) {
                return false;
            }
            system.process(pid).is_some_and(|process| {
                process
                    .kill_with(Signal::Term)
                    .unwrap_or_else(|| process.kill())
            })
        })
    }
}
