use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use sysinfo::{get_current_pid, Signal, System};

const DAEMON_BINARY: &str = if cfg!(windows) {
    "slotwise-daemon.exe"
} else {
    "slotwise-daemon"
};

/// The daemon binary is expected to sit next to the cli binary.
pub fn daemon_executable() -> Result<PathBuf> {
    let current = env::current_exe().context("Can't locate the current executable")?;
    let dir = current
        .parent()
        .context("Executable has no parent directory")?;
    Ok(dir.join(DAEMON_BINARY))
}

pub fn kill_running_daemons(name: &Path) {
    let system = System::new_all();
    let current_id = get_current_pid().unwrap();
    for (pid, process) in system.processes().iter() {
        if *pid == current_id {
            continue;
        }
        if matches!(process.parent(), Some(p) if p == current_id) {
            continue;
        }

        if process
            .exe()
            .filter(|v| v.exists())
            .filter(|v| name == *v)
            .is_some()
        {
            // This will forcefully terminate the process on Windows. Anything
            // better will require a lot more work.
            if process.kill_with(Signal::Term).is_none() {
                process.kill();
            }
            process.wait();
        }
    }
}

/// Shuts down any previous daemon and starts a new one. The daemon detaches
/// itself, so a plain spawn is enough here.
pub fn restart_daemon() -> Result<()> {
    let daemon = daemon_executable()?;
    kill_running_daemons(&daemon);

    let mut command = std::process::Command::new(&daemon);

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        use std::process::Stdio;
        command.process_group(0);
        command.stdin(Stdio::null());
        command.stdout(Stdio::null());
    }

    println!("Spawning daemon");
    #[allow(clippy::zombie_processes)]
    let _ = command.spawn()?;
    println!("Success");
    Ok(())
}
