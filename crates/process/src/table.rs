use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::{Mutex, MutexGuard, PoisonError};

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};
use tracing::debug;

use crate::{ProcessEntry, ProcessTable};

/// The live process list, read through `sysinfo`.
pub struct SysinfoProcessTable {
    system: Mutex<System>,
}

impl SysinfoProcessTable {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    fn system(&self) -> MutexGuard<'_, System> {
        self.system.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refresh(system: &mut System, which: ProcessesToUpdate<'_>) {
        system.refresh_processes_specifics(
            which,
            true,
            ProcessRefreshKind::nothing().with_exe(UpdateKind::OnlyIfNotSet),
        );
    }
}

impl Default for SysinfoProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SysinfoProcessTable {
    fn find(&self, name: &str) -> Vec<ProcessEntry> {
        let mut system = self.system();
        Self::refresh(&mut system, ProcessesToUpdate::All);
        let windows = window_owners();

        system
            .processes()
            .values()
            .filter(|p| name_matches(p.name(), name))
            .map(|p| {
                let pid = p.pid().as_u32();
                ProcessEntry {
                    pid,
                    exe: p.exe().map(Path::to_path_buf),
                    has_window: windows.as_ref().is_none_or(|owners| owners.contains(&pid)),
                }
            })
            .collect()
    }

    fn kill(&self, pid: u32) -> std::io::Result<()> {
        let mut system = self.system();
        let target = Pid::from_u32(pid);
        Self::refresh(&mut system, ProcessesToUpdate::Some(&[target]));
        match system.process(target) {
            None => Ok(()),
            Some(process) if process.kill() => Ok(()),
            Some(_) => Err(std::io::Error::other(format!("could not signal process {pid}"))),
        }
    }

    fn is_running(&self, pid: u32) -> bool {
        let mut system = self.system();
        let target = Pid::from_u32(pid);
        Self::refresh(&mut system, ProcessesToUpdate::Some(&[target]));
        system.process(target).is_some()
    }

    fn launch(&self, path: &Path) -> std::io::Result<()> {
        let child = Command::new(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        debug!(pid = child.id(), path = %path.display(), "launched");
        Ok(())
    }
}

/// Compare a process name against `wanted`, ignoring case and any `.exe`.
fn name_matches(process_name: &OsStr, wanted: &str) -> bool {
    let name = process_name.to_string_lossy();
    let stem = match name.len().checked_sub(4) {
        Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".exe") => &name[..cut],
        _ => &name[..],
    };
    stem.eq_ignore_ascii_case(wanted)
}

/// Process ids owning a visible, unowned top-level window.
#[cfg(windows)]
fn window_owners() -> Option<HashSet<u32>> {
    use windows_sys::Win32::Foundation::{HWND, LPARAM};
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetWindow, GetWindowThreadProcessId, IsWindowVisible, GW_OWNER,
    };

    unsafe extern "system" fn collect(hwnd: HWND, lparam: LPARAM) -> i32 {
        unsafe {
            let owners = &mut *(lparam as *mut HashSet<u32>);
            if IsWindowVisible(hwnd) != 0 && GetWindow(hwnd, GW_OWNER).is_null() {
                let mut pid = 0u32;
                GetWindowThreadProcessId(hwnd, &mut pid);
                owners.insert(pid);
            }
        }
        1
    }

    let mut owners = HashSet::new();
    unsafe {
        EnumWindows(Some(collect), &mut owners as *mut HashSet<u32> as LPARAM);
    }
    Some(owners)
}

/// No window system to ask: every live process counts.
#[cfg(not(windows))]
fn window_owners() -> Option<HashSet<u32>> {
    None
}
