//! In-memory fakes for the platform traits.
//!
//! Shared by unit and integration tests; none of this is compiled into a
//! release binary's hot path, it just lives in the library so `tests/` can
//! use the same fakes as `#[cfg(test)]` modules.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};

use crate::platform::{
    DisplayConfigError, DisplaySystem, DisplayTarget, GdiMonitor, Launcher, RawWindow,
    RegistryView, WindowHandle, WindowSystem,
};
use crate::window::placement::{Placement, Rect};

/// Process id the fakes report for the current process.
pub const FAKE_SELF_PID: u32 = 4242;

#[derive(Default)]
struct FakeWindowState {
    windows: Vec<RawWindow>,
    placements: HashMap<WindowHandle, Placement>,
    dpis: HashMap<WindowHandle, u32>,
    monitor_devices: HashMap<WindowHandle, String>,
    explorer_folders: HashMap<WindowHandle, String>,
    maximized: Vec<WindowHandle>,
    close_requests: Vec<WindowHandle>,
}

/// Scriptable window system backed by plain vectors.
#[derive(Default)]
pub struct FakeWindowSystem {
    state: Mutex<FakeWindowState>,
    /// When set, a close request removes the window immediately.
    pub remove_on_close: bool,
}

impl FakeWindowSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compliant() -> Self {
        Self {
            remove_on_close: true,
            ..Self::default()
        }
    }

    pub fn add_window(&self, window: RawWindow, placement: Placement, dpi: u32) {
        let mut state = self.state.lock().unwrap();
        state.placements.insert(window.handle, placement);
        state.dpis.insert(window.handle, dpi);
        state.windows.push(window);
    }

    pub fn remove_window(&self, handle: WindowHandle) {
        let mut state = self.state.lock().unwrap();
        state.windows.retain(|w| w.handle != handle);
        state.placements.remove(&handle);
    }

    pub fn set_monitor_device(&self, handle: WindowHandle, device: &str) {
        let mut state = self.state.lock().unwrap();
        state.monitor_devices.insert(handle, device.to_string());
    }

    pub fn set_explorer_folder(&self, handle: WindowHandle, folder: &str) {
        let mut state = self.state.lock().unwrap();
        state.explorer_folders.insert(handle, folder.to_string());
    }

    pub fn was_maximized(&self, handle: WindowHandle) -> bool {
        self.state.lock().unwrap().maximized.contains(&handle)
    }

    pub fn close_requests(&self) -> Vec<WindowHandle> {
        self.state.lock().unwrap().close_requests.clone()
    }
}

impl WindowSystem for FakeWindowSystem {
    fn list_windows(&self) -> Vec<RawWindow> {
        self.state.lock().unwrap().windows.clone()
    }

    fn placement(&self, handle: WindowHandle) -> Result<Placement> {
        self.state
            .lock()
            .unwrap()
            .placements
            .get(&handle)
            .copied()
            .ok_or_else(|| anyhow!("no such window: {}", handle))
    }

    fn set_placement(&self, handle: WindowHandle, placement: &Placement) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.placements.get_mut(&handle) {
            Some(slot) => {
                *slot = *placement;
                Ok(())
            }
            None => Err(anyhow!("no such window: {}", handle)),
        }
    }

    fn show_maximized(&self, handle: WindowHandle) {
        self.state.lock().unwrap().maximized.push(handle);
    }

    fn window_dpi(&self, handle: WindowHandle) -> u32 {
        self.state
            .lock()
            .unwrap()
            .dpis
            .get(&handle)
            .copied()
            .unwrap_or(0)
    }

    fn outer_rect(&self, handle: WindowHandle) -> Option<Rect> {
        self.state
            .lock()
            .unwrap()
            .windows
            .iter()
            .find(|w| w.handle == handle)
            .map(|w| w.rect)
    }

    fn request_close(&self, handle: WindowHandle) {
        let mut state = self.state.lock().unwrap();
        state.close_requests.push(handle);
        if self.remove_on_close {
            state.windows.retain(|w| w.handle != handle);
            state.placements.remove(&handle);
        }
    }

    fn monitor_device_for_window(&self, handle: WindowHandle) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .monitor_devices
            .get(&handle)
            .cloned()
    }

    fn explorer_folder(&self, handle: WindowHandle) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .explorer_folders
            .get(&handle)
            .cloned()
    }

    fn current_process_id(&self) -> u32 {
        FAKE_SELF_PID
    }
}

/// Display system returning configured monitors and targets.
pub struct FakeDisplaySystem {
    pub monitors: Vec<GdiMonitor>,
    pub targets: std::result::Result<Vec<DisplayTarget>, DisplayConfigError>,
}

impl FakeDisplaySystem {
    pub fn new(
        monitors: Vec<GdiMonitor>,
        targets: std::result::Result<Vec<DisplayTarget>, DisplayConfigError>,
    ) -> Self {
        Self { monitors, targets }
    }
}

impl DisplaySystem for FakeDisplaySystem {
    fn gdi_monitors(&self) -> Vec<GdiMonitor> {
        self.monitors.clone()
    }

    fn display_targets(&self) -> std::result::Result<Vec<DisplayTarget>, DisplayConfigError> {
        self.targets.clone()
    }
}

type LaunchHook = Box<dyn Fn(&str, &[String]) + Send + Sync>;

/// Records launches; an optional hook lets tests script side effects such as
/// a new window appearing after a spawn.
#[derive(Default)]
pub struct FakeLauncher {
    calls: Mutex<Vec<LaunchCall>>,
    hook: Mutex<Option<LaunchHook>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchCall {
    ShellOpen(String),
    Spawn { executable: String, args: Vec<String> },
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_hook(&self, hook: LaunchHook) {
        *self.hook.lock().unwrap() = Some(hook);
    }

    pub fn calls(&self) -> Vec<LaunchCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Launcher for FakeLauncher {
    fn shell_open(&self, target: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(LaunchCall::ShellOpen(target.to_string()));
        if let Some(hook) = self.hook.lock().unwrap().as_ref() {
            hook(target, &[]);
        }
        Ok(())
    }

    fn spawn(&self, executable: &str, args: &[String]) -> Result<()> {
        self.calls.lock().unwrap().push(LaunchCall::Spawn {
            executable: executable.to_string(),
            args: args.to_vec(),
        });
        if let Some(hook) = self.hook.lock().unwrap().as_ref() {
            hook(executable, args);
        }
        Ok(())
    }
}

/// Build a minimal Shell Link blob whose link-info carries `target` as the
/// Unicode local base path.
pub fn synth_link_blob(target: &str) -> Vec<u8> {
    let flags: u32 = 0x2; // link info only
    let mut data = vec![0u8; 76];
    data[0] = 0x4C;
    data[20..24].copy_from_slice(&flags.to_le_bytes());

    let header_size: u32 = 0x24;
    let mut payload = Vec::new();
    let unicode_offset = header_size;
    for unit in target.encode_utf16() {
        payload.extend_from_slice(&unit.to_le_bytes());
    }
    payload.extend_from_slice(&[0, 0]);

    let info_size = header_size + payload.len() as u32;
    let mut info = Vec::new();
    info.extend_from_slice(&info_size.to_le_bytes());
    info.extend_from_slice(&header_size.to_le_bytes());
    info.extend_from_slice(&0u32.to_le_bytes()); // flags
    info.extend_from_slice(&0u32.to_le_bytes()); // volume id
    info.extend_from_slice(&0u32.to_le_bytes()); // ansi base path
    info.extend_from_slice(&0u32.to_le_bytes()); // common network
    info.extend_from_slice(&0u32.to_le_bytes()); // common suffix
    info.extend_from_slice(&unicode_offset.to_le_bytes());
    info.extend_from_slice(&0u32.to_le_bytes()); // unicode suffix
    info.extend_from_slice(&payload);

    data.extend_from_slice(&info);
    data
}

/// Write a jump-list compound file containing one link stream per target,
/// plus the `DestList` metadata stream the parser must skip.
pub fn write_jump_list(path: &std::path::Path, targets: &[&str]) {
    use std::io::Write as _;

    let mut comp = cfb::create(path).expect("create compound file");
    {
        let mut dest = comp.create_stream("DestList").expect("DestList stream");
        dest.write_all(&[0u8; 32]).expect("write DestList");
    }
    for (i, target) in targets.iter().enumerate() {
        let mut stream = comp
            .create_stream(format!("{:x}", i + 1))
            .expect("link stream");
        stream.write_all(&synth_link_blob(target)).expect("write link");
    }
    comp.flush().expect("flush compound file");
}

/// Registry view over plain maps.
#[derive(Default)]
pub struct FakeRegistry {
    pub user_choices: HashMap<String, String>,
    pub machine_progids: HashMap<String, String>,
    pub open_commands: HashMap<String, String>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegistryView for FakeRegistry {
    fn user_choice_progid(&self, extension: &str) -> Option<String> {
        self.user_choices.get(&extension.to_lowercase()).cloned()
    }

    fn machine_progid(&self, extension: &str) -> Option<String> {
        self.machine_progids.get(&extension.to_lowercase()).cloned()
    }

    fn open_command(&self, progid: &str) -> Option<String> {
        self.open_commands.get(progid).cloned()
    }
}
