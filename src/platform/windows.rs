//! Win32 implementations of the platform traits.
//!
//! Everything unsafe lives here. Failures degrade: an unreadable process
//! path becomes an empty string, a failed display-config query becomes the
//! GDI-only fallback, a COM hiccup while asking Explorer for its folder
//! becomes `None`.

#![allow(clippy::missing_safety_doc)]

use anyhow::{anyhow, Context, Result};

use windows::core::{Interface, PCWSTR};
use windows::Win32::Devices::Display::{
    DisplayConfigGetDeviceInfo, GetDisplayConfigBufferSizes, QueryDisplayConfig,
    DISPLAYCONFIG_DEVICE_INFO_GET_SOURCE_NAME, DISPLAYCONFIG_DEVICE_INFO_GET_TARGET_NAME,
    DISPLAYCONFIG_DEVICE_INFO_HEADER, DISPLAYCONFIG_MODE_INFO, DISPLAYCONFIG_PATH_INFO,
    DISPLAYCONFIG_SOURCE_DEVICE_NAME, DISPLAYCONFIG_TARGET_DEVICE_NAME, QDC_ONLY_ACTIVE_PATHS,
};
use windows::Win32::Foundation::{
    CloseHandle, BOOL, ERROR_SUCCESS, HANDLE, HWND, LPARAM, RECT, WPARAM,
};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, MonitorFromWindow, HDC, HMONITOR, MONITORINFO,
    MONITORINFOEXW, MONITORINFOF_PRIMARY, MONITOR_DEFAULTTONEAREST,
};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoUninitialize, CLSCTX_ALL, COINIT_APARTMENTTHREADED,
};
use windows::Win32::System::Threading::{
    GetCurrentProcessId, OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
    PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::System::Variant::VARIANT;
use windows::Win32::UI::HiDpi::GetDpiForWindow;
use windows::Win32::UI::Shell::{IShellWindows, IWebBrowser2, ShellExecuteW, ShellWindows};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetClassNameW, GetWindow, GetWindowPlacement, GetWindowRect,
    GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId, IsWindowVisible,
    PostMessageW, SetWindowPlacement, ShowWindow, GW_OWNER, SHOW_WINDOW_CMD, SW_MAXIMIZE,
    SW_SHOWNORMAL, WINDOWPLACEMENT, WINDOWPLACEMENT_FLAGS, WM_CLOSE,
};

use crate::window::placement::{Placement, Rect, ShowCommand};

use super::{
    DisplayConfigError, DisplaySystem, DisplayTarget, GdiMonitor, Launcher, RawWindow,
    RegistryView, WindowHandle, WindowSystem,
};

/// `edidIdsValid` bit of `DISPLAYCONFIG_TARGET_DEVICE_NAME_FLAGS`.
const EDID_IDS_VALID: u32 = 0x4;

fn hwnd(handle: WindowHandle) -> HWND {
    HWND(handle as *mut core::ffi::c_void)
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn from_wide(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

fn rect_from(r: &RECT) -> Rect {
    Rect::new(r.left, r.top, r.right, r.bottom)
}

fn rect_to(r: Rect) -> RECT {
    RECT {
        left: r.left,
        top: r.top,
        right: r.right,
        bottom: r.bottom,
    }
}

/// Live Win32 window system.
#[derive(Default)]
pub struct Win32WindowSystem;

impl Win32WindowSystem {
    pub fn new() -> Self {
        Self
    }

    fn window_title(handle: HWND) -> String {
        unsafe {
            if GetWindowTextLengthW(handle) <= 0 {
                return String::new();
            }
            // 256 code units is plenty; storage caps titles harder anyway.
            let mut buf = [0u16; 256];
            let copied = GetWindowTextW(handle, &mut buf);
            if copied <= 0 {
                return String::new();
            }
            from_wide(&buf)
        }
    }

    fn window_class(handle: HWND) -> String {
        unsafe {
            let mut buf = [0u16; 256];
            let copied = GetClassNameW(handle, &mut buf);
            if copied <= 0 {
                return String::new();
            }
            from_wide(&buf)
        }
    }

    /// Full image path of a window's process; empty on access denied.
    fn process_path(pid: u32) -> String {
        unsafe {
            let Ok(process) = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) else {
                return String::new();
            };
            let path = Self::query_image_name(process);
            let _ = CloseHandle(process);
            path
        }
    }

    unsafe fn query_image_name(process: HANDLE) -> String {
        let mut buf = [0u16; 1024];
        let mut len = buf.len() as u32;
        match QueryFullProcessImageNameW(
            process,
            PROCESS_NAME_WIN32,
            windows::core::PWSTR(buf.as_mut_ptr()),
            &mut len,
        ) {
            Ok(()) => String::from_utf16_lossy(&buf[..len as usize]),
            Err(_) => String::new(),
        }
    }
}

extern "system" fn enum_windows_proc(handle: HWND, lparam: LPARAM) -> BOOL {
    let handles = unsafe { &mut *(lparam.0 as *mut Vec<HWND>) };
    handles.push(handle);
    true.into()
}

impl WindowSystem for Win32WindowSystem {
    fn list_windows(&self) -> Vec<RawWindow> {
        let mut handles: Vec<HWND> = Vec::new();
        unsafe {
            let _ = EnumWindows(
                Some(enum_windows_proc),
                LPARAM(&mut handles as *mut _ as isize),
            );
        }

        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            unsafe {
                let is_visible = IsWindowVisible(handle).as_bool();
                let has_owner = !GetWindow(handle, GW_OWNER)
                    .map(|owner| owner.0.is_null())
                    .unwrap_or(true);
                let mut rect = RECT::default();
                if GetWindowRect(handle, &mut rect).is_err() {
                    continue;
                }
                let mut pid = 0u32;
                GetWindowThreadProcessId(handle, Some(&mut pid));

                out.push(RawWindow {
                    handle: handle.0 as isize,
                    title: Self::window_title(handle),
                    class_name: Self::window_class(handle),
                    is_visible,
                    has_owner,
                    rect: rect_from(&rect),
                    process_id: pid,
                    executable_path: Self::process_path(pid),
                });
            }
        }
        out
    }

    fn placement(&self, handle: WindowHandle) -> Result<Placement> {
        unsafe {
            let mut wp = WINDOWPLACEMENT {
                length: std::mem::size_of::<WINDOWPLACEMENT>() as u32,
                ..Default::default()
            };
            GetWindowPlacement(hwnd(handle), &mut wp)
                .with_context(|| format!("GetWindowPlacement({:#x})", handle))?;
            Ok(Placement {
                show_command: ShowCommand::from_sw(wp.showCmd.0 as u32),
                normal_rect: rect_from(&wp.rcNormalPosition),
                raw_flags: wp.flags.0,
            })
        }
    }

    fn set_placement(&self, handle: WindowHandle, placement: &Placement) -> Result<()> {
        unsafe {
            let mut wp = WINDOWPLACEMENT {
                length: std::mem::size_of::<WINDOWPLACEMENT>() as u32,
                ..Default::default()
            };
            // Read first so min/max points and flag bits survive the write.
            GetWindowPlacement(hwnd(handle), &mut wp)
                .with_context(|| format!("GetWindowPlacement({:#x})", handle))?;
            wp.flags = WINDOWPLACEMENT_FLAGS(placement.raw_flags);
            wp.showCmd = SHOW_WINDOW_CMD(placement.show_command.to_sw() as i32);
            wp.rcNormalPosition = rect_to(placement.normal_rect);
            SetWindowPlacement(hwnd(handle), &wp)
                .with_context(|| format!("SetWindowPlacement({:#x})", handle))?;
            Ok(())
        }
    }

    fn show_maximized(&self, handle: WindowHandle) {
        unsafe {
            let _ = ShowWindow(hwnd(handle), SW_MAXIMIZE);
        }
    }

    fn window_dpi(&self, handle: WindowHandle) -> u32 {
        unsafe { GetDpiForWindow(hwnd(handle)) }
    }

    fn outer_rect(&self, handle: WindowHandle) -> Option<Rect> {
        unsafe {
            let mut rect = RECT::default();
            GetWindowRect(hwnd(handle), &mut rect).ok()?;
            Some(rect_from(&rect))
        }
    }

    fn request_close(&self, handle: WindowHandle) {
        unsafe {
            let _ = PostMessageW(hwnd(handle), WM_CLOSE, WPARAM(0), LPARAM(0));
        }
    }

    fn monitor_device_for_window(&self, handle: WindowHandle) -> Option<String> {
        unsafe {
            let monitor = MonitorFromWindow(hwnd(handle), MONITOR_DEFAULTTONEAREST);
            if monitor.is_invalid() {
                return None;
            }
            let mut info = MONITORINFOEXW {
                monitorInfo: MONITORINFO {
                    cbSize: std::mem::size_of::<MONITORINFOEXW>() as u32,
                    ..Default::default()
                },
                ..Default::default()
            };
            if !GetMonitorInfoW(monitor, &mut info.monitorInfo as *mut MONITORINFO).as_bool() {
                return None;
            }
            Some(from_wide(&info.szDevice))
        }
    }

    fn explorer_folder(&self, handle: WindowHandle) -> Option<String> {
        match explorer_folder_for_hwnd(handle) {
            Ok(folder) => folder,
            Err(err) => {
                log::info!("explorer folder query failed: {}", err);
                None
            }
        }
    }

    fn current_process_id(&self) -> u32 {
        unsafe { GetCurrentProcessId() }
    }
}

/// Ask the shell automation object which folder an Explorer window shows.
fn explorer_folder_for_hwnd(handle: WindowHandle) -> Result<Option<String>> {
    unsafe {
        let com = CoInitializeEx(None, COINIT_APARTMENTTHREADED);
        let initialized = com.is_ok();
        let result = (|| -> Result<Option<String>> {
            let shell: IShellWindows = CoCreateInstance(&ShellWindows, None, CLSCTX_ALL)
                .context("creating ShellWindows")?;
            let count = shell.Count().context("ShellWindows::Count")?;
            for i in 0..count {
                let Ok(dispatch) = shell.Item(&VARIANT::from(i)) else {
                    continue;
                };
                let Ok(browser) = dispatch.cast::<IWebBrowser2>() else {
                    continue;
                };
                let Ok(browser_hwnd) = browser.HWND() else {
                    continue;
                };
                if browser_hwnd.0 as isize != handle {
                    continue;
                }
                let Ok(url) = browser.LocationURL() else {
                    continue;
                };
                return Ok(file_url_to_path(&url.to_string()));
            }
            Ok(None)
        })();
        if initialized {
            CoUninitialize();
        }
        result
    }
}

/// Convert a `file:///C:/...` URL into a local path.
fn file_url_to_path(url: &str) -> Option<String> {
    let rest = url.strip_prefix("file:///")?;
    let mut path = String::with_capacity(rest.len());
    let mut bytes = rest.bytes();
    while let Some(b) = bytes.next() {
        match b {
            b'%' => {
                let hi = bytes.next()?;
                let lo = bytes.next()?;
                let value = u8::from_str_radix(&format!("{}{}", hi as char, lo as char), 16).ok()?;
                path.push(value as char);
            }
            b'/' => path.push('\\'),
            other => path.push(other as char),
        }
    }
    (!path.is_empty()).then_some(path)
}

/// Live Win32 display system.
#[derive(Default)]
pub struct Win32DisplaySystem;

impl Win32DisplaySystem {
    pub fn new() -> Self {
        Self
    }
}

extern "system" fn enum_monitors_proc(
    monitor: HMONITOR,
    _hdc: HDC,
    _rect: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let monitors = unsafe { &mut *(lparam.0 as *mut Vec<GdiMonitor>) };
    unsafe {
        let mut info = MONITORINFOEXW {
            monitorInfo: MONITORINFO {
                cbSize: std::mem::size_of::<MONITORINFOEXW>() as u32,
                ..Default::default()
            },
            ..Default::default()
        };
        if GetMonitorInfoW(monitor, &mut info.monitorInfo as *mut MONITORINFO).as_bool() {
            monitors.push(GdiMonitor {
                device_name: from_wide(&info.szDevice),
                rect: rect_from(&info.monitorInfo.rcMonitor),
                work_area: rect_from(&info.monitorInfo.rcWork),
                is_primary: info.monitorInfo.dwFlags & MONITORINFOF_PRIMARY != 0,
            });
        }
    }
    true.into()
}

impl DisplaySystem for Win32DisplaySystem {
    fn gdi_monitors(&self) -> Vec<GdiMonitor> {
        let mut monitors: Vec<GdiMonitor> = Vec::new();
        unsafe {
            let _ = EnumDisplayMonitors(
                HDC::default(),
                None,
                Some(enum_monitors_proc),
                LPARAM(&mut monitors as *mut _ as isize),
            );
        }
        monitors
    }

    fn display_targets(&self) -> std::result::Result<Vec<DisplayTarget>, DisplayConfigError> {
        unsafe {
            let mut path_count = 0u32;
            let mut mode_count = 0u32;
            if GetDisplayConfigBufferSizes(QDC_ONLY_ACTIVE_PATHS, &mut path_count, &mut mode_count)
                != ERROR_SUCCESS
            {
                return Err(DisplayConfigError::BufferSize);
            }

            let mut paths = vec![DISPLAYCONFIG_PATH_INFO::default(); path_count as usize];
            let mut modes = vec![DISPLAYCONFIG_MODE_INFO::default(); mode_count as usize];
            if QueryDisplayConfig(
                QDC_ONLY_ACTIVE_PATHS,
                &mut path_count,
                paths.as_mut_ptr(),
                &mut mode_count,
                modes.as_mut_ptr(),
                None,
            ) != ERROR_SUCCESS
            {
                return Err(DisplayConfigError::QueryFailed);
            }
            paths.truncate(path_count as usize);

            let mut targets = Vec::with_capacity(paths.len());
            for path in &paths {
                let mut target = DISPLAYCONFIG_TARGET_DEVICE_NAME {
                    header: DISPLAYCONFIG_DEVICE_INFO_HEADER {
                        r#type: DISPLAYCONFIG_DEVICE_INFO_GET_TARGET_NAME,
                        size: std::mem::size_of::<DISPLAYCONFIG_TARGET_DEVICE_NAME>() as u32,
                        adapterId: path.targetInfo.adapterId,
                        id: path.targetInfo.id,
                    },
                    ..Default::default()
                };
                if DisplayConfigGetDeviceInfo(&mut target.header) != 0 {
                    continue;
                }

                let mut source = DISPLAYCONFIG_SOURCE_DEVICE_NAME {
                    header: DISPLAYCONFIG_DEVICE_INFO_HEADER {
                        r#type: DISPLAYCONFIG_DEVICE_INFO_GET_SOURCE_NAME,
                        size: std::mem::size_of::<DISPLAYCONFIG_SOURCE_DEVICE_NAME>() as u32,
                        adapterId: path.sourceInfo.adapterId,
                        id: path.sourceInfo.id,
                    },
                    ..Default::default()
                };
                let source_device_name = if DisplayConfigGetDeviceInfo(&mut source.header) == 0 {
                    from_wide(&source.viewGdiDeviceName)
                } else {
                    String::new()
                };

                let flags_value = target.flags.Anonymous.value;
                targets.push(DisplayTarget {
                    source_device_name,
                    device_path: from_wide(&target.monitorDevicePath),
                    friendly_name: from_wide(&target.monitorFriendlyDeviceName),
                    edid_valid: flags_value & EDID_IDS_VALID != 0,
                    edid_manufacturer_id: target.edidManufactureId,
                    edid_product_code: target.edidProductCodeId,
                    connector_instance: target.connectorInstance,
                });
            }
            Ok(targets)
        }
    }
}

/// Launches documents through the shell association and applications
/// directly.
#[derive(Default)]
pub struct ShellLauncher;

impl ShellLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl Launcher for ShellLauncher {
    fn shell_open(&self, target: &str) -> Result<()> {
        let operation = wide("open");
        let file = wide(target);
        let instance = unsafe {
            ShellExecuteW(
                None,
                PCWSTR(operation.as_ptr()),
                PCWSTR(file.as_ptr()),
                PCWSTR::null(),
                PCWSTR::null(),
                SW_SHOWNORMAL,
            )
        };
        // Per the API contract, values above 32 mean success.
        if instance.0 as isize > 32 {
            Ok(())
        } else {
            Err(anyhow!(
                "ShellExecuteW('{}') failed with code {}",
                target,
                instance.0 as isize
            ))
        }
    }

    fn spawn(&self, executable: &str, args: &[String]) -> Result<()> {
        std::process::Command::new(executable)
            .args(args)
            .spawn()
            .with_context(|| format!("spawning '{}'", executable))?;
        Ok(())
    }
}

/// Registry lookups through `winreg`.
#[derive(Default)]
pub struct WindowsRegistry;

impl WindowsRegistry {
    pub fn new() -> Self {
        Self
    }
}

impl RegistryView for WindowsRegistry {
    fn user_choice_progid(&self, extension: &str) -> Option<String> {
        use winreg::enums::HKEY_CURRENT_USER;
        use winreg::RegKey;

        let key = RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey(format!(
                "Software\\Microsoft\\Windows\\CurrentVersion\\Explorer\\FileExts\\{}\\UserChoice",
                extension
            ))
            .ok()?;
        key.get_value::<String, _>("ProgId").ok()
    }

    fn machine_progid(&self, extension: &str) -> Option<String> {
        use winreg::enums::HKEY_CLASSES_ROOT;
        use winreg::RegKey;

        let key = RegKey::predef(HKEY_CLASSES_ROOT)
            .open_subkey(extension)
            .ok()?;
        let value: String = key.get_value("").ok()?;
        (!value.is_empty()).then_some(value)
    }

    fn open_command(&self, progid: &str) -> Option<String> {
        use winreg::enums::HKEY_CLASSES_ROOT;
        use winreg::RegKey;

        let key = RegKey::predef(HKEY_CLASSES_ROOT)
            .open_subkey(format!("{}\\shell\\open\\command", progid))
            .ok()?;
        let value: String = key.get_value("").ok()?;
        (!value.is_empty()).then_some(value)
    }
}
