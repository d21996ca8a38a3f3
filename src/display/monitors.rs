//! Live monitor enumeration.
//!
//! Cross-references the GDI geometry sweep with the display-config walk to
//! produce [`Monitor`] descriptors carrying stable EDID-derived ids. When the
//! display-config query fails the enumeration degrades to GDI-only monitors
//! whose ids are derived from the device name alone.

use crate::platform::{DisplaySystem, GdiMonitor, WindowHandle, WindowSystem};
use crate::snapshot::models::Monitor;

use super::fingerprint::monitor_identity;

/// Monitor-assignment fields recorded on a window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorAssignment {
    pub monitor_id: String,
    pub monitor_index: i32,
    pub monitor_name: String,
}

/// Enumerate connected monitors, primary first, then left edge ascending.
pub fn enumerate(displays: &dyn DisplaySystem) -> Vec<Monitor> {
    let gdi = displays.gdi_monitors();
    let targets = displays.display_targets().unwrap_or_default();

    let mut monitors: Vec<Monitor> = gdi
        .iter()
        .map(|m| {
            let target = targets
                .iter()
                .find(|t| t.source_device_name.eq_ignore_ascii_case(&m.device_name));
            let (monitor_id, friendly_name) = match target {
                Some(t) => (monitor_identity(t), t.friendly_name.clone()),
                None => (format!("gdi:{}", m.device_name), String::new()),
            };
            Monitor {
                monitor_id,
                friendly_name,
                device_name: m.device_name.clone(),
                index: 0,
                width_pixels: m.rect.width(),
                height_pixels: m.rect.height(),
                is_primary: m.is_primary,
            }
        })
        .collect();

    sort_and_index(&mut monitors, &gdi);
    monitors
}

fn sort_and_index(monitors: &mut [Monitor], gdi: &[GdiMonitor]) {
    let left_of = |m: &Monitor| {
        gdi.iter()
            .find(|g| g.device_name == m.device_name)
            .map(|g| g.rect.left)
            .unwrap_or(0)
    };
    monitors.sort_by(|a, b| {
        b.is_primary
            .cmp(&a.is_primary)
            .then(left_of(a).cmp(&left_of(b)))
    });
    for (i, m) in monitors.iter_mut().enumerate() {
        m.index = i as i32;
        if m.friendly_name.is_empty() {
            m.friendly_name = format!("Monitor {}", i + 1);
        }
    }
}

/// Map a live window onto one of the enumerated monitors.
///
/// Matches the window's nearest-monitor device name against the list,
/// case-insensitively. A device with no entry in the list still yields a
/// `gdi:`-prefixed id, which compares equal to ids produced by the GDI-only
/// fallback enumeration.
pub fn assignment_for_window(
    windows: &dyn WindowSystem,
    handle: WindowHandle,
    monitors: &[Monitor],
) -> MonitorAssignment {
    let Some(device) = windows.monitor_device_for_window(handle) else {
        return MonitorAssignment::default();
    };
    if let Some(m) = monitors
        .iter()
        .find(|m| m.device_name.eq_ignore_ascii_case(&device))
    {
        return MonitorAssignment {
            monitor_id: m.monitor_id.clone(),
            monitor_index: m.index,
            monitor_name: m.friendly_name.clone(),
        };
    }
    MonitorAssignment {
        monitor_id: format!("gdi:{}", device),
        monitor_index: 0,
        monitor_name: device,
    }
}
