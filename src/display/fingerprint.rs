//! Monitor-topology fingerprinting.
//!
//! Produces a stable identifier for the set of physically connected displays.
//! The fingerprint survives resolution and refresh-rate changes but changes
//! whenever a display is added, removed, or replugged into a different
//! connector. Query failures are expressed in-band as sentinel strings that
//! can never collide with a real fingerprint.

use sha2::{Digest, Sha256};

use crate::platform::{DisplayConfigError, DisplaySystem, DisplayTarget};

/// Sentinel returned when the display-config buffer-size query fails.
pub const FINGERPRINT_ERROR_BUFFER: &str = "error_buffer_size";
/// Sentinel returned when the display-config path query fails.
pub const FINGERPRINT_ERROR_QUERY: &str = "error_query_config";
/// Sentinel returned when no active monitors are reported.
pub const FINGERPRINT_NO_MONITORS: &str = "no_monitors";

/// Identity string of one display target.
///
/// `MMMM:PPPP:I` from the EDID manufacturer id, product code, and connector
/// instance when EDID is valid, otherwise the hardware device path behind a
/// `noedid:` prefix.
pub fn monitor_identity(target: &DisplayTarget) -> String {
    if target.edid_valid {
        format!(
            "{:04X}:{:04X}:{:X}",
            target.edid_manufacturer_id, target.edid_product_code, target.connector_instance
        )
    } else {
        format!("noedid:{}", target.device_path)
    }
}

/// Compute the fingerprint of the current monitor set.
pub fn compute(displays: &dyn DisplaySystem) -> String {
    match displays.display_targets() {
        Ok(targets) => fingerprint_of(&targets),
        Err(DisplayConfigError::BufferSize) => FINGERPRINT_ERROR_BUFFER.to_string(),
        Err(DisplayConfigError::QueryFailed) => FINGERPRINT_ERROR_QUERY.to_string(),
    }
}

/// Fingerprint a target list: sort identities, join, hash.
///
/// Sorting makes the fingerprint independent of enumeration order. The
/// digest is truncated to its first 8 bytes and hex-encoded so the result is
/// fixed-width; user-visible abbreviations stay unambiguous.
pub fn fingerprint_of(targets: &[DisplayTarget]) -> String {
    if targets.is_empty() {
        return FINGERPRINT_NO_MONITORS.to_string();
    }
    let mut identities: Vec<String> = targets.iter().map(monitor_identity).collect();
    identities.sort();
    let joined = identities.join("|");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    let hash = hasher.finalize();
    hex::encode(&hash[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::FakeDisplaySystem;

    fn target(mfg: u16, product: u16, instance: u32) -> DisplayTarget {
        DisplayTarget {
            source_device_name: format!("\\\\.\\DISPLAY{}", instance + 1),
            device_path: format!("\\\\?\\DISPLAY#DEL{:04X}#{}", product, instance),
            friendly_name: "DELL U2720Q".to_string(),
            edid_valid: true,
            edid_manufacturer_id: mfg,
            edid_product_code: product,
            connector_instance: instance,
        }
    }

    #[test]
    fn test_identity_format() {
        assert_eq!(monitor_identity(&target(0xABCD, 0x1234, 0)), "ABCD:1234:0");
        assert_eq!(monitor_identity(&target(0x00AC, 0x0001, 10)), "00AC:0001:A");
    }

    #[test]
    fn test_identity_without_edid_uses_device_path() {
        let mut t = target(0, 0, 0);
        t.edid_valid = false;
        assert_eq!(
            monitor_identity(&t),
            format!("noedid:{}", t.device_path)
        );
    }

    #[test]
    fn test_fingerprint_is_order_independent() {
        let a = target(0xABCD, 0x1234, 0);
        let b = target(0x10AC, 0xBEEF, 1);
        let fp1 = fingerprint_of(&[a.clone(), b.clone()]);
        let fp2 = fingerprint_of(&[b, a]);
        assert_eq!(fp1, fp2);
    }

    #[test]
    fn test_fingerprint_is_fixed_width_hex() {
        let fp = fingerprint_of(&[target(0xABCD, 0x1234, 0)]);
        assert_eq!(fp.len(), 16);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_fingerprint_changes_with_connector_instance() {
        let fp1 = fingerprint_of(&[target(0xABCD, 0x1234, 0)]);
        let fp2 = fingerprint_of(&[target(0xABCD, 0x1234, 1)]);
        assert_ne!(fp1, fp2);
    }

    #[test]
    fn test_empty_target_list_is_sentinel() {
        assert_eq!(fingerprint_of(&[]), FINGERPRINT_NO_MONITORS);
    }

    #[test]
    fn test_query_errors_surface_as_sentinels() {
        let sys = FakeDisplaySystem::new(Vec::new(), Err(DisplayConfigError::BufferSize));
        assert_eq!(compute(&sys), FINGERPRINT_ERROR_BUFFER);
        let sys = FakeDisplaySystem::new(Vec::new(), Err(DisplayConfigError::QueryFailed));
        assert_eq!(compute(&sys), FINGERPRINT_ERROR_QUERY);
    }

    #[test]
    fn test_sentinels_never_look_like_fingerprints() {
        for sentinel in [
            FINGERPRINT_ERROR_BUFFER,
            FINGERPRINT_ERROR_QUERY,
            FINGERPRINT_NO_MONITORS,
        ] {
            assert!(sentinel.contains('_'));
            assert_ne!(sentinel.len(), 16);
        }
    }
}
