//! Extension-to-handler resolution.
//!
//! Maps a file extension to the executable registered to open it, walking
//! the registry the way the shell does: per-user choice first, then the
//! machine-wide progid, then the progid's `shell\open\command`. The command
//! line's first token is extracted, environment references expanded, and the
//! result lowercased. Lookups are cached for the process lifetime.
//!
//! A static extension table also maps document types straight to a canonical
//! process name; this bypasses handler resolution entirely and is what makes
//! Office click-to-run installs (whose registered handler is a wrapper
//! executable) resolvable at all.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::platform::RegistryView;

/// Process-lifetime cache of per-extension handler lookups.
#[derive(Default)]
pub struct HandlerCache {
    cache: Mutex<HashMap<String, Option<String>>>,
}

impl HandlerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the handler executable for an extension (with leading dot).
    ///
    /// Returns a lowercased, env-expanded executable path, or `None` when no
    /// association exists. Results, including misses, are cached.
    pub fn handler_for_extension(
        &self,
        registry: &dyn RegistryView,
        extension: &str,
    ) -> Option<String> {
        let key = extension.to_lowercase();
        if let Some(cached) = self.cache.lock().unwrap().get(&key) {
            return cached.clone();
        }
        let resolved = resolve_handler(registry, &key);
        self.cache
            .lock()
            .unwrap()
            .insert(key, resolved.clone());
        resolved
    }
}

fn resolve_handler(registry: &dyn RegistryView, extension: &str) -> Option<String> {
    let progid = registry
        .user_choice_progid(extension)
        .or_else(|| registry.machine_progid(extension))?;
    let command = registry.open_command(&progid)?;
    let token = first_command_token(&command)?;
    Some(expand_env_vars(&token).to_lowercase())
}

/// Extract the executable token from a `shell\open\command` line.
///
/// Quoted commands take everything inside the quotes; unquoted commands take
/// everything up to the first whitespace.
pub fn first_command_token(command: &str) -> Option<String> {
    let trimmed = command.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(rest) = trimmed.strip_prefix('"') {
        let end = rest.find('"')?;
        let token = &rest[..end];
        return (!token.is_empty()).then(|| token.to_string());
    }
    let token = trimmed.split_whitespace().next()?;
    Some(token.to_string())
}

/// Expand `%NAME%` references against the process environment.
///
/// Unknown variables are kept literally, matching the OS expansion behavior
/// closely enough for handler paths.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) => {
                let name = &after[..end];
                match std::env::var(name) {
                    Ok(val) => out.push_str(&val),
                    Err(_) => {
                        out.push('%');
                        out.push_str(name);
                        out.push('%');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Canonical process name for document types whose handler registration is
/// unreliable. Covers the Office apps, Acrobat, Notepad, and Notepad++.
pub fn process_name_for_extension(extension: &str) -> Option<&'static str> {
    let ext = extension.trim_start_matches('.').to_lowercase();
    let name = match ext.as_str() {
        "doc" | "docx" | "docm" | "rtf" | "odt" => "winword",
        "xls" | "xlsx" | "xlsm" | "ods" => "excel",
        "ppt" | "pptx" | "pptm" | "odp" => "powerpnt",
        "pdf" => "acrord32",
        "txt" => "notepad",
        "log" | "md" | "ini" | "cfg" => "notepad++",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::FakeRegistry;

    fn registry() -> FakeRegistry {
        let mut r = FakeRegistry::new();
        r.machine_progids
            .insert(".txt".to_string(), "txtfile".to_string());
        r.open_commands.insert(
            "txtfile".to_string(),
            "\"C:\\Windows\\System32\\NOTEPAD.EXE\" %1".to_string(),
        );
        r
    }

    #[test]
    fn test_machine_progid_resolution() {
        let cache = HandlerCache::new();
        let handler = cache.handler_for_extension(&registry(), ".txt");
        assert_eq!(
            handler.as_deref(),
            Some("c:\\windows\\system32\\notepad.exe")
        );
    }

    #[test]
    fn test_user_choice_beats_machine_progid() {
        let mut r = registry();
        r.user_choices
            .insert(".txt".to_string(), "Applications\\sublime.exe".to_string());
        r.open_commands.insert(
            "Applications\\sublime.exe".to_string(),
            "C:\\Tools\\Sublime\\sublime_text.exe \"%1\"".to_string(),
        );

        let cache = HandlerCache::new();
        let handler = cache.handler_for_extension(&r, ".txt");
        assert_eq!(
            handler.as_deref(),
            Some("c:\\tools\\sublime\\sublime_text.exe")
        );
    }

    #[test]
    fn test_missing_association_is_cached_miss() {
        let cache = HandlerCache::new();
        let r = FakeRegistry::new();
        assert_eq!(cache.handler_for_extension(&r, ".xyz"), None);
        // Second query hits the cache; still a miss.
        assert_eq!(cache.handler_for_extension(&r, ".XYZ"), None);
    }

    #[test]
    fn test_first_command_token_quoted_and_unquoted() {
        assert_eq!(
            first_command_token("\"C:\\Program Files\\App\\app.exe\" \"%1\"").as_deref(),
            Some("C:\\Program Files\\App\\app.exe")
        );
        assert_eq!(
            first_command_token("C:\\apps\\tool.exe %1").as_deref(),
            Some("C:\\apps\\tool.exe")
        );
        assert_eq!(first_command_token(""), None);
        assert_eq!(first_command_token("\"\""), None);
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("WA_TEST_ROOT", "C:\\Apps");
        assert_eq!(
            expand_env_vars("%WA_TEST_ROOT%\\tool.exe"),
            "C:\\Apps\\tool.exe"
        );
        assert_eq!(
            expand_env_vars("%WA_NOT_SET_ANYWHERE%\\x"),
            "%WA_NOT_SET_ANYWHERE%\\x"
        );
        assert_eq!(expand_env_vars("plain"), "plain");
        assert_eq!(expand_env_vars("50%"), "50%");
    }

    #[test]
    fn test_process_table_covers_office_and_editors() {
        assert_eq!(process_name_for_extension(".docx"), Some("winword"));
        assert_eq!(process_name_for_extension("xlsx"), Some("excel"));
        assert_eq!(process_name_for_extension(".PPTX"), Some("powerpnt"));
        assert_eq!(process_name_for_extension(".pdf"), Some("acrord32"));
        assert_eq!(process_name_for_extension(".txt"), Some("notepad"));
        assert_eq!(process_name_for_extension(".md"), Some("notepad++"));
        assert_eq!(process_name_for_extension(".exe"), None);
    }
}
