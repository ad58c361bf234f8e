//! Access policy filter — optional allow-list on sender handles.

/// Check a sender against the allow-list.
/// Returns `None` if allowed, `Some(reason)` if denied.
pub(super) fn deny_reason(allowed_users: &[String], handle: Option<&str>) -> Option<String> {
    if allowed_users.is_empty() {
        // No list configured = allow everyone.
        return None;
    }

    let Some(handle) = handle.map(str::trim).filter(|h| !h.is_empty()) else {
        return Some("sender has no handle".to_string());
    };

    if allowed_users
        .iter()
        .any(|u| u.trim().eq_ignore_ascii_case(handle))
    {
        None
    } else {
        Some(format!("handle '{handle}' not in allow-list"))
    }
}
