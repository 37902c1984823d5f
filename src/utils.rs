use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

/// Plain prefix match on a namespace name.
pub fn is_target_namespace(namespace: &str, prefix: &str) -> bool {
    namespace.starts_with(prefix)
}

/// Convert a Kubernetes `Time` into a chrono timestamp.
pub fn time_to_utc(time: &Time) -> Option<chrono::DateTime<chrono::Utc>> {
    // The inner type of `Time` changes between k8s-openapi releases; the wire form is RFC 3339 in all of them.
    let value = serde_json::to_value(time).ok()?;
    let raw = value.as_str()?;
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&chrono::Utc))
}

/// Render a latency as a short human string, e.g. `1.250s` or `3m05.100s`.
pub fn format_latency(latency: chrono::TimeDelta) -> String {
    let total_ms = latency.num_milliseconds();
    let sign = if total_ms < 0 { "-" } else { "" };
    let total_ms = total_ms.unsigned_abs();
    let secs = total_ms / 1000;
    let ms = total_ms % 1000;
    if secs < 60 {
        format!("{}{}.{:03}s", sign, secs, ms)
    } else if secs < 3600 {
        format!("{}{}m{:02}.{:03}s", sign, secs / 60, secs % 60, ms)
    } else {
        format!(
            "{}{}h{:02}m{:02}.{:03}s",
            sign,
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60,
            ms
        )
    }
}
