use url::Url;

/// Validates a site name: non-empty once surrounding whitespace is removed
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("site name cannot be empty".to_string());
    }
    Ok(())
}

/// Validates a site URL: must parse, use http or https, and name a host
pub fn validate_site_url(url: &str) -> Result<(), String> {
    if url.is_empty() {
        return Err("site url cannot be empty".to_string());
    }

    let parsed = Url::parse(url).map_err(|e| format!("invalid site url '{}': {}", url, e))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(format!(
                "site url '{}' must use http or https, got '{}'",
                url, other
            ))
        }
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(format!("site url '{}' has no host", url));
    }

    Ok(())
}
