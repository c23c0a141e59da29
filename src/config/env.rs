use super::AppConfig;

/// Applies `UPNAFESTA_*` environment overrides on top of the file config.
///
/// `lookup` abstracts the environment so tests don't mutate process state.
/// Unparseable numeric values are ignored and the file/default value stays.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("UPNAFESTA_BIND_ADDR") {
        config.server.bind_addr = v;
    }
    if let Some(v) = lookup("UPNAFESTA_PUBLIC_BASE_URL") {
        config.server.public_base_url = v;
    }
    if let Some(v) = lookup("UPNAFESTA_FRONTEND_URL") {
        config.server.frontend_url = v;
    }
    if let Some(v) = lookup("UPNAFESTA_DATABASE_PATH") {
        config.server.database_path = v;
    }
    if let Some(v) = lookup("UPNAFESTA_ADMIN_TOKEN") {
        config.server.admin_token = if v.is_empty() { None } else { Some(v) };
    }
    if let Some(v) = lookup("UPNAFESTA_MAX_UPLOAD_BYTES") {
        if let Ok(n) = v.parse::<usize>() {
            config.server.max_upload_bytes = n;
        }
    }
    if let Some(v) = lookup("UPNAFESTA_HTTP_TIMEOUT_SECONDS") {
        if let Ok(n) = v.parse::<u64>() {
            config.http.timeout_seconds = n;
        }
    }
}
