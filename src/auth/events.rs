use crate::observability::MetricsRecorder;

/// Authentication events worth an audit line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    Register,
    Login,
    Logout,
}

impl AuthEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthEvent::Register => "register",
            AuthEvent::Login => "login",
            AuthEvent::Logout => "logout",
        }
    }
}

/// Emit a structured auth event and count it
pub fn log_auth_event(event: AuthEvent, email: &str, success: bool, ip: Option<&str>) {
    let outcome = if success { "success" } else { "failure" };
    let ip = ip.unwrap_or("unknown");

    if success {
        tracing::info!(event = event.as_str(), email = %email, ip = %ip, "Auth event succeeded");
    } else {
        tracing::warn!(event = event.as_str(), email = %email, ip = %ip, "Auth event failed");
    }

    MetricsRecorder::record_auth_event(event.as_str(), outcome);
}
