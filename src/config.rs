use std::env;

/// Runtime configuration, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub public_base_url: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    /// Seconds between dispatch passes.
    pub dispatch_interval_secs: u64,
    /// When set, a mailing whose last attempt failed becomes eligible again
    /// after this many seconds instead of waiting out the full periodicity
    /// window. Off by default: a failed attempt throttles like a successful one.
    pub retry_failed_after_secs: Option<i64>,
}

impl Config {
    pub fn from_env() -> Self {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://mailpost.db".into());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3030);
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port));
        let smtp_host = env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".into());
        let smtp_port = env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(587);
        let smtp_username = env::var("SMTP_USERNAME").ok();
        let smtp_password = env::var("SMTP_PASSWORD").ok();
        let smtp_from =
            env::var("SMTP_FROM").unwrap_or_else(|_| "no-reply@mailpost.local".into());
        let dispatch_interval_secs = env::var("DISPATCH_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);
        let retry_failed_after_secs = env::var("RETRY_FAILED_AFTER_SECS")
            .ok()
            .and_then(|v| v.parse().ok());

        Config {
            database_url,
            port,
            public_base_url,
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            smtp_from,
            dispatch_interval_secs,
            retry_failed_after_secs,
        }
    }
}
