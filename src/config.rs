use std::env;
use std::path::PathBuf;

#[derive(Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub session_secret: String,
    pub media_root: PathBuf,
    pub bootstrap_admin_username: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let session_secret =
            env::var("SESSION_SECRET").map_err(|_| "SESSION_SECRET must be set".to_string())?;

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

        let media_root = env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./media"));

        let bootstrap_admin_username = env::var("BOOTSTRAP_ADMIN_USERNAME").ok();
        let bootstrap_admin_password = env::var("BOOTSTRAP_ADMIN_PASSWORD").ok();

        Ok(ServerConfig {
            database_url,
            bind_addr,
            session_secret,
            media_root,
            bootstrap_admin_username,
            bootstrap_admin_password,
        })
    }
}
