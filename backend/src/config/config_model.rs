use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub stripe: Stripe,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
    /// Externally reachable origin, used to build payment redirect URLs.
    pub public_base_url: String,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct Stripe {
    pub secret_key: String,
    pub currency: String,
    pub product_name: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct UserSecret {
    pub secret: String,
}
