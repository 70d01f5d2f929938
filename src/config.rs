#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    // Escrow collaborator configuration
    pub escrow_base_url: String,
    pub escrow_api_key: String,
    pub escrow_timeout_secs: u64,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE").expect("JWT_MAXAGE must be set");

        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8000);

        // Escrow collaborator configuration (with defaults)
        let escrow_base_url = std::env::var("ESCROW_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:9100".to_string());
        let escrow_api_key =
            std::env::var("ESCROW_API_KEY").unwrap_or_else(|_| "test_escrow_key".to_string());
        let escrow_timeout_secs = std::env::var("ESCROW_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(10);

        Config {
            database_url,
            jwt_secret,
            jwt_maxage: jwt_maxage.parse::<i64>().unwrap(),
            port,
            escrow_base_url,
            escrow_api_key,
            escrow_timeout_secs,
        }
    }
}
