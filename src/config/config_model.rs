#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub server: Server,
    pub database: Database,
    pub supabase: Supabase,
    pub stripe: Stripe,
    pub kie: Kie,
    pub email: Email,
    pub app: App,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Supabase {
    pub project_url: String,
    pub jwt_secret: String,
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    pub video_bucket: String,
    pub asset_bucket: String,
}

#[derive(Debug, Clone)]
pub struct Stripe {
    pub secret_key: String,
    pub webhook_secret: String,
    pub success_url: String,
    pub cancel_url: String,
    pub price_standard: String,
    pub price_premium: String,
    pub price_biography: String,
}

impl Stripe {
    /// Maps a purchased Stripe price id back to an order tier string.
    pub fn tier_for_price_id(&self, price_id: &str) -> Option<&'static str> {
        if price_id == self.price_standard {
            Some("standard")
        } else if price_id == self.price_premium {
            Some("premium")
        } else if price_id == self.price_biography {
            Some("biography")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct Kie {
    pub api_key: String,
    pub base_url: String,
    pub callback_url: String,
}

#[derive(Debug, Clone)]
pub struct Email {
    pub api_key: String,
    pub from_address: String,
    pub support_inbox: String,
}

#[derive(Debug, Clone)]
pub struct App {
    pub base_url: String,
}
