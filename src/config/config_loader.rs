use anyhow::{Ok, Result};

use super::config_model::{App, Database, DotEnvyConfig, Email, Kie, Server, Stripe, Supabase};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: std::env::var("SERVER_PORT")
            .expect("SERVER_PORT is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let project_url =
        std::env::var("SUPABASE_PROJECT_URL").expect("SUPABASE_PROJECT_URL is invalid");

    let supabase = Supabase {
        jwt_secret: std::env::var("SUPABASE_JWT_SECRET").expect("SUPABASE_JWT_SECRET is invalid"),
        s3_endpoint: std::env::var("SUPABASE_S3_ENDPOINT").unwrap_or_else(|_| {
            format!("{}/storage/v1/s3", project_url.trim_end_matches('/'))
        }),
        s3_region: std::env::var("SUPABASE_S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        s3_access_key: std::env::var("SUPABASE_S3_ACCESS_KEY_ID")
            .expect("SUPABASE_S3_ACCESS_KEY_ID is invalid"),
        s3_secret_key: std::env::var("SUPABASE_S3_SECRET_ACCESS_KEY")
            .expect("SUPABASE_S3_SECRET_ACCESS_KEY is invalid"),
        video_bucket: std::env::var("SUPABASE_VIDEO_BUCKET")
            .unwrap_or_else(|_| "gift-videos".to_string()),
        asset_bucket: std::env::var("SUPABASE_ASSET_BUCKET")
            .unwrap_or_else(|_| "order-assets".to_string()),
        project_url,
    };

    let stripe = Stripe {
        secret_key: std::env::var("STRIPE_SECRET_KEY").expect("STRIPE_SECRET_KEY is invalid"),
        webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET")
            .expect("STRIPE_WEBHOOK_SECRET is invalid"),
        success_url: std::env::var("STRIPE_SUCCESS_URL").expect("STRIPE_SUCCESS_URL is invalid"),
        cancel_url: std::env::var("STRIPE_CANCEL_URL").expect("STRIPE_CANCEL_URL is invalid"),
        price_standard: std::env::var("STRIPE_PRICE_STANDARD").unwrap_or_default(),
        price_premium: std::env::var("STRIPE_PRICE_PREMIUM").unwrap_or_default(),
        price_biography: std::env::var("STRIPE_PRICE_BIOGRAPHY").unwrap_or_default(),
    };

    let kie = Kie {
        api_key: std::env::var("KIE_API_KEY").expect("KIE_API_KEY is invalid"),
        base_url: std::env::var("KIE_BASE_URL")
            .unwrap_or_else(|_| "https://api.kie.ai".to_string()),
        callback_url: std::env::var("KIE_CALLBACK_URL").expect("KIE_CALLBACK_URL is invalid"),
    };

    let email = Email {
        api_key: std::env::var("RESEND_API_KEY").expect("RESEND_API_KEY is invalid"),
        from_address: std::env::var("EMAIL_FROM_ADDRESS").expect("EMAIL_FROM_ADDRESS is invalid"),
        support_inbox: std::env::var("SUPPORT_INBOX_ADDRESS")
            .expect("SUPPORT_INBOX_ADDRESS is invalid"),
    };

    let app = App {
        base_url: std::env::var("APP_BASE_URL").expect("APP_BASE_URL is invalid"),
    };

    Ok(DotEnvyConfig {
        server,
        database,
        supabase,
        stripe,
        kie,
        email,
        app,
    })
}

pub fn get_supabase_jwt_secret() -> Result<String> {
    dotenvy::dotenv().ok();

    Ok(std::env::var("SUPABASE_JWT_SECRET").expect("SUPABASE_JWT_SECRET is invalid"))
}
