use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub practiceq_api_key: String,
    pub practiceq_base_url: String,
    pub anthropic_api_key: String,
    pub admin_emails: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            practiceq_api_key: env::var("PRACTICEQ_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("PRACTICEQ_API_KEY not set, using empty value");
                    String::new()
                }),
            practiceq_base_url: env::var("PRACTICEQ_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("PRACTICEQ_BASE_URL not set, using default");
                    "https://intakeq.com/api/v1".to_string()
                }),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("ANTHROPIC_API_KEY not set, using empty value");
                    String::new()
                }),
            admin_emails: env::var("ADMIN_EMAILS")
                .map(|raw| {
                    raw.split(',')
                        .map(|entry| entry.trim().to_lowercase())
                        .filter(|entry| !entry.is_empty())
                        .collect()
                })
                .unwrap_or_else(|_| {
                    warn!("ADMIN_EMAILS not set, admin-only endpoints will reject all callers");
                    Vec::new()
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_practiceq_configured(&self) -> bool {
        !self.practiceq_api_key.is_empty() && !self.practiceq_base_url.is_empty()
    }

    pub fn is_content_drafting_configured(&self) -> bool {
        !self.anthropic_api_key.is_empty()
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.admin_emails.iter().any(|entry| entry == &email)
    }
}
