use std::{env, str::FromStr, time::Duration};

use crate::order_status::{DeletePolicy, StatusTransitions};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub payment: PaymentConfig,
    pub orders: OrderPolicy,
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub api_url: Option<String>,
    pub access_token: Option<String>,
    pub timeout: Duration,
}

/// Rules the order store applies to status changes and deletions.
#[derive(Debug, Clone, Default)]
pub struct OrderPolicy {
    pub transitions: StatusTransitions,
    pub delete_policy: DeletePolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let payment = PaymentConfig {
            api_url: non_empty_var("PAYMENT_API_URL"),
            access_token: non_empty_var("PAYMENT_ACCESS_TOKEN"),
            timeout: Duration::from_secs(
                env::var("PAYMENT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(10),
            ),
        };

        let transitions = match non_empty_var("ORDER_STATUS_TRANSITIONS") {
            Some(raw) => StatusTransitions::from_str(&raw)?,
            None => StatusTransitions::default(),
        };
        let delete_policy = match non_empty_var("ORDER_DELETE_POLICY") {
            Some(raw) => DeletePolicy::from_str(&raw)?,
            None => DeletePolicy::default(),
        };

        Ok(Self {
            port,
            database_url,
            host,
            payment,
            orders: OrderPolicy {
                transitions,
                delete_policy,
            },
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
