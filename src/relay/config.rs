use clap::Parser;

use super::contacts::{INTERCOM_USERS_URL, IntercomClient};
use super::tickets::{ZENDESK_TICKETS_URL, ZendeskClient};
use super::Relay;

pub const DEFAULT_PORT: u16 = 3000;
/// Consecutive ports tried, starting at the configured one, before giving up.
pub const PORT_ATTEMPTS: u16 = 10;

/// Relay settings. Every flag can also come from the environment (or `.env`).
#[derive(Debug, Clone, Parser)]
#[command(name = "contact-relay", about = "Forwards contact form submissions to Intercom and Zendesk")]
pub struct RelayConfig {
    #[arg(long, env = "RELAY_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "RELAY_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Intercom access token.
    #[arg(long, env = "INTERCOM_AT", hide_env_values = true)]
    pub intercom_token: String,

    /// Zendesk API token.
    #[arg(long, env = "ZENDESK_TOKEN", hide_env_values = true)]
    pub zendesk_token: String,

    /// Zendesk agent the API token belongs to.
    #[arg(long, env = "ZENDESK_AGENT_EMAIL")]
    pub zendesk_agent_email: String,

    #[arg(long, env = "CONTACTS_API_URL", default_value = INTERCOM_USERS_URL)]
    pub contacts_url: String,

    #[arg(long, env = "TICKETS_API_URL", default_value = ZENDESK_TICKETS_URL)]
    pub tickets_url: String,
}

impl RelayConfig {
    pub fn build_relay(&self, client: reqwest::Client) -> Relay<IntercomClient, ZendeskClient> {
        Relay::new(
            IntercomClient::new(client.clone(), &self.contacts_url, &self.intercom_token),
            ZendeskClient::new(
                client,
                &self.tickets_url,
                &self.zendesk_agent_email,
                &self.zendesk_token,
            ),
        )
    }
}
