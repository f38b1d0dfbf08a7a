//! Account sessions
//!
//! Binds one credential to a region as an SDK configuration. Construction
//! performs no remote calls; bad credentials only surface when the session's
//! single query runs.

use super::credentials::AccountCredential;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_types::region::Region;

/// One account bound to a region, ready to issue exactly one query.
///
/// Sessions share nothing with each other; each owns its own configuration
/// and hands out clients on demand.
#[derive(Debug, Clone)]
pub struct AccountSession {
    /// Account or profile name, used only for diagnostics.
    pub account: String,
    config: aws_config::SdkConfig,
}

/// Build a session for one account.
///
/// `endpoint_url` overrides the service endpoint, for localstack-style
/// setups and tests. The credential is consumed; it lives on only inside
/// the session's static provider.
pub async fn make_session(
    region: &str,
    credential: AccountCredential,
    endpoint_url: Option<&str>,
) -> AccountSession {
    let account = credential.name;
    let creds = Credentials::from_keys(
        credential.access_key_id,
        credential.secret_access_key,
        credential.session_token,
    );

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .credentials_provider(creds);
    if let Some(url) = endpoint_url {
        loader = loader.endpoint_url(url);
    }
    let config = loader.load().await;

    AccountSession { account, config }
}

impl AccountSession {
    /// EC2 client for this account.
    pub fn ec2(&self) -> aws_sdk_ec2::Client {
        aws_sdk_ec2::Client::new(&self.config)
    }

    /// Elastic Beanstalk client for this account.
    pub fn beanstalk(&self) -> aws_sdk_elasticbeanstalk::Client {
        aws_sdk_elasticbeanstalk::Client::new(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> AccountCredential {
        AccountCredential {
            name: "test-account".to_string(),
            access_key_id: "AKIATEST".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
        }
    }

    #[tokio::test]
    async fn session_carries_the_account_name() {
        let session = make_session("eu-west-1", credential(), None).await;
        assert_eq!(session.account, "test-account");
    }

    #[tokio::test]
    async fn clients_can_be_built_without_network_access() {
        let session = make_session("us-east-1", credential(), Some("http://127.0.0.1:9")).await;
        let _ = session.ec2();
        let _ = session.beanstalk();
    }
}
