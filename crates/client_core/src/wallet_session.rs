use std::sync::Arc;

use shared::{
    domain::Identity,
    error::{ProviderError, SessionError},
};
use tracing::{info, warn};

use crate::WalletProvider;

/// Connection to the signing agent plus the account it authorized.
pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    identity: Option<Identity>,
}

impl WalletSession {
    /// `provider` is `None` when capability probing found no wallet.
    pub fn new(provider: Option<Arc<dyn WalletProvider>>) -> Self {
        Self {
            provider,
            identity: None,
        }
    }

    pub async fn connect(&mut self) -> Result<Identity, SessionError> {
        let provider = self
            .provider
            .clone()
            .ok_or(SessionError::NoProviderAvailable)?;
        let identity = authorize(provider.as_ref()).await?;
        info!(%identity, "wallet session connected");
        self.identity = Some(identity);
        Ok(identity)
    }

    pub fn active_identity(&self) -> Result<Identity, SessionError> {
        self.identity.ok_or(SessionError::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.identity.is_some()
    }

    /// The signing capability registered by a successful `connect()`.
    pub fn signer(&self) -> Result<Arc<dyn WalletProvider>, SessionError> {
        match (&self.provider, self.identity) {
            (Some(provider), Some(_)) => Ok(provider.clone()),
            _ => Err(SessionError::NotConnected),
        }
    }

    /// Asks the wallet again which account is active. A switched account is
    /// adopted rather than left stale. Only a wallet that no longer authorizes
    /// any account ends the session; an unreachable wallet keeps the current
    /// identity so the next attempt can succeed.
    pub async fn refresh_identity(&mut self) -> Result<Identity, SessionError> {
        let previous = self.active_identity()?;
        let provider = self.signer()?;
        match authorize(provider.as_ref()).await {
            Ok(current) => {
                if current != previous {
                    warn!(%previous, %current, "wallet account changed; re-authorized session");
                }
                self.identity = Some(current);
                Ok(current)
            }
            Err(SessionError::AuthorizationDenied) => {
                warn!(%previous, "wallet no longer authorizes this session");
                self.identity = None;
                Err(SessionError::AuthorizationDenied)
            }
            Err(err) => {
                warn!(%previous, error = %err, "could not confirm wallet account; keeping session");
                Err(err)
            }
        }
    }
}

async fn authorize(provider: &dyn WalletProvider) -> Result<Identity, SessionError> {
    let accounts = provider
        .request_accounts()
        .await
        .map_err(classify_connect_error)?;
    accounts
        .first()
        .copied()
        .map(Identity)
        .ok_or(SessionError::AuthorizationDenied)
}

fn classify_connect_error(err: ProviderError) -> SessionError {
    match err {
        ProviderError::Unavailable(reason) => {
            warn!(%reason, "wallet provider unreachable");
            SessionError::NoProviderAvailable
        }
        ProviderError::Transport(reason) => {
            warn!(%reason, "wallet provider transport failure");
            SessionError::NoProviderAvailable
        }
        ProviderError::Rejected | ProviderError::Unauthorized => SessionError::AuthorizationDenied,
        ProviderError::Rpc { code, message } => {
            warn!(code, %message, "wallet refused account request");
            SessionError::AuthorizationDenied
        }
    }
}

#[cfg(test)]
#[path = "tests/wallet_session_tests.rs"]
mod tests;
