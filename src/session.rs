//! Application session
//!
//! Wires the picker to the presenter and owns the credential lifecycle:
//! loaded at startup, replaced on submission, removed on reset.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{info, warn};

use crate::analysis::{AnalysisProvider, MockAnalysisProvider, PerplexityClient};
use crate::catalog::{Stock, StockCatalog};
use crate::config::Config;
use crate::credential::{Credential, CredentialStore};
use crate::picker::StockPicker;
use crate::presenter::{Presenter, PresenterView, ProgressClock, SelectionTicket};
use crate::Result;

type SharedCredential = Arc<RwLock<Option<Credential>>>;

pub struct Session {
    picker: Mutex<StockPicker>,
    presenter: Arc<Presenter>,
    credential: SharedCredential,
    store: CredentialStore,
}

impl Session {
    /// Build the provider from config and load the credential.
    /// A key from the environment wins over the stored one.
    pub async fn start(config: &Config) -> Result<Arc<Self>> {
        let provider: Arc<dyn AnalysisProvider> = if config.offline {
            info!("Offline mode: using canned analyses");
            Arc::new(MockAnalysisProvider)
        } else {
            Arc::new(PerplexityClient::from_config(config)?)
        };

        let store = CredentialStore::new(&config.credential_file);
        let credential = match config.api_key.as_deref().map(Credential::new) {
            Some(Ok(credential)) => {
                info!(fingerprint = %credential.fingerprint(), "Using API key from environment");
                Some(credential)
            }
            _ => store.load().await?,
        };

        Ok(Self::new(
            provider,
            store,
            credential,
            ProgressClock::new(config.progress_duration),
        ))
    }

    pub fn new(
        provider: Arc<dyn AnalysisProvider>,
        store: CredentialStore,
        credential: Option<Credential>,
        progress: ProgressClock,
    ) -> Arc<Self> {
        let presenter = Arc::new(Presenter::with_progress(provider, progress));
        let credential: SharedCredential = Arc::new(RwLock::new(credential));

        let on_select = {
            let presenter = presenter.clone();
            let credential = credential.clone();
            move |stock: Stock| {
                // begin runs here, in commit order; only the fetch is deferred
                let ticket = presenter.begin(stock);
                let credential = read_credential(&credential);
                let presenter = presenter.clone();
                tokio::spawn(async move {
                    presenter.resolve(ticket, credential).await;
                });
            }
        };

        Arc::new(Self {
            picker: Mutex::new(StockPicker::new(StockCatalog::popular(), on_select)),
            presenter,
            credential,
            store,
        })
    }

    fn picker(&self) -> MutexGuard<'_, StockPicker> {
        self.picker.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn presenter(&self) -> &Arc<Presenter> {
        &self.presenter
    }

    /// Picker search, catalog order
    pub fn search(&self, query: &str) -> Vec<Stock> {
        let mut picker = self.picker();
        picker.set_query(query);
        picker.results().into_iter().cloned().collect()
    }

    pub fn selected(&self) -> Option<Stock> {
        self.picker().selected().cloned()
    }

    /// Commit a selection; the analysis runs in the background.
    /// Must be called from within a Tokio runtime.
    pub fn select(&self, symbol: &str) -> Result<SelectionTicket> {
        // the picker lock serializes selections, so the generation read here
        // is the one begun by this commit
        let mut picker = self.picker();
        let stock = picker.commit(symbol)?;
        Ok(SelectionTicket {
            generation: self.presenter.generation(),
            stock,
        })
    }

    pub fn view(&self) -> PresenterView {
        self.presenter.snapshot()
    }

    pub fn credential(&self) -> Option<Credential> {
        read_credential(&self.credential)
    }

    /// Validate, persist and activate a user-entered key.
    /// Blank input is rejected and nothing is stored.
    pub async fn submit_credential(&self, raw: &str) -> Result<Credential> {
        let credential = Credential::new(raw).map_err(|e| {
            warn!("Rejected empty API key");
            e
        })?;

        self.store.save(&credential).await?;
        *self
            .credential
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(credential.clone());

        Ok(credential)
    }

    /// Forget the key, both in memory and on disk
    pub async fn reset_credential(&self) -> Result<()> {
        self.store.clear().await?;
        *self
            .credential
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}

fn read_credential(credential: &SharedCredential) -> Option<Credential> {
    credential
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}
