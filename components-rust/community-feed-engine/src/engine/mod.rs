use crate::api::{FeedApi, HttpFeedApi};
use crate::composer::Composer;
use crate::config::ClientConfig;
use crate::coordinator::InteractionCoordinator;
use crate::disclaimer::DisclaimerGate;
use crate::error::Result;
use crate::feed::{FeedStore, RefreshReport};
use crate::session::SessionContext;
use crate::social_graph::SocialGraph;
use crate::storage::{FileStore, KeyValueStore, MemoryStore};
use chrono::NaiveDate;
use common_lib::Token;
use std::rc::Rc;

#[derive(Debug)]
pub struct BootstrapReport {
    pub feed: Result<RefreshReport>,
    pub suggestions: Result<()>,
}

/// All engine components wired around one session.
pub struct FeedEngine {
    store: Rc<dyn KeyValueStore>,
    pub session: SessionContext,
    pub feed: FeedStore,
    pub social: SocialGraph,
    pub composer: Composer,
    pub coordinator: InteractionCoordinator,
    pub disclaimer: Option<DisclaimerGate>,
}

impl FeedEngine {
    pub fn new(api: Rc<dyn FeedApi>, store: Rc<dyn KeyValueStore>, config: &ClientConfig) -> Self {
        let session = SessionContext::new(api.clone(), store.clone());
        let feed = FeedStore::new(api.clone(), session.clone());
        let social = SocialGraph::new(api.clone(), session.clone(), config.suggestion_count);
        let composer = Composer::new(api, session.clone(), feed.clone());
        let coordinator = InteractionCoordinator::new(session.clone(), feed.clone(), social.clone());

        FeedEngine {
            store,
            session,
            feed,
            social,
            composer,
            coordinator,
            disclaimer: None,
        }
    }

    /// HTTP transport plus file-backed state when `state_path` is set.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let api: Rc<dyn FeedApi> = Rc::new(HttpFeedApi::new(config)?);
        let store: Rc<dyn KeyValueStore> = match &config.state_path {
            Some(path) => Rc::new(FileStore::new(path.clone())),
            None => Rc::new(MemoryStore::new()),
        };
        Ok(Self::new(api, store, config))
    }

    /// Restores the session, arms the disclaimer for `today`, then bootstraps
    /// the feed and suggestions concurrently.
    pub async fn mount(&mut self, today: NaiveDate) -> BootstrapReport {
        self.session.restore().await;
        self.disclaimer = Some(DisclaimerGate::initialize(self.store.as_ref(), today));
        self.bootstrap().await
    }

    /// Swaps the session token and re-bootstraps both stores.
    pub async fn set_token(&self, token: Option<Token>) -> BootstrapReport {
        self.session.set_token(token).await;
        self.bootstrap().await
    }

    pub async fn logout(&self) -> BootstrapReport {
        self.set_token(None).await
    }

    pub async fn bootstrap(&self) -> BootstrapReport {
        let (feed, suggestions) =
            futures::join!(self.feed.refresh(), self.social.load_suggestions());
        BootstrapReport { feed, suggestions }
    }

    pub fn dismiss_disclaimer(&mut self) {
        if let Some(gate) = self.disclaimer.as_mut() {
            gate.dismiss();
        }
    }

    /// Results still in flight are dropped when they arrive.
    pub fn teardown(&self) {
        self.feed.teardown();
        self.social.teardown();
    }
}
