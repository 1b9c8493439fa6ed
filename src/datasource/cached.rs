//! TTL-caching decorator over any `LeagueDataSource`.

use super::{DataSourceError, LeagueDataSource, PlayerDirectory};
use crate::cache::{CacheStore, Clock, MemoryCache};
use crate::domain::{
    DraftInfo, DraftSelection, LeagueInfo, LeagueUser, LineupAppearance, NflState, Roster,
    Transaction,
};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Time-to-live per upstream resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub league: Duration,
    pub rosters: Duration,
    pub transactions: Duration,
    pub matchups: Duration,
    pub drafts: Duration,
    pub players: Duration,
    pub nfl_state: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            league: Duration::from_secs(60),
            rosters: Duration::from_secs(60),
            transactions: Duration::from_secs(60),
            matchups: Duration::from_secs(300),
            drafts: Duration::from_secs(300),
            players: Duration::from_secs(6 * 3600),
            nfl_state: Duration::from_secs(300),
        }
    }
}

/// Serves repeated reads from memory until their TTL runs out. Errors are not cached.
///
/// Each miss also sweeps expired entries of the same resource, so keys that are
/// never read again (old weeks, earlier leagues) do not pile up.
#[derive(Debug)]
pub struct CachedDataSource {
    inner: Arc<dyn LeagueDataSource>,
    ttls: CacheTtls,
    leagues: MemoryCache<LeagueInfo>,
    rosters: MemoryCache<Vec<Roster>>,
    users: MemoryCache<Vec<LeagueUser>>,
    transactions: MemoryCache<Vec<Transaction>>,
    matchups: MemoryCache<Vec<LineupAppearance>>,
    drafts: MemoryCache<Vec<DraftInfo>>,
    draft_picks: MemoryCache<Vec<DraftSelection>>,
    players: MemoryCache<PlayerDirectory>,
    nfl_state: MemoryCache<NflState>,
}

impl CachedDataSource {
    pub fn new(inner: Arc<dyn LeagueDataSource>, clock: Arc<dyn Clock>, ttls: CacheTtls) -> Self {
        Self {
            inner,
            ttls,
            leagues: MemoryCache::new(clock.clone()),
            rosters: MemoryCache::new(clock.clone()),
            users: MemoryCache::new(clock.clone()),
            transactions: MemoryCache::new(clock.clone()),
            matchups: MemoryCache::new(clock.clone()),
            drafts: MemoryCache::new(clock.clone()),
            draft_picks: MemoryCache::new(clock.clone()),
            players: MemoryCache::new(clock.clone()),
            nfl_state: MemoryCache::new(clock),
        }
    }
}

async fn cached<V, F, Fut>(
    cache: &MemoryCache<V>,
    key: &str,
    ttl: Duration,
    fetch: F,
) -> Result<V, DataSourceError>
where
    V: Clone + Send,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, DataSourceError>>,
{
    if let Some(hit) = cache.get(key) {
        debug!(key = %key, "Upstream cache hit");
        return Ok(hit);
    }
    let value = fetch().await?;
    let purged = cache.purge_expired();
    if purged > 0 {
        debug!(purged, "Dropped expired cache entries");
    }
    cache.set_with_ttl(key, value.clone(), ttl);
    Ok(value)
}

#[async_trait]
impl LeagueDataSource for CachedDataSource {
    async fn fetch_league(&self, league_id: &str) -> Result<LeagueInfo, DataSourceError> {
        cached(&self.leagues, league_id, self.ttls.league, || {
            self.inner.fetch_league(league_id)
        })
        .await
    }

    async fn fetch_rosters(&self, league_id: &str) -> Result<Vec<Roster>, DataSourceError> {
        cached(&self.rosters, league_id, self.ttls.rosters, || {
            self.inner.fetch_rosters(league_id)
        })
        .await
    }

    async fn fetch_users(&self, league_id: &str) -> Result<Vec<LeagueUser>, DataSourceError> {
        cached(&self.users, league_id, self.ttls.rosters, || {
            self.inner.fetch_users(league_id)
        })
        .await
    }

    async fn fetch_transactions(
        &self,
        league_id: &str,
        week: u32,
    ) -> Result<Vec<Transaction>, DataSourceError> {
        let key = format!("{}/{}", league_id, week);
        cached(&self.transactions, &key, self.ttls.transactions, || {
            self.inner.fetch_transactions(league_id, week)
        })
        .await
    }

    async fn fetch_matchups(
        &self,
        league_id: &str,
        week: u32,
    ) -> Result<Vec<LineupAppearance>, DataSourceError> {
        let key = format!("{}/{}", league_id, week);
        cached(&self.matchups, &key, self.ttls.matchups, || {
            self.inner.fetch_matchups(league_id, week)
        })
        .await
    }

    async fn fetch_drafts(&self, league_id: &str) -> Result<Vec<DraftInfo>, DataSourceError> {
        cached(&self.drafts, league_id, self.ttls.drafts, || {
            self.inner.fetch_drafts(league_id)
        })
        .await
    }

    async fn fetch_draft_picks(
        &self,
        draft: &DraftInfo,
    ) -> Result<Vec<DraftSelection>, DataSourceError> {
        cached(&self.draft_picks, &draft.draft_id, self.ttls.drafts, || {
            self.inner.fetch_draft_picks(draft)
        })
        .await
    }

    async fn fetch_players(&self) -> Result<PlayerDirectory, DataSourceError> {
        cached(&self.players, "nfl", self.ttls.players, || {
            self.inner.fetch_players()
        })
        .await
    }

    async fn fetch_nfl_state(&self) -> Result<NflState, DataSourceError> {
        cached(&self.nfl_state, "nfl", self.ttls.nfl_state, || {
            self.inner.fetch_nfl_state()
        })
        .await
    }
}
