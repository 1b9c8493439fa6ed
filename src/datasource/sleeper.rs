//! Sleeper read API client implementation.

use super::{DataSourceError, LeagueDataSource, PlayerDirectory};
use crate::domain::{
    DraftInfo, DraftPickTransfer, DraftSelection, LeagueInfo, LeagueUser, LineupAppearance,
    NflState, PlayerId, PlayerInfo, Position, Roster, RosterId, Season, TimeMs, Transaction,
    TransactionKind, TransactionStatus,
};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Sleeper data source using the public read API.
#[derive(Debug, Clone)]
pub struct SleeperDataSource {
    client: Client,
    base_url: String,
    max_retry: Duration,
}

impl SleeperDataSource {
    pub fn new(base_url: String, max_retry: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retry,
        }
    }

    /// Create with the default Sleeper API URL.
    pub fn default_url() -> Self {
        Self::new(
            "https://api.sleeper.app/v1".to_string(),
            Duration::from_secs(5),
        )
    }

    async fn get_json(&self, path: &str) -> Result<Value, DataSourceError> {
        let url = format!("{}{}", self.base_url, path);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.max_retry),
            ..Default::default()
        };

        let value = retry(backoff, || async {
            let response = self.client.get(&url).send().await.map_err(|e| {
                backoff::Error::transient(DataSourceError::NetworkError(e.to_string()))
            })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(DataSourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if status == 404 {
                return Err(backoff::Error::permanent(DataSourceError::NotFound(
                    path.to_string(),
                )));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| backoff::Error::permanent(DataSourceError::ParseError(e.to_string())))
        })
        .await?;

        // Sleeper answers unknown ids with 200 and a `null` body.
        if value.is_null() {
            return Err(DataSourceError::NotFound(path.to_string()));
        }
        Ok(value)
    }

    async fn get_array(&self, path: &str) -> Result<Vec<Value>, DataSourceError> {
        match self.get_json(path).await? {
            Value::Array(items) => Ok(items),
            _ => Err(DataSourceError::ParseError(format!(
                "Expected array response from {}",
                path
            ))),
        }
    }
}

/// Parse each element, skipping (and logging) malformed ones.
fn parse_each<T>(
    items: &[Value],
    what: &str,
    parse: impl Fn(&Value) -> Result<T, DataSourceError>,
) -> Vec<T> {
    items
        .iter()
        .filter_map(|item| match parse(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Failed to parse {}: {}", what, e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl LeagueDataSource for SleeperDataSource {
    async fn fetch_league(&self, league_id: &str) -> Result<LeagueInfo, DataSourceError> {
        debug!("Fetching league {}", league_id);
        let json = self.get_json(&format!("/league/{}", league_id)).await?;
        parse_league(&json)
    }

    async fn fetch_rosters(&self, league_id: &str) -> Result<Vec<Roster>, DataSourceError> {
        debug!("Fetching rosters for league {}", league_id);
        let items = self
            .get_array(&format!("/league/{}/rosters", league_id))
            .await?;
        Ok(parse_each(&items, "roster", parse_roster))
    }

    async fn fetch_users(&self, league_id: &str) -> Result<Vec<LeagueUser>, DataSourceError> {
        debug!("Fetching users for league {}", league_id);
        let items = self
            .get_array(&format!("/league/{}/users", league_id))
            .await?;
        Ok(parse_each(&items, "user", parse_user))
    }

    async fn fetch_transactions(
        &self,
        league_id: &str,
        week: u32,
    ) -> Result<Vec<Transaction>, DataSourceError> {
        debug!("Fetching transactions for league {} week {}", league_id, week);
        let items = self
            .get_array(&format!("/league/{}/transactions/{}", league_id, week))
            .await?;
        Ok(parse_each(&items, "transaction", |v| {
            parse_transaction(v, week)
        }))
    }

    async fn fetch_matchups(
        &self,
        league_id: &str,
        week: u32,
    ) -> Result<Vec<LineupAppearance>, DataSourceError> {
        debug!("Fetching matchups for league {} week {}", league_id, week);
        let items = self
            .get_array(&format!("/league/{}/matchups/{}", league_id, week))
            .await?;
        Ok(parse_each(&items, "matchup", |v| parse_matchup(v, week)))
    }

    async fn fetch_drafts(&self, league_id: &str) -> Result<Vec<DraftInfo>, DataSourceError> {
        debug!("Fetching drafts for league {}", league_id);
        let items = self
            .get_array(&format!("/league/{}/drafts", league_id))
            .await?;
        Ok(parse_each(&items, "draft", parse_draft))
    }

    async fn fetch_draft_picks(
        &self,
        draft: &DraftInfo,
    ) -> Result<Vec<DraftSelection>, DataSourceError> {
        debug!("Fetching picks for draft {}", draft.draft_id);
        let items = self
            .get_array(&format!("/draft/{}/picks", draft.draft_id))
            .await?;
        Ok(parse_each(&items, "draft pick", |v| {
            parse_draft_selection(v, draft)
        }))
    }

    async fn fetch_players(&self) -> Result<PlayerDirectory, DataSourceError> {
        debug!("Fetching player directory");
        let json = self.get_json("/players/nfl").await?;
        let map = json
            .as_object()
            .ok_or_else(|| DataSourceError::ParseError("Expected player object".to_string()))?;

        let mut players = HashMap::with_capacity(map.len());
        for (id, player_json) in map {
            let info = parse_player(id, player_json);
            players.insert(info.player_id.clone(), info);
        }
        Ok(Arc::new(players))
    }

    async fn fetch_nfl_state(&self) -> Result<NflState, DataSourceError> {
        let json = self.get_json("/state/nfl").await?;
        let season = json
            .get("season")
            .and_then(as_season)
            .ok_or_else(|| DataSourceError::ParseError("Missing season field".to_string()))?;
        let week = json.get("week").and_then(as_u32).unwrap_or(0);
        Ok(NflState { season, week })
    }
}

fn as_u32(v: &Value) -> Option<u32> {
    match v {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Seasons arrive as strings ("2026") but tolerate numbers.
fn as_season(v: &Value) -> Option<Season> {
    match v {
        Value::String(s) => Season::parse(s),
        Value::Number(n) => n.as_i64().and_then(|y| Season::parse(&y.to_string())),
        _ => None,
    }
}

fn as_roster_id(v: &Value) -> Option<RosterId> {
    as_u32(v).map(RosterId::new)
}

fn player_list(v: Option<&Value>) -> Vec<PlayerId> {
    v.and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|p| p.as_str())
                // Empty lineup slots are reported as "0".
                .filter(|p| !p.is_empty() && *p != "0")
                .map(PlayerId::new)
                .collect()
        })
        .unwrap_or_default()
}

fn required_str<'a>(json: &'a Value, field: &str) -> Result<&'a str, DataSourceError> {
    json.get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| DataSourceError::ParseError(format!("Missing {} field", field)))
}

fn parse_league(json: &Value) -> Result<LeagueInfo, DataSourceError> {
    let league_id = required_str(json, "league_id")?.to_string();
    let season = json
        .get("season")
        .and_then(as_season)
        .ok_or_else(|| DataSourceError::ParseError("Missing season field".to_string()))?;
    let settings = json.get("settings");
    let setting = |name: &str| settings.and_then(|s| s.get(name)).and_then(as_u32);

    Ok(LeagueInfo {
        name: json
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or(league_id.as_str())
            .to_string(),
        previous_league_id: json
            .get("previous_league_id")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty() && *s != "0")
            .map(str::to_string),
        draft_rounds: setting("draft_rounds").unwrap_or(4),
        taxi_slots: setting("taxi_slots").unwrap_or(0),
        total_rosters: json.get("total_rosters").and_then(as_u32).unwrap_or(0),
        season,
        league_id,
    })
}

fn parse_roster(json: &Value) -> Result<Roster, DataSourceError> {
    let roster_id = json
        .get("roster_id")
        .and_then(as_roster_id)
        .ok_or_else(|| DataSourceError::ParseError("Missing roster_id field".to_string()))?;

    let mut roster = Roster::new(roster_id);
    roster.owner_id = json
        .get("owner_id")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    roster.players = player_list(json.get("players"));
    roster.starters = player_list(json.get("starters"));
    roster.reserve = player_list(json.get("reserve"));
    roster.taxi = player_list(json.get("taxi"));
    Ok(roster)
}

fn parse_user(json: &Value) -> Result<LeagueUser, DataSourceError> {
    let user_id = required_str(json, "user_id")?.to_string();
    let display_name = json
        .get("display_name")
        .and_then(|v| v.as_str())
        .unwrap_or(user_id.as_str())
        .to_string();
    let team_name = json
        .get("metadata")
        .and_then(|m| m.get("team_name"))
        .and_then(|v| v.as_str())
        .map(str::to_string);
    Ok(LeagueUser {
        user_id,
        display_name,
        team_name,
    })
}

fn parse_player_roster_map(v: Option<&Value>) -> BTreeMap<PlayerId, RosterId> {
    v.and_then(|v| v.as_object())
        .map(|map| {
            map.iter()
                .filter_map(|(player, roster)| {
                    as_roster_id(roster).map(|r| (PlayerId::new(player.as_str()), r))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_pick_transfer(json: &Value) -> Result<DraftPickTransfer, DataSourceError> {
    let field = |name: &str| {
        json.get(name)
            .and_then(as_roster_id)
            .ok_or_else(|| DataSourceError::ParseError(format!("Missing {} field", name)))
    };
    Ok(DraftPickTransfer {
        season: json
            .get("season")
            .and_then(as_season)
            .ok_or_else(|| DataSourceError::ParseError("Missing pick season".to_string()))?,
        round: json
            .get("round")
            .and_then(as_u32)
            .ok_or_else(|| DataSourceError::ParseError("Missing pick round".to_string()))?,
        original_roster_id: field("roster_id")?,
        previous_owner_id: field("previous_owner_id")?,
        owner_id: field("owner_id")?,
    })
}

fn parse_transaction(json: &Value, requested_week: u32) -> Result<Transaction, DataSourceError> {
    let transaction_id = required_str(json, "transaction_id")?.to_string();
    let kind = TransactionKind::parse(required_str(json, "type")?);
    let status = TransactionStatus::parse(required_str(json, "status")?);
    let status_updated = json
        .get("status_updated")
        .and_then(|v| v.as_i64())
        .or_else(|| json.get("created").and_then(|v| v.as_i64()))
        .ok_or_else(|| DataSourceError::ParseError("Missing status_updated field".to_string()))?;
    let week = json.get("leg").and_then(as_u32).unwrap_or(requested_week);

    let draft_picks = json
        .get("draft_picks")
        .and_then(|v| v.as_array())
        .map(|picks| parse_each(picks, "draft pick transfer", parse_pick_transfer))
        .unwrap_or_default();

    Ok(Transaction {
        transaction_id,
        kind,
        status,
        week,
        status_updated: TimeMs::new(status_updated),
        roster_ids: json
            .get("roster_ids")
            .and_then(|v| v.as_array())
            .map(|ids| ids.iter().filter_map(as_roster_id).collect())
            .unwrap_or_default(),
        adds: parse_player_roster_map(json.get("adds")),
        drops: parse_player_roster_map(json.get("drops")),
        draft_picks,
    })
}

fn parse_matchup(json: &Value, week: u32) -> Result<LineupAppearance, DataSourceError> {
    let roster_id = json
        .get("roster_id")
        .and_then(as_roster_id)
        .ok_or_else(|| DataSourceError::ParseError("Missing roster_id field".to_string()))?;
    Ok(LineupAppearance {
        week,
        roster_id,
        starters: player_list(json.get("starters")),
    })
}

fn parse_draft(json: &Value) -> Result<DraftInfo, DataSourceError> {
    Ok(DraftInfo {
        draft_id: required_str(json, "draft_id")?.to_string(),
        season: json
            .get("season")
            .and_then(as_season)
            .ok_or_else(|| DataSourceError::ParseError("Missing season field".to_string()))?,
        status: json
            .get("status")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string(),
        start_time: json
            .get("start_time")
            .and_then(|v| v.as_i64())
            .map(TimeMs::new),
    })
}

fn parse_draft_selection(
    json: &Value,
    draft: &DraftInfo,
) -> Result<DraftSelection, DataSourceError> {
    let player_id = required_str(json, "player_id")?;
    let roster_id = json
        .get("roster_id")
        .and_then(as_roster_id)
        .ok_or_else(|| DataSourceError::ParseError("Missing roster_id field".to_string()))?;
    let pick_no = json.get("pick_no").and_then(as_u32).unwrap_or(0);
    let start = draft.start_time.map(|t| t.as_ms()).unwrap_or(0);

    Ok(DraftSelection {
        draft_id: draft.draft_id.clone(),
        season: draft.season,
        round: json.get("round").and_then(as_u32).unwrap_or(0),
        pick_no,
        player_id: PlayerId::new(player_id),
        roster_id,
        // Picks carry no timestamp; keep them ordered within the draft.
        drafted_at: TimeMs::new(start + i64::from(pick_no)),
    })
}

fn parse_player(id: &str, json: &Value) -> PlayerInfo {
    let text = |name: &str| json.get(name).and_then(|v| v.as_str()).map(str::trim);
    let full_name = match text("full_name") {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            let joined = [text("first_name"), text("last_name")]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            if joined.is_empty() {
                id.to_string()
            } else {
                joined
            }
        }
    };
    PlayerInfo {
        player_id: PlayerId::new(id),
        full_name,
        position: text("position")
            .map(Position::parse)
            .unwrap_or_else(|| Position::Other(String::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_league() {
        let json = serde_json::json!({
            "league_id": "111",
            "name": "Dynasty",
            "season": "2026",
            "previous_league_id": "100",
            "total_rosters": 12,
            "settings": { "draft_rounds": 4, "taxi_slots": 3 }
        });
        let league = parse_league(&json).unwrap();
        assert_eq!(league.season, Season::new(2026));
        assert_eq!(league.previous_league_id.as_deref(), Some("100"));
        assert_eq!(league.draft_rounds, 4);
        assert_eq!(league.taxi_slots, 3);
        assert_eq!(league.total_rosters, 12);
    }

    #[test]
    fn test_parse_league_without_previous() {
        let json = serde_json::json!({
            "league_id": "111",
            "season": "2024",
            "previous_league_id": null,
            "settings": {}
        });
        let league = parse_league(&json).unwrap();
        assert_eq!(league.previous_league_id, None);
        assert_eq!(league.name, "111");
    }

    #[test]
    fn test_parse_roster_handles_null_lists_and_empty_slots() {
        let json = serde_json::json!({
            "roster_id": 3,
            "owner_id": "u3",
            "players": ["a", "b", "c"],
            "starters": ["a", "0"],
            "reserve": null,
            "taxi": ["c"]
        });
        let roster = parse_roster(&json).unwrap();
        assert_eq!(roster.roster_id, RosterId::new(3));
        assert_eq!(roster.starters, vec![PlayerId::new("a")]);
        assert!(roster.reserve.is_empty());
        assert_eq!(roster.taxi, vec![PlayerId::new("c")]);
    }

    #[test]
    fn test_parse_trade_with_picks() {
        let json = serde_json::json!({
            "transaction_id": "987",
            "type": "trade",
            "status": "complete",
            "leg": 4,
            "status_updated": 1_700_000_000_000i64,
            "roster_ids": [1, 2],
            "adds": { "p1": 2 },
            "drops": { "p1": 1 },
            "draft_picks": [
                { "season": "2026", "round": 2, "roster_id": 1, "previous_owner_id": 1, "owner_id": 2 },
                { "season": "2027", "round": 1, "owner_id": 1 }
            ]
        });
        let tx = parse_transaction(&json, 0).unwrap();
        assert_eq!(tx.kind, TransactionKind::Trade);
        assert_eq!(tx.week, 4);
        assert_eq!(tx.adds.get(&PlayerId::new("p1")), Some(&RosterId::new(2)));
        // The malformed second pick is skipped.
        assert_eq!(tx.draft_picks.len(), 1);
        assert_eq!(tx.draft_picks[0].season, Season::new(2026));
        assert_eq!(tx.draft_picks[0].owner_id, RosterId::new(2));
    }

    #[test]
    fn test_parse_transaction_missing_type_fails() {
        let json = serde_json::json!({
            "transaction_id": "1",
            "status": "complete",
            "status_updated": 5
        });
        assert!(parse_transaction(&json, 1).is_err());
    }

    #[test]
    fn test_parse_draft_selection_orders_by_pick() {
        let draft = DraftInfo {
            draft_id: "d1".to_string(),
            season: Season::new(2026),
            status: "complete".to_string(),
            start_time: Some(TimeMs::new(1_000)),
        };
        let json = serde_json::json!({
            "player_id": "rook",
            "roster_id": 5,
            "round": 1,
            "pick_no": 3
        });
        let sel = parse_draft_selection(&json, &draft).unwrap();
        assert_eq!(sel.roster_id, RosterId::new(5));
        assert_eq!(sel.drafted_at, TimeMs::new(1_003));
    }

    #[test]
    fn test_parse_player_name_fallbacks() {
        let full = parse_player("1", &serde_json::json!({"full_name": "Ann Lee", "position": "QB"}));
        assert_eq!(full.full_name, "Ann Lee");
        assert_eq!(full.position, Position::QB);

        let split = parse_player("2", &serde_json::json!({"first_name": "Bo", "last_name": "Ray"}));
        assert_eq!(split.full_name, "Bo Ray");

        let defense = parse_player("KC", &serde_json::json!({"position": "DEF"}));
        assert_eq!(defense.full_name, "KC");
        assert_eq!(defense.position, Position::DEF);
    }
}
