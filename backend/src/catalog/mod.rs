//! Static catalog of leagues, seasons and stat subtypes.
//!
//! Maps the short league keys users type to the statistics source's native
//! identifiers, and validates category / stat subtype combinations.
//!
//! Lookups trim and lowercase their input, so `"EPL"` and `" epl "` both
//! resolve. The catalog is immutable and shared by every request.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::{RequestError, RequestResult};
use crate::models::{Category, FetchRequest, LeagueKey, Query};

/// Display metadata for a league.
#[derive(Debug, Clone, Serialize)]
pub struct LeagueInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub country: &'static str,
    pub id: &'static str,
    pub flag: &'static str,
}

/// A suggested season.
#[derive(Debug, Clone, Serialize)]
pub struct SeasonOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// A stat subtype offered for a category.
#[derive(Debug, Clone, Serialize)]
pub struct StatOption {
    pub value: &'static str,
    pub label: &'static str,
    pub desc: &'static str,
}

/// A category and the subtypes it offers.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub stats: &'static [StatOption],
}

const fn stat(value: &'static str, label: &'static str, desc: &'static str) -> StatOption {
    StatOption { value, label, desc }
}

pub const SEASONS: &[SeasonOption] = &[
    SeasonOption { value: "2425", label: "2024-25" },
    SeasonOption { value: "2324", label: "2023-24" },
    SeasonOption { value: "2223", label: "2022-23" },
    SeasonOption { value: "2122", label: "2021-22" },
    SeasonOption { value: "2021", label: "2020-21" },
];

const TEAM_STATS: &[StatOption] = &[
    stat("standard", "Standard Stats", "Goals, assists, xG, possession"),
    stat("shooting", "Shooting", "Shots, shot accuracy, goals per shot"),
    stat("passing", "Passing", "Pass completion, progressive passes"),
    stat("passing_types", "Pass Types", "Crosses, through balls, switches"),
    stat("goal_shot_creation", "Shot Creation", "SCA, GCA actions"),
    stat("defense", "Defense", "Tackles, interceptions, blocks"),
    stat("possession", "Possession", "Touches, carries, dribbles"),
    stat("misc", "Miscellaneous", "Cards, fouls, aerials"),
];

const PLAYER_STATS: &[StatOption] = &[
    stat("standard", "Standard Stats", "Goals, assists, minutes played"),
    stat("shooting", "Shooting", "Shots, xG, shot distance"),
    stat("passing", "Passing", "Pass completion, key passes"),
    stat("passing_types", "Pass Types", "Crosses, through balls"),
    stat("goal_shot_creation", "Shot Creation", "SCA, GCA per 90"),
    stat("defense", "Defense", "Tackles, pressures, blocks"),
    stat("possession", "Possession", "Touches, dribbles, carries"),
    stat("playing_time", "Playing Time", "Minutes, starts, subs"),
    stat("misc", "Miscellaneous", "Cards, fouls, recoveries"),
    stat("keeper", "Goalkeeper", "Saves, clean sheets, GA"),
    stat("keeper_adv", "GK Advanced", "PSxG, crosses, sweeper"),
];

const PLAYER_MATCH_STATS: &[StatOption] = &[
    stat("summary", "Summary", "Overall match performance"),
    stat("passing", "Passing", "Pass stats per match"),
    stat("passing_types", "Pass Types", "Pass type breakdown"),
    stat("defense", "Defense", "Defensive actions"),
    stat("possession", "Possession", "Ball control stats"),
    stat("misc", "Miscellaneous", "Cards, fouls"),
    stat("keeper", "Goalkeeper", "GK stats per match"),
];

const NO_STATS: &[StatOption] = &[];

static LEAGUES: Lazy<Vec<LeagueInfo>> = Lazy::new(|| {
    LeagueKey::ALL
        .iter()
        .map(|key| {
            let (name, country, flag) = match key {
                LeagueKey::Epl => ("Premier League", "England", "🏴󠁧󠁢󠁥󠁮󠁧󠁿"),
                LeagueKey::Laliga => ("La Liga", "Spain", "🇪🇸"),
                LeagueKey::Bundesliga => ("Bundesliga", "Germany", "🇩🇪"),
                LeagueKey::Seriea => ("Serie A", "Italy", "🇮🇹"),
                LeagueKey::Ligue1 => ("Ligue 1", "France", "🇫🇷"),
            };
            LeagueInfo {
                key: key.as_str(),
                name,
                country,
                id: key.native_id(),
                flag,
            }
        })
        .collect()
});

static LEAGUE_LOOKUP: Lazy<HashMap<&'static str, LeagueKey>> =
    Lazy::new(|| LeagueKey::ALL.iter().map(|k| (k.as_str(), *k)).collect());

/// All supported leagues.
pub fn leagues() -> &'static [LeagueInfo] {
    &LEAGUES
}

/// Look up a single league key.
pub fn league(key: &str) -> Option<LeagueKey> {
    LEAGUE_LOOKUP.get(key.trim().to_lowercase().as_str()).copied()
}

/// Metadata for a category.
pub fn category_info(category: Category) -> CategoryInfo {
    let (name, description, stats) = match category {
        Category::Team => (
            "Team Season Stats",
            "Aggregated team statistics for the entire season",
            TEAM_STATS,
        ),
        Category::Player => (
            "Player Season Stats",
            "Individual player statistics aggregated over the season",
            PLAYER_STATS,
        ),
        Category::Schedule => ("Match Schedule", "Match fixtures, results, and scores", NO_STATS),
        Category::PlayerMatch => (
            "Player Match Stats",
            "Individual player stats for each match",
            PLAYER_MATCH_STATS,
        ),
    };
    CategoryInfo {
        key: category.as_str(),
        name,
        description,
        stats,
    }
}

/// Stat subtypes offered for a category.
pub fn stat_options(category: Category) -> &'static [StatOption] {
    category_info(category).stats
}

/// Resolve league keys to leagues.
///
/// Unknown keys are dropped; duplicates keep their first position. Fails only
/// when nothing survives.
pub fn resolve<S: AsRef<str>>(keys: &[S]) -> RequestResult<Vec<LeagueKey>> {
    let mut resolved = Vec::new();
    for key in keys {
        if let Some(league) = league(key.as_ref()) {
            if !resolved.contains(&league) {
                resolved.push(league);
            }
        }
    }

    if resolved.is_empty() {
        return Err(RequestError::NoValidLeagues {
            available: LeagueKey::ALL.iter().map(|k| k.as_str().to_string()).collect(),
        });
    }
    Ok(resolved)
}

/// Resolve league keys straight to native identifiers.
pub fn resolve_native<S: AsRef<str>>(keys: &[S]) -> RequestResult<Vec<&'static str>> {
    Ok(resolve(keys)?.iter().map(|k| k.native_id()).collect())
}

/// Check a stat subtype against the category, returning its canonical spelling.
///
/// Categories without subtypes ignore whatever was sent.
pub fn validate_stat_type(
    category: Category,
    stat_type: Option<&str>,
) -> RequestResult<Option<&'static str>> {
    if !category.has_stat_types() {
        return Ok(None);
    }

    let wanted = match stat_type.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.to_lowercase(),
        None => return Ok(category.default_stat_type()),
    };

    let options = stat_options(category);
    options
        .iter()
        .find(|o| o.value == wanted)
        .map(|o| Some(o.value))
        .ok_or_else(|| RequestError::InvalidStatType {
            category: category.as_str().to_string(),
            stat: wanted,
            available: options.iter().map(|o| o.value.to_string()).collect(),
        })
}

/// Validate a whole request.
pub fn validate(request: &FetchRequest) -> RequestResult<Query> {
    let category: Category = request.data_type.parse()?;
    let leagues = resolve(&request.leagues)?;
    let stat_type = validate_stat_type(category, request.stat_type.as_deref())?;

    let mut seasons = Vec::with_capacity(request.seasons.len());
    for season in &request.seasons {
        let season = season.trim();
        if season.is_empty() {
            return Err(RequestError::EmptySeason);
        }
        seasons.push(season.to_string());
    }
    if seasons.is_empty() {
        seasons = FetchRequest::default().seasons;
    }

    let teams = request
        .teams
        .iter()
        .filter(|t| !t.is_empty())
        .cloned()
        .collect();

    Ok(Query {
        category,
        leagues,
        seasons,
        stat_type,
        teams,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_partial_success() {
        let ids = resolve_native(&["epl", "not_a_league"]).unwrap();
        assert_eq!(ids, vec!["ENG-Premier League"]);
    }

    #[test]
    fn test_resolve_total_failure() {
        let err = resolve(&["not_a_league"]).unwrap_err();
        assert!(matches!(err, RequestError::NoValidLeagues { .. }));
    }

    #[test]
    fn test_resolve_is_case_insensitive_and_dedupes() {
        let leagues = resolve(&["EPL", " laliga ", "epl"]).unwrap();
        assert_eq!(leagues, vec![LeagueKey::Epl, LeagueKey::Laliga]);
    }

    #[test]
    fn test_stat_defaults_per_category() {
        assert_eq!(validate_stat_type(Category::Team, None).unwrap(), Some("standard"));
        assert_eq!(
            validate_stat_type(Category::PlayerMatch, None).unwrap(),
            Some("summary")
        );
        assert_eq!(
            validate_stat_type(Category::Schedule, Some("shooting")).unwrap(),
            None
        );
    }

    #[test]
    fn test_stat_rejected_for_wrong_category() {
        assert_eq!(
            validate_stat_type(Category::Player, Some("Keeper_Adv")).unwrap(),
            Some("keeper_adv")
        );
        let err = validate_stat_type(Category::Team, Some("keeper_adv")).unwrap_err();
        assert!(matches!(err, RequestError::InvalidStatType { .. }));
    }

    #[test]
    fn test_validate_request() {
        let request = FetchRequest {
            leagues: vec!["epl".into(), "seriea".into()],
            seasons: vec!["2324".into()],
            data_type: "player_match".into(),
            stat_type: None,
            teams: vec!["Arsenal".into(), String::new()],
        };
        let query = validate(&request).unwrap();
        assert_eq!(query.category, Category::PlayerMatch);
        assert_eq!(query.stat_type, Some("summary"));
        assert_eq!(query.teams, vec!["Arsenal"]);
        assert_eq!(
            query.scope().leagues,
            vec!["ENG-Premier League", "ITA-Serie A"]
        );
    }

    #[test]
    fn test_validate_rejects_blank_season() {
        let request = FetchRequest {
            seasons: vec!["  ".into()],
            ..FetchRequest::default()
        };
        assert_eq!(validate(&request).unwrap_err(), RequestError::EmptySeason);
    }

    #[test]
    fn test_catalog_shape() {
        assert_eq!(leagues().len(), 5);
        assert_eq!(leagues()[0].id, "ENG-Premier League");
        assert_eq!(stat_options(Category::Team).len(), 8);
        assert_eq!(stat_options(Category::Player).len(), 11);
        assert!(stat_options(Category::Schedule).is_empty());
    }
}
