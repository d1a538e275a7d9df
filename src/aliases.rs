//! Canonical column names and the aliases accepted for them at load time.

use tracing::debug;

use crate::table::Table;

pub type AliasTable = &'static [(&'static str, &'static [&'static str])];

pub static DELIVERY_ALIASES: AliasTable = &[
    ("match_id", &["match_id", "match"]),
    ("date", &["date", "match_date", "start_date"]),
    ("season", &["season", "year", "season_year"]),
    ("venue", &["venue", "ground", "stadium"]),
    ("city", &["city"]),
    ("innings", &["innings", "inning"]),
    ("batting_team", &["batting_team", "bat_team", "batting_side"]),
    ("bowling_team", &["bowling_team", "bowl_team", "bowling_side"]),
    ("over", &["over", "overs"]),
    ("ball", &["ball"]),
    ("batter", &["batter", "batsman", "striker"]),
    ("non_striker", &["non_striker", "non-striker", "nonstriker"]),
    ("bowler", &["bowler"]),
    ("runs_batter", &["runs_batter", "batsman_runs", "batter_runs", "runs_off_bat"]),
    ("runs_extras", &["runs_extras", "extra_runs", "extras"]),
    ("runs_total", &["runs_total", "total_runs"]),
    ("extra_type", &["extra_type", "extras_type", "extra_kind"]),
    ("wicket_kind", &["wicket_kind", "dismissal_kind", "wicket_type"]),
    ("player_out", &["player_out", "player_dismissed", "dismissed_player"]),
    ("player_of_match", &["player_of_match", "potm", "man_of_match"]),
    ("match_won_by", &["match_won_by", "winner", "match_winner"]),
    ("win_outcome", &["win_outcome", "result", "outcome"]),
];

pub static MATCH_METADATA_ALIASES: AliasTable = &[
    ("match_id", &["match_id", "id", "match"]),
    ("season", &["season", "year", "season_year"]),
    ("date", &["date", "match_date", "start_date"]),
    ("venue", &["venue", "ground", "stadium"]),
    ("city", &["city"]),
    ("player_of_match", &["player_of_match", "potm", "man_of_match"]),
    ("match_won_by", &["match_won_by", "winner", "match_winner"]),
    ("win_outcome", &["win_outcome", "result", "outcome"]),
];

/// Names the dashboard and the advanced stage expect on player-match rows.
pub static PLAYER_MATCH_ALIASES: AliasTable = &[
    ("player", &["player", "batter", "batsman", "player_name"]),
    ("team", &["team", "team_name", "batting_team", "bat_team"]),
    ("match_s_id", &["match_s_id", "match_s", "s_match_id"]),
    ("match_id", &["match_id", "match"]),
    ("season", &["season", "year", "season_year"]),
    ("runs", &["runs", "runs_batter", "batter_runs", "player_runs"]),
    ("balls", &["balls", "balls_faced", "batter_balls"]),
    ("wickets", &["wickets", "bowler_wicket", "bowler_wickets"]),
    ("balls_bowled", &["balls_bowled", "balls_bowled_by", "bowler_balls"]),
    ("runs_conceded", &["runs_conceded", "runs_bowler", "conceded"]),
    ("match_won_by", &["match_won_by", "winner", "match_winner"]),
    ("venue", &["venue", "ground", "stadium"]),
    ("city", &["city"]),
];

/// Header renames resolved once against a concrete header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamePlan {
    pub renames: Vec<(String, String)>,
}

impl RenamePlan {
    /// For each canonical name, the first accepted alias present in `headers`
    /// (case-insensitive) is renamed to it. A header is claimed at most once.
    pub fn resolve(headers: &[String], aliases: AliasTable) -> Self {
        let mut claimed = vec![false; headers.len()];
        let mut renames = Vec::new();

        for (canonical, accepted) in aliases {
            if let Some(idx) = headers.iter().position(|h| h == canonical) {
                claimed[idx] = true;
                continue;
            }
            for alias in *accepted {
                let hit = headers
                    .iter()
                    .enumerate()
                    .find(|(idx, h)| !claimed[*idx] && h.eq_ignore_ascii_case(alias));
                if let Some((idx, header)) = hit {
                    claimed[idx] = true;
                    renames.push((header.clone(), canonical.to_string()));
                    break;
                }
            }
        }

        Self { renames }
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }

    pub fn apply(&self, table: &mut Table) {
        for (from, to) in &self.renames {
            debug!(from = %from, to = %to, "renaming column");
            table.rename_header(from, to);
        }
    }
}

pub fn normalize_columns(table: &mut Table, aliases: AliasTable) -> RenamePlan {
    let plan = RenamePlan::resolve(table.headers(), aliases);
    plan.apply(table);
    plan
}
