//! Top-N leaderboard read back from the store.

use serde::Deserialize;

use crate::error::StoreError;
use crate::fetch::HttpClient;
use crate::store::StoreClient;

pub const DEFAULT_REPORT_LIMIT: usize = 20;

pub const REPORT_COLUMNS: [&str; 4] = [
    "player_display_name",
    "position_group",
    "recent_team",
    "fantasy_points",
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopPlayer {
    #[serde(default)]
    pub player_display_name: Option<String>,
    #[serde(default)]
    pub position_group: Option<String>,
    #[serde(default)]
    pub recent_team: Option<String>,
    #[serde(default)]
    pub fantasy_points: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Rows(Vec<TopPlayer>),
    Empty,
}

pub fn top_players_query(limit: usize) -> String {
    format!(
        "select={}&order=fantasy_points.desc&limit={limit}",
        REPORT_COLUMNS.join(",")
    )
}

/// Queries the `limit` highest-scoring rows of `table`.
pub async fn fetch_report<C: HttpClient>(
    store: &StoreClient<C>,
    table: &str,
    limit: usize,
) -> Result<Report, StoreError> {
    let players: Vec<TopPlayer> = store.select(table, &top_players_query(limit)).await?;
    if players.is_empty() {
        Ok(Report::Empty)
    } else {
        Ok(Report::Rows(players))
    }
}

/// Renders players as an aligned text table, points to two decimals.
pub fn render(players: &[TopPlayer]) -> String {
    let cells: Vec<[String; 4]> = players
        .iter()
        .map(|p| {
            [
                p.player_display_name.clone().unwrap_or_default(),
                p.position_group.clone().unwrap_or_default(),
                p.recent_team.clone().unwrap_or_default(),
                p.fantasy_points
                    .map(|v| format!("{v:.2}"))
                    .unwrap_or_default(),
            ]
        })
        .collect();

    let mut widths = REPORT_COLUMNS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |row: [&str; 4]| {
        format!(
            "{:<w0$}  {:<w1$}  {:<w2$}  {:>w3$}",
            row[0],
            row[1],
            row[2],
            row[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3],
        )
        .trim_end()
        .to_string()
    };

    let mut out = vec![line(REPORT_COLUMNS)];
    out.push("-".repeat(widths.iter().sum::<usize>() + 6));
    for row in &cells {
        out.push(line([
            row[0].as_str(),
            row[1].as_str(),
            row[2].as_str(),
            row[3].as_str(),
        ]));
    }
    out.join("\n")
}
