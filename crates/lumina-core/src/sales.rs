//! Sales tracking and the leaderboard.

use std::collections::BTreeMap;

use lumina_models::{SaleKind, SalesTally, UserId};

use crate::error::{CoreError, Result};
use crate::format::MessageFormat;

/// Maps `/repsale <company> [byod]` arguments to a sale kind.
///
/// `gen` and `aw` name the carrier; anything else counts only when the
/// second argument is `byod`.
pub fn parse_sale(company: &str, extra: Option<&str>) -> Result<SaleKind> {
    match company.trim().to_lowercase().as_str() {
        "gen" => Ok(SaleKind::Gen),
        "aw" => Ok(SaleKind::Aw),
        other => match extra.map(|e| e.trim().to_lowercase()) {
            Some(e) if e == "byod" => Ok(SaleKind::Byod),
            _ => Err(CoreError::UnknownSaleKind(other.to_string())),
        },
    }
}

/// Per-user sale tallies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesBoard {
    tallies: BTreeMap<UserId, SalesTally>,
}

impl SalesBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tallies(tallies: BTreeMap<UserId, SalesTally>) -> Self {
        Self { tallies }
    }

    pub fn tallies(&self) -> &BTreeMap<UserId, SalesTally> {
        &self.tallies
    }

    pub fn tally(&self, user: &UserId) -> SalesTally {
        self.tallies.get(user).copied().unwrap_or_default()
    }

    /// Records one sale and returns the user's updated tally.
    pub fn record(&mut self, user: UserId, kind: SaleKind) -> SalesTally {
        let tally = self.tallies.entry(user).or_default();
        tally.increment(kind);
        *tally
    }

    /// Users by total sales, highest first; ties by user id.
    pub fn leaderboard(&self) -> Vec<(&UserId, SalesTally)> {
        let mut rows: Vec<_> = self.tallies.iter().map(|(id, t)| (id, *t)).collect();
        rows.sort_by(|(a_id, a), (b_id, b)| b.total().cmp(&a.total()).then_with(|| a_id.cmp(b_id)));
        rows
    }

    pub fn render_leaderboard(&self, fmt: &dyn MessageFormat) -> String {
        let rows = self.leaderboard();
        if rows.is_empty() {
            return "No sales reported yet.".to_string();
        }

        let mut msg = fmt.bold("Sales Leaderboard");
        for (user, tally) in rows {
            msg.push_str(&format!(
                "\n{} - Total Sales: {} (Gen: {}, AW: {}, BYOD: {})",
                fmt.mention(user),
                tally.total(),
                tally.gen,
                tally.aw,
                tally.byod
            ));
        }
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PlainFormat;

    #[test]
    fn test_parse_sale() {
        assert_eq!(parse_sale("GEN", None).unwrap(), SaleKind::Gen);
        assert_eq!(parse_sale("aw", Some("byod")).unwrap(), SaleKind::Aw);
        assert_eq!(parse_sale("tmo", Some("BYOD")).unwrap(), SaleKind::Byod);
        assert!(matches!(
            parse_sale("tmo", None),
            Err(CoreError::UnknownSaleKind(ref k)) if k == "tmo"
        ));
    }

    #[test]
    fn test_record_accumulates() {
        let mut board = SalesBoard::new();
        let user = UserId::from("U1");
        board.record(user.clone(), SaleKind::Gen);
        board.record(user.clone(), SaleKind::Gen);
        let tally = board.record(user.clone(), SaleKind::Byod);

        assert_eq!(tally, SalesTally { gen: 2, aw: 0, byod: 1 });
        assert_eq!(board.tally(&user).total(), 3);
        assert_eq!(board.tally(&"nobody".into()), SalesTally::default());
    }

    #[test]
    fn test_leaderboard_order() {
        let mut board = SalesBoard::new();
        board.record("B".into(), SaleKind::Aw);
        board.record("A".into(), SaleKind::Gen);
        board.record("C".into(), SaleKind::Gen);
        board.record("C".into(), SaleKind::Byod);

        let order: Vec<_> = board.leaderboard().into_iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_render_leaderboard() {
        let mut board = SalesBoard::new();
        board.record("U1".into(), SaleKind::Gen);
        board.record("U1".into(), SaleKind::Aw);

        assert_eq!(
            board.render_leaderboard(&PlainFormat),
            "Sales Leaderboard\n@U1 - Total Sales: 2 (Gen: 1, AW: 1, BYOD: 0)"
        );
        assert_eq!(SalesBoard::new().render_leaderboard(&PlainFormat), "No sales reported yet.");
    }
}
