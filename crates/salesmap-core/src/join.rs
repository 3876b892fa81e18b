//! Joining store records to roster entries by employee number.

use std::collections::HashMap;

use crate::record::{JoinedRecord, SalespersonRecord, StoreRecord};

/// Observability counters for one join pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub total: usize,
    pub matched: usize,
}

impl JoinStats {
    /// Fraction of store records that found a roster entry; 0.0 for an
    /// empty input.
    #[must_use]
    pub fn match_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.matched as f64 / self.total as f64
        }
    }
}

/// Join store records to the roster by normalized employee number.
///
/// Each store record yields exactly one [`JoinedRecord`], in input order: a
/// matching roster entry (first match by employee number) is attached as
/// `sales_info`, and stores with an empty or unmatched employee number get
/// `sales_info: None`. The join never drops records — geo-validity filtering
/// is a separate, later step.
///
/// A match rate below 50% is logged as a warning; it is a data-quality
/// signal, not a failure.
#[must_use]
pub fn join_by_employee_number(
    stores: Vec<StoreRecord>,
    roster: &[SalespersonRecord],
) -> (Vec<JoinedRecord>, JoinStats) {
    // First occurrence wins, matching the original linear first-match scan.
    let mut by_number: HashMap<String, &SalespersonRecord> = HashMap::new();
    for entry in roster {
        let number = entry.employee_no();
        if !number.is_empty() {
            by_number.entry(number).or_insert(entry);
        }
    }

    let mut stats = JoinStats {
        total: stores.len(),
        matched: 0,
    };

    let joined: Vec<JoinedRecord> = stores
        .into_iter()
        .map(|store| {
            let number = store.employee_no();
            let sales_info = if number.is_empty() {
                None
            } else {
                by_number.get(&number).map(|entry| (*entry).clone())
            };
            if sales_info.is_some() {
                stats.matched += 1;
            }
            JoinedRecord { store, sales_info }
        })
        .collect();

    tracing::debug!(
        total = stats.total,
        matched = stats.matched,
        unmatched = stats.total - stats.matched,
        "joined store records against roster"
    );
    if stats.total > 0 && stats.match_rate() < 0.5 {
        tracing::warn!(
            match_rate = format!("{:.1}%", stats.match_rate() * 100.0),
            "roster match rate below 50%, check the datasets"
        );
    }

    (joined, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(name: &str, employee_number: serde_json::Value) -> StoreRecord {
        serde_json::from_value(json!({
            "거래처명": name,
            "담당 사번": employee_number
        }))
        .unwrap()
    }

    fn roster_entry(number: serde_json::Value, name: &str) -> SalespersonRecord {
        serde_json::from_value(json!({
            "담당 사번": number,
            "담당 영업사원": name,
            "지사": "North",
            "지점": "Station"
        }))
        .unwrap()
    }

    #[test]
    fn join_matches_by_employee_number() {
        let stores = vec![store("ABC Mart", json!("1001"))];
        let roster = vec![roster_entry(json!("1001"), "Kim")];

        let (joined, stats) = join_by_employee_number(stores, &roster);

        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].sales_info.as_ref().unwrap().name, "Kim");
        assert_eq!(stats.matched, 1);
    }

    #[test]
    fn join_matches_number_typed_keys_against_string_typed() {
        let stores = vec![store("ABC Mart", json!(1001))];
        let roster = vec![roster_entry(json!("1001"), "Kim")];

        let (joined, _) = join_by_employee_number(stores, &roster);
        assert_eq!(joined[0].sales_info.as_ref().unwrap().name, "Kim");
    }

    #[test]
    fn output_length_equals_input_length_even_with_empty_roster() {
        let stores = vec![
            store("A", json!("1001")),
            store("B", json!("")),
            store("C", serde_json::Value::Null),
        ];
        let (joined, stats) = join_by_employee_number(stores, &[]);

        assert_eq!(joined.len(), 3);
        assert!(joined.iter().all(|r| r.sales_info.is_none()));
        assert_eq!(stats.matched, 0);
    }

    #[test]
    fn output_preserves_input_order() {
        let stores = vec![
            store("C", json!("3")),
            store("A", json!("1")),
            store("B", json!("2")),
        ];
        let roster = vec![
            roster_entry(json!("1"), "Kim"),
            roster_entry(json!("2"), "Lee"),
            roster_entry(json!("3"), "Park"),
        ];

        let (joined, _) = join_by_employee_number(stores, &roster);
        let names: Vec<&str> = joined.iter().map(|r| r.store.store_name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn empty_employee_number_skips_lookup() {
        let stores = vec![store("A", json!("  "))];
        let roster = vec![roster_entry(json!(""), "Ghost")];

        let (joined, stats) = join_by_employee_number(stores, &roster);
        assert!(joined[0].sales_info.is_none());
        assert_eq!(stats.matched, 0);
    }

    #[test]
    fn first_roster_match_wins_on_duplicate_numbers() {
        let stores = vec![store("A", json!("1001"))];
        let roster = vec![
            roster_entry(json!("1001"), "Kim"),
            roster_entry(json!("1001"), "Lee"),
        ];

        let (joined, _) = join_by_employee_number(stores, &roster);
        assert_eq!(joined[0].sales_info.as_ref().unwrap().name, "Kim");
    }

    #[test]
    fn match_rate_reflects_partial_matches() {
        let stores = vec![store("A", json!("1")), store("B", json!("9"))];
        let roster = vec![roster_entry(json!("1"), "Kim")];

        let (_, stats) = join_by_employee_number(stores, &roster);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.matched, 1);
        assert!((stats.match_rate() - 0.5).abs() < f64::EPSILON);
    }
}
