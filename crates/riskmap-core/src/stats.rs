//! Category counts and summary metrics over a loaded collection.

use serde::Serialize;

use crate::record::{RiskCollection, RiskLevel, RiskRecord};

/// Aggregate view of a collection.
///
/// Always `low + medium + high + invalid == total`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RiskSummary {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    /// Features that could not be binned (integrity violations or unscored).
    pub invalid: usize,
    pub total: usize,
    /// Mean score over binned records; 0 when there are none.
    pub mean_score: f64,
}

impl RiskSummary {
    pub fn count(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
        }
    }

    /// Records that landed in one of the three buckets.
    pub fn valid(&self) -> usize {
        self.low + self.medium + self.high
    }

    /// Fraction of binned records at `level`, in [0, 1].
    pub fn share(&self, level: RiskLevel) -> f64 {
        match self.valid() {
            0 => 0.0,
            n => self.count(level) as f64 / n as f64,
        }
    }

    /// Most frequent level. Ties go to the more severe level.
    pub fn dominant(&self) -> Option<RiskLevel> {
        if self.valid() == 0 {
            return None;
        }
        RiskLevel::ALL.into_iter().max_by_key(|&l| (self.count(l), l))
    }

    /// Counts in ascending severity, the order used by chart series.
    pub fn series(&self) -> [usize; 3] {
        RiskLevel::ALL.map(|l| self.count(l))
    }
}

/// Single pass over the collection. Rejected features count as invalid.
pub fn aggregate(collection: &RiskCollection) -> RiskSummary {
    let mut summary = aggregate_records(collection.records());
    summary.invalid += collection.violations().len();
    summary.total += collection.violations().len();
    summary
}

/// Aggregate bare records. Unscored records count as invalid.
pub fn aggregate_records<'a, I>(records: I) -> RiskSummary
where
    I: IntoIterator<Item = &'a RiskRecord>,
{
    let mut summary = RiskSummary::default();
    let mut score_sum = 0.0f64;

    for record in records {
        summary.total += 1;
        let (Some(level), Some(score)) = (record.level(), record.score()) else {
            summary.invalid += 1;
            continue;
        };
        match level {
            RiskLevel::Low => summary.low += 1,
            RiskLevel::Medium => summary.medium += 1,
            RiskLevel::High => summary.high += 1,
        }
        score_sum += score;
    }

    let valid = summary.valid();
    if valid > 0 {
        summary.mean_score = score_sum / valid as f64;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Scoring;
    use approx::assert_relative_eq;
    use serde_json::{json, Value};

    fn record(level: RiskLevel, score: f64) -> RiskRecord {
        RiskRecord {
            geometry: Value::Null,
            scoring: Scoring::Scored { level, score },
            zone_type: "Office".into(),
            pop_density: 100.0,
            waste_volume: 40.0,
        }
    }

    fn ten_records() -> Vec<RiskRecord> {
        let mut v = Vec::new();
        v.extend((0..4).map(|_| record(RiskLevel::Low, 0.2)));
        v.extend((0..3).map(|_| record(RiskLevel::Medium, 0.5)));
        v.extend((0..3).map(|_| record(RiskLevel::High, 0.9)));
        v
    }

    #[test]
    fn four_three_three() {
        let s = aggregate(&RiskCollection::new(ten_records()));
        assert_eq!((s.low, s.medium, s.high, s.total, s.invalid), (4, 3, 3, 10, 0));
        assert_relative_eq!(s.mean_score, (0.8 + 1.5 + 2.7) / 10.0, epsilon = 1e-12);
    }

    #[test]
    fn permutation_does_not_change_the_result() {
        let forward = ten_records();
        let mut reversed = ten_records();
        reversed.reverse();
        let mut interleaved = ten_records();
        interleaved.swap(0, 9);
        interleaved.swap(2, 5);

        let a = aggregate_records(&forward);
        assert_eq!(a, aggregate_records(&reversed));
        assert_eq!(a.series(), aggregate_records(&interleaved).series());
    }

    #[test]
    fn empty_collection() {
        let s = aggregate(&RiskCollection::default());
        assert_eq!(s, RiskSummary::default());
        assert_eq!(s.dominant(), None);
        assert_eq!(s.share(RiskLevel::High), 0.0);
    }

    #[test]
    fn severe_is_reported_not_binned() {
        let mut features: Vec<Value> = ["Low", "Medium", "Severe", "High", "Low"]
            .iter()
            .map(|level| {
                json!({
                    "type": "Feature",
                    "geometry": null,
                    "properties": {
                        "risk_level": level, "risk_score": 0.4,
                        "pop_density": 10, "waste_volume": 5, "zone_type": "Campus"
                    }
                })
            })
            .collect();
        features.rotate_left(1);
        let c = RiskCollection::from_value(json!({ "type": "FeatureCollection", "features": features }))
            .unwrap();

        let s = aggregate(&c);
        assert_eq!(s.invalid, 1);
        assert_eq!((s.low, s.medium, s.high), (2, 1, 1));
        assert_eq!(s.total, 5);
        assert_eq!(s.valid() + s.invalid, s.total);
    }

    #[test]
    fn unscored_records_count_as_invalid() {
        let mut records = ten_records();
        records[0].scoring = Scoring::Unscored;
        let s = aggregate_records(&records);
        assert_eq!((s.low, s.invalid, s.total), (3, 1, 10));
    }

    #[test]
    fn shares_and_dominant_level() {
        let s = aggregate_records(&ten_records());
        assert_relative_eq!(s.share(RiskLevel::Low), 0.4);
        assert_relative_eq!(
            RiskLevel::ALL.iter().map(|&l| s.share(l)).sum::<f64>(),
            1.0,
            epsilon = 1e-12
        );
        assert_eq!(s.dominant(), Some(RiskLevel::Low));

        let tie = aggregate_records(&[record(RiskLevel::Low, 0.1), record(RiskLevel::High, 0.9)]);
        assert_eq!(tie.dominant(), Some(RiskLevel::High));
    }
}
