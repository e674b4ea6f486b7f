// ==========================================
// S 曲线构建器测试
// ==========================================

use chrono::Duration;
use proptest::prelude::*;
use tag_tracker::domain::record::TagRecord;
use tag_tracker::domain::types::{AxisGranularity, DateClass, DateField, Discipline};
use tag_tracker::engine::{format_tag_date, ProgressCurveBuilder, WeekCalendar};

mod test_helpers;
use test_helpers::{record_with_dates, ymd};

fn builder() -> ProgressCurveBuilder {
    ProgressCurveBuilder::new(WeekCalendar::new(ymd(2025, 9, 29)).unwrap())
}

#[test]
fn test_three_class_curve() {
    let records = vec![
        record_with_dates(
            "E-101",
            Discipline::Electrical,
            &[
                (DateField::BaselinePlanned, "29/09/2025"),
                (DateField::ScheduledStart, "30/09/2025"),
                (DateField::ActualCompletion, "02/10/2025"),
            ],
        ),
        record_with_dates(
            "E-102",
            Discipline::Electrical,
            &[
                (DateField::BaselinePlanned, "30/09/2025"),
                (DateField::ScheduledEnd, "03/10/2025"),
            ],
        ),
        TagRecord::new("E-103", Discipline::Electrical),
    ];

    let curve = builder().build(&records, &DateClass::ALL, AxisGranularity::Daily);

    assert_eq!(curve.total_records, 3);
    assert_eq!(curve.axis.first(), Some(&ymd(2025, 9, 29)));
    assert_eq!(curve.axis.last(), Some(&ymd(2025, 10, 3)));
    assert_eq!(curve.counts(DateClass::Planned), vec![1, 2, 2, 2, 2]);
    assert_eq!(curve.counts(DateClass::Scheduled), vec![0, 1, 1, 1, 2]);
    assert_eq!(curve.counts(DateClass::Actual), vec![0, 0, 0, 1, 1]);
}

#[test]
fn test_unparseable_dates_are_ignored() {
    let records = vec![
        record_with_dates(
            "E-101",
            Discipline::Electrical,
            &[(DateField::ActualCompletion, "amanhã")],
        ),
        record_with_dates(
            "E-102",
            Discipline::Electrical,
            &[(DateField::ActualCompletion, "01/10/2025")],
        ),
    ];

    let curve = builder().build(&records, &[DateClass::Actual], AxisGranularity::Daily);
    assert_eq!(curve.counts(DateClass::Actual), vec![1]);
}

#[test]
fn test_weekly_curve_over_structural_records() {
    let records = vec![
        record_with_dates(
            "S-001",
            Discipline::Structural,
            &[(DateField::ActualCompletion, "01/10/2025")],
        ),
        record_with_dates(
            "S-002",
            Discipline::Structural,
            &[(DateField::ActualCompletion, "20/10/2025")],
        ),
    ];

    let curve = builder().build(&records, &[DateClass::Actual], AxisGranularity::Weekly);
    assert_eq!(
        curve.axis,
        vec![ymd(2025, 9, 29), ymd(2025, 10, 6), ymd(2025, 10, 13), ymd(2025, 10, 20)]
    );
    assert_eq!(curve.counts(DateClass::Actual), vec![1, 1, 1, 2]);
}

proptest! {
    /// 每个口径累计值单调不减，且末点等于该口径有日期的记录数
    #[test]
    fn prop_cumulative_is_monotonic(
        offsets in proptest::collection::vec((0i64..120, proptest::option::of(0i64..120)), 1..30),
        weekly in any::<bool>(),
    ) {
        let base = ymd(2025, 9, 1);
        let records: Vec<TagRecord> = offsets
            .iter()
            .enumerate()
            .map(|(idx, (planned, actual))| {
                let planned_text = format_tag_date(base + Duration::days(*planned));
                let mut dates = vec![(DateField::BaselinePlanned, planned_text)];
                if let Some(actual) = actual {
                    dates.push((
                        DateField::ActualCompletion,
                        format_tag_date(base + Duration::days(*actual)),
                    ));
                }
                let dates: Vec<(DateField, &str)> =
                    dates.iter().map(|(f, v)| (*f, v.as_str())).collect();
                record_with_dates(&format!("E-{}", idx), Discipline::Electrical, &dates)
            })
            .collect();
        let granularity = if weekly { AxisGranularity::Weekly } else { AxisGranularity::Daily };

        let curve = builder().build(
            &records,
            &[DateClass::Planned, DateClass::Actual],
            granularity,
        );

        prop_assert!(!curve.is_empty());
        for class in [DateClass::Planned, DateClass::Actual] {
            let counts = curve.counts(class);
            prop_assert_eq!(counts.len(), curve.axis.len());
            prop_assert!(counts.windows(2).all(|w| w[0] <= w[1]));
            let dated = offsets
                .iter()
                .filter(|(_, actual)| class == DateClass::Planned || actual.is_some())
                .count();
            prop_assert_eq!(counts.last().copied().unwrap_or(0), dated);
        }
        prop_assert!(curve.axis.windows(2).all(|w| w[0] < w[1]));
    }
}
