//! 날짜 정렬 및 forward-fill.
//!
//! 여러 지수 테이블을 공통 날짜 집합(모든 테이블 날짜의 합집합)에 맞춥니다.
//! 테이블에 없는 날짜는 그 이전 가장 최근 날짜의 값을 그대로 가져옵니다.
//! 이전 값이 없는 날짜(테이블의 첫 날짜보다 앞선 날짜)는 채우지 않습니다.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use crate::types::PriceBar;

/// 여러 테이블의 날짜 합집합 (오름차순, 중복 제거).
pub fn union_dates<I, D>(tables: I) -> Vec<NaiveDate>
where
    I: IntoIterator<Item = D>,
    D: IntoIterator<Item = NaiveDate>,
{
    tables
        .into_iter()
        .flatten()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// `all_dates`에 맞춰 재색인하고 forward-fill한 전체 시계열.
///
/// 입력은 정렬되어 있지 않아도 되며 같은 날짜가 여러 번 있으면 마지막 행을 사용합니다.
/// `all_dates`에 없는 기존 날짜는 결과에서 제외됩니다.
pub fn forward_fill(bars: &[PriceBar], all_dates: &[NaiveDate]) -> Vec<PriceBar> {
    let by_date: BTreeMap<NaiveDate, &PriceBar> = bars.iter().map(|b| (b.date, b)).collect();

    let mut filled = Vec::with_capacity(all_dates.len());
    let mut last: Option<&PriceBar> = None;

    for &date in all_dates {
        // 현재 날짜 이전(포함)의 가장 최근 행
        if let Some(bar) = by_date.get(&date) {
            last = Some(*bar);
        } else if let Some((_, bar)) = by_date.range(..date).next_back() {
            last = Some(*bar);
        }

        if let Some(bar) = last {
            filled.push(bar.carried_to(date));
        }
    }

    filled
}

/// forward-fill로 새로 생기는 행만 반환 (기존 날짜는 제외).
pub fn missing_rows(bars: &[PriceBar], all_dates: &[NaiveDate]) -> Vec<PriceBar> {
    let existing: BTreeSet<NaiveDate> = bars.iter().map(|b| b.date).collect();

    forward_fill(bars, all_dates)
        .into_iter()
        .filter(|b| !existing.contains(&b.date))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn bar(d: u32, close: i64) -> PriceBar {
        let price = Decimal::from(close);
        PriceBar {
            date: day(d),
            open: price,
            high: price,
            low: price,
            close: price,
            adjusted_close: price,
            volume: Some(close * 10),
        }
    }

    #[test]
    fn test_union_dates_sorted_and_unique() {
        let a = vec![day(4), day(1), day(2)];
        let b = vec![day(3), day(1), day(4)];
        assert_eq!(union_dates([a, b]), vec![day(1), day(2), day(3), day(4)]);
    }

    #[test]
    fn test_union_dates_empty() {
        let tables: Vec<Vec<NaiveDate>> = vec![Vec::new(), Vec::new()];
        assert!(union_dates(tables).is_empty());
    }

    #[test]
    fn test_forward_fill_two_tables() {
        let a = vec![bar(1, 100), bar(2, 101), bar(4, 104)];
        let b = vec![bar(1, 200), bar(3, 203), bar(4, 204)];
        let all = union_dates([
            a.iter().map(|x| x.date).collect::<Vec<_>>(),
            b.iter().map(|x| x.date).collect::<Vec<_>>(),
        ]);

        let filled_a = forward_fill(&a, &all);
        let filled_b = forward_fill(&b, &all);

        assert_eq!(
            filled_a.iter().map(|x| x.date).collect::<Vec<_>>(),
            all
        );
        assert_eq!(
            filled_b.iter().map(|x| x.date).collect::<Vec<_>>(),
            all
        );

        // A의 3일 = A의 2일, B의 2일 = B의 1일
        assert_eq!(filled_a[2], bar(2, 101).carried_to(day(3)));
        assert_eq!(filled_b[1], bar(1, 200).carried_to(day(2)));
    }

    #[test]
    fn test_leading_dates_stay_unfilled() {
        let bars = vec![bar(3, 300)];
        let all = vec![day(1), day(2), day(3), day(4)];

        let filled = forward_fill(&bars, &all);
        assert_eq!(
            filled.iter().map(|x| x.date).collect::<Vec<_>>(),
            vec![day(3), day(4)]
        );
    }

    #[test]
    fn test_duplicate_dates_keep_last() {
        let bars = vec![bar(1, 100), bar(1, 111)];
        let filled = forward_fill(&bars, &[day(1), day(2)]);

        assert_eq!(filled.len(), 2);
        assert_eq!(filled[1].close, Decimal::from(111));
    }

    #[test]
    fn test_missing_rows_only_returns_new_dates() {
        let bars = vec![bar(1, 100), bar(4, 104)];
        let all = vec![day(1), day(2), day(3), day(4)];

        let missing = missing_rows(&bars, &all);
        assert_eq!(
            missing,
            vec![
                bar(1, 100).carried_to(day(2)),
                bar(1, 100).carried_to(day(3)),
            ]
        );
    }

    #[test]
    fn test_missing_rows_idempotent_after_fill() {
        let bars = vec![bar(1, 100), bar(3, 103)];
        let all = vec![day(1), day(2), day(3)];

        let filled = forward_fill(&bars, &all);
        assert!(missing_rows(&filled, &all).is_empty());
    }
}
