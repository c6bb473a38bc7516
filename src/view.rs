//! Derived views over the record list: filter, sort, paginate, and the
//! summary stats. Everything here is pure; callers pass "now" explicitly.

use crate::models::{
    CoiRecord, CoiStatus, DashboardStats, ExpiryRange, PageResponse, PageSize, SortConfig, SortDirection, SortKey,
    StatusFilter, ViewCriteria, ALL_PROPERTIES_SENTINEL,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};

const WINDOW_DAYS: i64 = 30;

pub fn matches_search(record: &CoiRecord, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    [&record.tenant_name, &record.property, &record.unit, &record.coi_name]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

pub fn matches_status(record: &CoiRecord, filter: StatusFilter) -> bool {
    match filter {
        StatusFilter::All => true,
        StatusFilter::Only(status) => record.status == status,
    }
}

/// Bounds are inclusive calendar dates. A record without a usable expiry
/// date only passes ranges that constrain nothing.
pub fn matches_expiry(record: &CoiRecord, range: ExpiryRange, today: NaiveDate) -> bool {
    let window = Duration::days(WINDOW_DAYS);
    let (start, end) = match range {
        ExpiryRange::All => return true,
        ExpiryRange::Last30Days => (Some(today - window), Some(today)),
        ExpiryRange::Next30Days => (Some(today), Some(today + window)),
        ExpiryRange::Custom { start: None, end: None } => return true,
        ExpiryRange::Custom { start, end } => (start, end),
    };

    let Some(expiry) = record.expiry() else {
        return false;
    };
    start.map_or(true, |start| expiry >= start) && end.map_or(true, |end| expiry <= end)
}

pub fn matches(record: &CoiRecord, criteria: &ViewCriteria, today: NaiveDate) -> bool {
    matches_search(record, &criteria.search)
        && matches_status(record, criteria.status)
        && criteria.properties.matches(&record.property)
        && matches_expiry(record, criteria.expiry, today)
}

pub fn filter_records<'a>(records: &'a [CoiRecord], criteria: &ViewCriteria, today: NaiveDate) -> Vec<&'a CoiRecord> {
    records
        .iter()
        .filter(|record| matches(record, criteria, today))
        .collect()
}

/// Stable lexicographic sort on the key's string form.
pub fn sort_records(rows: &mut [&CoiRecord], sort: Option<SortConfig>) {
    let Some(sort) = sort else {
        return;
    };
    rows.sort_by(|a, b| {
        let ordering = a.sort_value(sort.key).cmp(&b.sort_value(sort.key));
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// Filtered then sorted rows, the order shown in the table and exported.
pub fn visible_rows<'a>(records: &'a [CoiRecord], criteria: &ViewCriteria, today: NaiveDate) -> Vec<&'a CoiRecord> {
    let mut rows = filter_records(records, criteria, today);
    sort_records(&mut rows, criteria.sort);
    tracing::debug!(total = records.len(), visible = rows.len(), "recomputed visible rows");
    rows
}

/// Header click: the active ascending key flips to descending, anything else
/// sorts ascending.
pub fn next_sort(current: Option<SortConfig>, key: SortKey) -> SortConfig {
    let direction = match current {
        Some(current) if current.key == key && current.direction == SortDirection::Asc => SortDirection::Desc,
        _ => SortDirection::Asc,
    };
    SortConfig { key, direction }
}

pub fn total_pages(count: usize, page_size: PageSize) -> usize {
    count.div_ceil(page_size.get()).max(1)
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

pub fn previous_page(page: usize, total_pages: usize) -> usize {
    clamp_page(page.saturating_sub(1), total_pages)
}

pub fn next_page(page: usize, total_pages: usize) -> usize {
    clamp_page(page.saturating_add(1), total_pages)
}

/// Direct page entry; out-of-range requests are ignored.
pub fn go_to_page(requested: usize, total_pages: usize) -> Option<usize> {
    (1..=total_pages).contains(&requested).then_some(requested)
}

pub fn paginate<T: Clone>(rows: &[T], page: usize, page_size: PageSize) -> PageResponse<T> {
    let total_pages = total_pages(rows.len(), page_size);
    let page = clamp_page(page, total_pages);
    let start = (page - 1) * page_size.get();
    let items = rows.iter().skip(start).take(page_size.get()).cloned().collect();

    PageResponse {
        items,
        page,
        page_size: page_size.get(),
        total_pages,
        total_items: rows.len(),
    }
}

pub fn compute_page(records: &[CoiRecord], criteria: &ViewCriteria, today: NaiveDate) -> PageResponse<CoiRecord> {
    let rows = visible_rows(records, criteria, today)
        .into_iter()
        .cloned()
        .collect::<Vec<_>>();
    paginate(&rows, criteria.page, criteria.page_size)
}

/// Stat cards. Always computed over the full list, never the filtered view.
pub fn compute_stats(records: &[CoiRecord], now: DateTime<Utc>) -> DashboardStats {
    let horizon = now + Duration::days(WINDOW_DAYS);
    DashboardStats {
        total: records.len(),
        accepted: records.iter().filter(|r| r.status == CoiStatus::Active).count(),
        rejected: records.iter().filter(|r| r.status == CoiStatus::Rejected).count(),
        expiring_in_30_days: records
            .iter()
            .filter_map(CoiRecord::expiry_instant)
            .filter(|expiry| *expiry > now && *expiry <= horizon)
            .count(),
    }
}

/// Property dropdown entries: the sentinel, then distinct properties in
/// store order.
pub fn property_options(records: &[CoiRecord]) -> Vec<String> {
    let mut options = vec![ALL_PROPERTIES_SENTINEL.to_string()];
    for record in records {
        if !options.iter().any(|option| option == &record.property) {
            options.push(record.property.clone());
        }
    }
    options
}
