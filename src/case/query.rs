use crate::case::model::{Priority, Status, TestCase};
use crate::directory::model::DirectorySelection;
use serde::Serialize;

pub const DEFAULT_ROWS_PER_PAGE: usize = 10;

/// Field filters. `None` is the "All" sentinel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestCaseFilters {
    pub search: String,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub assignee: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCaseQuery {
    pub project_id: String,
    pub filters: TestCaseFilters,
    pub directory: DirectorySelection,
    /// 1-based.
    pub page: usize,
    pub rows_per_page: usize,
}

impl TestCaseQuery {
    pub fn for_project(project_id: impl Into<String>) -> Self {
        TestCaseQuery {
            project_id: project_id.into(),
            filters: TestCaseFilters::default(),
            directory: DirectorySelection::All,
            page: 1,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }

    /// Resolves the synthetic directories into the status filter they stand for.
    fn effective(&self) -> (Option<Status>, &DirectorySelection) {
        match &self.directory {
            DirectorySelection::Drafts => (Some(Status::Draft), &DirectorySelection::All),
            DirectorySelection::Trash => (Some(Status::Archived), &DirectorySelection::All),
            selection => (self.filters.status, selection),
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct QueryPage<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub page: usize,
    pub rows_per_page: usize,
    pub total_pages: usize,
}

pub fn total_pages(total_count: usize, rows_per_page: usize) -> usize {
    if rows_per_page == 0 {
        0
    } else {
        total_count.div_ceil(rows_per_page)
    }
}

/// Clamps a requested page into `1..=total_pages`, for callers that page through results.
pub fn clamp_page(page: usize, total_count: usize, rows_per_page: usize) -> usize {
    page.clamp(1, total_pages(total_count, rows_per_page).max(1))
}

/// Filters and paginates `records` for `query`. Archived records only show up
/// when the effective status filter is exactly `Archived`.
pub fn run_query<'a, I>(records: I, query: &TestCaseQuery) -> QueryPage<TestCase>
where
    I: IntoIterator<Item = &'a TestCase>,
{
    let (status, directory) = query.effective();
    let wants_archived = status == Some(Status::Archived);
    let search = query.filters.search.to_lowercase();

    let matches: Vec<&TestCase> = records
        .into_iter()
        .filter(|tc| tc.project_id == query.project_id)
        .filter(|tc| tc.is_archived() == wants_archived)
        .filter(|tc| directory.includes(&tc.directory))
        .filter(|tc| status.map_or(true, |s| tc.status == s))
        .filter(|tc| query.filters.priority.map_or(true, |p| tc.priority == p))
        .filter(|tc| query.filters.assignee.as_ref().map_or(true, |a| &tc.assignee == a))
        .filter(|tc| {
            search.is_empty()
                || tc.name.to_lowercase().contains(&search)
                || tc.case_code.to_lowercase().contains(&search)
        })
        .collect();

    let total_count = matches.len();
    let items = match query.page.checked_sub(1) {
        Some(offset_pages) if query.rows_per_page > 0 => matches
            .into_iter()
            .skip(offset_pages.saturating_mul(query.rows_per_page))
            .take(query.rows_per_page)
            .cloned()
            .collect(),
        _ => vec![],
    };

    QueryPage {
        items,
        total_count,
        page: query.page,
        rows_per_page: query.rows_per_page,
        total_pages: total_pages(total_count, query.rows_per_page),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn case(id: &str, project_id: &str, directory: &str, status: Status, priority: Priority) -> TestCase {
        TestCase::builder()
            .id(id.to_string())
            .case_code(id.to_uppercase())
            .name(format!("Verify {}", id))
            .priority(priority)
            .status(status)
            .assignee("Admin User".to_string())
            .last_updated(NaiveDate::default())
            .project_id(project_id.to_string())
            .directory(directory.to_string())
            .build()
    }

    fn store() -> Vec<TestCase> {
        vec![
            case("tc-login", "p1", "authentication", Status::Approved, Priority::Critical),
            case("tc-sso", "p1", "authentication/sso", Status::Draft, Priority::High),
            case("tc-authz", "p1", "authorization", Status::Draft, Priority::Low),
            case("tc-old", "p1", "legacy", Status::Archived, Priority::Low),
            case("tc-old-sso", "p1", "authentication/sso", Status::Archived, Priority::Medium),
            case("tc-other", "p2", "authentication", Status::Draft, Priority::High),
        ]
    }

    fn ids(page: &QueryPage<TestCase>) -> Vec<&str> {
        page.items.iter().map(|tc| tc.id.as_str()).collect()
    }

    #[test]
    fn default_query_hides_archived_and_other_projects() {
        let page = run_query(&store(), &TestCaseQuery::for_project("p1"));
        assert_eq!(ids(&page), vec!["tc-login", "tc-sso", "tc-authz"]);
        assert_eq!(page.total_count, 3);
    }

    #[test]
    fn archived_filter_shows_only_archived() {
        let mut query = TestCaseQuery::for_project("p1");
        query.filters.status = Some(Status::Archived);
        let page = run_query(&store(), &query);
        assert_eq!(ids(&page), vec!["tc-old", "tc-old-sso"]);
    }

    #[test]
    fn trash_alias_overrides_status_and_directory() {
        let mut query = TestCaseQuery::for_project("p1");
        query.directory = DirectorySelection::Trash;
        query.filters.status = Some(Status::Approved);
        let page = run_query(&store(), &query);
        assert_eq!(ids(&page), vec!["tc-old", "tc-old-sso"]);
    }

    #[test]
    fn drafts_alias_selects_drafts_everywhere() {
        let mut query = TestCaseQuery::for_project("p1");
        query.directory = DirectorySelection::Drafts;
        let page = run_query(&store(), &query);
        assert_eq!(ids(&page), vec!["tc-sso", "tc-authz"]);
    }

    #[test]
    fn directory_selection_includes_descendants_only() {
        let mut query = TestCaseQuery::for_project("p1");
        query.directory = DirectorySelection::parse("authentication");
        let page = run_query(&store(), &query);
        assert_eq!(ids(&page), vec!["tc-login", "tc-sso"]);
        assert!(page
            .items
            .iter()
            .all(|tc| tc.directory == "authentication" || tc.directory.starts_with("authentication/")));
    }

    #[test]
    fn search_matches_name_or_code_case_insensitively() {
        let mut query = TestCaseQuery::for_project("p1");
        query.filters.search = "SSO".to_string();
        assert_eq!(ids(&run_query(&store(), &query)), vec!["tc-sso"]);

        query.filters.search = "tc-LOG".to_string();
        assert_eq!(ids(&run_query(&store(), &query)), vec!["tc-login"]);
    }

    #[test]
    fn search_whitespace_is_part_of_the_needle() {
        let mut query = TestCaseQuery::for_project("p1");
        query.filters.search = "verify tc-s".to_string();
        assert_eq!(ids(&run_query(&store(), &query)), vec!["tc-sso"]);

        query.filters.search = " sso".to_string();
        assert!(run_query(&store(), &query).items.is_empty());
    }

    #[test]
    fn exact_filters_combine() {
        let mut query = TestCaseQuery::for_project("p1");
        query.filters.priority = Some(Priority::High);
        query.filters.assignee = Some("Admin User".to_string());
        assert_eq!(ids(&run_query(&store(), &query)), vec!["tc-sso"]);

        query.filters.assignee = Some("Nobody".to_string());
        assert!(run_query(&store(), &query).items.is_empty());
    }

    #[test]
    fn unknown_project_is_empty() {
        let page = run_query(&store(), &TestCaseQuery::for_project("missing"));
        assert_eq!(page.total_count, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn twenty_five_drafts_paginate_by_ten() {
        let records: Vec<TestCase> = (0..25)
            .map(|i| case(&format!("tc-{:02}", i), "p1", "authentication", Status::Draft, Priority::Medium))
            .collect();
        let mut query = TestCaseQuery::for_project("p1");
        query.filters.status = Some(Status::Draft);

        let first = run_query(&records, &query);
        assert_eq!(first.total_count, 25);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_pages, 3);

        query.page = 3;
        let last = run_query(&records, &query);
        assert_eq!(ids(&last), vec!["tc-20", "tc-21", "tc-22", "tc-23", "tc-24"]);
    }

    #[test]
    fn page_bounds_hold_for_every_page() {
        let records: Vec<TestCase> = (0..23)
            .map(|i| case(&format!("tc-{:02}", i), "p1", "authentication", Status::Approved, Priority::Low))
            .collect();
        for rows_per_page in [1, 5, 10, 50] {
            let last_page = total_pages(23, rows_per_page);
            for page in 0..=last_page + 2 {
                let query = TestCaseQuery {
                    page,
                    rows_per_page,
                    ..TestCaseQuery::for_project("p1")
                };
                let result = run_query(&records, &query);
                assert!(result.items.len() <= rows_per_page);
                assert!(result.total_count >= result.items.len());
                assert_eq!(result.total_count, 23);
                if page == 0 || page > last_page {
                    assert!(result.items.is_empty());
                }
            }
        }
    }

    #[test]
    fn zero_rows_per_page_yields_nothing() {
        let query = TestCaseQuery {
            rows_per_page: 0,
            ..TestCaseQuery::for_project("p1")
        };
        let page = run_query(&store(), &query);
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 3);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn clamp_page_stays_in_range() {
        assert_eq!(clamp_page(0, 25, 10), 1);
        assert_eq!(clamp_page(7, 25, 10), 3);
        assert_eq!(clamp_page(2, 0, 10), 1);
    }
}
