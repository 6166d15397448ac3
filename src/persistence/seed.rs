use crate::case::model::{Priority, Status, TestCase};
use crate::directory::model::DirectoryNode;
use crate::persistence::memory::MemoryStore;
use crate::project::model::Project;
use crate::suite::model::TestSuite;
use chrono::NaiveDate;
use tracing::info;

const ADMIN: &str = "Admin User";

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn project(id: &str, name: &str, client: &str, key: &str) -> Project {
    Project::builder()
        .id(id.to_string())
        .name(name.to_string())
        .client(client.to_string())
        .key(key.to_string())
        .build()
}

fn suite(id: &str, project_id: &str, name: &str, description: &str) -> TestSuite {
    TestSuite::builder()
        .id(id.to_string())
        .project_id(project_id.to_string())
        .name(name.to_string())
        .description(description.to_string())
        .build()
}

fn case(id: &str, code: &str, name: &str, priority: Priority, status: Status, updated: NaiveDate, project_id: &str, directory: &str) -> TestCase {
    TestCase::builder()
        .id(id.to_string())
        .case_code(code.to_string())
        .name(name.to_string())
        .priority(priority)
        .status(status)
        .assignee(ADMIN.to_string())
        .last_updated(updated)
        .project_id(project_id.to_string())
        .directory(directory.to_string())
        .build()
}

pub fn projects() -> Vec<Project> {
    vec![
        project("proj-001", "E-commerce System", "Client A", "ECA"),
        project("proj-002", "Mobile Banking App", "Bank Sejahtera", "MBANK"),
        project("proj-003", "Data Analytics Platform", "Internal", "PADI"),
        project("proj-004", "Inventory Management System", "Gudang Jaya", "SMI"),
    ]
}

pub fn suites() -> Vec<TestSuite> {
    vec![
        suite("ts-01", "proj-001", "User Account Management", "Registration, login and profile flows."),
        suite("ts-02", "proj-001", "Checkout", "From the shopping cart to a successful payment."),
        suite("ts-03", "proj-002", "Fund Transfers", "Transfers between accounts and between banks."),
        suite("ts-04", "proj-002", "Balance & History", "Accuracy of balances and transaction history."),
        suite("ts-05", "proj-003", "Dashboard Visualisation", "Every widget and chart on the main dashboard."),
        suite("ts-06", "proj-001", "Product Search", "Product search and filtering."),
    ]
}

pub fn test_cases() -> Vec<TestCase> {
    let updated = date(2025, 10, 18);
    let mut cases = vec![
        case("tc-22C99939", "TC-22C99939", "Verify successful login with valid credentials", Priority::Critical, Status::Approved, updated, "proj-001", "authentication"),
        case("tc-3936E24A", "TC-3936E24A", "Verify login failure with empty password field", Priority::High, Status::Approved, updated, "proj-001", "authentication"),
        case("tc-39404DC2", "TC-39404DC2", "Verify login failure with invalid username", Priority::High, Status::InReview, updated, "proj-001", "authentication"),
        case("tc-4768259F", "TC-4768259F", "Verify login failure with a disabled/inactive account", Priority::Medium, Status::Draft, updated, "proj-001", "authentication"),
        case("tc-4D4AD433", "TC-4D4AD433", "Verify account lockout mechanism after multiple failures", Priority::Critical, Status::Approved, updated, "proj-001", "authentication/security"),
        case("tc-5553F5D6", "TC-5553F5D6", "Login with Invalid Password", Priority::High, Status::Approved, updated, "proj-001", "authentication"),
        case("tc-arch-001", "TC-ARCH-001", "Legacy login verification (deprecated)", Priority::Low, Status::Archived, date(2024, 1, 5), "proj-001", "legacy"),
    ];

    let statuses = [Status::Draft, Status::InReview, Status::Approved, Status::NeedUpdate];
    let priorities = [Priority::High, Priority::Medium, Priority::Low, Priority::Critical];
    cases.extend((0..25usize).map(|i| {
        let directory = if i % 5 == 0 { "authentication/sso" } else { "authentication" };
        case(
            &format!("tc-auth-00{}", i + 1),
            &format!("TC-AUTH-00{}", i + 1),
            &format!("User Authentication Test Case #{}", i + 1),
            priorities[i % 4],
            statuses[i % 4],
            date(2025, 10, 10 + (i % 15) as u32),
            "proj-001",
            directory,
        )
    }));

    let statuses = [Status::Draft, Status::Approved, Status::Archived];
    let priorities = [Priority::High, Priority::Medium, Priority::Low];
    cases.extend((0..15usize).map(|i| {
        case(
            &format!("tc-mbank-00{}", i + 1),
            &format!("TC-MBANK-00{}", i + 1),
            &format!("Mobile Banking Feature Test #{}", i + 1),
            priorities[i % 3],
            statuses[i % 3],
            date(2025, 10, 10 + (i % 15) as u32),
            "proj-002",
            "transfers",
        )
    }));
    cases
}

pub fn directory_trees() -> Vec<(String, Vec<DirectoryNode>)> {
    vec![
        (
            "proj-001".to_string(),
            vec![
                DirectoryNode::new("authentication", "authentication").with_children(vec![
                    DirectoryNode::new("authentication/sso", "sso"),
                    DirectoryNode::new("authentication/security", "security"),
                ]),
                DirectoryNode::new("legacy", "legacy"),
            ],
        ),
        ("proj-002".to_string(), vec![DirectoryNode::new("transfers", "transfers")]),
    ]
}

pub async fn load(store: &MemoryStore) {
    let projects = projects();
    let suites = suites();
    let test_cases = test_cases();
    info!(
        projects = projects.len(),
        suites = suites.len(),
        test_cases = test_cases.len(),
        "Seeding memory store"
    );
    store.projects.write().await.extend(projects);
    store.suites.write().await.extend(suites);
    store.test_cases.write().await.extend(test_cases);
    store.directories.write().await.extend(directory_trees());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::tree;

    #[test]
    fn every_seeded_case_lives_in_a_known_directory() {
        let trees: std::collections::HashMap<String, Vec<DirectoryNode>> = directory_trees().into_iter().collect();
        for tc in test_cases() {
            let nodes = trees.get(&tc.project_id).expect("seeded project has a tree");
            assert!(tree::contains(nodes, &tc.directory), "{} in {}", tc.id, tc.directory);
        }
    }

    #[test]
    fn seeded_keys_are_unique() {
        let mut keys: Vec<String> = projects().into_iter().map(|p| p.key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 4);
    }
}
