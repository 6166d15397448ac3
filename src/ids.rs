use std::sync::atomic::{AtomicU64, Ordering};

/// Source of record identifiers. Injected into the repository so tests can
/// swap the random generator for a predictable one.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self, prefix: &str) -> String;
}

pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, uuid::Uuid::new_v4())
    }
}

#[derive(Default)]
pub struct SequentialIds {
    counter: AtomicU64,
}

impl IdGenerator for SequentialIds {
    fn next_id(&self, prefix: &str) -> String {
        let next = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{:04}", prefix, next)
    }
}

/// Short upper-case token derived from an id, used for human readable codes.
pub fn short_code(id: &str) -> String {
    let token: String = id
        .rsplit('-')
        .next()
        .unwrap_or(id)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect();
    token.to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids_are_monotonic() {
        let ids = SequentialIds::default();
        assert_eq!(ids.next_id("proj"), "proj-0001");
        assert_eq!(ids.next_id("proj"), "proj-0002");
        assert_eq!(ids.next_id("ts"), "ts-0003");
    }

    #[test]
    fn uuid_ids_do_not_collide() {
        let ids = UuidIds;
        let first = ids.next_id("tc");
        let second = ids.next_id("tc");
        assert!(first.starts_with("tc-"));
        assert_ne!(first, second);
    }

    #[test]
    fn short_code_takes_last_segment() {
        assert_eq!(short_code("tc-0042"), "0042");
        assert_eq!(short_code("tc-9f1c2ab3-1111-2222-3333-44445555abcd"), "44445555");
    }
}
