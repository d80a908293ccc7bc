//! Advisory rate limits published by the service.
//!
//! Nothing in this crate enforces these numbers. They exist so that a
//! caller-side throttler (token bucket, backoff, ...) can be configured per
//! endpoint without hard-coding the table.

use std::time::Duration;

/// A sustained rate of one request per `rate`, with `burst` requests of
/// headroom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub rate: Duration,
    pub burst: u32,
}

impl Limit {
    /// Applies to the total number of changes submitted across
    /// `file/edit` and `doc/edit` calls.
    pub const PER_CHANGE: Limit = Limit {
        rate: Duration::from_millis(250),
        burst: 500,
    };

    pub fn requests_per_second(&self) -> f64 {
        1.0 / self.rate.as_secs_f64()
    }
}

/// The service's endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    FileList,
    FileEdit,
    DocRead,
    DocEdit,
    InboxAdd,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::FileList,
        Endpoint::FileEdit,
        Endpoint::DocRead,
        Endpoint::DocEdit,
        Endpoint::InboxAdd,
    ];

    /// Path relative to the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::FileList => "file/list",
            Endpoint::FileEdit => "file/edit",
            Endpoint::DocRead => "doc/read",
            Endpoint::DocEdit => "doc/edit",
            Endpoint::InboxAdd => "inbox/add",
        }
    }

    pub fn limit(self) -> Limit {
        match self {
            Endpoint::FileList | Endpoint::InboxAdd => Limit {
                rate: Duration::from_secs(10),
                burst: 10,
            },
            Endpoint::FileEdit | Endpoint::DocRead => Limit {
                rate: Duration::from_secs(1),
                burst: 50,
            },
            Endpoint::DocEdit => Limit {
                rate: Duration::from_secs(1),
                burst: 20,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_edit_limit_never_drifts() {
        for _ in 0..100 {
            let limit = Endpoint::DocEdit.limit();
            assert_eq!(limit.burst, 20);
            assert_eq!(limit.rate, Duration::from_secs(1));
        }
    }

    #[test]
    fn table_matches_published_limits() {
        assert_eq!(Endpoint::FileList.limit(), Endpoint::InboxAdd.limit());
        assert_eq!(Endpoint::FileList.limit().rate, Duration::from_secs(10));
        assert_eq!(Endpoint::FileEdit.limit().burst, 50);
        assert_eq!(Endpoint::DocRead.limit().burst, 50);
        assert_eq!(Limit::PER_CHANGE.burst, 500);
        assert_eq!(Limit::PER_CHANGE.requests_per_second(), 4.0);
    }

    #[test]
    fn paths_are_distinct() {
        let mut paths: Vec<_> = Endpoint::ALL.iter().map(|e| e.path()).collect();
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), Endpoint::ALL.len());
    }
}
