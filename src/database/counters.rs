use super::connection::{DbPool, get_connection_with_retry};
use super::names;
use crate::error::{RegistryError, RegistryResult};
use crate::models::package::*;
use crate::models::pointer::Pointer;
use crate::schema::{packages, stars};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::{debug, info, warn};
use std::collections::HashMap;

/// Aggregate counters cached on the package row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Downloads,
    Stargazers,
}

impl Counter {
    fn label(&self) -> &'static str {
        match self {
            Counter::Downloads => "downloads",
            Counter::Stargazers => "stargazers",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    Increment,
    Decrement,
}

/// Counter maintenance for downloads and stargazers
pub struct CounterOperations<'a> {
    pool: &'a DbPool,
}

impl<'a> CounterOperations<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    pub fn increment_downloads(&self, name: &str) -> RegistryResult<PackageSummary> {
        self.apply(name, Counter::Downloads, Delta::Increment)
    }

    pub fn decrement_downloads(&self, name: &str) -> RegistryResult<PackageSummary> {
        self.apply(name, Counter::Downloads, Delta::Decrement)
    }

    pub fn increment_stars(&self, name: &str) -> RegistryResult<PackageSummary> {
        self.apply(name, Counter::Stargazers, Delta::Increment)
    }

    pub fn decrement_stars(&self, name: &str) -> RegistryResult<PackageSummary> {
        self.apply(name, Counter::Stargazers, Delta::Decrement)
    }

    fn apply(&self, name: &str, counter: Counter, delta: Delta) -> RegistryResult<PackageSummary> {
        let mut conn = get_connection_with_retry(self.pool)?;
        conn.immediate_transaction::<_, RegistryError, _>(|conn| {
            let pointer = names::resolve(conn, name)?;
            adjust(conn, &pointer, counter, delta)?;
            let package = packages::table
                .filter(packages::pointer.eq(&pointer))
                .first::<Package>(conn)?;
            Ok(package.summary())
        })
    }

    /// Recomputes `stargazers_count` from the star edges.
    ///
    /// Returns the number of packages whose cached count had drifted.
    pub fn reconcile_star_counts(&self) -> RegistryResult<usize> {
        let mut conn = get_connection_with_retry(self.pool)?;
        conn.immediate_transaction::<_, RegistryError, _>(|conn| {
            let edge_counts: HashMap<Pointer, i64> = stars::table
                .group_by(stars::package)
                .select((stars::package, count_star()))
                .load::<(Pointer, i64)>(conn)?
                .into_iter()
                .collect();

            let cached = packages::table
                .select((packages::pointer, packages::name, packages::stargazers_count))
                .load::<(Pointer, String, i64)>(conn)?;

            let mut corrected = 0;
            for (pointer, name, count) in cached {
                let actual = edge_counts.get(&pointer).copied().unwrap_or(0);
                if count != actual {
                    warn!("Stargazer count for '{name}' drifted: cached {count}, edges {actual}");
                    diesel::update(packages::table.filter(packages::pointer.eq(&pointer)))
                        .set(packages::stargazers_count.eq(actual))
                        .execute(conn)?;
                    corrected += 1;
                }
            }

            info!("Star count reconciliation corrected {corrected} package(s)");
            Ok(corrected)
        })
    }
}

/// Relative, floored update of one counter.
///
/// This is the only place counters are written; both the star edge path and
/// the plain counter path go through it. Must run inside the caller's
/// transaction after the pointer has been resolved.
pub(crate) fn adjust(
    conn: &mut SqliteConnection,
    pointer: &Pointer,
    counter: Counter,
    delta: Delta,
) -> RegistryResult<()> {
    let target = packages::table.filter(packages::pointer.eq(pointer));

    let affected = match (counter, delta) {
        (Counter::Downloads, Delta::Increment) => diesel::update(target)
            .set(packages::downloads.eq(packages::downloads + 1))
            .execute(conn)?,
        (Counter::Downloads, Delta::Decrement) => {
            diesel::update(target.filter(packages::downloads.gt(0)))
                .set(packages::downloads.eq(packages::downloads - 1))
                .execute(conn)?
        }
        (Counter::Stargazers, Delta::Increment) => diesel::update(target)
            .set(packages::stargazers_count.eq(packages::stargazers_count + 1))
            .execute(conn)?,
        (Counter::Stargazers, Delta::Decrement) => {
            // Floored at the number of star edges rather than zero
            let edges: i64 = stars::table
                .filter(stars::package.eq(pointer))
                .count()
                .get_result(conn)?;
            diesel::update(target.filter(packages::stargazers_count.gt(edges)))
                .set(packages::stargazers_count.eq(packages::stargazers_count - 1))
                .execute(conn)?
        }
    };

    if affected == 0 {
        return Err(match (counter, delta) {
            (_, Delta::Increment) => {
                RegistryError::NotFound(format!("Package {pointer} not found"))
            }
            (Counter::Downloads, Delta::Decrement) => RegistryError::Conflict(
                "Cannot decrement downloads: counter is already zero".to_string(),
            ),
            (Counter::Stargazers, Delta::Decrement) => RegistryError::Conflict(
                "Cannot decrement stargazers below the number of star edges".to_string(),
            ),
        });
    }

    debug!("Adjusted {} ({:?}) for {}", counter.label(), delta, pointer);
    Ok(())
}
