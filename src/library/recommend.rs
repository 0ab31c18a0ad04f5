use std::collections::{BTreeMap, HashSet};

use rand::{Rng, seq::IndexedRandom};

use crate::{error::Error, model::CatalogBook};

use super::visibility::Viewer;

/// Minimal view of a reading-list entry needed by the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddedBookRef {
    pub book_id: i64,
    pub category_id: i64,
}

/// Source of candidate books. Every pool already has private books the
/// viewer cannot see removed.
pub trait BookPool {
    fn category_pool(
        &self,
        viewer: &Viewer,
        category_id: i64,
        excluded: &HashSet<i64>,
    ) -> impl Future<Output = Result<Vec<CatalogBook>, Error>> + Send;

    fn fallback_pool(
        &self,
        viewer: &Viewer,
        excluded: &HashSet<i64>,
    ) -> impl Future<Output = Result<Vec<CatalogBook>, Error>> + Send;
}

#[derive(Debug, Clone, Copy)]
pub struct Recommender {
    threshold: usize,
}

impl Recommender {
    pub fn new(threshold: usize) -> Self {
        Recommender { threshold }
    }

    /// A pool is only sampled when it holds strictly more books than the
    /// threshold.
    pub fn accepts(&self, pool_size: usize) -> bool {
        pool_size > self.threshold
    }

    /// Picks the pool to sample from. The category pool excludes the viewer's
    /// reading list and `extra_excluded`; the fallback pool only excludes
    /// `extra_excluded`.
    #[tracing::instrument(name = "recommendation pool", skip_all, fields(added = added.len()))]
    pub async fn candidate_pool<P: BookPool + Sync>(
        &self,
        source: &P,
        viewer: &Viewer,
        added: &[AddedBookRef],
        extra_excluded: &HashSet<i64>,
    ) -> Result<Vec<CatalogBook>, Error> {
        if let Some(category_id) = most_read_category(added) {
            let mut excluded: HashSet<i64> = added.iter().map(|a| a.book_id).collect();
            excluded.extend(extra_excluded.iter().copied());

            let pool = source.category_pool(viewer, category_id, &excluded).await?;
            if self.accepts(pool.len()) {
                return Ok(pool);
            }

            tracing::debug!(
                category_id,
                pool_size = pool.len(),
                "category pool too small, falling back to all books"
            );
        }

        source.fallback_pool(viewer, extra_excluded).await
    }

    /// Draws up to `count` distinct items uniformly at random. Returns nothing
    /// when the pool is not larger than the threshold.
    pub fn sample<T: Clone, R: Rng + ?Sized>(&self, pool: &[T], count: usize, rng: &mut R) -> Vec<T> {
        if !self.accepts(pool.len()) {
            return Vec::new();
        }

        pool.choose_multiple(rng, count.min(pool.len()))
            .cloned()
            .collect()
    }

    pub async fn recommend<P: BookPool + Sync>(
        &self,
        source: &P,
        viewer: &Viewer,
        added: &[AddedBookRef],
        result_count: usize,
        extra_excluded: &HashSet<i64>,
    ) -> Result<Vec<CatalogBook>, Error> {
        let pool = self
            .candidate_pool(source, viewer, added, extra_excluded)
            .await?;

        Ok(self.sample(&pool, result_count, &mut rand::rng()))
    }
}

/// Category with the most entries in the reading list; ties go to the lowest
/// category id.
pub fn most_read_category(added: &[AddedBookRef]) -> Option<i64> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for entry in added {
        *counts.entry(entry.category_id).or_default() += 1;
    }

    counts
        .into_iter()
        .fold(None, |best: Option<(i64, usize)>, (category, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((category, count)),
        })
        .map(|(category, _)| category)
}
