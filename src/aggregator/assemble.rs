// src/aggregator/assemble.rs
//! Merge, dedup and the diversity-balanced assembly policy.

use std::collections::HashSet;

use crate::aggregator::types::Article;

/// Dedup key for titles: case-insensitive, whitespace-trimmed.
pub fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Newest first; entries without a date sink to the end. Stable, so ties
/// keep their per-source order.
pub fn sort_newest_first(items: &mut [Article]) {
    items.sort_by_key(|a| std::cmp::Reverse(a.recency_key()));
}

/// Combine a source's primary and secondary feed results. A secondary entry
/// is dropped when its normalized title already appeared in the primary
/// feed, so the primary version always wins.
pub fn merge_primary_secondary(primary: Vec<Article>, secondary: Vec<Article>) -> Vec<Article> {
    let primary_titles: HashSet<String> = primary.iter().map(|a| title_key(&a.title)).collect();

    let mut merged = primary;
    for article in secondary {
        if !primary_titles.contains(&title_key(&article.title)) {
            merged.push(article);
        }
    }
    sort_newest_first(&mut merged);
    merged
}

/// Drop repeated links, keeping the first (newest after sorting) occurrence.
pub fn dedup_by_link(items: Vec<Article>) -> Vec<Article> {
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|a| seen.insert(a.link.clone()))
        .collect()
}

/// Diversity-balanced assembly:
/// 1. take up to `min_per_source` newest entries from each source,
/// 2. pool the remainder across sources, newest first,
/// 3. fill from the pool up to `total_limit`,
/// 4. final sort newest first over the whole result.
///
/// Quiet sources keep their guaranteed slots; the slack from sources with
/// fewer than `min_per_source` entries is absorbed by the pool fill.
pub fn assemble_balanced(
    per_source: Vec<Vec<Article>>,
    min_per_source: usize,
    total_limit: usize,
) -> Vec<Article> {
    let mut picked: Vec<Article> = Vec::new();
    let mut pool: Vec<Article> = Vec::new();

    for mut list in per_source {
        sort_newest_first(&mut list);
        let guaranteed = list.len().min(min_per_source);
        let overflow = list.split_off(guaranteed);
        picked.extend(list);
        pool.extend(overflow);
    }

    sort_newest_first(&mut pool);
    for article in pool {
        if picked.len() >= total_limit {
            break;
        }
        picked.push(article);
    }

    sort_newest_first(&mut picked);
    picked.truncate(total_limit);
    picked
}
