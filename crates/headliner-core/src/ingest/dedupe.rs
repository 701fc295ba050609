use std::collections::HashSet;
use std::hash::Hash;

/// Keep the candidates whose key is not in `existing`, in input order
///
/// A key repeated inside `candidates` is kept once (first occurrence).
pub fn dedupe<T, K, F>(candidates: Vec<T>, existing: &HashSet<K>, key_of: F) -> Vec<T>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    dedupe_limited(candidates, existing, key_of, None)
}

/// Like [`dedupe`], stopping once `limit` novel candidates were collected
pub fn dedupe_limited<T, K, F>(
    candidates: Vec<T>,
    existing: &HashSet<K>,
    key_of: F,
    limit: Option<usize>,
) -> Vec<T>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    let cap = limit.unwrap_or(usize::MAX);
    let mut seen: HashSet<K> = HashSet::new();
    let mut novel = Vec::new();

    for candidate in candidates {
        if novel.len() >= cap {
            break;
        }
        let key = key_of(&candidate);
        if existing.contains(&key) || !seen.insert(key) {
            continue;
        }
        novel.push(candidate);
    }

    novel
}
