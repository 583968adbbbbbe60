use std::sync::{LazyLock, RwLock};
use std::time::{Duration, Instant};

use ahash::AHashMap;

static TIMINGS: LazyLock<RwLock<AHashMap<&'static str, Duration>>> =
    LazyLock::new(|| RwLock::new(AHashMap::new()));

/// Times `f` and accumulates the elapsed time under `tag`.
pub fn profile<T>(tag: &'static str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let res = f();
    let elapsed = start.elapsed();

    let mut timings = TIMINGS.write().unwrap();
    *timings.entry(tag).or_default() += elapsed;

    res
}

/// Dumps accumulated timings, slowest first.
pub fn profile_log() {
    let timings = TIMINGS.read().unwrap();
    let mut pairs: Vec<_> = timings.iter().collect();
    pairs.sort_by(|(_, a), (_, b)| b.cmp(a));

    println!("PROFILE RESULTS:");
    for (tag, time) in pairs {
        println!("    {:20} {:?}", tag, time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_returns_the_closure_result() {
        assert_eq!(profile("test-tag", || 2 + 2), 4);

        let timings = TIMINGS.read().unwrap();
        assert!(timings.contains_key("test-tag"));
    }
}
