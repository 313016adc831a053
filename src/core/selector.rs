use std::sync::{Arc, Mutex, PoisonError};

use crate::core::endpoint::{Endpoint, EndpointPool};

/// Round-robin endpoint selector.
///
/// Owns the pool and a rotation cursor. The cursor is read and advanced under a
/// single lock, so concurrent callers always observe distinct positions and the
/// indices handed out, in lock order, are exactly `0, 1, .., n-1, 0, 1, ..`.
/// The lock is held only for the index arithmetic.
#[derive(Debug)]
pub struct EndpointSelector {
    pool: EndpointPool,
    cursor: Mutex<usize>,
}

impl EndpointSelector {
    pub fn new(pool: EndpointPool) -> Self {
        Self {
            pool,
            cursor: Mutex::new(0),
        }
    }

    /// Return the next endpoint in rotation.
    pub fn next(&self) -> Arc<Endpoint> {
        let index = {
            // The cursor is a plain integer, a panicked holder cannot leave it torn.
            let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
            let index = *cursor % self.pool.len();
            *cursor = (index + 1) % self.pool.len();
            index
        };
        self.pool[index].clone()
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, thread};

    use super::*;

    fn selector(names: &[&str]) -> EndpointSelector {
        let endpoints = names
            .iter()
            .map(|name| {
                Endpoint::new(name, &format!("http://{name}.example"), &format!("key-{name}"))
                    .unwrap()
            })
            .collect();
        EndpointSelector::new(EndpointPool::new(endpoints).unwrap())
    }

    #[test]
    fn test_round_robin_order() {
        let selector = selector(&["server1", "server2", "server3"]);

        assert_eq!(selector.next().name(), "server1");
        assert_eq!(selector.next().name(), "server2");
        assert_eq!(selector.next().name(), "server3");
        assert_eq!(selector.next().name(), "server1"); // Wraps around
    }

    #[test]
    fn test_full_cycles_are_fair() {
        let names = ["a", "b", "c", "d"];
        let selector = selector(&names);
        let cycles = 25;

        let picked: Vec<String> = (0..cycles * names.len())
            .map(|_| selector.next().name().to_string())
            .collect();

        for (i, name) in picked.iter().enumerate() {
            assert_eq!(name, names[i % names.len()]);
        }
    }

    #[test]
    fn test_single_endpoint_always_selected() {
        let selector = selector(&["only"]);
        for _ in 0..10 {
            assert_eq!(selector.next().name(), "only");
        }
    }

    #[test]
    fn test_concurrent_selection_is_fair() {
        let names = ["a", "b", "c"];
        let selector = Arc::new(selector(&names));
        let rounds = 200;

        let picked: Vec<String> = thread::scope(|scope| {
            let handles: Vec<_> = (0..rounds * names.len())
                .map(|_| {
                    let selector = selector.clone();
                    scope.spawn(move || selector.next().name().to_string())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let mut counts: HashMap<String, usize> = HashMap::new();
        for name in picked {
            *counts.entry(name).or_default() += 1;
        }
        assert_eq!(counts.len(), names.len());
        for name in names {
            assert_eq!(counts[name], rounds);
        }
    }
}
