//! String SET/DEL throughput demo.

use std::time::Instant;

use redis::AsyncCommands;
use tracing::info;

use crate::error::Result;
use crate::store::Store;

/// Default number of key/value pairs.
pub const DEFAULT_COUNT: u32 = 10_000;
/// Largest accepted number of key/value pairs.
pub const MAX_COUNT: u32 = 1_000_000;

/// Timings of one run, in seconds.
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    pub insert_secs: f64,
    pub remove_secs: f64,
}

fn key(i: u32) -> String {
    format!("key{}", i)
}

fn value(i: u32) -> String {
    format!("val{}", i)
}

/// SET `n` keys one command at a time, then DEL them one at a time.
pub async fn run(store: Store, n: u32) -> Result<Timings> {
    let mut conn = store.connection();
    info!(n = n, "Running string throughput demo");

    println!("Inserting {} pairs of keys and values...", n);
    let start = Instant::now();
    for i in 0..n {
        let _: () = conn.set(key(i), value(i)).await?;
    }
    let insert_secs = start.elapsed().as_secs_f64();
    println!("Insertion Completed! Elapsed time: {:.6} seconds", insert_secs);

    println!("Removing {} keys...", n);
    let start = Instant::now();
    for i in 0..n {
        let _: () = conn.del(key(i)).await?;
    }
    let remove_secs = start.elapsed().as_secs_f64();
    println!("Removal Completed! Elapsed time: {:.6} seconds", remove_secs);

    Ok(Timings {
        insert_secs,
        remove_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_and_value_names() {
        assert_eq!(key(0), "key0");
        assert_eq!(value(42), "val42");
    }
}
