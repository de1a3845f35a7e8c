//! A pool shared between threads behind an external lock.

#![allow(unsafe_code)]

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use paged_pool::{BlockPool, Guarded, PoolConfig};

const THREADS: usize = 4;
const ROUNDS: usize = 200;

#[test]
fn test_pool_moves_to_another_thread() {
    let mut pool = BlockPool::<u64, Guarded>::new(8).unwrap();
    pool.allocate_block().unwrap();

    let pool = thread::spawn(move || {
        let block = pool.allocate_block().unwrap();
        // SAFETY: live block; freed once.
        unsafe {
            block.write(7);
            assert_eq!(block.read(), 7);
            pool.free(block).unwrap();
        }
        pool
    })
    .join()
    .unwrap();

    assert_eq!(pool.in_use_blocks(), 1);
}

#[test]
fn test_mutex_serialises_access() {
    let config = PoolConfig::performance()
        .with_blocks_per_page(16)
        .with_stats(true);
    let pool = Arc::new(Mutex::new(
        BlockPool::<u64, Guarded>::with_config(config).unwrap(),
    ));

    let handles: Vec<_> = (0..THREADS)
        .map(|id| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for round in 0..ROUNDS {
                    let value = (id * ROUNDS + round) as u64;

                    let mut guard = pool.lock();
                    let block = guard.allocate_block().unwrap();
                    // SAFETY: the block is live while the lock is held and is
                    // freed exactly once before the guard drops.
                    unsafe {
                        block.write(value);
                        assert_eq!(block.read(), value);
                        guard.free(block).unwrap();
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let pool = pool.lock();
    assert!(pool.is_empty());
    assert_eq!(pool.page_count(), 1);

    let stats = pool.stats().unwrap();
    assert_eq!(stats.total_allocs, (THREADS * ROUNDS) as u64);
    assert_eq!(stats.total_frees, (THREADS * ROUNDS) as u64);
}

#[test]
fn test_blocks_held_across_lock_scopes() {
    let pool = Arc::new(Mutex::new(BlockPool::<u32, Guarded>::new(4).unwrap()));

    let handles: Vec<_> = (0..THREADS)
        .map(|id| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let held: Vec<_> = (0..10)
                    .map(|i| {
                        let block = pool.lock().allocate_block().unwrap();
                        // SAFETY: block is live and only this thread knows it.
                        unsafe { block.write((id * 100 + i) as u32) };
                        block
                    })
                    .collect();

                for (i, block) in held.into_iter().enumerate() {
                    // SAFETY: block is live, written above, freed once.
                    unsafe {
                        assert_eq!(block.read(), (id * 100 + i) as u32);
                        pool.lock().free(block).unwrap();
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let pool = pool.lock();
    assert!(pool.is_empty());
    assert_eq!(pool.capacity(), pool.blocks_remaining());
}
