use std::collections::HashSet;

use vmsim_core::{AccessType, PageStatus as _, Pfn, SwapDevice, SwapSlot, Va, VmsimError, Vpn};
use vmsim_policy::ReplacementAlgorithm;

use super::{MemorySwap, SimConfig, Simulator, TraceEvent};

///////////////////////////////////////////////////////////////////////////////
// Mock Swap
///////////////////////////////////////////////////////////////////////////////

/// In-memory swap whose next `failing_reads` reads fail.
#[derive(Debug)]
struct FlakySwap {
    inner: MemorySwap,
    failing_reads: usize,
}

impl SwapDevice for FlakySwap {
    fn write_page(&mut self, pfn: Pfn, prior: Option<SwapSlot>) -> Option<SwapSlot> {
        self.inner.write_page(pfn, prior)
    }

    fn read_page(&mut self, pfn: Pfn, slot: SwapSlot) -> Result<(), VmsimError> {
        if self.failing_reads > 0 {
            self.failing_reads -= 1;
            return Err(VmsimError::Other("swap read failed"));
        }

        self.inner.read_page(pfn, slot)
    }
}

///////////////////////////////////////////////////////////////////////////////
// Test Helpers
///////////////////////////////////////////////////////////////////////////////

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_target(false)
        .with_test_writer()
        .try_init();
}

fn simulator(
    memsize: usize,
    swapsize: usize,
    algorithm: ReplacementAlgorithm,
) -> Result<Simulator, VmsimError> {
    init_tracing();

    Simulator::new(
        SimConfig::default()
            .with_memsize(memsize)
            .with_swapsize(swapsize)
            .with_algorithm(algorithm),
    )
}

fn algorithms() -> Vec<ReplacementAlgorithm> {
    vec![
        ReplacementAlgorithm::Clock,
        #[cfg(feature = "s2q")]
        ReplacementAlgorithm::SimplifiedTwoQueue,
    ]
}

fn page(n: u64) -> Va {
    Vpn(n).va()
}

fn load(sim: &mut Simulator, n: u64) -> Result<Pfn, VmsimError> {
    sim.access(page(n), AccessType::Load)
}

/// Checks that frames and resident pages are in a one-to-one
/// correspondence.
fn check_residency<Swap>(sim: &Simulator<Swap>)
where
    Swap: SwapDevice,
{
    let frames = sim.pool().frames();
    let mut owners = HashSet::new();

    for (pfn, frame) in frames.iter() {
        let Some(owner) = frame.owner() else {
            continue;
        };

        assert!(owners.insert(owner), "{owner} owns two frames");

        let entry = sim.table().entry(owner).expect("owner has an entry");
        assert!(entry.valid());
        assert_eq!(entry.frame(), Some(pfn));
    }

    let resident = sim
        .table()
        .entries()
        .into_iter()
        .filter(|(_, entry)| entry.valid())
        .count();

    assert_eq!(resident, owners.len());
    assert!(resident <= frames.len());
}

///////////////////////////////////////////////////////////////////////////////
// Scenarios
///////////////////////////////////////////////////////////////////////////////

#[test]
fn rejects_empty_memory() {
    assert!(matches!(
        simulator(0, 16, ReplacementAlgorithm::Clock),
        Err(VmsimError::InvalidMemorySize)
    ));
}

#[test]
fn repeated_access_hits() -> Result<(), VmsimError> {
    let mut sim = simulator(4, 16, ReplacementAlgorithm::Clock)?;

    let pfn = sim.access(Va(0x1234), AccessType::Load)?;
    assert_eq!(sim.access(Va(0x1fff), AccessType::Instruction)?, pfn);
    assert_eq!(sim.access(Va(0x1000), AccessType::Store)?, pfn);

    let stats = sim.stats();
    assert_eq!((stats.hits, stats.misses, stats.references), (2, 1, 3));
    assert_eq!(sim.pool().zero_fills(), 1);

    Ok(())
}

#[test]
fn clock_with_all_bits_set_is_fifo() -> Result<(), VmsimError> {
    let mut sim = simulator(4, 16, ReplacementAlgorithm::Clock)?;

    for n in 1..=5 {
        load(&mut sim, n)?;
    }

    let stats = sim.stats();
    assert_eq!((stats.hits, stats.misses), (0, 5));
    assert_eq!(stats.evictions(), 1);

    // The first page was evicted dirty, since first touches are dirty.
    assert_eq!(stats.evict_dirty, 1);
    let first = sim.table().entry(Vpn(1)).expect("entry");
    assert!(!first.valid());
    assert_eq!(first.swap(), Some(SwapSlot(0)));

    assert_eq!(sim.table().lookup(page(5)).frame(), Some(Pfn(0)));
    check_residency(&sim);

    Ok(())
}

#[test]
fn clock_spares_referenced_pages() -> Result<(), VmsimError> {
    let mut sim = simulator(3, 16, ReplacementAlgorithm::Clock)?;

    for n in [1, 2, 3, 4, 2, 5] {
        load(&mut sim, n)?;
    }

    // Page 1 went on the first sweep, page 2 was referenced again before
    // the second one and page 3 was taken instead.
    assert!(!sim.table().is_valid(Some(Vpn(1))));
    assert!(sim.table().is_valid(Some(Vpn(2))));
    assert!(!sim.table().is_valid(Some(Vpn(3))));
    assert_eq!(sim.stats().hits, 1);
    check_residency(&sim);

    Ok(())
}

#[cfg(feature = "s2q")]
#[test]
fn s2q_evicts_probation_head() -> Result<(), VmsimError> {
    let mut sim = simulator(4, 16, ReplacementAlgorithm::SimplifiedTwoQueue)?;

    // A B C D A E
    for n in [0xa, 0xb, 0xc, 0xd, 0xa, 0xe] {
        load(&mut sim, n)?;
    }

    let table = sim.table();
    assert!(table.is_valid(Some(Vpn(0xa))));
    assert!(table.referenced(Some(Vpn(0xa))));
    assert!(!table.is_valid(Some(Vpn(0xb))));
    assert!(table.is_valid(Some(Vpn(0xe))));
    assert!(!table.referenced(Some(Vpn(0xe))));

    let stats = sim.stats();
    assert_eq!((stats.hits, stats.misses, stats.evictions()), (1, 5, 1));
    check_residency(&sim);

    Ok(())
}

#[test]
fn dirty_and_clean_evictions() -> Result<(), VmsimError> {
    let mut sim = simulator(1, 16, ReplacementAlgorithm::Clock)?;

    load(&mut sim, 1)?; // first touch, dirty
    load(&mut sim, 2)?; // 1 written out
    load(&mut sim, 1)?; // 2 written out, 1 read back clean
    load(&mut sim, 2)?; // 1 dropped, it is clean; 2 read back clean
    sim.access(page(2), AccessType::Store)?;
    load(&mut sim, 1)?; // 2 written out again, to the same slot

    let stats = sim.stats();
    assert_eq!(stats.references, 6);
    assert_eq!((stats.hits, stats.misses), (1, 5));
    assert_eq!((stats.evict_clean, stats.evict_dirty), (1, 3));

    let swap = sim.pool().swap();
    assert_eq!(swap.writes(), 3);
    assert_eq!(swap.used(), 2);
    assert_eq!(swap.reads(), 3);
    assert_eq!(sim.pool().zero_fills(), 2);

    let entry = sim.table().entry(Vpn(1)).expect("entry");
    assert!(entry.valid() && !entry.dirty());

    Ok(())
}

#[test]
fn swap_round_trip_keeps_slot() -> Result<(), VmsimError> {
    let mut sim = simulator(1, 4, ReplacementAlgorithm::Clock)?;

    load(&mut sim, 7)?;
    load(&mut sim, 8)?;
    let slot = sim.table().entry(Vpn(7)).and_then(|entry| entry.swap());
    assert_eq!(slot, Some(SwapSlot(0)));

    sim.access(page(7), AccessType::Modify)?;
    load(&mut sim, 8)?;

    // Rewritten in place.
    assert_eq!(sim.table().entry(Vpn(7)).and_then(|entry| entry.swap()), slot);

    Ok(())
}

#[test]
fn swap_exhaustion_loses_pages() -> Result<(), VmsimError> {
    let mut sim = simulator(1, 1, ReplacementAlgorithm::Clock)?;

    load(&mut sim, 1)?;
    load(&mut sim, 2)?; // 1 takes the only slot
    load(&mut sim, 3)?; // 2 has nowhere to go

    let lost = sim.table().entry(Vpn(2)).expect("entry");
    assert!(!lost.valid());
    assert_eq!(lost.swap(), None);

    // Page 2 starts over from a zeroed frame.
    load(&mut sim, 2)?;
    assert_eq!(sim.pool().zero_fills(), 4);
    assert!(sim.table().is_dirty(Some(Vpn(2))));
    assert_eq!(sim.stats().misses, 4);

    Ok(())
}

#[test]
fn run_trace() -> Result<(), VmsimError> {
    let mut sim = simulator(2, 16, ReplacementAlgorithm::Clock)?;

    let trace = "\
==4711== Lackey, an example Valgrind tool
I  0400d7d4,8
 S 7ff000398,8
 L 7ff000398,8
 M 0421c7f0,4

";

    let stats = sim.run_trace(trace.as_bytes())?;
    assert_eq!(stats.references, 4);
    assert_eq!((stats.hits, stats.misses), (1, 3));
    assert_eq!(stats.evictions(), 1);
    check_residency(&sim);

    Ok(())
}

#[test]
fn run_trace_stops_at_bad_line() -> Result<(), VmsimError> {
    let mut sim = simulator(2, 16, ReplacementAlgorithm::Clock)?;

    let result = sim.run_trace(" L 1000\n L 2000\nbogus\n L 3000\n".as_bytes());
    assert!(matches!(result, Err(VmsimError::InvalidTrace { line: 3, .. })));
    assert_eq!(sim.stats().references, 2);

    Ok(())
}

#[test]
fn random_traces_keep_invariants() -> Result<(), VmsimError> {
    for algorithm in algorithms() {
        let mut sim = simulator(5, 64, algorithm)?;

        let mut seed = 0x2545_f491_4f6c_dd1du64;
        let mut distinct = HashSet::new();
        let events = (0..2000).map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;

            let n = seed % 12;
            distinct.insert(n);

            let access = match (seed >> 8) % 4 {
                0 => AccessType::Load,
                1 => AccessType::Store,
                2 => AccessType::Instruction,
                _ => AccessType::Modify,
            };

            TraceEvent::new(access, Va((n << 12) | (seed >> 52)))
        });

        let stats = sim.run(events)?;
        check_residency(&sim);

        assert_eq!(stats.hits + stats.misses, stats.references);
        assert_eq!(stats.references, 2000);
        assert_eq!(stats.evictions(), stats.misses - 5);
        assert_eq!(sim.pool().free_frames(), 0);
        assert!(distinct.len() > 5);
    }

    Ok(())
}

#[test]
fn finish_releases_everything() -> Result<(), VmsimError> {
    let mut sim = simulator(2, 16, ReplacementAlgorithm::Clock)?;

    for n in [1, 2, 1, 3, 0x8_0000] {
        load(&mut sim, n)?;
    }
    let levels = sim.table().materialized_levels();
    assert!(levels > 4);

    let expected = sim.stats();
    assert_eq!(sim.finish()?, expected);

    Ok(())
}

#[cfg(feature = "s2q")]
#[test]
fn pool_cleanup_unlinks_frames() -> Result<(), VmsimError> {
    let mut sim = simulator(3, 16, ReplacementAlgorithm::SimplifiedTwoQueue)?;
    for n in [1, 2, 1] {
        load(&mut sim, n)?;
    }

    sim.pool.cleanup()?;
    sim.table.clear();

    let frames = sim.pool().frames();
    assert!(frames.iter().all(|(_, frame)| !frame.is_linked() && !frame.in_use()));
    assert_eq!(sim.pool().free_frames(), 3);
    assert_eq!(sim.table().materialized_levels(), 1);

    Ok(())
}

#[test]
fn failed_swap_in_frees_the_frame() -> Result<(), VmsimError> {
    init_tracing();

    for algorithm in algorithms() {
        let config = SimConfig::default()
            .with_memsize(2)
            .with_swapsize(16)
            .with_algorithm(algorithm);

        let swap = FlakySwap {
            inner: MemorySwap::new(config.swapsize),
            failing_reads: 0,
        };
        let mut sim = Simulator::with_swap(config, swap)?;

        for n in [1, 2, 3] {
            sim.access(page(n), AccessType::Load)?;
        }

        // Page 1 is on swap. Reading it back fails after a victim was
        // already evicted for it.
        sim.pool.swap_mut().failing_reads = 1;
        assert!(sim.access(page(1), AccessType::Load).is_err());

        assert_eq!(sim.pool().free_frames(), 1);
        assert!(!sim.table().is_valid(Some(Vpn(1))));
        assert!(sim.pool().frames().iter().all(|(_, frame)| frame.owner() != Some(Vpn(1))));
        check_residency(&sim);

        let pfn = sim.access(page(1), AccessType::Load)?;
        check_residency(&sim);

        let owned = sim
            .pool()
            .frames()
            .iter()
            .filter(|(_, frame)| frame.owner() == Some(Vpn(1)))
            .map(|(pfn, _)| pfn)
            .collect::<Vec<_>>();
        assert_eq!(owned, [pfn]);
        assert_eq!(sim.pool().free_frames(), 0);

        // The released frame is tracked by the policy again and can be
        // evicted like any other.
        for n in 4..10 {
            sim.access(page(n), AccessType::Load)?;
            check_residency(&sim);
        }

        let stats = sim.stats();
        assert_eq!(stats.references, 10);
        assert_eq!(stats.misses, 10);
        // Every miss but the first two and the retry evicted a page, and
        // so did the failed access.
        assert_eq!(stats.evictions(), 8);
    }

    Ok(())
}
