use vmsim_core::{
    EvictionPolicy, FrameTable, Pfn, SwapDevice, SwapSlot, Va, VmsimError, Vpn,
};
use vmsim_pagetable::{FrameAllocator, PageTable};

/// Physical memory: the frame table, the free frames, the eviction policy
/// and the swap device evicted pages go to.
pub struct FramePool<Swap> {
    frames: FrameTable,

    /// Frames not owned by any page. Initially highest first, so that `pop`
    /// yields the lowest.
    free: Vec<Pfn>,

    policy: Box<dyn EvictionPolicy>,
    swap: Swap,
    zero_fills: usize,
}

impl<Swap> FramePool<Swap>
where
    Swap: SwapDevice,
{
    /// Creates a pool of `memsize` free frames and initializes `policy`
    /// for it.
    pub fn new(
        memsize: usize,
        mut policy: Box<dyn EvictionPolicy>,
        swap: Swap,
    ) -> Result<Self, VmsimError> {
        let frames = FrameTable::new(memsize)?;
        policy.init(&frames);

        tracing::debug!(memsize, policy = policy.name(), "frame pool created");

        Ok(Self {
            free: (0..memsize).rev().map(Pfn).collect(),
            frames,
            policy,
            swap,
            zero_fills: 0,
        })
    }

    /// Returns the frame table.
    pub fn frames(&self) -> &FrameTable {
        &self.frames
    }

    /// Returns the number of frames not yet handed out.
    pub fn free_frames(&self) -> usize {
        self.free.len()
    }

    /// Returns the eviction policy.
    pub fn policy(&self) -> &dyn EvictionPolicy {
        self.policy.as_ref()
    }

    /// Returns the swap device.
    pub fn swap(&self) -> &Swap {
        &self.swap
    }

    /// Returns the swap device mutably.
    pub fn swap_mut(&mut self) -> &mut Swap {
        &mut self.swap
    }

    /// Returns the number of frames filled with zeros.
    pub fn zero_fills(&self) -> usize {
        self.zero_fills
    }

    /// Tells the policy that the page in `pfn` was accessed.
    pub fn reference(&mut self, table: &mut PageTable, pfn: Pfn, va: Va) {
        self.policy.reference(&mut self.frames, table, pfn, va);
    }

    /// Releases the policy state and returns every frame to the free list.
    pub fn cleanup(&mut self) -> Result<(), VmsimError> {
        self.policy.cleanup(&mut self.frames);

        for index in 0..self.frames.len() {
            self.frames.set_owner(Pfn(index), None)?;
        }

        self.free = (0..self.frames.len()).rev().map(Pfn).collect();
        Ok(())
    }
}

impl<Swap> FrameAllocator for FramePool<Swap>
where
    Swap: SwapDevice,
{
    fn allocate_frame(&mut self, table: &mut PageTable, vpn: Vpn) -> Result<Pfn, VmsimError> {
        let pfn = match self.free.pop() {
            Some(pfn) => pfn,
            None => {
                let victim = self.policy.evict(&mut self.frames, table);
                match self.frames.owner(victim) {
                    Some(owner) => table.evict(owner, &mut self.swap),
                    None => tracing::warn!(%victim, "victim frame has no owner"),
                }

                victim
            }
        };

        self.frames.set_owner(pfn, Some(vpn))?;

        tracing::debug!(%vpn, %pfn, "allocated frame");
        Ok(pfn)
    }

    fn init_frame(&mut self, pfn: Pfn) {
        self.zero_fills += 1;
        tracing::trace!(%pfn, "zero fill");
    }

    fn swap_in(&mut self, pfn: Pfn, slot: SwapSlot) -> Result<(), VmsimError> {
        self.swap.read_page(pfn, slot)
    }

    fn release_frame(&mut self, pfn: Pfn) {
        if let Err(err) = self.frames.set_owner(pfn, None) {
            tracing::warn!(%pfn, %err, "releasing unknown frame");
            return;
        }

        // Unlinked already: free frames and victims are never on a queue.
        self.free.push(pfn);
        tracing::debug!(%pfn, "released frame");
    }
}

impl<Swap> std::fmt::Debug for FramePool<Swap>
where
    Swap: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("FramePool")
            .field("memsize", &self.frames.len())
            .field("free", &self.free.len())
            .field("policy", &self.policy.name())
            .field("swap", &self.swap)
            .finish()
    }
}
