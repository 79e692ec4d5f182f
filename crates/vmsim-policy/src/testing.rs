use std::collections::HashMap;

use vmsim_core::{EvictionPolicy, FrameTable, PageStatus, Pfn, Vpn};

/// Page state as seen by a policy, without a page table behind it.
#[derive(Debug, Default)]
pub struct MockPages {
    referenced: HashMap<Vpn, bool>,
}

impl MockPages {
    pub fn get(&self, vpn: Vpn) -> bool {
        self.referenced.get(&vpn).copied().unwrap_or(false)
    }
}

impl PageStatus for MockPages {
    fn is_valid(&self, vpn: Option<Vpn>) -> bool {
        vpn.is_some_and(|vpn| self.referenced.contains_key(&vpn))
    }

    fn is_dirty(&self, _vpn: Option<Vpn>) -> bool {
        false
    }

    fn referenced(&self, vpn: Option<Vpn>) -> bool {
        vpn.is_some_and(|vpn| self.get(vpn))
    }

    fn set_referenced(&mut self, vpn: Option<Vpn>, value: bool) {
        if let Some(vpn) = vpn {
            self.referenced.insert(vpn, value);
        }
    }
}

/// Drives a policy the way the frame pool does: free frames are handed out
/// lowest first, then victims are taken from the policy.
pub struct Harness<P> {
    pub policy: P,
    pub frames: FrameTable,
    pub pages: MockPages,
    pub faults: usize,
    pub evicted: Vec<Vpn>,
}

impl<P> Harness<P>
where
    P: EvictionPolicy,
{
    pub fn new(mut policy: P, memsize: usize) -> Self {
        let frames = FrameTable::new(memsize).expect("memsize");
        policy.init(&frames);

        Self {
            policy,
            frames,
            pages: MockPages::default(),
            faults: 0,
            evicted: Vec::new(),
        }
    }

    pub fn frame_of(&self, vpn: Vpn) -> Option<Pfn> {
        self.frames
            .iter()
            .find(|(_, frame)| frame.owner() == Some(vpn))
            .map(|(pfn, _)| pfn)
    }

    /// Accesses page number `page` and returns the frame holding it.
    pub fn access(&mut self, page: u64) -> Pfn {
        let vpn = Vpn(page);

        let pfn = match self.frame_of(vpn) {
            Some(pfn) => pfn,
            None => {
                self.faults += 1;
                let free = self
                    .frames
                    .iter()
                    .find(|(_, frame)| !frame.in_use())
                    .map(|(pfn, _)| pfn);

                let pfn = match free {
                    Some(pfn) => pfn,
                    None => {
                        let pfn = self.policy.evict(&mut self.frames, &mut self.pages);
                        let victim = self.frames.owner(pfn).expect("victim has an owner");
                        self.evicted.push(victim);
                        pfn
                    }
                };

                self.frames.set_owner(pfn, Some(vpn)).expect("frame in range");
                self.pages.referenced.entry(vpn).or_insert(false);
                pfn
            }
        };

        self.policy
            .reference(&mut self.frames, &mut self.pages, pfn, vpn.va());
        pfn
    }
}
