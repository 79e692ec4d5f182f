//! Physical frame bookkeeping.
//!
//! Every physical frame has exactly one [`FrameDescriptor`] for the lifetime
//! of a simulation. A descriptor records which virtual page currently
//! occupies the frame and carries an intrusive linkage node that eviction
//! policies use to thread frames onto their queues ([`FrameList`]).
//!
//! Links are expressed as frame numbers rather than pointers, so mapping a
//! linkage node back to its frame is the identity.

use crate::{Pfn, VmsimError, Vpn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Link {
    prev: Option<Pfn>,
    next: Option<Pfn>,
    linked: bool,
}

/// Per-frame metadata.
#[derive(Debug, Default, Clone)]
pub struct FrameDescriptor {
    /// The virtual page resident in this frame (a back-reference, not
    /// ownership).
    owner: Option<Vpn>,

    /// Queue linkage owned by the active eviction policy.
    link: Link,
}

impl FrameDescriptor {
    /// Returns the virtual page currently resident in this frame.
    pub fn owner(&self) -> Option<Vpn> {
        self.owner
    }

    /// Checks if the frame is handed out to a page.
    pub fn in_use(&self) -> bool {
        self.owner.is_some()
    }

    /// Checks if the frame is currently linked into a [`FrameList`].
    pub fn is_linked(&self) -> bool {
        self.link.linked
    }
}

/// The table of frame descriptors (the "coremap").
#[derive(Debug)]
pub struct FrameTable {
    frames: Vec<FrameDescriptor>,
}

impl FrameTable {
    /// Creates a table of `memsize` unused, unlinked frames.
    pub fn new(memsize: usize) -> Result<Self, VmsimError> {
        if memsize == 0 {
            return Err(VmsimError::InvalidMemorySize);
        }

        Ok(Self {
            frames: vec![FrameDescriptor::default(); memsize],
        })
    }

    /// Returns the number of physical frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always `false`; a frame table holds at least one frame.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns the descriptor of the given frame.
    pub fn get(&self, pfn: Pfn) -> Option<&FrameDescriptor> {
        self.frames.get(pfn.index())
    }

    /// Returns the virtual page resident in the given frame.
    ///
    /// Out-of-range frames report no owner.
    pub fn owner(&self, pfn: Pfn) -> Option<Vpn> {
        self.get(pfn).and_then(FrameDescriptor::owner)
    }

    /// Records which virtual page occupies the given frame.
    pub fn set_owner(&mut self, pfn: Pfn, owner: Option<Vpn>) -> Result<(), VmsimError> {
        let frame = self
            .frames
            .get_mut(pfn.index())
            .ok_or(VmsimError::FrameOutOfRange(pfn))?;

        frame.owner = owner;
        Ok(())
    }

    /// Checks if the given frame is linked into a [`FrameList`].
    pub fn is_linked(&self, pfn: Pfn) -> bool {
        self.get(pfn).is_some_and(FrameDescriptor::is_linked)
    }

    /// Returns an iterator over all frames and their descriptors.
    pub fn iter(&self) -> impl Iterator<Item = (Pfn, &FrameDescriptor)> {
        self.frames
            .iter()
            .enumerate()
            .map(|(index, frame)| (Pfn(index), frame))
    }

    fn link(&self, pfn: Pfn) -> &Link {
        &self.frames[pfn.index()].link
    }

    fn link_mut(&mut self, pfn: Pfn) -> &mut Link {
        &mut self.frames[pfn.index()].link
    }
}

/// An intrusive doubly-linked queue of frames.
///
/// The list itself only stores its ends and its length; the links live in
/// the [`FrameTable`], which must be passed to every operation. A frame can
/// be a member of at most one list at a time.
///
/// # Panics
///
/// Operations panic if given a frame number outside of the frame table.
#[derive(Debug, Default)]
pub struct FrameList {
    head: Option<Pfn>,
    tail: Option<Pfn>,
    len: usize,
}

impl FrameList {
    /// Creates an empty list.
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Returns the number of frames in the list.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Checks if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the frame at the head of the list.
    pub fn front(&self) -> Option<Pfn> {
        self.head
    }

    /// Returns the frame at the tail of the list.
    pub fn back(&self) -> Option<Pfn> {
        self.tail
    }

    /// Links `pfn` at the head of the list.
    pub fn push_front(&mut self, frames: &mut FrameTable, pfn: Pfn) {
        debug_assert!(!frames.is_linked(pfn), "{pfn:?} is already linked");

        let next = self.head;
        *frames.link_mut(pfn) = Link {
            prev: None,
            next,
            linked: true,
        };

        match next {
            Some(next) => frames.link_mut(next).prev = Some(pfn),
            None => self.tail = Some(pfn),
        }

        self.head = Some(pfn);
        self.len += 1;
    }

    /// Links `pfn` at the tail of the list.
    pub fn push_back(&mut self, frames: &mut FrameTable, pfn: Pfn) {
        debug_assert!(!frames.is_linked(pfn), "{pfn:?} is already linked");

        let prev = self.tail;
        *frames.link_mut(pfn) = Link {
            prev,
            next: None,
            linked: true,
        };

        match prev {
            Some(prev) => frames.link_mut(prev).next = Some(pfn),
            None => self.head = Some(pfn),
        }

        self.tail = Some(pfn);
        self.len += 1;
    }

    /// Unlinks `pfn` from the list.
    ///
    /// The frame must be a member of this list. Returns `false` if the frame
    /// was not linked at all.
    pub fn remove(&mut self, frames: &mut FrameTable, pfn: Pfn) -> bool {
        let Link { prev, next, linked } = *frames.link(pfn);
        if !linked {
            return false;
        }

        match prev {
            Some(prev) => frames.link_mut(prev).next = next,
            None => self.head = next,
        }

        match next {
            Some(next) => frames.link_mut(next).prev = prev,
            None => self.tail = prev,
        }

        *frames.link_mut(pfn) = Link::default();
        self.len -= 1;
        true
    }

    /// Unlinks and returns the frame at the head of the list.
    pub fn pop_front(&mut self, frames: &mut FrameTable) -> Option<Pfn> {
        let pfn = self.head?;
        self.remove(frames, pfn);
        Some(pfn)
    }

    /// Unlinks and returns the frame at the tail of the list.
    pub fn pop_back(&mut self, frames: &mut FrameTable) -> Option<Pfn> {
        let pfn = self.tail?;
        self.remove(frames, pfn);
        Some(pfn)
    }

    /// Unlinks every frame in the list.
    pub fn clear(&mut self, frames: &mut FrameTable) {
        while self.pop_front(frames).is_some() {}
    }

    /// Checks if `pfn` is a member of this list.
    pub fn contains(&self, frames: &FrameTable, pfn: Pfn) -> bool {
        self.iter(frames).any(|member| member == pfn)
    }

    /// Returns an iterator over the frames from head to tail.
    pub fn iter<'a>(&self, frames: &'a FrameTable) -> FrameListIter<'a> {
        FrameListIter {
            frames,
            next: self.head,
        }
    }
}

/// Iterator over the frames of a [`FrameList`], head to tail.
pub struct FrameListIter<'a> {
    frames: &'a FrameTable,
    next: Option<Pfn>,
}

impl Iterator for FrameListIter<'_> {
    type Item = Pfn;

    fn next(&mut self) -> Option<Self::Item> {
        let pfn = self.next?;
        self.next = self.frames.link(pfn).next;
        Some(pfn)
    }
}
