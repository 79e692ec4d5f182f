mod access;
mod address;
pub(crate) mod macros;

pub use self::{
    access::AccessType,
    address::{PAGE_MASK, PAGE_SHIFT, PAGE_SIZE, Pfn, SwapSlot, Va, Vpn},
};
