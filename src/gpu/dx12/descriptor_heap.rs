use super::driver::DescriptorHeapInfo;
use super::native::CpuDescriptorHandle;

/// Index into a [`DescriptorHeap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DescriptorSlot {
    pub index: u32,
    pub cpu: CpuDescriptorHandle,
}

/// Fixed-capacity CPU descriptor heap with recycled slots.
pub struct DescriptorHeap<H> {
    info: DescriptorHeapInfo<H>,
    capacity: u32,
    free_list: Vec<u32>,
    next_index: u32,
    len: u32,
}

impl<H> DescriptorHeap<H> {
    pub fn new(info: DescriptorHeapInfo<H>, capacity: u32) -> Self {
        Self {
            info,
            capacity,
            free_list: Vec::new(),
            next_index: 0,
            len: 0,
        }
    }

    /// Hands out a free descriptor, `None` once every slot is taken.
    pub fn allocate(&mut self) -> Option<DescriptorSlot> {
        let index = match self.free_list.pop() {
            Some(index) => index,
            None if self.next_index < self.capacity => {
                let index = self.next_index;
                self.next_index += 1;
                index
            }
            None => return None,
        };
        self.len += 1;
        Some(DescriptorSlot {
            index,
            cpu: self.info.cpu_start.offset(index, self.info.increment),
        })
    }

    pub fn free(&mut self, slot: DescriptorSlot) {
        debug_assert!(
            slot.index < self.next_index,
            "freeing an unallocated descriptor: {}",
            slot.index
        );
        debug_assert!(!self.free_list.contains(&slot.index));
        self.len -= 1;
        self.free_list.push(slot.index);
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn native(&self) -> &H {
        &self.info.heap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heap(capacity: u32) -> DescriptorHeap<()> {
        DescriptorHeap::new(
            DescriptorHeapInfo {
                heap: (),
                cpu_start: CpuDescriptorHandle { ptr: 0x1000 },
                increment: 32,
            },
            capacity,
        )
    }

    #[test]
    fn slots_are_offset_by_increment() {
        let mut heap = heap(4);
        let a = heap.allocate().unwrap();
        let b = heap.allocate().unwrap();
        assert_eq!(a.cpu.ptr, 0x1000);
        assert_eq!(b.cpu.ptr, 0x1020);
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn freed_slots_are_recycled() {
        let mut heap = heap(4);
        let a = heap.allocate().unwrap();
        let _b = heap.allocate().unwrap();
        heap.free(a);
        assert_eq!(heap.allocate().unwrap(), a);
    }

    #[test]
    fn full_heap_refuses() {
        let mut heap = heap(2);
        let a = heap.allocate().unwrap();
        heap.allocate().unwrap();
        assert!(heap.allocate().is_none());
        heap.free(a);
        assert!(heap.allocate().is_some());
        assert!(heap.allocate().is_none());
    }
}
