use std::collections::VecDeque;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct GenIdx(u32);

impl GenIdx {
    pub(crate) const fn new(index: usize, gen: u8) -> Self {
        Self(((gen as u32) << 24) | index as u32)
    }

    pub(crate) fn split(&self) -> (usize, u8) {
        let index = (self.0 & 0xFFFFFF) as usize;
        let gen = ((self.0 >> 24) & 0xFF) as u8;
        (index, gen)
    }
}

struct Slot<T> {
    gen: u8,
    item: Option<T>,
}

/// Slot storage whose indices go stale once their item is removed.
pub(crate) struct GenVec<T> {
    slots: Vec<Slot<T>>,
    free: VecDeque<usize>,
    len: usize,
}

impl<T> Default for GenVec<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: VecDeque::new(),
            len: 0,
        }
    }
}

impl<T> GenVec<T> {
    pub(crate) fn add(&mut self, item: T) -> GenIdx {
        let index = if let Some(index) = self.free.pop_front() {
            index
        } else {
            self.slots.push(Slot { gen: 0, item: None });
            self.slots.len() - 1
        };

        self.slots[index].item = Some(item);
        self.len += 1;

        GenIdx::new(index, self.slots[index].gen)
    }

    pub(crate) fn remove(&mut self, idx: GenIdx) -> Option<T> {
        let (index, gen) = idx.split();
        let slot = self.slots.get_mut(index)?;
        if slot.gen != gen {
            return None;
        }

        let item = slot.item.take()?;
        slot.gen = slot.gen.wrapping_add(1);
        self.free.push_back(index);
        self.len -= 1;

        Some(item)
    }

    pub(crate) fn get(&self, idx: GenIdx) -> Option<&T> {
        let (index, gen) = idx.split();
        match self.slots.get(index) {
            Some(slot) if slot.gen == gen => slot.item.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn removed_index_goes_stale() {
        let mut v = GenVec::default();
        let a = v.add("a");

        assert_eq!(Some("a"), v.remove(a));
        assert_eq!(None, v.remove(a));
        assert_eq!(None, v.get(a));
    }

    #[test]
    fn slot_is_reused_with_new_generation() {
        let mut v = GenVec::default();
        let a = v.add(1);
        v.remove(a);
        let b = v.add(2);

        assert_eq!(a.split().0, b.split().0);
        assert_ne!(a, b);
        assert_eq!(None, v.get(a));
        assert_eq!(Some(&2), v.get(b));
    }

    #[test]
    fn len_tracks_live_items() {
        let mut v = GenVec::default();
        let a = v.add(1);
        let _b = v.add(2);
        assert_eq!(2, v.len());

        v.remove(a);
        v.remove(a);
        assert_eq!(1, v.len());
    }
}
