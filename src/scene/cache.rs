//! Latest frequency data per track index, shared between the track
//! visuals (writers) and the zoom reactor (reader).

/// One track's most recent analysis
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencySample {
    pub average: f32,
    pub bins: Vec<u8>,
}

/// Slot per track index; a slot is empty until its track first plays
#[derive(Debug, Clone, Default)]
pub struct FrequencyCache {
    slots: Vec<Option<FrequencySample>>,
}

impl FrequencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite slot `index`, reusing its buffer
    pub fn write(&mut self, index: usize, average: f32, bins: &[u8]) {
        if self.slots.len() <= index {
            self.slots.resize(index + 1, None);
        }
        let sample = self.slots[index].get_or_insert_with(FrequencySample::default);
        sample.average = average;
        sample.bins.clear();
        sample.bins.extend_from_slice(bins);
    }

    pub fn get(&self, index: usize) -> Option<&FrequencySample> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Drop slots for indices at or past `len`
    pub fn truncate(&mut self, len: usize) {
        self.slots.truncate(len);
    }

    /// Empty slot `index`; it stays empty until its new owner writes
    pub fn reset(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = None;
        }
    }
}
