//! Instance entity types.

use std::fmt;

/// Dense job index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JobId(pub usize);

/// Dense mode index into the instance-wide mode set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeId(pub usize);

/// Dense resource index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceId(pub usize);

/// A time slot, identified by its 1-based ordinal.
///
/// Slots are ordered numerically, so slot 10 follows slot 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Slot(pub u32);

impl Slot {
    /// The 1-based ordinal of the slot.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The discretized planning horizon: slots `1..=len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Horizon {
    len: u32,
}

impl Horizon {
    pub(crate) fn new(len: u32) -> Self {
        Self { len }
    }

    /// Number of slots.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether the horizon has no slots. Never true for a built instance.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All slots in ordinal order.
    pub fn slots(&self) -> impl Iterator<Item = Slot> + Clone {
        (1..=self.len).map(Slot)
    }

    /// Whether `slot` is the final slot of the horizon.
    pub fn is_last(&self, slot: Slot) -> bool {
        slot.0 == self.len
    }

    /// The slot following `slot`, or `None` for the last one.
    pub fn next(&self, slot: Slot) -> Option<Slot> {
        (slot.0 < self.len).then(|| Slot(slot.0 + 1))
    }

    /// Whether `slot` lies inside the horizon.
    pub fn contains(&self, slot: Slot) -> bool {
        (1..=self.len).contains(&slot.0)
    }
}

/// How a resource's capacity is replenished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceKind {
    /// Capacity applies to every slot independently.
    Renewable,
    /// Capacity is a budget for the whole horizon.
    NonRenewable,
}

/// A resource with its capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resource {
    pub label: String,
    pub kind: ResourceKind,
    /// Per-slot capacity (renewable) or total budget (non-renewable).
    pub availability: u32,
}

/// Duration and resource needs of a job executed in one mode.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeSpec {
    /// Number of slots the job occupies.
    pub duration: u32,
    /// Quantity required per active slot, indexed by [`ResourceId`].
    pub needs: Vec<u32>,
}

impl ModeSpec {
    /// Need for `resource`.
    pub fn need(&self, resource: ResourceId) -> u32 {
        self.needs.get(resource.0).copied().unwrap_or(0)
    }
}

/// A job and the modes it may run in.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Job {
    pub label: String,
    /// Admissible modes, indexed by the instance-wide [`ModeId`].
    pub modes: Vec<Option<ModeSpec>>,
}

impl Job {
    /// Admissible modes with their specs, in mode order.
    pub fn admissible_modes(&self) -> impl Iterator<Item = (ModeId, &ModeSpec)> {
        self.modes
            .iter()
            .enumerate()
            .filter_map(|(m, spec)| spec.as_ref().map(|s| (ModeId(m), s)))
    }

    /// Spec of `mode`, if admissible.
    pub fn mode(&self, mode: ModeId) -> Option<&ModeSpec> {
        self.modes.get(mode.0).and_then(Option::as_ref)
    }

    /// Shortest duration over the admissible modes.
    pub fn min_duration(&self) -> u32 {
        self.admissible_modes()
            .map(|(_, s)| s.duration)
            .min()
            .unwrap_or(0)
    }
}

/// `successor` may only start once `predecessor` has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrecedenceEdge {
    pub predecessor: JobId,
    pub successor: JobId,
}
