//! Opaque sample identifiers and the metadata the Sample Registry attaches
//! to them. Patterns reference samples by id only; the registry owns the
//! handles.

pub type SampleId = u64;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SampleHandle {
    pub id: SampleId,
    pub sample_rate: u32,
    pub duration: f64,
    pub tags: Vec<String>,
}

impl SampleHandle {
    pub fn new(id: SampleId, sample_rate: u32, duration: f64, tags: Vec<String>) -> Self {
        Self {
            id,
            sample_rate,
            duration,
            tags,
        }
    }
}
