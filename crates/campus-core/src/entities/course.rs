use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{BatchType, CourseStatus, Language, Level};

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Whether a batch type is offered, and how many students hold a seat in it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchTypeConfig {
    pub enabled: bool,
    pub student_count: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchTypes {
    pub regular: BatchTypeConfig,
    pub revision: BatchTypeConfig,
}

impl BatchTypes {
    #[must_use]
    pub const fn get(&self, batch_type: BatchType) -> &BatchTypeConfig {
        match batch_type {
            BatchType::Regular => &self.regular,
            BatchType::Revision => &self.revision,
        }
    }

    /// Batch types that are switched on, regular first.
    #[must_use]
    pub fn enabled(&self) -> Vec<BatchType> {
        BatchType::ALL
            .into_iter()
            .filter(|bt| self.get(*bt).enabled)
            .collect()
    }
}

/// Price of one batch type, in whole rupees.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub base_price: u64,
    pub offline_material_cost: u64,
    pub total_price: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub regular: PriceBreakdown,
    pub revision: PriceBreakdown,
}

impl Pricing {
    #[must_use]
    pub const fn get(&self, batch_type: BatchType) -> &PriceBreakdown {
        match batch_type {
            BatchType::Regular => &self.regular,
            BatchType::Revision => &self.revision,
        }
    }
}

/// A printed book or kit shipped to students.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OfflineMaterial {
    pub name: String,
    pub quantity: u32,
    pub unit_cost: u64,
    pub total_cost: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OfflineMaterials {
    pub enabled: bool,
    pub materials: Vec<OfflineMaterial>,
    pub total_cost: u64,
}

/// A monthly language course intake.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    /// Explicit name. `None` means the display name is generated.
    pub name: Option<String>,
    pub language: Language,
    pub level: Level,
    pub month: u32,
    pub year: i32,
    pub total_capacity: u32,
    /// Length of the course in months.
    pub course_duration: u32,
    pub batch_size_limit: u32,
    pub batch_types: BatchTypes,
    pub pricing: Pricing,
    /// Legacy single price; mirrors the regular total.
    pub price: u64,
    pub offline_materials: OfflineMaterials,
    pub description: String,
    pub instructor_id: Option<String>,
    pub trainer_ids: Vec<String>,
    pub status: CourseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-type batch arithmetic derived from the seat counters.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchTypeSummary {
    pub students: u32,
    pub batches: u32,
    pub full_batches: u32,
    pub leftover_students: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CourseBatchSummary {
    pub regular: BatchTypeSummary,
    pub revision: BatchTypeSummary,
}

impl Course {
    /// `"{language} {level} {Mon} {year}"` unless an explicit name is set.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        let month = self
            .month
            .checked_sub(1)
            .and_then(|idx| MONTH_ABBREVIATIONS.get(idx as usize))
            .copied()
            .unwrap_or("???");
        format!("{} {} {month} {}", self.language, self.level, self.year)
    }

    #[must_use]
    pub const fn total_enrolled(&self) -> u32 {
        self.batch_types.regular.student_count + self.batch_types.revision.student_count
    }

    #[must_use]
    pub const fn available_slots(&self) -> u32 {
        self.total_capacity.saturating_sub(self.total_enrolled())
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.total_enrolled() >= self.total_capacity
    }

    /// Whether `user_id` teaches this course, either as instructor or listed trainer.
    #[must_use]
    pub fn is_trainer(&self, user_id: &str) -> bool {
        self.instructor_id.as_deref() == Some(user_id)
            || self.trainer_ids.iter().any(|t| t == user_id)
    }

    #[must_use]
    pub fn batch_summary(&self) -> CourseBatchSummary {
        CourseBatchSummary {
            regular: self.summarize(BatchType::Regular),
            revision: self.summarize(BatchType::Revision),
        }
    }

    fn summarize(&self, batch_type: BatchType) -> BatchTypeSummary {
        let students = self.batch_types.get(batch_type).student_count;
        let limit = self.batch_size_limit.max(1);
        BatchTypeSummary {
            students,
            batches: students.div_ceil(limit),
            full_batches: students / limit,
            leftover_students: students % limit,
        }
    }

    /// Base plus offline material cost for `batch_type`. Offline cost only counts
    /// while offline materials are enabled.
    #[must_use]
    pub fn price_breakdown(&self, batch_type: BatchType) -> PriceBreakdown {
        let entry = self.pricing.get(batch_type);
        let offline = if self.offline_materials.enabled {
            entry.offline_material_cost
        } else {
            0
        };
        PriceBreakdown {
            base_price: entry.base_price,
            offline_material_cost: offline,
            total_price: entry.base_price + offline,
        }
    }

    #[must_use]
    pub fn total_price(&self, batch_type: BatchType) -> u64 {
        self.price_breakdown(batch_type).total_price
    }

    /// Recompute material totals and propagate them into both price entries
    /// and the legacy price.
    pub fn recompute_offline_costs(&mut self) {
        for material in &mut self.offline_materials.materials {
            if material.total_cost == 0 {
                material.total_cost = u64::from(material.quantity) * material.unit_cost;
            }
        }
        let total = if self.offline_materials.enabled {
            self.offline_materials.materials.iter().map(|m| m.total_cost).sum()
        } else {
            0
        };
        self.offline_materials.total_cost = total;
        for entry in [&mut self.pricing.regular, &mut self.pricing.revision] {
            entry.offline_material_cost = total;
            entry.total_price = entry.base_price + total;
        }
        self.price = self.pricing.regular.total_price;
    }
}
