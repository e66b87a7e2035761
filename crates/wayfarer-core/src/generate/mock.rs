//! Hardcoded plan generator, used when no LLM backend is configured and in
//! tests.

use async_trait::async_trait;

use crate::error::Result;

use super::{DayPayload, ItemPayload, LocationPayload, PlanGenerator, PlanPayload};

/// Returns the same two-day Nanjing itinerary for every query. Deterministic
/// on purpose: tests assert on its shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockGenerator;

impl MockGenerator {
    pub fn new() -> Self {
        Self
    }
}

fn item(
    item_type: &str,
    description: &str,
    times: Option<(&str, &str)>,
    location: Option<(&str, &str)>,
    cost: f64,
) -> ItemPayload {
    ItemPayload {
        item_type: item_type.to_owned(),
        description: description.to_owned(),
        start_time: times.map(|(s, _)| s.to_owned()),
        end_time: times.map(|(_, e)| e.to_owned()),
        location: location.map(|(name, city)| LocationPayload {
            name: name.to_owned(),
            city: city.to_owned(),
        }),
        estimated_cost: cost,
        estimated_cost_currency: "CNY".to_owned(),
    }
}

#[async_trait]
impl PlanGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, _query: &str) -> Result<PlanPayload> {
        Ok(PlanPayload {
            title: "南京两日游：钟山风华与秦淮月夜".to_owned(),
            description: "一份详细的南京两日游路线计划，从南京南站出发。".to_owned(),
            days: vec![
                DayPayload {
                    date: "2025-11-10".to_owned(),
                    items: vec![
                        item(
                            "Transportation",
                            "抵达南京：乘车到达南京南站",
                            Some(("2025-11-10T08:00:00", "2025-11-10T10:00:00")),
                            Some(("南京南站", "南京")),
                            400.0,
                        ),
                        item(
                            "Hotel",
                            "抵达酒店：从南京南站乘坐地铁1号线至新街口站",
                            Some(("2025-11-10T10:00:00", "2025-11-10T11:00:00")),
                            Some(("新街口站", "南京")),
                            0.0,
                        ),
                        item(
                            "Meal",
                            "酒店附近午餐，自行寻找",
                            Some(("2025-11-10T11:00:00", "2025-11-10T11:40:00")),
                            Some(("新街口站", "南京")),
                            60.0,
                        ),
                        item(
                            "Activity",
                            "游览明孝陵",
                            Some(("2025-11-10T11:40:00", "2025-11-10T13:00:00")),
                            Some(("明孝陵", "南京")),
                            73.0,
                        ),
                    ],
                },
                DayPayload {
                    date: "2025-11-11".to_owned(),
                    items: vec![item(
                        "Activity",
                        "参观总统府",
                        Some(("2025-11-11T13:00:00", "2025-11-11T15:00:00")),
                        Some(("总统府", "南京")),
                        37.0,
                    )],
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn mock_payload_is_valid() {
        let payload = MockGenerator::new()
            .generate("南京两日游")
            .await
            .expect("mock never fails");

        let plan = payload.into_plan(Uuid::new_v4()).expect("payload is valid");
        assert_eq!(plan.days.len(), 2);
        assert_eq!(plan.days[0].items.len(), 4);

        // The hotel and meal items share the 新街口站 location instance.
        let hotel = plan.days[0].items[1].location.as_ref().expect("location");
        let meal = plan.days[0].items[2].location.as_ref().expect("location");
        assert_eq!(hotel.name, "新街口站");
        assert_eq!(hotel.city, "南京");
        assert_eq!(hotel.id, meal.id);
    }
}
