use crate::solution::Solution;

/// Render a decoded solution as a plain-text report.
pub fn render(solution: &Solution) -> String {
    let mut txt = String::from("Solution");
    txt += &format!("\nNumber of shipments: {}", solution.shipments.len());
    txt += &format!("\nTotal cost: {}", solution.cost.total());
    txt += &format!("\nTransportation cost: {}", solution.cost.transport);
    txt += &format!("\nWarehouse cost: {}", solution.cost.warehouse);
    txt += &format!("\nTax cost: {}", solution.cost.tax);

    for shipment in &solution.shipments {
        txt += "\n------------------------------------";
        txt += &format!(
            "\nShipment {}  Category: {}",
            shipment.order_number, shipment.commodity
        );
        txt += &format!("\nStart date: {}", shipment.start_date);
        txt += &format!("\nArrival date: {}", shipment.arrival_date);
        txt += "\nRoute:";
        for (n, leg) in shipment.legs.iter().enumerate() {
            txt += &format!(
                "\n({})Date: {}  From: {}  To: {}  By: {}",
                n + 1,
                leg.departure,
                leg.from,
                leg.to,
                leg.mode
            );
        }
    }

    txt
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::solution::{CostBreakdown, ItineraryLeg, ShipmentItinerary};

    #[test]
    fn renders_the_cost_breakdown_and_itineraries() {
        let solution = Solution {
            cost: CostBreakdown {
                transport: 15.0,
                warehouse: 0.0,
                tax: 0.0,
            },
            shipments: vec![ShipmentItinerary {
                order_number: "ORD-1".to_string(),
                commodity: "Widgets".to_string(),
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                arrival_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                legs: vec![ItineraryLeg {
                    departure: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    from: "A".to_string(),
                    to: "B".to_string(),
                    mode: "Sea".to_string(),
                }],
            }],
        };

        let txt = render(&solution);

        assert!(txt.starts_with("Solution\nNumber of shipments: 1"));
        assert!(txt.contains("Total cost: 15"));
        assert!(txt.contains("Shipment ORD-1  Category: Widgets"));
        assert!(txt.contains("(1)Date: 2024-01-01  From: A  To: B  By: Sea"));
    }
}
