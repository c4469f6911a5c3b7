use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use crate::models::multimodal::model::SolvedRouting;
use crate::models::multimodal::sets_and_parameters::{Parameters, Sets};
use crate::models::multimodal::warehouse;
use crate::problem::Problem;

/// One leg of a decoded itinerary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItineraryLeg {
    pub departure: NaiveDate,
    pub from: String,
    pub to: String,
    pub mode: String,
}

/// The decoded plan for a single shipment: its legs ordered by departure
/// date, and the date it lands at its destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipmentItinerary {
    pub order_number: String,
    pub commodity: String,
    pub start_date: NaiveDate,
    pub arrival_date: NaiveDate,
    pub legs: Vec<ItineraryLeg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub transport: f64,
    pub warehouse: f64,
    pub tax: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.transport + self.warehouse + self.tax
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub cost: CostBreakdown,
    pub shipments: Vec<ShipmentItinerary>,
}

/// Decode a solved assignment into per-shipment itineraries and the billable
/// cost breakdown. Transport cost is recomputed from the solved container
/// counts and usage indicators, not from the flows.
pub fn decode(
    problem: &Problem,
    sets: &Sets,
    parameters: &Parameters,
    solved: &SolvedRouting,
) -> Solution {
    let goods = sets.K.len();
    let ports = sets.P.len();
    let span = sets.T.len();

    let mut flows: Vec<_> = solved
        .x
        .iter()
        .filter(|(_, &value)| value > 0.5)
        .map(|(&key, _)| key)
        .collect();
    flows.sort_unstable_by_key(|&(i, j, t, k)| (k, t, i, j));

    debug!("decoding {} flows", flows.len());

    let mut legs = vec![Vec::new(); goods];
    for (i, j, t, k) in flows {
        // a nonzero flow outside the declared index space is a formulation
        // bug, never something to clip
        assert!(
            i < ports && j < ports && t < span && k < goods,
            "solved flow ({}, {}, {}, {}) lies outside the index space",
            i,
            j,
            t,
            k
        );

        legs[k].push(ItineraryLeg {
            departure: problem.date_of(t),
            from: problem.ports()[i].clone(),
            to: problem.ports()[j].clone(),
            mode: sets.L[sets.leg[&(i, j)]].mode().to_string(),
        });
    }

    let fees = warehouse::fees(sets, parameters, |i, j, t, k| solved.x[&(i, j, t, k)]);

    let shipments = problem
        .shipments()
        .iter()
        .zip(legs)
        .map(|(shipment, legs)| ShipmentItinerary {
            order_number: shipment.order_number().to_string(),
            commodity: shipment.commodity().to_string(),
            start_date: shipment.order_date(),
            arrival_date: problem.date_of(fees.arrival[shipment.index()].round() as usize),
            legs,
        })
        .collect();

    let transport: f64 = sets
        .L
        .iter()
        .flat_map(|leg| {
            leg.departures().iter().map(move |&t| {
                let key = (leg.from(), leg.to(), t);
                solved.y[&key] * parameters.transport_cost[&key]
                    + solved.z[&key] * parameters.fixed_cost[&key]
            })
        })
        .sum();

    let duty: f64 = solved
        .x
        .iter()
        .map(|(&(i, j, _, k), &value)| {
            value * parameters.value[k] * parameters.transit_duty[&(i, j)]
        })
        .sum();

    let tax: f64 = sets
        .K
        .iter()
        .map(|&k| parameters.tax_rate[k] * parameters.value[k])
        .sum::<f64>()
        + duty;

    Solution {
        cost: CostBreakdown {
            transport,
            warehouse: fees.cost,
            tax,
        },
        shipments,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::problem::tests::{route, shipment};
    use crate::problem::{PortIndex, ShipmentIndex, TimeIndex};

    /// A solved assignment with all-zero variables on the full support.
    fn empty_assignment(sets: &Sets) -> SolvedRouting {
        let mut x = HashMap::new();
        let mut y = HashMap::new();
        let mut z = HashMap::new();
        for leg in &sets.L {
            for &t in leg.departures() {
                y.insert((leg.from(), leg.to(), t), 0.0);
                z.insert((leg.from(), leg.to(), t), 0.0);
                for &k in &sets.K {
                    x.insert((leg.from(), leg.to(), t, k), 0.0);
                }
            }
        }
        SolvedRouting {
            x,
            y,
            z,
            objective: 0.0,
        }
    }

    fn ship(
        solved: &mut SolvedRouting,
        i: PortIndex,
        j: PortIndex,
        t: TimeIndex,
        k: ShipmentIndex,
        containers: f64,
    ) {
        solved.x.insert((i, j, t, k), 1.0);
        solved.y.insert((i, j, t), containers);
        solved.z.insert((i, j, t), 1.0);
    }

    #[test]
    fn decodes_a_direct_shipment() {
        let problem = Problem::new(vec![route("A", "B")], vec![shipment("A", "B")]).unwrap();
        let sets = Sets::new(&problem);
        let parameters = Parameters::new(&problem, &sets);

        let mut solved = empty_assignment(&sets);
        ship(&mut solved, 0, 1, 0, 0, 1.0);

        let solution = decode(&problem, &sets, &parameters, &solved);

        assert_eq!(solution.shipments.len(), 1);
        let plan = &solution.shipments[0];
        assert_eq!(
            plan.legs,
            vec![ItineraryLeg {
                departure: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                from: "A".to_string(),
                to: "B".to_string(),
                mode: "Sea".to_string(),
            }]
        );
        assert_eq!(
            plan.arrival_date,
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );

        // one container at 10 plus the fixed cost of 5; nothing dwells, no
        // tax, no duty
        assert_eq!(solution.cost.transport, 15.0);
        assert_eq!(solution.cost.warehouse, 0.0);
        assert_eq!(solution.cost.tax, 0.0);
        assert_eq!(solution.cost.total(), 15.0);
    }

    #[test]
    fn orders_legs_by_departure_date() {
        let problem = Problem::new(
            vec![route("A", "B"), route("B", "C")],
            vec![shipment("A", "C")],
        )
        .unwrap();
        let sets = Sets::new(&problem);
        let parameters = Parameters::new(&problem, &sets);

        let mut solved = empty_assignment(&sets);
        ship(&mut solved, 1, 2, 2, 0, 1.0);
        ship(&mut solved, 0, 1, 0, 0, 1.0);

        let solution = decode(&problem, &sets, &parameters, &solved);
        let legs = &solution.shipments[0].legs;

        assert_eq!(legs.len(), 2);
        assert!(legs[0].departure < legs[1].departure);
        // the legs chain from the origin to the destination
        assert_eq!(legs[0].from, "A");
        assert_eq!(legs[0].to, legs[1].from);
        assert_eq!(legs[1].to, "C");
    }

    #[test]
    fn decoding_is_idempotent() {
        let problem = Problem::new(
            vec![route("A", "B"), route("B", "C")],
            vec![shipment("A", "C")],
        )
        .unwrap();
        let sets = Sets::new(&problem);
        let parameters = Parameters::new(&problem, &sets);

        let mut solved = empty_assignment(&sets);
        ship(&mut solved, 0, 1, 0, 0, 1.0);
        ship(&mut solved, 1, 2, 2, 0, 1.0);

        let first = decode(&problem, &sets, &parameters, &solved);
        let second = decode(&problem, &sets, &parameters, &solved);

        assert_eq!(first, second);
    }

    #[test]
    fn transport_cost_follows_the_container_count() {
        let problem = Problem::new(vec![route("A", "B")], vec![shipment("A", "B")]).unwrap();
        let sets = Sets::new(&problem);
        let parameters = Parameters::new(&problem, &sets);

        let mut solved = empty_assignment(&sets);
        ship(&mut solved, 0, 1, 0, 0, 2.0);

        let solution = decode(&problem, &sets, &parameters, &solved);

        // two containers at 10 each plus one fixed cost of 5
        assert_eq!(solution.cost.transport, 25.0);
    }

    #[test]
    fn charges_warehouse_fees_for_dwell_days() {
        let problem = Problem::new(
            vec![route("A", "B"), route("B", "C")],
            vec![shipment("A", "C")],
        )
        .unwrap();
        let sets = Sets::new(&problem);
        let parameters = Parameters::new(&problem, &sets);

        // arrive at B on day 1, depart on day 3: two days of storage for 50
        // units at rate 1
        let mut solved = empty_assignment(&sets);
        ship(&mut solved, 0, 1, 0, 0, 1.0);
        ship(&mut solved, 1, 2, 3, 0, 1.0);

        let solution = decode(&problem, &sets, &parameters, &solved);

        assert_eq!(solution.cost.warehouse, 100.0);
        assert_eq!(
            solution.shipments[0].arrival_date,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
    }
}
