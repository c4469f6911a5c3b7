use grb::Expr;
use itertools::iproduct;

use crate::models::multimodal::sets_and_parameters::{Parameters, Sets};
use crate::problem::{PortIndex, ShipmentIndex, TimeIndex};

/// A flow value: a symbolic expression over the decision variables while the
/// model is being built, or a plain number once it has been solved. Dwell and
/// arrival times are affine in the flows, so one computation serves both.
pub trait FlowTerm: Clone {
    fn zero() -> Self;
    fn constant(value: f64) -> Self;
    fn plus(self, other: Self) -> Self;
    fn scaled(self, coeff: f64) -> Self;
}

impl FlowTerm for f64 {
    fn zero() -> Self {
        0.0
    }

    fn constant(value: f64) -> Self {
        value
    }

    fn plus(self, other: Self) -> Self {
        self + other
    }

    fn scaled(self, coeff: f64) -> Self {
        self * coeff
    }
}

impl FlowTerm for Expr {
    fn zero() -> Self {
        Expr::Constant(0.0)
    }

    fn constant(value: f64) -> Self {
        Expr::Constant(value)
    }

    fn plus(self, other: Self) -> Self {
        self + other
    }

    fn scaled(self, coeff: f64) -> Self {
        coeff * self
    }
}

fn sum<V: FlowTerm>(terms: impl Iterator<Item = V>) -> V {
    terms.fold(V::zero(), V::plus)
}

/// Dwell times, destination arrival times and the total warehousing cost
/// derived from a flow assignment.
pub struct WarehouseFees<V> {
    /// Days shipment k idles at port j, indexed `[j][k]`
    pub stay: Vec<Vec<V>>,
    /// Arrival time of shipment k at its own destination
    pub arrival: Vec<V>,
    /// Total warehousing cost
    pub cost: V,
}

/// Derive warehousing fees from the flows given by `flow`. The `flow` lookup
/// is queried exactly on the sparse (leg, departure date, shipment) support.
///
/// A shipment dwells at a port from the day it lands (or, at its origin, the
/// day it is ordered) until the day it departs again. Its own destination is
/// excluded: cargo that has arrived is not warehoused.
pub fn fees<V, F>(sets: &Sets, parameters: &Parameters, flow: F) -> WarehouseFees<V>
where
    V: FlowTerm,
    F: Fn(PortIndex, PortIndex, TimeIndex, ShipmentIndex) -> V,
{
    let flow = &flow;

    let arrival_terms = |j: PortIndex, k: ShipmentIndex| {
        sets.Rs[j].iter().flat_map(move |&l| {
            let leg = &sets.L[l];
            leg.departures().iter().map(move |&t| {
                let landing = t + parameters.transit_time[&(leg.from(), leg.to(), t)];
                flow(leg.from(), leg.to(), t, k).scaled(landing as f64)
            })
        })
    };

    let mut stay = vec![vec![V::zero(); sets.K.len()]; sets.P.len()];
    let mut arrival = Vec::with_capacity(sets.K.len());

    for &k in &sets.K {
        for &j in &sets.P {
            // days spent waiting = departure date - arrival date
            let departures = sets.Fs[j].iter().flat_map(|&l| {
                let leg = &sets.L[l];
                leg.departures()
                    .iter()
                    .map(move |&t| flow(leg.from(), leg.to(), t, k).scaled(t as f64))
            });
            let mut dwell = sum(departures);

            if j != parameters.destination[k] {
                dwell = dwell.plus(sum(arrival_terms(j, k)).scaled(-1.0));
            }

            // at the origin the clock starts at the order date instead
            if j == parameters.origin[k] {
                dwell = dwell.plus(V::constant(-(parameters.start_time[k] as f64)));
            }

            stay[j][k] = dwell;
        }

        arrival.push(sum(arrival_terms(parameters.destination[k], k)));
    }

    let mut cost = V::zero();
    for (&j, &k) in iproduct!(&sets.P, &sets.K) {
        let rate = parameters.volume[k] * parameters.warehouse_rate[j];
        cost = cost.plus(stay[j][k].clone().scaled(rate));
    }

    WarehouseFees {
        stay,
        arrival,
        cost,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::problem::tests::{route, shipment};
    use crate::problem::Problem;

    fn fixture() -> (Problem, Sets, Parameters) {
        let mut first = route("A", "B");
        first.transit_days = 1;
        let mut second = route("B", "C");
        second.transit_days = 2;
        second.warehouse_rate = Some(3.0);

        let problem = Problem::new(vec![first, second], vec![shipment("A", "C")]).unwrap();
        let sets = Sets::new(&problem);
        let parameters = Parameters::new(&problem, &sets);
        (problem, sets, parameters)
    }

    #[test]
    fn computes_dwell_and_arrival_for_a_two_leg_path() {
        let (_, sets, parameters) = fixture();

        // depart A on day 0 (arrive B on day 1), depart B on day 3 (arrive C on day 5)
        let mut flows = HashMap::new();
        flows.insert((0, 1, 0, 0), 1.0);
        flows.insert((1, 2, 3, 0), 1.0);

        let fees = fees(&sets, &parameters, |i, j, t, k| {
            *flows.get(&(i, j, t, k)).unwrap_or(&0.0)
        });

        assert_eq!(fees.stay[0][0], 0.0);
        assert_eq!(fees.stay[1][0], 2.0);
        assert_eq!(fees.stay[2][0], 0.0);
        assert_eq!(fees.arrival[0], 5.0);
        // two days at B, volume 50, rate 3
        assert_eq!(fees.cost, 300.0);
    }

    #[test]
    fn charges_the_origin_from_the_order_date() {
        let mut late = shipment("A", "C");
        late.order_number = "ORD-2".to_string();
        late.order_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();

        let problem = Problem::new(
            vec![route("A", "B"), route("B", "C")],
            vec![shipment("A", "C"), late],
        )
        .unwrap();
        let sets = Sets::new(&problem);
        let parameters = Parameters::new(&problem, &sets);

        // the late order departs A on day 4, two days after it was placed
        let mut flows = HashMap::new();
        flows.insert((0, 1, 4, 1), 1.0);

        let fees = fees(&sets, &parameters, |i, j, t, k| {
            *flows.get(&(i, j, t, k)).unwrap_or(&0.0)
        });

        assert_eq!(parameters.start_time[1], 2);
        assert_eq!(fees.stay[0][1], 2.0);
    }
}
