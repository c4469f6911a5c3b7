use std::collections::HashMap;

use chrono::NaiveDate;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The type used for cargo volume
pub type Volume = f64;
/// The type used for cost.
pub type Cost = f64;

pub type PortIndex = usize;
pub type ShipmentIndex = usize;
pub type TimeIndex = usize;
pub type LegIndex = usize;

/// A candidate transportation leg as ingested, with ports referred to by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub source: String,
    pub destination: String,
    /// Departure feasibility per weekday, Monday first.
    pub open_weekdays: [bool; 7],
    /// Cost per container, all monetary components summed.
    pub cost: Cost,
    /// Charged once per departure date on which the leg is used.
    pub fixed_cost: Cost,
    /// Transit time in whole days.
    pub transit_days: usize,
    pub container_volume: Volume,
    /// Duty rate applied to the value of every shipment using the leg.
    pub transit_duty: f64,
    /// Daily warehousing rate per unit volume at the source port. `None`
    /// means the source port offers no storage.
    pub warehouse_rate: Option<Cost>,
    pub mode: String,
}

/// One order row as ingested, with ports referred to by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentDefinition {
    pub order_number: String,
    pub commodity: String,
    pub order_date: NaiveDate,
    pub delivery_deadline: NaiveDate,
    pub origin: String,
    pub destination: String,
    pub volume: Volume,
    pub value: Cost,
    /// Tax rate on the order value. Zero for domestic journeys.
    pub tax_rate: f64,
}

#[derive(Debug, Clone)]
pub struct Problem {
    /// Port names, ordered by index (continuous, starting at 0)
    ports: Vec<String>,
    /// The candidate legs of the network
    routes: Vec<Route>,
    /// The shipments to be routed. Assumed to be ordered by index
    shipments: Vec<Shipment>,
    /// The earliest order date; date offset 0
    start_date: NaiveDate,
    /// The number of days in the planning horizon
    date_span: usize,
}

impl Problem {
    pub fn new(
        routes: Vec<RouteDefinition>,
        shipments: Vec<ShipmentDefinition>,
    ) -> Result<Problem, ProblemConstructionError> {
        use ProblemConstructionError::*;

        if routes.is_empty() {
            return Err(NoRoutes);
        }

        if shipments.is_empty() {
            return Err(NoShipments);
        }

        // The port universe is defined by the route network. Index assignment
        // is first-seen order over (source, destination) pairs.
        let mut ports: Vec<String> = Vec::new();
        let mut indices: HashMap<String, PortIndex> = HashMap::new();
        let mut intern = |name: &str, ports: &mut Vec<String>| match indices.get(name) {
            Some(&i) => i,
            None => {
                let i = ports.len();
                ports.push(name.to_string());
                indices.insert(name.to_string(), i);
                i
            }
        };

        let routes = routes
            .into_iter()
            .map(|r| Route {
                source: intern(&r.source, &mut ports),
                destination: intern(&r.destination, &mut ports),
                open_weekdays: r.open_weekdays,
                cost: r.cost,
                fixed_cost: r.fixed_cost,
                transit_days: r.transit_days,
                container_volume: r.container_volume,
                transit_duty: r.transit_duty,
                warehouse_rate: r.warehouse_rate,
                mode: r.mode,
            })
            .collect::<Vec<_>>();

        let shipments = shipments
            .into_iter()
            .enumerate()
            .map(|(index, s)| {
                let lookup = |name: &str| {
                    indices.get(name).copied().ok_or_else(|| UnknownPort {
                        order_number: s.order_number.clone(),
                        port: name.to_string(),
                    })
                };

                let origin = lookup(&s.origin)?;
                let destination = lookup(&s.destination)?;

                if origin == destination {
                    return Err(SameOriginAndDestination {
                        order_number: s.order_number,
                    });
                }

                if s.delivery_deadline < s.order_date {
                    return Err(DeadlineBeforeOrderDate {
                        order_number: s.order_number,
                    });
                }

                Ok(Shipment {
                    index,
                    order_number: s.order_number,
                    commodity: s.commodity,
                    origin,
                    destination,
                    order_date: s.order_date,
                    delivery_deadline: s.delivery_deadline,
                    volume: s.volume,
                    value: s.value,
                    tax_rate: s.tax_rate,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let start_date = shipments.iter().map(|s| s.order_date).min().unwrap();
        let end_date = shipments.iter().map(|s| s.delivery_deadline).max().unwrap();
        let date_span = (end_date - start_date).num_days();

        if date_span <= 0 {
            return Err(NonPositiveDateSpan { days: date_span });
        }

        Ok(Problem {
            ports,
            routes,
            shipments,
            start_date,
            date_span: date_span as usize,
        })
    }

    /// Port names, ordered by index (continuous, starting at 0)
    pub fn ports(&self) -> &[String] {
        &self.ports
    }

    /// The candidate legs of the network
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// The shipments to be routed. Ordered by index (continuous, starting at 0)
    pub fn shipments(&self) -> &[Shipment] {
        &self.shipments
    }

    /// The earliest order date. All date offsets count days from this date.
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// The number of days in the planning horizon. Strictly positive.
    pub fn date_span(&self) -> usize {
        self.date_span
    }

    /// The calendar date of a date offset.
    pub fn date_of(&self, offset: TimeIndex) -> NaiveDate {
        self.start_date + chrono::Duration::days(offset as i64)
    }
}

#[derive(Debug, Display, PartialEq)]
pub enum ProblemConstructionError {
    /// The route network is empty
    #[display(fmt = "the instance has no routes")]
    NoRoutes,
    /// There are no orders to route
    #[display(fmt = "the instance has no shipments")]
    NoShipments,
    /// A shipment refers to a port that no route serves
    #[display(fmt = "shipment {}: port {} is not part of the route network", order_number, port)]
    UnknownPort { order_number: String, port: String },
    /// A shipment starts and ends at the same port
    #[display(fmt = "shipment {}: origin and destination are the same port", order_number)]
    SameOriginAndDestination { order_number: String },
    /// A shipment is due before it is even ordered
    #[display(fmt = "shipment {}: delivery deadline precedes the order date", order_number)]
    DeadlineBeforeOrderDate { order_number: String },
    /// The planning horizon is empty
    #[display(fmt = "the planning horizon spans {} days", days)]
    NonPositiveDateSpan { days: i64 },
}

impl std::error::Error for ProblemConstructionError {}

/// A directed transportation option between two ports.
#[derive(Debug, Clone)]
pub struct Route {
    /// The port the leg departs from
    source: PortIndex,
    /// The port the leg arrives at
    destination: PortIndex,
    /// Departure feasibility per weekday, Monday first
    open_weekdays: [bool; 7],
    /// Cost per container
    cost: Cost,
    /// Charged once per departure date on which the leg is used
    fixed_cost: Cost,
    /// Transit time in whole days
    transit_days: usize,
    /// The volume of a single container
    container_volume: Volume,
    /// Duty rate applied to the value of every shipment using the leg
    transit_duty: f64,
    /// Daily warehousing rate per unit volume at the source port
    warehouse_rate: Option<Cost>,
    /// Travel mode label, used for reporting only
    mode: String,
}

impl Route {
    /// The port the leg departs from
    pub fn source(&self) -> PortIndex {
        self.source
    }

    /// The port the leg arrives at
    pub fn destination(&self) -> PortIndex {
        self.destination
    }

    /// Whether the leg can depart on the given weekday (1 = Monday, ..., 7 = Sunday).
    pub fn open_on(&self, weekday: usize) -> bool {
        self.open_weekdays[weekday - 1]
    }

    /// Cost per container
    pub fn cost(&self) -> Cost {
        self.cost
    }

    /// Charged once per departure date on which the leg is used
    pub fn fixed_cost(&self) -> Cost {
        self.fixed_cost
    }

    /// Transit time in whole days
    pub fn transit_days(&self) -> usize {
        self.transit_days
    }

    /// The volume of a single container
    pub fn container_volume(&self) -> Volume {
        self.container_volume
    }

    /// Duty rate applied to the value of every shipment using the leg
    pub fn transit_duty(&self) -> f64 {
        self.transit_duty
    }

    /// Daily warehousing rate per unit volume at the source port
    pub fn warehouse_rate(&self) -> Option<Cost> {
        self.warehouse_rate
    }

    /// Travel mode label, used for reporting only
    pub fn mode(&self) -> &str {
        self.mode.as_str()
    }
}

/// A single order to be routed through the network.
#[derive(Debug, Clone)]
pub struct Shipment {
    /// The index of the shipment
    index: ShipmentIndex,
    /// The order number of the underlying order
    order_number: String,
    /// The commodity category, used for reporting only
    commodity: String,
    /// The port the shipment starts from
    origin: PortIndex,
    /// The port the shipment must reach
    destination: PortIndex,
    /// The date the order was placed
    order_date: NaiveDate,
    /// The date the shipment must have arrived by
    delivery_deadline: NaiveDate,
    /// The cargo volume
    volume: Volume,
    /// The monetary value of the order
    value: Cost,
    /// Tax rate on the order value
    tax_rate: f64,
}

impl Shipment {
    /// The index of the shipment
    pub fn index(&self) -> ShipmentIndex {
        self.index
    }

    /// The order number of the underlying order
    pub fn order_number(&self) -> &str {
        self.order_number.as_str()
    }

    /// The commodity category, used for reporting only
    pub fn commodity(&self) -> &str {
        self.commodity.as_str()
    }

    /// The port the shipment starts from
    pub fn origin(&self) -> PortIndex {
        self.origin
    }

    /// The port the shipment must reach
    pub fn destination(&self) -> PortIndex {
        self.destination
    }

    /// The date the order was placed
    pub fn order_date(&self) -> NaiveDate {
        self.order_date
    }

    /// The date the shipment must have arrived by
    pub fn delivery_deadline(&self) -> NaiveDate {
        self.delivery_deadline
    }

    /// The cargo volume
    pub fn volume(&self) -> Volume {
        self.volume
    }

    /// The monetary value of the order
    pub fn value(&self) -> Cost {
        self.value
    }

    /// Tax rate on the order value
    pub fn tax_rate(&self) -> f64 {
        self.tax_rate
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    pub fn route(source: &str, destination: &str) -> RouteDefinition {
        RouteDefinition {
            source: source.to_string(),
            destination: destination.to_string(),
            open_weekdays: [true; 7],
            cost: 10.0,
            fixed_cost: 5.0,
            transit_days: 1,
            container_volume: 100.0,
            transit_duty: 0.0,
            warehouse_rate: Some(1.0),
            mode: "Sea".to_string(),
        }
    }

    pub fn shipment(origin: &str, destination: &str) -> ShipmentDefinition {
        ShipmentDefinition {
            order_number: "ORD-1".to_string(),
            commodity: "Widgets".to_string(),
            order_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            delivery_deadline: NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            volume: 50.0,
            value: 1000.0,
            tax_rate: 0.0,
        }
    }

    #[test]
    fn indexes_ports_in_first_seen_order() {
        let problem = Problem::new(
            vec![route("A", "B"), route("B", "C"), route("A", "C")],
            vec![shipment("A", "C")],
        )
        .unwrap();

        assert_eq!(problem.ports(), &["A", "B", "C"]);
        assert_eq!(problem.routes()[2].source(), 0);
        assert_eq!(problem.routes()[2].destination(), 2);
        assert_eq!(problem.shipments()[0].origin(), 0);
        assert_eq!(problem.shipments()[0].destination(), 2);
    }

    #[test]
    fn computes_the_planning_horizon() {
        let problem = Problem::new(vec![route("A", "B")], vec![shipment("A", "B")]).unwrap();

        assert_eq!(
            problem.start_date(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(problem.date_span(), 5);
        assert_eq!(
            problem.date_of(3),
            NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()
        );
    }

    #[test]
    fn rejects_unknown_ports() {
        let err = Problem::new(vec![route("A", "B")], vec![shipment("A", "X")]).unwrap_err();

        assert_eq!(
            err,
            ProblemConstructionError::UnknownPort {
                order_number: "ORD-1".to_string(),
                port: "X".to_string(),
            }
        );
    }

    #[test]
    fn rejects_a_shipment_to_itself() {
        let err = Problem::new(vec![route("A", "B")], vec![shipment("A", "A")]).unwrap_err();

        assert_eq!(
            err,
            ProblemConstructionError::SameOriginAndDestination {
                order_number: "ORD-1".to_string(),
            }
        );
    }

    #[test]
    fn rejects_a_deadline_before_the_order_date() {
        let mut order = shipment("A", "B");
        order.delivery_deadline = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();

        let err = Problem::new(vec![route("A", "B")], vec![order]).unwrap_err();

        assert_eq!(
            err,
            ProblemConstructionError::DeadlineBeforeOrderDate {
                order_number: "ORD-1".to_string(),
            }
        );
    }

    #[test]
    fn rejects_an_empty_planning_horizon() {
        let mut order = shipment("A", "B");
        order.delivery_deadline = order.order_date;

        let err = Problem::new(vec![route("A", "B")], vec![order]).unwrap_err();

        assert_eq!(err, ProblemConstructionError::NonPositiveDateSpan { days: 0 });
    }
}
