use std::collections::HashMap;

use chrono::Datelike;
use log::trace;

use crate::problem::{Cost, LegIndex, PortIndex, Problem, ShipmentIndex, TimeIndex, Volume};

/// Daily warehousing rate applied to a source port whose route rows carry no
/// rate. The nullable column means "no storage offered here"; the rate is
/// large enough that no cost-minimal plan ever dwells at such a port.
pub const WAREHOUSE_RATE_UNAVAILABLE: Cost = 1e5;

/// A directed leg of the network: a unique (source, destination) pair
/// together with the date offsets on which it can depart.
#[derive(Debug, Clone)]
pub struct Leg {
    /// The port the leg departs from
    from: PortIndex,
    /// The port the leg arrives at
    to: PortIndex,
    /// Index of the leg
    index: LegIndex,
    /// The date offsets on which the leg can depart, sorted ascending
    departures: Vec<TimeIndex>,
    /// Travel mode label
    mode: String,
}

impl Leg {
    /// The port the leg departs from
    pub fn from(&self) -> PortIndex {
        self.from
    }

    /// The port the leg arrives at
    pub fn to(&self) -> PortIndex {
        self.to
    }

    /// Index of the leg
    pub fn index(&self) -> LegIndex {
        self.index
    }

    /// The date offsets on which the leg can depart, sorted ascending
    pub fn departures(&self) -> &[TimeIndex] {
        &self.departures
    }

    /// Travel mode label
    pub fn mode(&self) -> &str {
        self.mode.as_str()
    }
}

#[derive(Debug)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Set of ports
    pub P: Vec<PortIndex>,
    /// Set of date offsets in the planning horizon
    pub T: Vec<TimeIndex>,
    /// Set of shipments
    pub K: Vec<ShipmentIndex>,
    /// The legs of the network with their feasible departure dates
    pub L: Vec<Leg>,
    /// Outbound legs of each port (forward star)
    pub Fs: Vec<Vec<LegIndex>>,
    /// Inbound legs of each port (reverse star)
    pub Rs: Vec<Vec<LegIndex>>,
    /// Leg index by (source, destination)
    pub leg: HashMap<(PortIndex, PortIndex), LegIndex>,
    /// Date offsets falling on each weekday, Monday first
    pub weekday_dates: Vec<Vec<TimeIndex>>,
    /// The weekday number of date offset 0 (1 = Monday, ..., 7 = Sunday)
    pub start_weekday: usize,
}

#[allow(non_snake_case)]
impl Sets {
    pub fn new(problem: &Problem) -> Sets {
        let P: Vec<PortIndex> = (0..problem.ports().len()).collect();
        let T: Vec<TimeIndex> = (0..problem.date_span()).collect();
        let K: Vec<ShipmentIndex> = (0..problem.shipments().len()).collect();

        // Every date offset has exactly one weekday, anchored at the weekday
        // of the earliest order date.
        let start_weekday = problem.start_date().weekday().number_from_monday() as usize;
        let mut weekday_dates = vec![Vec::new(); 7];
        for &t in &T {
            let w = match (t + start_weekday) % 7 {
                0 => 7,
                w => w,
            };
            weekday_dates[w - 1].push(t);
        }

        // Route rows with the same (source, destination) collapse into a
        // single leg whose departure dates are the union of the rows'.
        let mut leg: HashMap<(PortIndex, PortIndex), LegIndex> = HashMap::new();
        let mut L: Vec<Leg> = Vec::new();

        for route in problem.routes() {
            let index = *leg
                .entry((route.source(), route.destination()))
                .or_insert_with(|| {
                    let index = L.len();
                    L.push(Leg {
                        from: route.source(),
                        to: route.destination(),
                        index,
                        departures: Vec::new(),
                        mode: route.mode().to_string(),
                    });
                    index
                });

            for w in 1..=7 {
                if route.open_on(w) {
                    L[index].departures.extend_from_slice(&weekday_dates[w - 1]);
                }
            }
        }

        for l in &mut L {
            l.departures.sort_unstable();
            l.departures.dedup();
        }

        let mut Fs = vec![Vec::new(); P.len()];
        let mut Rs = vec![Vec::new(); P.len()];
        for l in &L {
            Fs[l.from].push(l.index);
            Rs[l.to].push(l.index);
        }

        trace!(
            "indexed {} legs between {} ports over {} dates",
            L.len(),
            P.len(),
            T.len()
        );

        Sets {
            P,
            T,
            K,
            L,
            Fs,
            Rs,
            leg,
            weekday_dates,
            start_weekday,
        }
    }

    /// The weekday of a date offset (1 = Monday, ..., 7 = Sunday).
    pub fn weekday_of(&self, t: TimeIndex) -> usize {
        match (t + self.start_weekday) % 7 {
            0 => 7,
            w => w,
        }
    }
}

pub struct Parameters {
    /// Cost per container on leg (i, j) departing on date t
    pub transport_cost: HashMap<(PortIndex, PortIndex, TimeIndex), Cost>,
    /// Fixed cost charged once if leg (i, j) carries anything on date t
    pub fixed_cost: HashMap<(PortIndex, PortIndex, TimeIndex), Cost>,
    /// Transit time in whole days on leg (i, j) departing on date t
    pub transit_time: HashMap<(PortIndex, PortIndex, TimeIndex), usize>,
    /// Duty rate per unit of shipment value on leg (i, j)
    pub transit_duty: HashMap<(PortIndex, PortIndex), f64>,
    /// The volume of a single container on leg (i, j)
    pub container_volume: HashMap<(PortIndex, PortIndex), Volume>,
    /// Daily warehousing rate per unit volume at each port
    pub warehouse_rate: Vec<Cost>,
    /// The cargo volume of each shipment
    pub volume: Vec<Volume>,
    /// The monetary value of each shipment
    pub value: Vec<Cost>,
    /// Delivery deadline of each shipment, as a date offset
    pub deadline: Vec<TimeIndex>,
    /// Origin port of each shipment
    pub origin: Vec<PortIndex>,
    /// Destination port of each shipment
    pub destination: Vec<PortIndex>,
    /// Order date of each shipment, as a date offset
    pub start_time: Vec<TimeIndex>,
    /// Tax rate on the value of each shipment
    pub tax_rate: Vec<f64>,
}

impl Parameters {
    pub fn new(problem: &Problem, sets: &Sets) -> Parameters {
        let mut transport_cost = HashMap::new();
        let mut fixed_cost = HashMap::new();
        let mut transit_time = HashMap::new();
        let mut transit_duty = HashMap::new();
        let mut container_volume = HashMap::new();

        // Only feasible (leg, date) cells exist. Anything else is answered by
        // a failed lookup rather than a penalty value.
        for route in problem.routes() {
            let (i, j) = (route.source(), route.destination());
            transit_duty.insert((i, j), route.transit_duty());
            container_volume.insert((i, j), route.container_volume());

            for w in 1..=7 {
                if !route.open_on(w) {
                    continue;
                }
                for &t in &sets.weekday_dates[w - 1] {
                    transport_cost.insert((i, j, t), route.cost());
                    fixed_cost.insert((i, j, t), route.fixed_cost());
                    transit_time.insert((i, j, t), route.transit_days());
                }
            }
        }

        // The warehousing rate of a port comes from the first route row
        // departing it. Ports that no leg departs cannot hold cargo between
        // legs, so their rate never enters any cost term.
        let mut rates: Vec<Option<Cost>> = vec![None; problem.ports().len()];
        for route in problem.routes() {
            let rate = &mut rates[route.source()];
            if rate.is_none() {
                *rate = Some(
                    route
                        .warehouse_rate()
                        .unwrap_or(WAREHOUSE_RATE_UNAVAILABLE),
                );
            }
        }
        let warehouse_rate = rates.into_iter().map(|r| r.unwrap_or(0.0)).collect();

        let start = problem.start_date();
        let offset = |date: chrono::NaiveDate| (date - start).num_days() as TimeIndex;

        Parameters {
            transport_cost,
            fixed_cost,
            transit_time,
            transit_duty,
            container_volume,
            warehouse_rate,
            volume: problem.shipments().iter().map(|s| s.volume()).collect(),
            value: problem.shipments().iter().map(|s| s.value()).collect(),
            deadline: problem
                .shipments()
                .iter()
                .map(|s| offset(s.delivery_deadline()))
                .collect(),
            origin: problem.shipments().iter().map(|s| s.origin()).collect(),
            destination: problem
                .shipments()
                .iter()
                .map(|s| s.destination())
                .collect(),
            start_time: problem
                .shipments()
                .iter()
                .map(|s| offset(s.order_date()))
                .collect(),
            tax_rate: problem.shipments().iter().map(|s| s.tax_rate()).collect(),
        }
    }
}
