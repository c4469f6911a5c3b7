use std::path::Path;

use chrono::NaiveDate;
use derive_more::Display;
use serde::Deserialize;

use crate::problem::{
    Cost, Problem, ProblemConstructionError, RouteDefinition, ShipmentDefinition, Volume,
};

/// A route row as delivered by the tabular ingestion step, before its cost
/// and transit-time breakdowns are collapsed.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRouteRecord {
    pub source: String,
    pub destination: String,
    /// Departure feasibility per weekday, Monday first
    pub open_weekdays: [bool; 7],
    /// The monetary components of the leg cost
    pub cost_components: Vec<Cost>,
    pub fixed_freight_cost: Cost,
    /// Transit time of each sub-leg, in hours
    pub leg_hours: Vec<f64>,
    pub container_size: Volume,
    pub transit_duty: f64,
    /// Daily warehouse rate at the source port, if it offers storage
    pub warehouse_cost: Option<Cost>,
    pub travel_mode: String,
}

impl RawRouteRecord {
    /// Collapse the cost and transit-time breakdowns into a leg definition.
    pub fn into_route(self) -> RouteDefinition {
        RouteDefinition {
            source: self.source,
            destination: self.destination,
            open_weekdays: self.open_weekdays,
            cost: self.cost_components.iter().sum(),
            fixed_cost: self.fixed_freight_cost,
            // sub-leg hours add up to whole transit days
            transit_days: (self.leg_hours.iter().sum::<f64>() / 24.0).ceil() as usize,
            container_volume: self.container_size,
            transit_duty: self.transit_duty,
            warehouse_rate: self.warehouse_cost,
            mode: self.travel_mode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum JourneyType {
    Domestic,
    International,
}

/// An order row as delivered by the tabular ingestion step.
#[derive(Debug, Clone, Deserialize)]
pub struct RawOrderRecord {
    pub order_number: String,
    pub commodity: String,
    pub order_date: NaiveDate,
    pub required_delivery_date: NaiveDate,
    pub ship_from: String,
    pub ship_to: String,
    pub volume: Volume,
    pub order_value: Cost,
    pub tax_percentage: f64,
    pub journey_type: JourneyType,
}

impl RawOrderRecord {
    pub fn into_shipment(self) -> ShipmentDefinition {
        ShipmentDefinition {
            order_number: self.order_number,
            commodity: self.commodity,
            order_date: self.order_date,
            delivery_deadline: self.required_delivery_date,
            origin: self.ship_from,
            destination: self.ship_to,
            volume: self.volume,
            value: self.order_value,
            // domestic journeys are not taxed
            tax_rate: match self.journey_type {
                JourneyType::Domestic => 0.0,
                JourneyType::International => self.tax_percentage,
            },
        }
    }
}

/// A full instance as read from disk.
#[derive(Debug, Clone, Deserialize)]
pub struct RawInstance {
    pub routes: Vec<RawRouteRecord>,
    pub orders: Vec<RawOrderRecord>,
}

impl RawInstance {
    pub fn into_problem(self) -> Result<Problem, ProblemConstructionError> {
        Problem::new(
            self.routes
                .into_iter()
                .map(RawRouteRecord::into_route)
                .collect(),
            self.orders
                .into_iter()
                .map(RawOrderRecord::into_shipment)
                .collect(),
        )
    }
}

#[derive(Debug, Display)]
pub enum ReadInstanceError {
    #[display(fmt = "could not read the instance file: {}", _0)]
    Io(std::io::Error),
    #[display(fmt = "the instance file is not valid JSON: {}", _0)]
    Json(serde_json::Error),
    #[display(fmt = "invalid instance: {}", _0)]
    Construction(ProblemConstructionError),
}

impl std::error::Error for ReadInstanceError {}

impl From<std::io::Error> for ReadInstanceError {
    fn from(error: std::io::Error) -> Self {
        ReadInstanceError::Io(error)
    }
}

impl From<serde_json::Error> for ReadInstanceError {
    fn from(error: serde_json::Error) -> Self {
        ReadInstanceError::Json(error)
    }
}

impl From<ProblemConstructionError> for ReadInstanceError {
    fn from(error: ProblemConstructionError) -> Self {
        ReadInstanceError::Construction(error)
    }
}

/// Read a JSON instance file and validate it into a `Problem`.
pub fn read_instance(path: &Path) -> Result<Problem, ReadInstanceError> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let raw: RawInstance = serde_json::from_reader(reader)?;

    Ok(raw.into_problem()?)
}
